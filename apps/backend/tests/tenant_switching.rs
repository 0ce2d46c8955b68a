mod common;
mod support;

use tenancy_backend::entities::TenantStatus;
use tenancy_backend::repos::{tenant_users, tenants};
use tenancy_backend::tenancy::{ConnectionBinding, SwitchError};
use support::test_state::build_test_env;
use support::tenants::{admin_email, provisioned_tenant};

#[actix_web::test]
async fn test_switch_rebinds_to_each_tenant_database() -> Result<(), Box<dyn std::error::Error>> {
    let env = build_test_env().await?;
    let state = &env.state;
    let acme = provisioned_tenant(state, "Acme Inc", "acme").await?;
    let globex = provisioned_tenant(state, "Globex Inc", "globex").await?;

    let mut binding = ConnectionBinding::new();
    state.switchboard.switch(&mut binding, acme.id).await?;
    assert_eq!(binding.tenant_id(), Some(acme.id));
    {
        let conn = binding.connection().expect("bound after switch");
        assert!(tenant_users::find_by_email(conn, &admin_email(&acme)).await?.is_some());
        assert!(tenant_users::find_by_email(conn, &admin_email(&globex)).await?.is_none());
    }

    state.switchboard.switch(&mut binding, globex.id).await?;
    assert_eq!(binding.tenant_id(), Some(globex.id));
    {
        let conn = binding.connection().expect("bound after switch");
        assert!(tenant_users::find_by_email(conn, &admin_email(&globex)).await?.is_some());
        assert!(tenant_users::find_by_email(conn, &admin_email(&acme)).await?.is_none());
    }

    binding.clear().await;
    assert!(!binding.is_bound());
    Ok(())
}

#[actix_web::test]
async fn test_suspended_tenant_leaves_binding_untouched() -> Result<(), Box<dyn std::error::Error>> {
    let env = build_test_env().await?;
    let state = &env.state;
    let acme = provisioned_tenant(state, "Acme Inc", "acme").await?;
    let globex = provisioned_tenant(state, "Globex Inc", "globex").await?;
    tenants::set_status(&state.system_db, globex.id, TenantStatus::Suspended).await?;

    let mut binding = ConnectionBinding::new();
    state.switchboard.switch(&mut binding, acme.id).await?;

    let err = state
        .switchboard
        .switch(&mut binding, globex.id)
        .await
        .unwrap_err();
    assert!(matches!(err, SwitchError::TenantSuspended(id) if id == globex.id));
    assert_eq!(binding.tenant_id(), Some(acme.id));
    assert!(binding.connection().is_some());

    assert!(state.switchboard.is_tenant_active(acme.id).await);
    assert!(!state.switchboard.is_tenant_active(globex.id).await);
    Ok(())
}

#[actix_web::test]
async fn test_unknown_tenant_is_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let env = build_test_env().await?;
    let state = &env.state;

    let mut binding = ConnectionBinding::new();
    let err = state.switchboard.switch(&mut binding, 99999).await.unwrap_err();
    assert!(matches!(err, SwitchError::TenantNotFound(99999)));
    assert!(!binding.is_bound());
    assert!(!state.switchboard.is_tenant_active(99999).await);
    Ok(())
}
