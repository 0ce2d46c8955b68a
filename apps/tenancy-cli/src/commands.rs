use migration::{migrate_system, migrate_tenant, MigrationCommand};
use tenancy_backend::error::AppError;
use tenancy_backend::provisioning::worker::provision_and_stamp;
use tenancy_backend::repos::tenants::{self, TenantCreate};
use tenancy_backend::state::app_state::AppState;
use tenancy_backend::tenancy::ConnectionBinding;
use tracing::{info, warn};

struct DemoTenant {
    name: &'static str,
    slug: &'static str,
    db_name: &'static str,
    db_user: &'static str,
    db_pass: &'static str,
}

const DEMO_TENANTS: [DemoTenant; 2] = [
    DemoTenant {
        name: "ACME Corporation",
        slug: "acme",
        db_name: "tenant_acme",
        db_user: "acme_user",
        db_pass: "acme_password",
    },
    DemoTenant {
        name: "Globex Corporation",
        slug: "globex",
        db_name: "tenant_globex",
        db_user: "globex_user",
        db_pass: "globex_password",
    },
];

pub async fn migrate(
    state: &AppState,
    command: MigrationCommand,
    include_tenants: bool,
) -> Result<(), AppError> {
    migrate_system(&state.system_db, command).await?;
    if !include_tenants {
        return Ok(());
    }

    let mut failed = 0usize;
    for tenant in tenants::list(&state.system_db).await? {
        if !tenant.is_active() || tenant.provisioned_at.is_none() {
            info!(tenant_id = tenant.id, slug = %tenant.slug, "Skipping tenant");
            continue;
        }

        let mut binding = ConnectionBinding::new();
        let outcome = match state.switchboard.switch(&mut binding, tenant.id).await {
            Ok(_) => match binding.connection() {
                Some(conn) => migrate_tenant(conn, command).await.map_err(AppError::from),
                None => Err(AppError::internal("binding empty after switch")),
            },
            Err(e) => Err(e.into()),
        };
        binding.clear().await;

        match outcome {
            Ok(()) => info!(tenant_id = tenant.id, slug = %tenant.slug, "Tenant schema migrated"),
            Err(e) => {
                warn!(tenant_id = tenant.id, slug = %tenant.slug, error = %e, "Tenant migration failed");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(AppError::internal(format!("{failed} tenant migration(s) failed")));
    }
    Ok(())
}

pub async fn provision(state: &AppState, tenant_id: i64) -> Result<(), AppError> {
    let tenant = provision_and_stamp(&state.provisioner, &state.system_db, tenant_id).await?;
    println!("✅ Provisioned tenant {} ({})", tenant.name, tenant.id);
    Ok(())
}

pub async fn deprovision(state: &AppState, tenant_id: i64) -> Result<(), AppError> {
    let tenant = tenants::require(&state.system_db, tenant_id).await?;
    if !state.provisioner.deprovision(&tenant).await {
        return Err(AppError::internal(format!(
            "deprovisioning tenant {tenant_id} left resources behind; see logs"
        )));
    }
    println!("✅ Deprovisioned tenant {} ({})", tenant.name, tenant.id);
    Ok(())
}

/// Registers each demo tenant unless its slug already exists, then
/// provisions it when asked to.
pub async fn seed_demo_tenants(state: &AppState, provision_after: bool) -> Result<(), AppError> {
    for demo in &DEMO_TENANTS {
        let tenant = match tenants::find_by_slug(&state.system_db, demo.slug).await? {
            Some(existing) => {
                info!(tenant_id = existing.id, slug = demo.slug, "Demo tenant already registered");
                existing
            }
            None => {
                let db_pass_sealed = state
                    .cipher
                    .encrypt(demo.slug, demo.db_pass)
                    .map_err(|e| AppError::internal(e.to_string()))?;
                let created = tenants::create(
                    &state.system_db,
                    TenantCreate {
                        name: demo.name.to_string(),
                        slug: demo.slug.to_string(),
                        db_name: demo.db_name.to_string(),
                        db_user: demo.db_user.to_string(),
                        db_pass_sealed,
                    },
                )
                .await?;
                info!(tenant_id = created.id, slug = demo.slug, "Demo tenant registered");
                created
            }
        };

        if provision_after && tenant.provisioned_at.is_none() {
            provision_and_stamp(&state.provisioner, &state.system_db, tenant.id).await?;
        }
        println!("✅ {} ({})", tenant.name, tenant.slug);
    }
    Ok(())
}
