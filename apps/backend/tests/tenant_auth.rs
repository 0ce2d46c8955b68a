mod common;
mod support;

use std::time::{Duration, SystemTime};

use actix_web::http::header::AUTHORIZATION;
use actix_web::http::StatusCode;
use actix_web::test;
use backend_test_support::error_envelope::assert_error_response;
use serde_json::{json, Value};
use tenancy_backend::auth::token::{AuthClaims, ClaimId, TokenCodec};
use tenancy_backend::entities::TenantStatus;
use tenancy_backend::provisioning::seed::DEFAULT_ADMIN_PASSWORD;
use tenancy_backend::repos::tenants;
use support::app_builder::create_test_app;
use support::tenants::{admin_email, provisioned_tenant};
use support::test_state::{build_test_env, test_security};

fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {token}"))
}

#[actix_web::test]
async fn test_login_then_me_then_logout() -> Result<(), Box<dyn std::error::Error>> {
    let env = build_test_env().await?;
    let acme = provisioned_tenant(&env.state, "Acme Inc", "acme").await?;
    let app = create_test_app(env.state.clone()).await;

    let req = test::TestRequest::post()
        .uri("/tenant/login")
        .set_json(json!({
            "tenant_id": acme.id,
            "email": admin_email(&acme),
            "password": DEFAULT_ADMIN_PASSWORD,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 4 * 60 * 60);
    assert_eq!(body["user"]["email"], admin_email(&acme));
    assert!(body["user"].get("password_hash").is_none());
    let token = body["access_token"].as_str().expect("access_token").to_string();

    let claims = TokenCodec::new(test_security()).decode(&token)?;
    assert_eq!(claims.tenant_id(), Some(acme.id));
    assert_eq!(claims.role(), Some("admin"));

    let req = test::TestRequest::get()
        .uri("/tenant/me")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["tenant"]["id"], acme.id);
    assert_eq!(body["tenant"]["slug"], acme.slug.as_str());
    assert_eq!(body["user"]["email"], admin_email(&acme));

    let req = test::TestRequest::post()
        .uri("/tenant/logout")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    Ok(())
}

#[actix_web::test]
async fn test_login_with_wrong_password_is_unauthorized() -> Result<(), Box<dyn std::error::Error>> {
    let env = build_test_env().await?;
    let acme = provisioned_tenant(&env.state, "Acme Inc", "acme").await?;
    let app = create_test_app(env.state.clone()).await;

    let req = test::TestRequest::post()
        .uri("/tenant/login")
        .set_json(json!({
            "tenant_id": acme.id,
            "email": admin_email(&acme),
            "password": "not-the-password",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error_response(resp, "INVALID_CREDENTIALS", StatusCode::UNAUTHORIZED).await;
    Ok(())
}

#[actix_web::test]
async fn test_login_for_unknown_tenant_is_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let env = build_test_env().await?;
    let app = create_test_app(env.state.clone()).await;

    let req = test::TestRequest::post()
        .uri("/tenant/login")
        .set_json(json!({
            "tenant_id": 99999,
            "email": "admin@acme.com",
            "password": "password",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let envelope = assert_error_response(resp, "TENANT_NOT_FOUND", StatusCode::NOT_FOUND).await;
    assert_eq!(envelope.details, Some(json!("tenant_id=99999")));
    Ok(())
}

#[actix_web::test]
async fn test_login_for_suspended_tenant_is_forbidden() -> Result<(), Box<dyn std::error::Error>> {
    let env = build_test_env().await?;
    let acme = provisioned_tenant(&env.state, "Acme Inc", "acme").await?;
    tenants::set_status(&env.state.system_db, acme.id, TenantStatus::Suspended).await?;
    let app = create_test_app(env.state.clone()).await;

    let req = test::TestRequest::post()
        .uri("/tenant/login")
        .set_json(json!({
            "tenant_id": acme.id,
            "email": admin_email(&acme),
            "password": DEFAULT_ADMIN_PASSWORD,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error_response(resp, "TENANT_SUSPENDED", StatusCode::FORBIDDEN).await;
    Ok(())
}

#[actix_web::test]
async fn test_login_payload_is_validated() -> Result<(), Box<dyn std::error::Error>> {
    let env = build_test_env().await?;
    let app = create_test_app(env.state.clone()).await;

    let req = test::TestRequest::post()
        .uri("/tenant/login")
        .set_json(json!({ "email": "not-an-email" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let envelope =
        assert_error_response(resp, "VALIDATION_FAILED", StatusCode::UNPROCESSABLE_ENTITY).await;
    let details = envelope.details.expect("field errors");
    assert!(details.get("tenant_id").is_some());
    assert!(details.get("email").is_some());
    assert!(details.get("password").is_some());
    Ok(())
}

#[actix_web::test]
async fn test_me_rejects_bad_tokens() -> Result<(), Box<dyn std::error::Error>> {
    let env = build_test_env().await?;
    let acme = provisioned_tenant(&env.state, "Acme Inc", "acme").await?;
    let app = create_test_app(env.state.clone()).await;
    let codec = TokenCodec::new(test_security());
    let now = SystemTime::now();

    // No header at all.
    let req = test::TestRequest::get().uri("/tenant/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_error_response(resp, "JWT_MISSING", StatusCode::UNAUTHORIZED).await;

    // Not a JWT.
    let req = test::TestRequest::get()
        .uri("/tenant/me")
        .insert_header(bearer("garbage"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error_response(resp, "JWT_MALFORMED", StatusCode::UNAUTHORIZED).await;

    // Signed with another secret.
    let foreign = TokenCodec::new(tenancy_backend::SecurityConfig::new(
        b"another-secret".to_vec(),
        "http://localhost:8000",
    ))
    .issue_access_token(1, acme.id, None, now)?;
    let req = test::TestRequest::get()
        .uri("/tenant/me")
        .insert_header(bearer(&foreign))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error_response(resp, "JWT_SIGNATURE_INVALID", StatusCode::UNAUTHORIZED).await;

    // Expired an hour ago.
    let expired = codec.issue_access_token(1, acme.id, None, now - Duration::from_secs(5 * 60 * 60))?;
    let req = test::TestRequest::get()
        .uri("/tenant/me")
        .insert_header(bearer(&expired))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error_response(resp, "JWT_EXPIRED", StatusCode::UNAUTHORIZED).await;

    // No tenant_id claim.
    let no_tenant = codec.issue(
        AuthClaims {
            sub: Some(ClaimId::Int(1)),
            ..AuthClaims::default()
        },
        now,
    )?;
    let req = test::TestRequest::get()
        .uri("/tenant/me")
        .insert_header(bearer(&no_tenant))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error_response(resp, "JWT_MISSING_CLAIM", StatusCode::UNAUTHORIZED).await;

    // Valid token for a tenant that does not exist.
    let orphan = codec.issue_access_token(1, 99999, None, now)?;
    let req = test::TestRequest::get()
        .uri("/tenant/me")
        .insert_header(bearer(&orphan))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error_response(resp, "TENANT_NOT_FOUND", StatusCode::NOT_FOUND).await;
    Ok(())
}

#[actix_web::test]
async fn test_token_for_suspended_tenant_is_forbidden() -> Result<(), Box<dyn std::error::Error>> {
    let env = build_test_env().await?;
    let acme = provisioned_tenant(&env.state, "Acme Inc", "acme").await?;
    let token = TokenCodec::new(test_security()).issue_access_token(
        1,
        acme.id,
        Some("admin"),
        SystemTime::now(),
    )?;
    tenants::set_status(&env.state.system_db, acme.id, TenantStatus::Suspended).await?;
    let app = create_test_app(env.state.clone()).await;

    let req = test::TestRequest::get()
        .uri("/tenant/me")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error_response(resp, "TENANT_SUSPENDED", StatusCode::FORBIDDEN).await;
    Ok(())
}

#[actix_web::test]
async fn test_me_follows_the_token_across_tenants() -> Result<(), Box<dyn std::error::Error>> {
    let env = build_test_env().await?;
    let acme = provisioned_tenant(&env.state, "Acme Inc", "acme").await?;
    let globex = provisioned_tenant(&env.state, "Globex Inc", "globex").await?;
    let app = create_test_app(env.state.clone()).await;

    let mut tokens = Vec::new();
    for tenant in [&acme, &globex] {
        let req = test::TestRequest::post()
            .uri("/tenant/login")
            .set_json(json!({
                "tenant_id": tenant.id,
                "email": admin_email(tenant),
                "password": DEFAULT_ADMIN_PASSWORD,
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        tokens.push(body["access_token"].as_str().expect("access_token").to_string());
    }

    // A, then B, then back to A: each request binds its own tenant.
    for (tenant, token) in [(&acme, &tokens[0]), (&globex, &tokens[1]), (&acme, &tokens[0])] {
        let req = test::TestRequest::get()
            .uri("/tenant/me")
            .insert_header(bearer(token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["tenant"]["id"], tenant.id);
        assert_eq!(body["user"]["email"], admin_email(tenant));
    }
    Ok(())
}
