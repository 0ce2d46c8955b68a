mod common;
mod support;

use actix_web::test;
use serde_json::Value;
use support::app_builder::create_test_app;
use support::test_state::build_test_env;

#[actix_web::test]
async fn test_health_endpoint() -> Result<(), Box<dyn std::error::Error>> {
    let env = build_test_env().await?;
    let app = create_test_app(env.state.clone()).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    assert!(resp.headers().contains_key("x-request-id"));

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["system_db"], "ok");
    assert_ne!(body["migrations"], "unknown");
    assert!(body.get("system_db_error").is_none());
    Ok(())
}
