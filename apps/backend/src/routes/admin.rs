//! `/admin`: tenant registry management.

use actix_web::{web, HttpResponse};
use serde::Serialize;
use serde_json::json;

use crate::entities::TenantStatus;
use crate::error::AppError;
use crate::extractors::ValidatedJson;
use crate::services::tenants::{self as tenant_service, CreateTenantRequest, UpdateTenantRequest};
use crate::state::app_state::AppState;

#[derive(Debug, Serialize)]
struct DataResponse<T: Serialize> {
    data: T,
    message: &'static str,
}

fn ok<T: Serialize>(data: T, message: &'static str) -> HttpResponse {
    HttpResponse::Ok().json(DataResponse { data, message })
}

async fn index(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let tenants = tenant_service::list_tenants(&state).await?;
    Ok(ok(tenants, "Tenants retrieved successfully"))
}

async fn store(
    state: web::Data<AppState>,
    body: ValidatedJson<CreateTenantRequest>,
) -> Result<HttpResponse, AppError> {
    let tenant = tenant_service::create_tenant(&state, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(DataResponse {
        data: tenant,
        message: "Tenant created successfully and provisioning started",
    }))
}

async fn show(state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse, AppError> {
    let tenant = tenant_service::get_tenant(&state, path.into_inner()).await?;
    Ok(ok(tenant, "Tenant retrieved successfully"))
}

async fn update(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: ValidatedJson<UpdateTenantRequest>,
) -> Result<HttpResponse, AppError> {
    let tenant =
        tenant_service::update_tenant(&state, path.into_inner(), body.into_inner()).await?;
    Ok(ok(tenant, "Tenant updated successfully"))
}

async fn suspend(state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse, AppError> {
    let tenant =
        tenant_service::set_status(&state, path.into_inner(), TenantStatus::Suspended).await?;
    Ok(ok(tenant, "Tenant suspended successfully"))
}

async fn activate(state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse, AppError> {
    let tenant = tenant_service::set_status(&state, path.into_inner(), TenantStatus::Active).await?;
    Ok(ok(tenant, "Tenant activated successfully"))
}

async fn destroy(state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse, AppError> {
    tenant_service::delete_tenant(&state, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Tenant deleted successfully" })))
}

async fn provision(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let tenant_id = path.into_inner();
    let queued = tenant_service::requeue_provisioning(&state, tenant_id).await?;
    let message = if queued {
        "Provisioning queued"
    } else {
        "Provisioning already in progress"
    };
    Ok(HttpResponse::Accepted().json(DataResponse {
        data: json!({ "tenant_id": tenant_id, "queued": queued }),
        message,
    }))
}

async fn provisioning_status(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let report = tenant_service::provisioning_report(&state, path.into_inner()).await?;
    Ok(ok(report, "Provisioning status retrieved successfully"))
}

async fn database_status(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let mut status = tenant_service::database_status(&state).await;
    if !state.exposes_details() {
        status.error = None;
    }
    Ok(ok(status, "Database status retrieved successfully"))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/tenants")
            .route(web::get().to(index))
            .route(web::post().to(store)),
    )
    .service(
        web::resource("/tenants/{id}")
            .route(web::get().to(show))
            .route(web::put().to(update))
            .route(web::patch().to(update))
            .route(web::delete().to(destroy)),
    )
    .route("/tenants/{id}/suspend", web::patch().to(suspend))
    .route("/tenants/{id}/activate", web::patch().to(activate))
    .route("/tenants/{id}/provision", web::post().to(provision))
    .route("/tenants/{id}/provisioning", web::get().to(provisioning_status))
    .route("/database/status", web::get().to(database_status));
}
