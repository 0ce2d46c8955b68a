use actix_web::{web, HttpResponse};
use migration::get_latest_system_migration;
use sea_orm::{ConnectionTrait, Statement};
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::AppError;
use crate::state::app_state::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    app_version: &'static str,
    system_db: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_db_error: Option<String>,
    migrations: String,
    time: String,
}

async fn health(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let db = &state.system_db;
    let probe = Statement::from_string(db.get_database_backend(), "SELECT 1 AS health_check");

    let (system_db, system_db_error, migrations) = match db.query_one(probe).await {
        Ok(_) => {
            let migrations = match get_latest_system_migration(db).await {
                Ok(Some(version)) => version,
                Ok(None) => "no_migrations".to_string(),
                Err(_) => "unknown".to_string(),
            };
            ("ok", None, migrations)
        }
        Err(e) => ("error", Some(e.to_string()), "unknown".to_string()),
    };

    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        app_version: env!("CARGO_PKG_VERSION"),
        system_db,
        // Driver text is diagnostic detail.
        system_db_error: system_db_error.filter(|_| state.exposes_details()),
        migrations,
        time: OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "unknown".to_string()),
    }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(health));
}
