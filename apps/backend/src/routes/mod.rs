use actix_web::web;

pub mod admin;
pub mod health;
pub mod tenant_auth;

/// Mount every route. `main` and the integration tests share this; the
/// tenant guard is attached per resource inside `tenant_auth`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/health").configure(health::configure_routes))
        .service(web::scope("/admin").configure(admin::configure_routes))
        .service(web::scope("/tenant").configure(tenant_auth::configure_routes));
}
