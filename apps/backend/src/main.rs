use actix_web::{web, App, HttpServer};
use tenancy_backend::config::app::AppConfig;
use tenancy_backend::infra::state::StateBuilder;
use tenancy_backend::middleware::{
    cors_middleware, RequestTrace, StructuredLogger, TraceSpan,
};
use tenancy_backend::{routes, telemetry};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Environment variables must be set by the runtime environment:
    // - Docker: env_file or --env-file
    // - Local dev: source an env file (set -a; . ./.env; set +a)
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    telemetry::init_tracing(config.env);

    let app_state = match StateBuilder::from_config(&config).build().await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("❌ Failed to build application state: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        host = %config.host,
        port = config.port,
        system_db = app_state.switchboard.engine().driver().as_str(),
        "Starting tenancy backend"
    );

    let data = web::Data::new(app_state);
    let cors_origins = config.cors_origins.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware(&cors_origins))
            .wrap(StructuredLogger)
            .wrap(TraceSpan)
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
