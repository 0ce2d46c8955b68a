use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::app::RuntimeEnv;

const DEFAULT_FILTER: &str = "info,actix_web=info,sqlx=warn,sea_orm=warn";

/// Install the global subscriber: JSON lines in prod, compact text otherwise.
pub fn init_tracing(env: RuntimeEnv) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let base = fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_ansi(false);

    match env {
        RuntimeEnv::Prod => tracing_subscriber::registry()
            .with(env_filter)
            .with(base.json())
            .init(),
        RuntimeEnv::Dev | RuntimeEnv::Test => tracing_subscriber::registry()
            .with(env_filter)
            .with(base.compact())
            .init(),
    }
}
