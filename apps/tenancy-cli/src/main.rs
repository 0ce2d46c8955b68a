use clap::{Parser, Subcommand, ValueEnum};
use migration::MigrationCommand;
use tenancy_backend::config::app::AppConfig;
use tenancy_backend::infra::state::StateBuilder;

mod commands;

#[derive(Clone, Copy, ValueEnum)]
enum MigrateAction {
    Up,
    Down,
    Fresh,
    Reset,
    Refresh,
    Status,
}

impl From<MigrateAction> for MigrationCommand {
    fn from(action: MigrateAction) -> Self {
        match action {
            MigrateAction::Up => MigrationCommand::Up,
            MigrateAction::Down => MigrationCommand::Down,
            MigrateAction::Fresh => MigrationCommand::Fresh,
            MigrateAction::Reset => MigrationCommand::Reset,
            MigrateAction::Refresh => MigrationCommand::Refresh,
            MigrateAction::Status => MigrationCommand::Status,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Run system registry migrations, optionally followed by every tenant schema
    Migrate {
        #[arg(value_enum, default_value = "up")]
        action: MigrateAction,
        /// Also migrate each active, provisioned tenant database
        #[arg(long)]
        tenants: bool,
    },
    /// Provision a tenant database synchronously and stamp `provisioned_at`
    Provision { tenant_id: i64 },
    /// Drop a tenant's database and database user; the registry row stays
    Deprovision { tenant_id: i64 },
    /// Register the ACME and Globex demo tenants
    SeedDemoTenants {
        /// Register only; skip provisioning
        #[arg(long)]
        no_provision: bool,
    },
}

#[derive(Parser)]
#[command(name = "tenancy")]
#[command(about = "Tenant registry and provisioning operator tool")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout)
        .without_time()
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_env_filter("info,migration=info,sqlx=warn,sea_orm=warn")
        .init();

    let args = Args::parse();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    // Startup already applies pending system migrations.
    let state = match StateBuilder::from_config(&config).build().await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("❌ Failed to connect: {e}");
            std::process::exit(1);
        }
    };

    let result = match args.command {
        Command::Migrate { action, tenants } => {
            commands::migrate(&state, action.into(), tenants).await
        }
        Command::Provision { tenant_id } => commands::provision(&state, tenant_id).await,
        Command::Deprovision { tenant_id } => commands::deprovision(&state, tenant_id).await,
        Command::SeedDemoTenants { no_provision } => {
            commands::seed_demo_tenants(&state, !no_provision).await
        }
    };

    if let Err(e) = result {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }
}
