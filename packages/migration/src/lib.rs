pub use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;
pub use sea_orm_migration::sea_orm::{ConnectionTrait, DatabaseConnection};

mod m20250909_000001_system_init; // system registry (tenants)
mod m20250909_000101_tenant_init; // per-tenant schema

/// Migrations for the shared system database that holds the tenant registry.
pub struct SystemMigrator;

#[async_trait::async_trait]
impl MigratorTrait for SystemMigrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250909_000001_system_init::Migration)]
    }
}

/// Migrations applied inside every tenant database during provisioning.
pub struct TenantMigrator;

#[async_trait::async_trait]
impl MigratorTrait for TenantMigrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250909_000101_tenant_init::Migration)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationCommand {
    Up,
    Down,
    Fresh,
    Reset,
    Refresh,
    Status,
}

/// Which schema a migration run targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaScope {
    System,
    Tenant,
}

/// Run a migration command against the system registry database.
pub async fn migrate_system(db: &DatabaseConnection, command: MigrationCommand) -> Result<(), DbErr> {
    migrate(db, SchemaScope::System, command).await
}

/// Run a migration command against a tenant database. Never prompts.
pub async fn migrate_tenant(db: &DatabaseConnection, command: MigrationCommand) -> Result<(), DbErr> {
    migrate(db, SchemaScope::Tenant, command).await
}

pub async fn migrate(
    db: &DatabaseConnection,
    scope: SchemaScope,
    command: MigrationCommand,
) -> Result<(), DbErr> {
    let before = get_db_diagnostics(db, scope).await?;

    tracing::info!("▶ cmd={command:?} scope={scope:?} backend={}", before.backend);
    tracing::info!("▶ connected to DB: {}", before.name);
    tracing::info!(
        "▶ BEFORE: runner has {} migration(s) defined, {} applied",
        before.defined_migrations_count,
        before.mig_count
    );

    let result = match scope {
        SchemaScope::System => run::<SystemMigrator>(db, command).await,
        SchemaScope::Tenant => run::<TenantMigrator>(db, command).await,
    };

    match result {
        Ok(()) => {
            if !matches!(command, MigrationCommand::Status) {
                let after = get_db_diagnostics(db, scope).await?;
                tracing::info!(
                    "▶ AFTER: runner has {} migration(s) defined, {} applied",
                    after.defined_migrations_count,
                    after.mig_count
                );
            }
            tracing::info!("✅ {command:?} OK for {} ({scope:?})", before.name);
            Ok(())
        }
        Err(e) => {
            tracing::error!("❌ {command:?} failed for {} ({scope:?}): {e}", before.name);
            Err(e)
        }
    }
}

async fn run<M: MigratorTrait>(db: &DatabaseConnection, command: MigrationCommand) -> Result<(), DbErr> {
    match command {
        MigrationCommand::Up => M::up(db, None).await,
        MigrationCommand::Down => M::down(db, None).await,
        MigrationCommand::Fresh => M::fresh(db).await,
        MigrationCommand::Reset => M::reset(db).await,
        MigrationCommand::Refresh => M::refresh(db).await,
        MigrationCommand::Status => M::status(db).await,
    }
}

#[derive(Debug)]
struct DbDiagnostics {
    backend: String,
    name: String,
    mig_count: usize,
    defined_migrations_count: usize,
}

async fn get_db_diagnostics(
    db: &DatabaseConnection,
    scope: SchemaScope,
) -> Result<DbDiagnostics, DbErr> {
    let backend = format!("{:?}", db.get_database_backend());

    let name = match db.get_database_backend() {
        sea_orm::DatabaseBackend::Postgres => {
            let stmt = Statement::from_string(
                db.get_database_backend(),
                String::from("select current_database() as name"),
            );
            match db.query_one(stmt).await? {
                Some(row) => row.try_get("", "name")?,
                None => "<unknown>".to_string(),
            }
        }
        sea_orm::DatabaseBackend::Sqlite => {
            let stmt = Statement::from_string(
                db.get_database_backend(),
                String::from("SELECT file FROM pragma_database_list WHERE name = 'main'"),
            );
            match db.query_one(stmt).await? {
                Some(row) => match row.try_get::<String>("", "file") {
                    Ok(file) if file.is_empty() => ":memory:".to_string(),
                    Ok(file) => file,
                    Err(_) => "<unknown>".to_string(),
                },
                None => "<unknown>".to_string(),
            }
        }
        _ => "<unsupported>".to_string(),
    };

    let (mig_count, defined_migrations_count) = match scope {
        SchemaScope::System => (
            count_applied::<SystemMigrator>(db).await.unwrap_or(0),
            SystemMigrator::migrations().len(),
        ),
        SchemaScope::Tenant => (
            count_applied::<TenantMigrator>(db).await.unwrap_or(0),
            TenantMigrator::migrations().len(),
        ),
    };

    Ok(DbDiagnostics {
        backend,
        name,
        mig_count,
        defined_migrations_count,
    })
}

/// Count applied migrations; 0 when the migration table does not exist yet.
async fn count_applied<M: MigratorTrait>(db: &DatabaseConnection) -> Result<usize, DbErr> {
    match M::get_applied_migrations(db).await {
        Ok(migrations) => Ok(migrations.len()),
        Err(DbErr::Exec(_)) => Ok(0),
        Err(e) => Err(e),
    }
}

/// Version string of the latest applied system migration, if any.
pub async fn get_latest_system_migration(db: &DatabaseConnection) -> Result<Option<String>, DbErr> {
    match SystemMigrator::get_applied_migrations(db).await {
        Ok(migrations) => Ok(migrations.last().map(|m| m.name().to_string())),
        Err(DbErr::Exec(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
