//! Physical database operations for tenant databases.
//!
//! DDL cannot take bind parameters for identifiers, so every name is checked
//! against `[A-Za-z0-9_]+` and passwords are embedded as escaped literals.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sea_orm::{
    ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Statement, Value,
};
use tracing::{debug, info};

use super::binding::ConnectionSpec;
use crate::config::db::{DbKind, PostgresServer};
use crate::infra::db::tenant_connect_options;
use crate::validation::is_identifier;

#[async_trait]
pub trait TenantDatabaseEngine: Send + Sync + fmt::Debug {
    fn driver(&self) -> DbKind;

    /// Open a fresh connection for `spec`. Never reuses an existing pool.
    async fn connect(&self, spec: &ConnectionSpec) -> Result<DatabaseConnection, DbErr>;

    /// Create the database if it does not exist.
    async fn create_database(&self, db_name: &str) -> Result<(), DbErr>;

    /// Create (or re-password) the user and grant it everything on `db_name` only.
    async fn create_user(&self, db_user: &str, password: &str, db_name: &str) -> Result<(), DbErr>;

    async fn database_exists(&self, db_name: &str) -> Result<bool, DbErr>;

    async fn drop_database(&self, db_name: &str) -> Result<(), DbErr>;

    async fn drop_user(&self, db_user: &str) -> Result<(), DbErr>;
}

fn checked(ident: &str) -> Result<&str, DbErr> {
    if is_identifier(ident) {
        Ok(ident)
    } else {
        Err(DbErr::Custom(format!("invalid database identifier '{ident}'")))
    }
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Duplicate-object races between concurrent provisioning runs are success.
fn is_duplicate_object(e: &DbErr) -> bool {
    let msg = e.to_string();
    msg.contains("42P04") || msg.contains("42710") || msg.contains("already exists")
}

/// Postgres: DDL runs on the shared system connection.
#[derive(Debug, Clone)]
pub struct PostgresEngine {
    system_db: DatabaseConnection,
    server: PostgresServer,
}

impl PostgresEngine {
    pub fn new(system_db: DatabaseConnection, server: PostgresServer) -> Self {
        Self { system_db, server }
    }

    async fn exists(&self, sql: &str, name: &str) -> Result<bool, DbErr> {
        let stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            sql,
            [Value::from(name.to_string())],
        );
        Ok(self.system_db.query_one(stmt).await?.is_some())
    }

    async fn execute_tolerating_duplicates(&self, sql: &str) -> Result<(), DbErr> {
        match self.system_db.execute_unprepared(sql).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_object(&e) => {
                debug!(error = %e, "Object already exists");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl TenantDatabaseEngine for PostgresEngine {
    fn driver(&self) -> DbKind {
        DbKind::Postgres
    }

    async fn connect(&self, spec: &ConnectionSpec) -> Result<DatabaseConnection, DbErr> {
        let url = self
            .server
            .url(&spec.username, &spec.password, checked(&spec.database)?);
        Database::connect(tenant_connect_options(url)).await
    }

    async fn create_database(&self, db_name: &str) -> Result<(), DbErr> {
        let db_name = checked(db_name)?;
        if self.database_exists(db_name).await? {
            debug!(db_name, "Database already present");
            return Ok(());
        }
        self.execute_tolerating_duplicates(&format!("CREATE DATABASE \"{db_name}\""))
            .await
    }

    async fn create_user(&self, db_user: &str, password: &str, db_name: &str) -> Result<(), DbErr> {
        let db_user = checked(db_user)?;
        let db_name = checked(db_name)?;
        let password = quote_literal(password);

        if self
            .exists("SELECT 1 FROM pg_roles WHERE rolname = $1", db_user)
            .await?
        {
            self.system_db
                .execute_unprepared(&format!(
                    "ALTER ROLE \"{db_user}\" WITH LOGIN PASSWORD {password}"
                ))
                .await?;
        } else {
            self.execute_tolerating_duplicates(&format!(
                "CREATE ROLE \"{db_user}\" WITH LOGIN PASSWORD {password}"
            ))
            .await?;
        }

        self.system_db
            .execute_unprepared(&format!(
                "GRANT ALL PRIVILEGES ON DATABASE \"{db_name}\" TO \"{db_user}\""
            ))
            .await?;
        // Ownership lets the tenant user create tables in `public`.
        self.system_db
            .execute_unprepared(&format!(
                "ALTER DATABASE \"{db_name}\" OWNER TO \"{db_user}\""
            ))
            .await?;
        Ok(())
    }

    async fn database_exists(&self, db_name: &str) -> Result<bool, DbErr> {
        self.exists("SELECT 1 FROM pg_database WHERE datname = $1", db_name)
            .await
    }

    async fn drop_database(&self, db_name: &str) -> Result<(), DbErr> {
        let db_name = checked(db_name)?;
        self.system_db
            .execute_unprepared(&format!(
                "DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"
            ))
            .await?;
        Ok(())
    }

    async fn drop_user(&self, db_user: &str) -> Result<(), DbErr> {
        let db_user = checked(db_user)?;
        self.system_db
            .execute_unprepared(&format!("DROP ROLE IF EXISTS \"{db_user}\""))
            .await?;
        Ok(())
    }
}

/// One SQLite file per tenant under `data_dir`. There are no database users,
/// so user operations only log.
#[derive(Debug, Clone)]
pub struct SqliteFileEngine {
    data_dir: PathBuf,
}

impl SqliteFileEngine {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn database_path(&self, db_name: &str) -> PathBuf {
        self.data_dir.join(format!("{db_name}.sqlite"))
    }

    fn url(path: &Path) -> String {
        // `rw` without `c`: a missing tenant file is a connection failure,
        // not an empty database.
        format!("sqlite://{}?mode=rw", path.display())
    }
}

fn io_err(action: &str, path: &Path, e: std::io::Error) -> DbErr {
    DbErr::Custom(format!("{action} {}: {e}", path.display()))
}

#[async_trait]
impl TenantDatabaseEngine for SqliteFileEngine {
    fn driver(&self) -> DbKind {
        DbKind::SqliteFile
    }

    async fn connect(&self, spec: &ConnectionSpec) -> Result<DatabaseConnection, DbErr> {
        let path = self.database_path(checked(&spec.database)?);
        Database::connect(tenant_connect_options(Self::url(&path))).await
    }

    async fn create_database(&self, db_name: &str) -> Result<(), DbErr> {
        let path = self.database_path(checked(db_name)?);
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| io_err("create data dir", &self.data_dir, e))?;
        // An empty file is a valid SQLite database.
        tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| io_err("create", &path, e))?;
        Ok(())
    }

    async fn create_user(&self, db_user: &str, _password: &str, db_name: &str) -> Result<(), DbErr> {
        checked(db_user)?;
        checked(db_name)?;
        debug!(db_user, db_name, "SQLite has no database users; nothing to grant");
        Ok(())
    }

    async fn database_exists(&self, db_name: &str) -> Result<bool, DbErr> {
        let path = self.database_path(checked(db_name)?);
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| io_err("stat", &path, e))
    }

    async fn drop_database(&self, db_name: &str) -> Result<(), DbErr> {
        let path = self.database_path(checked(db_name)?);
        for suffix in ["", "-wal", "-shm"] {
            let file = PathBuf::from(format!("{}{suffix}", path.display()));
            match tokio::fs::remove_file(&file).await {
                Ok(()) => info!(file = %file.display(), "Removed tenant database file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(io_err("remove", &file, e)),
            }
        }
        Ok(())
    }

    async fn drop_user(&self, db_user: &str) -> Result<(), DbErr> {
        checked(db_user)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_quotes_are_escaped() {
        assert_eq!(quote_literal("pa'ss"), "'pa''ss'");
    }

    #[test]
    fn identifiers_are_checked() {
        assert!(checked("tenant_acme").is_ok());
        assert!(checked("tenant\"; DROP").is_err());
    }

    #[tokio::test]
    async fn sqlite_file_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let engine = SqliteFileEngine::new(dir.path());

        assert!(!engine.database_exists("tenant_acme").await.unwrap());
        engine.create_database("tenant_acme").await.unwrap();
        engine.create_database("tenant_acme").await.unwrap();
        assert!(engine.database_exists("tenant_acme").await.unwrap());

        engine.drop_database("tenant_acme").await.unwrap();
        assert!(!engine.database_exists("tenant_acme").await.unwrap());
        engine.drop_database("tenant_acme").await.unwrap();
    }

    #[tokio::test]
    async fn sqlite_connect_to_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let engine = SqliteFileEngine::new(dir.path());
        let spec = ConnectionSpec {
            driver: DbKind::SqliteFile,
            database: "tenant_missing".into(),
            username: "nobody".into(),
            password: "password123".into(),
        };
        assert!(engine.connect(&spec).await.is_err());
        assert!(!engine.database_exists("tenant_missing").await.unwrap());
    }
}
