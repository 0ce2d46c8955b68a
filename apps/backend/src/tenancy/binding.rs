use std::fmt;

use sea_orm::DatabaseConnection;
use tracing::{debug, warn};

use crate::config::db::DbKind;
use crate::logging::pii::Secret;

/// Credentials a tenant connection is opened with.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSpec {
    pub driver: DbKind,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for ConnectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSpec")
            .field("driver", &self.driver)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &Secret(&self.password))
            .finish()
    }
}

#[derive(Debug)]
struct Bound {
    tenant_id: i64,
    spec: ConnectionSpec,
    conn: DatabaseConnection,
}

/// The "tenant" connection slot.
///
/// Each request (and each provisioning run) owns its own binding, so two
/// in-flight requests can never observe each other's tenant. A binding holds
/// at most one tenant at a time and is replaced wholesale, never patched.
#[derive(Debug, Default)]
pub struct ConnectionBinding {
    current: Option<Bound>,
}

impl ConnectionBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_bound(&self) -> bool {
        self.current.is_some()
    }

    pub fn tenant_id(&self) -> Option<i64> {
        self.current.as_ref().map(|b| b.tenant_id)
    }

    pub fn spec(&self) -> Option<&ConnectionSpec> {
        self.current.as_ref().map(|b| &b.spec)
    }

    pub fn connection(&self) -> Option<&DatabaseConnection> {
        self.current.as_ref().map(|b| &b.conn)
    }

    /// Install a new tenant connection, closing whatever was bound before.
    pub async fn rebind(&mut self, tenant_id: i64, spec: ConnectionSpec, conn: DatabaseConnection) {
        self.clear().await;
        self.current = Some(Bound {
            tenant_id,
            spec,
            conn,
        });
    }

    /// Drop the current binding and close its pool.
    pub async fn clear(&mut self) {
        if let Some(previous) = self.current.take() {
            debug!(
                tenant_id = previous.tenant_id,
                database = %previous.spec.database,
                "Closing tenant connection"
            );
            if let Err(e) = previous.conn.close().await {
                warn!(tenant_id = previous.tenant_id, error = %e, "Tenant connection did not close cleanly");
            }
        }
    }

    /// Hand the live connection to the caller, leaving nothing behind.
    pub fn into_connection(mut self) -> Option<DatabaseConnection> {
        self.current.take().map(|b| b.conn)
    }
}
