//! Background provisioning: tenant ids go in through an unbounded channel,
//! jobs run with bounded concurrency, and each tenant's latest job state is
//! published on a `watch` channel.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::{mpsc, watch, Semaphore};
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, warn, Instrument};

use super::pipeline::TenantProvisioner;
use crate::error::AppError;
use crate::repos::tenants::{self, Tenant};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed(String),
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }
}

#[derive(Debug, Error)]
#[error("provisioning worker is not running")]
pub struct QueueClosed;

impl From<QueueClosed> for AppError {
    fn from(e: QueueClosed) -> Self {
        AppError::internal(e.to_string())
    }
}

type StatusMap = Arc<DashMap<i64, watch::Sender<JobStatus>>>;

/// Handle for submitting jobs and observing their state. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ProvisioningQueue {
    tx: mpsc::UnboundedSender<i64>,
    statuses: StatusMap,
}

impl ProvisioningQueue {
    /// Spawn the worker on the current runtime.
    pub fn start(
        provisioner: TenantProvisioner,
        system_db: DatabaseConnection,
        concurrency: usize,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let statuses: StatusMap = Arc::new(DashMap::new());
        let worker = ProvisioningWorker {
            rx,
            job: Job {
                provisioner,
                system_db,
                statuses: Arc::clone(&statuses),
            },
            concurrency: concurrency.max(1),
        };
        let handle = tokio::spawn(worker.run());
        (Self { tx, statuses }, handle)
    }

    /// Queue a run for `tenant_id`. Returns `false` when one is already
    /// queued or running for that tenant.
    pub fn enqueue(&self, tenant_id: i64) -> Result<bool, QueueClosed> {
        match self.statuses.entry(tenant_id) {
            Entry::Occupied(entry) => {
                if entry.get().borrow().is_pending() {
                    info!(tenant_id, "Provisioning already pending");
                    return Ok(false);
                }
                entry.get().send_replace(JobStatus::Queued);
            }
            Entry::Vacant(entry) => {
                entry.insert(watch::channel(JobStatus::Queued).0);
            }
        }

        if self.tx.send(tenant_id).is_err() {
            if let Some(sender) = self.statuses.get(&tenant_id) {
                sender.send_replace(JobStatus::Failed(QueueClosed.to_string()));
            }
            return Err(QueueClosed);
        }
        info!(tenant_id, "Provisioning queued");
        Ok(true)
    }

    pub fn status(&self, tenant_id: i64) -> Option<JobStatus> {
        self.statuses
            .get(&tenant_id)
            .map(|sender| sender.borrow().clone())
    }

    pub fn subscribe(&self, tenant_id: i64) -> Option<watch::Receiver<JobStatus>> {
        self.statuses
            .get(&tenant_id)
            .map(|sender| sender.subscribe())
    }

    /// Wait until the tenant's current job finishes. `None` if nothing was
    /// ever queued for it.
    pub async fn wait_for(&self, tenant_id: i64) -> Option<JobStatus> {
        let mut rx = self.subscribe(tenant_id)?;
        let waited = rx
            .wait_for(JobStatus::is_terminal)
            .await
            .map(|status| status.clone());
        let status = match waited {
            Ok(status) => status,
            // Sender dropped: report whatever was last published.
            Err(_) => rx.borrow().clone(),
        };
        Some(status)
    }
}

struct ProvisioningWorker {
    rx: mpsc::UnboundedReceiver<i64>,
    job: Job,
    concurrency: usize,
}

impl ProvisioningWorker {
    async fn run(mut self) {
        let permits = Arc::new(Semaphore::new(self.concurrency));
        info!(concurrency = self.concurrency, "Provisioning worker started");

        while let Some(tenant_id) = self.rx.recv().await {
            let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                break;
            };
            let job = self.job.clone();
            tokio::spawn(
                async move {
                    job.run(tenant_id).await;
                    drop(permit);
                }
                .instrument(info_span!("provisioning_job", tenant_id)),
            );
        }
        info!("Provisioning worker stopped");
    }
}

#[derive(Clone)]
struct Job {
    provisioner: TenantProvisioner,
    system_db: DatabaseConnection,
    statuses: StatusMap,
}

impl Job {
    fn publish(&self, tenant_id: i64, status: JobStatus) {
        match self.statuses.get(&tenant_id) {
            Some(sender) => {
                sender.send_replace(status);
            }
            None => {
                self.statuses
                    .insert(tenant_id, watch::channel(status).0);
            }
        }
    }

    async fn run(&self, tenant_id: i64) {
        self.publish(tenant_id, JobStatus::Running);
        match provision_and_stamp(&self.provisioner, &self.system_db, tenant_id).await {
            Ok(_) => self.publish(tenant_id, JobStatus::Succeeded),
            Err(e) => {
                error!(tenant_id, error = %e, "Provisioning job failed");
                self.publish(tenant_id, JobStatus::Failed(e.to_string()));
            }
        }
    }
}

/// Load the tenant, run the pipeline, and stamp `provisioned_at`.
///
/// This is the whole job body; the CLI calls it directly.
pub async fn provision_and_stamp(
    provisioner: &TenantProvisioner,
    system_db: &DatabaseConnection,
    tenant_id: i64,
) -> Result<Tenant, AppError> {
    let tenant = tenants::find_by_id(system_db, tenant_id)
        .await?
        .ok_or(AppError::TenantNotFound { tenant_id })?;
    if tenant.provisioned_at.is_some() {
        warn!(tenant_id, "Tenant already provisioned; running the pipeline again");
    }

    provisioner.provision(&tenant).await?;
    let tenant = tenants::mark_provisioned(system_db, tenant_id, OffsetDateTime::now_utc()).await?;
    info!(tenant_id, "Provisioning job succeeded");
    Ok(tenant)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed("boom".into()).is_terminal());
    }

    #[test]
    fn status_serializes_with_state_tag() {
        let json = serde_json::to_value(JobStatus::Failed("boom".into())).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["message"], "boom");

        let json = serde_json::to_value(JobStatus::Queued).unwrap();
        assert_eq!(json["state"], "queued");
    }
}
