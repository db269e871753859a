//! Periodic reconciliation of the GKE inventory against the cluster store.
//!
//! A cycle has two phases:
//!
//! 1. **Sync** (fail-fast): list remote clusters, apply the label filter,
//!    diff against stored records and apply inserts, then updates, then
//!    deletes. The first error aborts the cycle.
//! 2. **Cleanup** (best-effort): delete every expired, non-ignored cluster
//!    from GKE. A failure only skips that cluster.
//!
//! Cleanup never deletes store records. A record disappears when a later
//! sync no longer sees the cluster remotely, so a failed delete is simply
//! retried on the next cycle.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::RemoteCluster;
use crate::services::cluster_store::ClusterStore;
use crate::services::diff::{diff_clusters, filter_clusters, ClusterSnapshot, LabelFilter};
use crate::services::gke_client::{cluster_resource_name, InventoryClient};

/// `start + lifetime`, or a configuration error when that is not a representable instant.
pub fn expiration_after(start: DateTime<Utc>, lifetime: chrono::Duration) -> Result<DateTime<Utc>> {
    start.checked_add_signed(lifetime).ok_or_else(|| {
        Error::config(format!(
            "cluster lifetime {} from {} overflows the supported date range",
            lifetime, start
        ))
    })
}

/// Names touched by one sync phase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
}

impl SyncReport {
    pub fn mutations(&self) -> usize {
        self.added.len() + self.updated.len() + self.removed.len()
    }
}

/// Outcome of one cleanup phase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanupReport {
    pub deleted: Vec<String>,
    pub skipped_ignored: Vec<String>,
    /// Cluster name and the reason it could not be deleted
    pub failed: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub sync: SyncReport,
    pub cleanup: CleanupReport,
}

pub struct Reconciler {
    store: Arc<dyn ClusterStore>,
    inventory: Arc<dyn InventoryClient>,
    project: String,
    poll_interval: Duration,
    lifetime: chrono::Duration,
    label_filters: Vec<LabelFilter>,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn ClusterStore>,
        inventory: Arc<dyn InventoryClient>,
        project: impl Into<String>,
        poll_interval: Duration,
        lifetime: chrono::Duration,
        label_filters: Vec<LabelFilter>,
    ) -> Self {
        Self {
            store,
            inventory,
            project: project.into(),
            poll_interval,
            lifetime,
            label_filters,
        }
    }

    pub fn from_config(
        config: &Config,
        store: Arc<dyn ClusterStore>,
        inventory: Arc<dyn InventoryClient>,
    ) -> Self {
        Self::new(
            store,
            inventory,
            config.project.clone(),
            config.poll_interval,
            config.cluster_lifetime,
            config.label_filters.clone(),
        )
    }

    /// Poll until `cancel` fires. The next wait starts only after the
    /// previous cycle finished, so cycles never overlap.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            project = %self.project,
            poll_interval = ?self.poll_interval,
            filters = ?self.label_filters.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "GKE poller started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            debug!("Polling");
            tokio::select! {
                _ = cancel.cancelled() => {
                    warn!("Cancelled during an in-flight cycle");
                    break;
                }
                result = self.run_cycle() => {
                    if let Err(e) = result {
                        error!(error = %e, "Reconciliation cycle failed");
                    }
                }
            }
        }

        info!("GKE poller stopped");
    }

    /// One sync followed, if it succeeded, by one cleanup.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let (sync, listing) = self.sync().await?;
        let cleanup = self.cleanup(&listing, Utc::now()).await?;
        Ok(CycleReport { sync, cleanup })
    }

    /// Reconcile the store with the remote inventory. Returns the applied
    /// changes together with the unfiltered listing, which cleanup reuses
    /// to resolve cluster locations.
    pub async fn sync(&self) -> Result<(SyncReport, Vec<RemoteCluster>)> {
        let listing = self.inventory.list_clusters(&self.project).await?;
        let tracked = filter_clusters(&listing, &self.label_filters);
        let known = self.store.list().await?;

        let remote: Vec<ClusterSnapshot> = tracked.iter().map(ClusterSnapshot::from).collect();
        let known: Vec<ClusterSnapshot> = known.iter().map(ClusterSnapshot::from).collect();
        let diff = diff_clusters(&remote, &known);

        let mut report = SyncReport::default();

        for cluster in &diff.added {
            let expiration = expiration_after(cluster.create_time, self.lifetime)?;
            info!(cluster = %cluster.name, create_time = %cluster.create_time, expiration = %expiration, "Discovered");
            self.store
                .insert(&cluster.name, cluster.create_time, expiration, false)
                .await?;
            report.added.push(cluster.name.clone());
        }

        for cluster in &diff.updated {
            let expiration = expiration_after(cluster.create_time, self.lifetime)?;
            info!(cluster = %cluster.name, create_time = %cluster.create_time, expiration = %expiration, "Updated");
            self.store
                .update_create_and_expiration_date(&cluster.name, cluster.create_time, expiration)
                .await?;
            report.updated.push(cluster.name.clone());
        }

        for name in &diff.removed {
            info!(cluster = %name, "Detected removal");
            self.store.delete(name).await?;
            report.removed.push(name.clone());
        }

        Ok((report, listing))
    }

    /// Delete expired, non-ignored clusters from GKE. Only the initial
    /// expired-records query can fail the phase as a whole.
    pub async fn cleanup(&self, listing: &[RemoteCluster], now: DateTime<Utc>) -> Result<CleanupReport> {
        let expired = self.store.list_expired(now).await?;
        let mut report = CleanupReport::default();

        for record in expired {
            if !record.is_deletion_candidate(now) {
                debug!(cluster = %record.name, "Expired but ignored");
                report.skipped_ignored.push(record.name);
                continue;
            }

            match self.delete_remote(listing, &record.name).await {
                Ok(()) => {
                    info!(cluster = %record.name, expiration = %record.expiration_date, "Removed expired cluster");
                    report.deleted.push(record.name);
                }
                Err(e) => {
                    error!(cluster = %record.name, error = %e, "Failed to delete expired cluster. Skipping.");
                    report.failed.push((record.name, e.to_string()));
                }
            }
        }

        Ok(report)
    }

    async fn delete_remote(&self, listing: &[RemoteCluster], name: &str) -> Result<()> {
        let location = listing
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.location.as_str())
            .ok_or_else(|| Error::LocationNotFound(name.to_string()))?;

        self.inventory
            .delete_cluster(&cluster_resource_name(&self.project, location, name))
            .await
    }
}
