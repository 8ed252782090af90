//! Full re-submission of a set of artefacts.
//!
//! # Responsibilities
//! - Submit every artefact of a manifest, independently
//! - Report failures without stopping the batch
//! - Optionally repeat on an interval and whenever the manifest changes
//! - Collapse bursts of manifest updates and skip unchanged manifests
//!
//! Re-submitting is safe because `submit` is idempotent; this is the
//! caller-level repair for routes left half-applied by an earlier failure.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time;

use crate::artefact::{Artefact, ArtefactManifest};
use crate::discovery::ServiceDiscovery;
use crate::router_api::RouterApi;
use crate::routing::reconciler::{ReconcileError, RouteReconciler};

const UPDATE_SETTLE: Duration = Duration::from_millis(250);

/// One artefact that could not be submitted.
#[derive(Debug)]
pub struct SyncFailure {
    pub label: String,
    pub error: ReconcileError,
}

/// Outcome of a batch submission.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub submitted: usize,
    pub failed: Vec<SyncFailure>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Submit every artefact, continuing past failures.
pub async fn sync_all(
    artefacts: &[Artefact],
    router: Arc<dyn RouterApi>,
    discovery: Arc<dyn ServiceDiscovery>,
) -> SyncReport {
    let mut report = SyncReport::default();

    for artefact in artefacts {
        let reconciler = RouteReconciler::new(artefact, router.clone(), discovery.clone());
        match reconciler.submit().await {
            Ok(()) => report.submitted += 1,
            Err(error) => {
                let label = artefact.label();
                tracing::error!(artefact = %label, error = %error, "Failed to submit artefact");
                report.failed.push(SyncFailure { label, error });
            }
        }
    }

    tracing::info!(
        submitted = report.submitted,
        failed = report.failed.len(),
        "Sync finished"
    );
    report
}

/// Long-running re-sync loop.
pub struct SyncService {
    manifest_path: PathBuf,
    manifest: ArtefactManifest,
    interval: Option<Duration>,
    router: Arc<dyn RouterApi>,
    discovery: Arc<dyn ServiceDiscovery>,
}

impl SyncService {
    pub fn new(
        manifest_path: PathBuf,
        manifest: ArtefactManifest,
        interval: Option<Duration>,
        router: Arc<dyn RouterApi>,
        discovery: Arc<dyn ServiceDiscovery>,
    ) -> Self {
        Self {
            manifest_path,
            manifest,
            interval,
            router,
            discovery,
        }
    }

    /// Sync once, then again on every tick and every manifest update until
    /// shutdown. Returns the report of the last completed sync.
    pub async fn run(
        mut self,
        mut updates: mpsc::UnboundedReceiver<ArtefactManifest>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> SyncReport {
        tracing::info!(
            manifest = ?self.manifest_path,
            interval_secs = self.interval.map(|i| i.as_secs()),
            "Sync service starting"
        );

        let mut report = self.sync().await;
        let mut ticker = self.interval.map(|period| {
            let mut ticker = time::interval_at(time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
            ticker
        });

        let mut watching = true;
        loop {
            tokio::select! {
                _ = tick(ticker.as_mut()) => {
                    report = self.sync().await;
                }
                update = updates.recv(), if watching => match update {
                    Some(manifest) => {
                        let manifest = settle(manifest, &mut updates).await;
                        if manifest == self.manifest {
                            tracing::debug!("Manifest unchanged, skipping sync");
                            continue;
                        }
                        tracing::info!(artefacts = manifest.artefacts.len(), "Manifest reloaded");
                        self.manifest = manifest;
                        report = self.sync().await;
                    }
                    None => {
                        // Watcher gone; only the interval can trigger a sync now.
                        watching = false;
                        if ticker.is_none() {
                            break;
                        }
                    }
                },
                _ = shutdown.recv() => {
                    tracing::info!("Sync service received shutdown signal, exiting loop");
                    break;
                }
            }
        }

        report
    }

    async fn sync(&self) -> SyncReport {
        sync_all(
            &self.manifest.artefacts,
            self.router.clone(),
            self.discovery.clone(),
        )
        .await
    }
}

/// Let a burst of updates (one editor save can emit several) settle and
/// keep only the newest.
async fn settle(
    mut latest: ArtefactManifest,
    updates: &mut mpsc::UnboundedReceiver<ArtefactManifest>,
) -> ArtefactManifest {
    time::sleep(UPDATE_SETTLE).await;
    while let Ok(next) = updates.try_recv() {
        latest = next;
    }
    latest
}

async fn tick(ticker: Option<&mut time::Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
