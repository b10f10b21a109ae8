//! Cycle scheduling engine.
//!
//! Runs two periodic loops on the tokio runtime: cheap status-only
//! cycles at a short interval and full discovery cycles at a long one.
//! A shared async mutex serializes the loops so two cycles never
//! mutate the store at the same time.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{interval, Duration};

use hostwatch_store::StoreClient;

use crate::config::DiscoverConfig;
use crate::error::Result;
use crate::probe::NmapProbe;
use crate::reconcile;

/// Which cycle a scheduler loop drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleKind {
    Full,
    Status,
}

/// The scheduler owns the probe, the store handle, and the cycle lock.
pub struct CycleScheduler {
    config: DiscoverConfig,
    probe: Arc<NmapProbe>,
    store: StoreClient,
    cycle_lock: Arc<Mutex<()>>,
}

impl CycleScheduler {
    pub fn new(config: DiscoverConfig, probe: NmapProbe, store: StoreClient) -> Self {
        Self {
            config,
            probe: Arc::new(probe),
            store,
            cycle_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Run both loops until the runtime shuts down.
    pub async fn run(&self) -> Result<()> {
        let full = self.spawn_loop(CycleKind::Full, self.config.full_interval_secs);
        let status = self.spawn_loop(CycleKind::Status, self.config.status_interval_secs);

        tracing::info!(
            network = %self.config.network,
            full_interval_secs = self.config.full_interval_secs,
            status_interval_secs = self.config.status_interval_secs,
            "Scheduler started"
        );

        for handle in [full, status] {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Cycle task panicked");
            }
        }

        Ok(())
    }

    fn spawn_loop(&self, kind: CycleKind, interval_secs: u64) -> tokio::task::JoinHandle<()> {
        let probe = self.probe.clone();
        let store = self.store.clone();
        let target = self.config.network.clone();
        let lock = self.cycle_lock.clone();

        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(interval_secs));
            loop {
                ticker.tick().await;

                // One cycle at a time: full and status cycles must not
                // interleave their read/write phases on the store.
                let _guard = lock.lock().await;

                let result = match kind {
                    CycleKind::Full => reconcile::run_full_cycle(&*probe, &store, &target)
                        .await
                        .map(|_| ()),
                    CycleKind::Status => reconcile::run_status_cycle(&*probe, &store, &target)
                        .await
                        .map(|_| ()),
                };

                // A failed cycle skips to the next scheduled attempt.
                if let Err(e) = result {
                    tracing::error!(kind = ?kind, error = %e, "Scheduled cycle failed");
                }
            }
        })
    }
}
