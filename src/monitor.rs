//! Per-host polling supervisor.
//!
//! [`Monitor`] spawns one task per registered host. Every task probes its
//! host on a fixed interval, classifies the outcome and appends it to the
//! host's record. Shutdown is broadcast through a single watch channel and
//! [`Monitor::stop`] joins every task before returning.
//!
//! Cancellation is only observed between ticks. A probe already in flight
//! when `stop` is called runs to completion and is recorded.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::model::ProbeResult;
use crate::prober::Prober;
use crate::registry::{HostRegistry, SharedRecord};

/// Polling behaviour shared by all hosts.
#[derive(Debug, Clone, Copy)]
pub struct MonitorSettings {
    pub interval: Duration,
    pub verbose: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            verbose: false,
        }
    }
}

pub struct Monitor {
    registry: Arc<HostRegistry>,
    prober: Arc<dyn Prober>,
    settings: MonitorSettings,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl Monitor {
    pub fn new(
        registry: Arc<HostRegistry>,
        prober: Arc<dyn Prober>,
        settings: MonitorSettings,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            registry,
            prober,
            settings,
            shutdown,
            tasks: Vec::new(),
        }
    }

    /// Spawn one polling task per host. Call once; later calls are ignored.
    pub fn start(&mut self) {
        if !self.tasks.is_empty() {
            tracing::warn!("Monitor already started");
            return;
        }

        for (host, record) in self.registry.iter() {
            let poller = HostPoller {
                host: host.to_string(),
                record: Arc::clone(record),
                prober: Arc::clone(&self.prober),
                settings: self.settings,
            };
            let shutdown = self.shutdown.subscribe();
            self.tasks.push(tokio::spawn(poller.run(shutdown)));
        }

        tracing::info!(
            hosts = self.tasks.len(),
            interval = ?self.settings.interval,
            "Monitoring started"
        );
    }

    /// Number of running polling tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Signal every task and wait until all of them have exited.
    ///
    /// No task touches the registry once this returns.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);

        let total = self.tasks.len();
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Polling task panicked");
            }
        }
        tracing::info!(hosts = total, "Monitoring stopped");
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("hosts", &self.registry.len())
            .field("settings", &self.settings)
            .field("tasks", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

/// State owned by a single host's polling task.
struct HostPoller {
    host: String,
    record: SharedRecord,
    prober: Arc<dyn Prober>,
    settings: MonitorSettings,
}

impl HostPoller {
    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let interval = self.settings.interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = ticker.tick() => self.poll_once().await,
            }
        }

        if self.settings.verbose {
            tracing::info!(host = %self.host, "Stopped monitoring");
        } else {
            tracing::debug!(host = %self.host, "Stopped monitoring");
        }
    }

    /// Probe, classify, record. The lock is only held for the append.
    async fn poll_once(&self) {
        let start = std::time::Instant::now();
        let outcome = self.prober.ping(&self.host).await;

        if let Err(e) = &outcome {
            if self.settings.verbose {
                tracing::warn!(host = %self.host, error = %e, "Ping failed");
            }
        }

        let result = ProbeResult::from_outcome(&outcome, Utc::now().timestamp());
        self.record.lock().await.add_result(result);

        if self.settings.verbose {
            tracing::info!(
                "{} -> {} | latency: {:.2}ms | loss: {:.2}% | cycle took: {:?}",
                self.host,
                result.status,
                result.latency,
                result.packet_loss,
                start.elapsed()
            );
        }
    }
}
