use crate::adapters::snapshot::SnapshotStore;
use crate::config::SchedulerConfig;
use crate::domain::push::PushRequest;
use crate::services::dispatcher::{DispatchError, PushDispatcher};
use crate::services::scheduler::{Advance, PushScheduler};
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::Instrument;

#[derive(Clone, Debug)]
struct Metrics {
    sent: Counter<u64>,
    errors: Counter<u64>,
    retired: Counter<u64>,
    snapshot_failures: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("cadence-server");
        Self {
            sent: meter
                .u64_counter("push_sent_total")
                .with_description("Total number of push notifications successfully dispatched")
                .build(),
            errors: meter
                .u64_counter("push_errors_total")
                .with_description("Total number of scheduled pushes moved to the errored partition")
                .build(),
            retired: meter
                .u64_counter("push_retired_total")
                .with_description("Total number of schedules that delivered their final occurrence")
                .build(),
            snapshot_failures: meter
                .u64_counter("snapshot_failures_total")
                .with_description("Total number of failed snapshot writes")
                .build(),
        }
    }
}

/// The scheduler loop: ticks at a fixed interval, dispatches due entries, and
/// persists the store after each tick. Runs until process shutdown; cancelling
/// individual entries is the only external control surface.
#[derive(Debug)]
pub struct SchedulerWorker {
    scheduler: Arc<PushScheduler>,
    dispatcher: PushDispatcher,
    snapshots: SnapshotStore,
    tick_interval_ms: u64,
    metrics: Metrics,
}

impl SchedulerWorker {
    #[must_use]
    pub fn new(
        scheduler: Arc<PushScheduler>,
        dispatcher: PushDispatcher,
        snapshots: SnapshotStore,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            scheduler,
            dispatcher,
            snapshots,
            tick_interval_ms: config.tick_interval_ms,
            metrics: Metrics::new(),
        }
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(Duration::from_millis(self.tick_interval_ms));

        while !*shutdown.borrow() {
            tokio::select! {
                _ = interval.tick() => {
                    self.run_tick()
                        .instrument(tracing::debug_span!("scheduler_tick"))
                        .await;
                }
                _ = shutdown.changed() => {}
            }
        }
        tracing::info!("Scheduler loop shutting down...");
    }

    /// One due-entry scan. Dispatch failures are terminal for the affected
    /// entry only; a snapshot write failure is logged and never aborts or
    /// delays subsequent ticks.
    pub async fn run_tick(&self) {
        let due = self.scheduler.due_entries(OffsetDateTime::now_utc()).await;
        if !due.is_empty() {
            tracing::debug!(count = due.len(), "Processing due scheduled pushes");
        }

        for entry in due {
            match serde_json::from_slice::<PushRequest>(&entry.payload) {
                Ok(request) => self.deliver_due(&request).await,
                Err(e) => {
                    tracing::error!(id = %entry.id, error = %e, "Stored payload no longer decodes");
                    self.metrics.errors.add(1, &[KeyValue::new("reason", "payload_decode")]);
                    self.scheduler.record_failure(entry.id, format!("payload decode failed: {e}")).await;
                }
            }
        }

        let snapshot = self.scheduler.snapshot().await;
        if let Err(e) = self.snapshots.save(&snapshot).await {
            tracing::error!(error = %e, "Failed to persist scheduler snapshot");
            self.metrics.snapshot_failures.add(1, &[]);
        }
    }

    async fn deliver_due(&self, request: &PushRequest) {
        match self.dispatcher.deliver(request).await {
            Ok(()) => {
                self.metrics.sent.add(1, &[]);
                match self.scheduler.record_success(request.id, OffsetDateTime::now_utc()).await {
                    Some(Advance::Retired) => {
                        self.metrics.retired.add(1, &[]);
                        tracing::info!(id = %request.id, "Schedule delivered its final occurrence");
                    }
                    Some(Advance::Rearmed { next_push }) => {
                        tracing::debug!(id = %request.id, %next_push, "Push delivered, schedule re-armed");
                    }
                    None => {
                        tracing::debug!(id = %request.id, "Entry cancelled while delivery was in flight");
                    }
                }
            }
            Err(e) => {
                let reason = match &e {
                    DispatchError::UnsupportedMessage(_) => "unsupported_message",
                    DispatchError::Delivery(_) => "delivery",
                };
                tracing::warn!(id = %request.id, error = %e, "Push delivery failed, entry moved to errored");
                self.metrics.errors.add(1, &[KeyValue::new("reason", reason)]);
                self.scheduler.record_failure(request.id, e.to_string()).await;
            }
        }
    }
}
