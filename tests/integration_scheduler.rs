mod common;

use async_trait::async_trait;
use cadence_server::adapters::push::{ApnsRequest, GatewayError, PushGateway};
use cadence_server::adapters::snapshot::SnapshotStore;
use cadence_server::domain::push::{
    Expiration, Message, Priority, PushRequest, PushType, Schedule, UNTIL_CANCELLED,
};
use cadence_server::domain::schedule::ScheduledPushStatus;
use cadence_server::services::dispatcher::PushDispatcher;
use cadence_server::services::scheduler::PushScheduler;
use cadence_server::workers::SchedulerWorker;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Default)]
struct CountingGateway {
    calls: AtomicUsize,
}

impl CountingGateway {
    fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PushGateway for CountingGateway {
    async fn send_push(&self, _request: &ApnsRequest) -> Result<(), GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct FailingGateway;

#[async_trait]
impl PushGateway for FailingGateway {
    async fn send_push(&self, _request: &ApnsRequest) -> Result<(), GatewayError> {
        Err(GatewayError::BadDeviceToken)
    }
}

fn request(message: Message, occurrences: i64, interval: i64, send_at: OffsetDateTime) -> PushRequest {
    PushRequest {
        id: Uuid::new_v4(),
        device_token: "deadbeef0123".into(),
        push_type: PushType::Alert,
        expiration: Expiration::Immediately,
        priority: Priority::Immediately,
        apns_id: None,
        topic: "com.example.app".into(),
        collapse_id: None,
        message,
        schedule: Schedule { occurrences, interval, send_at },
    }
}

struct Harness {
    scheduler: Arc<PushScheduler>,
    worker: SchedulerWorker,
    gateway: Arc<CountingGateway>,
    _snapshot_dir: tempfile::TempDir,
}

fn harness_with_gateway(gateway: Arc<dyn PushGateway>) -> (Arc<PushScheduler>, SchedulerWorker, tempfile::TempDir) {
    common::setup_tracing();
    let snapshot_dir = tempfile::tempdir().expect("tempdir");
    let config = common::test_config(&snapshot_dir.path().join("snapshot.json"));
    let scheduler = Arc::new(PushScheduler::new());
    let worker = SchedulerWorker::new(
        Arc::clone(&scheduler),
        PushDispatcher::new(gateway),
        SnapshotStore::new(&config.scheduler.snapshot_path),
        &config.scheduler,
    );
    (scheduler, worker, snapshot_dir)
}

fn harness() -> Harness {
    let gateway = Arc::new(CountingGateway::default());
    let (scheduler, worker, snapshot_dir) = harness_with_gateway(Arc::clone(&gateway) as Arc<dyn PushGateway>);
    Harness { scheduler, worker, gateway, _snapshot_dir: snapshot_dir }
}

#[tokio::test]
async fn test_one_shot_delivers_once_and_finishes() {
    let h = harness();
    let request = request(Message::Alert("hi".into()), 1, 0, OffsetDateTime::now_utc());
    h.scheduler.schedule(&request).await.unwrap();

    h.worker.run_tick().await;

    assert_eq!(h.gateway.count(), 1);
    assert_eq!(h.scheduler.status(request.id).await, Some(ScheduledPushStatus::Finished { id: request.id }));

    // The id never reappears in the active set; further ticks deliver nothing.
    h.worker.run_tick().await;
    h.worker.run_tick().await;
    assert_eq!(h.gateway.count(), 1);
}

#[tokio::test]
async fn test_fixed_count_delivers_n_times_then_finishes() {
    let h = harness();
    let request = request(Message::Alert("again".into()), 3, 0, OffsetDateTime::now_utc());
    h.scheduler.schedule(&request).await.unwrap();

    h.worker.run_tick().await;
    assert_eq!(h.gateway.count(), 1);
    match h.scheduler.status(request.id).await {
        Some(ScheduledPushStatus::Scheduled { remaining_occurrences, .. }) => {
            assert_eq!(remaining_occurrences, 2);
        }
        other => panic!("unexpected status: {other:?}"),
    }

    h.worker.run_tick().await;
    h.worker.run_tick().await;
    assert_eq!(h.gateway.count(), 3);
    assert_eq!(h.scheduler.status(request.id).await, Some(ScheduledPushStatus::Finished { id: request.id }));
}

#[tokio::test]
async fn test_interval_rearms_into_the_future() {
    let h = harness();
    let before = OffsetDateTime::now_utc();
    let request = request(Message::Alert("hourly".into()), 2, 3600, before);
    h.scheduler.schedule(&request).await.unwrap();

    h.worker.run_tick().await;
    assert_eq!(h.gateway.count(), 1);

    match h.scheduler.status(request.id).await {
        Some(ScheduledPushStatus::Scheduled { remaining_occurrences, next_push, .. }) => {
            assert_eq!(remaining_occurrences, 1);
            assert!(next_push >= before + Duration::seconds(3600));
        }
        other => panic!("unexpected status: {other:?}"),
    }

    // Not due again within the same test run.
    h.worker.run_tick().await;
    assert_eq!(h.gateway.count(), 1);
}

#[tokio::test]
async fn test_until_cancelled_keeps_firing_until_cancel() {
    let h = harness();
    let request = request(Message::Background, UNTIL_CANCELLED, 0, OffsetDateTime::now_utc());
    h.scheduler.schedule(&request).await.unwrap();

    for _ in 0..4 {
        h.worker.run_tick().await;
    }
    assert_eq!(h.gateway.count(), 4);
    match h.scheduler.status(request.id).await {
        Some(ScheduledPushStatus::Scheduled { remaining_occurrences, .. }) => {
            assert_eq!(remaining_occurrences, UNTIL_CANCELLED);
        }
        other => panic!("unexpected status: {other:?}"),
    }

    h.scheduler.cancel(request.id).await;
    h.worker.run_tick().await;
    assert_eq!(h.gateway.count(), 4);
    assert_eq!(h.scheduler.status(request.id).await, None);
}

#[tokio::test]
async fn test_cancel_before_due_prevents_delivery() {
    let h = harness();
    let request =
        request(Message::Alert("later".into()), 1, 0, OffsetDateTime::now_utc() + Duration::hours(1));
    h.scheduler.schedule(&request).await.unwrap();

    h.scheduler.cancel(request.id).await;
    for _ in 0..3 {
        h.worker.run_tick().await;
    }

    assert_eq!(h.gateway.count(), 0);
    assert_eq!(h.scheduler.status(request.id).await, None);
}

#[tokio::test]
async fn test_unsupported_message_moves_to_errored_without_disturbing_the_tick() {
    let h = harness();
    let now = OffsetDateTime::now_utc();

    let bad = request(Message::Other(serde_json::json!({"sound": "woof"})), 1, 0, now);
    let good = request(Message::Alert("fine".into()), 1, 0, now);
    h.scheduler.schedule(&bad).await.unwrap();
    h.scheduler.schedule(&good).await.unwrap();

    h.worker.run_tick().await;

    // The good entry delivered in the same tick.
    assert_eq!(h.gateway.count(), 1);
    assert_eq!(h.scheduler.status(good.id).await, Some(ScheduledPushStatus::Finished { id: good.id }));

    match h.scheduler.status(bad.id).await {
        Some(ScheduledPushStatus::Failed { reason, .. }) => {
            assert!(reason.contains("Unsupported message type"), "reason was: {reason}");
        }
        other => panic!("unexpected status: {other:?}"),
    }

    // Errored entries are never retried.
    h.worker.run_tick().await;
    assert_eq!(h.gateway.count(), 1);
}

#[tokio::test]
async fn test_gateway_failure_is_terminal_for_the_entry() {
    let (scheduler, worker, _dir) = harness_with_gateway(Arc::new(FailingGateway));
    let request = request(Message::Alert("doomed".into()), 5, 0, OffsetDateTime::now_utc());
    scheduler.schedule(&request).await.unwrap();

    worker.run_tick().await;
    assert!(matches!(scheduler.status(request.id).await, Some(ScheduledPushStatus::Failed { .. })));

    // No automatic retry on later ticks.
    worker.run_tick().await;
    assert!(matches!(scheduler.status(request.id).await, Some(ScheduledPushStatus::Failed { .. })));
}

#[tokio::test]
async fn test_worker_loop_delivers_shortly_after_send_at() {
    let h = harness();
    let request =
        request(Message::Alert("soon".into()), 1, 0, OffsetDateTime::now_utc() + Duration::milliseconds(200));
    h.scheduler.schedule(&request).await.unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let worker_handle = tokio::spawn(h.worker.run(shutdown_rx));

    let mut finished = false;
    let start = std::time::Instant::now();
    while start.elapsed() < std::time::Duration::from_secs(5) {
        if h.scheduler.status(request.id).await == Some(ScheduledPushStatus::Finished { id: request.id }) {
            finished = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
    }

    let _ = shutdown_tx.send(true);
    let _ = worker_handle.await;

    assert!(finished, "one-shot push should finish once its send time passes");
    assert_eq!(h.gateway.count(), 1);
}
