#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

use cadence_server::adapters::push::apns::ApnsClient;
use cadence_server::adapters::snapshot::SnapshotStore;
use cadence_server::config::Config;
use cadence_server::services::dispatcher::PushDispatcher;
use cadence_server::services::scheduler::PushScheduler;
use cadence_server::workers::SchedulerWorker;
use cadence_server::{api, telemetry};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    let telemetry_guard = telemetry::init_telemetry(&config.telemetry)?;

    cadence_server::setup_panic_hook();

    let boot_span = tracing::info_span!("boot_server");
    let (listener, app_router, shutdown_tx, shutdown_rx, worker) = async {
        // Phase 1: Durable state
        let snapshots = SnapshotStore::new(&config.scheduler.snapshot_path);
        let scheduler = Arc::new(PushScheduler::from_snapshot(snapshots.load().await));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        cadence_server::spawn_signal_handler(shutdown_tx.clone());

        // Phase 2: Component wiring
        let gateway = Arc::new(ApnsClient::new(&config.apns));
        let dispatcher = PushDispatcher::new(gateway);
        let worker = SchedulerWorker::new(Arc::clone(&scheduler), dispatcher, snapshots, &config.scheduler);

        // Phase 3: Listener and router
        let app_router = api::app_router(config.clone(), scheduler);
        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
        tracing::info!(address = %addr, "listening");
        let listener = tokio::net::TcpListener::bind(addr).await?;

        Ok::<_, anyhow::Error>((listener, app_router, shutdown_tx, shutdown_rx, worker))
    }
    .instrument(boot_span)
    .await?;

    // Phase 4: Start runtime
    let worker_task = tokio::spawn(worker.run(shutdown_rx.clone()));

    let mut serve_rx = shutdown_rx;
    let server = axum::serve(listener, app_router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            let _ = serve_rx.wait_for(|&stopping| stopping).await;
        });

    if let Err(e) = server.await {
        tracing::error!(error = %e, "Server error");
    }

    // Phase 5: Graceful shutdown
    let _ = shutdown_tx.send(true);
    tokio::select! {
        _ = worker_task => {
            tracing::info!("Background tasks finished.");
        }
        () = tokio::time::sleep(std::time::Duration::from_secs(config.server.shutdown_timeout_secs)) => {
            tracing::warn!("Timeout waiting for background tasks to finish.");
        }
    }

    telemetry_guard.shutdown();
    Ok(())
}
