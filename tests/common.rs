use cadence_server::config::{
    ApnsConfig, ApnsEnvironment, Config, LogFormat, SchedulerConfig, ServerConfig, TelemetryConfig,
};
use std::path::Path;
use std::sync::Once;

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("cadence_server=debug".parse().unwrap())
            .add_directive("tower=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}

#[allow(dead_code)]
pub fn test_config(snapshot_path: &Path) -> Config {
    Config {
        server: ServerConfig { host: "127.0.0.1".to_string(), port: 0, shutdown_timeout_secs: 5 },
        scheduler: SchedulerConfig {
            // Fast ticks so lifecycle tests finish quickly
            tick_interval_ms: 20,
            snapshot_path: snapshot_path.display().to_string(),
        },
        apns: ApnsConfig {
            private_key: None,
            key_identifier: "TESTKEY".to_string(),
            team_identifier: "TESTTEAM".to_string(),
            environment: ApnsEnvironment::Sandbox,
            allowed_topic_prefix: None,
        },
        telemetry: TelemetryConfig { otlp_endpoint: None, log_format: LogFormat::Text },
    }
}
