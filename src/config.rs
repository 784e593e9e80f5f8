use clap::{Args, Parser, ValueEnum};

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub scheduler: SchedulerConfig,

    #[command(flatten)]
    pub apns: ApnsConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "CADENCE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "CADENCE_PORT", default_value_t = 4567)]
    pub port: u16,

    /// How long to wait for background tasks during shutdown
    #[arg(long, env = "CADENCE_SHUTDOWN_TIMEOUT_SECS", default_value_t = 10)]
    pub shutdown_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct SchedulerConfig {
    /// How often the scheduler scans for due pushes
    #[arg(long, env = "CADENCE_TICK_INTERVAL_MS", default_value_t = 1000)]
    pub tick_interval_ms: u64,

    /// Where the scheduler persists its state between restarts
    #[arg(long, env = "CADENCE_SNAPSHOT_PATH", default_value = "cadence-snapshot.json")]
    pub snapshot_path: String,
}

#[derive(Clone, Debug, Args)]
pub struct ApnsConfig {
    /// PEM-encoded P-256 private key a real gateway client signs requests with
    #[arg(long, env = "CADENCE_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Key identifier for the signing key
    #[arg(long, env = "CADENCE_KEY_IDENTIFIER", default_value = "")]
    pub key_identifier: String,

    /// Developer team identifier
    #[arg(long, env = "CADENCE_TEAM_IDENTIFIER", default_value = "")]
    pub team_identifier: String,

    /// Which gateway environment to deliver through
    #[arg(long, env = "CADENCE_APNS_ENVIRONMENT", value_enum, default_value = "sandbox")]
    pub environment: ApnsEnvironment,

    /// Only accept requests whose topic starts with this prefix
    #[arg(long, env = "CADENCE_TOPIC")]
    pub allowed_topic_prefix: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ApnsEnvironment {
    Sandbox,
    Production,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// OTLP endpoint for traces and metrics (disabled when absent)
    #[arg(long, env = "CADENCE_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Log output format
    #[arg(long, env = "CADENCE_LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl Config {
    pub fn load() -> Self {
        Self::parse()
    }
}

impl ApnsConfig {
    /// The tenant-isolation predicate handed to the HTTP layer.
    #[must_use]
    pub fn topic_policy(&self) -> TopicPolicy {
        TopicPolicy { allowed_prefix: self.allowed_topic_prefix.clone() }
    }
}

/// Decides whether a request's topic is acceptable for this deployment. With
/// no configured prefix, every topic is allowed.
#[derive(Clone, Debug)]
pub struct TopicPolicy {
    allowed_prefix: Option<String>,
}

impl TopicPolicy {
    #[must_use]
    pub fn allows(&self, topic: &str) -> bool {
        self.allowed_prefix.as_deref().is_none_or(|prefix| topic.starts_with(prefix))
    }
}
