mod cmd_serve;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use allurex_runner::config::{
    ExporterConfig, DEFAULT_BIND, DEFAULT_INTERVAL_SECS, DEFAULT_NAMESPACE, DEFAULT_PORT,
    DEFAULT_STALE_AFTER_SECS,
};

#[derive(Parser, Debug)]
#[command(
    name = "allurex",
    version,
    about = "Serve Allure report results as Prometheus metrics"
)]
struct Cli {
    /// Allure report directory (the one holding widgets/ and data/)
    report_dir: PathBuf,
    /// Port for the /metrics and /health endpoints
    #[arg(default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Address to listen on
    #[arg(long, default_value = DEFAULT_BIND)]
    bind: String,
    /// Seconds between report re-reads
    #[arg(long, default_value_t = DEFAULT_INTERVAL_SECS)]
    interval_secs: u64,
    /// Report unhealthy when the last successful update is older than this
    #[arg(long, default_value_t = DEFAULT_STALE_AFTER_SECS)]
    stale_after_secs: u64,
    /// Metric name prefix ("" for none)
    #[arg(long, default_value = DEFAULT_NAMESPACE)]
    namespace: String,
    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<ExporterConfig> {
        Ok(ExporterConfig::new(
            self.report_dir,
            self.bind,
            self.port,
            self.interval_secs,
            self.stale_after_secs,
            &self.namespace,
        )?)
    }
}

fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_filter))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("cannot install log subscriber: {e}"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;
    let config = cli.into_config()?;
    cmd_serve::execute(config)
}
