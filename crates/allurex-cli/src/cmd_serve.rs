use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use allurex_core::FsSource;
use allurex_metrics::MetricStore;
use allurex_runner::{ExporterConfig, HealthReporter, Orchestrator, Scheduler};
use allurex_serve::ServeConfig;

pub fn execute(config: ExporterConfig) -> anyhow::Result<()> {
    tokio::runtime::Runtime::new()?.block_on(run(config))
}

async fn run(config: ExporterConfig) -> anyhow::Result<()> {
    if !config.report_dir.is_dir() {
        warn!(
            report_dir = %config.report_dir.display(),
            "report directory does not exist yet; cycles will fail until it does"
        );
    }
    info!(
        report_dir = %config.report_dir.display(),
        interval_secs = config.interval.as_secs(),
        stale_after_secs = config.stale_after.as_secs(),
        namespace = config.namespace.as_str(),
        "starting allurex"
    );

    let store = Arc::new(MetricStore::new());
    let source = Arc::new(FsSource::new(&config.report_dir));
    let orchestrator = Arc::new(Orchestrator::new(source, Arc::clone(&store)));
    let scheduler = Arc::new(Scheduler::new(orchestrator));
    let health = HealthReporter::new(Arc::clone(&store), config.stale_after);

    let shutdown = ctrlc_cancel();
    let handle = scheduler.start(config.interval);
    let result = allurex_serve::serve(
        ServeConfig {
            listen_addr: config.listen_addr(),
        },
        store,
        health,
        config.namespace.clone(),
        shutdown.cancelled_owned(),
    )
    .await;

    handle.stop().await;
    info!("allurex stopped");
    result
}

/// Ctrl-C and SIGTERM cancel the returned token.
fn ctrlc_cancel() -> CancellationToken {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("shutdown requested");
        on_signal.cancel();
    }) {
        warn!(error = %e, "cannot install signal handler; stop the process with SIGKILL");
    }
    cancel
}
