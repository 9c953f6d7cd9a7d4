use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::net::SocketAddr;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Installs the global Prometheus recorder without a listener; callers
    /// render the exposition text themselves.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Installs the recorder and serves `/metrics` on `addr`. Must run inside
/// the tokio runtime.
pub fn serve(addr: SocketAddr) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .with_context(|| format!("prometheus: listen on {addr}"))?;
    ensure_metrics_described();
    tracing::info!(%addr, "metrics exporter listening");
    Ok(())
}

pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "harvest_items_total",
            "Candidate URLs processed, labelled by outcome."
        );
        describe_counter!(
            "harvest_source_errors_total",
            "Sources that failed to build or enumerate."
        );
        describe_counter!(
            "harvest_upserts_total",
            "Store writes, labelled by action."
        );
        describe_counter!("harvest_expired_total", "Records flipped to expired.");
        describe_histogram!(
            "harvest_source_duration_ms",
            "Wall time per source scrape in milliseconds."
        );
        describe_gauge!(
            "harvest_last_run_ts",
            "Unix ts when the last harvest run finished."
        );
    });
}
