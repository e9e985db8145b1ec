use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    metrics::describe_counter!(
        "achievement_transitions_total",
        "Applied achievement status transitions"
    );
    metrics::describe_counter!("media_uploads_total", "Stored achievement media objects");
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn record_transition(transition: &'static str) {
    metrics::counter!("achievement_transitions_total", "transition" => transition).increment(1);
}

pub(crate) fn record_media_upload(kind: &'static str, bytes: i64) {
    metrics::counter!("media_uploads_total", "kind" => kind).increment(1);
    metrics::histogram!("media_upload_bytes", "kind" => kind).record(bytes as f64);
}
