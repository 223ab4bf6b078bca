//! Prometheus metrics for webhook ingestion observability.

use metrics::counter;

/// Initialize metrics exporter (Prometheus).
pub fn init_metrics() {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    if let Err(e) = builder.install() {
        tracing::warn!("Failed to install Prometheus exporter: {}", e);
    }
}

/// Record a webhook received event.
pub fn webhook_received(provider: &'static str, event: &str) {
    counter!("pulse_webhooks_received_total", "provider" => provider, "event" => event.to_string())
        .increment(1);
}

/// Record a rejected webhook request.
pub fn webhook_rejected(reason: &'static str) {
    counter!("pulse_webhooks_rejected_total", "reason" => reason).increment(1);
}

/// Record a pipeline insert/update.
pub fn pipeline_recorded(status: &'static str) {
    counter!("pulse_pipelines_recorded_total", "status" => status).increment(1);
}

/// Record a deployment insert.
pub fn deployment_recorded(environment: &'static str) {
    counter!("pulse_deployments_recorded_total", "environment" => environment).increment(1);
}
