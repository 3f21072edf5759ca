//! Domain counters, exported through the Prometheus recorder installed by
//! `service_core::observability::init_metrics`.

use crate::models::AnalysisSource;

pub fn record_analysis(endpoint: &'static str, source: AnalysisSource) {
    metrics::counter!(
        "leaf_analysis_total",
        "endpoint" => endpoint,
        "source" => source.as_str()
    )
    .increment(1);
}

pub fn record_chat(outcome: &'static str) {
    metrics::counter!("chat_replies_total", "outcome" => outcome).increment(1);
}

pub fn record_report() {
    metrics::counter!("reports_generated_total").increment(1);
}
