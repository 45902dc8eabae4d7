//! Prometheus metrics & middleware helper.

use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use once_cell::sync::Lazy;

/// Request metrics for every route, exposed at `/metrics`.
pub static METRICS: Lazy<PrometheusMetrics> = Lazy::new(|| {
    PrometheusMetricsBuilder::new("trademarket")
        .endpoint("/metrics")
        .build()
        .expect("metrics builder")
});
