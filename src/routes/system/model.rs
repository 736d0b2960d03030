use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::metrics::TaskStats;

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub active_users: usize,
    pub avg_response_time: f64,
    pub error_rate: f64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub tasks: TaskStats,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub database: bool,
    pub cache: bool,
    pub api: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub checks: HealthChecks,
}
