use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// `{success, data}` wrapper used by the metrics service.
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_success() -> bool {
    true
}

/// One day of reputation data for a domain.
///
/// `domain` is only present when the window query spans all domains.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MetricRow {
    #[serde(default)]
    pub domain: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub spam_rate: Option<f64>,
    #[serde(default)]
    pub domain_reputation: Option<String>,
}
