use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Spam rate at or above which a send is blocked and an alert is critical.
pub const SPAM_RATE_CRITICAL: f64 = 0.30;
/// Spam rate at or above which an alert is raised.
pub const SPAM_RATE_WARNING: f64 = 0.25;

/// Domain reputation as reported by the metrics source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Reputation {
    High,
    Medium,
    Low,
    Bad,
    #[serde(other)]
    Unknown,
}

impl Reputation {
    pub fn from_report(raw: &str) -> Self {
        raw.trim().parse().unwrap_or(Self::Unknown)
    }

    /// LOW or BAD.
    pub fn is_poor(self) -> bool {
        matches!(self, Self::Low | Self::Bad)
    }
}

/// One day of reputation data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpamMetric {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub date: NaiveDate,
    /// Fraction of delivered mail marked as spam (`0.30` is 30%).
    pub spam_rate: Option<f64>,
    pub domain_reputation: Option<Reputation>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Severity {
    Warning,
    Critical,
}

/// A threshold crossing found in a metrics window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub domain: String,
    pub date: NaiveDate,
    pub severity: Severity,
    pub reason: String,
}

/// Coarse spam-rate band shown alongside metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum SpamVerdict {
    Low,
    Elevated,
    High,
}

impl SpamVerdict {
    pub fn for_rate(rate: f64) -> Self {
        if rate >= SPAM_RATE_CRITICAL {
            Self::High
        } else if rate >= SPAM_RATE_WARNING {
            Self::Elevated
        } else {
            Self::Low
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Low => "Excellent deliverability. Mail is likely reaching the inbox.",
            Self::Elevated => "Elevated risk. Monitor closely and review sending practices.",
            Self::High => "High risk. Immediate action required to prevent delivery issues.",
        }
    }

    pub fn recommendations(self) -> &'static [&'static str] {
        match self {
            Self::Low => &[
                "Maintain current sending practices",
                "Continue monitoring metrics",
                "Keep list hygiene protocols",
            ],
            Self::Elevated => &[
                "Review message content for spam triggers",
                "Check list acquisition methods",
                "Improve engagement rates",
                "Segment lists by engagement",
            ],
            Self::High => &[
                "Pause bulk campaigns immediately",
                "Review all recent message content",
                "Remove inactive subscribers",
                "Check for compromised sending infrastructure",
                "Contact the sending provider",
            ],
        }
    }
}

/// Fraction rendered as a percent: `0.3` is `30.00%`.
pub fn format_rate(rate: Option<f64>) -> String {
    rate.map_or_else(|| "-".to_owned(), |r| format!("{:.2}%", r * 100.0))
}
