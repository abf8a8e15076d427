// ── Alert derivation ──
//
// Scans a metrics window for threshold crossings. Derived on demand,
// never stored.

use crate::model::metrics::format_rate;
use crate::model::{
    AlertEvent, Reputation, SPAM_RATE_CRITICAL, SPAM_RATE_WARNING, Severity, SpamMetric,
};

/// Severity and reason for one row, or `None` if it crosses nothing.
pub fn evaluate(metric: &SpamMetric) -> Option<(Severity, String)> {
    let mut triggered: Vec<(Severity, String)> = Vec::new();

    if let Some(rate) = metric.spam_rate {
        if rate >= SPAM_RATE_CRITICAL {
            triggered.push((
                Severity::Critical,
                format!("spam rate {} >= {}", format_rate(Some(rate)), format_rate(Some(SPAM_RATE_CRITICAL))),
            ));
        } else if rate >= SPAM_RATE_WARNING {
            triggered.push((
                Severity::Warning,
                format!("spam rate {} >= {}", format_rate(Some(rate)), format_rate(Some(SPAM_RATE_WARNING))),
            ));
        }
    }

    match metric.domain_reputation {
        Some(Reputation::Bad) => triggered.push((Severity::Critical, "domain reputation BAD".into())),
        Some(Reputation::Low) => triggered.push((Severity::Warning, "domain reputation LOW".into())),
        _ => {}
    }

    let severity = triggered.iter().map(|(s, _)| *s).max()?;
    let reason = triggered
        .into_iter()
        .map(|(_, r)| r)
        .collect::<Vec<_>>()
        .join("; ");
    Some((severity, reason))
}

/// Alerts for a window, newest first. Rows without a domain are
/// attributed to `domain`.
pub fn derive(domain: Option<&str>, rows: &[SpamMetric]) -> Vec<AlertEvent> {
    let mut events: Vec<AlertEvent> = rows
        .iter()
        .filter_map(|row| {
            let (severity, reason) = evaluate(row)?;
            Some(AlertEvent {
                domain: row
                    .domain
                    .clone()
                    .or_else(|| domain.map(str::to_owned))
                    .unwrap_or_default(),
                date: row.date,
                severity,
                reason,
            })
        })
        .collect();

    events.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.domain.cmp(&b.domain)));
    events
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn row(day: u32, rate: Option<f64>, rep: Option<Reputation>) -> SpamMetric {
        SpamMetric {
            domain: None,
            date: NaiveDate::from_ymd_opt(2026, 10, day).unwrap_or_default(),
            spam_rate: rate,
            domain_reputation: rep,
        }
    }

    #[test]
    fn warning_band() {
        let (sev, reason) = evaluate(&row(1, Some(0.26), None)).unwrap_or((Severity::Critical, String::new()));
        assert_eq!(sev, Severity::Warning);
        assert!(reason.contains("26.00%"));
    }

    #[test]
    fn critical_by_rate_or_reputation() {
        assert_eq!(evaluate(&row(1, Some(0.31), None)).map(|a| a.0), Some(Severity::Critical));
        assert_eq!(
            evaluate(&row(1, Some(0.01), Some(Reputation::Bad))).map(|a| a.0),
            Some(Severity::Critical)
        );
        assert_eq!(
            evaluate(&row(1, None, Some(Reputation::Low))).map(|a| a.0),
            Some(Severity::Warning)
        );
    }

    #[test]
    fn quiet_rows_produce_nothing() {
        assert!(evaluate(&row(1, Some(0.1), Some(Reputation::High))).is_none());
        assert!(evaluate(&row(1, None, None)).is_none());
    }

    #[test]
    fn combined_reasons_take_highest_severity() {
        let (sev, reason) = evaluate(&row(1, Some(0.27), Some(Reputation::Bad))).unwrap_or((Severity::Warning, String::new()));
        assert_eq!(sev, Severity::Critical);
        assert!(reason.contains("spam rate"));
        assert!(reason.contains("BAD"));
    }

    #[test]
    fn derive_sorts_newest_first() {
        let rows = vec![
            row(1, Some(0.26), None),
            row(3, Some(0.31), None),
            row(2, Some(0.10), None),
        ];
        let alerts = derive(Some("example.com"), &rows);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].date.to_string(), "2026-10-03");
        assert_eq!(alerts[0].domain, "example.com");
        assert_eq!(alerts[1].severity, Severity::Warning);
    }
}
