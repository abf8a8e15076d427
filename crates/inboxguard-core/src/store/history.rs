use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::KeyValueStore;
use crate::domain;
use crate::error::CoreError;
use crate::model::SpamMetric;

const KEY_PREFIX: &str = "postmaster_history:";

/// Per-domain metric history, one row per date, ascending.
#[derive(Debug)]
pub struct MetricHistory<S> {
    store: S,
}

impl<S: KeyValueStore> MetricHistory<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn key(domain_name: &str) -> Result<String, CoreError> {
        Ok(format!("{KEY_PREFIX}{}", domain::normalize(domain_name)?))
    }

    pub fn load(&self, domain_name: &str) -> Result<Vec<SpamMetric>, CoreError> {
        match self.store.get(&Self::key(domain_name)?)? {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| CoreError::Storage {
                message: format!("history for {domain_name} is corrupt: {e}"),
            }),
            None => Ok(Vec::new()),
        }
    }

    /// Merge `rows` into the stored history. A row for a date already
    /// present replaces the stored one. Returns the merged history.
    pub fn append(&self, domain_name: &str, rows: &[SpamMetric]) -> Result<Vec<SpamMetric>, CoreError> {
        let mut by_date: BTreeMap<NaiveDate, SpamMetric> = self
            .load(domain_name)?
            .into_iter()
            .map(|row| (row.date, row))
            .collect();
        for row in rows {
            by_date.insert(row.date, row.clone());
        }
        let merged: Vec<SpamMetric> = by_date.into_values().collect();

        let raw = serde_json::to_string(&merged).map_err(|e| CoreError::Internal(e.to_string()))?;
        self.store.set(&Self::key(domain_name)?, raw)?;
        Ok(merged)
    }

    pub fn clear(&self, domain_name: &str) -> Result<(), CoreError> {
        self.store.remove(&Self::key(domain_name)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn row(day: u32, rate: f64) -> SpamMetric {
        SpamMetric {
            domain: None,
            date: NaiveDate::from_ymd_opt(2026, 9, day).unwrap(),
            spam_rate: Some(rate),
            domain_reputation: None,
        }
    }

    #[test]
    fn append_dedupes_by_date_and_sorts() {
        let history = MetricHistory::new(MemoryStore::new());
        history.append("example.com", &[row(3, 0.1), row(1, 0.2)]).unwrap();
        let merged = history.append("Example.com", &[row(2, 0.3), row(3, 0.4)]).unwrap();

        let days: Vec<u32> = merged.iter().map(|r| chrono::Datelike::day(&r.date)).collect();
        assert_eq!(days, vec![1, 2, 3]);
        assert_eq!(merged[2].spam_rate, Some(0.4));
        assert_eq!(history.load("example.com").unwrap(), merged);
    }

    #[test]
    fn clear_removes_only_that_domain() {
        let history = MetricHistory::new(MemoryStore::new());
        history.append("a.example", &[row(1, 0.1)]).unwrap();
        history.append("b.example", &[row(1, 0.1)]).unwrap();
        history.clear("a.example").unwrap();
        assert!(history.load("a.example").unwrap().is_empty());
        assert_eq!(history.load("b.example").unwrap().len(), 1);
    }
}
