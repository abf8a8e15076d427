// In-memory collaborators shared by the engine and monitor tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::NaiveDate;

use inboxguard_core::{
    CoreError, DesiredStateConfig, DkimSelector, DnsProvider, DnsRecord, MetricsSource,
    RecordType, Reputation, SpamMetric,
};

pub const ZONE: &str = "example.com";

// ── Provider ────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeProvider {
    records: Mutex<Vec<DnsRecord>>,
    next_id: AtomicUsize,
    read_only: bool,
    /// Mutations addressing these names fail with a transient error.
    failing: HashSet<String>,
    /// Creates at these names race another writer: the record lands,
    /// but the call reports a conflict.
    racing: HashSet<String>,
    list_fails: AtomicBool,
    pub lists: AtomicUsize,
    pub writes: AtomicUsize,
}

impl FakeProvider {
    pub fn new(records: Vec<DnsRecord>) -> Self {
        let provider = Self::default();
        for record in records {
            provider.insert(record);
        }
        provider
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn failing_on(mut self, name: &str) -> Self {
        self.failing.insert(name.to_owned());
        self
    }

    pub fn racing_on(mut self, name: &str) -> Self {
        self.racing.insert(name.to_owned());
        self
    }

    pub fn set_list_failure(&self, fail: bool) {
        self.list_fails.store(fail, Ordering::SeqCst);
    }

    pub fn insert(&self, mut record: DnsRecord) -> String {
        let id = format!("rec-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        record.id = Some(id.clone());
        self.records.lock().unwrap().push(record);
        id
    }

    pub fn records(&self) -> Vec<DnsRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn named(&self, name: &str) -> Vec<DnsRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.name == name)
            .collect()
    }

    fn check_write(&self, name: &str) -> Result<(), CoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(name) {
            return Err(CoreError::Transient {
                attempts: 3,
                status: Some(503),
                message: "service unavailable".into(),
            });
        }
        Ok(())
    }
}

impl DnsProvider for FakeProvider {
    fn can_mutate(&self) -> bool {
        !self.read_only
    }

    async fn list_records(&self, zone_root: &str) -> Result<Vec<DnsRecord>, CoreError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        if self.list_fails.load(Ordering::SeqCst) {
            return Err(CoreError::ConnectionFailed {
                url: "https://dns.test".into(),
                reason: "connection refused".into(),
            });
        }
        if zone_root != ZONE {
            return Err(CoreError::ZoneNotFound {
                zone: zone_root.to_owned(),
            });
        }
        Ok(self.records())
    }

    async fn create_record(&self, _zone_root: &str, record: &DnsRecord) -> Result<DnsRecord, CoreError> {
        self.check_write(&record.name)?;
        let id = self.insert(record.clone());
        if self.racing.contains(&record.name) {
            return Err(CoreError::Conflict {
                message: "An identical record already exists.".into(),
            });
        }
        Ok(DnsRecord {
            id: Some(id),
            ..record.clone()
        })
    }

    async fn update_record(
        &self,
        _zone_root: &str,
        record_id: &str,
        record: &DnsRecord,
    ) -> Result<DnsRecord, CoreError> {
        self.check_write(&record.name)?;
        let mut records = self.records.lock().unwrap();
        let existing = records
            .iter_mut()
            .find(|r| r.id.as_deref() == Some(record_id))
            .ok_or_else(|| CoreError::Api {
                message: "record not found".into(),
                code: None,
                status: Some(404),
            })?;
        existing.content.clone_from(&record.content);
        existing.ttl = record.ttl;
        Ok(existing.clone())
    }

    async fn delete_record(&self, _zone_root: &str, record_id: &str) -> Result<(), CoreError> {
        let name = self
            .records()
            .into_iter()
            .find(|r| r.id.as_deref() == Some(record_id))
            .map(|r| r.name)
            .unwrap_or_default();
        self.check_write(&name)?;
        self.records
            .lock()
            .unwrap()
            .retain(|r| r.id.as_deref() != Some(record_id));
        Ok(())
    }
}

// ── Metrics ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeMetrics {
    pub latest: Option<SpamMetric>,
    pub rows: Vec<SpamMetric>,
    pub fail: bool,
}

impl FakeMetrics {
    fn outage() -> CoreError {
        CoreError::Transient {
            attempts: 3,
            status: Some(502),
            message: "bad gateway".into(),
        }
    }
}

impl MetricsSource for FakeMetrics {
    async fn latest(&self, _domain: &str) -> Result<Option<SpamMetric>, CoreError> {
        if self.fail {
            return Err(Self::outage());
        }
        Ok(self.latest.clone())
    }

    async fn window(&self, domain: Option<&str>, _days: u32) -> Result<Vec<SpamMetric>, CoreError> {
        if self.fail {
            return Err(Self::outage());
        }
        Ok(self
            .rows
            .iter()
            .filter(|r| domain.is_none() || r.domain.as_deref() == domain)
            .cloned()
            .collect())
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
}

pub fn metric(d: u32, rate: Option<f64>, rep: Option<Reputation>) -> SpamMetric {
    SpamMetric {
        domain: Some(ZONE.to_owned()),
        date: day(d),
        spam_rate: rate,
        domain_reputation: rep,
    }
}

pub fn selector(host: &str, target: &str) -> DkimSelector {
    DkimSelector {
        host: host.to_owned(),
        target: target.to_owned(),
        ttl: None,
    }
}

pub fn desired() -> DesiredStateConfig {
    DesiredStateConfig {
        spf_includes: vec!["_spf.esp.example".into()],
        dmarc_rua: Some("dmarc@example.com".into()),
        dkim_selectors: vec![selector("s1._domainkey", "s1.dkim.esp.example")],
        ..DesiredStateConfig::default()
    }
}

pub fn txt(name: &str, content: &str) -> DnsRecord {
    DnsRecord::new(RecordType::Txt, name, content, 300)
}

pub fn cname(name: &str, target: &str) -> DnsRecord {
    DnsRecord::new(RecordType::Cname, name, target, 300)
}

/// A zone that already matches [`desired`].
pub fn compliant_zone() -> Vec<DnsRecord> {
    vec![
        txt(ZONE, "v=spf1 include:_spf.esp.example ~all"),
        txt("_dmarc.example.com", "v=DMARC1; p=quarantine; rua=mailto:dmarc@example.com"),
        cname("s1._domainkey.example.com", "s1.dkim.esp.example"),
    ]
}
