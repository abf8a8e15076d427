// inboxguard-core: compliance analysis, autofix planning and presend gating on top of inboxguard-api.

pub mod alerts;
pub mod analyze;
pub mod compliance;
pub mod config;
pub mod convert;
pub mod desired;
pub mod dkim;
pub mod domain;
pub mod engine;
pub mod error;
pub mod executor;
pub mod lookup;
pub mod model;
pub mod monitor;
pub mod planner;
pub mod presend;
pub mod provider;
pub mod requests;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{
    ClientConfig, CredentialHeader, DEFAULT_TTL, DesiredStateConfig, DkimSelector, EngineConfig,
    RetryPolicy, TlsMode,
};
pub use engine::{Engine, HttpEngine, MAX_ALERT_DAYS};
pub use error::CoreError;
pub use executor::AutofixExecutor;
pub use lookup::{DnsLookup, RecordSetLookup, ResolverLookup};
pub use monitor::{MonitorConfig, QuickStatus, StatusMonitor, Tile};
pub use planner::AutofixPlanner;
pub use provider::{DnsProvider, HttpDnsProvider, HttpMetricsSource, MetricsSource};
pub use requests::{
    AlertsRequest, AutofixRequest, AutofixResponse, CheckSource, ComplianceReport,
    ComplianceRequest, DkimApplyRequest, DkimApplyResponse, PresendRequest,
};
pub use store::{DomainSelection, FileStore, KeyValueStore, MemoryStore, MetricHistory};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    // Records
    DnsRecord, RecordPurpose, RecordType,
    // Compliance
    ComplianceSnapshot, DkimPostcheck, DmarcCheck, DmarcPolicy, SpfCheck, SpfStatus,
    // Autofix
    ApplyResult, AutofixPlan, ChangeAction, ChangeEntry, FailedChange,
    // Metrics / alerts
    AlertEvent, Reputation, Severity, SpamMetric, SpamVerdict,
    // Presend
    Decision, PresendDecision, PresendInput,
};
