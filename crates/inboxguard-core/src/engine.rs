// ── Engine facade ──
//
// One entry point per external interface: compliance check, autofix,
// DKIM apply, presend check, alerts. Stateless between calls; every
// request re-reads provider state.

use tracing::{debug, info, warn};

use crate::alerts;
use crate::compliance;
use crate::config::{DesiredStateConfig, EngineConfig};
use crate::dkim;
use crate::domain;
use crate::error::CoreError;
use crate::executor::AutofixExecutor;
use crate::lookup::{DnsLookup, RecordSetLookup, ResolverLookup};
use crate::model::{
    AlertEvent, AutofixPlan, ComplianceSnapshot, DkimPostcheck, PresendDecision, PresendInput,
    SpamMetric,
};
use crate::planner::AutofixPlanner;
use crate::presend;
use crate::provider::{DnsProvider, HttpDnsProvider, HttpMetricsSource, MetricsSource};
use crate::requests::{
    AlertsRequest, AutofixRequest, AutofixResponse, CheckSource, ComplianceReport,
    ComplianceRequest, DkimApplyRequest, DkimApplyResponse, PresendRequest,
};

/// Longest metrics window the alerts interface accepts.
pub const MAX_ALERT_DAYS: u32 = 365;

/// The compliance and autofix engine over a DNS provider and an optional
/// metrics source.
pub struct Engine<P, M> {
    provider: P,
    metrics: Option<M>,
    live: Option<ResolverLookup>,
    desired: DesiredStateConfig,
}

/// Engine wired to the HTTP collaborators.
pub type HttpEngine = Engine<HttpDnsProvider, HttpMetricsSource>;

impl HttpEngine {
    pub fn from_config(config: EngineConfig) -> Result<Self, CoreError> {
        config.desired.validate()?;
        let provider = HttpDnsProvider::from_config(config.provider)?;
        let metrics = config.metrics.map(HttpMetricsSource::from_config).transpose()?;
        Ok(Self::new(provider, metrics, config.desired))
    }
}

impl<P: DnsProvider, M: MetricsSource> Engine<P, M> {
    pub fn new(provider: P, metrics: Option<M>, desired: DesiredStateConfig) -> Self {
        Self {
            provider,
            metrics,
            live: None,
            desired,
        }
    }

    /// Use `lookup` for [`CheckSource::Live`] instead of the system resolver.
    pub fn with_live_lookup(mut self, lookup: ResolverLookup) -> Self {
        self.live = Some(lookup);
        self
    }

    pub fn desired(&self) -> &DesiredStateConfig {
        &self.desired
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn has_metrics(&self) -> bool {
        self.metrics.is_some()
    }

    fn require_write(&self, operation: &str) -> Result<(), CoreError> {
        if self.provider.can_mutate() {
            Ok(())
        } else {
            Err(CoreError::MissingCredential {
                operation: operation.to_owned(),
            })
        }
    }

    fn live_lookup(&self) -> Result<ResolverLookup, CoreError> {
        match &self.live {
            Some(lookup) => Ok(lookup.clone()),
            None => ResolverLookup::from_system_conf(),
        }
    }

    // ── Compliance ───────────────────────────────────────────────────

    async fn inspect<L: DnsLookup>(
        &self,
        lookup: &L,
        zone: &str,
        fqdn: Option<&str>,
    ) -> Result<(ComplianceSnapshot, Vec<DkimPostcheck>), CoreError> {
        tokio::try_join!(
            compliance::check(lookup, zone, fqdn),
            dkim::postcheck(lookup, zone, &self.desired.dkim_selectors)
        )
    }

    async fn inspect_from(
        &self,
        source: CheckSource,
        zone: &str,
        fqdn: Option<&str>,
    ) -> Result<(ComplianceSnapshot, Vec<DkimPostcheck>), CoreError> {
        match source {
            CheckSource::Provider => {
                let records = self.provider.list_records(zone).await?;
                self.inspect(&RecordSetLookup::new(records), zone, fqdn).await
            }
            CheckSource::Live => {
                let lookup = self.live_lookup()?;
                self.inspect(&lookup, zone, fqdn).await
            }
        }
    }

    /// SPF/DMARC snapshot of a zone.
    pub async fn snapshot(
        &self,
        zone_root: &str,
        fqdn: Option<&str>,
        source: CheckSource,
    ) -> Result<ComplianceSnapshot, CoreError> {
        let zone = domain::normalize(zone_root)?;
        let fqdn = fqdn.map(domain::normalize).transpose()?;
        Ok(self.inspect_from(source, &zone, fqdn.as_deref()).await?.0)
    }

    /// Configured DKIM selectors as currently published.
    pub async fn dkim_status(&self, zone_root: &str, source: CheckSource) -> Result<Vec<DkimPostcheck>, CoreError> {
        let zone = domain::normalize(zone_root)?;
        Ok(self.inspect_from(source, &zone, None).await?.1)
    }

    /// SPF, DMARC, DKIM and the latest metric, fetched concurrently. A
    /// metrics failure degrades to a warning; DNS failures are errors.
    pub async fn compliance_check(&self, req: &ComplianceRequest) -> Result<ComplianceReport, CoreError> {
        let zone = domain::normalize(&req.zone_root)?;
        let fqdn = req.fqdn.as_deref().map(domain::normalize).transpose()?;

        let (dns, metric) = tokio::join!(
            self.inspect_from(req.source, &zone, fqdn.as_deref()),
            self.latest_metric(&zone)
        );
        let (snapshot, dkim) = dns?;

        let mut warnings = Vec::new();
        let latest_metric = metric.unwrap_or_else(|e| {
            warn!(zone = %zone, error = %e, "latest metric unavailable");
            warnings.push(format!("metrics unavailable: {e}"));
            None
        });

        Ok(ComplianceReport {
            zone_root: zone,
            spf: snapshot.spf,
            dmarc: snapshot.dmarc,
            dkim,
            latest_metric,
            warnings,
        })
    }

    // ── Autofix ──────────────────────────────────────────────────────

    pub async fn plan(&self, zone_root: &str) -> Result<AutofixPlan, CoreError> {
        AutofixPlanner::new(&self.provider, &self.desired)
            .plan(zone_root)
            .await
    }

    /// Preview (`apply: false`) or plan-and-apply (`apply: true`).
    pub async fn autofix(&self, req: &AutofixRequest) -> Result<AutofixResponse, CoreError> {
        if req.apply {
            self.require_write("autofix apply")?;
        }
        let plan = self.plan(&req.zone_root).await?;

        if !req.apply {
            return Ok(AutofixResponse {
                success: true,
                applied: false,
                idempotent: plan.idempotent,
                changes: plan.changes,
                skipped: Vec::new(),
                failed: Vec::new(),
                postcheck: None,
                postcheck_error: None,
            });
        }

        let result = AutofixExecutor::new(&self.provider, &self.desired)
            .apply(&plan)
            .await?;
        info!(
            zone = %plan.zone,
            applied = result.applied.len(),
            skipped = result.skipped.len(),
            failed = result.failed.len(),
            "autofix finished"
        );
        Ok(AutofixResponse {
            success: !result.is_partial(),
            applied: true,
            idempotent: plan.idempotent,
            changes: result.applied,
            skipped: result.skipped,
            failed: result.failed,
            postcheck: result.postcheck,
            postcheck_error: result.postcheck_error,
        })
    }

    // ── DKIM ─────────────────────────────────────────────────────────

    /// Plan (and optionally apply) DKIM CNAMEs for the given selectors,
    /// then report what each selector resolves to.
    pub async fn dkim_apply(&self, req: &DkimApplyRequest) -> Result<DkimApplyResponse, CoreError> {
        if req.selectors.is_empty() {
            return Err(CoreError::validation("at least one DKIM selector is required"));
        }
        if req.apply {
            self.require_write("DKIM apply")?;
        }
        let zone = domain::normalize(&req.zone_root)?;
        let config = self.desired.dkim_only(req.selectors.clone());
        let plan = AutofixPlanner::new(&self.provider, &config).plan(&zone).await?;

        let (plan_preview, changes, failed) = if req.apply {
            let result = AutofixExecutor::new(&self.provider, &config).apply(&plan).await?;
            (None, Some(result.applied), result.failed)
        } else {
            (Some(plan.changes), None, Vec::new())
        };

        let (postcheck, postcheck_error) = match self.provider.list_records(&zone).await {
            Ok(records) => {
                let lookup = RecordSetLookup::new(records);
                (dkim::postcheck(&lookup, &zone, &req.selectors).await?, None)
            }
            Err(e) if req.apply => {
                warn!(zone = %zone, error = %e, "DKIM postcheck fetch failed");
                (Vec::new(), Some(e.to_string()))
            }
            Err(e) => return Err(e),
        };

        Ok(DkimApplyResponse {
            plan: plan_preview,
            changes,
            failed,
            postcheck,
            postcheck_error,
        })
    }

    // ── Presend ──────────────────────────────────────────────────────

    pub async fn presend_check(&self, req: &PresendRequest) -> Result<PresendDecision, CoreError> {
        let domain = domain::normalize(&req.domain)?;

        let (snapshot, metric) = tokio::join!(
            self.snapshot(&domain, None, CheckSource::Provider),
            self.latest_metric(&domain)
        );
        let input = PresendInput {
            domain,
            raw_headers: req.raw_headers.clone(),
            latest_metric: metric?,
            compliance: snapshot?,
            acknowledgments: req.allow_override.then(|| req.acknowledgments.clone()),
        };

        let decision = presend::decide(&input);
        debug!(domain = %input.domain, decision = %decision.decision, reasons = decision.reasons.len(), "presend decision");
        Ok(decision)
    }

    // ── Metrics & alerts ─────────────────────────────────────────────

    fn metrics_source(&self) -> Result<&M, CoreError> {
        self.metrics.as_ref().ok_or_else(|| CoreError::Config {
            message: "no metrics source configured".into(),
        })
    }

    /// Latest metric for a domain; `None` when no metrics source is configured.
    pub async fn latest_metric(&self, domain_name: &str) -> Result<Option<SpamMetric>, CoreError> {
        match &self.metrics {
            Some(source) => source.latest(domain_name).await,
            None => Ok(None),
        }
    }

    pub async fn metrics_window(&self, domain_name: Option<&str>, days: u32) -> Result<Vec<SpamMetric>, CoreError> {
        validate_days(days)?;
        let domain_name = domain_name.map(domain::normalize).transpose()?;
        self.metrics_source()?.window(domain_name.as_deref(), days).await
    }

    pub async fn alerts(&self, req: &AlertsRequest) -> Result<Vec<AlertEvent>, CoreError> {
        let domain_name = req.domain.as_deref().map(domain::normalize).transpose()?;
        let rows = self.metrics_window(domain_name.as_deref(), req.days).await?;
        Ok(alerts::derive(domain_name.as_deref(), &rows))
    }
}

fn validate_days(days: u32) -> Result<(), CoreError> {
    if (1..=MAX_ALERT_DAYS).contains(&days) {
        Ok(())
    } else {
        Err(CoreError::validation(format!(
            "days must be between 1 and {MAX_ALERT_DAYS} (got {days})"
        )))
    }
}
