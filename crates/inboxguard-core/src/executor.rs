// ── Autofix execution ──
//
// Changes are applied one at a time. Before each one the zone is re-read
// and the change re-derived, so anything satisfied since planning is
// skipped and a create that became an update is applied as the update.
// A failure is recorded and the next change is attempted. Nothing is
// rolled back.

use tracing::{debug, error, info, warn};

use crate::compliance::snapshot_from_records;
use crate::config::DesiredStateConfig;
use crate::desired::desired_state;
use crate::domain;
use crate::error::CoreError;
use crate::lookup::RecordSetLookup;
use crate::model::{ApplyResult, AutofixPlan, ChangeAction, ChangeEntry, FailedChange};
use crate::planner::diff;
use crate::provider::DnsProvider;

pub struct AutofixExecutor<'a, P> {
    provider: &'a P,
    config: &'a DesiredStateConfig,
}

impl<'a, P: DnsProvider> AutofixExecutor<'a, P> {
    pub fn new(provider: &'a P, config: &'a DesiredStateConfig) -> Self {
        Self { provider, config }
    }

    /// Apply `plan`. Only setup problems (no credential, invalid zone or
    /// config) are errors; per-change failures are reported in the result.
    pub async fn apply(&self, plan: &AutofixPlan) -> Result<ApplyResult, CoreError> {
        if !self.provider.can_mutate() {
            return Err(CoreError::MissingCredential {
                operation: "autofix apply".into(),
            });
        }
        let zone = domain::normalize(&plan.zone)?;
        let desired = desired_state(&zone, self.config)?;
        let mut result = ApplyResult::default();

        for planned in &plan.changes {
            let current = match self.provider.list_records(&zone).await {
                Ok(records) => records,
                Err(e) => {
                    error!(zone = %zone, name = %planned.name, error = %e, "cannot re-read zone before change");
                    result.failed.push(failure(planned, &e));
                    continue;
                }
            };

            let Some(todo) = diff(&desired, &current, self.config.reconcile_extras)
                .into_iter()
                .find(|c| c.same_target(planned))
            else {
                debug!(name = %planned.name, action = %planned.action, "already satisfied, skipping");
                result.skipped.push(planned.clone());
                continue;
            };

            match self.apply_change(&zone, &todo).await {
                Ok(()) => {
                    info!(action = %todo.action, record_type = %todo.record_type, name = %todo.name, "applied change");
                    result.applied.push(todo);
                }
                Err(e) if todo.action == ChangeAction::Create && e.is_conflict() => {
                    info!(name = %todo.name, "record already exists, treating create as applied");
                    result.applied.push(todo);
                }
                Err(e) => {
                    error!(action = %todo.action, name = %todo.name, error = %e, "change failed");
                    result.failed.push(failure(&todo, &e));
                }
            }
        }

        match self.provider.list_records(&zone).await {
            Ok(records) => {
                let snapshot = snapshot_from_records(&RecordSetLookup::new(records), &zone);
                if !snapshot.is_compliant() {
                    warn!(zone = %zone, "postcheck still reports non-compliant state");
                }
                result.postcheck = Some(snapshot);
            }
            Err(e) => {
                warn!(zone = %zone, error = %e, "postcheck fetch failed");
                result.postcheck_error = Some(e.to_string());
            }
        }

        Ok(result)
    }

    async fn apply_change(&self, zone: &str, change: &ChangeEntry) -> Result<(), CoreError> {
        match change.action {
            ChangeAction::Create => {
                let record = target(change)?;
                self.provider.create_record(zone, &record).await.map(|_| ())
            }
            ChangeAction::Update => {
                let record = target(change)?;
                let id = record_id(change)?;
                self.provider.update_record(zone, id, &record).await.map(|_| ())
            }
            ChangeAction::Delete => self.provider.delete_record(zone, record_id(change)?).await,
        }
    }
}

fn target(change: &ChangeEntry) -> Result<crate::model::DnsRecord, CoreError> {
    change
        .target_record()
        .ok_or_else(|| CoreError::Internal(format!("{} for {} has no new value", change.action, change.name)))
}

fn record_id(change: &ChangeEntry) -> Result<&str, CoreError> {
    change
        .record_id
        .as_deref()
        .ok_or_else(|| CoreError::Internal(format!("{} for {} has no record id", change.action, change.name)))
}

fn failure(change: &ChangeEntry, err: &CoreError) -> FailedChange {
    FailedChange {
        change: change.clone(),
        error: err.to_string(),
        transient: err.is_transient(),
    }
}
