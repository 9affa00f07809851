use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::{
    codec::ReportField,
    config::DocumentContext,
    documents::ConfigDocument,
    error::EngineError,
    state::{DesiredConfig, ObservedState},
    types::{CommandKind, CommandOutcome, PollDecision, ReportEndpoint},
};

/// Result of ingesting one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingested {
    /// `None` for endpoints that never signal config changes.
    pub decision: Option<PollDecision>,
    /// True when this report performed the one-time seeding.
    pub first_contact: bool,
    /// Full observed state after the merge, for republishing.
    pub snapshot: ObservedState,
}

/// Holds what the device reported and what the operator wants, and decides
/// when the device has to be told to fetch its configuration.
#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    monitored: HashSet<String>,
    observed: ObservedState,
    desired: DesiredConfig,
    changes_pending: bool,
    awaiting_first_contact: bool,
    /// Setpoint commanded before first contact while no mode was known.
    /// Applied to the setpoint of the seeded mode.
    deferred_setpoint: Option<String>,
}

impl ReconciliationEngine {
    pub fn new<I, S>(monitored: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            monitored: monitored.into_iter().map(Into::into).collect(),
            observed: ObservedState::default(),
            desired: DesiredConfig::default(),
            changes_pending: false,
            awaiting_first_contact: true,
            deferred_setpoint: None,
        }
    }

    pub fn observed(&self) -> &ObservedState {
        &self.observed
    }

    pub fn desired(&self) -> &DesiredConfig {
        &self.desired
    }

    pub fn has_pending_changes(&self) -> bool {
        self.changes_pending
    }

    pub fn is_awaiting_first_contact(&self) -> bool {
        self.awaiting_first_contact
    }

    pub fn ingest_report(
        &mut self,
        endpoint: ReportEndpoint,
        report: Vec<ReportField>,
    ) -> Ingested {
        self.observed.merge(report, &self.monitored, endpoint.keeps_first_occurrence());

        let first_contact = endpoint == ReportEndpoint::Status && self.awaiting_first_contact;
        if first_contact {
            self.seed_desired();
        }

        let decision = match endpoint {
            ReportEndpoint::EquipmentEvents => None,
            _ if first_contact => Some(PollDecision::NoChange),
            _ => Some(PollDecision::from_pending(self.changes_pending)),
        };

        Ingested {
            decision,
            first_contact,
            snapshot: self.observed.clone(),
        }
    }

    /// Clears the tracker when it was set; the only place that does.
    pub fn poll_status(&mut self) -> PollDecision {
        let decision = PollDecision::from_pending(self.changes_pending);
        self.changes_pending = false;
        decision
    }

    /// A `/status` report followed by its poll. The first report never
    /// announces changes; pending ones are announced on the next poll.
    pub fn exchange_status(&mut self, report: Vec<ReportField>) -> Ingested {
        let mut ingested = self.ingest_report(ReportEndpoint::Status, report);
        if !ingested.first_contact {
            ingested.decision = Some(self.poll_status());
        }
        ingested
    }

    pub fn apply_command(
        &mut self,
        kind: CommandKind,
        value: &str,
    ) -> Result<CommandOutcome, EngineError> {
        match kind {
            CommandKind::Mode => self.desired.mode = Some(value.to_string()),
            CommandKind::Fan => self.desired.fan = value.to_string(),
            CommandKind::Hold => self.desired.hold = value.to_string(),
            CommandKind::Setpoint => return self.apply_setpoint(value),
        }
        self.changes_pending = true;
        Ok(CommandOutcome::Applied)
    }

    pub fn config_document(
        &self,
        context: &DocumentContext,
        now: DateTime<Utc>,
    ) -> Result<ConfigDocument, EngineError> {
        let resolved = self.desired.resolved()?;
        Ok(ConfigDocument::new(context, &resolved, now))
    }

    fn seed_desired(&mut self) {
        self.desired.seed_from(&self.observed);
        self.awaiting_first_contact = false;

        if let Some(setpoint) = self.deferred_setpoint.take() {
            if let Some(slot) = self.desired.active_setpoint() {
                *slot = Some(setpoint);
            }
        }
    }

    /// Before first contact there is nothing to compare against, so the
    /// value is always kept: in the setpoint of the commanded mode, or held
    /// back until seeding reveals the mode. It never lands in both setpoints.
    fn apply_setpoint(&mut self, value: &str) -> Result<CommandOutcome, EngineError> {
        let setpoint = truncate_setpoint(value)?;

        if self.awaiting_first_contact {
            match self.desired.active_setpoint() {
                Some(slot) => {
                    *slot = Some(setpoint);
                    self.deferred_setpoint = None;
                }
                None => self.deferred_setpoint = Some(setpoint),
            }
            self.changes_pending = true;
            return Ok(CommandOutcome::Applied);
        }

        let Some(slot) = self.desired.active_setpoint() else {
            return Ok(CommandOutcome::Ignored);
        };
        if slot.as_deref() == Some(setpoint.as_str()) {
            return Ok(CommandOutcome::Ignored);
        }

        *slot = Some(setpoint);
        self.changes_pending = true;
        Ok(CommandOutcome::Applied)
    }
}

/// Integer portion of a decimal setpoint payload: everything before the
/// first `.`, so `"72.5"` -> `"72"`. A leading `+` is dropped.
pub fn truncate_setpoint(value: &str) -> Result<String, EngineError> {
    let invalid = || EngineError::InvalidSetpoint(value.to_string());
    let all_digits = |part: &str| part.bytes().all(|byte| byte.is_ascii_digit());

    let trimmed = value.trim();
    let (integer, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    let (sign, digits) = match integer.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", integer.strip_prefix('+').unwrap_or(integer)),
    };

    if digits.is_empty() || !all_digits(digits) || !all_digits(fraction) {
        return Err(invalid());
    }
    Ok(format!("{sign}{digits}"))
}
