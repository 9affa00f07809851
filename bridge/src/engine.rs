use std::sync::Arc;

use chrono::{DateTime, Utc};
use infinity_common::{
    CommandKind, CommandOutcome, ConfigDocument, DocumentContext, EngineError, ObservedState,
    PollDecision, ReconciliationEngine, ReportEndpoint, ReportField,
};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info};

/// The reconciliation engine behind its single lock. Each method is one
/// critical section. The newest observed-state snapshot replaces any that
/// the publisher has not picked up yet.
#[derive(Clone)]
pub struct SharedEngine {
    engine: Arc<Mutex<ReconciliationEngine>>,
    telemetry: watch::Sender<ObservedState>,
}

impl SharedEngine {
    pub fn new(engine: ReconciliationEngine, telemetry: watch::Sender<ObservedState>) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            telemetry,
        }
    }

    pub async fn exchange_status(&self, report: Vec<ReportField>) -> PollDecision {
        let ingested = {
            let mut engine = self.engine.lock().await;
            let ingested = engine.exchange_status(report);
            self.telemetry.send_replace(ingested.snapshot.clone());
            ingested
        };

        if ingested.first_contact {
            info!("first status report received, desired configuration seeded");
        }
        let decision = ingested.decision.unwrap_or(PollDecision::NoChange);
        if decision.is_change() {
            info!("responding with change notice");
        }
        decision
    }

    pub async fn ingest_report(&self, endpoint: ReportEndpoint, report: Vec<ReportField>) {
        let decision = {
            let mut engine = self.engine.lock().await;
            let ingested = engine.ingest_report(endpoint, report);
            self.telemetry.send_replace(ingested.snapshot);
            ingested.decision
        };

        if decision.is_some_and(PollDecision::is_change) {
            debug!(
                "{} report ingested, change notice waits for the next status poll",
                endpoint.as_str()
            );
        }
    }

    pub async fn apply_command(
        &self,
        kind: CommandKind,
        value: &str,
    ) -> Result<CommandOutcome, EngineError> {
        self.engine.lock().await.apply_command(kind, value)
    }

    pub async fn config_document(
        &self,
        context: &DocumentContext,
        now: DateTime<Utc>,
    ) -> Result<ConfigDocument, EngineError> {
        self.engine.lock().await.config_document(context, now)
    }

    #[cfg(test)]
    pub async fn has_pending_changes(&self) -> bool {
        self.engine.lock().await.has_pending_changes()
    }
}
