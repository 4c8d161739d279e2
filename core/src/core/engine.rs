use std::sync::Arc;

use futures::future::join_all;
use log::{debug, error, info, warn};
use tokio::sync::{mpsc, Semaphore};

use crate::core::collector::{SignalCollector, SimulatedCollector};
use crate::core::report::AuditReport;
use crate::core::snapshot::SecuritySnapshot;
use crate::core::target_manager::TargetManager;
use crate::core::validator;
use crate::core::Locale;
use crate::error::AuditError;
use crate::store::{AuditId, AuditStore, NewAuditRecord};

/// Result of auditing one raw input.
#[derive(Debug)]
pub struct AuditOutcome {
    pub input: String,
    pub result: Result<AuditReport, AuditError>,
}

/// Audit pipeline driver
///
/// For each input the engine:
/// 1. Validates and normalizes the URL
/// 2. Collects a security snapshot (falling back to a failure snapshot)
/// 3. Scores the snapshot and generates findings, recommendations and next steps
///
/// A single audit is synchronous; [`AuditEngine::run`] fans a whole target
/// list out over concurrent tasks.
pub struct AuditEngine {
    collector: Arc<dyn SignalCollector>,
    locale: Locale,
    concurrency_limit: usize,
}

impl AuditEngine {
    pub fn new(collector: Arc<dyn SignalCollector>, locale: Locale, concurrency_limit: usize) -> Self {
        Self {
            collector,
            locale,
            concurrency_limit: concurrency_limit.max(1),
        }
    }

    /// Engine backed by the simulated collector with random metrics.
    pub fn simulated(locale: Locale, concurrency_limit: usize) -> Self {
        Self::new(Arc::new(SimulatedCollector::new()), locale, concurrency_limit)
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// Runs the full pipeline on one input.
    pub fn audit(&self, input: &str) -> Result<AuditReport, AuditError> {
        run_pipeline(self.collector.as_ref(), self.locale, input)
    }

    /// Audits `input` and stores the result under `user_id`.
    pub async fn audit_and_save(
        &self,
        input: &str,
        user_id: &str,
        store: &dyn AuditStore,
    ) -> Result<(AuditId, AuditReport), AuditError> {
        let report = self.audit(input)?;
        save_report(store, user_id, report).await
    }

    /// Audits every queued target, sending each outcome through `result_tx`.
    ///
    /// The receiving side must be drained concurrently (see
    /// [`ReportAggregator::run`](crate::core::result_aggregator::ReportAggregator::run)),
    /// otherwise tasks block once the channel is full.
    pub async fn run(&self, mut targets: TargetManager, result_tx: mpsc::Sender<AuditOutcome>) {
        let semaphore = Arc::new(Semaphore::new(self.concurrency_limit));
        let mut tasks = Vec::new();

        while let Some(input) = targets.next() {
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };

            let collector = Arc::clone(&self.collector);
            let locale = self.locale;
            let tx = result_tx.clone();

            tasks.push(tokio::spawn(async move {
                let _permit = permit;
                let result = run_pipeline(collector.as_ref(), locale, &input);
                if tx.send(AuditOutcome { input, result }).await.is_err() {
                    debug!("Outcome receiver dropped, discarding result");
                }
            }));
        }

        drop(result_tx);

        for joined in join_all(tasks).await {
            if let Err(e) = joined {
                error!("Audit task failed: {}", e);
            }
        }
    }
}

/// Persists `report`; a store failure hands the report back inside the error.
pub async fn save_report(
    store: &dyn AuditStore,
    user_id: &str,
    report: AuditReport,
) -> Result<(AuditId, AuditReport), AuditError> {
    match store.create(NewAuditRecord::completed(user_id, &report)).await {
        Ok(id) => {
            debug!("Saved audit {} for {} as #{}", report.url, user_id, id);
            Ok((id, report))
        }
        Err(source) => {
            error!("Audit of {} computed but not saved: {}", report.url, source);
            Err(AuditError::Persistence {
                report: Box::new(report),
                source,
            })
        }
    }
}

fn run_pipeline(
    collector: &dyn SignalCollector,
    locale: Locale,
    input: &str,
) -> Result<AuditReport, AuditError> {
    let url = validator::normalize_url(input)?;

    let snapshot = match collector.collect(&url) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Signal acquisition failed for {}: {}", url, e);
            SecuritySnapshot::unreachable(&e)
        }
    };

    let report = AuditReport::from_snapshot(url, &snapshot, locale);
    info!(
        "Audited {} (score {}, grade {}, {} vulnerabilities)",
        report.url,
        report.score,
        report.grade,
        report.vulnerabilities.len()
    );
    Ok(report)
}
