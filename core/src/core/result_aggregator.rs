use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;

use log::warn;
use tokio::sync::mpsc;
use url::Url;

use crate::core::engine::{save_report, AuditOutcome};
use crate::core::report::AuditReport;
use crate::error::AuditError;
use crate::store::{AuditId, AuditStore};
use crate::SinkRef;

/// Where completed reports get persisted.
pub struct StoreTarget {
    pub store: Arc<dyn AuditStore>,
    pub user_id: String,
}

/// What a batch produced.
#[derive(Debug, Default)]
pub struct AuditSummary {
    pub reports: Vec<AuditReport>,
    pub saved: Vec<AuditId>,
    pub rejected: Vec<String>,
    pub unsaved: usize,
    pub duplicates: usize,
}

impl AuditSummary {
    /// True when every input produced a report and every save succeeded.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.unsaved == 0
    }
}

/// Builds a deduplication key from scheme, host and path.
fn build_dedup_key(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => format!(
            "{}://{}{}",
            parsed.scheme(),
            parsed.host_str().unwrap_or(""),
            parsed.path().trim_end_matches('/')
        ),
        Err(_) => url.to_string(),
    }
}

fn append_jsonl(out: &mut impl Write, report: &AuditReport) -> std::io::Result<()> {
    let line = serde_json::to_string(report)?;
    writeln!(out, "{}", line)
}

/// Collects, deduplicates, persists and reports audit outcomes.
pub struct ReportAggregator;

impl ReportAggregator {
    pub async fn run(
        mut receiver: mpsc::Receiver<AuditOutcome>,
        total: usize,
        output_path: Option<&str>,
        store: Option<StoreTarget>,
        sink: SinkRef,
    ) -> AuditSummary {
        let mut file = match output_path {
            Some(path) => match std::fs::OpenOptions::new().create(true).append(true).open(path) {
                Ok(f) => Some(f),
                Err(e) => {
                    sink.on_log("error", &format!("[!] Failed to open output file '{}': {}", path, e));
                    None
                }
            },
            None => None,
        };

        let mut summary = AuditSummary::default();
        let mut seen = HashSet::new();
        let mut done = 0;

        while let Some(outcome) = receiver.recv().await {
            done += 1;
            sink.on_progress("Auditing", done, total);

            let report = match outcome.result {
                Ok(report) => report,
                Err(e) => {
                    warn!("Skipping {:?}: {}", outcome.input, e);
                    sink.on_log("warn", &format!("[!] {}", e));
                    summary.rejected.push(outcome.input);
                    continue;
                }
            };

            if !seen.insert(build_dedup_key(&report.url)) {
                summary.duplicates += 1;
                continue;
            }

            let report = match &store {
                Some(target) => match save_report(target.store.as_ref(), &target.user_id, report).await {
                    Ok((id, report)) => {
                        summary.saved.push(id);
                        report
                    }
                    Err(AuditError::Persistence { report, source }) => {
                        sink.on_log(
                            "error",
                            &format!("[!] Audit of {} computed but not saved: {}", report.url, source),
                        );
                        summary.unsaved += 1;
                        *report
                    }
                    Err(e) => {
                        sink.on_log("error", &format!("[!] {}", e));
                        summary.unsaved += 1;
                        continue;
                    }
                },
                None => report,
            };

            sink.on_report(&report);

            if let Some(f) = file.as_mut() {
                if let Err(e) = append_jsonl(f, &report) {
                    warn!("Failed to write {} to output file: {}", report.url, e);
                    sink.on_log("warn", &format!("[!] Failed to write {} to output file: {}", report.url, e));
                }
            }

            summary.reports.push(report);
        }

        summary
    }

    pub fn report_summary(summary: &AuditSummary, sink: &SinkRef) {
        if summary.reports.is_empty() {
            sink.on_log("warn", "[!] No audit completed.");
        } else {
            sink.on_log("phase", &format!("[+] {} audit(s) completed:", summary.reports.len()));
            for (i, report) in summary.reports.iter().enumerate() {
                let level = if report.score >= 70 {
                    "success"
                } else if report.score >= 40 {
                    "warn"
                } else {
                    "error"
                };
                sink.on_log(
                    level,
                    &format!(
                        "  #{} {} -> score {}/100 (grade {}, {} vulnerabilities)",
                        i + 1,
                        report.url,
                        report.score,
                        report.grade,
                        report.vulnerabilities.len()
                    ),
                );
            }
        }

        if !summary.rejected.is_empty() {
            sink.on_log("error", &format!("[!] {} invalid input(s) skipped.", summary.rejected.len()));
        }
        if summary.unsaved > 0 {
            sink.on_log("error", &format!("[!] {} audit(s) could not be saved.", summary.unsaved));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collector::{FixedMetrics, SimulatedCollector};
    use crate::core::engine::AuditEngine;
    use crate::core::target_manager::TargetManager;
    use crate::core::Locale;
    use crate::store::MemoryStore;
    use crate::AuditEventSink;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        logs: Mutex<Vec<(String, String)>>,
        reports: Mutex<Vec<String>>,
        progress: Mutex<Vec<(usize, usize)>>,
    }

    impl AuditEventSink for RecordingSink {
        fn on_log(&self, level: &str, message: &str) {
            self.logs.lock().unwrap().push((level.to_string(), message.to_string()));
        }
        fn on_report(&self, report: &AuditReport) {
            self.reports.lock().unwrap().push(report.url.clone());
        }
        fn on_progress(&self, _phase: &str, current: usize, total: usize) {
            self.progress.lock().unwrap().push((current, total));
        }
    }

    fn engine() -> AuditEngine {
        AuditEngine::new(
            Arc::new(SimulatedCollector::with_metrics(FixedMetrics::with_load_time(1.5))),
            Locale::En,
            2,
        )
    }

    #[test]
    fn test_dedup_key_ignores_trailing_slash() {
        assert_eq!(build_dedup_key("https://a.com/"), build_dedup_key("https://a.com"));
        assert_ne!(build_dedup_key("http://a.com"), build_dedup_key("https://a.com"));
    }

    #[tokio::test]
    async fn test_aggregates_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.jsonl");
        let output_str = output.to_str().unwrap().to_string();

        let store = Arc::new(MemoryStore::new());
        let sink = Arc::new(RecordingSink::default());
        let sink_ref: SinkRef = sink.clone();

        let targets = TargetManager::from_inputs(["a.com", "https://a.com/", "b.com", "nope"]);
        let total = targets.len();
        let (tx, rx) = mpsc::channel(2);
        let engine = engine();

        let (_, summary) = tokio::join!(
            engine.run(targets, tx),
            ReportAggregator::run(
                rx,
                total,
                Some(output_str.as_str()),
                Some(StoreTarget { store: store.clone(), user_id: "alice".to_string() }),
                sink_ref.clone(),
            )
        );

        assert_eq!(summary.reports.len(), 2);
        assert_eq!(summary.saved.len(), 2);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(summary.rejected, vec!["nope".to_string()]);
        assert!(!summary.is_clean());

        assert_eq!(store.get_by_user("alice").await.unwrap().len(), 2);
        assert_eq!(sink.reports.lock().unwrap().len(), 2);
        assert_eq!(sink.progress.lock().unwrap().last(), Some(&(4, 4)));

        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(written.lines().count(), 2);
        for line in written.lines() {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["score"], 60);
        }

        ReportAggregator::report_summary(&summary, &sink_ref);
        let logs = sink.logs.lock().unwrap();
        assert!(logs.iter().any(|(_, m)| m.contains("2 audit(s) completed")));
        assert!(logs.iter().any(|(_, m)| m.contains("1 invalid input(s) skipped")));
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_append_jsonl_reports_write_errors() {
        let report = engine().audit("a.com").unwrap();

        let mut buf = Vec::new();
        append_jsonl(&mut buf, &report).unwrap();
        let line = String::from_utf8(buf).unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.lines().count(), 1);

        let err = append_jsonl(&mut BrokenWriter, &report).unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }

    #[tokio::test]
    async fn test_without_store_or_output() {
        let sink: SinkRef = Arc::new(RecordingSink::default());
        let (tx, rx) = mpsc::channel(4);
        let engine = engine();

        let (_, summary) = tokio::join!(
            engine.run(TargetManager::from_inputs(["a.com"]), tx),
            ReportAggregator::run(rx, 1, None, None, sink)
        );

        assert_eq!(summary.reports.len(), 1);
        assert!(summary.saved.is_empty());
        assert!(summary.is_clean());
    }
}
