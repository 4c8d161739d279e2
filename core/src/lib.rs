pub mod core;
pub mod error;
pub mod store;
pub mod utils;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

pub use crate::core::collector::{FixedMetrics, MetricsSource, RandomMetrics, SignalCollector, SimulatedCollector};
pub use crate::core::engine::{save_report, AuditEngine, AuditOutcome};
pub use crate::core::findings::{Recommendation, Vulnerability};
pub use crate::core::report::AuditReport;
pub use crate::core::result_aggregator::{AuditSummary, ReportAggregator, StoreTarget};
pub use crate::core::scoring::{calculate_score, Grade, ScoreBand};
pub use crate::core::snapshot::{PerformanceMetrics, SecurityHeaders, SecuritySnapshot, ServerConfig};
pub use crate::core::target_manager::TargetManager;
pub use crate::core::validator::{is_valid_url, normalize_url};
pub use crate::core::{Locale, Priority, Severity};
pub use crate::error::{AcquisitionError, AuditError, StoreError};
pub use crate::store::{AuditId, AuditPatch, AuditRecord, AuditStatus, AuditStore, JsonFileStore, MemoryStore, NewAuditRecord};
pub use crate::utils::read_lines;

/// Shared audit configuration used by every frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuditConfig {
    pub target: String,
    pub list_file: String,
    pub threads: usize,
    pub output: String,
    pub store: Option<String>,
    pub user_id: String,
    pub locale: Locale,
    pub verbose: bool,
    pub dry_run: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            list_file: String::new(),
            threads: 8,
            output: "audit_results.jsonl".to_string(),
            store: None,
            user_id: "anonymous".to_string(),
            locale: Locale::En,
            verbose: false,
            dry_run: false,
        }
    }
}

impl AuditConfig {
    /// Loads a JSON config file; missing keys fall back to defaults.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn target_ref(&self) -> Option<&str> {
        if self.target.is_empty() { None } else { Some(&self.target) }
    }

    pub fn list_file_ref(&self) -> Option<&str> {
        if self.list_file.is_empty() { None } else { Some(&self.list_file) }
    }

    pub fn output_ref(&self) -> Option<&str> {
        if self.output.is_empty() { None } else { Some(&self.output) }
    }
}

/// Output abstraction for the audit pipeline.
pub trait AuditEventSink: Send + Sync {
    fn on_log(&self, level: &str, message: &str);
    fn on_report(&self, report: &AuditReport);
    fn on_progress(&self, phase: &str, current: usize, total: usize);
}

pub type SinkRef = Arc<dyn AuditEventSink>;

/// Terminal output sink for CLI usage.
pub struct ConsoleSink {
    json: bool,
    progress: Option<ProgressBar>,
}

impl ConsoleSink {
    pub fn new_ref() -> SinkRef {
        Arc::new(Self { json: false, progress: None })
    }

    /// Sink that prints each report as pretty JSON instead of colored text.
    pub fn json_ref() -> SinkRef {
        Arc::new(Self { json: true, progress: None })
    }

    /// Sink that also drives a progress bar across `total` audits.
    pub fn with_progress(total: usize, json: bool) -> SinkRef {
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}") {
            bar.set_style(style.progress_chars("=> "));
        }
        Arc::new(Self { json, progress: Some(bar) })
    }

    /// Writes to stdout, clearing the progress bar for the duration.
    fn emit(&self, text: &str) {
        use std::io::Write;
        let write = || {
            print!("{}\r\n", text);
            std::io::stdout().flush().ok();
        };
        match &self.progress {
            Some(bar) => bar.suspend(write),
            None => write(),
        }
    }
}

impl AuditEventSink for ConsoleSink {
    fn on_log(&self, level: &str, message: &str) {
        use colored::*;
        let colored = match level {
            "success" => message.green().to_string(),
            "error"   => message.red().to_string(),
            "warn"    => message.yellow().to_string(),
            "phase"   => message.bright_cyan().bold().to_string(),
            _         => message.to_string(),
        };
        if self.json {
            match &self.progress {
                Some(bar) => bar.suspend(|| eprintln!("{}", colored)),
                None => eprintln!("{}", colored),
            }
        } else {
            self.emit(&colored);
        }
    }

    fn on_report(&self, report: &AuditReport) {
        use colored::*;

        if self.json {
            match serde_json::to_string_pretty(report) {
                Ok(json) => self.emit(&json),
                Err(e) => eprintln!("{}", format!("[!] Failed to serialize report: {}", e).red()),
            }
            return;
        }

        let score = format!("{}/100 (grade {})", report.score, report.grade);
        let score = if report.score >= 70 {
            score.green().bold()
        } else if report.score >= 40 {
            score.yellow().bold()
        } else {
            score.red().bold()
        };

        self.emit(&format!("\n{} {}", "[+] Audit:".green().bold(), report.url.white()));
        self.emit(&format!("    Score:   {}", score));
        if let Some(err) = &report.reachability_error {
            self.emit(&format!("    {} {}", "Unreachable:".yellow().bold(), err));
        }
        self.emit(&format!(
            "    Server:  {} | {} | CDN [{}] | Hosting [{}]",
            report.server_config.server.blue(),
            report.server_config.technology.blue(),
            report.server_config.cdn.as_deref().unwrap_or("N/A").cyan(),
            report.server_config.hosting.as_deref().unwrap_or("N/A").cyan()
        ));

        for v in &report.vulnerabilities {
            let tag = format!("[{}]", v.severity.to_string().to_uppercase());
            let tag = match v.severity {
                Severity::Critical => tag.red().bold(),
                Severity::High => tag.bright_red(),
                Severity::Medium => tag.yellow(),
                Severity::Low => tag.blue(),
            };
            self.emit(&format!("    {} {}: {}", tag, v.kind, v.title));
            self.emit(&format!("        {}", v.solution.dimmed()));
        }

        for r in &report.recommendations {
            self.emit(&format!("    {} {} ({})", "[>]".cyan(), r.title, r.priority));
        }
        for step in &report.next_steps {
            self.emit(&format!("    {}", step));
        }
        self.emit(&"──────────────────────────────────────────".dimmed().to_string());
    }

    fn on_progress(&self, phase: &str, current: usize, total: usize) {
        use colored::*;
        match &self.progress {
            Some(bar) => {
                bar.set_message(phase.to_string());
                bar.set_position(current as u64);
                if current >= total {
                    bar.finish_and_clear();
                }
            }
            None if self.json => {}
            None => {
                if total > 1 {
                    self.emit(&format!("[*] {} ({}/{})", phase, current, total).bright_cyan().to_string());
                }
            }
        }
    }
}
