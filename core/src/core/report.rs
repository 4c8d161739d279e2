use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::core::findings::{self, Recommendation, Vulnerability};
use crate::core::scoring::{self, Grade};
use crate::core::snapshot::{SecuritySnapshot, ServerConfig};
use crate::core::{Locale, Severity};

/// Final result of one audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub url: String,
    pub timestamp: String,
    pub score: u8,
    pub grade: Grade,
    pub vulnerabilities: Vec<Vulnerability>,
    pub server_config: ServerConfig,
    pub recommendations: Vec<Recommendation>,
    pub next_steps: Vec<String>,
    /// Set when the target's signals could not be acquired.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reachability_error: Option<String>,
}

impl AuditReport {
    /// Scores the snapshot and runs every generator over it.
    pub fn from_snapshot(url: String, snapshot: &SecuritySnapshot, locale: Locale) -> Self {
        let score = scoring::calculate_score(snapshot);
        Self {
            url,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            score,
            grade: Grade::for_score(score),
            vulnerabilities: findings::generate_vulnerabilities(snapshot, locale),
            server_config: snapshot.server_config.clone(),
            recommendations: findings::generate_recommendations(snapshot, locale),
            next_steps: findings::generate_next_steps(score, locale),
            reachability_error: snapshot.reachability_error.clone(),
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.reachability_error.is_none()
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.vulnerabilities
            .iter()
            .filter(|v| v.severity == severity)
            .count()
    }
}
