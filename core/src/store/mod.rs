//! Persistence for completed audits.
//!
//! The pipeline itself only ever calls [`AuditStore::create`]; the read,
//! update and delete operations exist for dashboard-style consumers.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::findings::{Recommendation, Vulnerability};
use crate::core::report::AuditReport;
use crate::core::scoring::Grade;
use crate::core::snapshot::ServerConfig;
use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditId(pub u64);

impl std::fmt::Display for AuditId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Scanning,
    Completed,
    Failed,
}

/// Record handed to [`AuditStore::create`]; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAuditRecord {
    pub user_id: String,
    pub url: String,
    pub score: u8,
    pub grade: Grade,
    pub vulnerabilities: Vec<Vulnerability>,
    pub server_config: ServerConfig,
    pub recommendations: Vec<Recommendation>,
    pub next_steps: Vec<String>,
    pub status: AuditStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl NewAuditRecord {
    /// A completed record for `report`, owned by `user_id`.
    pub fn completed(user_id: &str, report: &AuditReport) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.to_string(),
            url: report.url.clone(),
            score: report.score,
            grade: report.grade,
            vulnerabilities: report.vulnerabilities.clone(),
            server_config: report.server_config.clone(),
            recommendations: report.recommendations.clone(),
            next_steps: report.next_steps.clone(),
            status: AuditStatus::Completed,
            created_at: now,
            completed_at: Some(now),
        }
    }

    fn with_id(self, id: AuditId) -> AuditRecord {
        AuditRecord {
            id,
            user_id: self.user_id,
            url: self.url,
            score: self.score,
            grade: self.grade,
            vulnerabilities: self.vulnerabilities,
            server_config: self.server_config,
            recommendations: self.recommendations,
            next_steps: self.next_steps,
            status: self.status,
            created_at: self.created_at,
            completed_at: self.completed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub id: AuditId,
    pub user_id: String,
    pub url: String,
    pub score: u8,
    pub grade: Grade,
    pub vulnerabilities: Vec<Vulnerability>,
    pub server_config: ServerConfig,
    pub recommendations: Vec<Recommendation>,
    pub next_steps: Vec<String>,
    pub status: AuditStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Partial update applied by [`AuditStore::update`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuditPatch {
    pub status: Option<AuditStatus>,
    pub score: Option<u8>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl AuditPatch {
    pub fn status(status: AuditStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    fn apply(&self, record: &mut AuditRecord) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(score) = self.score {
            record.score = score.min(crate::core::scoring::MAX_SCORE);
            record.grade = Grade::for_score(record.score);
        }
        if let Some(completed_at) = self.completed_at {
            record.completed_at = Some(completed_at);
        }
    }
}

/// Storage backend for audit records.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn create(&self, record: NewAuditRecord) -> Result<AuditId, StoreError>;

    /// Records owned by `user_id`, newest first.
    async fn get_by_user(&self, user_id: &str) -> Result<Vec<AuditRecord>, StoreError>;

    async fn get_by_id(&self, id: AuditId) -> Result<AuditRecord, StoreError>;

    async fn update(&self, id: AuditId, patch: AuditPatch) -> Result<AuditRecord, StoreError>;

    async fn delete(&self, id: AuditId) -> Result<(), StoreError>;
}

/// Newest first; ids break ties between records created in the same instant.
fn sort_newest_first(records: &mut [AuditRecord]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}
