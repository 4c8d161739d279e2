//! Error types surfaced by the audit pipeline and the audit stores.

use std::time::Duration;

use thiserror::Error;

use crate::core::report::AuditReport;
use crate::store::AuditId;

/// Errors returned to the caller of an audit.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The input does not look like a `domain.tld[/path]` URL.
    #[error("invalid URL: {input:?}")]
    InvalidUrl { input: String },

    /// The report was computed but the store rejected it.
    #[error("audit of {} computed but not saved: {source}", .report.url)]
    Persistence {
        report: Box<AuditReport>,
        #[source]
        source: StoreError,
    },
}

impl AuditError {
    /// The computed report, if the failure happened after the pipeline ran.
    pub fn report(&self) -> Option<&AuditReport> {
        match self {
            AuditError::InvalidUrl { .. } => None,
            AuditError::Persistence { report, .. } => Some(&**report),
        }
    }
}

/// Failure to acquire signals from a target.
///
/// Never reaches the caller: the engine swaps in a failure snapshot instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AcquisitionError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("DNS resolution failed: {0}")]
    Dns(String),

    #[error("TLS handshake failed: {0}")]
    Tls(String),

    #[error("connection failed: {0}")]
    Connect(String),
}

/// Errors raised by an [`AuditStore`](crate::store::AuditStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("audit {0} not found")]
    NotFound(AuditId),

    #[error("audit store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("audit store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("audit store unavailable: {0}")]
    Unavailable(String),
}
