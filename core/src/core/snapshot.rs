use serde::{Deserialize, Serialize};

use crate::error::AcquisitionError;

/// Load time recorded for targets whose signals could not be acquired.
pub const UNREACHABLE_LOAD_TIME_SECS: f64 = 30.0;

/// Presence flags for the five security headers the audit looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SecurityHeaders {
    pub strict_transport_security: bool,
    pub x_frame_options: bool,
    pub x_content_type_options: bool,
    pub content_security_policy: bool,
    pub x_xss_protection: bool,
}

impl SecurityHeaders {
    pub fn all_present() -> Self {
        Self {
            strict_transport_security: true,
            x_frame_options: true,
            x_content_type_options: true,
            content_security_policy: true,
            x_xss_protection: true,
        }
    }

    /// Flags in their canonical order, paired with the header name.
    pub fn entries(&self) -> [(&'static str, bool); 5] {
        [
            ("strict-transport-security", self.strict_transport_security),
            ("x-frame-options", self.x_frame_options),
            ("x-content-type-options", self.x_content_type_options),
            ("content-security-policy", self.content_security_policy),
            ("x-xss-protection", self.x_xss_protection),
        ]
    }

    pub fn present_count(&self) -> usize {
        self.entries().iter().filter(|(_, present)| *present).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub server: String,
    pub technology: String,
    pub cdn: Option<String>,
    pub hosting: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub load_time_seconds: f64,
    #[serde(rename = "sizeKB")]
    pub size_kb: u32,
    pub request_count: u32,
}

/// Everything the scorer and the report generators know about one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySnapshot {
    pub https: bool,
    pub headers: SecurityHeaders,
    pub server_config: ServerConfig,
    pub performance: PerformanceMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reachability_error: Option<String>,
}

impl SecuritySnapshot {
    /// Failure-marked snapshot for a target whose signals could not be acquired.
    pub fn unreachable(error: &AcquisitionError) -> Self {
        Self {
            https: false,
            headers: SecurityHeaders::default(),
            server_config: ServerConfig {
                server: "unknown".to_string(),
                technology: "unknown".to_string(),
                cdn: None,
                hosting: None,
            },
            performance: PerformanceMetrics {
                load_time_seconds: UNREACHABLE_LOAD_TIME_SECS,
                size_kb: 0,
                request_count: 0,
            },
            reachability_error: Some(error.to_string()),
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.reachability_error.is_none()
    }
}
