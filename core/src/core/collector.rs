//! Signal acquisition for the audit pipeline.
//!
//! A [`SignalCollector`] turns a normalized URL into a [`SecuritySnapshot`].
//! The shipped [`SimulatedCollector`] derives HTTPS from the scheme, reports a
//! fixed header/server baseline and takes performance numbers from an injected
//! [`MetricsSource`]. Anything that inspects real responses plugs in behind the
//! same trait without touching scoring or reporting.

use std::sync::Arc;

use log::debug;
use rand::Rng;

use crate::core::snapshot::{PerformanceMetrics, SecurityHeaders, SecuritySnapshot, ServerConfig};
use crate::error::AcquisitionError;

/// Produces raw security signals for one target.
pub trait SignalCollector: Send + Sync {
    fn collect(&self, url: &str) -> Result<SecuritySnapshot, AcquisitionError>;
}

/// Supplies the performance part of a snapshot.
pub trait MetricsSource: Send + Sync {
    fn sample(&self) -> PerformanceMetrics;
}

/// Uniform pseudo-random metrics, drawn from the calling thread's RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomMetrics;

impl MetricsSource for RandomMetrics {
    fn sample(&self) -> PerformanceMetrics {
        let mut rng = rand::rng();
        PerformanceMetrics {
            load_time_seconds: rng.random_range(1.0..4.0),
            size_kb: rng.random_range(500..2500),
            request_count: rng.random_range(20..=70),
        }
    }
}

/// Always returns the same metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedMetrics(pub PerformanceMetrics);

impl FixedMetrics {
    pub fn with_load_time(load_time_seconds: f64) -> Self {
        Self(PerformanceMetrics {
            load_time_seconds,
            size_kb: 1200,
            request_count: 40,
        })
    }
}

impl MetricsSource for FixedMetrics {
    fn sample(&self) -> PerformanceMetrics {
        self.0
    }
}

/// Collector that synthesizes every signal without touching the network.
#[derive(Clone)]
pub struct SimulatedCollector {
    metrics: Arc<dyn MetricsSource>,
}

impl SimulatedCollector {
    /// Creates a collector backed by [`RandomMetrics`].
    pub fn new() -> Self {
        Self::with_metrics(RandomMetrics)
    }

    pub fn with_metrics(metrics: impl MetricsSource + 'static) -> Self {
        Self {
            metrics: Arc::new(metrics),
        }
    }

    fn baseline_server() -> ServerConfig {
        ServerConfig {
            server: "nginx/1.18.0".to_string(),
            technology: "React".to_string(),
            cdn: Some("Cloudflare".to_string()),
            hosting: Some("Railway".to_string()),
        }
    }
}

impl Default for SimulatedCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalCollector for SimulatedCollector {
    fn collect(&self, url: &str) -> Result<SecuritySnapshot, AcquisitionError> {
        let snapshot = SecuritySnapshot {
            https: url.starts_with("https://"),
            headers: SecurityHeaders::default(),
            server_config: Self::baseline_server(),
            performance: self.metrics.sample(),
            reachability_error: None,
        };
        debug!(
            "Collected snapshot for {} (https: {}, load: {:.2}s)",
            url, snapshot.https, snapshot.performance.load_time_seconds
        );
        Ok(snapshot)
    }
}
