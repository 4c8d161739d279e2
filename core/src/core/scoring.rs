use serde::{Deserialize, Serialize};

use crate::core::snapshot::SecuritySnapshot;

pub const MAX_SCORE: u8 = 100;

const HTTPS_POINTS: u32 = 20;
const HEADER_POINTS: u32 = 10;
const FAST_LOAD_POINTS: u32 = 10;
const CDN_POINTS: u32 = 10;
const HOSTING_POINTS: u32 = 10;

/// Load times strictly below this earn the performance bonus.
pub const FAST_LOAD_THRESHOLD_SECS: f64 = 3.0;

/// Weighted security score of a snapshot, clamped to `0..=100`.
pub fn calculate_score(snapshot: &SecuritySnapshot) -> u8 {
    let mut total = 0u32;

    if snapshot.https {
        total += HTTPS_POINTS;
    }

    total += HEADER_POINTS * snapshot.headers.present_count() as u32;

    if snapshot.performance.load_time_seconds < FAST_LOAD_THRESHOLD_SECS {
        total += FAST_LOAD_POINTS;
    }
    if snapshot.server_config.cdn.is_some() {
        total += CDN_POINTS;
    }
    if snapshot.server_config.hosting.is_some() {
        total += HOSTING_POINTS;
    }

    total.min(MAX_SCORE as u32) as u8
}

/// Score range that selects the canned next steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    /// Below 40.
    Critical,
    /// 40 to 69.
    Moderate,
    /// 70 and above.
    Strong,
}

impl ScoreBand {
    pub fn for_score(score: u8) -> Self {
        match score {
            0..=39 => ScoreBand::Critical,
            40..=69 => ScoreBand::Moderate,
            _ => ScoreBand::Strong,
        }
    }
}

/// Letter grade shown next to the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn for_score(score: u8) -> Self {
        match score {
            90.. => Grade::A,
            80..=89 => Grade::B,
            70..=79 => Grade::C,
            60..=69 => Grade::D,
            _ => Grade::F,
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(letter)
    }
}
