//! Confidence scoring.
//!
//! Maps an [`AssetSnapshot`] to a [`ScoreResult`]. Scoring is a pure function
//! of the snapshot and the selected [`ScoringPolicy`].

use crate::domain::{AssetSnapshot, ScoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod simple;
mod weighted;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    /// Additive RSI/MACD/volume components capped at 100.
    #[default]
    Simple,
    /// Crossover-aware sub-scores plus news, with a separately derived confidence.
    Weighted,
}

impl ScoringPolicy {
    pub fn score(self, snapshot: &AssetSnapshot) -> ScoreResult {
        match self {
            ScoringPolicy::Simple => simple::score(snapshot),
            ScoringPolicy::Weighted => weighted::score(snapshot),
        }
    }

    pub fn uses_news(self) -> bool {
        matches!(self, ScoringPolicy::Weighted)
    }

    pub fn default_min_bars(self) -> usize {
        match self {
            ScoringPolicy::Simple => 30,
            ScoringPolicy::Weighted => 60,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScoringPolicy::Simple => "simple",
            ScoringPolicy::Weighted => "weighted",
        }
    }
}

impl fmt::Display for ScoringPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" | "a" => Ok(ScoringPolicy::Simple),
            "weighted" | "b" => Ok(ScoringPolicy::Weighted),
            other => anyhow::bail!("unknown scoring policy: {other} (expected simple|weighted)"),
        }
    }
}

pub(crate) fn clamp_confidence(raw: i32) -> u8 {
    raw.clamp(0, 100) as u8
}
