use crate::domain::error::FailureKind;
use crate::domain::{Alert, AssetSnapshot, Bar, Recommendation, ScoreBreakdown, ScoreResult};
use crate::scoring::ScoringPolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankBy {
    #[default]
    Confidence,
    TotalScore,
}

impl fmt::Display for RankBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankBy::Confidence => f.write_str("confidence"),
            RankBy::TotalScore => f.write_str("total-score"),
        }
    }
}

impl FromStr for RankBy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "confidence" => Ok(RankBy::Confidence),
            "total-score" | "total" => Ok(RankBy::TotalScore),
            other => anyhow::bail!("unknown ranking: {other} (expected confidence|total-score)"),
        }
    }
}

/// One row of the ranking table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub symbol: String,
    pub price: f64,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub volume_ratio: f64,
    pub ema20: Option<f64>,
    pub ema50: Option<f64>,
    pub ema100: Option<f64>,
    pub ema200: Option<f64>,
    pub news_delta: Option<i32>,
    pub confidence: u8,
    pub recommendation: Recommendation,
    pub alert: Option<Alert>,
    pub total_score: Option<i32>,
    pub breakdown: ScoreBreakdown,
}

impl AssetRecord {
    pub fn new(snapshot: &AssetSnapshot, score: ScoreResult) -> Self {
        Self {
            symbol: snapshot.symbol.clone(),
            price: snapshot.close,
            rsi: snapshot.rsi,
            macd: snapshot.macd,
            macd_signal: snapshot.macd_signal,
            macd_histogram: snapshot.macd_histogram(),
            volume_ratio: snapshot.volume_ratio(),
            ema20: snapshot.ema20,
            ema50: snapshot.ema50,
            ema100: snapshot.ema100,
            ema200: snapshot.ema200,
            news_delta: snapshot.news_delta,
            confidence: score.confidence,
            recommendation: score.recommendation,
            alert: score.alert,
            total_score: score.total_score,
            breakdown: score.breakdown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFailure {
    pub symbol: String,
    pub kind: FailureKind,
    pub reason: String,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("no usable assets in batch ({failures} failed)")]
pub struct EmptyBatch {
    pub failures: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub policy: ScoringPolicy,
    pub rank_by: RankBy,
    /// Successfully scored assets in ranking order.
    pub assets: Vec<AssetRecord>,
    /// Excluded assets in input order.
    pub failures: Vec<AssetFailure>,
    #[serde(skip)]
    pub histories: BTreeMap<String, Vec<Bar>>,
}

impl BatchReport {
    /// Zero scored assets is terminal for callers: there is nothing to show.
    pub fn ensure_usable(&self) -> Result<(), EmptyBatch> {
        if self.assets.is_empty() {
            return Err(EmptyBatch {
                failures: self.failures.len(),
            });
        }
        Ok(())
    }

    pub fn asset(&self, symbol: &str) -> Option<&AssetRecord> {
        self.assets
            .iter()
            .find(|a| a.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn history(&self, symbol: &str) -> Option<&[Bar]> {
        let record = self.asset(symbol)?;
        self.histories.get(&record.symbol).map(Vec::as_slice)
    }
}

/// Sorts descending by the chosen key. The sort is stable, so ties keep
/// input order; assets without a total score rank last under `TotalScore`.
pub fn rank(assets: &mut [AssetRecord], rank_by: RankBy) {
    match rank_by {
        RankBy::Confidence => assets.sort_by(|a, b| b.confidence.cmp(&a.confidence)),
        RankBy::TotalScore => assets.sort_by(|a, b| b.total_score.cmp(&a.total_score)),
    }
}
