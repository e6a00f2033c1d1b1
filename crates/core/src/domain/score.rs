use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Strong Long")]
    StrongLong,
    Long,
    Speculative,
    Hold,
}

impl Recommendation {
    pub fn label(self) -> &'static str {
        match self {
            Recommendation::StrongLong => "Strong Long",
            Recommendation::Long => "Long",
            Recommendation::Speculative => "Speculative",
            Recommendation::Hold => "Hold",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Alert {
    Buy,
    Sell,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alert::Buy => f.write_str("BUY"),
            Alert::Sell => f.write_str("SELL"),
        }
    }
}

/// Sub-scores that make up a result, kept for explainability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub rsi_score: i32,
    pub macd_score: i32,
    pub volume_score: i32,
    pub news_score: i32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> i32 {
        self.rsi_score + self.macd_score + self.volume_score + self.news_score
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Always within 0..=100.
    pub confidence: u8,
    pub recommendation: Recommendation,
    pub alert: Option<Alert>,
    /// Unbounded sum of the breakdown; only produced by policies that rank on it.
    pub total_score: Option<i32>,
    pub breakdown: ScoreBreakdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_serialize_as_displayed() {
        assert_eq!(
            serde_json::to_value(Recommendation::StrongLong).unwrap(),
            serde_json::json!("Strong Long")
        );
        assert_eq!(serde_json::to_value(Alert::Sell).unwrap(), serde_json::json!("SELL"));
        assert_eq!(Recommendation::Speculative.to_string(), "Speculative");
    }

    #[test]
    fn breakdown_total_sums_components() {
        let b = ScoreBreakdown {
            rsi_score: -10,
            macd_score: 15,
            volume_score: 8,
            news_score: -10,
        };
        assert_eq!(b.total(), 3);
    }
}
