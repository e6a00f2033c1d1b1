use crate::domain::Bar;
use chrono::DateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartEnvelope,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartEnvelope {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartError {
    pub code: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartResult {
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: ChartIndicators,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartIndicators {
    pub quote: Vec<ChartQuote>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartQuote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

impl ChartResult {
    /// Converts the column layout into bars, oldest first. Rows with any
    /// missing field (halts, partial sessions) are dropped.
    pub fn into_bars(self) -> Vec<Bar> {
        let quote = self.indicators.quote.into_iter().next().unwrap_or_default();
        let col = |v: &Vec<Option<f64>>, i: usize| v.get(i).copied().flatten();

        let mut bars: Vec<Bar> = Vec::with_capacity(self.timestamp.len());
        for (i, ts) in self.timestamp.iter().enumerate() {
            let Some(date) = DateTime::from_timestamp(*ts, 0).map(|d| d.date_naive()) else {
                continue;
            };
            let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = (
                col(&quote.open, i),
                col(&quote.high, i),
                col(&quote.low, i),
                col(&quote.close, i),
                col(&quote.volume, i),
            ) else {
                continue;
            };

            bars.push(Bar {
                date,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);
        bars
    }
}
