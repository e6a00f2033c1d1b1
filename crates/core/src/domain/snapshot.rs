use crate::domain::error::AssetError;
use crate::indicators::{self, MACD_FAST, MACD_MIN_BARS, MACD_SIGNAL, MACD_SLOW};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const NEWS_DELTA_LIMIT: i32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Latest indicator readings for one symbol, derived from a single
/// time-ordered bar series. "Latest" and "previous" are the last two bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSnapshot {
    pub symbol: String,
    pub bars: usize,
    pub close: f64,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub prev_macd: f64,
    pub prev_macd_signal: f64,
    pub volume: f64,
    pub volume_mean_20: f64,
    pub ema20: Option<f64>,
    pub ema50: Option<f64>,
    pub ema100: Option<f64>,
    pub ema200: Option<f64>,
    pub news_delta: Option<i32>,
}

impl AssetSnapshot {
    /// Builds a snapshot from bars ordered oldest first.
    ///
    /// Fails with [`AssetError::InsufficientHistory`] when the series is
    /// shorter than `min_bars` (or than the MACD warm-up) or when a required
    /// reading is undefined at the last two bars.
    pub fn from_bars(symbol: &str, bars: &[Bar], min_bars: usize) -> Result<Self, AssetError> {
        let required = min_bars.max(MACD_MIN_BARS);
        let insufficient = || AssetError::InsufficientHistory {
            bars: bars.len(),
            required,
        };

        if bars.len() < required {
            return Err(insufficient());
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();

        let rsi = indicators::rsi(&closes, indicators::RSI_PERIOD);
        let macd = indicators::macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
        let volume_mean = indicators::rolling_mean(&volumes, indicators::VOLUME_MEAN_PERIOD);

        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
        let ema_last = |period: usize| finite(indicators::last(&indicators::ema(&closes, period)));

        let last = bars.last().ok_or_else(insufficient)?;

        Ok(Self {
            symbol: symbol.to_string(),
            bars: bars.len(),
            close: last.close,
            rsi: finite(indicators::last(&rsi)).ok_or_else(insufficient)?,
            macd: finite(indicators::last(&macd.macd)).ok_or_else(insufficient)?,
            macd_signal: finite(indicators::last(&macd.signal)).ok_or_else(insufficient)?,
            prev_macd: finite(indicators::previous(&macd.macd)).ok_or_else(insufficient)?,
            prev_macd_signal: finite(indicators::previous(&macd.signal))
                .ok_or_else(insufficient)?,
            volume: last.volume,
            volume_mean_20: finite(indicators::last(&volume_mean)).ok_or_else(insufficient)?,
            ema20: ema_last(20),
            ema50: ema_last(50),
            ema100: ema_last(100),
            ema200: ema_last(200),
            news_delta: None,
        })
    }

    /// Attaches a news sentiment delta, clamped to ±10.
    pub fn with_news_delta(mut self, delta: i32) -> Self {
        self.news_delta = Some(delta.clamp(-NEWS_DELTA_LIMIT, NEWS_DELTA_LIMIT));
        self
    }

    pub fn macd_histogram(&self) -> f64 {
        self.macd - self.macd_signal
    }

    /// Latest volume over its 20-bar mean; 0 when the mean is not positive.
    pub fn volume_ratio(&self) -> f64 {
        if self.volume_mean_20 > 0.0 {
            self.volume / self.volume_mean_20
        } else {
            0.0
        }
    }

    pub fn bullish_crossover(&self) -> bool {
        self.prev_macd <= self.prev_macd_signal && self.macd > self.macd_signal
    }

    pub fn bearish_crossover(&self) -> bool {
        self.prev_macd >= self.prev_macd_signal && self.macd < self.macd_signal
    }
}
