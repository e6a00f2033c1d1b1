use crate::domain::Bar;
use crate::indicators::{self, MACD_FAST, MACD_SIGNAL, MACD_SLOW, RSI_PERIOD};
use chrono::NaiveDate;
use serde::Serialize;

/// One chart row: the bar plus the overlays drawn on top of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub ema20: Option<f64>,
    pub ema50: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub symbol: String,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    pub fn from_bars(symbol: &str, bars: &[Bar]) -> Self {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let ema20 = indicators::ema(&closes, 20);
        let ema50 = indicators::ema(&closes, 50);
        let rsi = indicators::rsi(&closes, RSI_PERIOD);
        let macd = indicators::macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);

        let points = bars
            .iter()
            .enumerate()
            .map(|(i, b)| ChartPoint {
                date: b.date,
                open: b.open,
                high: b.high,
                low: b.low,
                close: b.close,
                volume: b.volume,
                ema20: ema20[i],
                ema50: ema50[i],
                rsi: rsi[i],
                macd: macd.macd[i],
                macd_signal: macd.signal[i],
            })
            .collect();

        Self {
            symbol: symbol.to_string(),
            points,
        }
    }
}
