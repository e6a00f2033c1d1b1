use std::fmt::Write;

use tickerboard_core::batch::{AssetFailure, BatchReport};
use tickerboard_core::chart::ChartSeries;

// Only the most recent rows of a series are printed.
const SERIES_TAIL: usize = 30;

pub fn render_ranking(report: &BatchReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Ranking ({} policy, by {}, run {})",
        report.policy, report.rank_by, report.run_id
    );
    let _ = writeln!(
        out,
        "{:<8} {:>10} {:>6} {:>9} {:>7} {:>5} {:>6} {:>7}  {}",
        "SYMBOL", "PRICE", "RSI", "MACD", "VOL", "CONF", "ALERT", "TOTAL", "ACTION"
    );

    for a in &report.assets {
        let alert = a.alert.map(|x| x.to_string()).unwrap_or_else(|| "-".to_string());
        let total = a
            .total_score
            .map(|x| x.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<8} {:>10.2} {:>6.1} {:>9.3} {:>7.2} {:>5} {:>6} {:>7}  {}",
            a.symbol,
            a.price,
            a.rsi,
            a.macd_histogram,
            a.volume_ratio,
            a.confidence,
            alert,
            total,
            a.recommendation
        );
    }
    out
}

pub fn render_failures(failures: &[AssetFailure]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Excluded ({}):", failures.len());
    for f in failures {
        let _ = writeln!(out, "  {:<8} {:?}: {}", f.symbol, f.kind, f.reason);
    }
    out
}

pub fn render_series(series: &ChartSeries) -> String {
    let fmt_opt = |v: Option<f64>, precision: usize| match v {
        Some(x) => format!("{x:.precision$}"),
        None => "-".to_string(),
    };

    let mut out = String::new();
    let _ = writeln!(out, "{} (last {} bars)", series.symbol, SERIES_TAIL);
    let _ = writeln!(
        out,
        "{:<10} {:>10} {:>10} {:>10} {:>10} {:>12} {:>9} {:>9} {:>6} {:>9} {:>9}",
        "DATE", "OPEN", "HIGH", "LOW", "CLOSE", "VOLUME", "EMA20", "EMA50", "RSI", "MACD", "SIGNAL"
    );

    let start = series.points.len().saturating_sub(SERIES_TAIL);
    for p in &series.points[start..] {
        let _ = writeln!(
            out,
            "{:<10} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>12.0} {:>9} {:>9} {:>6} {:>9} {:>9}",
            p.date.format("%Y-%m-%d").to_string(),
            p.open,
            p.high,
            p.low,
            p.close,
            p.volume,
            fmt_opt(p.ema20, 2),
            fmt_opt(p.ema50, 2),
            fmt_opt(p.rsi, 1),
            fmt_opt(p.macd, 3),
            fmt_opt(p.macd_signal, 3),
        );
    }
    out
}
