use crate::domain::snapshot::NEWS_DELTA_LIMIT;
use crate::domain::{Alert, AssetSnapshot, Recommendation, ScoreBreakdown, ScoreResult};

fn rsi_score(rsi: f64) -> i32 {
    if rsi < 30.0 {
        15
    } else if rsi < 50.0 {
        10
    } else if rsi > 70.0 {
        -10
    } else {
        5
    }
}

// Crossovers take precedence over the plain MACD/signal comparison.
fn macd_score(s: &AssetSnapshot) -> i32 {
    if s.bullish_crossover() {
        15
    } else if s.bearish_crossover() {
        -15
    } else if s.macd > s.macd_signal {
        5
    } else {
        0
    }
}

fn volume_score(ratio: f64) -> i32 {
    if ratio > 2.0 {
        15
    } else if ratio > 1.5 {
        8
    } else {
        0
    }
}

fn confidence(s: &AssetSnapshot, news_score: i32) -> u8 {
    let mut raw = 0;
    if s.rsi > 40.0 && s.rsi < 65.0 {
        raw += 20;
    }
    if s.macd > s.macd_signal {
        raw += 30;
    }
    if s.volume_ratio() > 1.5 {
        raw += 20;
    }
    if let (Some(ema20), Some(ema50)) = (s.ema20, s.ema50) {
        if ema20 > ema50 {
            raw += 20;
        }
    }
    raw += news_score.clamp(-NEWS_DELTA_LIMIT, NEWS_DELTA_LIMIT);
    super::clamp_confidence(raw)
}

fn alert(s: &AssetSnapshot) -> Option<Alert> {
    if s.rsi < 40.0 && s.bullish_crossover() && s.volume_ratio() > 1.5 {
        Some(Alert::Buy)
    } else if s.rsi > 70.0 && s.bearish_crossover() {
        Some(Alert::Sell)
    } else {
        None
    }
}

fn recommendation(confidence: u8) -> Recommendation {
    match confidence {
        80.. => Recommendation::StrongLong,
        60..=79 => Recommendation::Long,
        45..=59 => Recommendation::Speculative,
        _ => Recommendation::Hold,
    }
}

pub(super) fn score(snapshot: &AssetSnapshot) -> ScoreResult {
    let news_score = snapshot
        .news_delta
        .unwrap_or(0)
        .clamp(-NEWS_DELTA_LIMIT, NEWS_DELTA_LIMIT);

    let breakdown = ScoreBreakdown {
        rsi_score: rsi_score(snapshot.rsi),
        macd_score: macd_score(snapshot),
        volume_score: volume_score(snapshot.volume_ratio()),
        news_score,
    };

    let confidence = confidence(snapshot, news_score);

    ScoreResult {
        confidence,
        recommendation: recommendation(confidence),
        alert: alert(snapshot),
        total_score: Some(breakdown.total()),
        breakdown,
    }
}
