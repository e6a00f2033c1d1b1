use crate::domain::{AssetSnapshot, Recommendation, ScoreBreakdown, ScoreResult};

fn rsi_component(rsi: f64) -> i32 {
    if rsi < 30.0 {
        30
    } else if rsi < 50.0 {
        15
    } else if rsi < 70.0 {
        10
    } else {
        0
    }
}

fn macd_component(histogram: f64) -> i32 {
    if histogram > 0.0 {
        30
    } else {
        0
    }
}

fn volume_component(ratio: f64) -> i32 {
    if ratio > 1.5 {
        40
    } else if ratio > 1.1 {
        20
    } else {
        0
    }
}

fn recommendation(confidence: u8) -> Recommendation {
    match confidence {
        70.. => Recommendation::Long,
        50..=69 => Recommendation::Speculative,
        _ => Recommendation::Hold,
    }
}

pub(super) fn score(snapshot: &AssetSnapshot) -> ScoreResult {
    let breakdown = ScoreBreakdown {
        rsi_score: rsi_component(snapshot.rsi),
        macd_score: macd_component(snapshot.macd_histogram()),
        volume_score: volume_component(snapshot.volume_ratio()),
        news_score: 0,
    };

    let confidence = super::clamp_confidence(breakdown.total());

    ScoreResult {
        confidence,
        recommendation: recommendation(confidence),
        alert: None,
        total_score: None,
        breakdown,
    }
}
