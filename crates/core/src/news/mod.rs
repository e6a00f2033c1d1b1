//! Keyword-based news sentiment.

pub mod rss;

pub use rss::RssHeadlineSource;

pub const POSITIVE_KEYWORDS: &[&str] = &["growth", "profit", "bullish", "surge"];
pub const NEGATIVE_KEYWORDS: &[&str] = &["risk", "loss", "bearish", "decline"];

const KEYWORD_WEIGHT: i32 = 10;

/// Source of a sentiment delta for a query keyword (usually the symbol).
///
/// Implementations never fail: retrieval problems yield a neutral 0.
#[async_trait::async_trait]
pub trait SentimentSource: Send + Sync {
    async fn sentiment(&self, query: &str) -> i32;
}

/// Always neutral; used when the active policy ignores news.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSentiment;

#[async_trait::async_trait]
impl SentimentSource for NoSentiment {
    async fn sentiment(&self, _query: &str) -> i32 {
        0
    }
}

/// +10 per title mentioning a positive keyword, -10 per title mentioning a
/// negative one. A title can contribute both.
pub fn score_headlines<S: AsRef<str>>(titles: &[S]) -> i32 {
    titles
        .iter()
        .map(|t| {
            let lower = t.as_ref().to_lowercase();
            let mut score = 0;
            if POSITIVE_KEYWORDS.iter().any(|k| lower.contains(k)) {
                score += KEYWORD_WEIGHT;
            }
            if NEGATIVE_KEYWORDS.iter().any(|k| lower.contains(k)) {
                score -= KEYWORD_WEIGHT;
            }
            score
        })
        .sum()
}
