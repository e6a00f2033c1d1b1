//! Sequential evaluation of a watch list.
//!
//! Every symbol yields an [`AssetOutcome`]; failures never abort the batch.

use crate::domain::{AssetError, AssetSnapshot, Bar};
use crate::ingest::MarketDataProvider;
use crate::news::SentimentSource;
use crate::scoring::ScoringPolicy;
use std::collections::BTreeMap;

mod report;

pub use report::{rank, AssetFailure, AssetRecord, BatchReport, EmptyBatch, RankBy};

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub policy: ScoringPolicy,
    pub min_bars: usize,
    pub rank_by: RankBy,
}

impl BatchOptions {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self {
            policy,
            min_bars: policy.default_min_bars(),
            rank_by: RankBy::default(),
        }
    }

    pub fn from_settings(settings: &crate::config::Settings) -> Self {
        Self {
            policy: settings.policy,
            min_bars: settings.effective_min_bars(),
            rank_by: settings.rank_by,
        }
    }
}

#[derive(Debug)]
pub enum AssetOutcome {
    Scored { record: AssetRecord, bars: Vec<Bar> },
    Failed(AssetFailure),
}

impl AssetOutcome {
    fn failed(symbol: &str, err: AssetError) -> Self {
        AssetOutcome::Failed(AssetFailure {
            symbol: symbol.to_string(),
            kind: err.kind(),
            reason: err.to_string(),
        })
    }
}

pub async fn evaluate_asset(
    provider: &dyn MarketDataProvider,
    news: &dyn SentimentSource,
    symbol: &str,
    opts: &BatchOptions,
) -> AssetOutcome {
    let bars = match provider.fetch_daily_bars(symbol).await {
        Ok(bars) => bars,
        Err(err) => return AssetOutcome::failed(symbol, AssetError::Retrieval(err)),
    };

    let mut snapshot = match AssetSnapshot::from_bars(symbol, &bars, opts.min_bars) {
        Ok(s) => s,
        Err(err) => return AssetOutcome::failed(symbol, err),
    };

    if opts.policy.uses_news() {
        let delta = news.sentiment(symbol).await;
        snapshot = snapshot.with_news_delta(delta);
    }

    let score = opts.policy.score(&snapshot);
    AssetOutcome::Scored {
        record: AssetRecord::new(&snapshot, score),
        bars,
    }
}

pub async fn evaluate_batch(
    provider: &dyn MarketDataProvider,
    news: &dyn SentimentSource,
    symbols: &[String],
    opts: &BatchOptions,
) -> BatchReport {
    let run_id = uuid::Uuid::new_v4();
    tracing::info!(
        %run_id,
        provider = provider.provider_name(),
        policy = %opts.policy,
        symbols = symbols.len(),
        "batch started"
    );

    let mut assets = Vec::with_capacity(symbols.len());
    let mut failures = Vec::new();
    let mut histories = BTreeMap::new();

    for symbol in symbols {
        match evaluate_asset(provider, news, symbol, opts).await {
            AssetOutcome::Scored { record, bars } => {
                tracing::debug!(
                    %run_id,
                    symbol = %record.symbol,
                    confidence = record.confidence,
                    recommendation = %record.recommendation,
                    "asset scored"
                );
                histories.insert(record.symbol.clone(), bars);
                assets.push(record);
            }
            AssetOutcome::Failed(failure) => {
                tracing::warn!(
                    %run_id,
                    symbol = %failure.symbol,
                    kind = ?failure.kind,
                    reason = %failure.reason,
                    "asset excluded"
                );
                failures.push(failure);
            }
        }
    }

    rank(&mut assets, opts.rank_by);

    tracing::info!(
        %run_id,
        scored = assets.len(),
        failed = failures.len(),
        "batch finished"
    );

    BatchReport {
        run_id,
        generated_at: chrono::Utc::now(),
        policy: opts.policy,
        rank_by: opts.rank_by,
        assets,
        failures,
        histories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::FailureKind;
    use crate::domain::snapshot::tests::bars_from_closes;
    use crate::news::NoSentiment;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeProvider {
        series: HashMap<String, Vec<Bar>>,
    }

    impl FakeProvider {
        fn new(entries: &[(&str, usize)]) -> Self {
            let series = entries
                .iter()
                .map(|(symbol, n)| {
                    let closes: Vec<f64> =
                        (0..*n).map(|i| 100.0 + (i as f64 * 0.3).sin() * 4.0).collect();
                    (symbol.to_string(), bars_from_closes(&closes, 1_000.0))
                })
                .collect();
            Self { series }
        }
    }

    #[async_trait::async_trait]
    impl MarketDataProvider for FakeProvider {
        fn provider_name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_daily_bars(&self, symbol: &str) -> anyhow::Result<Vec<Bar>> {
            self.series
                .get(symbol)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("connection reset fetching {symbol}"))
        }
    }

    struct CountingNews {
        delta: i32,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl SentimentSource for CountingNews {
        async fn sentiment(&self, _query: &str) -> i32 {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.delta
        }
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn retrieval_failure_does_not_abort_batch() {
        let provider = FakeProvider::new(&[("AAPL", 120), ("TSLA", 120)]);
        let opts = BatchOptions::new(ScoringPolicy::Simple);

        let report = evaluate_batch(
            &provider,
            &NoSentiment,
            &symbols(&["AAPL", "BROKEN", "TSLA"]),
            &opts,
        )
        .await;

        let mut scored: Vec<_> = report.assets.iter().map(|a| a.symbol.as_str()).collect();
        scored.sort_unstable();
        assert_eq!(scored, ["AAPL", "TSLA"]);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].symbol, "BROKEN");
        assert_eq!(report.failures[0].kind, FailureKind::RetrievalFailure);
        assert!(report.ensure_usable().is_ok());
    }

    #[tokio::test]
    async fn short_history_is_excluded() {
        let provider = FakeProvider::new(&[("OLD", 120), ("NEW", 45)]);
        let opts = BatchOptions::new(ScoringPolicy::Weighted);

        let report =
            evaluate_batch(&provider, &NoSentiment, &symbols(&["NEW", "OLD"]), &opts).await;

        assert_eq!(report.assets.len(), 1);
        assert_eq!(report.assets[0].symbol, "OLD");
        assert!(report.asset("NEW").is_none());
        assert!(report.history("NEW").is_none());
        assert_eq!(report.failures[0].kind, FailureKind::InsufficientHistory);
        assert_eq!(report.history("old").map(<[Bar]>::len), Some(120));
    }

    #[tokio::test]
    async fn empty_batch_is_reported() {
        let provider = FakeProvider::new(&[("TINY", 10)]);
        let opts = BatchOptions::new(ScoringPolicy::Simple);

        let report =
            evaluate_batch(&provider, &NoSentiment, &symbols(&["TINY", "GONE"]), &opts).await;

        let err = report.ensure_usable().unwrap_err();
        assert_eq!(err.failures, 2);
    }

    #[tokio::test]
    async fn news_is_fetched_only_for_weighted_policy() {
        let provider = FakeProvider::new(&[("AAPL", 120)]);
        let news = CountingNews {
            delta: 25,
            calls: AtomicUsize::new(0),
        };
        let list = symbols(&["AAPL"]);

        let simple = evaluate_batch(
            &provider,
            &news,
            &list,
            &BatchOptions::new(ScoringPolicy::Simple),
        )
        .await;
        assert_eq!(news.calls.load(Ordering::SeqCst), 0);
        assert_eq!(simple.assets[0].news_delta, None);

        let weighted = evaluate_batch(
            &provider,
            &news,
            &list,
            &BatchOptions::new(ScoringPolicy::Weighted),
        )
        .await;
        assert_eq!(news.calls.load(Ordering::SeqCst), 1);
        assert_eq!(weighted.assets[0].news_delta, Some(10));
        assert_eq!(weighted.assets[0].breakdown.news_score, 10);
        assert!(weighted.assets[0].total_score.is_some());
    }

    #[tokio::test]
    async fn assets_are_ranked_by_confidence() {
        let provider = FakeProvider::new(&[("A", 120), ("B", 90), ("C", 70)]);
        let opts = BatchOptions::new(ScoringPolicy::Simple);

        let report =
            evaluate_batch(&provider, &NoSentiment, &symbols(&["A", "B", "C"]), &opts).await;

        assert_eq!(report.assets.len(), 3);
        assert!(report
            .assets
            .windows(2)
            .all(|w| w[0].confidence >= w[1].confidence));
    }
}
