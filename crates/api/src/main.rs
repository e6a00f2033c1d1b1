use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tickerboard_core::batch::{evaluate_batch, AssetRecord, BatchOptions, BatchReport};
use tickerboard_core::cache::BatchCache;
use tickerboard_core::chart::ChartSeries;
use tickerboard_core::ingest::{MarketDataProvider, YahooChartProvider};
use tickerboard_core::news::{NoSentiment, RssHeadlineSource, SentimentSource};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = tickerboard_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let provider: Arc<dyn MarketDataProvider> =
        Arc::new(YahooChartProvider::from_settings(&settings)?);
    let news: Arc<dyn SentimentSource> = if settings.policy.uses_news() {
        Arc::new(RssHeadlineSource::from_settings(&settings)?)
    } else {
        Arc::new(NoSentiment)
    };

    let state = AppState {
        provider,
        news,
        symbols: Arc::new(settings.tickers.clone()),
        options: BatchOptions::from_settings(&settings),
        cache: Arc::new(Mutex::new(BatchCache::new(settings.cache_ttl))),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/ranking", get(get_ranking))
        .route("/assets/:symbol", get(get_asset))
        .route("/assets/:symbol/series", get(get_series))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));

    tracing::info!(
        %addr,
        policy = %settings.policy,
        symbols = settings.tickers.len(),
        cache_ttl_secs = settings.cache_ttl.as_secs(),
        "api listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    provider: Arc<dyn MarketDataProvider>,
    news: Arc<dyn SentimentSource>,
    symbols: Arc<Vec<String>>,
    options: BatchOptions,
    cache: Arc<Mutex<BatchCache>>,
}

// The lock is held across the refresh so a burst of requests in a new bucket
// triggers a single batch run.
async fn current_report(state: &AppState) -> Result<Arc<BatchReport>, StatusCode> {
    let mut cache = state.cache.lock().await;
    let now = chrono::Utc::now();

    let report = match cache.get(&state.symbols, state.options.policy, now) {
        Some(report) => report,
        None => {
            let report = evaluate_batch(
                state.provider.as_ref(),
                state.news.as_ref(),
                &state.symbols,
                &state.options,
            )
            .await;
            cache.insert(&state.symbols, state.options.policy, now, report)
        }
    };

    usable(report)
}

fn usable(report: Arc<BatchReport>) -> Result<Arc<BatchReport>, StatusCode> {
    if let Err(err) = report.ensure_usable() {
        let err = anyhow::Error::new(err);
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %err, "batch produced no usable assets");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    Ok(report)
}

fn find_asset<'a>(report: &'a BatchReport, symbol: &str) -> Result<&'a AssetRecord, StatusCode> {
    report.asset(symbol).ok_or(StatusCode::NOT_FOUND)
}

fn series_for(report: &BatchReport, symbol: &str) -> Result<ChartSeries, StatusCode> {
    let record = find_asset(report, symbol)?;
    let bars = report.history(symbol).ok_or(StatusCode::NOT_FOUND)?;
    Ok(ChartSeries::from_bars(&record.symbol, bars))
}

async fn get_ranking(State(state): State<AppState>) -> Result<Json<BatchReport>, StatusCode> {
    let report = current_report(&state).await?;
    Ok(Json((*report).clone()))
}

async fn get_asset(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<AssetRecord>, StatusCode> {
    let report = current_report(&state).await?;
    Ok(Json(find_asset(&report, &symbol)?.clone()))
}

async fn get_series(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ChartSeries>, StatusCode> {
    let report = current_report(&state).await?;
    Ok(Json(series_for(&report, &symbol)?))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &tickerboard_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tickerboard_core::batch::{AssetFailure, RankBy};
    use tickerboard_core::domain::error::FailureKind;
    use tickerboard_core::domain::{AssetSnapshot, Bar};
    use tickerboard_core::scoring::ScoringPolicy;

    fn bars(n: usize) -> Vec<Bar> {
        let start = chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        (0..n)
            .map(|i| {
                let close = 50.0 + (i as f64 * 0.4).sin() * 3.0;
                Bar {
                    date: start + chrono::Duration::days(i as i64),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1_000.0,
                }
            })
            .collect()
    }

    fn report(scored: &[&str], failed: &[&str]) -> BatchReport {
        let mut assets = Vec::new();
        let mut histories = BTreeMap::new();
        for symbol in scored {
            let history = bars(60);
            let snapshot = AssetSnapshot::from_bars(symbol, &history, 40).unwrap();
            let score = ScoringPolicy::Simple.score(&snapshot);
            assets.push(AssetRecord::new(&snapshot, score));
            histories.insert(symbol.to_string(), history);
        }
        BatchReport {
            run_id: Default::default(),
            generated_at: chrono::Utc::now(),
            policy: ScoringPolicy::Simple,
            rank_by: RankBy::Confidence,
            assets,
            failures: failed
                .iter()
                .map(|s| AssetFailure {
                    symbol: s.to_string(),
                    kind: FailureKind::RetrievalFailure,
                    reason: "timeout".to_string(),
                })
                .collect(),
            histories,
        }
    }

    #[test]
    fn empty_batch_is_service_unavailable() {
        let err = usable(Arc::new(report(&[], &["IREN", "PL"]))).unwrap_err();
        assert_eq!(err, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn partial_batch_is_served() {
        let report = usable(Arc::new(report(&["AAPL"], &["IREN"]))).unwrap();
        assert_eq!(report.assets.len(), 1);
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn asset_lookup_ignores_case_and_404s_on_unknown() {
        let report = report(&["AAPL"], &["IREN"]);
        assert_eq!(find_asset(&report, "aapl").unwrap().symbol, "AAPL");
        assert_eq!(find_asset(&report, "MSFT").unwrap_err(), StatusCode::NOT_FOUND);
        // Excluded symbols are not assets.
        assert_eq!(find_asset(&report, "IREN").unwrap_err(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn series_covers_history_and_404s_on_unknown() {
        let mut report = report(&["AAPL", "TSLA"], &[]);
        let series = series_for(&report, "aapl").unwrap();
        assert_eq!(series.symbol, "AAPL");
        assert_eq!(series.points.len(), 60);

        assert_eq!(series_for(&report, "MSFT").unwrap_err(), StatusCode::NOT_FOUND);

        report.histories.remove("TSLA");
        assert_eq!(series_for(&report, "TSLA").unwrap_err(), StatusCode::NOT_FOUND);
    }
}
