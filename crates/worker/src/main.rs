use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tickerboard_core::batch::{evaluate_batch, BatchOptions, BatchReport, RankBy};
use tickerboard_core::chart::ChartSeries;
use tickerboard_core::ingest::YahooChartProvider;
use tickerboard_core::news::{NoSentiment, RssHeadlineSource, SentimentSource};
use tickerboard_core::scoring::ScoringPolicy;

mod table;

#[derive(Debug, Parser)]
#[command(name = "tickerboard_worker")]
struct Args {
    /// Comma-separated symbols. Defaults to TICKERS or the built-in watch list.
    #[arg(long)]
    tickers: Option<String>,

    /// Scoring policy: simple | weighted.
    #[arg(long)]
    policy: Option<ScoringPolicy>,

    /// Ranking key: confidence | total-score.
    #[arg(long)]
    rank_by: Option<RankBy>,

    /// Minimum bars of history required to score a symbol.
    #[arg(long)]
    min_bars: Option<usize>,

    /// Print the report as JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Also print the indicator series for this symbol.
    #[arg(long)]
    chart: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut settings = tickerboard_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    if let Some(s) = args.tickers.as_deref() {
        settings.tickers = tickerboard_core::config::parse_tickers(s)?;
    }
    if let Some(policy) = args.policy {
        settings.policy = policy;
    }
    if let Some(rank_by) = args.rank_by {
        settings.rank_by = rank_by;
    }
    if let Some(min_bars) = args.min_bars {
        settings.min_bars = Some(min_bars);
    }

    let provider = YahooChartProvider::from_settings(&settings)?;
    let news: Box<dyn SentimentSource> = if settings.policy.uses_news() {
        Box::new(RssHeadlineSource::from_settings(&settings)?)
    } else {
        Box::new(NoSentiment)
    };
    let options = BatchOptions::from_settings(&settings);

    let report = evaluate_batch(&provider, news.as_ref(), &settings.tickers, &options).await;

    if let Err(err) = require_usable(&report) {
        sentry_anyhow::capture_anyhow(&err);
        if !report.failures.is_empty() {
            eprint!("{}", table::render_failures(&report.failures));
        }
        return Err(err);
    }

    if args.json {
        let out = serde_json::to_string_pretty(&report).context("serialize report failed")?;
        println!("{out}");
    } else {
        print!("{}", table::render_ranking(&report));
        if !report.failures.is_empty() {
            print!("{}", table::render_failures(&report.failures));
        }
    }

    if let Some(symbol) = args.chart.as_deref() {
        let record = report
            .asset(symbol)
            .with_context(|| format!("{symbol} is not in the scored set"))?;
        let bars = report
            .history(symbol)
            .with_context(|| format!("no history retained for {symbol}"))?;
        let series = ChartSeries::from_bars(&record.symbol, bars);

        if args.json {
            let out = serde_json::to_string_pretty(&series).context("serialize series failed")?;
            println!("{out}");
        } else {
            print!("{}", table::render_series(&series));
        }
    }

    tracing::info!(
        run_id = %report.run_id,
        scored = report.assets.len(),
        failed = report.failures.len(),
        "worker run complete"
    );
    Ok(())
}

/// An empty batch ends the run with a non-zero exit.
fn require_usable(report: &BatchReport) -> anyhow::Result<()> {
    report
        .ensure_usable()
        .context("unable to load any symbol")
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
