use crate::config::Settings;
use crate::domain::Bar;
use crate::ingest::types::ChartResponse;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRIES: u32 = 3;
const DEFAULT_RANGE: &str = "6mo";
const DEFAULT_INTERVAL: &str = "1d";

// The chart endpoint rejects requests without a browser-like agent.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Daily bars for `symbol`, oldest first.
    async fn fetch_daily_bars(&self, symbol: &str) -> Result<Vec<Bar>>;
}

#[derive(Debug, Clone)]
pub struct YahooChartProvider {
    http: reqwest::Client,
    base_url: String,
    range: String,
    interval: String,
    retries: u32,
}

impl YahooChartProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings
            .market_data_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_secs = settings
            .market_data_timeout_secs
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let retries = settings.market_data_retries.unwrap_or(DEFAULT_RETRIES).max(1);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build market data http client")?;

        Ok(Self {
            http,
            base_url,
            range: DEFAULT_RANGE.to_string(),
            interval: DEFAULT_INTERVAL.to_string(),
            retries,
        })
    }

    fn url(&self, symbol: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}",
            self.base_url.trim_end_matches('/'),
            symbol
        )
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers
    }

    async fn fetch_once(&self, symbol: &str) -> Result<Vec<Bar>> {
        let res = self
            .http
            .get(self.url(symbol))
            .headers(self.headers())
            .query(&[
                ("range", self.range.as_str()),
                ("interval", self.interval.as_str()),
            ])
            .send()
            .await
            .context("market data request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read market data response")?;

        // Error bodies are JSON too; prefer the provider's own description.
        let parsed = serde_json::from_str::<ChartResponse>(&text);
        if !status.is_success() {
            let detail = parsed
                .ok()
                .and_then(|r| r.chart.error)
                .map(|e| format!("{}: {}", e.code, e.description.unwrap_or_default()))
                .unwrap_or(text);
            anyhow::bail!("market data HTTP {status}: {detail}");
        }

        let parsed = parsed.context("failed to parse market data response")?;
        parse_chart(symbol, parsed)
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooChartProvider {
    fn provider_name(&self) -> &'static str {
        "yahoo_chart"
    }

    async fn fetch_daily_bars(&self, symbol: &str) -> Result<Vec<Bar>> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_once(symbol).await {
                Ok(bars) => return Ok(bars),
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(
                        symbol,
                        attempt,
                        ?backoff,
                        error = %err,
                        "market data fetch failed; retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

pub fn parse_chart(symbol: &str, resp: ChartResponse) -> Result<Vec<Bar>> {
    if let Some(err) = resp.chart.error {
        anyhow::bail!(
            "market data error for {symbol}: {} {}",
            err.code,
            err.description.unwrap_or_default()
        );
    }

    let result = resp
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .with_context(|| format!("no chart data for {symbol}"))?;

    let bars = result.into_bars();
    anyhow::ensure!(!bars.is_empty(), "empty price history for {symbol}");
    Ok(bars)
}
