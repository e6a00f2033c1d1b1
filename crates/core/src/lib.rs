pub mod batch;
pub mod cache;
pub mod chart;
pub mod domain;
pub mod indicators;
pub mod ingest;
pub mod news;
pub mod scoring;

pub mod config {
    use crate::batch::RankBy;
    use crate::scoring::ScoringPolicy;
    use anyhow::Context;
    use std::str::FromStr;
    use std::time::Duration;

    pub const DEFAULT_TICKERS: &[&str] = &[
        "NDAQ", "TSLA", "ASML", "GOOGL", "AVGO", "AMZN", "EOSE", "AAPL", "RKLB", "INOD", "IREN",
        "ORCL", "OKLO", "ONDS", "PL", "GOLD",
    ];

    // Watch lists are small and evaluated sequentially.
    const MAX_TICKERS: usize = 50;

    const DEFAULT_CACHE_TTL_SECS: u64 = 600;
    const DEFAULT_PORT: u16 = 3000;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub tickers: Vec<String>,
        pub policy: ScoringPolicy,
        pub rank_by: RankBy,
        pub min_bars: Option<usize>,
        pub cache_ttl: Duration,
        pub market_data_base_url: Option<String>,
        pub market_data_timeout_secs: Option<u64>,
        pub market_data_retries: Option<u32>,
        pub news_feed_url: Option<String>,
        pub news_max_headlines: Option<usize>,
        pub sentry_dsn: Option<String>,
        pub port: u16,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let tickers = match env_opt("TICKERS") {
                Some(s) => parse_tickers(&s)?,
                None => DEFAULT_TICKERS.iter().map(|t| t.to_string()).collect(),
            };

            let policy = env_parse::<ScoringPolicy>("SCORING_POLICY")?.unwrap_or_default();
            let rank_by = env_parse::<RankBy>("RANK_BY")?.unwrap_or_default();
            let cache_ttl_secs =
                env_parse::<u64>("CACHE_TTL_SECS")?.unwrap_or(DEFAULT_CACHE_TTL_SECS);
            anyhow::ensure!(cache_ttl_secs > 0, "CACHE_TTL_SECS must be > 0");

            Ok(Self {
                tickers,
                policy,
                rank_by,
                min_bars: env_parse("MIN_BARS")?,
                cache_ttl: Duration::from_secs(cache_ttl_secs),
                market_data_base_url: env_opt("MARKET_DATA_BASE_URL"),
                market_data_timeout_secs: env_parse("MARKET_DATA_TIMEOUT_SECS")?,
                market_data_retries: env_parse("MARKET_DATA_RETRIES")?,
                news_feed_url: env_opt("NEWS_FEED_URL"),
                news_max_headlines: env_parse("NEWS_MAX_HEADLINES")?,
                sentry_dsn: env_opt("SENTRY_DSN"),
                port: env_parse("PORT")?.unwrap_or(DEFAULT_PORT),
            })
        }

        /// Minimum bar count for the configured policy unless overridden.
        pub fn effective_min_bars(&self) -> usize {
            self.min_bars.unwrap_or_else(|| self.policy.default_min_bars())
        }
    }

    pub fn parse_tickers(s: &str) -> anyhow::Result<Vec<String>> {
        let mut out: Vec<String> = Vec::new();
        for part in s.split(',') {
            let t = part.trim().to_ascii_uppercase();
            if t.is_empty() || out.contains(&t) {
                continue;
            }
            out.push(t);
        }

        anyhow::ensure!(!out.is_empty(), "ticker list must be non-empty");
        anyhow::ensure!(
            out.len() <= MAX_TICKERS,
            "ticker list must have at most {MAX_TICKERS} symbols (got {})",
            out.len()
        );
        Ok(out)
    }

    fn env_opt(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }

    fn env_parse<T>(key: &str) -> anyhow::Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match env_opt(key) {
            Some(s) => {
                let v = s
                    .trim()
                    .parse::<T>()
                    .map_err(|e| anyhow::anyhow!("{e}"))
                    .with_context(|| format!("invalid {key}: {s}"))?;
                Ok(Some(v))
            }
            None => Ok(None),
        }
    }

}
