use crate::config::Settings;
use crate::news::{score_headlines, SentimentSource};
use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::time::Duration;

const DEFAULT_FEED_URL: &str = "https://news.google.com/rss/search";
const DEFAULT_MAX_HEADLINES: usize = 5;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct RssHeadlineSource {
    http: reqwest::Client,
    feed_url: String,
    max_headlines: usize,
}

impl RssHeadlineSource {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let feed_url = settings
            .news_feed_url
            .clone()
            .unwrap_or_else(|| DEFAULT_FEED_URL.to_string());
        let max_headlines = settings.news_max_headlines.unwrap_or(DEFAULT_MAX_HEADLINES);
        anyhow::ensure!(max_headlines > 0, "NEWS_MAX_HEADLINES must be > 0");

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to build news http client")?;

        Ok(Self {
            http,
            feed_url,
            max_headlines,
        })
    }

    pub async fn fetch_titles(&self, query: &str) -> Result<Vec<String>> {
        let res = self
            .http
            .get(&self.feed_url)
            .query(&[("q", query), ("hl", "en-US"), ("gl", "US"), ("ceid", "US:en")])
            .send()
            .await
            .context("news feed request failed")?;

        let status = res.status();
        anyhow::ensure!(status.is_success(), "news feed HTTP {status}");

        let body = res.text().await.context("failed to read news feed")?;
        parse_item_titles(&body, self.max_headlines)
    }
}

#[async_trait::async_trait]
impl SentimentSource for RssHeadlineSource {
    async fn sentiment(&self, query: &str) -> i32 {
        match self.fetch_titles(query).await {
            Ok(titles) => {
                let score = score_headlines(&titles);
                tracing::debug!(query, headlines = titles.len(), score, "news sentiment");
                score
            }
            Err(err) => {
                tracing::warn!(query, error = %err, "news sentiment unavailable; using 0");
                0
            }
        }
    }
}

/// Titles of the first `limit` `<item>` elements. The channel title is skipped.
pub fn parse_item_titles(xml: &str, limit: usize) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut titles = Vec::new();
    let mut in_item = false;
    let mut in_title = false;
    let mut current = String::new();

    loop {
        match reader.read_event().context("malformed news feed")? {
            Event::Start(e) => match e.name().as_ref() {
                b"item" => in_item = true,
                b"title" if in_item => {
                    in_title = true;
                    current.clear();
                }
                _ => {}
            },
            Event::Text(t) if in_title => {
                current.push_str(&t.unescape().context("bad title text")?);
            }
            Event::CData(c) if in_title => {
                current.push_str(&String::from_utf8_lossy(&c.into_inner()));
            }
            Event::End(e) => match e.name().as_ref() {
                b"title" if in_title => {
                    in_title = false;
                    let title = current.trim();
                    if !title.is_empty() {
                        titles.push(title.to_string());
                        if titles.len() >= limit {
                            break;
                        }
                    }
                }
                b"item" => in_item = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(titles)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>"TSLA" - Google News</title>
    <item><title>Tesla shares surge on delivery beat</title></item>
    <item><title><![CDATA[Analysts flag margin risk]]></title></item>
    <item><title>Tesla &amp; peers: weekly recap</title></item>
    <item><title>Bullish options flow</title></item>
    <item><title>Profit outlook raised</title></item>
    <item><title>Sixth headline is ignored: decline</title></item>
  </channel>
</rss>"#;

    #[test]
    fn extracts_item_titles_only() {
        let titles = parse_item_titles(FEED, 5).unwrap();
        assert_eq!(titles.len(), 5);
        assert_eq!(titles[0], "Tesla shares surge on delivery beat");
        assert_eq!(titles[1], "Analysts flag margin risk");
        assert_eq!(titles[2], "Tesla & peers: weekly recap");
    }

    #[test]
    fn respects_headline_limit_for_scoring() {
        let titles = parse_item_titles(FEED, 5).unwrap();
        // surge +10, risk -10, bullish +10, profit +10
        assert_eq!(score_headlines(&titles), 20);
    }

    #[test]
    fn empty_feed_has_no_titles() {
        let xml = "<rss><channel><title>x</title></channel></rss>";
        assert!(parse_item_titles(xml, 5).unwrap().is_empty());
    }

    #[test]
    fn malformed_feed_is_an_error() {
        assert!(parse_item_titles("<rss><channel><item><title>a</item></rss>", 5).is_err());
    }
}
