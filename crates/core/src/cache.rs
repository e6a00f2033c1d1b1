//! Time-bucketed cache of batch reports.
//!
//! A key is the symbol list, the policy and the time bucket the request falls
//! into. An entry is served only while its bucket matches and it is younger
//! than the TTL.

use crate::batch::BatchReport;
use crate::scoring::ScoringPolicy;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbols: Vec<String>,
    pub policy: ScoringPolicy,
    pub bucket: i64,
}

#[derive(Debug)]
struct CacheEntry {
    stored_at: DateTime<Utc>,
    report: Arc<BatchReport>,
}

#[derive(Debug)]
pub struct BatchCache {
    ttl: Duration,
    entries: HashMap<CacheKey, CacheEntry>,
}

impl BatchCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: ttl.max(Duration::from_secs(1)),
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn key(&self, symbols: &[String], policy: ScoringPolicy, now: DateTime<Utc>) -> CacheKey {
        let ttl_secs = self.ttl.as_secs().max(1) as i64;
        CacheKey {
            symbols: symbols.to_vec(),
            policy,
            bucket: now.timestamp().div_euclid(ttl_secs),
        }
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        match (now - entry.stored_at).to_std() {
            Ok(age) => age < self.ttl,
            // Stored "in the future" (clock step back): treat as fresh.
            Err(_) => true,
        }
    }

    pub fn get(
        &self,
        symbols: &[String],
        policy: ScoringPolicy,
        now: DateTime<Utc>,
    ) -> Option<Arc<BatchReport>> {
        let key = self.key(symbols, policy, now);
        let entry = self.entries.get(&key)?;
        if !self.is_fresh(entry, now) {
            return None;
        }
        Some(Arc::clone(&entry.report))
    }

    pub fn insert(
        &mut self,
        symbols: &[String],
        policy: ScoringPolicy,
        now: DateTime<Utc>,
        report: BatchReport,
    ) -> Arc<BatchReport> {
        self.purge_expired(now);

        let report = Arc::new(report);
        let key = self.key(symbols, policy, now);
        self.entries.insert(
            key,
            CacheEntry {
                stored_at: now,
                report: Arc::clone(&report),
            },
        );
        report
    }

    pub fn purge_expired(&mut self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        let current = now.timestamp().div_euclid(ttl.as_secs().max(1) as i64);
        self.entries.retain(|key, entry| {
            key.bucket == current
                && (now - entry.stored_at)
                    .to_std()
                    .map(|age| age < ttl)
                    .unwrap_or(true)
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
