// In-memory history cache keyed by ticker, as-of date and window length
use crate::data::provider::{HistoryWindow, PriceHistoryProvider};
use crate::error::EngineError;
use async_trait::async_trait;
use chrono::NaiveDate;
use shared::Bar;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub ticker: String,
    pub as_of: NaiveDate,
    pub window_len: usize,
}

impl CacheKey {
    pub fn new(ticker: &str, window: &HistoryWindow) -> Self {
        Self {
            ticker: ticker.trim().to_ascii_uppercase(),
            as_of: window.as_of,
            window_len: window.lookback_bars,
        }
    }
}

#[derive(Debug, Default)]
pub struct HistoryCache {
    entries: HashMap<CacheKey, Arc<Vec<Bar>>>,
}

impl HistoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<Vec<Bar>>> {
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: CacheKey, bars: Vec<Bar>) -> Arc<Vec<Bar>> {
        let bars = Arc::new(bars);
        self.entries.insert(key, Arc::clone(&bars));
        bars
    }

    /// Drops every entry for `ticker`, whatever its window.
    pub fn invalidate(&mut self, ticker: &str) -> usize {
        let ticker = ticker.trim().to_ascii_uppercase();
        let before = self.entries.len();
        self.entries.retain(|key, _| key.ticker != ticker);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Wraps a provider so repeated requests for the same window are served from memory.
///
/// Only successful fetches are stored; a failed fetch is retried on the next request.
pub struct CachedProvider<P> {
    inner: P,
    cache: Arc<RwLock<HistoryCache>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<P: PriceHistoryProvider> CachedProvider<P> {
    pub fn new(inner: P) -> Self {
        Self::with_cache(inner, Arc::new(RwLock::new(HistoryCache::new())))
    }

    /// Uses a cache that other wrappers may also hold.
    pub fn with_cache(inner: P, cache: Arc<RwLock<HistoryCache>>) -> Self {
        Self {
            inner,
            cache,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn cache(&self) -> Arc<RwLock<HistoryCache>> {
        Arc::clone(&self.cache)
    }

    /// `(hits, misses)` since construction.
    pub fn stats(&self) -> (usize, usize) {
        (self.hits.load(Ordering::Relaxed), self.misses.load(Ordering::Relaxed))
    }
}

#[async_trait]
impl<P: PriceHistoryProvider> PriceHistoryProvider for CachedProvider<P> {
    async fn fetch_history(&self, ticker: &str, window: &HistoryWindow) -> Result<Vec<Bar>, EngineError> {
        let key = CacheKey::new(ticker, window);
        let cached = self.cache.read().await.get(&key);
        if let Some(bars) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(ticker = %key.ticker, as_of = %key.as_of, "history cache hit");
            return Ok(bars.as_ref().clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let bars = self.inner.fetch_history(ticker, window).await?;
        let stored = self.cache.write().await.insert(key, bars);
        Ok(stored.as_ref().clone())
    }
}
