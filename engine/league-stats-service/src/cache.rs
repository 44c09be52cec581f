//! # Cache Manager
//!
//! Keyed store of computed payloads with a two-tier TTL policy. Reads never
//! delete: an expired entry stays available for stale fallback until it is
//! replaced, invalidated, purged or evicted for space.

use crate::clock::{Clock, SystemClock};
use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use stats_engine::AggregateFilter;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Deterministic cache key: metric, season, league and canonical filters.
///
/// Filter lists are sorted and deduplicated on construction, so requests that
/// differ only in filter order share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub metric: String,
    pub year: i32,
    pub league_id: String,
    pub weeks: Vec<u32>,
    pub managers: Vec<String>,
    pub franchise_ids: Vec<String>,
}

impl CacheKey {
    pub const AGGREGATES: &'static str = "aggregates";
    pub const LINEUPS: &'static str = "lineups";

    pub fn new(metric: &str, year: i32, league_id: &str) -> Self {
        Self {
            metric: metric.to_string(),
            year,
            league_id: league_id.to_string(),
            weeks: Vec::new(),
            managers: Vec::new(),
            franchise_ids: Vec::new(),
        }
    }

    /// Attach filters, canonicalized
    pub fn with_filters(mut self, weeks: &[u32], managers: &[String], franchise_ids: &[String]) -> Self {
        self.weeks = canonical(weeks.iter().copied());
        self.managers = canonical(managers.iter().map(|m| m.trim().to_string()).filter(|m| !m.is_empty()));
        self.franchise_ids =
            canonical(franchise_ids.iter().map(|f| f.trim().to_string()).filter(|f| !f.is_empty()));
        self
    }

    pub fn aggregates(year: i32, league_id: &str, filter: &AggregateFilter) -> Self {
        let weeks: Vec<u32> = filter.weeks.iter().flatten().copied().collect();
        let managers: Vec<String> = filter.managers.iter().flatten().cloned().collect();
        let franchise_ids: Vec<String> = filter.franchise_ids.iter().flatten().cloned().collect();
        Self::new(Self::AGGREGATES, year, league_id).with_filters(&weeks, &managers, &franchise_ids)
    }

    pub fn lineups(year: i32, league_id: &str, week: u32) -> Self {
        Self::new(Self::LINEUPS, year, league_id).with_filters(&[week], &[], &[])
    }

    /// Same metric, season and league with every filter removed
    pub fn full_season(&self) -> Self {
        Self::new(&self.metric, self.year, &self.league_id)
    }

    pub fn is_filtered(&self) -> bool {
        !self.weeks.is_empty() || !self.managers.is_empty() || !self.franchise_ids.is_empty()
    }

    fn scope_prefix(&self) -> String {
        format!("{}:{}:{}:", self.metric, self.year, self.league_id)
    }

    /// Filter lists render as JSON arrays so separators inside a value
    /// cannot make two different filters collide
    pub fn render(&self) -> String {
        format!(
            "{}w={}:m={}:f={}",
            self.scope_prefix(),
            serde_json::json!(self.weeks),
            serde_json::json!(self.managers),
            serde_json::json!(self.franchise_ids)
        )
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn canonical<T: Ord>(items: impl Iterator<Item = T>) -> Vec<T> {
    let mut items: Vec<T> = items.collect();
    items.sort();
    items.dedup();
    items
}

/// Stored payload with its write time (epoch millis)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub key: String,
    pub year: i32,
    pub data: T,
    pub timestamp: i64,
    /// Built from incomplete upstream data; expires on the partial TTL
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub partial: bool,
}

impl<T> CacheEntry<T> {
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        Duration::milliseconds(now.timestamp_millis() - self.timestamp)
    }
}

/// Two-tier freshness policy: short for the season in progress, long for
/// completed seasons. Partial entries are additionally capped at `partial`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    pub current_season: Duration,
    pub completed_season: Duration,
    pub partial: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            current_season: Duration::hours(6),
            completed_season: Duration::days(7),
            partial: Duration::minutes(15),
        }
    }
}

impl TtlPolicy {
    pub fn new(current_season_hours: u64, completed_season_days: u64) -> Self {
        Self {
            current_season: Duration::hours(current_season_hours as i64),
            completed_season: Duration::days(completed_season_days as i64),
            ..Self::default()
        }
    }

    pub fn with_partial_minutes(mut self, minutes: u64) -> Self {
        self.partial = Duration::minutes(minutes as i64);
        self
    }

    /// Season in progress on `now`. January and February still belong to the
    /// previous year's season.
    pub fn season_of(now: DateTime<Utc>) -> i32 {
        if now.month() <= 2 {
            now.year() - 1
        } else {
            now.year()
        }
    }

    pub fn ttl_for(&self, year: i32, now: DateTime<Utc>) -> Duration {
        if year >= Self::season_of(now) {
            self.current_season
        } else {
            self.completed_season
        }
    }

    /// Lifetime of one stored entry
    pub fn ttl_for_entry<T>(&self, entry: &CacheEntry<T>, now: DateTime<Utc>) -> Duration {
        let ttl = self.ttl_for(entry.year, now);
        if entry.partial {
            ttl.min(self.partial)
        } else {
            ttl
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_entries: usize,
    pub fresh: usize,
    pub expired: usize,
    pub oldest_entry: Option<i64>,
}

/// In-process cache service. Create one per process and share it via `Arc`.
pub struct CacheManager<T> {
    policy: TtlPolicy,
    max_entries: usize,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, Arc<CacheEntry<T>>>>,
}

impl<T: Send + Sync> CacheManager<T> {
    pub fn new(policy: TtlPolicy, max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self { policy, max_entries: max_entries.max(1), clock, entries: RwLock::new(HashMap::new()) }
    }

    pub fn with_system_clock(policy: TtlPolicy, max_entries: usize) -> Self {
        Self::new(policy, max_entries, Arc::new(SystemClock))
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn policy(&self) -> &TtlPolicy {
        &self.policy
    }

    /// Entry for a key regardless of age
    pub async fn get(&self, key: &CacheKey) -> Option<Arc<CacheEntry<T>>> {
        let entries = self.entries.read().await;
        let entry = entries.get(&key.render()).cloned();
        debug!("Cache {} for key: {}", if entry.is_some() { "hit" } else { "miss" }, key);
        entry
    }

    /// Entry for a key only if it is within its TTL
    pub async fn get_fresh(&self, key: &CacheKey) -> Option<Arc<CacheEntry<T>>> {
        let entry = self.get(key).await?;
        if self.is_fresh(&entry) {
            Some(entry)
        } else {
            debug!("Cache entry for {} expired (age: {}s)", key, self.age(&entry).num_seconds());
            None
        }
    }

    pub fn is_fresh(&self, entry: &CacheEntry<T>) -> bool {
        let now = self.now();
        entry.age_at(now) < self.policy.ttl_for_entry(entry, now)
    }

    pub fn age(&self, entry: &CacheEntry<T>) -> Duration {
        entry.age_at(self.now())
    }

    /// Store a payload, replacing any previous entry for the key wholesale
    pub async fn set(&self, key: &CacheKey, data: T) -> Arc<CacheEntry<T>> {
        let timestamp = self.now().timestamp_millis();
        self.set_with_timestamp(key, data, timestamp).await
    }

    /// Store a payload derived from older data, keeping that data's write time
    /// so the derived entry expires no later than its source
    pub async fn set_with_timestamp(&self, key: &CacheKey, data: T, timestamp: i64) -> Arc<CacheEntry<T>> {
        self.insert(key, data, timestamp, false).await
    }

    /// Store a payload built from incomplete upstream data. It stays readable
    /// for stale fallback but is only fresh for the partial TTL.
    pub async fn set_partial(&self, key: &CacheKey, data: T, timestamp: i64) -> Arc<CacheEntry<T>> {
        self.insert(key, data, timestamp, true).await
    }

    async fn insert(&self, key: &CacheKey, data: T, timestamp: i64, partial: bool) -> Arc<CacheEntry<T>> {
        let rendered = key.render();
        let entry = Arc::new(CacheEntry { key: rendered.clone(), year: key.year, data, timestamp, partial });

        let mut entries = self.entries.write().await;
        if !entries.contains_key(&rendered) && entries.len() >= self.max_entries {
            let oldest = entries.iter().min_by_key(|(_, e)| e.timestamp).map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
                info!("Cache size limit reached, evicted {}", oldest);
            }
        }
        entries.insert(rendered, entry.clone());
        debug!("Cached data for key: {} (partial: {})", key, partial);
        entry
    }

    pub async fn invalidate(&self, key: &CacheKey) -> bool {
        let removed = self.entries.write().await.remove(&key.render()).is_some();
        if removed {
            debug!("Invalidated cache key: {}", key);
        }
        removed
    }

    /// Age of the most recent entry sharing the key's metric, season and league
    pub async fn youngest_related_age(&self, key: &CacheKey) -> Option<Duration> {
        let prefix = key.scope_prefix();
        let now = self.now();
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .map(|(_, e)| e.age_at(now))
            .min()
    }

    /// Drop every entry past its TTL. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = self.now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| e.age_at(now) < self.policy.ttl_for_entry(e, now));
        let removed = before - entries.len();
        if removed > 0 {
            info!("Cleared {} expired cache entries", removed);
        }
        removed
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        let now = self.now();
        let entries = self.entries.read().await;
        let fresh = entries
            .values()
            .filter(|e| e.age_at(now) < self.policy.ttl_for_entry(e, now))
            .count();
        CacheStats {
            size: entries.len(),
            max_entries: self.max_entries,
            fresh,
            expired: entries.len() - fresh,
            oldest_entry: entries.values().map(|e| e.timestamp).min(),
        }
    }
}

impl<T: Clone + Send + Sync> CacheManager<T> {
    /// Copy of every entry, ordered by key, in the persisted shape
    pub async fn snapshot(&self) -> Vec<CacheEntry<T>> {
        let entries = self.entries.read().await;
        let mut snapshot: Vec<CacheEntry<T>> = entries.values().map(|e| (**e).clone()).collect();
        snapshot.sort_by(|a, b| a.key.cmp(&b.key));
        snapshot
    }
}
