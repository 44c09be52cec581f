//! Request and response types for the query surface

use serde::{Deserialize, Serialize};
use stats_engine::{
    AggregateFilter, FranchiseDirectory, OptimalLineup, Position, RankingEntry, TeamAggregate,
    TeamWeekRecord,
};
use std::collections::BTreeMap;

/// Options for an aggregates query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateQuery {
    pub weeks: Option<Vec<u32>>,
    pub managers: Option<Vec<String>>,
    pub franchise_ids: Option<Vec<String>>,
    /// Skip the fresh-read path. The result is still cached.
    #[serde(default)]
    pub force_refresh: bool,
}

impl AggregateQuery {
    pub fn weeks(weeks: impl IntoIterator<Item = u32>) -> Self {
        Self { weeks: Some(weeks.into_iter().collect()), ..Default::default() }
    }

    pub fn with_force_refresh(mut self) -> Self {
        self.force_refresh = true;
        self
    }

    pub fn to_filter(&self) -> AggregateFilter {
        AggregateFilter::from_lists(
            self.weeks.as_deref(),
            self.managers.as_deref(),
            self.franchise_ids.as_deref(),
        )
    }
}

/// Computed aggregates for one cache key.
///
/// Full-season snapshots keep the raw team-week records so week subsets can
/// be recomputed without going upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    pub teams: Vec<TeamAggregate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_records: Option<Vec<TeamWeekRecord>>,
    pub directory: FranchiseDirectory,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Lineup reports for one week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupSnapshot {
    pub teams: Vec<TeamLineupReport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Everything the service stores in its cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum CachePayload {
    Aggregates(AggregateSnapshot),
    Lineups(LineupSnapshot),
}

impl CachePayload {
    pub fn as_aggregates(&self) -> Option<&AggregateSnapshot> {
        match self {
            CachePayload::Aggregates(snapshot) => Some(snapshot),
            CachePayload::Lineups(_) => None,
        }
    }

    pub fn as_lineups(&self) -> Option<&LineupSnapshot> {
        match self {
            CachePayload::Lineups(snapshot) => Some(snapshot),
            CachePayload::Aggregates(_) => None,
        }
    }
}

/// Where a response's data came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    /// Computed from upstream data during this request
    Fresh,
    /// Served from a cache entry within its TTL
    Cached,
    /// Recomputed from a cached full-season entry's raw records
    FilteredCache,
    /// Served past its TTL because fresh computation failed
    Stale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub cache_key: String,
    pub freshness: Freshness,
    /// When the underlying data was computed (epoch millis)
    pub computed_at: i64,
    pub age_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stale_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ResponseMetadata {
    pub fn is_stale(&self) -> bool {
        self.freshness == Freshness::Stale
    }

    /// Data is valid but something along the way failed
    pub fn is_partial(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatesResponse {
    pub teams: Vec<TeamAggregate>,
    pub position_rankings: BTreeMap<Position, Vec<RankingEntry>>,
    pub metadata: ResponseMetadata,
}

/// One team's actual and optimal lineup for a week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamLineupReport {
    pub franchise_id: String,
    pub team_name: String,
    pub actual_points: f64,
    pub optimal: OptimalLineup,
    pub potential_points: f64,
    pub efficiency: f64,
    pub missing_slots: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupsResponse {
    pub year: i32,
    pub week: u32,
    pub teams: Vec<TeamLineupReport>,
    pub metadata: ResponseMetadata,
}

/// A season left out of a multi-year response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearWarning {
    pub year: i32,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiYearResponse {
    pub years: BTreeMap<i32, AggregatesResponse>,
    pub warnings: Vec<YearWarning>,
}

impl MultiYearResponse {
    pub fn is_partial(&self) -> bool {
        !self.warnings.is_empty()
    }
}
