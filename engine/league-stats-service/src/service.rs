//! # League Stats Service
//!
//! Query surface over the stats engine. Each query resolves in this order:
//!
//! 1. a fresh cache entry for the exact key
//! 2. a fresh full-season entry re-aggregated for the requested subset
//! 3. fresh computation from the upstream source (cached afterwards)
//! 4. any cached entry for the key, however old, flagged as stale
//!
//! Only when all four come up empty does the caller see an error.

use crate::cache::{CacheKey, CacheManager};
use crate::config::StatsConfig;
use crate::error::{Result, StatsError};
use crate::models::*;
use crate::retry::retry_once_on_rate_limit;
use futures::future::join_all;
use mfl_fetcher::{LeagueDataSource, UpstreamError};
use stats_engine::{
    aggregate, compute_optimal_lineup, efficiency, position_rankings, potential_points, rank,
    AggregateFilter,
    FranchiseDirectory, RankingCategory, RankingEntry, SlotRequirement, TeamAggregate,
    TeamWeekRecord,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct LeagueStatsService {
    league_id: String,
    source: Arc<dyn LeagueDataSource>,
    cache: Arc<CacheManager<CachePayload>>,
    requirements: SlotRequirement,
    backoff: Duration,
}

impl LeagueStatsService {
    pub fn new(
        config: &StatsConfig,
        source: Arc<dyn LeagueDataSource>,
        cache: Arc<CacheManager<CachePayload>>,
    ) -> Result<Self> {
        if config.league.league_id.trim().is_empty() {
            return Err(StatsError::config("league id is not set"));
        }
        Ok(Self::from_parts(
            config.league.league_id.trim(),
            source,
            cache,
            config.requirement()?,
            config.rate_limit_backoff(),
        ))
    }

    pub fn from_parts(
        league_id: &str,
        source: Arc<dyn LeagueDataSource>,
        cache: Arc<CacheManager<CachePayload>>,
        requirements: SlotRequirement,
        backoff: Duration,
    ) -> Self {
        Self { league_id: league_id.to_string(), source, cache, requirements, backoff }
    }

    pub fn league_id(&self) -> &str {
        &self.league_id
    }

    pub fn cache(&self) -> &Arc<CacheManager<CachePayload>> {
        &self.cache
    }

    /// Team aggregates for one season, optionally restricted to weeks,
    /// managers or franchises
    pub async fn get_aggregates(&self, year: i32, query: &AggregateQuery) -> Result<AggregatesResponse> {
        let filter = query.to_filter();
        let key = CacheKey::aggregates(year, &self.league_id, &filter);

        if query.force_refresh {
            info!("Force refresh requested for {}", key);
        } else {
            if let Some(entry) = self.cache.get_fresh(&key).await {
                if let Some(snapshot) = entry.data.as_aggregates() {
                    debug!("Serving cached aggregates for {}", key);
                    return Ok(self.aggregates_response(&key, snapshot, entry.timestamp, Freshness::Cached, None));
                }
            }
            if key.is_filtered() {
                if let Some(response) = self.reuse_full_season(&key, &filter).await {
                    return Ok(response);
                }
            }
        }

        match self.compute_season(year).await {
            Ok(snapshot) => {
                let computed_at = self.cache.now().timestamp_millis();
                let filtered = key.is_filtered().then(|| self.filter_snapshot(&snapshot, &filter)).flatten();
                let response = self.aggregates_response(
                    &key,
                    filtered.as_ref().unwrap_or(&snapshot),
                    computed_at,
                    Freshness::Fresh,
                    None,
                );

                // The full season always lands under its own key so later
                // subsets can be served from its raw records
                let partial = !snapshot.warnings.is_empty();
                self.store(&key.full_season(), CachePayload::Aggregates(snapshot), computed_at, partial).await;
                if let Some(filtered) = filtered {
                    self.store(&key, CachePayload::Aggregates(filtered), computed_at, partial).await;
                }
                Ok(response)
            }
            Err(e) => self.stale_aggregates(&key, &filter, e).await,
        }
    }

    /// Leaderboard for one category over already-computed aggregates
    pub fn get_rankings(&self, teams: &[TeamAggregate], category: RankingCategory) -> Vec<RankingEntry> {
        rank(teams, category)
    }

    /// Aggregates for several seasons at once.
    ///
    /// Every season is fetched concurrently and allowed to finish; seasons
    /// that fail are reported as warnings instead of failing the whole call.
    pub async fn get_multi_year_aggregates(&self, years: &[i32], query: &AggregateQuery) -> MultiYearResponse {
        let mut years = years.to_vec();
        years.sort_unstable();
        years.dedup();

        let tasks = years.iter().map(|&year| async move { (year, self.get_aggregates(year, query).await) });
        let settled = join_all(tasks).await;

        let mut response = MultiYearResponse { years: BTreeMap::new(), warnings: Vec::new() };
        for (year, result) in settled {
            match result {
                Ok(aggregates) => {
                    response.years.insert(year, aggregates);
                }
                Err(e) => {
                    warn!("Excluding season {} from multi-year aggregates: {}", year, e);
                    response.warnings.push(YearWarning { year, reason: e.to_string() });
                }
            }
        }

        info!(
            "Multi-year aggregates: {} seasons ok, {} failed",
            response.years.len(),
            response.warnings.len()
        );
        response
    }

    /// Actual versus optimal lineup for every team in one week
    pub async fn get_weekly_lineups(&self, year: i32, week: u32, force_refresh: bool) -> Result<LineupsResponse> {
        let key = CacheKey::lineups(year, &self.league_id, week);

        if !force_refresh {
            if let Some(entry) = self.cache.get_fresh(&key).await {
                if let Some(snapshot) = entry.data.as_lineups() {
                    debug!("Serving cached lineups for {}", key);
                    return Ok(self.lineups_response(year, week, &key, snapshot, entry.timestamp, Freshness::Cached, None));
                }
            }
            if let Some(response) = self.lineups_from_season(year, week, &key).await {
                return Ok(response);
            }
        }

        match self.compute_lineups(year, week).await {
            Ok(snapshot) => {
                let computed_at = self.cache.now().timestamp_millis();
                let response =
                    self.lineups_response(year, week, &key, &snapshot, computed_at, Freshness::Fresh, None);
                let partial = !snapshot.warnings.is_empty();
                self.store(&key, CachePayload::Lineups(snapshot), computed_at, partial).await;
                Ok(response)
            }
            Err(e) => {
                let reason = e.to_string();
                warn!("Lineup computation failed for {}: {}", key, reason);
                if let Some(entry) = self.cache.get(&key).await {
                    if let Some(snapshot) = entry.data.as_lineups() {
                        warn!("Serving stale lineups for {} (age: {}s)", key, self.cache.age(&entry).num_seconds());
                        return Ok(self.lineups_response(
                            year,
                            week,
                            &key,
                            snapshot,
                            entry.timestamp,
                            Freshness::Stale,
                            Some(reason),
                        ));
                    }
                }
                Err(self.unavailable(&key, reason).await)
            }
        }
    }

    async fn reuse_full_season(&self, key: &CacheKey, filter: &AggregateFilter) -> Option<AggregatesResponse> {
        let base = self.cache.get_fresh(&key.full_season()).await?;
        if base.partial && filter.managers.is_some() {
            // Manager names were missing when the season was cached
            debug!("Not reusing partial full season for manager-filtered {}", key);
            return None;
        }
        let filtered = base.data.as_aggregates().and_then(|s| self.filter_snapshot(s, filter))?;

        info!("Re-aggregating {} from cached full season", key);
        let response = self.aggregates_response(key, &filtered, base.timestamp, Freshness::FilteredCache, None);
        self.store(key, CachePayload::Aggregates(filtered), base.timestamp, base.partial).await;
        Some(response)
    }

    async fn stale_aggregates(
        &self,
        key: &CacheKey,
        filter: &AggregateFilter,
        error: UpstreamError,
    ) -> Result<AggregatesResponse> {
        let reason = error.to_string();
        warn!("Aggregate computation failed for {}: {}", key, reason);

        if let Some(entry) = self.cache.get(key).await {
            if let Some(snapshot) = entry.data.as_aggregates() {
                warn!("Serving stale aggregates for {} (age: {}s)", key, self.cache.age(&entry).num_seconds());
                return Ok(self.aggregates_response(key, snapshot, entry.timestamp, Freshness::Stale, Some(reason)));
            }
        }

        if key.is_filtered() {
            if let Some(base) = self.cache.get(&key.full_season()).await {
                if let Some(filtered) = base.data.as_aggregates().and_then(|s| self.filter_snapshot(s, filter)) {
                    warn!(
                        "Serving stale {} filtered from full season (age: {}s)",
                        key,
                        self.cache.age(&base).num_seconds()
                    );
                    return Ok(self.aggregates_response(key, &filtered, base.timestamp, Freshness::Stale, Some(reason)));
                }
            }
        }

        Err(self.unavailable(key, reason).await)
    }

    async fn unavailable(&self, key: &CacheKey, reason: String) -> StatsError {
        let cached_age_ms = self.cache.youngest_related_age(key).await.map(|age| age.num_milliseconds());
        StatsError::Unavailable { key: key.render(), reason, cached_age_ms }
    }

    /// Fetch and aggregate a whole season, keeping the raw records
    async fn compute_season(&self, year: i32) -> std::result::Result<AggregateSnapshot, UpstreamError> {
        let league_id = self.league_id.as_str();
        let (records, directory) = tokio::join!(
            retry_once_on_rate_limit(self.backoff, "weekly results", || {
                self.source.fetch_all_weekly_results(year, league_id)
            }),
            retry_once_on_rate_limit(self.backoff, "franchise directory", || {
                self.source.fetch_franchise_directory(league_id, year)
            }),
        );

        let records = records?;
        if records.is_empty() {
            return Err(UpstreamError::no_data(format!("no weekly results for league {} in {}", league_id, year)));
        }

        let mut warnings = Vec::new();
        let directory = self.directory_or_warn(directory, &mut warnings);

        let teams = aggregate(&records, &AggregateFilter::default(), &directory, &self.requirements);
        info!("Computed {} team aggregates for {} from {} team-weeks", teams.len(), year, records.len());

        Ok(AggregateSnapshot { teams, raw_records: Some(records), directory, warnings })
    }

    async fn compute_lineups(&self, year: i32, week: u32) -> std::result::Result<LineupSnapshot, UpstreamError> {
        let league_id = self.league_id.as_str();
        let (records, names) = tokio::join!(
            retry_once_on_rate_limit(self.backoff, "weekly results", || {
                self.source.fetch_weekly_results(year, league_id, week)
            }),
            retry_once_on_rate_limit(self.backoff, "team names", || self.source.fetch_team_names(league_id, year)),
        );

        let records = records?;
        if records.is_empty() {
            return Err(UpstreamError::no_data(format!("no results for league {} week {} of {}", league_id, week, year)));
        }

        let mut warnings = Vec::new();
        let directory = self.directory_or_warn(names.map(FranchiseDirectory::from_team_names), &mut warnings);

        Ok(LineupSnapshot { teams: self.lineup_reports(&records, &directory), warnings })
    }

    async fn lineups_from_season(&self, year: i32, week: u32, key: &CacheKey) -> Option<LineupsResponse> {
        let season_key = CacheKey::aggregates(year, &self.league_id, &AggregateFilter::default());
        let base = self.cache.get_fresh(&season_key).await?;
        let season = base.data.as_aggregates()?;
        let week_records: Vec<TeamWeekRecord> =
            season.raw_records.as_ref()?.iter().filter(|r| r.week == week).cloned().collect();
        if week_records.is_empty() {
            return None;
        }

        info!("Building {} from cached full season", key);
        let snapshot = LineupSnapshot {
            teams: self.lineup_reports(&week_records, &season.directory),
            warnings: season.warnings.clone(),
        };
        let response =
            self.lineups_response(year, week, key, &snapshot, base.timestamp, Freshness::FilteredCache, None);
        self.store(key, CachePayload::Lineups(snapshot), base.timestamp, base.partial).await;
        Some(response)
    }

    async fn store(&self, key: &CacheKey, payload: CachePayload, timestamp: i64, partial: bool) {
        if partial {
            self.cache.set_partial(key, payload, timestamp).await;
        } else {
            self.cache.set_with_timestamp(key, payload, timestamp).await;
        }
    }

    fn directory_or_warn(
        &self,
        directory: std::result::Result<FranchiseDirectory, UpstreamError>,
        warnings: &mut Vec<String>,
    ) -> FranchiseDirectory {
        match directory {
            Ok(directory) => directory,
            Err(e) => {
                warn!("Team names unavailable, falling back to franchise ids: {}", e);
                warnings.push(format!("team names unavailable: {}", e));
                FranchiseDirectory::new()
            }
        }
    }

    fn filter_snapshot(&self, snapshot: &AggregateSnapshot, filter: &AggregateFilter) -> Option<AggregateSnapshot> {
        let records = snapshot.raw_records.as_ref()?;
        Some(AggregateSnapshot {
            teams: aggregate(records, filter, &snapshot.directory, &self.requirements),
            raw_records: None,
            directory: snapshot.directory.clone(),
            warnings: snapshot.warnings.clone(),
        })
    }

    fn lineup_reports(&self, records: &[TeamWeekRecord], directory: &FranchiseDirectory) -> Vec<TeamLineupReport> {
        let mut reports: Vec<TeamLineupReport> = records
            .iter()
            .map(|record| {
                let optimal = compute_optimal_lineup(&record.players, &self.requirements);
                let actual_points = record.starters_points();
                let potential = potential_points(record, &self.requirements, &optimal);
                TeamLineupReport {
                    franchise_id: record.franchise_id.clone(),
                    team_name: directory.team_name(&record.franchise_id),
                    actual_points,
                    potential_points: potential,
                    efficiency: efficiency(actual_points, potential),
                    missing_slots: optimal.missing_slots,
                    optimal,
                }
            })
            .collect();
        reports.sort_by(|a, b| a.franchise_id.cmp(&b.franchise_id));
        reports
    }

    fn metadata(
        &self,
        key: &CacheKey,
        computed_at: i64,
        freshness: Freshness,
        stale_reason: Option<String>,
        warnings: &[String],
    ) -> ResponseMetadata {
        ResponseMetadata {
            cache_key: key.render(),
            freshness,
            computed_at,
            age_ms: self.cache.now().timestamp_millis() - computed_at,
            stale_reason,
            warnings: warnings.to_vec(),
        }
    }

    fn aggregates_response(
        &self,
        key: &CacheKey,
        snapshot: &AggregateSnapshot,
        computed_at: i64,
        freshness: Freshness,
        stale_reason: Option<String>,
    ) -> AggregatesResponse {
        AggregatesResponse {
            position_rankings: position_rankings(&snapshot.teams),
            teams: snapshot.teams.clone(),
            metadata: self.metadata(key, computed_at, freshness, stale_reason, &snapshot.warnings),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn lineups_response(
        &self,
        year: i32,
        week: u32,
        key: &CacheKey,
        snapshot: &LineupSnapshot,
        computed_at: i64,
        freshness: Freshness,
        stale_reason: Option<String>,
    ) -> LineupsResponse {
        LineupsResponse {
            year,
            week,
            teams: snapshot.teams.clone(),
            metadata: self.metadata(key, computed_at, freshness, stale_reason, &snapshot.warnings),
        }
    }
}
