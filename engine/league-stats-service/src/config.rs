//! # Configuration
//!
//! Defaults, then an optional TOML file, then `LEAGUE_STATS_*` environment
//! overrides, then validation.

use crate::cache::TtlPolicy;
use anyhow::{Context, Result};
use mfl_fetcher::FetcherConfig;
use serde::{Deserialize, Serialize};
use stats_engine::{SlotDefinition, SlotRequirement};
use std::path::Path;
use std::time::Duration;

/// Main configuration for the league stats service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    pub league: LeagueConfig,
    pub upstream: UpstreamConfig,
    pub cache: CacheConfig,
    pub lineup: LineupConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeagueConfig {
    pub league_id: String,
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self {
            league_id: String::new(),
            base_url: "https://api.myfantasyleague.com".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub timeout_secs: u64,
    /// Delay before the single retry of a rate-limited call
    pub rate_limit_backoff_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self { timeout_secs: 30, rate_limit_backoff_ms: 2000 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub current_season_ttl_hours: u64,
    pub completed_season_ttl_days: u64,
    /// Lifetime of entries built while part of the upstream data was missing
    pub partial_ttl_minutes: u64,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            current_season_ttl_hours: 6,
            completed_season_ttl_days: 7,
            partial_ttl_minutes: 15,
            max_entries: 512,
        }
    }
}

/// Slot schema in optimizer order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineupConfig {
    pub slots: Vec<SlotDefinition>,
}

impl Default for LineupConfig {
    fn default() -> Self {
        Self { slots: SlotRequirement::standard().slots().to_vec() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty`, `json` or `compact`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "compact".to_string() }
    }
}

impl StatsConfig {
    /// Full load: defaults, optional file, environment, validation
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = Self::load_layers(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, optional file and environment, left unvalidated so callers
    /// can apply their own overrides first
    pub fn load_layers(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                tracing::debug!("Loading configuration from file: {:?}", path);
                Self::load_from_file(path)?
            }
            None => Self::default(),
        };

        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a TOML file. Missing sections take defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: StatsConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }

    /// Override with environment variables
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Override from any variable source, keyed by environment variable name
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(league_id) = lookup("LEAGUE_STATS_LEAGUE_ID") {
            self.league.league_id = league_id.trim().to_string();
        }

        if let Some(base_url) = lookup("LEAGUE_STATS_BASE_URL") {
            self.league.base_url = base_url;
        }

        if let Some(api_key) = lookup("LEAGUE_STATS_API_KEY") {
            self.league.api_key = Some(api_key).filter(|k| !k.trim().is_empty());
        }

        if let Some(level) = lookup("LEAGUE_STATS_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(format) = lookup("LEAGUE_STATS_LOG_FORMAT") {
            self.logging.format = format;
        }

        if let Some(backoff) = lookup("LEAGUE_STATS_BACKOFF_MS") {
            match backoff.parse() {
                Ok(ms) => self.upstream.rate_limit_backoff_ms = ms,
                Err(_) => tracing::warn!("Ignoring invalid LEAGUE_STATS_BACKOFF_MS: {}", backoff),
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(anyhow::anyhow!("Invalid log level: {}", self.logging.level)),
        }

        match self.logging.format.as_str() {
            "json" | "pretty" | "compact" => {}
            _ => return Err(anyhow::anyhow!("Invalid log format: {}", self.logging.format)),
        }

        if self.league.league_id.trim().is_empty() {
            return Err(anyhow::anyhow!("League id is not set (LEAGUE_STATS_LEAGUE_ID)"));
        }

        if self.cache.current_season_ttl_hours == 0
            || self.cache.completed_season_ttl_days == 0
            || self.cache.partial_ttl_minutes == 0
        {
            return Err(anyhow::anyhow!("Cache TTLs must be non-zero"));
        }

        if self.cache.max_entries == 0 {
            return Err(anyhow::anyhow!("Cache max_entries must be non-zero"));
        }

        self.requirement().context("Invalid lineup slot schema")?;

        Ok(())
    }

    pub fn requirement(&self) -> stats_engine::Result<SlotRequirement> {
        SlotRequirement::new(self.lineup.slots.clone())
    }

    pub fn ttl_policy(&self) -> TtlPolicy {
        TtlPolicy::new(self.cache.current_season_ttl_hours, self.cache.completed_season_ttl_days)
            .with_partial_minutes(self.cache.partial_ttl_minutes)
    }

    pub fn rate_limit_backoff(&self) -> Duration {
        Duration::from_millis(self.upstream.rate_limit_backoff_ms)
    }

    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            base_url: self.league.base_url.clone(),
            api_key: self.league.api_key.clone(),
            timeout_secs: self.upstream.timeout_secs,
            ..FetcherConfig::default()
        }
    }
}
