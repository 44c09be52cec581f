//! # League Stats CLI Binary
//!
//! Command-line interface for league aggregates, rankings and lineups.

use anyhow::{Context, Result};
use clap::Parser;
use league_stats_service::cli::{Cli, CliHandler};
use league_stats_service::{
    initialize_logging_with_config, CacheManager, LeagueStatsService, StatsConfig, SystemClock,
};
use mfl_fetcher::MflClient;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before reading any LEAGUE_STATS_* variables
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let mut config = StatsConfig::load_layers(cli.config.as_deref())?;
    if let Some(league) = &cli.league {
        config.league.league_id = league.clone();
    }
    config.validate().context("Invalid configuration")?;

    initialize_logging_with_config(&config.logging)?;
    tracing::debug!("Starting league-stats for league {}", config.league.league_id);

    let client = MflClient::new(config.fetcher_config()).context("Failed to build upstream client")?;
    let cache = Arc::new(CacheManager::new(config.ttl_policy(), config.cache.max_entries, Arc::new(SystemClock)));
    let service = LeagueStatsService::new(&config, Arc::new(client), cache)?;

    CliHandler::new(service).handle_command(cli.command).await?;

    Ok(())
}
