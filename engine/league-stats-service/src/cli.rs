//! # Command Line Interface
//!
//! Query league stats from the terminal. Results are printed as JSON on
//! stdout; logs go to stderr.

use crate::models::AggregateQuery;
use crate::service::LeagueStatsService;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use stats_engine::{RankingCategory, Tier};
use std::path::PathBuf;

/// League stats CLI
#[derive(Parser, Debug)]
#[command(name = "league-stats")]
#[command(about = "Team aggregates, rankings and lineup reports for a fantasy league")]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// League id, overriding config and environment
    #[arg(short, long)]
    pub league: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Team aggregates for a season
    Aggregates {
        #[arg(long)]
        year: i32,
        #[command(flatten)]
        filters: FilterArgs,
        /// Ignore fresh cache entries
        #[arg(long)]
        force_refresh: bool,
    },
    /// Leaderboard for one category
    Rankings {
        #[arg(long)]
        year: i32,
        /// power, wins, total, efficiency, offense, defense or differential
        #[arg(long, default_value = "power")]
        category: RankingCategory,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Actual versus optimal lineups for one week
    Lineups {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        week: u32,
        #[arg(long)]
        force_refresh: bool,
    },
    /// Aggregates for several seasons
    History {
        /// Comma-separated seasons
        #[arg(long, value_delimiter = ',', required = true)]
        years: Vec<i32>,
        #[command(flatten)]
        filters: FilterArgs,
    },
}

#[derive(clap::Args, Debug, Clone, Default, PartialEq)]
pub struct FilterArgs {
    /// Comma-separated weeks
    #[arg(long, value_delimiter = ',')]
    pub weeks: Vec<u32>,
    /// Comma-separated manager names
    #[arg(long, value_delimiter = ',')]
    pub managers: Vec<String>,
    /// Comma-separated franchise ids
    #[arg(long, value_delimiter = ',')]
    pub franchises: Vec<String>,
}

impl FilterArgs {
    pub fn to_query(&self) -> AggregateQuery {
        AggregateQuery {
            weeks: Some(self.weeks.clone()).filter(|w| !w.is_empty()),
            managers: Some(self.managers.clone()).filter(|m| !m.is_empty()),
            franchise_ids: Some(self.franchises.clone()).filter(|f| !f.is_empty()),
            force_refresh: false,
        }
    }
}

/// Leaderboard row as printed
#[derive(Debug, Serialize)]
struct RankingRow {
    rank: usize,
    franchise_id: String,
    team_name: String,
    manager: String,
    value: f64,
    tier: Tier,
}

/// CLI handler
pub struct CliHandler {
    service: LeagueStatsService,
}

impl CliHandler {
    pub fn new(service: LeagueStatsService) -> Self {
        Self { service }
    }

    /// Handle a command and print its result
    pub async fn handle_command(&self, command: Commands) -> Result<()> {
        let output = self.execute(command).await?;
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    /// Run a command and return its JSON result
    pub async fn execute(&self, command: Commands) -> Result<Value> {
        let value = match command {
            Commands::Aggregates { year, filters, force_refresh } => {
                let mut query = filters.to_query();
                query.force_refresh = force_refresh;
                let response = self
                    .service
                    .get_aggregates(year, &query)
                    .await
                    .with_context(|| format!("Failed to load aggregates for {}", year))?;
                serde_json::to_value(response)?
            }
            Commands::Rankings { year, category, filters } => {
                let response = self
                    .service
                    .get_aggregates(year, &filters.to_query())
                    .await
                    .with_context(|| format!("Failed to load aggregates for {}", year))?;
                let board = self.service.get_rankings(&response.teams, category);
                let total = board.len();
                let rows: Vec<RankingRow> = board
                    .into_iter()
                    .map(|entry| RankingRow {
                        tier: entry.tier(total),
                        rank: entry.rank,
                        franchise_id: entry.franchise_id,
                        team_name: entry.team_name,
                        manager: entry.manager,
                        value: entry.value,
                    })
                    .collect();
                serde_json::json!({
                    "category": category,
                    "rankings": rows,
                    "metadata": response.metadata,
                })
            }
            Commands::Lineups { year, week, force_refresh } => {
                let response = self
                    .service
                    .get_weekly_lineups(year, week, force_refresh)
                    .await
                    .with_context(|| format!("Failed to load lineups for {} week {}", year, week))?;
                serde_json::to_value(response)?
            }
            Commands::History { years, filters } => {
                let response = self.service.get_multi_year_aggregates(&years, &filters.to_query()).await;
                serde_json::to_value(response)?
            }
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aggregates_with_filters() {
        let cli = Cli::try_parse_from([
            "league-stats",
            "--league",
            "12345",
            "aggregates",
            "--year",
            "2024",
            "--weeks",
            "3,1,2",
            "--managers",
            "Alex",
            "--force-refresh",
        ])
        .unwrap();

        assert_eq!(cli.league.as_deref(), Some("12345"));
        match cli.command {
            Commands::Aggregates { year, filters, force_refresh } => {
                assert_eq!(year, 2024);
                assert!(force_refresh);
                let query = filters.to_query();
                assert_eq!(query.weeks, Some(vec![3, 1, 2]));
                assert_eq!(query.managers, Some(vec!["Alex".to_string()]));
                assert_eq!(query.franchise_ids, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rankings_category() {
        let cli = Cli::try_parse_from(["league-stats", "rankings", "--year", "2023"]).unwrap();
        assert!(matches!(cli.command, Commands::Rankings { category: RankingCategory::Power, .. }));

        let cli =
            Cli::try_parse_from(["league-stats", "rankings", "--year", "2023", "--category", "differential"])
                .unwrap();
        assert!(matches!(cli.command, Commands::Rankings { category: RankingCategory::Differential, .. }));

        assert!(Cli::try_parse_from(["league-stats", "rankings", "--year", "2023", "--category", "luck"]).is_err());
    }

    #[test]
    fn test_parse_history_years() {
        let cli = Cli::try_parse_from(["league-stats", "history", "--years", "2022,2023"]).unwrap();
        match cli.command {
            Commands::History { years, filters } => {
                assert_eq!(years, vec![2022, 2023]);
                assert_eq!(filters, FilterArgs::default());
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["league-stats", "history"]).is_err());
    }
}
