//! # StatsEngine
//!
//! Pure computation core for league stats: normalizes raw weekly results into
//! canonical records, computes optimal lineups, folds team-weeks into team
//! aggregates and derives leaderboards from them.
//!
//! Nothing in this crate performs I/O or holds shared state; every operation
//! takes its inputs by reference and returns new values.

pub mod aggregation;
pub mod error;
pub mod normalization;
pub mod optimizer;
pub mod ranking;
pub mod slots;
pub mod types;

pub use aggregation::{aggregate, summarize_week, AggregateFilter, WeekSummary};
pub use error::{EngineError, Result};
pub use normalization::{
    normalize_franchises, normalize_weekly_results, PlayerDirectory, PlayerInfo,
};
pub use optimizer::{
    compute_optimal_lineup, efficiency, potential_points, OptimalLineup, SlotAssignment,
};
pub use ranking::{position_rankings, rank, rank_by, RankingCategory, RankingEntry, Tier};
pub use slots::{SlotDefinition, SlotFamily, SlotRequirement};
pub use types::*;
