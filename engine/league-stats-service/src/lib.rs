//! # League Stats Service
//!
//! Query surface over the stats engine. Computes team aggregates, rankings and
//! weekly lineup reports from upstream league data, and keeps results in a
//! TTL-governed cache that can serve filtered subsets without refetching and
//! fall back to stale data when the upstream is unavailable.

pub mod cache;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod retry;
pub mod service;


pub use cache::{CacheEntry, CacheKey, CacheManager, CacheStats, TtlPolicy};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::StatsConfig;
pub use error::{Result, StatsError};
pub use logging::initialize_logging_with_config;
pub use models::*;
pub use service::LeagueStatsService;
