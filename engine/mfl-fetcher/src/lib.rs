//! MFL Fetcher
//!
//! Upstream league data for the stats service. Defines the [`LeagueDataSource`]
//! interface the service consumes and an HTTP implementation against the
//! MyFantasyLeague export API.

pub mod client;
pub mod config;
pub mod error;
pub mod source;

pub use client::MflClient;
pub use config::FetcherConfig;
pub use error::{Result, UpstreamError};
pub use source::LeagueDataSource;
