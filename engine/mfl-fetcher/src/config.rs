use serde::{Deserialize, Serialize};

/// Configuration for the MyFantasyLeague export client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// API host, without the year path segment
    pub base_url: String,

    /// Optional league API key for private leagues
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.myfantasyleague.com".to_string(),
            api_key: None,
            timeout_secs: 30,
            user_agent: format!("league-stats/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}
