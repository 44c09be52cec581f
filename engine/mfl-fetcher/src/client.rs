use crate::config::FetcherConfig;
use crate::error::{Result, UpstreamError};
use crate::source::LeagueDataSource;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use stats_engine::{
    normalize_franchises, normalize_weekly_results, FranchiseDirectory, PlayerDirectory,
    TeamWeekRecord,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// MyFantasyLeague export API client
pub struct MflClient {
    config: FetcherConfig,
    client: Client,
    /// Player lists per (year, league); positions don't change within a season
    players: RwLock<HashMap<(i32, String), Arc<PlayerDirectory>>>,
}

impl MflClient {
    /// Create a new client instance
    pub fn new(config: FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| UpstreamError::unavailable(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client, players: RwLock::new(HashMap::new()) })
    }

    /// Export endpoint for a season
    pub fn export_url(&self, year: i32) -> String {
        format!("{}/{}/export", self.config.base_url.trim_end_matches('/'), year)
    }

    fn export_params(&self, export_type: &str, league_id: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("TYPE", export_type.to_string()),
            ("L", league_id.to_string()),
            ("JSON", "1".to_string()),
        ];
        if let Some(key) = &self.config.api_key {
            params.push(("APIKEY", key.clone()));
        }
        params
    }

    async fn export(&self, year: i32, params: &[(&'static str, String)]) -> Result<Value> {
        let url = self.export_url(year);
        debug!("Fetching {} with {:?}", url, params.iter().map(|(k, _)| *k).collect::<Vec<_>>());

        let response = self.client.get(&url).query(params).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        classify_response(status, &body)
    }

    async fn player_directory(&self, year: i32, league_id: &str) -> Result<Arc<PlayerDirectory>> {
        let cache_key = (year, league_id.to_string());
        if let Some(directory) = self.players.read().await.get(&cache_key) {
            return Ok(directory.clone());
        }

        let payload = self.export(year, &self.export_params("players", league_id)).await?;
        let directory = Arc::new(PlayerDirectory::from_players_export(&payload));
        info!("Loaded {} players for league {} ({})", directory.len(), league_id, year);

        self.players.write().await.insert(cache_key, directory.clone());
        Ok(directory)
    }

    async fn weekly_results(&self, year: i32, league_id: &str, week: &str) -> Result<Vec<TeamWeekRecord>> {
        let directory = self.player_directory(year, league_id).await?;

        let mut params = self.export_params("weeklyResults", league_id);
        params.push(("W", week.to_string()));
        let payload = self.export(year, &params).await?;

        let records = normalize_weekly_results(&payload, year, &directory);
        info!("Fetched {} team-week records for league {} ({} week {})", records.len(), league_id, year, week);
        Ok(records)
    }
}

/// Turn a raw HTTP status and body into a JSON payload or a typed failure.
///
/// The API reports some failures, throttling included, as a 200 response
/// whose body is `{"error": {"$t": "..."}}`.
pub fn classify_response(status: u16, body: &str) -> Result<Value> {
    if status == 429 {
        return Err(UpstreamError::rate_limited(format!("HTTP 429: {}", body.trim())));
    }
    if !(200..300).contains(&status) {
        return Err(UpstreamError::unavailable(format!("HTTP {}", status)));
    }

    let payload: Value = serde_json::from_str(body)?;
    if let Some(error) = payload.get("error") {
        let message = error
            .get("$t")
            .and_then(Value::as_str)
            .or_else(|| error.as_str())
            .unwrap_or("unknown error")
            .to_string();
        let lowered = message.to_ascii_lowercase();
        if lowered.contains("too many") || lowered.contains("rate limit") || lowered.contains("throttl") {
            warn!("Upstream throttled request: {}", message);
            return Err(UpstreamError::rate_limited(message));
        }
        return Err(UpstreamError::unavailable(message));
    }

    Ok(payload)
}

#[async_trait]
impl LeagueDataSource for MflClient {
    async fn fetch_weekly_results(
        &self,
        year: i32,
        league_id: &str,
        week: u32,
    ) -> Result<Vec<TeamWeekRecord>> {
        self.weekly_results(year, league_id, &week.to_string()).await
    }

    async fn fetch_all_weekly_results(&self, year: i32, league_id: &str) -> Result<Vec<TeamWeekRecord>> {
        self.weekly_results(year, league_id, "YTD").await
    }

    async fn fetch_team_names(&self, league_id: &str, year: i32) -> Result<HashMap<String, String>> {
        Ok(self.fetch_franchise_directory(league_id, year).await?.team_names())
    }

    async fn fetch_franchise_directory(&self, league_id: &str, year: i32) -> Result<FranchiseDirectory> {
        let payload = self.export(year, &self.export_params("league", league_id)).await?;
        let directory = normalize_franchises(&payload);
        if directory.is_empty() {
            return Err(UpstreamError::no_data(format!("league {} ({}) lists no franchises", league_id, year)));
        }
        Ok(directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_key: Option<&str>) -> MflClient {
        let config = FetcherConfig {
            base_url: "https://api.example.test/".to_string(),
            api_key: api_key.map(str::to_string),
            ..Default::default()
        };
        MflClient::new(config).unwrap()
    }

    #[test]
    fn test_export_url_and_params() {
        let client = client(Some("secret"));
        assert_eq!(client.export_url(2024), "https://api.example.test/2024/export");

        let params = client.export_params("weeklyResults", "12345");
        assert!(params.contains(&("TYPE", "weeklyResults".to_string())));
        assert!(params.contains(&("L", "12345".to_string())));
        assert!(params.contains(&("APIKEY", "secret".to_string())));
        assert!(!self::client(None).export_params("league", "1").iter().any(|(k, _)| *k == "APIKEY"));
    }

    #[test]
    fn test_classify_status_codes() {
        assert!(classify_response(429, "slow down").unwrap_err().is_rate_limited());
        assert!(matches!(classify_response(503, ""), Err(UpstreamError::Unavailable { .. })));
        assert!(matches!(classify_response(200, "<html>"), Err(UpstreamError::Malformed { .. })));
        assert!(classify_response(200, r#"{"league": {}}"#).is_ok());
    }

    #[test]
    fn test_classify_error_bodies() {
        let throttled = r#"{"error": {"$t": "Too many requests, please wait"}}"#;
        assert!(classify_response(200, throttled).unwrap_err().is_rate_limited());

        let denied = r#"{"error": {"$t": "API key required"}}"#;
        assert_eq!(
            classify_response(200, denied).unwrap_err(),
            UpstreamError::unavailable("API key required")
        );
    }

    #[test]
    fn test_default_config() {
        let config = FetcherConfig::default();
        assert_eq!(config.base_url, "https://api.myfantasyleague.com");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.api_key.is_none());
    }
}
