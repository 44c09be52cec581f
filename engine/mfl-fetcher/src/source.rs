use crate::error::Result;
use async_trait::async_trait;
use stats_engine::{FranchiseDirectory, TeamWeekRecord};
use std::collections::HashMap;

/// Provider of normalized weekly league data.
///
/// Implementations may return empty collections; callers decide whether that
/// counts as "no data".
#[async_trait]
pub trait LeagueDataSource: Send + Sync {
    /// Team-week records for a single week
    async fn fetch_weekly_results(
        &self,
        year: i32,
        league_id: &str,
        week: u32,
    ) -> Result<Vec<TeamWeekRecord>>;

    /// Team-week records for every played week of a season
    async fn fetch_all_weekly_results(&self, year: i32, league_id: &str) -> Result<Vec<TeamWeekRecord>>;

    /// Franchise id -> display name
    async fn fetch_team_names(&self, league_id: &str, year: i32) -> Result<HashMap<String, String>>;

    /// Team names plus managers. Sources without manager data can rely on the
    /// default, which leaves managers empty.
    async fn fetch_franchise_directory(&self, league_id: &str, year: i32) -> Result<FranchiseDirectory> {
        let names = self.fetch_team_names(league_id, year).await?;
        Ok(FranchiseDirectory::from_team_names(names))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NamesOnly;

    #[async_trait]
    impl LeagueDataSource for NamesOnly {
        async fn fetch_weekly_results(&self, _: i32, _: &str, _: u32) -> Result<Vec<TeamWeekRecord>> {
            Ok(Vec::new())
        }

        async fn fetch_all_weekly_results(&self, _: i32, _: &str) -> Result<Vec<TeamWeekRecord>> {
            Ok(Vec::new())
        }

        async fn fetch_team_names(&self, _: &str, _: i32) -> Result<HashMap<String, String>> {
            Ok([("0003".to_string(), "Taxi Squad FC".to_string())].into_iter().collect())
        }
    }

    #[test]
    fn test_default_directory_uses_team_names() {
        let directory = tokio_test::block_on(NamesOnly.fetch_franchise_directory("1", 2024)).unwrap();
        assert_eq!(directory.len(), 1);
        assert_eq!(directory.team_name("0003"), "Taxi Squad FC");
        assert_eq!(directory.manager("0003"), "");
    }
}
