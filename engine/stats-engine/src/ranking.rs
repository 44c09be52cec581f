//! # Ranking Engine
//!
//! Turns team aggregates into ordered leaderboards. Ranks are 1..N with no
//! gaps; equal values keep their input order.

use crate::error::EngineError;
use crate::types::{Position, TeamAggregate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Leaderboard categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingCategory {
    /// Composite of scoring, potential and record
    Power,
    Wins,
    Total,
    Efficiency,
    Offense,
    Defense,
    /// Points for minus points against
    Differential,
}

impl RankingCategory {
    pub const ALL: [RankingCategory; 7] = [
        RankingCategory::Power,
        RankingCategory::Wins,
        RankingCategory::Total,
        RankingCategory::Efficiency,
        RankingCategory::Offense,
        RankingCategory::Defense,
        RankingCategory::Differential,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RankingCategory::Power => "power",
            RankingCategory::Wins => "wins",
            RankingCategory::Total => "total",
            RankingCategory::Efficiency => "efficiency",
            RankingCategory::Offense => "offense",
            RankingCategory::Defense => "defense",
            RankingCategory::Differential => "differential",
        }
    }

    /// Value a team is ranked on in this category
    pub fn value(&self, team: &TeamAggregate) -> f64 {
        match self {
            RankingCategory::Power => power_score(team),
            RankingCategory::Wins => team.wins as f64 + 0.5 * team.ties as f64,
            RankingCategory::Total => team.total_points,
            RankingCategory::Efficiency => team.efficiency(),
            RankingCategory::Offense => team.offense_points,
            RankingCategory::Defense => team.defense_points,
            RankingCategory::Differential => team.differential(),
        }
    }
}

impl fmt::Display for RankingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankingCategory {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        RankingCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| EngineError::UnknownCategory(s.to_string()))
    }
}

// 50% scoring per game, 20% potential per game, 30% win percentage on a 0-100 scale
fn power_score(team: &TeamAggregate) -> f64 {
    if team.games == 0 {
        return 0.0;
    }
    let games = team.games as f64;
    0.5 * (team.starters_points / games)
        + 0.2 * (team.potential_points / games)
        + 0.3 * (team.win_pct() * 100.0)
}

/// One row of a leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub franchise_id: String,
    pub team_name: String,
    pub manager: String,
    pub value: f64,
    /// 1-based, unique within a leaderboard
    pub rank: usize,
}

impl RankingEntry {
    pub fn tier(&self, total: usize) -> Tier {
        Tier::classify(self.rank, total)
    }
}

/// Thirds of a leaderboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Top,
    Middle,
    Bottom,
}

impl Tier {
    /// Classify a rank among `total` entries using ceil(N/3) and ceil(2N/3) cut-offs
    pub fn classify(rank: usize, total: usize) -> Self {
        let top = total.div_ceil(3);
        let middle = (2 * total).div_ceil(3);
        if rank <= top {
            Tier::Top
        } else if rank <= middle {
            Tier::Middle
        } else {
            Tier::Bottom
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Top => "Top Tier",
            Tier::Middle => "Middle Tier",
            Tier::Bottom => "Bottom Tier",
        }
    }
}

/// Rank aggregates in one category
pub fn rank(aggregates: &[TeamAggregate], category: RankingCategory) -> Vec<RankingEntry> {
    rank_by(aggregates, |team| category.value(team))
}

/// Rank aggregates by an arbitrary extractor, descending.
///
/// Non-finite values sort last.
pub fn rank_by<F>(aggregates: &[TeamAggregate], extractor: F) -> Vec<RankingEntry>
where
    F: Fn(&TeamAggregate) -> f64,
{
    let mut scored: Vec<(&TeamAggregate, f64)> = aggregates
        .iter()
        .map(|team| {
            let value = extractor(team);
            (team, if value.is_finite() { value } else { f64::NEG_INFINITY })
        })
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    scored
        .into_iter()
        .enumerate()
        .map(|(i, (team, value))| RankingEntry {
            franchise_id: team.franchise_id.clone(),
            team_name: team.team_name.clone(),
            manager: team.manager.clone(),
            value,
            rank: i + 1,
        })
        .collect()
}

/// One leaderboard per position any team scored at
pub fn position_rankings(aggregates: &[TeamAggregate]) -> BTreeMap<Position, Vec<RankingEntry>> {
    let positions: BTreeSet<Position> =
        aggregates.iter().flat_map(|team| team.position_totals.keys().copied()).collect();

    positions
        .into_iter()
        .map(|position| {
            let board = rank_by(aggregates, |team| {
                team.position_totals.get(&position).copied().unwrap_or(0.0)
            });
            (position, board)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: &str, total: f64) -> TeamAggregate {
        let mut team = TeamAggregate::new(id, format!("Team {id}"), format!("Manager {id}"), 2024);
        team.total_points = total;
        team
    }

    #[test]
    fn test_ties_get_distinct_ranks_in_input_order() {
        let teams = vec![team("a", 50.0), team("b", 50.0), team("c", 40.0)];
        let board = rank(&teams, RankingCategory::Total);

        let ranks: Vec<_> = board.iter().map(|e| (e.franchise_id.as_str(), e.rank)).collect();
        assert_eq!(ranks, vec![("a", 1), ("b", 2), ("c", 3)]);
    }

    #[test]
    fn test_descending_order() {
        let teams = vec![team("low", 10.0), team("high", 90.0), team("mid", 45.0)];
        let board = rank(&teams, RankingCategory::Total);
        assert_eq!(board[0].franchise_id, "high");
        assert_eq!(board[2].franchise_id, "low");
        assert_eq!(board[2].rank, 3);
    }

    #[test]
    fn test_non_finite_values_sort_last() {
        let teams = vec![team("nan", f64::NAN), team("ok", 1.0)];
        let board = rank(&teams, RankingCategory::Total);
        assert_eq!(board[0].franchise_id, "ok");
        assert_eq!(board[1].value, f64::NEG_INFINITY);
    }

    #[test]
    fn test_tier_boundaries() {
        // N = 10: ceil(10/3) = 4, ceil(20/3) = 7
        let tiers: Vec<_> = (1..=10).map(|r| Tier::classify(r, 10)).collect();
        assert_eq!(&tiers[..4], &[Tier::Top; 4]);
        assert_eq!(&tiers[4..7], &[Tier::Middle; 3]);
        assert_eq!(&tiers[7..], &[Tier::Bottom; 3]);

        assert_eq!(Tier::classify(1, 1), Tier::Top);
        assert_eq!(Tier::classify(2, 2), Tier::Middle);
        assert_eq!(Tier::Top.label(), "Top Tier");
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("Power".parse::<RankingCategory>().unwrap(), RankingCategory::Power);
        assert_eq!(" differential ".parse::<RankingCategory>().unwrap(), RankingCategory::Differential);
        assert!(matches!("luck".parse::<RankingCategory>(), Err(EngineError::UnknownCategory(_))));
    }

    #[test]
    fn test_category_extractors() {
        let mut t = team("x", 0.0);
        t.starters_points = 100.0;
        t.potential_points = 125.0;
        t.points_against = 90.0;
        t.wins = 1;
        t.ties = 1;
        t.games = 2;

        assert!((RankingCategory::Efficiency.value(&t) - 80.0).abs() < 1e-9);
        assert!((RankingCategory::Differential.value(&t) - 10.0).abs() < 1e-9);
        assert!((RankingCategory::Wins.value(&t) - 1.5).abs() < 1e-9);
        // 0.5 * 50 + 0.2 * 62.5 + 0.3 * 75
        assert!((RankingCategory::Power.value(&t) - 60.0).abs() < 1e-9);
        assert_eq!(RankingCategory::Power.value(&team("idle", 10.0)), 0.0);
    }

    #[test]
    fn test_position_rankings_cover_every_scored_position() {
        let mut a = team("a", 0.0);
        a.position_totals.insert(Position::QB, 20.0);
        let mut b = team("b", 0.0);
        b.position_totals.insert(Position::QB, 30.0);
        b.position_totals.insert(Position::K, 9.0);

        let boards = position_rankings(&[a, b]);
        assert_eq!(boards.len(), 2);
        assert_eq!(boards[&Position::QB][0].franchise_id, "b");
        assert_eq!(boards[&Position::K][1].value, 0.0);
    }
}
