//! # Team Aggregation
//!
//! Folds team-week records into per-team totals for a season or a filtered
//! range of weeks. Every figure is a plain sum over the included weeks.

use crate::optimizer::{compute_optimal_lineup, potential_points};
use crate::slots::SlotRequirement;
use crate::types::{
    FranchiseDirectory, MatchOutcome, Position, PositionSide, RosterStatus, TeamAggregate,
    TeamWeekRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Week, manager and franchise restrictions for an aggregation.
///
/// `None` means "no restriction". Values that match nothing are not errors;
/// they simply produce fewer (or no) aggregates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateFilter {
    pub weeks: Option<BTreeSet<u32>>,
    pub managers: Option<BTreeSet<String>>,
    pub franchise_ids: Option<BTreeSet<String>>,
}

impl AggregateFilter {
    /// Build a filter from raw request lists. Empty lists mean no restriction.
    pub fn from_lists(
        weeks: Option<&[u32]>,
        managers: Option<&[String]>,
        franchise_ids: Option<&[String]>,
    ) -> Self {
        Self {
            weeks: weeks.map(|w| w.iter().copied().collect::<BTreeSet<_>>()).filter(|s| !s.is_empty()),
            managers: managers.map(canonical_strings).filter(|s| !s.is_empty()),
            franchise_ids: franchise_ids.map(canonical_strings).filter(|s| !s.is_empty()),
        }
    }

    pub fn weeks(weeks: impl IntoIterator<Item = u32>) -> Self {
        let weeks: Vec<u32> = weeks.into_iter().collect();
        Self::from_lists(Some(weeks.as_slice()), None, None)
    }

    pub fn is_filtered(&self) -> bool {
        self.weeks.is_some() || self.managers.is_some() || self.franchise_ids.is_some()
    }

    pub fn includes_week(&self, week: u32) -> bool {
        self.weeks.as_ref().map_or(true, |weeks| weeks.contains(&week))
    }

    fn includes_team(&self, franchise_id: &str, manager: &str) -> bool {
        let franchise_ok =
            self.franchise_ids.as_ref().map_or(true, |ids| ids.contains(franchise_id));
        let manager_ok = self.managers.as_ref().map_or(true, |managers| managers.contains(manager));
        franchise_ok && manager_ok
    }
}

fn canonical_strings(values: &[String]) -> BTreeSet<String> {
    values.iter().map(|v| v.trim().to_string()).filter(|v| !v.is_empty()).collect()
}

/// Derived figures for a single team-week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekSummary {
    pub starters_points: f64,
    pub bench_points: f64,
    pub potential_points: f64,
    pub offense_points: f64,
    pub defense_points: f64,
    pub position_totals: BTreeMap<Position, f64>,
    pub missing_slots: u32,
}

/// Summarize one team-week: actual splits plus optimizer potential
pub fn summarize_week(record: &TeamWeekRecord, requirements: &SlotRequirement) -> WeekSummary {
    let mut position_totals = BTreeMap::new();
    let mut offense_points = 0.0;
    let mut defense_points = 0.0;

    for player in record.eligible_players() {
        *position_totals.entry(player.position).or_insert(0.0) += player.score;
        if player.status == RosterStatus::Starter {
            match player.position.side() {
                PositionSide::Offense => offense_points += player.score,
                PositionSide::Defense => defense_points += player.score,
                PositionSide::SpecialTeams | PositionSide::Unknown => {}
            }
        }
    }

    let lineup = compute_optimal_lineup(&record.players, requirements);

    WeekSummary {
        starters_points: record.starters_points(),
        bench_points: record.bench_points(),
        potential_points: potential_points(record, requirements, &lineup),
        offense_points,
        defense_points,
        position_totals,
        missing_slots: lineup.missing_slots,
    }
}

/// Aggregate team-week records into per-team totals.
///
/// Output is ordered by year, then franchise id.
pub fn aggregate(
    records: &[TeamWeekRecord],
    filter: &AggregateFilter,
    directory: &FranchiseDirectory,
    requirements: &SlotRequirement,
) -> Vec<TeamAggregate> {
    let mut teams: BTreeMap<(i32, &str), TeamAggregate> = BTreeMap::new();

    for record in records.iter().filter(|r| filter.includes_week(r.week)) {
        let team = teams.entry((record.year, record.franchise_id.as_str())).or_insert_with(|| {
            TeamAggregate::new(
                record.franchise_id.clone(),
                directory.team_name(&record.franchise_id),
                directory.manager(&record.franchise_id),
                record.year,
            )
        });
        apply_week(team, record, &summarize_week(record, requirements));
    }

    let result: Vec<TeamAggregate> = teams
        .into_values()
        .filter(|team| filter.includes_team(&team.franchise_id, &team.manager))
        .collect();

    tracing::debug!(
        "Aggregated {} records into {} teams (filtered: {})",
        records.len(),
        result.len(),
        filter.is_filtered()
    );
    result
}

fn apply_week(team: &mut TeamAggregate, record: &TeamWeekRecord, week: &WeekSummary) {
    team.starters_points += week.starters_points;
    team.bench_points += week.bench_points;
    team.potential_points += week.potential_points;
    team.offense_points += week.offense_points;
    team.defense_points += week.defense_points;
    team.total_points += week.starters_points + week.bench_points;
    for (position, points) in &week.position_totals {
        *team.position_totals.entry(*position).or_insert(0.0) += points;
    }
    team.missing_slots += week.missing_slots;

    if let Some(outcome) = record.outcome {
        team.games += 1;
        match outcome {
            MatchOutcome::Win => team.wins += 1,
            MatchOutcome::Loss => team.losses += 1,
            MatchOutcome::Tie => team.ties += 1,
        }
    }
    if let Some(against) = record.opponent_score {
        team.points_against += against;
    }
    if let Err(pos) = team.weeks.binary_search(&record.week) {
        team.weeks.insert(pos, record.week);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FranchiseInfo, PlayerRecord};

    fn player(id: &str, position: Position, score: f64, status: RosterStatus) -> PlayerRecord {
        PlayerRecord {
            id: id.to_string(),
            name: id.to_string(),
            position,
            franchise_id: String::new(),
            score,
            status,
        }
    }

    fn week(franchise: &str, week: u32, base: f64, outcome: MatchOutcome) -> TeamWeekRecord {
        use Position::*;
        use RosterStatus::*;
        let mut record = TeamWeekRecord::new(franchise, week, 2024);
        record.players = vec![
            player("qb", QB, base, Starter),
            player("rb", RB, base / 2.0, Starter),
            player("k", K, 7.0, Starter),
            player("lb", LB, 4.0 + week as f64, Starter),
            player("wr", WR, base / 3.0, Bench),
            player("ir", RB, 30.0, InjuredReserve),
            player("taxi", WR, 12.0, Taxi),
        ];
        for p in &mut record.players {
            p.franchise_id = franchise.to_string();
        }
        record.outcome = Some(outcome);
        record.team_score = Some(record.starters_points());
        record.opponent_score = Some(80.0 + week as f64);
        record
    }

    fn season() -> Vec<TeamWeekRecord> {
        let mut records = Vec::new();
        for w in 1..=5 {
            records.push(week("0001", w, 20.0 + w as f64, MatchOutcome::Win));
            records.push(week("0002", w, 10.0 + w as f64, MatchOutcome::Loss));
        }
        records
    }

    fn directory() -> FranchiseDirectory {
        let mut directory = FranchiseDirectory::new();
        directory.insert(FranchiseInfo {
            franchise_id: "0001".into(),
            team_name: "Gridiron Gang".into(),
            manager: "Alex".into(),
        });
        directory.insert(FranchiseInfo {
            franchise_id: "0002".into(),
            team_name: "Bench Mob".into(),
            manager: "Sam".into(),
        });
        directory
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_bench_ignores_reserve_and_taxi() {
        let records = vec![week("0001", 1, 24.0, MatchOutcome::Win)];
        let teams = aggregate(&records, &AggregateFilter::default(), &directory(), &SlotRequirement::standard());

        assert_eq!(teams.len(), 1);
        assert!(close(teams[0].bench_points, 8.0));
        assert!(teams[0].position_totals.get(&Position::RB).is_some_and(|v| close(*v, 12.0)));
        assert_eq!(teams[0].team_name, "Gridiron Gang");
        assert_eq!(teams[0].manager, "Alex");
    }

    #[test]
    fn test_week_filter_additivity() {
        let records = season();
        let dir = directory();
        let req = SlotRequirement::standard();

        let early = aggregate(&records, &AggregateFilter::weeks([1, 2, 3]), &dir, &req);
        let late = aggregate(&records, &AggregateFilter::weeks([4, 5]), &dir, &req);
        let all = aggregate(&records, &AggregateFilter::weeks([1, 2, 3, 4, 5]), &dir, &req);

        for ((e, l), a) in early.iter().zip(&late).zip(&all) {
            let mut combined = e.clone();
            combined.absorb(l);
            assert_eq!(combined.franchise_id, a.franchise_id);
            assert!(close(combined.starters_points, a.starters_points));
            assert!(close(combined.bench_points, a.bench_points));
            assert!(close(combined.potential_points, a.potential_points));
            assert!(close(combined.points_against, a.points_against));
            assert_eq!(combined.wins, a.wins);
            assert_eq!(combined.weeks, vec![1, 2, 3, 4, 5]);
        }
    }

    #[test]
    fn test_no_filter_equals_all_weeks() {
        let records = season();
        let all = aggregate(&records, &AggregateFilter::default(), &directory(), &SlotRequirement::standard());
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].wins, 5);
        assert_eq!(all[1].losses, 5);
        assert_eq!(all[0].games, 5);
    }

    #[test]
    fn test_manager_and_franchise_filters() {
        let records = season();
        let req = SlotRequirement::standard();

        let filter = AggregateFilter::from_lists(None, Some(&["Sam".to_string()][..]), None);
        let teams = aggregate(&records, &filter, &directory(), &req);
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].franchise_id, "0002");

        let filter = AggregateFilter::from_lists(None, None, Some(&["9999".to_string()][..]));
        assert!(aggregate(&records, &filter, &directory(), &req).is_empty());

        let filter = AggregateFilter::weeks([40]);
        assert!(aggregate(&records, &filter, &directory(), &req).is_empty());
    }

    #[test]
    fn test_empty_lists_mean_unfiltered() {
        let filter = AggregateFilter::from_lists(Some(&[][..]), Some(&[][..]), Some(&[" ".to_string()][..]));
        assert!(!filter.is_filtered());
    }

    #[test]
    fn test_kicker_points_outside_offense_and_defense() {
        let records = vec![week("0001", 2, 30.0, MatchOutcome::Win)];
        let teams = aggregate(&records, &AggregateFilter::default(), &directory(), &SlotRequirement::standard());
        let team = &teams[0];

        assert!(close(team.offense_points, 45.0));
        assert!(close(team.defense_points, 6.0));
        assert!(close(team.starters_points - team.offense_points - team.defense_points, 7.0));
        assert!(close(team.total_points, team.starters_points + team.bench_points));
        assert!(team.potential_points >= team.starters_points);
    }

    #[test]
    fn test_started_defense_unit_keeps_efficiency_in_range() {
        let mut record = TeamWeekRecord::new("0001", 1, 2024);
        record.players = vec![
            player("qb", Position::QB, 20.0, RosterStatus::Starter),
            player("def", Position::from_label("Def"), 12.0, RosterStatus::Starter),
        ];
        let teams = aggregate(&[record], &AggregateFilter::default(), &directory(), &SlotRequirement::standard());
        let team = &teams[0];

        assert!(close(team.starters_points, 32.0));
        assert!(team.potential_points >= team.starters_points);
        assert!(team.efficiency() <= 100.0);
    }

    #[test]
    fn test_unknown_franchise_falls_back_to_id() {
        let records = vec![week("0042", 1, 10.0, MatchOutcome::Tie)];
        let teams = aggregate(&records, &AggregateFilter::default(), &FranchiseDirectory::new(), &SlotRequirement::standard());
        assert_eq!(teams[0].team_name, "0042");
        assert_eq!(teams[0].ties, 1);
        assert!(close(teams[0].win_pct(), 0.5));
    }
}
