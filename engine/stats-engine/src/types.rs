// Canonical record types shared by the optimizer, aggregator and ranking engine

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Player position as used for slot eligibility and positional totals
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Position {
    QB,
    RB,
    WR,
    TE,
    K,
    DL,
    LB,
    CB,
    S,
    /// Any position the league reports that no slot accepts
    Other,
}

/// Which side of the ball a position scores for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSide {
    Offense,
    Defense,
    SpecialTeams,
    Unknown,
}

impl Position {
    pub const ALL: [Position; 10] = [
        Position::QB,
        Position::RB,
        Position::WR,
        Position::TE,
        Position::K,
        Position::DL,
        Position::LB,
        Position::CB,
        Position::S,
        Position::Other,
    ];

    /// Map an upstream position label onto the closed position set.
    ///
    /// Unrecognised labels become `Other` rather than failing.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "QB" => Position::QB,
            "RB" | "HB" | "FB" => Position::RB,
            "WR" => Position::WR,
            "TE" => Position::TE,
            "K" | "PK" => Position::K,
            "DL" | "DT" | "DE" | "NT" => Position::DL,
            "LB" | "ILB" | "OLB" | "MLB" => Position::LB,
            "CB" | "DB" => Position::CB,
            "S" | "SS" | "FS" => Position::S,
            _ => Position::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::QB => "QB",
            Position::RB => "RB",
            Position::WR => "WR",
            Position::TE => "TE",
            Position::K => "K",
            Position::DL => "DL",
            Position::LB => "LB",
            Position::CB => "CB",
            Position::S => "S",
            Position::Other => "OTHER",
        }
    }

    pub fn side(&self) -> PositionSide {
        match self {
            Position::QB | Position::RB | Position::WR | Position::TE => PositionSide::Offense,
            Position::DL | Position::LB | Position::CB | Position::S => PositionSide::Defense,
            Position::K => PositionSide::SpecialTeams,
            Position::Other => PositionSide::Unknown,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Roster status of a player for one week. The four classes are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterStatus {
    Starter,
    Bench,
    InjuredReserve,
    Taxi,
}

impl RosterStatus {
    /// Only starters and bench players count toward bench/potential figures
    pub fn is_eligible(&self) -> bool {
        matches!(self, RosterStatus::Starter | RosterStatus::Bench)
    }
}

/// One player's line for one team-week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: String,
    pub name: String,
    pub position: Position,
    pub franchise_id: String,
    /// Fantasy points for the week, never negative
    pub score: f64,
    pub status: RosterStatus,
}

impl PlayerRecord {
    pub fn is_eligible(&self) -> bool {
        self.status.is_eligible()
    }
}

/// Head-to-head result of a team-week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    Win,
    Loss,
    Tie,
}

impl MatchOutcome {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "W" | "WIN" => Some(MatchOutcome::Win),
            "L" | "LOSS" => Some(MatchOutcome::Loss),
            "T" | "TIE" => Some(MatchOutcome::Tie),
            _ => None,
        }
    }
}

/// All player lines for one franchise in one week of one season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamWeekRecord {
    pub franchise_id: String,
    pub week: u32,
    pub year: i32,
    pub players: Vec<PlayerRecord>,
    /// Official team score reported by the league, when present
    #[serde(default)]
    pub team_score: Option<f64>,
    #[serde(default)]
    pub opponent_score: Option<f64>,
    #[serde(default)]
    pub outcome: Option<MatchOutcome>,
}

impl TeamWeekRecord {
    pub fn new(franchise_id: impl Into<String>, week: u32, year: i32) -> Self {
        Self {
            franchise_id: franchise_id.into(),
            week,
            year,
            players: Vec::new(),
            team_score: None,
            opponent_score: None,
            outcome: None,
        }
    }

    /// Players that may appear in a lineup (starters and bench)
    pub fn eligible_players(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.players.iter().filter(|p| p.is_eligible())
    }

    pub fn starters_points(&self) -> f64 {
        self.points_with_status(RosterStatus::Starter)
    }

    pub fn bench_points(&self) -> f64 {
        self.points_with_status(RosterStatus::Bench)
    }

    fn points_with_status(&self, status: RosterStatus) -> f64 {
        self.players.iter().filter(|p| p.status == status).map(|p| p.score).sum()
    }
}

/// Display metadata for a franchise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FranchiseInfo {
    pub franchise_id: String,
    pub team_name: String,
    pub manager: String,
}

/// Lookup of franchise id to team name and manager
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FranchiseDirectory {
    entries: HashMap<String, FranchiseInfo>,
}

impl FranchiseDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from a plain id -> display name map
    pub fn from_team_names(names: HashMap<String, String>) -> Self {
        let entries = names
            .into_iter()
            .map(|(id, name)| {
                let info =
                    FranchiseInfo { franchise_id: id.clone(), team_name: name, manager: String::new() };
                (id, info)
            })
            .collect();
        Self { entries }
    }

    pub fn insert(&mut self, info: FranchiseInfo) {
        self.entries.insert(info.franchise_id.clone(), info);
    }

    pub fn get(&self, franchise_id: &str) -> Option<&FranchiseInfo> {
        self.entries.get(franchise_id)
    }

    /// Team name, falling back to the franchise id
    pub fn team_name(&self, franchise_id: &str) -> String {
        self.entries
            .get(franchise_id)
            .map(|info| info.team_name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| franchise_id.to_string())
    }

    pub fn manager(&self, franchise_id: &str) -> String {
        self.entries.get(franchise_id).map(|info| info.manager.clone()).unwrap_or_default()
    }

    pub fn team_names(&self) -> HashMap<String, String> {
        self.entries.iter().map(|(id, info)| (id.clone(), info.team_name.clone())).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-team totals over a set of weeks of one season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamAggregate {
    pub franchise_id: String,
    pub manager: String,
    pub team_name: String,
    pub year: i32,
    pub starters_points: f64,
    pub bench_points: f64,
    pub potential_points: f64,
    pub offense_points: f64,
    pub defense_points: f64,
    /// Starter plus bench points
    pub total_points: f64,
    pub position_totals: BTreeMap<Position, f64>,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    /// Weeks with a recorded head-to-head result
    pub games: u32,
    pub points_against: f64,
    /// Weeks that contributed to this aggregate, ascending
    pub weeks: Vec<u32>,
    /// Optimal-lineup slots that could not be filled, summed over weeks
    pub missing_slots: u32,
}

impl TeamAggregate {
    pub fn new(
        franchise_id: impl Into<String>,
        team_name: impl Into<String>,
        manager: impl Into<String>,
        year: i32,
    ) -> Self {
        Self {
            franchise_id: franchise_id.into(),
            manager: manager.into(),
            team_name: team_name.into(),
            year,
            starters_points: 0.0,
            bench_points: 0.0,
            potential_points: 0.0,
            offense_points: 0.0,
            defense_points: 0.0,
            total_points: 0.0,
            position_totals: BTreeMap::new(),
            wins: 0,
            losses: 0,
            ties: 0,
            games: 0,
            points_against: 0.0,
            weeks: Vec::new(),
            missing_slots: 0,
        }
    }

    /// Starter points as a percentage of potential points; 0 when potential is 0
    pub fn efficiency(&self) -> f64 {
        crate::optimizer::efficiency(self.starters_points, self.potential_points)
    }

    /// Points for minus points against
    pub fn differential(&self) -> f64 {
        self.starters_points - self.points_against
    }

    /// Win fraction with ties counted as half a win
    pub fn win_pct(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        (self.wins as f64 + 0.5 * self.ties as f64) / self.games as f64
    }

    /// Fold another aggregate for the same franchise into this one.
    ///
    /// Weeks already present are not double-checked; callers merge disjoint ranges.
    pub fn absorb(&mut self, other: &TeamAggregate) {
        self.starters_points += other.starters_points;
        self.bench_points += other.bench_points;
        self.potential_points += other.potential_points;
        self.offense_points += other.offense_points;
        self.defense_points += other.defense_points;
        self.total_points += other.total_points;
        for (position, points) in &other.position_totals {
            *self.position_totals.entry(*position).or_insert(0.0) += points;
        }
        self.wins += other.wins;
        self.losses += other.losses;
        self.ties += other.ties;
        self.games += other.games;
        self.points_against += other.points_against;
        self.weeks.extend_from_slice(&other.weeks);
        self.weeks.sort_unstable();
        self.weeks.dedup();
        self.missing_slots += other.missing_slots;
    }
}
