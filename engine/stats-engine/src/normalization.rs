// Normalization of raw upstream league payloads into canonical records

use crate::types::{
    FranchiseDirectory, FranchiseInfo, MatchOutcome, PlayerRecord, Position, RosterStatus,
    TeamWeekRecord,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Name and position for a player id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub name: String,
    pub position: Position,
}

/// Player id lookup built from the league's player list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerDirectory {
    players: HashMap<String, PlayerInfo>,
}

impl PlayerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>, position: Position) {
        self.players.insert(id.into(), PlayerInfo { name: name.into(), position });
    }

    pub fn get(&self, id: &str) -> Option<&PlayerInfo> {
        self.players.get(id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Parse a `{"players": {"player": [...]}}` export
    pub fn from_players_export(payload: &Value) -> Self {
        let mut directory = Self::new();
        for raw in one_or_many(&payload["players"]["player"]) {
            let Some(id) = string_field(raw, "id") else {
                continue;
            };
            let name = string_field(raw, "name").unwrap_or_else(|| id.clone());
            let position = string_field(raw, "position")
                .map(|p| Position::from_label(&p))
                .unwrap_or(Position::Other);
            directory.insert(id, name, position);
        }
        debug!("Loaded {} players into directory", directory.len());
        directory
    }
}

/// Treat a JSON value as a list: arrays as-is, a lone object as one element,
/// null/missing as empty.
pub fn one_or_many(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn string_field(raw: &Value, field: &str) -> Option<String> {
    match raw.get(field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a numeric field that may arrive as a string or a number.
///
/// Missing or unparsable values and negative scores come back as 0.0.
pub fn parse_score(raw: Option<&Value>) -> f64 {
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => Some(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        None | Some(Value::Null) => Some(0.0),
        Some(_) => None,
    };

    match parsed {
        Some(score) if score.is_finite() && score >= 0.0 => score,
        Some(score) if score.is_finite() => {
            warn!("Clamping negative score {} to 0", score);
            0.0
        }
        _ => {
            warn!("Unparsable score {:?}, treating as 0", raw);
            0.0
        }
    }
}

fn parse_optional_score(raw: Option<&Value>) -> Option<f64> {
    match raw {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        other => Some(parse_score(other)),
    }
}

/// Map an upstream status string to a roster status.
///
/// Unknown strings fall back to bench so they stay countable but never start.
pub fn parse_status(raw: &str) -> RosterStatus {
    let normalized = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
    match normalized.as_str() {
        "starter" | "start" | "starting" => RosterStatus::Starter,
        "nonstarter" | "non_starter" | "bench" | "roster" => RosterStatus::Bench,
        "ir" | "injured_reserve" | "injuredreserve" => RosterStatus::InjuredReserve,
        "taxi" | "taxi_squad" | "taxisquad" => RosterStatus::Taxi,
        _ => {
            warn!("Unknown roster status '{}', treating as bench", raw);
            RosterStatus::Bench
        }
    }
}

/// Convert one raw player line. Lines without an id are dropped.
pub fn normalize_player(
    raw: &Value,
    franchise_id: &str,
    directory: &PlayerDirectory,
) -> Option<PlayerRecord> {
    let id = string_field(raw, "id")?;
    let known = directory.get(&id);

    let name = string_field(raw, "name")
        .or_else(|| known.map(|info| info.name.clone()))
        .unwrap_or_else(|| id.clone());
    let position = string_field(raw, "position")
        .map(|p| Position::from_label(&p))
        .or_else(|| known.map(|info| info.position))
        .unwrap_or(Position::Other);
    let status = string_field(raw, "status").map(|s| parse_status(&s)).unwrap_or_else(|| {
        warn!("Player {} has no status, treating as bench", id);
        RosterStatus::Bench
    });

    Some(PlayerRecord {
        id,
        name,
        position,
        franchise_id: franchise_id.to_string(),
        score: parse_score(raw.get("score")),
        status,
    })
}

fn normalize_franchise_week(
    raw: &Value,
    week: u32,
    year: i32,
    directory: &PlayerDirectory,
) -> Option<TeamWeekRecord> {
    let franchise_id = string_field(raw, "id")?;
    let mut record = TeamWeekRecord::new(franchise_id.clone(), week, year);
    record.players = one_or_many(&raw["player"])
        .into_iter()
        .filter_map(|p| normalize_player(p, &franchise_id, directory))
        .collect();
    record.team_score = parse_optional_score(raw.get("score"));
    record.outcome = string_field(raw, "result").and_then(|r| MatchOutcome::from_code(&r));
    Some(record)
}

/// Normalize a `weeklyResults` payload (one week or a year-to-date array).
///
/// Records are returned in payload order; a repeated (franchise, week, year)
/// keeps its first occurrence.
pub fn normalize_weekly_results(
    payload: &Value,
    year: i32,
    directory: &PlayerDirectory,
) -> Vec<TeamWeekRecord> {
    let root = payload.get("weeklyResults").unwrap_or(payload);
    let mut records = Vec::new();

    for week_raw in one_or_many(root) {
        let Some(week) = string_field(week_raw, "week").and_then(|w| w.parse::<u32>().ok()) else {
            warn!("Skipping weekly result without a numeric week");
            continue;
        };

        for matchup in one_or_many(&week_raw["matchup"]) {
            let mut sides: Vec<TeamWeekRecord> = one_or_many(&matchup["franchise"])
                .into_iter()
                .filter_map(|f| normalize_franchise_week(f, week, year, directory))
                .collect();
            if sides.len() == 2 {
                let (left, right) = (sides[0].team_score, sides[1].team_score);
                sides[0].opponent_score = right;
                sides[1].opponent_score = left;
                if sides[0].outcome.is_none() {
                    sides[0].outcome = outcome_from_scores(left, right);
                    sides[1].outcome = outcome_from_scores(right, left);
                }
            }
            records.extend(sides);
        }

        // Teams on bye are listed outside any matchup
        records.extend(
            one_or_many(&week_raw["franchise"])
                .into_iter()
                .filter_map(|f| normalize_franchise_week(f, week, year, directory)),
        );
    }

    dedup_team_weeks(records)
}

fn outcome_from_scores(own: Option<f64>, opponent: Option<f64>) -> Option<MatchOutcome> {
    let (own, opponent) = (own?, opponent?);
    Some(if own > opponent {
        MatchOutcome::Win
    } else if own < opponent {
        MatchOutcome::Loss
    } else {
        MatchOutcome::Tie
    })
}

/// Enforce at most one record per (franchise, week, year), keeping the first
pub fn dedup_team_weeks(records: Vec<TeamWeekRecord>) -> Vec<TeamWeekRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| {
            let fresh = seen.insert((r.franchise_id.clone(), r.week, r.year));
            if !fresh {
                warn!(
                    "Dropping duplicate record for franchise {} week {} ({})",
                    r.franchise_id, r.week, r.year
                );
            }
            fresh
        })
        .collect()
}

/// Normalize a `league` payload into a franchise directory
pub fn normalize_franchises(payload: &Value) -> FranchiseDirectory {
    let root = payload.get("league").unwrap_or(payload);
    let mut directory = FranchiseDirectory::new();
    for raw in one_or_many(&root["franchises"]["franchise"]) {
        let Some(franchise_id) = string_field(raw, "id") else {
            continue;
        };
        let team_name = string_field(raw, "name").unwrap_or_else(|| franchise_id.clone());
        let manager = string_field(raw, "owner_name").unwrap_or_default();
        directory.insert(FranchiseInfo { franchise_id, team_name, manager });
    }
    directory
}
