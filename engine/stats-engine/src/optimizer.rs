//! # Lineup Optimizer
//!
//! Computes the highest-scoring lineup a team could have fielded in a week.
//!
//! Players are ranked by score (stable on input order) and slots are filled
//! family by family, most restrictive eligibility first. Because the slot
//! schema is laminar (see [`SlotRequirement`]) this greedy fill reaches the
//! true maximum.

use crate::slots::{SlotDefinition, SlotFamily, SlotRequirement};
use crate::types::{PlayerRecord, RosterStatus, TeamWeekRecord};
use serde::{Deserialize, Serialize};

/// A player placed into a named slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotAssignment {
    pub slot: String,
    pub player: PlayerRecord,
}

/// Result of lineup optimization for one team-week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimalLineup {
    /// Assignments in slot-schema order
    pub assignments: Vec<SlotAssignment>,
    /// Sum of assigned players' scores
    pub score: f64,
    /// Slots left empty because the roster had no eligible player for them
    pub missing_slots: u32,
}

impl OptimalLineup {
    pub fn lineup(&self) -> Vec<&PlayerRecord> {
        self.assignments.iter().map(|a| &a.player).collect()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Actual points as a percentage of potential points.
///
/// Returns 0 instead of dividing by zero when there is no potential.
pub fn efficiency(actual: f64, potential: f64) -> f64 {
    if potential <= 0.0 || !potential.is_finite() {
        return 0.0;
    }
    actual / potential * 100.0
}

/// Compute the maximum-scoring slot-valid lineup from a weekly roster.
///
/// Injured-reserve and taxi players are never considered.
pub fn compute_optimal_lineup(players: &[PlayerRecord], requirements: &SlotRequirement) -> OptimalLineup {
    let mut ranked: Vec<usize> =
        (0..players.len()).filter(|&i| players[i].is_eligible()).collect();
    // sort_by is stable, so equal scores keep roster order
    ranked.sort_by(|&a, &b| players[b].score.total_cmp(&players[a].score));

    let mut assigned = vec![false; players.len()];
    let mut filled: Vec<Vec<usize>> = vec![Vec::new(); requirements.slots().len()];
    let mut missing_slots = 0;

    for family in [SlotFamily::Offense, SlotFamily::Defense] {
        let mut order: Vec<(usize, &SlotDefinition)> = requirements
            .slots()
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.family == family)
            .collect();
        // Fixed slots before flex, narrower flex before wider
        order.sort_by_key(|(_, slot)| slot.width());

        for (slot_index, slot) in order {
            for _ in 0..slot.count {
                let pick = ranked
                    .iter()
                    .copied()
                    .find(|&i| !assigned[i] && slot.accepts(players[i].position));
                match pick {
                    Some(i) => {
                        assigned[i] = true;
                        filled[slot_index].push(i);
                    }
                    None => missing_slots += 1,
                }
            }
        }
    }

    let mut assignments = Vec::with_capacity(requirements.total_slots() as usize);
    let mut score = 0.0;
    for (slot, picks) in requirements.slots().iter().zip(filled) {
        for i in picks {
            score += players[i].score;
            assignments.push(SlotAssignment { slot: slot.name.clone(), player: players[i].clone() });
        }
    }

    OptimalLineup { assignments, score, missing_slots }
}

/// Best points a team-week could have produced.
///
/// Starters at a position no slot accepts still scored for the team, so they
/// are added on top of the optimal lineup. The result is never below the
/// points the team actually started.
pub fn potential_points(
    record: &TeamWeekRecord,
    requirements: &SlotRequirement,
    lineup: &OptimalLineup,
) -> f64 {
    let unslotted: f64 = record
        .players
        .iter()
        .filter(|p| p.status == RosterStatus::Starter && !requirements.accepts(p.position))
        .map(|p| p.score)
        .sum();
    (lineup.score + unslotted).max(record.starters_points())
}
