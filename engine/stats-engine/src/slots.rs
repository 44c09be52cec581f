//! Roster slot schema used by the lineup optimizer

use crate::error::{EngineError, Result};
use crate::types::Position;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotFamily {
    Offense,
    Defense,
}

/// A named roster slot with the positions it accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDefinition {
    pub name: String,
    pub family: SlotFamily,
    pub count: u32,
    pub positions: Vec<Position>,
}

impl SlotDefinition {
    pub fn new(name: &str, family: SlotFamily, count: u32, positions: &[Position]) -> Self {
        Self { name: name.to_string(), family, count, positions: positions.to_vec() }
    }

    pub fn accepts(&self, position: Position) -> bool {
        self.positions.contains(&position)
    }

    /// A flex slot accepts more than one position
    pub fn is_flex(&self) -> bool {
        self.width() > 1
    }

    /// Number of distinct positions the slot accepts
    pub fn width(&self) -> usize {
        self.eligibility().len()
    }

    fn eligibility(&self) -> BTreeSet<Position> {
        self.positions.iter().copied().collect()
    }
}

/// Ordered slot schema for one league.
///
/// Construction validates that eligibility sets form a laminar family (any
/// two sets are disjoint or nested), which is what makes fixed-then-flex
/// greedy filling exact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SlotDefinition>", into = "Vec<SlotDefinition>")]
pub struct SlotRequirement {
    slots: Vec<SlotDefinition>,
}

impl SlotRequirement {
    pub fn new(slots: Vec<SlotDefinition>) -> Result<Self> {
        validate_slots(&slots)?;
        Ok(Self { slots })
    }

    /// QB RB RB WR WR WR TE FLEX K on offense, two each of DL LB CB S plus a
    /// defensive flex on defense.
    pub fn standard() -> Self {
        use Position::*;
        use SlotFamily::*;
        Self {
            slots: vec![
                SlotDefinition::new("QB", Offense, 1, &[QB]),
                SlotDefinition::new("RB", Offense, 2, &[RB]),
                SlotDefinition::new("WR", Offense, 3, &[WR]),
                SlotDefinition::new("TE", Offense, 1, &[TE]),
                SlotDefinition::new("FLEX-O", Offense, 1, &[RB, WR, TE]),
                SlotDefinition::new("K", Offense, 1, &[K]),
                SlotDefinition::new("DL", Defense, 2, &[DL]),
                SlotDefinition::new("LB", Defense, 2, &[LB]),
                SlotDefinition::new("CB", Defense, 2, &[CB]),
                SlotDefinition::new("S", Defense, 2, &[S]),
                SlotDefinition::new("FLEX-D", Defense, 1, &[DL, LB, CB, S]),
            ],
        }
    }

    pub fn slots(&self) -> &[SlotDefinition] {
        &self.slots
    }

    pub fn family(&self, family: SlotFamily) -> impl Iterator<Item = &SlotDefinition> {
        self.slots.iter().filter(move |slot| slot.family == family)
    }

    /// Whether any slot can hold a player at this position
    pub fn accepts(&self, position: Position) -> bool {
        self.slots.iter().any(|slot| slot.accepts(position))
    }

    /// Total number of lineup positions across all slots
    pub fn total_slots(&self) -> u32 {
        self.slots.iter().map(|slot| slot.count).sum()
    }
}

impl Default for SlotRequirement {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<Vec<SlotDefinition>> for SlotRequirement {
    type Error = EngineError;

    fn try_from(slots: Vec<SlotDefinition>) -> Result<Self> {
        Self::new(slots)
    }
}

impl From<SlotRequirement> for Vec<SlotDefinition> {
    fn from(requirement: SlotRequirement) -> Self {
        requirement.slots
    }
}

fn validate_slots(slots: &[SlotDefinition]) -> Result<()> {
    if slots.is_empty() {
        return Err(EngineError::invalid_slot_schema("no slots defined"));
    }

    let mut names = HashSet::new();
    for slot in slots {
        if slot.name.trim().is_empty() {
            return Err(EngineError::invalid_slot_schema("slot with empty name"));
        }
        if !names.insert(slot.name.as_str()) {
            return Err(EngineError::invalid_slot_schema(format!("duplicate slot {}", slot.name)));
        }
        if slot.count == 0 {
            return Err(EngineError::invalid_slot_schema(format!("slot {} has zero count", slot.name)));
        }
        if slot.positions.is_empty() {
            return Err(EngineError::invalid_slot_schema(format!(
                "slot {} accepts no positions",
                slot.name
            )));
        }
        if slot.width() != slot.positions.len() {
            return Err(EngineError::invalid_slot_schema(format!(
                "slot {} lists a position twice",
                slot.name
            )));
        }
        if slot.accepts(Position::Other) {
            return Err(EngineError::invalid_slot_schema(format!(
                "slot {} accepts unclassified players",
                slot.name
            )));
        }
    }

    // Partially overlapping eligibility sets would need a real matching step
    for (i, a) in slots.iter().enumerate() {
        let set_a = a.eligibility();
        for b in &slots[i + 1..] {
            let set_b = b.eligibility();
            let disjoint = set_a.is_disjoint(&set_b);
            let nested = set_a.is_subset(&set_b) || set_b.is_subset(&set_a);
            if !disjoint && !nested {
                return Err(EngineError::invalid_slot_schema(format!(
                    "slots {} and {} partially overlap",
                    a.name, b.name
                )));
            }
        }
    }

    Ok(())
}
