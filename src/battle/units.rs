//! Combat units and the two sides of a battle
//!
//! Units are created once when the battle begins, cloned from the engaging
//! legions. Sides hold their units by tag; the units themselves live in the
//! battle's arena.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::battle::archetype::Archetype;
use crate::battle::battle_map::HexId;
use crate::core::types::{PlayerId, SideRole, UnitTag};

/// One creature fighting in the battle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatUnit {
    pub tag: UnitTag,
    pub archetype: Arc<Archetype>,
    pub side: SideRole,
    pub current_hex: HexId,
    /// Hex held at the start of the half-turn; undo returns here
    pub starting_hex: HexId,
    pub damage: u32,
    pub moved: bool,
    pub struck: bool,
}

impl CombatUnit {
    pub fn new(tag: UnitTag, archetype: Arc<Archetype>, side: SideRole, hex: HexId) -> Self {
        Self {
            tag,
            archetype,
            side,
            current_hex: hex,
            starting_hex: hex,
            damage: 0,
            moved: false,
            struck: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.archetype.name
    }

    pub fn is_dead(&self, power: u32) -> bool {
        self.damage >= power
    }

    pub fn remaining_health(&self, power: u32) -> u32 {
        power.saturating_sub(self.damage)
    }

    /// Apply damage, clamped to `power`; returns the excess
    pub fn wound(&mut self, amount: u32, power: u32) -> u32 {
        let total = self.damage + amount;
        if total > power {
            self.damage = power;
            total - power
        } else {
            self.damage = total;
            0
        }
    }

    pub fn kill(&mut self, power: u32) {
        self.damage = self.damage.max(power);
    }

    pub fn move_to(&mut self, hex: HexId) {
        self.current_hex = hex;
        self.moved = true;
    }

    pub fn undo_move(&mut self) {
        self.current_hex = self.starting_hex;
        self.moved = false;
    }

    /// Fix the current position as the new starting position
    pub fn commit_move(&mut self) {
        self.starting_hex = self.current_hex;
        self.moved = false;
    }

    /// Clear per-half-turn flags
    pub fn reset_half_turn(&mut self) {
        self.moved = false;
        self.struck = false;
    }
}

/// One engaged legion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Side {
    pub role: SideRole,
    pub player: PlayerId,
    /// Entrance the side arrives through (0..5)
    pub entry_side: u8,
    pub units: Vec<UnitTag>,
    /// Owner's score, used for titan power
    pub owner_score: u32,
    /// Points earned in this battle
    pub points: u32,
}

impl Side {
    pub fn new(role: SideRole, player: PlayerId, entry_side: u8) -> Self {
        Self {
            role,
            player,
            entry_side,
            units: Vec::new(),
            owner_score: 0,
            points: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }
}

/// A creature arriving with a legion
#[derive(Debug, Clone)]
pub struct UnitSetup {
    pub archetype: Arc<Archetype>,
    /// Starting hex label; `None` places the unit on the side's entrance
    pub hex: Option<String>,
    pub damage: u32,
}

impl UnitSetup {
    pub fn new(archetype: Arc<Archetype>) -> Self {
        Self {
            archetype,
            hex: None,
            damage: 0,
        }
    }

    pub fn at(mut self, label: impl Into<String>) -> Self {
        self.hex = Some(label.into());
        self
    }

    pub fn with_damage(mut self, damage: u32) -> Self {
        self.damage = damage;
        self
    }
}

/// A legion entering battle
#[derive(Debug, Clone)]
pub struct LegionSetup {
    pub player: PlayerId,
    pub units: Vec<UnitSetup>,
}

impl LegionSetup {
    pub fn new(player: PlayerId) -> Self {
        Self {
            player,
            units: Vec::new(),
        }
    }

    pub fn with(mut self, unit: UnitSetup) -> Self {
        self.units.push(unit);
        self
    }
}
