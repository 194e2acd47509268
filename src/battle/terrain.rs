//! Battle terrain types and their effects
//!
//! Each hex carries one terrain feature and six hexside obstructions.

use serde::{Deserialize, Serialize};

use crate::battle::constants::{IMPASSABLE_COST, NORMAL_MOVE_COST, SLOW_MOVE_COST};

/// Terrain feature inside a battle hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HexTerrain {
    #[default]
    Open,
    Bramble,  // Slows and hinders non-natives
    Drift,    // Wounds non-natives each fight phase
    Bog,      // Impassable unless native
    SandDune, // Slow for non-natives on foot
    Slope,    // Raised open ground
    Volcano,  // Impassable unless native, fuels flame
    Tree,     // Impassable, blocks sight
}

impl HexTerrain {
    /// Label used in text reports
    pub fn name(&self) -> &'static str {
        match self {
            HexTerrain::Open => "Plains",
            HexTerrain::Bramble => "Bramble",
            HexTerrain::Drift => "Drift",
            HexTerrain::Bog => "Bog",
            HexTerrain::SandDune => "Sand",
            HexTerrain::Slope => "Slope",
            HexTerrain::Volcano => "Volcano",
            HexTerrain::Tree => "Tree",
        }
    }

    /// Does this terrain block line of sight?
    pub fn blocks_los(&self) -> bool {
        matches!(self, HexTerrain::Tree)
    }

    /// Entry cost for a unit, given whether it is native here and can fly
    pub fn entry_cost(&self, native: bool, flier: bool) -> u32 {
        match self {
            HexTerrain::Tree => IMPASSABLE_COST,
            HexTerrain::Bog | HexTerrain::Volcano if !native => IMPASSABLE_COST,
            HexTerrain::Bramble | HexTerrain::Drift if !native => SLOW_MOVE_COST,
            HexTerrain::SandDune if !native && !flier => SLOW_MOVE_COST,
            _ => NORMAL_MOVE_COST,
        }
    }
}

/// Obstruction recorded on one edge of a hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Hexside {
    #[default]
    None,
    Cliff,
    Dune,
    Slope,
    Wall,
}

impl Hexside {
    /// Single-letter code used in layout tables
    pub fn code(&self) -> char {
        match self {
            Hexside::None => ' ',
            Hexside::Cliff => 'c',
            Hexside::Dune => 'd',
            Hexside::Slope => 's',
            Hexside::Wall => 'w',
        }
    }

    pub fn is_obstacle(&self) -> bool {
        !matches!(self, Hexside::None)
    }
}

/// Master-board terrain type that selects a battlefield layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BattlelandKind {
    #[default]
    Plains,
    Woods,
    Desert,
    Brush,
    Jungle,
    Marsh,
    Swamp,
    Hills,
    Mountains,
    Tundra,
    Tower,
}

impl BattlelandKind {
    pub fn all() -> [BattlelandKind; 11] {
        [
            BattlelandKind::Plains,
            BattlelandKind::Woods,
            BattlelandKind::Desert,
            BattlelandKind::Brush,
            BattlelandKind::Jungle,
            BattlelandKind::Marsh,
            BattlelandKind::Swamp,
            BattlelandKind::Hills,
            BattlelandKind::Mountains,
            BattlelandKind::Tundra,
            BattlelandKind::Tower,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            BattlelandKind::Plains => "Plains",
            BattlelandKind::Woods => "Woods",
            BattlelandKind::Desert => "Desert",
            BattlelandKind::Brush => "Brush",
            BattlelandKind::Jungle => "Jungle",
            BattlelandKind::Marsh => "Marsh",
            BattlelandKind::Swamp => "Swamp",
            BattlelandKind::Hills => "Hills",
            BattlelandKind::Mountains => "Mountains",
            BattlelandKind::Tundra => "Tundra",
            BattlelandKind::Tower => "Tower",
        }
    }

    /// Case-insensitive lookup by name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }
}
