//! Engine configuration with documented constants
//!
//! Rule numbers that vary between game variants are collected here. The
//! defaults reproduce the standard seven-round battle.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::battle::ai::StrategyKind;
use crate::battle::constants::{
    DEFAULT_ATTACKER_ENTRY_SIDE, DEFAULT_DRIFT_DAMAGE, DEFAULT_MAX_ROUNDS, DEFAULT_REINFORCEMENT_ROUND,
    DEFAULT_TITAN_BASE_POWER, DEFAULT_TITAN_IMPROVEMENT,
};
use crate::battle::terrain::BattlelandKind;
use crate::core::error::Result;

/// Rules that shape the battle turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    // === TURN STRUCTURE ===
    /// Last round that is played; the attacker loses on time after it
    pub max_rounds: u32,

    /// Round in which the defender may muster one reinforcement
    pub reinforcement_round: u32,

    // === TITAN SCALING ===
    /// Power of a titan whose owner has no score
    pub titan_base_power: u32,

    /// Score needed for each extra point of titan power
    ///
    /// At 100, a player with 250 points fields a power-8 titan.
    pub titan_improvement: u32,

    // === HAZARDS ===
    /// Damage dealt once per fight phase to non-natives standing in drift
    pub drift_damage: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            reinforcement_round: DEFAULT_REINFORCEMENT_ROUND,
            titan_base_power: DEFAULT_TITAN_BASE_POWER,
            titan_improvement: DEFAULT_TITAN_IMPROVEMENT,
            drift_damage: DEFAULT_DRIFT_DAMAGE,
        }
    }
}

/// Settings for headless AI-vs-AI battles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub terrain: BattlelandKind,
    /// Entrance used by the attacker (1, 3 or 5); the defender enters opposite
    pub attacker_entry_side: u8,
    pub seed: Option<u64>,
    pub attacker_strategy: StrategyKind,
    pub defender_strategy: StrategyKind,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            terrain: BattlelandKind::Plains,
            attacker_entry_side: DEFAULT_ATTACKER_ENTRY_SIDE,
            seed: None,
            attacker_strategy: StrategyKind::Greedy,
            defender_strategy: StrategyKind::Greedy,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub rules: RulesConfig,
    pub runner: RunnerConfig,
}

impl EngineConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

/// Load engine configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> Result<EngineConfig> {
    let contents = fs::read_to_string(path.as_ref())?;
    EngineConfig::from_toml_str(&contents)
}
