//! Battle results and the strategic layer they are reported to
//!
//! The engine never touches the master board. It asks the strategic layer
//! for owner scores and reinforcement availability, and posts one result
//! when the battle ends.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::battle::archetype::Archetype;
use crate::core::types::{BattleId, PlayerId, SideRole, UnitTag};

/// Why the battle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EliminationCause {
    /// One side has no units left
    SideEliminated,
    /// Both sides emptied in the same cleanup
    MutualElimination,
    /// A titan died, taking its whole side with it
    TitanSlain,
    /// The attacker ran out of rounds
    TimeLoss,
    Conceded,
}

/// Scoring instructions for the strategic layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoringAdjustment {
    /// The winner's battle tally is awarded as usual
    Standard,
    /// Nobody scores for this battle
    NoPoints,
    /// The attacker's titan was lost to time; its owner is out of the game
    /// and the slayer collects half points for the owner's other legions
    TitanSlainByTimeLoss { slayer: PlayerId },
}

/// A unit still standing when the battle ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurvivorState {
    pub side: SideRole,
    pub tag: UnitTag,
    pub creature: String,
    pub hex: String,
    pub damage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleResult {
    pub battle_id: BattleId,
    pub winner: Option<SideRole>,
    pub eliminated: Vec<SideRole>,
    pub cause: EliminationCause,
    pub survivors: Vec<SurvivorState>,
    pub attacker_points: u32,
    pub defender_points: u32,
    /// Points the winner takes home
    pub points_awarded: u32,
    pub final_round: u32,
    pub scoring: ScoringAdjustment,
}

impl BattleResult {
    pub fn points_of(&self, role: SideRole) -> u32 {
        match role {
            SideRole::Attacker => self.attacker_points,
            SideRole::Defender => self.defender_points,
        }
    }
}

/// The master-board game as seen from inside a battle
pub trait StrategicLayer {
    /// Score used to size the player's titan
    fn owner_score(&self, player: &PlayerId) -> u32;

    /// Creatures another legion of this player could lend as a summon
    fn summon_candidates(&self, player: &PlayerId) -> Vec<Arc<Archetype>>;

    /// Creatures this player's legion could muster as a reinforcement
    fn reinforcement_candidates(&self, player: &PlayerId) -> Vec<Arc<Archetype>>;

    /// Called when a summon or reinforcement actually joins the battle
    fn reinforcement_taken(&mut self, _player: &PlayerId, _archetype: &Archetype) {}

    fn post_outcome(&mut self, result: &BattleResult);
}

/// Strategic layer backed by plain tables
#[derive(Debug, Clone, Default)]
pub struct InMemoryStrategy {
    pub scores: AHashMap<PlayerId, u32>,
    pub summonable: AHashMap<PlayerId, Vec<Arc<Archetype>>>,
    pub reinforcements: AHashMap<PlayerId, Vec<Arc<Archetype>>>,
    pub taken: Vec<(PlayerId, String)>,
    pub outcomes: Vec<BattleResult>,
}

impl InMemoryStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_score(mut self, player: &PlayerId, score: u32) -> Self {
        self.scores.insert(player.clone(), score);
        self
    }

    pub fn with_summonable(mut self, player: &PlayerId, archetype: Arc<Archetype>) -> Self {
        self.summonable.entry(player.clone()).or_default().push(archetype);
        self
    }

    pub fn with_reinforcement(mut self, player: &PlayerId, archetype: Arc<Archetype>) -> Self {
        self.reinforcements
            .entry(player.clone())
            .or_default()
            .push(archetype);
        self
    }
}

impl StrategicLayer for InMemoryStrategy {
    fn owner_score(&self, player: &PlayerId) -> u32 {
        self.scores.get(player).copied().unwrap_or(0)
    }

    fn summon_candidates(&self, player: &PlayerId) -> Vec<Arc<Archetype>> {
        self.summonable.get(player).cloned().unwrap_or_default()
    }

    fn reinforcement_candidates(&self, player: &PlayerId) -> Vec<Arc<Archetype>> {
        self.reinforcements.get(player).cloned().unwrap_or_default()
    }

    fn reinforcement_taken(&mut self, player: &PlayerId, archetype: &Archetype) {
        self.taken.push((player.clone(), archetype.name.clone()));
        let pool = self
            .summonable
            .get_mut(player)
            .into_iter()
            .chain(self.reinforcements.get_mut(player));
        for candidates in pool {
            if let Some(pos) = candidates.iter().position(|a| a.name == archetype.name) {
                candidates.remove(pos);
                break;
            }
        }
    }

    fn post_outcome(&mut self, result: &BattleResult) {
        self.outcomes.push(result.clone());
    }
}
