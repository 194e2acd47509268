//! Computer players for battles
//!
//! Architecture: closed set of strategies behind one trait
//! - BattleAi extends DecisionPort with move, strike and reinforcement choices
//! - StrategyKind picks the strategy from configuration
//! - Seats routes each side's decisions to its own strategy

mod commander;
pub mod scoring;

pub use commander::{play_battle, play_phase, CautiousAi, GreedyAi, Seats};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::battle::archetype::Archetype;
use crate::battle::battle_map::HexId;
use crate::battle::decisions::DecisionPort;
use crate::battle::execution::Battle;
use crate::core::types::UnitTag;

/// Strategies selectable from config or the command line
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum StrategyKind {
    /// Close in, strike for the most damage, take penalties that can kill
    #[default]
    Greedy,
    /// Keep distance, never take penalties
    Cautious,
}

/// Trait for battle AI implementations
pub trait BattleAi: DecisionPort {
    fn kind(&self) -> StrategyKind;

    /// Where `unit` should move, or None to stay put
    fn choose_move(&mut self, battle: &Battle, unit: UnitTag) -> Option<HexId>;

    /// Which legal target `unit` should strike, or None to hold
    fn choose_strike(&mut self, battle: &Battle, unit: UnitTag) -> Option<UnitTag>;

    /// Creature to bring in when a summon or reinforcement is offered
    ///
    /// Defaults to the candidate worth the most points.
    fn choose_reinforcement(
        &mut self,
        battle: &Battle,
        candidates: &[Arc<Archetype>],
    ) -> Option<String> {
        let rules = &battle.field().rules;
        candidates
            .iter()
            .max_by_key(|candidate| candidate.point_value(0, rules))
            .map(|candidate| candidate.name.clone())
    }
}

pub fn build_strategy(kind: StrategyKind) -> Box<dyn BattleAi> {
    match kind {
        StrategyKind::Greedy => Box::new(GreedyAi),
        StrategyKind::Cautious => Box::new(CautiousAi),
    }
}
