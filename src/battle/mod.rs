//! Battle system - tactical hex combat between two legions
//!
//! One battle is fought on a fixed 27-hex battleland chosen by the terrain
//! of the contested land. Key pieces:
//! - Static battlelands shared by every battle on the same terrain
//! - Strike resolution with terrain modifiers and carries
//! - A seven-round turn loop with summon and reinforcement windows
//! - Ports for dice, strike decisions and the strategic game outside

pub mod ai;
pub mod archetype;
pub mod battle_map;
pub mod constants;
pub mod decisions;
pub mod dice;
pub mod engagement;
pub mod execution;
pub mod field;
pub mod hex;
pub mod layouts;
pub mod movement;
pub mod outcome;
pub mod resolution;
pub mod terrain;
pub mod units;

// Re-exports for convenient access
pub use ai::{build_strategy, play_battle, BattleAi, Seats, StrategyKind};
pub use archetype::{archetype, catalog, Archetype, Natives, PowerSource};
pub use battle_map::{BattleHex, BattleMap, HexId};
pub use constants::*;
pub use decisions::{
    AlwaysAccept, CarryChoice, CarryPenaltyOffer, DecisionPort, NeverAccept, RecordingDecisions,
};
pub use dice::{ChaChaDice, DiceRoller, ScriptedDice};
pub use engagement::{adjacent_ally_count, contact_count, contacts, is_in_contact};
pub use execution::{
    begin_battle, Battle, BattleEvent, BattleEventLog, BattleEventType, BattlePhase, BattlePorts,
    SummonState,
};
pub use field::Field;
pub use hex::{BattleHexCoord, HexDirection};
pub use movement::{entry_cost, legal_moves};
pub use outcome::{
    BattleResult, EliminationCause, InMemoryStrategy, ScoringAdjustment, StrategicLayer,
    SurvivorState,
};
pub use resolution::{
    apply_carry, find_carries, odds, strike, CarryOutcome, CarryPlan, PendingCarry,
    PenaltyOption, StrikeKind, StrikeOdds, StrikeOutcome,
};
pub use terrain::{BattlelandKind, HexTerrain, Hexside};
pub use units::{CombatUnit, LegionSetup, Side, UnitSetup};
