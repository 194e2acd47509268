//! Strategy implementations and the loop that lets them play a battle

use crate::battle::ai::scoring::{expected_hits, nearest_enemy_distance, strike_value};
use crate::battle::ai::{build_strategy, BattleAi, StrategyKind};
use crate::battle::battle_map::HexId;
use crate::battle::decisions::{CarryChoice, CarryPenaltyOffer, DecisionPort};
use crate::battle::execution::{Battle, BattlePhase};
use crate::battle::field::Field;
use crate::battle::outcome::BattleResult;
use crate::battle::resolution::StrikeOdds;
use crate::core::error::{BattleError, Result};
use crate::core::types::{SideRole, UnitTag};

/// Closes in on the nearest enemy and strikes where it hurts most
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyAi;

/// Waits for the enemy to come within reach and never weakens a strike
#[derive(Debug, Clone, Copy, Default)]
pub struct CautiousAi;

impl DecisionPort for GreedyAi {
    /// Worth it only if the weakened strike should still kill a carry target
    fn offer_carry_penalty(&mut self, field: &Field, offer: &CarryPenaltyOffer) -> bool {
        let expected = expected_hits(StrikeOdds {
            dice: offer.dice,
            strike_number: offer.strike_number,
        });
        offer
            .carry_targets
            .iter()
            .filter_map(|tag| field.unit(*tag))
            .any(|unit| field.remaining_health(unit) as f32 <= expected)
    }

    /// The most valuable target the pool can finish, else the weakest
    fn choose_carry_target(&mut self, field: &Field, choice: &CarryChoice) -> UnitTag {
        let units: Vec<_> = choice
            .targets
            .iter()
            .filter_map(|tag| field.unit(*tag))
            .collect();
        let killable = units
            .iter()
            .filter(|unit| field.remaining_health(unit) <= choice.carry_pool)
            .max_by_key(|unit| field.point_value(unit));
        let weakest = units.iter().min_by_key(|unit| field.remaining_health(unit));
        killable
            .or(weakest)
            .map(|unit| unit.tag)
            .unwrap_or(choice.targets[0])
    }
}

impl BattleAi for GreedyAi {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Greedy
    }

    fn choose_move(&mut self, battle: &Battle, unit: UnitTag) -> Option<HexId> {
        let field = battle.field();
        let current = field.unit(unit)?;
        let here = nearest_enemy_distance(field, current.side, current.current_hex);
        let best = battle
            .legal_moves(unit)
            .into_iter()
            .map(|hex| (nearest_enemy_distance(field, current.side, hex), hex))
            .min()?;

        let must_enter = field.map.is_entrance(current.current_hex);
        (must_enter || best.0 < here).then_some(best.1)
    }

    fn choose_strike(&mut self, battle: &Battle, unit: UnitTag) -> Option<UnitTag> {
        let field = battle.field();
        let striker = field.unit(unit)?;
        battle
            .legal_targets(unit)
            .into_iter()
            .filter_map(|tag| field.unit(tag))
            .map(|target| (strike_value(field, striker, target), target.tag))
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, tag)| tag)
    }
}

impl DecisionPort for CautiousAi {
    fn offer_carry_penalty(&mut self, _field: &Field, _offer: &CarryPenaltyOffer) -> bool {
        false
    }

    fn choose_carry_target(&mut self, _field: &Field, choice: &CarryChoice) -> UnitTag {
        choice.targets[0]
    }
}

impl BattleAi for CautiousAi {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Cautious
    }

    fn choose_move(&mut self, battle: &Battle, unit: UnitTag) -> Option<HexId> {
        let field = battle.field();
        let current = field.unit(unit)?;
        let must_enter = field.map.is_entrance(current.current_hex);
        let reach = current.archetype.skill + 1;
        let here = nearest_enemy_distance(field, current.side, current.current_hex);
        if !must_enter && here <= reach {
            return None;
        }

        // Approach, but never step into contact
        let moves = battle.legal_moves(unit);
        let approach = moves
            .iter()
            .map(|hex| (nearest_enemy_distance(field, current.side, *hex), *hex))
            .filter(|(distance, _)| *distance > 1)
            .min();
        match approach {
            Some((distance, hex)) if must_enter || distance < here => Some(hex),
            _ if must_enter => moves.first().copied(),
            _ => None,
        }
    }

    fn choose_strike(&mut self, battle: &Battle, unit: UnitTag) -> Option<UnitTag> {
        battle.legal_targets(unit).first().copied()
    }
}

/// One strategy per side; decision queries go to the striker's seat
pub struct Seats {
    attacker: Box<dyn BattleAi>,
    defender: Box<dyn BattleAi>,
}

impl Seats {
    pub fn new(attacker: StrategyKind, defender: StrategyKind) -> Self {
        Self {
            attacker: build_strategy(attacker),
            defender: build_strategy(defender),
        }
    }

    pub fn kind(&self, role: SideRole) -> StrategyKind {
        match role {
            SideRole::Attacker => self.attacker.kind(),
            SideRole::Defender => self.defender.kind(),
        }
    }

    pub fn seat_mut(&mut self, role: SideRole) -> &mut dyn BattleAi {
        match role {
            SideRole::Attacker => self.attacker.as_mut(),
            SideRole::Defender => self.defender.as_mut(),
        }
    }
}

impl DecisionPort for Seats {
    fn offer_carry_penalty(&mut self, field: &Field, offer: &CarryPenaltyOffer) -> bool {
        self.seat_mut(offer.side).offer_carry_penalty(field, offer)
    }

    fn choose_carry_target(&mut self, field: &Field, choice: &CarryChoice) -> UnitTag {
        self.seat_mut(choice.side).choose_carry_target(field, choice)
    }
}

/// Let `ai` act for the active side, then leave the phase
pub fn play_phase(battle: &mut Battle, ai: &mut dyn BattleAi) -> Result<()> {
    let active = battle.active_side();
    match battle.current_phase() {
        BattlePhase::Summon | BattlePhase::Recruit => {
            if battle.reinforcement_window_open() {
                let player = battle.field().side(active).player.clone();
                let candidates = match battle.current_phase() {
                    BattlePhase::Summon => battle.strategy().summon_candidates(&player),
                    _ => battle.strategy().reinforcement_candidates(&player),
                };
                if let Some(name) = ai.choose_reinforcement(battle, &candidates) {
                    match battle.current_phase() {
                        BattlePhase::Summon => battle.summon_reinforcement(&name)?,
                        _ => battle.muster_reinforcement(&name)?,
                    };
                    return Ok(());
                }
            }
            battle.advance_phase()
        }
        BattlePhase::Move => {
            for tag in battle.field().tags_of(active) {
                if let Some(hex) = ai.choose_move(battle, tag) {
                    battle.declare_move(tag, hex)?;
                }
            }
            battle.advance_phase()
        }
        BattlePhase::Fight | BattlePhase::Strikeback => {
            battle.make_forced_strikes()?;
            loop {
                let mut struck = false;
                for tag in battle.field().tags_of(active) {
                    if let Some(target) = ai.choose_strike(battle, tag) {
                        battle.declare_strike(tag, target)?;
                        battle.resolve_carries()?;
                        struck = true;
                    }
                }
                if !struck {
                    break;
                }
            }
            battle.done_striking()
        }
    }
}

/// Play phases until the battle is decided
pub fn play_battle(battle: &mut Battle, seats: &mut Seats) -> Result<BattleResult> {
    while !battle.is_terminal() {
        let active = battle.active_side();
        play_phase(battle, seats.seat_mut(active))?;
    }
    battle.outcome().cloned().ok_or_else(|| {
        BattleError::InvalidSetup("battle stopped without a result".to_string())
    })
}
