//! Strike resolution: dice, strike numbers, damage and carries
//!
//! Every modifier is read from the two units' current hexes. Melee strikes
//! cross a single edge, so only one hexside pair is ever consulted.

use serde::{Deserialize, Serialize};

use crate::battle::constants::{
    BASE_STRIKE_NUMBER, LONG_RANGE_PENALTY_RANGE, MAX_STRIKE_NUMBER, MIN_STRIKE_NUMBER,
};
use crate::battle::battle_map::{BattleMap, HexId};
use crate::battle::decisions::{CarryPenaltyOffer, DecisionPort};
use crate::battle::dice::DiceRoller;
use crate::battle::engagement::{contact_count, contact_direction, pair_in_contact};
use crate::battle::field::Field;
use crate::battle::hex::HexDirection;
use crate::battle::terrain::{HexTerrain, Hexside};
use crate::battle::units::CombatUnit;
use crate::core::error::{BattleError, Result};
use crate::core::types::UnitTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrikeKind {
    Melee,
    Rangestrike,
}

/// Dice rolled and the face needed for a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikeOdds {
    pub dice: u32,
    pub strike_number: u32,
}

/// A group of carry candidates reachable only by weakening the strike
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyOption {
    pub dice: u32,
    pub strike_number: u32,
    pub carry_targets: Vec<UnitTag>,
}

/// Carry candidates for a strike on one target
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CarryPlan {
    /// Reachable with no change to the strike
    pub carry_targets: Vec<UnitTag>,
    /// Ordered smallest sacrifice first
    pub penalty_options: Vec<PenaltyOption>,
}

/// Result of one strike
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikeOutcome {
    pub attacker: UnitTag,
    pub target: UnitTag,
    pub kind: StrikeKind,
    pub dice: u32,
    pub strike_number: u32,
    pub rolls: Vec<u8>,
    pub hits: u32,
    /// Damage applied to the target after clamping
    pub damage: u32,
    pub target_killed: bool,
    pub penalties_accepted: Vec<PenaltyOption>,
    /// Excess damage available to carry; zero when no carry is allowed
    pub carry_pool: u32,
    pub carry_targets: Vec<UnitTag>,
}

/// Carry damage waiting to be assigned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCarry {
    pub striker: UnitTag,
    pub pool: u32,
    pub targets: Vec<UnitTag>,
}

impl PendingCarry {
    pub fn from_outcome(outcome: &StrikeOutcome) -> Option<Self> {
        if outcome.carry_pool == 0 || outcome.carry_targets.is_empty() {
            return None;
        }
        Some(Self {
            striker: outcome.attacker,
            pool: outcome.carry_pool,
            targets: outcome.carry_targets.clone(),
        })
    }

    pub fn is_exhausted(&self) -> bool {
        self.pool == 0 || self.targets.is_empty()
    }
}

/// Result of assigning carried damage to one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryOutcome {
    pub striker: UnitTag,
    pub target: UnitTag,
    pub damage: u32,
    pub target_killed: bool,
    pub remaining_pool: u32,
}

/// Melee if the pair touches across a non-cliff edge, else rangestrike
pub fn strike_kind(field: &Field, attacker: &CombatUnit, target: &CombatUnit) -> StrikeKind {
    if pair_in_contact(field, attacker, target) {
        StrikeKind::Melee
    } else {
        StrikeKind::Rangestrike
    }
}

fn volcano_bonus(map: &BattleMap, attacker: &CombatUnit) -> bool {
    attacker.archetype.natives.volcano && map.terrain(attacker.current_hex) == HexTerrain::Volcano
}

/// Number of dice rolled against `target`
pub fn dice_for(field: &Field, attacker: &CombatUnit, target: &CombatUnit) -> u32 {
    let map = &field.map;
    let hex = attacker.current_hex;
    let natives = &attacker.archetype.natives;
    let mut dice = field.effective_power(attacker) as i32;

    match contact_direction(field, attacker, target) {
        None => {
            dice /= 2;
            if volcano_bonus(map, attacker) {
                dice += 2;
            }
        }
        Some(dir) => {
            if volcano_bonus(map, attacker) {
                dice += 2;
            }
            let own = map.hexside(hex, dir);
            if own == Hexside::Dune && natives.sand {
                dice += 2;
            } else if own == Hexside::Slope && natives.slope {
                dice += 1;
            } else if !natives.sand && map.opposite_hexside(hex, dir) == Hexside::Dune {
                dice -= 1;
            }
        }
    }

    dice.max(0) as u32
}

/// Attacker skill after terrain modifiers
pub fn attacker_skill(field: &Field, attacker: &CombatUnit, target: &CombatUnit) -> i32 {
    let map = &field.map;
    let hex = attacker.current_hex;
    let target_hex = target.current_hex;
    let archetype = &attacker.archetype;
    let mut skill = archetype.skill as i32;
    let own_elevation = map.elevation(hex) as i32;
    let target_elevation = map.elevation(target_hex) as i32;

    match contact_direction(field, attacker, target) {
        Some(dir) => {
            if map.terrain(hex) == HexTerrain::Bramble && !archetype.natives.bramble {
                skill -= 1;
            }
            if own_elevation > target_elevation {
                if map.hexside(hex, dir) == Hexside::Wall {
                    skill += 1;
                }
            } else if own_elevation < target_elevation {
                let side = map.opposite_hexside(hex, dir);
                if (side == Hexside::Slope && !archetype.natives.slope) || side == Hexside::Wall {
                    skill -= 1;
                }
            }
        }
        None if !archetype.magic_missile => {
            if map.range_between(hex, target_hex) == LONG_RANGE_PENALTY_RANGE {
                skill -= 1;
            }
            if !archetype.natives.bramble {
                skill -= map.count_bramble_between(hex, target_hex) as i32;
            }
            // The tower puts one wall between each elevation step
            if map.has_wall_on_any_side(target_hex) && target_elevation > own_elevation {
                skill -= target_elevation - own_elevation;
            }
            if map.terrain(target_hex) == HexTerrain::Volcano {
                skill -= 1;
            }
        }
        None => {}
    }

    skill
}

/// Face needed on each die, clamped to 1..=6
pub fn strike_number(field: &Field, attacker: &CombatUnit, target: &CombatUnit) -> u32 {
    let kind = strike_kind(field, attacker, target);
    let mut number =
        BASE_STRIKE_NUMBER - attacker_skill(field, attacker, target) + target.archetype.skill as i32;

    let exempt = kind == StrikeKind::Rangestrike && attacker.archetype.magic_missile;
    if field.map.terrain(target.current_hex) == HexTerrain::Bramble
        && target.archetype.natives.bramble
        && !attacker.archetype.natives.bramble
        && !exempt
    {
        number += 1;
    }

    number.clamp(MIN_STRIKE_NUMBER, MAX_STRIKE_NUMBER) as u32
}

pub fn odds(field: &Field, attacker: &CombatUnit, target: &CombatUnit) -> StrikeOdds {
    StrikeOdds {
        dice: dice_for(field, attacker, target),
        strike_number: strike_number(field, attacker, target),
    }
}

/// Carries need two live enemies in contact and dice beyond the target's health
pub fn carries_possible(field: &Field, attacker: &CombatUnit, target: &CombatUnit) -> bool {
    contact_count(field, attacker, false) >= 2
        && dice_for(field, attacker, target) > field.remaining_health(target)
}

/// Can a carry leave the attacker through this edge?
fn possible_carry_to_dir(map: &BattleMap, hex: HexId, target_hex: HexId, dir: HexDirection) -> bool {
    let Some(neighbor) = map.neighbor(hex, dir) else {
        return false;
    };
    if neighbor == target_hex || map.is_cliff(hex, dir) {
        return false;
    }
    // A strike that is not up a dune cannot carry up a dune
    if map.opposite_hexside(hex, dir) == Hexside::Dune {
        let primary_up_dune = map
            .direction_to(target_hex, hex)
            .map(|back| map.hexside(target_hex, back) == Hexside::Dune)
            .unwrap_or(false);
        if !primary_up_dune {
            return false;
        }
    }
    true
}

/// Find every enemy the excess of a strike on `target` could reach
pub fn find_carries(field: &Field, attacker: &CombatUnit, target: &CombatUnit) -> CarryPlan {
    let mut plan = CarryPlan::default();
    let primary = odds(field, attacker, target);
    let remaining = field.remaining_health(target);
    if primary.dice <= remaining {
        return plan;
    }

    let map = &field.map;
    let hex = attacker.current_hex;
    for dir in HexDirection::all() {
        if !possible_carry_to_dir(map, hex, target.current_hex, dir) {
            continue;
        }
        let Some(victim) = map.neighbor(hex, dir).and_then(|n| field.unit_at(n)) else {
            continue;
        };
        if victim.side == attacker.side || field.is_dead(victim) {
            continue;
        }

        let own = odds(field, attacker, victim);
        let dice = own.dice.min(primary.dice);
        let strike_number = own.strike_number.max(primary.strike_number);
        if dice <= remaining {
            continue;
        }

        if dice == primary.dice && strike_number == primary.strike_number {
            plan.carry_targets.push(victim.tag);
        } else if let Some(option) = plan
            .penalty_options
            .iter_mut()
            .find(|o| o.dice == dice && o.strike_number == strike_number)
        {
            option.carry_targets.push(victim.tag);
        } else {
            plan.penalty_options.push(PenaltyOption {
                dice,
                strike_number,
                carry_targets: vec![victim.tag],
            });
        }
    }

    plan.penalty_options
        .sort_by(|a, b| a.dice.cmp(&b.dice).then(b.strike_number.cmp(&a.strike_number)));
    plan
}

/// Resolve one strike of `attacker` on `target`
///
/// Fails without mutation if the units are on the same side or the target
/// is already dead. Penalty groups are offered to `decisions` in order.
pub fn strike(
    field: &mut Field,
    attacker: UnitTag,
    target: UnitTag,
    dice: &mut dyn DiceRoller,
    decisions: &mut dyn DecisionPort,
) -> Result<StrikeOutcome> {
    let striker = field.require(attacker)?;
    let victim = field.require(target)?;
    if striker.side == victim.side {
        return Err(BattleError::IllegalStrike(format!(
            "{} cannot strike friendly {}",
            attacker, target
        )));
    }
    if field.is_dead(victim) {
        return Err(BattleError::IllegalStrike(format!("{} is already dead", target)));
    }

    let kind = strike_kind(field, striker, victim);
    let mut current = odds(field, striker, victim);
    let mut carry_targets = Vec::new();
    let mut penalties_accepted = Vec::new();

    if carries_possible(field, striker, victim) {
        let plan = find_carries(field, striker, victim);
        carry_targets = plan.carry_targets;
        let side = striker.side;
        let player = field.side(side).player.clone();

        for option in plan.penalty_options {
            if option.dice >= current.dice && option.strike_number <= current.strike_number {
                // Already covered by an earlier accepted penalty
                carry_targets.extend(option.carry_targets.iter().copied());
                continue;
            }
            let offer = CarryPenaltyOffer {
                side,
                player: player.clone(),
                striker: attacker,
                target,
                dice: option.dice.min(current.dice),
                strike_number: option.strike_number.max(current.strike_number),
                carry_targets: option.carry_targets.clone(),
            };
            if decisions.offer_carry_penalty(field, &offer) {
                tracing::debug!(
                    striker = %attacker,
                    dice = offer.dice,
                    strike_number = offer.strike_number,
                    "Strike penalty accepted"
                );
                current = StrikeOdds {
                    dice: offer.dice,
                    strike_number: offer.strike_number,
                };
                carry_targets.extend(option.carry_targets.iter().copied());
                penalties_accepted.push(option);
            }
        }
    }

    let rolls = dice.roll(current.dice);
    let hits = rolls
        .iter()
        .filter(|roll| u32::from(**roll) >= current.strike_number)
        .count() as u32;

    let excess = field.wound(target, hits)?;
    let carry_pool = if carry_targets.is_empty() { 0 } else { excess };
    if carry_pool == 0 {
        carry_targets.clear();
    }
    field.require_mut(attacker)?.struck = true;

    let target_killed = field.is_dead(field.require(target)?);
    tracing::debug!(
        %attacker,
        %target,
        ?kind,
        dice = current.dice,
        strike_number = current.strike_number,
        ?rolls,
        hits,
        carry_pool,
        "Strike resolved"
    );

    Ok(StrikeOutcome {
        attacker,
        target,
        kind,
        dice: current.dice,
        strike_number: current.strike_number,
        rolls,
        hits,
        damage: hits - excess,
        target_killed,
        penalties_accepted,
        carry_pool,
        carry_targets,
    })
}

/// Assign carried damage to one eligible target
///
/// Damage the target cannot absorb stays in the pool for the remaining
/// targets.
pub fn apply_carry(
    field: &mut Field,
    pending: &mut PendingCarry,
    target: UnitTag,
) -> Result<CarryOutcome> {
    if !pending.targets.contains(&target) {
        return Err(BattleError::IllegalStrike(format!(
            "{} is not an eligible carry target",
            target
        )));
    }
    let excess = field.wound(target, pending.pool)?;
    let damage = pending.pool - excess;
    pending.pool = excess;
    pending.targets.retain(|t| *t != target);

    let target_killed = field.is_dead(field.require(target)?);
    tracing::debug!(striker = %pending.striker, %target, damage, "Carry applied");

    Ok(CarryOutcome {
        striker: pending.striker,
        target,
        damage,
        target_killed,
        remaining_pool: pending.pool,
    })
}
