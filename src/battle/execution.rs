//! Battle execution: the round and phase loop
//!
//! Each round: Defender half (Recruit -> Move -> Fight -> Attacker
//! Strikeback), then Attacker half (Summon -> Move -> Fight -> Defender
//! Strikeback). The round counter only moves when the Defender's Strikeback
//! closes the round.
//!
//! Every public operation either succeeds or fails without touching state.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::battle::archetype::Archetype;
use crate::battle::battle_map::{BattleMap, HexId};
use crate::battle::constants::{
    ATTACKER_ENTRY_SIDES, DEFAULT_ATTACKER_ENTRY_SIDE, MAX_LEGION_HEIGHT, MAX_RANGESTRIKE_RANGE,
    MIN_NON_MAGIC_RANGESTRIKE_RANGE, MIN_RANGESTRIKE_RANGE,
};
use crate::battle::decisions::{CarryChoice, DecisionPort};
use crate::battle::dice::DiceRoller;
use crate::battle::engagement::{contacts, is_in_contact};
use crate::battle::field::Field;
use crate::battle::movement;
use crate::battle::outcome::{
    BattleResult, EliminationCause, ScoringAdjustment, StrategicLayer, SurvivorState,
};
use crate::battle::resolution::{apply_carry, strike, CarryOutcome, PendingCarry, StrikeOutcome};
use crate::battle::terrain::{BattlelandKind, HexTerrain};
use crate::battle::units::{CombatUnit, LegionSetup, Side};
use crate::core::config::RulesConfig;
use crate::core::error::{BattleError, Result};
use crate::core::types::{BattleId, SideRole, UnitTag};

/// Battle phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BattlePhase {
    Summon,
    Recruit,
    #[default]
    Move,
    Fight,
    Strikeback,
}

/// Progress toward the attacker's one summon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SummonState {
    #[default]
    NoKills,
    /// A defender died on the board; the next Summon phase may offer a summon
    FirstBlood,
    TooLate,
}

/// Log entry for battle events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleEvent {
    pub round: u32,
    pub phase: BattlePhase,
    pub event_type: BattleEventType,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleEventType {
    BattleStarted { terrain: BattlelandKind },
    PhaseChanged { phase: BattlePhase, active: SideRole },
    UnitMoved { unit: UnitTag, from: HexId, to: HexId },
    MoveUndone { unit: UnitTag },
    Strike(StrikeOutcome),
    Carry(CarryOutcome),
    DriftDamage { unit: UnitTag, damage: u32 },
    UnitDied { unit: UnitTag, side: SideRole, points: u32 },
    /// Left off-board after the first round; goes back where it came from
    UnitReturned { unit: UnitTag, side: SideRole },
    UnitSummoned { unit: UnitTag, creature: String },
    UnitMustered { unit: UnitTag, creature: String },
    Conceded { side: SideRole },
    TimeLoss,
    BattleEnded {
        winner: Option<SideRole>,
        cause: EliminationCause,
    },
}

/// Ordered record of everything that happened in one battle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BattleEventLog {
    pub events: Vec<BattleEvent>,
}

impl BattleEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        round: u32,
        phase: BattlePhase,
        event_type: BattleEventType,
        description: String,
    ) {
        self.events.push(BattleEvent {
            round,
            phase,
            event_type,
            description,
        });
    }
}

/// Everything the engine calls out to
pub struct BattlePorts {
    pub dice: Box<dyn DiceRoller>,
    pub decisions: Box<dyn DecisionPort>,
    pub strategy: Box<dyn StrategicLayer>,
}

impl BattlePorts {
    pub fn new(
        dice: impl DiceRoller + 'static,
        decisions: impl DecisionPort + 'static,
        strategy: impl StrategicLayer + 'static,
    ) -> Self {
        Self {
            dice: Box::new(dice),
            decisions: Box::new(decisions),
            strategy: Box::new(strategy),
        }
    }
}

/// Complete battle state
pub struct Battle {
    id: BattleId,
    field: Field,
    round: u32,
    phase: BattlePhase,
    active: SideRole,
    summon_state: SummonState,
    /// The current Summon or Recruit phase is actionable
    window_open: bool,
    drift_applied: bool,
    conceded: [bool; 2],
    titan_slain: [bool; 2],
    pending_carry: Option<PendingCarry>,
    log: BattleEventLog,
    result: Option<BattleResult>,
    ports: BattlePorts,
}

/// Set up both legions and open round 1 with the Defender moving
///
/// The attacker enters from side 1, 3 or 5 (anything else means 3); the
/// defender enters from the opposite side. Creatures without a hex start on
/// their side's entrance.
pub fn begin_battle(
    rules: RulesConfig,
    terrain: BattlelandKind,
    attacker: &LegionSetup,
    defender: &LegionSetup,
    attacker_entry_side: u8,
    ports: BattlePorts,
) -> Result<Battle> {
    for (role, legion) in [(SideRole::Defender, defender), (SideRole::Attacker, attacker)] {
        if legion.units.is_empty() {
            return Err(BattleError::InvalidSetup(format!("{:?} legion is empty", role)));
        }
        if legion.units.len() > MAX_LEGION_HEIGHT {
            return Err(BattleError::InvalidSetup(format!(
                "{:?} legion has {} creatures",
                role,
                legion.units.len()
            )));
        }
    }
    if attacker.player == defender.player {
        return Err(BattleError::InvalidSetup(format!(
            "{} cannot fight itself",
            attacker.player
        )));
    }

    let entry = if ATTACKER_ENTRY_SIDES.contains(&attacker_entry_side) {
        attacker_entry_side
    } else {
        tracing::warn!(
            "Attacker entry side {} is not allowed, using {}",
            attacker_entry_side,
            DEFAULT_ATTACKER_ENTRY_SIDE
        );
        DEFAULT_ATTACKER_ENTRY_SIDE
    };

    let mut defender_side = Side::new(SideRole::Defender, defender.player.clone(), (entry + 3) % 6);
    defender_side.owner_score = ports.strategy.owner_score(&defender.player);
    let mut attacker_side = Side::new(SideRole::Attacker, attacker.player.clone(), entry);
    attacker_side.owner_score = ports.strategy.owner_score(&attacker.player);

    let mut field = Field::new(BattleMap::shared(terrain), rules, defender_side, attacker_side);
    field.deploy(SideRole::Defender, defender)?;
    field.deploy(SideRole::Attacker, attacker)?;

    let mut seen = AHashSet::new();
    for unit in field.units() {
        if field.is_dead(unit) {
            return Err(BattleError::InvalidSetup(format!(
                "{} {} starts the battle dead",
                unit.name(),
                unit.tag
            )));
        }
        if !field.map.is_entrance(unit.current_hex) && !seen.insert(unit.current_hex) {
            return Err(BattleError::InvalidSetup(format!(
                "two creatures start on {}",
                field.map.label(unit.current_hex)
            )));
        }
    }

    let mut battle = Battle {
        id: BattleId::new(),
        field,
        round: 1,
        phase: BattlePhase::Move,
        active: SideRole::Defender,
        summon_state: SummonState::NoKills,
        window_open: false,
        drift_applied: false,
        conceded: [false; 2],
        titan_slain: [false; 2],
        pending_carry: None,
        log: BattleEventLog::new(),
        result: None,
        ports,
    };

    tracing::info!(
        "Battle {:?} begins in the {}: {} attacks {}",
        battle.id,
        terrain.name(),
        attacker.player,
        defender.player
    );
    battle.record(
        BattleEventType::BattleStarted { terrain },
        format!("{} attacks {} in the {}", attacker.player, defender.player, terrain.name()),
    );
    battle.settle()?;
    Ok(battle)
}

/// Targets `unit` may strike right now, melee before rangestrike
fn strike_targets(field: &Field, unit: &CombatUnit, allow_rangestrike: bool) -> Vec<UnitTag> {
    if is_in_contact(field, unit, true) {
        return contacts(field, unit, false);
    }
    let archetype = &unit.archetype;
    if !allow_rangestrike || !archetype.rangestriker {
        return Vec::new();
    }

    let min_range = if archetype.magic_missile {
        MIN_RANGESTRIKE_RANGE
    } else {
        MIN_NON_MAGIC_RANGESTRIKE_RANGE
    };
    let max_range = archetype.skill.min(MAX_RANGESTRIKE_RANGE);
    let map = &field.map;

    field
        .units_of(unit.side.opponent())
        .filter(|target| !field.is_dead(target))
        .filter(|target| archetype.magic_missile || !target.archetype.lord)
        .filter(|target| {
            let range = map.range_between(unit.current_hex, target.current_hex);
            range >= min_range && range <= max_range
        })
        .filter(|target| {
            map.has_line_of_sight(unit.current_hex, target.current_hex, |hex| {
                field.is_occupied(hex)
            })
        })
        .map(|target| target.tag)
        .collect()
}

impl Battle {
    pub fn id(&self) -> BattleId {
        self.id
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn current_phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn current_round(&self) -> u32 {
        self.round
    }

    pub fn active_side(&self) -> SideRole {
        self.active
    }

    pub fn summon_state(&self) -> SummonState {
        self.summon_state
    }

    pub fn is_terminal(&self) -> bool {
        self.result.is_some()
    }

    /// Final result; only present once the battle is over
    pub fn outcome(&self) -> Option<&BattleResult> {
        self.result.as_ref()
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.log.events
    }

    pub fn strategy(&self) -> &dyn StrategicLayer {
        self.ports.strategy.as_ref()
    }

    /// Carry damage still waiting for a target
    pub fn pending_carry(&self) -> Option<&PendingCarry> {
        self.pending_carry.as_ref()
    }

    /// Whether the current Summon or Recruit phase accepts a new creature
    pub fn reinforcement_window_open(&self) -> bool {
        self.result.is_none()
            && matches!(self.phase, BattlePhase::Summon | BattlePhase::Recruit)
            && self.window_open
    }

    pub fn hex(&self, label: &str) -> Result<HexId> {
        self.field
            .map
            .hex_by_label(label)
            .ok_or_else(|| BattleError::UnknownHex(label.to_string()))
    }

    fn misuse(&self, operation: &'static str) -> BattleError {
        tracing::warn!(
            "Rejected {} during {:?} ({:?} active)",
            operation,
            self.phase,
            self.active
        );
        BattleError::PhaseMisuse {
            operation,
            phase: self.phase,
            active: self.active,
        }
    }

    fn ensure_phase(&self, operation: &'static str, phases: &[BattlePhase]) -> Result<()> {
        if self.result.is_some() || !phases.contains(&self.phase) {
            return Err(self.misuse(operation));
        }
        Ok(())
    }

    fn record(&mut self, event_type: BattleEventType, description: String) {
        self.log.push(self.round, self.phase, event_type, description);
    }

    fn describe(&self, tag: UnitTag) -> String {
        match self.field.unit(tag) {
            Some(unit) => format!("{} {}", unit.name(), tag),
            None => tag.to_string(),
        }
    }

    // === MOVE ===

    /// Hexes a unit of the active side may move to; empty outside Move
    pub fn legal_moves(&self, tag: UnitTag) -> Vec<HexId> {
        if self.result.is_some() || self.phase != BattlePhase::Move {
            return Vec::new();
        }
        match self.field.unit(tag) {
            Some(unit) if unit.side == self.active && !self.field.is_dead(unit) => {
                movement::legal_moves(&self.field, unit)
            }
            _ => Vec::new(),
        }
    }

    /// Move a unit; moving to its own hex just spends its move
    pub fn declare_move(&mut self, tag: UnitTag, to: HexId) -> Result<()> {
        self.ensure_phase("declare_move", &[BattlePhase::Move])?;
        if self.field.map.get_hex(to).is_none() {
            return Err(BattleError::UnknownHex(to.to_string()));
        }
        let unit = self.field.require(tag)?;
        if unit.side != self.active {
            return Err(BattleError::IllegalMove(format!(
                "{} does not belong to the active side",
                tag
            )));
        }
        if self.field.is_dead(unit) {
            return Err(BattleError::IllegalMove(format!("{} is dead", tag)));
        }
        if unit.moved {
            return Err(BattleError::IllegalMove(format!("{} has already moved", tag)));
        }
        let from = unit.current_hex;
        if to != from && !movement::legal_moves(&self.field, unit).contains(&to) {
            return Err(BattleError::IllegalMove(format!(
                "{} cannot reach {}",
                tag,
                self.field.map.label(to)
            )));
        }

        self.field.require_mut(tag)?.move_to(to);
        let description = format!(
            "{} moves from {} to {}",
            self.describe(tag),
            self.field.map.label(from),
            self.field.map.label(to)
        );
        tracing::debug!("{}", description);
        self.record(BattleEventType::UnitMoved { unit: tag, from, to }, description);
        Ok(())
    }

    /// Put a unit back on the hex it started this half-turn on
    pub fn undo_move(&mut self, tag: UnitTag) -> Result<()> {
        self.ensure_phase("undo_move", &[BattlePhase::Move])?;
        let unit = self.field.require(tag)?;
        if unit.side != self.active || !unit.moved {
            return Err(BattleError::IllegalMove(format!("{} has no move to undo", tag)));
        }
        self.field.require_mut(tag)?.undo_move();
        let description = format!("{} returns to its starting hex", self.describe(tag));
        tracing::debug!("{}", description);
        self.record(BattleEventType::MoveUndone { unit: tag }, description);
        Ok(())
    }

    fn any_legal_moves(&self) -> bool {
        self.field.units_of(self.active).any(|unit| {
            !self.field.is_dead(unit) && !movement::legal_moves(&self.field, unit).is_empty()
        })
    }

    /// Kill stragglers still off-board, then fix everyone's position
    fn finish_moves(&mut self) -> Result<()> {
        let stragglers: Vec<UnitTag> = self
            .field
            .units_of(self.active)
            .filter(|unit| self.field.map.is_entrance(unit.current_hex))
            .map(|unit| unit.tag)
            .collect();
        for tag in stragglers {
            tracing::debug!("{} never entered the battlefield", self.describe(tag));
            self.field.kill(tag)?;
        }
        self.remove_dead()?;
        for tag in self.field.tags_of(self.active) {
            self.field.require_mut(tag)?.commit_move();
        }
        Ok(())
    }

    // === FIGHT ===

    /// Enemies a unit of the active side may strike now
    ///
    /// Units killed earlier in the turn still strike until cleanup removes
    /// them. Rangestrikes are only possible in the Fight phase, never as
    /// strikeback.
    pub fn legal_targets(&self, tag: UnitTag) -> Vec<UnitTag> {
        if self.result.is_some()
            || !matches!(self.phase, BattlePhase::Fight | BattlePhase::Strikeback)
        {
            return Vec::new();
        }
        match self.field.unit(tag) {
            Some(unit) if unit.side == self.active && !unit.struck && !self.has_conceded(unit) => {
                strike_targets(&self.field, unit, self.phase == BattlePhase::Fight)
            }
            _ => Vec::new(),
        }
    }

    /// Strike one legal target; any carry becomes pending
    pub fn declare_strike(&mut self, attacker: UnitTag, target: UnitTag) -> Result<StrikeOutcome> {
        self.ensure_phase("declare_strike", &[BattlePhase::Fight, BattlePhase::Strikeback])?;
        let striker = self.field.require(attacker)?;
        let victim = self.field.require(target)?;
        if striker.side == victim.side {
            return Err(BattleError::IllegalStrike(format!(
                "{} cannot strike friendly {}",
                attacker, target
            )));
        }
        if striker.side != self.active {
            return Err(BattleError::IllegalStrike(format!(
                "{} does not belong to the active side",
                attacker
            )));
        }
        if !self.legal_targets(attacker).contains(&target) {
            return Err(BattleError::IllegalStrike(format!(
                "{} cannot strike {}",
                attacker, target
            )));
        }

        self.pending_carry = None;
        let outcome = strike(
            &mut self.field,
            attacker,
            target,
            self.ports.dice.as_mut(),
            self.ports.decisions.as_mut(),
        )?;
        self.pending_carry = PendingCarry::from_outcome(&outcome);

        let description = format!(
            "{} strikes {} with {} dice at {}: {} hits{}",
            self.describe(attacker),
            self.describe(target),
            outcome.dice,
            outcome.strike_number,
            outcome.hits,
            if outcome.target_killed { ", killed" } else { "" }
        );
        self.record(BattleEventType::Strike(outcome.clone()), description);
        Ok(outcome)
    }

    /// Spend the pending carry pool on one eligible target
    pub fn declare_carry(&mut self, target: UnitTag) -> Result<CarryOutcome> {
        self.ensure_phase("declare_carry", &[BattlePhase::Fight, BattlePhase::Strikeback])?;
        let Some(pending) = self.pending_carry.as_mut() else {
            return Err(BattleError::IllegalStrike("no carry is pending".to_string()));
        };
        let outcome = apply_carry(&mut self.field, pending, target)?;
        if pending.is_exhausted() {
            self.pending_carry = None;
        }

        let description = format!(
            "{} carries {} damage to {}",
            self.describe(outcome.striker),
            outcome.damage,
            self.describe(target)
        );
        self.record(BattleEventType::Carry(outcome.clone()), description);
        Ok(outcome)
    }

    /// Assign the whole pending carry, asking the striker's player when
    /// there is a choice
    pub fn resolve_carries(&mut self) -> Result<Vec<CarryOutcome>> {
        let mut outcomes = Vec::new();
        while let Some(pending) = self.pending_carry.as_ref() {
            let target = if let [only] = pending.targets.as_slice() {
                *only
            } else {
                let side = self.field.require(pending.striker)?.side;
                let choice = CarryChoice {
                    side,
                    player: self.field.side(side).player.clone(),
                    striker: pending.striker,
                    carry_pool: pending.pool,
                    targets: pending.targets.clone(),
                };
                let chosen = self.ports.decisions.choose_carry_target(&self.field, &choice);
                if choice.targets.contains(&chosen) {
                    chosen
                } else {
                    choice.targets[0]
                }
            };
            outcomes.push(self.declare_carry(target)?);
        }
        Ok(outcomes)
    }

    /// Strike for every unit that is in contact with exactly one enemy
    ///
    /// Repeats while strikes kill, since a kill can leave another unit with
    /// a single target.
    pub fn make_forced_strikes(&mut self) -> Result<Vec<StrikeOutcome>> {
        self.ensure_phase(
            "make_forced_strikes",
            &[BattlePhase::Fight, BattlePhase::Strikeback],
        )?;
        let mut outcomes = Vec::new();
        loop {
            let mut repeat = false;
            for tag in self.field.tags_of(self.active) {
                let forced = match self.field.unit(tag) {
                    Some(unit) => is_in_contact(&self.field, unit, false),
                    None => false,
                };
                if !forced {
                    continue;
                }
                if let [target] = self.legal_targets(tag).as_slice() {
                    let outcome = self.declare_strike(tag, *target)?;
                    self.resolve_carries()?;
                    repeat |= outcome.target_killed;
                    outcomes.push(outcome);
                }
            }
            if !repeat {
                break;
            }
        }
        Ok(outcomes)
    }

    /// Units of the active side that still owe a strike
    fn strikes_remaining(&self) -> bool {
        self.field.units_of(self.active).any(|unit| {
            !unit.struck && !self.has_conceded(unit) && is_in_contact(&self.field, unit, false)
        })
    }

    fn has_conceded(&self, unit: &CombatUnit) -> bool {
        self.conceded[unit.side.index()]
    }

    fn any_legal_strikes(&self) -> bool {
        self.field
            .tags_of(self.active)
            .into_iter()
            .any(|tag| !self.legal_targets(tag).is_empty())
    }

    /// End the active side's strikes and advance
    pub fn done_striking(&mut self) -> Result<()> {
        self.ensure_phase("done_striking", &[BattlePhase::Fight, BattlePhase::Strikeback])?;
        self.advance_phase()
    }

    fn clear_strikes(&mut self) {
        for tag in self.field.tags_of(self.active) {
            if let Some(unit) = self.field.unit_mut(tag) {
                unit.struck = false;
            }
        }
    }

    fn apply_drift(&mut self) -> Result<()> {
        if self.phase != BattlePhase::Fight || self.drift_applied {
            return Ok(());
        }
        self.drift_applied = true;
        let damage = self.field.rules.drift_damage;
        if damage == 0 {
            return Ok(());
        }
        let victims: Vec<UnitTag> = self
            .field
            .units()
            .filter(|unit| {
                self.field.map.terrain(unit.current_hex) == HexTerrain::Drift
                    && !unit.archetype.natives.drift
                    && !self.field.is_dead(unit)
            })
            .map(|unit| unit.tag)
            .collect();
        for tag in victims {
            self.field.wound(tag, damage)?;
            let description = format!("{} takes {} drift damage", self.describe(tag), damage);
            tracing::debug!("{}", description);
            self.record(BattleEventType::DriftDamage { unit: tag, damage }, description);
        }
        Ok(())
    }

    // === SUMMON / RECRUIT ===

    fn summon_available(&self) -> bool {
        let side = self.field.side(SideRole::Attacker);
        self.summon_state == SummonState::FirstBlood
            && side.len() < MAX_LEGION_HEIGHT
            && !self.ports.strategy.summon_candidates(&side.player).is_empty()
    }

    fn recruit_available(&self) -> bool {
        let side = self.field.side(SideRole::Defender);
        self.round == self.field.rules.reinforcement_round
            && side.len() < MAX_LEGION_HEIGHT
            && !self
                .ports
                .strategy
                .reinforcement_candidates(&side.player)
                .is_empty()
    }

    /// Bring a summonable lord from another of the attacker's legions
    pub fn summon_reinforcement(&mut self, creature: &str) -> Result<UnitTag> {
        self.ensure_phase("summon_reinforcement", &[BattlePhase::Summon])?;
        if !self.window_open {
            return Err(self.misuse("summon_reinforcement"));
        }
        let player = self.field.side(SideRole::Attacker).player.clone();
        let archetype = self
            .ports
            .strategy
            .summon_candidates(&player)
            .into_iter()
            .find(|candidate| candidate.name.eq_ignore_ascii_case(creature))
            .ok_or_else(|| {
                BattleError::InvalidSetup(format!("{} has no {} to summon", player, creature))
            })?;
        let tag = self.bring_in(SideRole::Attacker, archetype)?;
        tracing::info!("{} summons {}", player, self.describe(tag));
        Ok(tag)
    }

    /// Muster the defender's reinforcement
    pub fn muster_reinforcement(&mut self, creature: &str) -> Result<UnitTag> {
        self.ensure_phase("muster_reinforcement", &[BattlePhase::Recruit])?;
        if !self.window_open {
            return Err(self.misuse("muster_reinforcement"));
        }
        let player = self.field.side(SideRole::Defender).player.clone();
        let archetype = self
            .ports
            .strategy
            .reinforcement_candidates(&player)
            .into_iter()
            .find(|candidate| candidate.name.eq_ignore_ascii_case(creature))
            .ok_or_else(|| {
                BattleError::InvalidSetup(format!("{} cannot muster {}", player, creature))
            })?;
        let tag = self.bring_in(SideRole::Defender, archetype)?;
        tracing::info!("{} musters {}", player, self.describe(tag));
        Ok(tag)
    }

    /// Place a new creature on the side's entrance and move on
    fn bring_in(&mut self, role: SideRole, archetype: Arc<Archetype>) -> Result<UnitTag> {
        let hex = self.field.entrance_of(role);
        let tag = self.field.add_unit(role, Arc::clone(&archetype), hex);
        let player = self.field.side(role).player.clone();
        self.ports.strategy.reinforcement_taken(&player, &archetype);

        let creature = archetype.name.clone();
        let description = format!("{} joins {}", creature, player);
        let event_type = match role {
            SideRole::Attacker => BattleEventType::UnitSummoned { unit: tag, creature },
            SideRole::Defender => BattleEventType::UnitMustered { unit: tag, creature },
        };
        self.record(event_type, description);

        self.window_open = false;
        self.step()?;
        self.settle()?;
        Ok(tag)
    }

    // === TURN FLOW ===

    /// Leave the current phase
    ///
    /// Fails while units of the active side are in contact and have not
    /// struck.
    pub fn advance_phase(&mut self) -> Result<()> {
        self.ensure_phase(
            "advance_phase",
            &[
                BattlePhase::Summon,
                BattlePhase::Recruit,
                BattlePhase::Move,
                BattlePhase::Fight,
                BattlePhase::Strikeback,
            ],
        )?;
        if matches!(self.phase, BattlePhase::Fight | BattlePhase::Strikeback)
            && self.strikes_remaining()
        {
            return Err(self.misuse("advance_phase"));
        }
        self.step()?;
        self.settle()
    }

    /// Every unit of `role` dies; play continues until the next cleanup
    pub fn concede(&mut self, role: SideRole) -> Result<()> {
        if self.result.is_some() {
            return Err(self.misuse("concede"));
        }
        self.conceded[role.index()] = true;
        for tag in self.field.tags_of(role) {
            self.field.kill(tag)?;
        }
        let player = self.field.side(role).player.clone();
        tracing::info!("{} concedes the battle", player);
        self.record(
            BattleEventType::Conceded { side: role },
            format!("{} concedes", player),
        );
        if role == self.active {
            self.step()?;
            self.settle()?;
        }
        Ok(())
    }

    fn enter(&mut self, phase: BattlePhase) {
        self.phase = phase;
        tracing::info!(
            "Round {}: {:?} phase for {:?}",
            self.round,
            phase,
            self.active
        );
        self.record(
            BattleEventType::PhaseChanged {
                phase,
                active: self.active,
            },
            format!("{:?} phase for {:?}", phase, self.active),
        );
    }

    /// Nothing for the active side to do in the current phase
    fn is_idle(&self) -> bool {
        match self.phase {
            BattlePhase::Summon | BattlePhase::Recruit => !self.window_open,
            BattlePhase::Move => !self.any_legal_moves(),
            BattlePhase::Fight | BattlePhase::Strikeback => !self.any_legal_strikes(),
        }
    }

    fn settle(&mut self) -> Result<()> {
        while self.result.is_none() && self.is_idle() {
            self.step()?;
        }
        Ok(())
    }

    fn step(&mut self) -> Result<()> {
        self.pending_carry = None;
        match self.phase {
            BattlePhase::Summon | BattlePhase::Recruit => {
                self.window_open = false;
                self.enter(BattlePhase::Move);
            }
            BattlePhase::Move => {
                self.finish_moves()?;
                self.enter(BattlePhase::Fight);
                self.apply_drift()?;
            }
            BattlePhase::Fight => {
                self.clear_strikes();
                self.active = self.active.opponent();
                self.drift_applied = false;
                self.enter(BattlePhase::Strikeback);
            }
            BattlePhase::Strikeback => {
                self.clear_strikes();
                self.remove_dead()?;
                self.check_for_elimination();
                if self.result.is_none() {
                    self.advance_turn();
                }
            }
        }
        Ok(())
    }

    fn advance_turn(&mut self) {
        if self.active == SideRole::Attacker {
            self.enter(BattlePhase::Summon);
            self.window_open = self.summon_available();
            if self.summon_state == SummonState::FirstBlood {
                // Last chance to summon this battle
                self.summon_state = SummonState::TooLate;
            }
        } else {
            self.round += 1;
            if self.round > self.field.rules.max_rounds {
                self.time_loss();
            } else {
                self.enter(BattlePhase::Recruit);
                self.window_open = self.recruit_available();
            }
        }
    }

    // === CLEANUP ===

    fn remove_dead(&mut self) -> Result<()> {
        let dead: Vec<UnitTag> = [SideRole::Defender, SideRole::Attacker]
            .into_iter()
            .flat_map(|role| self.field.units_of(role))
            .filter(|unit| self.field.is_dead(unit))
            .map(|unit| unit.tag)
            .collect();

        for tag in dead {
            let unit = self.field.require(tag)?;
            let side = unit.side;
            let points = self.field.point_value(unit);
            let off_board = self.field.map.is_entrance(unit.current_hex);
            let titan = unit.archetype.is_titan();
            let description = self.describe(tag);
            self.field.remove_unit(tag);

            if off_board && self.round > 1 {
                tracing::debug!("{} returns unused", description);
                self.record(
                    BattleEventType::UnitReturned { unit: tag, side },
                    format!("{} returns unused", description),
                );
            } else {
                self.field.side_mut(side.opponent()).points += points;
                if side == SideRole::Defender
                    && !off_board
                    && self.summon_state == SummonState::NoKills
                {
                    self.summon_state = SummonState::FirstBlood;
                }
                tracing::debug!("{} is dead ({} points)", description, points);
                self.record(
                    BattleEventType::UnitDied {
                        unit: tag,
                        side,
                        points,
                    },
                    format!("{} is dead", description),
                );
            }

            if titan {
                self.titan_slain[side.index()] = true;
            }
        }
        Ok(())
    }

    fn tally(&self, role: SideRole) -> u32 {
        self.field.side(role).points
    }

    fn check_for_elimination(&mut self) {
        use SideRole::{Attacker, Defender};

        let attacker_titan = self.titan_slain[Attacker.index()];
        let defender_titan = self.titan_slain[Defender.index()];
        let attacker_elim = attacker_titan || self.field.side(Attacker).is_empty();
        let defender_elim = defender_titan || self.field.side(Defender).is_empty();

        let both = vec![Defender, Attacker];

        if attacker_titan && defender_titan {
            self.finish(None, both, EliminationCause::TitanSlain, ScoringAdjustment::NoPoints);
        } else if attacker_titan || defender_titan {
            let (loser, winner, winner_elim) = if attacker_titan {
                (Attacker, Defender, defender_elim)
            } else {
                (Defender, Attacker, attacker_elim)
            };
            if winner_elim {
                self.finish(None, both, EliminationCause::TitanSlain, ScoringAdjustment::NoPoints);
            } else {
                self.finish(
                    Some(winner),
                    vec![loser],
                    EliminationCause::TitanSlain,
                    ScoringAdjustment::Standard,
                );
            }
        } else if attacker_elim && defender_elim {
            self.finish(
                None,
                both,
                EliminationCause::MutualElimination,
                ScoringAdjustment::NoPoints,
            );
        } else if attacker_elim || defender_elim {
            let (loser, winner) = if attacker_elim {
                (Attacker, Defender)
            } else {
                (Defender, Attacker)
            };
            let cause = if self.conceded[loser.index()] {
                EliminationCause::Conceded
            } else {
                EliminationCause::SideEliminated
            };
            self.finish(Some(winner), vec![loser], cause, ScoringAdjustment::Standard);
        }
    }

    /// The attacker ran out of rounds and is destroyed; the defender gets
    /// nothing for it
    fn time_loss(&mut self) {
        let attacker_has_titan = self
            .field
            .units_of(SideRole::Attacker)
            .any(|unit| unit.archetype.is_titan() && !self.field.is_dead(unit));
        tracing::info!("Time loss for {}", self.field.side(SideRole::Attacker).player);
        self.record(
            BattleEventType::TimeLoss,
            format!("{} runs out of time", self.field.side(SideRole::Attacker).player),
        );
        let scoring = if attacker_has_titan {
            ScoringAdjustment::TitanSlainByTimeLoss {
                slayer: self.field.side(SideRole::Defender).player.clone(),
            }
        } else {
            ScoringAdjustment::NoPoints
        };
        self.finish(
            Some(SideRole::Defender),
            vec![SideRole::Attacker],
            EliminationCause::TimeLoss,
            scoring,
        );
    }

    fn finish(
        &mut self,
        winner: Option<SideRole>,
        eliminated: Vec<SideRole>,
        cause: EliminationCause,
        scoring: ScoringAdjustment,
    ) {
        let survivors = [SideRole::Defender, SideRole::Attacker]
            .into_iter()
            .filter(|role| !eliminated.contains(role))
            .flat_map(|role| self.field.units_of(role))
            .filter(|unit| !self.field.is_dead(unit))
            .map(|unit| SurvivorState {
                side: unit.side,
                tag: unit.tag,
                creature: unit.name().to_string(),
                hex: self.field.map.label(unit.current_hex).to_string(),
                damage: unit.damage,
            })
            .collect();

        let points_awarded = match (winner, &scoring) {
            (Some(role), ScoringAdjustment::Standard) => self.tally(role),
            _ => 0,
        };

        let result = BattleResult {
            battle_id: self.id,
            winner,
            eliminated,
            cause,
            survivors,
            attacker_points: self.tally(SideRole::Attacker),
            defender_points: self.tally(SideRole::Defender),
            points_awarded,
            final_round: self.round.min(self.field.rules.max_rounds),
            scoring,
        };

        tracing::info!(
            "Battle {:?} over after round {}: {:?} ({:?}), {} points awarded",
            self.id,
            result.final_round,
            winner,
            cause,
            points_awarded
        );
        self.record(
            BattleEventType::BattleEnded { winner, cause },
            format!("Battle ends: {:?}", cause),
        );
        self.ports.strategy.post_outcome(&result);
        self.pending_carry = None;
        self.result = Some(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::archetype::archetype;
    use crate::battle::decisions::AlwaysAccept;
    use crate::battle::dice::ScriptedDice;
    use crate::battle::hex::HexDirection;
    use crate::battle::outcome::InMemoryStrategy;
    use crate::battle::resolution::StrikeKind;
    use crate::battle::units::UnitSetup;
    use crate::core::types::PlayerId;
    use std::cell::Cell;
    use std::rc::Rc;

    fn blue() -> PlayerId {
        PlayerId::new("Blue")
    }

    fn red() -> PlayerId {
        PlayerId::new("Red")
    }

    /// Creatures by name on labelled hexes; an empty label means the entrance
    fn legion(player: PlayerId, units: &[(&str, &str, u32)]) -> LegionSetup {
        units
            .iter()
            .fold(LegionSetup::new(player), |legion, (name, label, damage)| {
                let mut setup = UnitSetup::new(archetype(name).unwrap()).with_damage(*damage);
                if !label.is_empty() {
                    setup = setup.at(*label);
                }
                legion.with(setup)
            })
    }

    fn start_with(
        kind: BattlelandKind,
        defenders: &[(&str, &str, u32)],
        attackers: &[(&str, &str, u32)],
        dice: ScriptedDice,
        strategy: InMemoryStrategy,
    ) -> Battle {
        begin_battle(
            RulesConfig::default(),
            kind,
            &legion(red(), attackers),
            &legion(blue(), defenders),
            3,
            BattlePorts::new(dice, AlwaysAccept, strategy),
        )
        .unwrap()
    }

    fn start(
        defenders: &[(&str, &str, u32)],
        attackers: &[(&str, &str, u32)],
        dice: ScriptedDice,
    ) -> Battle {
        start_with(
            BattlelandKind::Plains,
            defenders,
            attackers,
            dice,
            InMemoryStrategy::new(),
        )
    }

    fn tags(battle: &Battle, role: SideRole) -> Vec<UnitTag> {
        battle.field().tags_of(role)
    }

    struct CountingStrategy {
        posted: Rc<Cell<u32>>,
    }

    impl StrategicLayer for CountingStrategy {
        fn owner_score(&self, _player: &PlayerId) -> u32 {
            0
        }

        fn summon_candidates(&self, _player: &PlayerId) -> Vec<Arc<Archetype>> {
            Vec::new()
        }

        fn reinforcement_candidates(&self, _player: &PlayerId) -> Vec<Arc<Archetype>> {
            Vec::new()
        }

        fn post_outcome(&mut self, _result: &BattleResult) {
            self.posted.set(self.posted.get() + 1);
        }
    }

    #[test]
    fn test_battle_opens_with_defender_moving() {
        let battle = start(&[("Ogre", "A1", 0)], &[("Troll", "", 0)], ScriptedDice::constant(1));
        assert_eq!(battle.current_round(), 1);
        assert_eq!(battle.current_phase(), BattlePhase::Move);
        assert_eq!(battle.active_side(), SideRole::Defender);
        assert!(!battle.is_terminal());
        assert!(battle.outcome().is_none());
        assert!(matches!(
            battle.events()[0].event_type,
            BattleEventType::BattleStarted { .. }
        ));
        let troll = tags(&battle, SideRole::Attacker)[0];
        let map = &battle.field().map;
        assert_eq!(battle.field().unit(troll).unwrap().current_hex, map.entrance(3));
    }

    #[test]
    fn test_bad_setups_are_rejected() {
        let ports = || BattlePorts::new(ScriptedDice::constant(1), AlwaysAccept, InMemoryStrategy::new());
        let empty = begin_battle(
            RulesConfig::default(),
            BattlelandKind::Plains,
            &legion(red(), &[]),
            &legion(blue(), &[("Ogre", "A1", 0)]),
            3,
            ports(),
        );
        assert!(matches!(empty, Err(BattleError::InvalidSetup(_))));

        let stacked = begin_battle(
            RulesConfig::default(),
            BattlelandKind::Plains,
            &legion(red(), &[("Ogre", "C3", 0)]),
            &legion(blue(), &[("Ogre", "C3", 0)]),
            3,
            ports(),
        );
        assert!(matches!(stacked, Err(BattleError::InvalidSetup(_))));

        let lost = begin_battle(
            RulesConfig::default(),
            BattlelandKind::Plains,
            &legion(red(), &[("Ogre", "Z9", 0)]),
            &legion(blue(), &[("Ogre", "C3", 0)]),
            3,
            ports(),
        );
        assert!(matches!(lost, Err(BattleError::UnknownHex(_))));
    }

    #[test]
    fn test_odd_entry_side_falls_back() {
        let battle = begin_battle(
            RulesConfig::default(),
            BattlelandKind::Plains,
            &legion(red(), &[("Ogre", "", 0)]),
            &legion(blue(), &[("Ogre", "", 0)]),
            2,
            BattlePorts::new(ScriptedDice::constant(1), AlwaysAccept, InMemoryStrategy::new()),
        )
        .unwrap();
        assert_eq!(battle.field().side(SideRole::Attacker).entry_side, 3);
        assert_eq!(battle.field().side(SideRole::Defender).entry_side, 0);
    }

    #[test]
    fn test_moves_follow_phase_and_side() {
        let mut battle = start(&[("Ogre", "A1", 0)], &[("Troll", "F4", 0)], ScriptedDice::constant(1));
        let ogre = tags(&battle, SideRole::Defender)[0];
        let troll = tags(&battle, SideRole::Attacker)[0];
        let a2 = battle.hex("A2").unwrap();
        let f3 = battle.hex("F3").unwrap();

        let err = battle.declare_move(troll, f3).unwrap_err();
        assert!(matches!(err, BattleError::IllegalMove(_)));

        let far = battle.hex("F1").unwrap();
        assert!(matches!(battle.declare_move(ogre, far), Err(BattleError::IllegalMove(_))));

        battle.declare_move(ogre, a2).unwrap();
        assert_eq!(battle.field().unit(ogre).unwrap().current_hex, a2);
        assert!(matches!(battle.declare_move(ogre, a2), Err(BattleError::IllegalMove(_))));

        battle.undo_move(ogre).unwrap();
        let unit = battle.field().unit(ogre).unwrap();
        assert_eq!(unit.current_hex, battle.hex("A1").unwrap());
        assert!(!unit.moved);

        let strike = battle.declare_strike(ogre, troll).unwrap_err();
        assert!(matches!(strike, BattleError::PhaseMisuse { operation: "declare_strike", .. }));
    }

    #[test]
    fn test_round_advances_only_after_defender_strikeback() {
        let mut battle = start(&[("Ogre", "A1", 0)], &[("Troll", "F4", 0)], ScriptedDice::constant(1));

        battle.advance_phase().unwrap();
        assert_eq!(battle.current_phase(), BattlePhase::Move);
        assert_eq!(battle.active_side(), SideRole::Attacker);
        assert_eq!(battle.current_round(), 1);

        battle.advance_phase().unwrap();
        assert_eq!(battle.current_phase(), BattlePhase::Move);
        assert_eq!(battle.active_side(), SideRole::Defender);
        assert_eq!(battle.current_round(), 2);
    }

    #[test]
    fn test_time_loss_after_seven_rounds() {
        let mut battle = start(&[("Ogre", "A1", 0)], &[("Troll", "F4", 0)], ScriptedDice::constant(1));
        let mut advances = 0;
        while !battle.is_terminal() {
            battle.advance_phase().unwrap();
            advances += 1;
        }
        assert_eq!(advances, 14);
        assert_eq!(battle.current_round(), 8);

        let result = battle.outcome().unwrap();
        assert_eq!(result.cause, EliminationCause::TimeLoss);
        assert_eq!(result.winner, Some(SideRole::Defender));
        assert_eq!(result.eliminated, vec![SideRole::Attacker]);
        assert_eq!(result.scoring, ScoringAdjustment::NoPoints);
        assert_eq!(result.points_awarded, 0);
        assert_eq!(result.final_round, 7);
        assert!(result.survivors.iter().all(|s| s.side == SideRole::Defender));

        let err = battle.advance_phase().unwrap_err();
        assert!(matches!(err, BattleError::PhaseMisuse { .. }));
    }

    #[test]
    fn test_time_loss_with_titan_names_slayer() {
        let mut battle = start(&[("Ogre", "A1", 0)], &[("Titan", "F4", 0)], ScriptedDice::constant(1));
        while !battle.is_terminal() {
            battle.advance_phase().unwrap();
        }
        assert_eq!(
            battle.outcome().unwrap().scoring,
            ScoringAdjustment::TitanSlainByTimeLoss { slayer: blue() }
        );
    }

    #[test]
    fn test_contact_skips_move_and_forces_strikes() {
        let mut battle = start(
            &[("Ogre", "D4", 0)],
            &[("Troll", "D5", 0)],
            ScriptedDice::constant(1),
        );
        // The ogre is pinned, so the defender goes straight to Fight
        assert_eq!(battle.current_phase(), BattlePhase::Fight);
        let err = battle.done_striking().unwrap_err();
        assert!(matches!(err, BattleError::PhaseMisuse { .. }));

        let strikes = battle.make_forced_strikes().unwrap();
        assert_eq!(strikes.len(), 1);
        assert_eq!(strikes[0].hits, 0);

        battle.done_striking().unwrap();
        assert_eq!(battle.current_phase(), BattlePhase::Strikeback);
        assert_eq!(battle.active_side(), SideRole::Attacker);
    }

    #[test]
    fn test_killed_unit_still_strikes_back() {
        let mut battle = start(
            &[("Ogre", "D4", 0)],
            &[("Troll", "D5", 7)],
            ScriptedDice::constant(6),
        );
        let ogre = tags(&battle, SideRole::Defender)[0];
        let troll = tags(&battle, SideRole::Attacker)[0];
        assert_eq!(battle.current_phase(), BattlePhase::Fight);

        let strikes = battle.make_forced_strikes().unwrap();
        assert_eq!(strikes.len(), 1);
        assert!(strikes[0].target_killed);
        battle.done_striking().unwrap();

        // The dead troll stays on the field until cleanup and gets its strike
        assert!(!battle.is_terminal());
        assert_eq!(battle.current_phase(), BattlePhase::Strikeback);
        assert_eq!(battle.active_side(), SideRole::Attacker);
        assert_eq!(battle.legal_targets(troll), vec![ogre]);
        assert!(matches!(
            battle.advance_phase(),
            Err(BattleError::PhaseMisuse { .. })
        ));

        let strikes = battle.make_forced_strikes().unwrap();
        assert_eq!(strikes.len(), 1);
        assert_eq!(strikes[0].attacker, troll);
        assert!(strikes[0].target_killed);
        assert_eq!(battle.field().unit(ogre).unwrap().damage, 6);
        battle.done_striking().unwrap();

        let result = battle.outcome().unwrap();
        assert_eq!(result.cause, EliminationCause::MutualElimination);
        assert_eq!(result.winner, None);
        assert!(result.survivors.is_empty());
    }

    #[test]
    fn test_conceded_units_do_not_strike_back() {
        let mut battle = start(
            &[("Ogre", "D4", 0)],
            &[("Troll", "D5", 0)],
            ScriptedDice::constant(6),
        );
        let ogre = tags(&battle, SideRole::Defender)[0];
        let troll = tags(&battle, SideRole::Attacker)[0];
        battle.concede(SideRole::Attacker).unwrap();
        assert!(battle.legal_targets(ogre).is_empty());
        battle.done_striking().unwrap();

        assert!(battle.legal_targets(troll).is_empty());
        let result = battle.outcome().unwrap();
        assert_eq!(result.cause, EliminationCause::Conceded);
        assert_eq!(result.winner, Some(SideRole::Defender));
        assert_eq!(result.survivors.len(), 1);
        assert_eq!(result.survivors[0].damage, 0);
    }

    #[test]
    fn test_kill_scores_and_ends_battle() {
        let posted = Rc::new(Cell::new(0));
        let dice = ScriptedDice::new([1; 6]).with_fallback(6);
        let mut battle = begin_battle(
            RulesConfig::default(),
            BattlelandKind::Plains,
            &legion(red(), &[("Troll", "D5", 0)]),
            &legion(blue(), &[("Ogre", "D4", 5)]),
            3,
            BattlePorts::new(dice, AlwaysAccept, CountingStrategy { posted: Rc::clone(&posted) }),
        )
        .unwrap();

        battle.make_forced_strikes().unwrap();
        battle.done_striking().unwrap();
        let outcome = battle.make_forced_strikes().unwrap();
        assert!(outcome[0].target_killed);
        battle.done_striking().unwrap();

        let result = battle.outcome().unwrap();
        assert_eq!(result.winner, Some(SideRole::Attacker));
        assert_eq!(result.cause, EliminationCause::SideEliminated);
        assert_eq!(result.attacker_points, 12);
        assert_eq!(result.points_awarded, 12);
        assert_eq!(result.final_round, 1);
        assert_eq!(result.survivors.len(), 1);
        assert_eq!(result.survivors[0].creature, "Troll");
        assert_eq!(posted.get(), 1);
    }

    #[test]
    fn test_titan_death_ends_battle_for_its_side() {
        let dice = ScriptedDice::new([1; 4]).with_fallback(6);
        let mut battle = start(
            &[("Titan", "D4", 5), ("Ogre", "A1", 0)],
            &[("Troll", "D5", 0)],
            dice,
        );
        // The ogre can still move, so the defender's Move phase waits
        assert_eq!(battle.current_phase(), BattlePhase::Move);
        battle.advance_phase().unwrap();
        assert_eq!(battle.current_phase(), BattlePhase::Fight);
        battle.make_forced_strikes().unwrap();
        battle.done_striking().unwrap();
        battle.make_forced_strikes().unwrap();
        battle.done_striking().unwrap();

        let result = battle.outcome().unwrap();
        assert_eq!(result.cause, EliminationCause::TitanSlain);
        assert_eq!(result.winner, Some(SideRole::Attacker));
        assert_eq!(result.eliminated, vec![SideRole::Defender]);
        assert!(result.survivors.iter().all(|s| s.creature != "Ogre"));
        assert_eq!(result.points_awarded, 24);
    }

    #[test]
    fn test_concession_by_waiting_side() {
        let mut battle = start(&[("Ogre", "A1", 0)], &[("Troll", "F4", 0)], ScriptedDice::constant(1));
        battle.concede(SideRole::Attacker).unwrap();
        assert!(!battle.is_terminal());
        battle.advance_phase().unwrap();

        let result = battle.outcome().unwrap();
        assert_eq!(result.cause, EliminationCause::Conceded);
        assert_eq!(result.winner, Some(SideRole::Defender));
        assert_eq!(result.defender_points, 16);
    }

    #[test]
    fn test_concession_by_active_side_advances() {
        let mut battle = start(&[("Ogre", "A1", 0)], &[("Troll", "F4", 0)], ScriptedDice::constant(1));
        battle.concede(SideRole::Defender).unwrap();
        let result = battle.outcome().unwrap();
        assert_eq!(result.winner, Some(SideRole::Attacker));
        assert_eq!(result.cause, EliminationCause::Conceded);
    }

    #[test]
    fn test_drift_hurts_non_natives_once_per_fight() {
        let mut battle = start_with(
            BattlelandKind::Tundra,
            &[("Ogre", "A1", 0), ("Warbear", "B2", 0)],
            &[("Troll", "F4", 0)],
            ScriptedDice::constant(1),
            InMemoryStrategy::new(),
        );
        let defenders = tags(&battle, SideRole::Defender);
        battle.advance_phase().unwrap();

        assert_eq!(battle.field().unit(defenders[0]).unwrap().damage, 1);
        assert_eq!(battle.field().unit(defenders[1]).unwrap().damage, 0);
        let drift_events = battle
            .events()
            .iter()
            .filter(|e| matches!(e.event_type, BattleEventType::DriftDamage { .. }))
            .count();
        assert_eq!(drift_events, 1);
    }

    #[test]
    fn test_first_blood_opens_single_summon() {
        let angel = archetype("Angel").unwrap();
        let strategy = InMemoryStrategy::new()
            .with_summonable(&red(), Arc::clone(&angel))
            .with_summonable(&red(), angel);
        let dice = ScriptedDice::new([1; 6]).with_fallback(6);
        let mut battle = start_with(
            BattlelandKind::Plains,
            &[("Ogre", "D4", 5), ("Centaur", "A1", 0)],
            &[("Troll", "D5", 0)],
            dice,
            strategy,
        );

        battle.advance_phase().unwrap();
        battle.make_forced_strikes().unwrap();
        battle.done_striking().unwrap();
        battle.make_forced_strikes().unwrap();
        battle.done_striking().unwrap();

        assert_eq!(battle.current_phase(), BattlePhase::Summon);
        assert!(battle.reinforcement_window_open());
        assert_eq!(battle.summon_state(), SummonState::TooLate);
        assert!(matches!(
            battle.summon_reinforcement("Dragon"),
            Err(BattleError::InvalidSetup(_))
        ));

        let summoned = battle.summon_reinforcement("Angel").unwrap();
        assert_eq!(battle.current_phase(), BattlePhase::Move);
        assert_eq!(battle.active_side(), SideRole::Attacker);
        let unit = battle.field().unit(summoned).unwrap();
        assert_eq!(unit.current_hex, battle.field().entrance_of(SideRole::Attacker));
        assert_eq!(battle.field().side(SideRole::Attacker).len(), 2);

        let err = battle.summon_reinforcement("Angel").unwrap_err();
        assert!(matches!(err, BattleError::PhaseMisuse { .. }));
    }

    #[test]
    fn test_recruit_window_in_round_four_only() {
        let strategy =
            InMemoryStrategy::new().with_reinforcement(&blue(), archetype("Centaur").unwrap());
        let mut battle = start_with(
            BattlelandKind::Plains,
            &[("Ogre", "A1", 0)],
            &[("Troll", "F4", 0)],
            ScriptedDice::constant(1),
            strategy,
        );
        while battle.current_phase() != BattlePhase::Recruit {
            assert!(battle.current_round() < 4);
            battle.advance_phase().unwrap();
        }
        assert_eq!(battle.current_round(), 4);
        assert_eq!(battle.active_side(), SideRole::Defender);

        let centaur = battle.muster_reinforcement("Centaur").unwrap();
        assert_eq!(battle.current_phase(), BattlePhase::Move);

        // Left on the entrance after round 1, it goes back without points
        battle.advance_phase().unwrap();
        assert!(battle.field().unit(centaur).is_none());
        assert_eq!(battle.field().side(SideRole::Attacker).points, 0);
        let returned = BattleEventType::UnitReturned {
            unit: centaur,
            side: SideRole::Defender,
        };
        assert!(battle.events().iter().any(|e| e.event_type == returned));
    }

    #[test]
    fn test_stragglers_die_on_round_one() {
        let mut battle = start(
            &[("Ogre", "A1", 0), ("Centaur", "", 0)],
            &[("Troll", "F4", 0)],
            ScriptedDice::constant(1),
        );
        battle.advance_phase().unwrap();
        assert_eq!(battle.field().side(SideRole::Defender).len(), 1);
        assert_eq!(battle.field().side(SideRole::Attacker).points, 12);
        assert_eq!(battle.summon_state(), SummonState::NoKills);
    }

    #[test]
    fn test_rangestrike_targets() {
        let mut battle = start(
            &[("Ogre", "D4", 0), ("Titan", "B1", 0)],
            &[("Ranger", "D1", 0)],
            ScriptedDice::constant(1),
        );
        let ranger = tags(&battle, SideRole::Attacker)[0];
        let ogre = tags(&battle, SideRole::Defender)[0];
        // Defender Move, then attacker Move, then attacker Fight
        battle.advance_phase().unwrap();
        assert_eq!(battle.active_side(), SideRole::Attacker);
        battle.advance_phase().unwrap();
        assert_eq!(battle.current_phase(), BattlePhase::Fight);

        // Lords are immune to ordinary rangestrikes
        assert_eq!(battle.legal_targets(ranger), vec![ogre]);
        let outcome = battle.declare_strike(ranger, ogre).unwrap();
        assert_eq!(outcome.dice, 2);
        assert!(battle.legal_targets(ranger).is_empty());
    }

    #[test]
    fn test_rangestrike_over_one_empty_hex() {
        let mut battle = start(
            &[("Ogre", "D3", 0)],
            &[("Ranger", "D1", 0)],
            ScriptedDice::constant(6),
        );
        let ranger = tags(&battle, SideRole::Attacker)[0];
        let ogre = tags(&battle, SideRole::Defender)[0];
        let map = &battle.field().map;
        let range = map.range_between(
            battle.field().unit(ranger).unwrap().current_hex,
            battle.field().unit(ogre).unwrap().current_hex,
        );
        assert_eq!(range, 2);

        battle.advance_phase().unwrap();
        battle.advance_phase().unwrap();
        assert_eq!(battle.current_phase(), BattlePhase::Fight);
        assert_eq!(battle.active_side(), SideRole::Attacker);
        assert_eq!(battle.legal_targets(ranger), vec![ogre]);

        let outcome = battle.declare_strike(ranger, ogre).unwrap();
        assert_eq!(outcome.dice, 2);
        assert_eq!(outcome.hits, 2);
    }

    #[test]
    fn test_magic_missile_across_a_cliff() {
        // Desert B2 and B1 touch only across a cliff
        let mut battle = start_with(
            BattlelandKind::Desert,
            &[("Ogre", "B2", 0)],
            &[("Warlock", "B1", 0)],
            ScriptedDice::constant(6),
            InMemoryStrategy::new(),
        );
        let warlock = tags(&battle, SideRole::Attacker)[0];
        let ogre = tags(&battle, SideRole::Defender)[0];
        battle.advance_phase().unwrap();
        battle.advance_phase().unwrap();
        assert_eq!(battle.current_phase(), BattlePhase::Fight);
        assert_eq!(battle.legal_targets(warlock), vec![ogre]);

        let outcome = battle.declare_strike(warlock, ogre).unwrap();
        assert_eq!(outcome.kind, StrikeKind::Rangestrike);
        assert_eq!(outcome.dice, 2);
    }

    #[test]
    fn test_illegal_strike_leaves_state_alone() {
        let mut battle = start(
            &[("Ogre", "D4", 0), ("Centaur", "A1", 0)],
            &[("Troll", "D5", 0)],
            ScriptedDice::constant(6),
        );
        let defenders = tags(&battle, SideRole::Defender);
        let troll = tags(&battle, SideRole::Attacker)[0];
        battle.advance_phase().unwrap();

        let err = battle.declare_strike(defenders[1], troll).unwrap_err();
        assert!(matches!(err, BattleError::IllegalStrike(_)));
        let err = battle.declare_strike(defenders[0], defenders[1]).unwrap_err();
        assert!(matches!(err, BattleError::IllegalStrike(_)));
        assert_eq!(battle.field().unit(troll).unwrap().damage, 0);
        assert!(!battle.field().unit(defenders[0]).unwrap().struck);
    }

    #[test]
    fn test_carry_pool_resolves_to_the_only_target() {
        let map = BattleMap::shared(BattlelandKind::Plains);
        let d4 = map.hex_by_label("D4").unwrap();
        let north = map.label(map.neighbor(d4, HexDirection::North).unwrap()).to_string();
        let south = map.label(map.neighbor(d4, HexDirection::South).unwrap()).to_string();

        let mut battle = start(
            &[("Cyclops", "D4", 0)],
            &[("Ogre", north.as_str(), 4), ("Ogre", south.as_str(), 0)],
            ScriptedDice::constant(6),
        );
        let cyclops = tags(&battle, SideRole::Defender)[0];
        let ogres = tags(&battle, SideRole::Attacker);

        let outcome = battle.declare_strike(cyclops, ogres[0]).unwrap();
        assert_eq!(outcome.damage, 2);
        assert_eq!(outcome.carry_pool, 7);
        assert_eq!(battle.pending_carry().unwrap().targets, vec![ogres[1]]);

        let carries = battle.resolve_carries().unwrap();
        assert_eq!(carries.len(), 1);
        assert_eq!(carries[0].damage, 6);
        assert!(carries[0].target_killed);
        assert!(battle.pending_carry().is_none());
        assert!(matches!(battle.declare_carry(ogres[1]), Err(BattleError::IllegalStrike(_))));
    }
}
