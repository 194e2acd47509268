//! The battlefield state: shared map, unit arena and both sides
//!
//! Unit tags index the arena directly. A removed unit leaves an empty slot so
//! tags are never reused within one battle.

use std::sync::Arc;

use crate::battle::archetype::Archetype;
use crate::battle::battle_map::{BattleMap, HexId};
use crate::battle::units::{CombatUnit, LegionSetup, Side};
use crate::core::config::RulesConfig;
use crate::core::error::{BattleError, Result};
use crate::core::types::{SideRole, TagAllocator, UnitTag};

#[derive(Debug, Clone)]
pub struct Field {
    pub map: Arc<BattleMap>,
    pub rules: RulesConfig,
    units: Vec<Option<CombatUnit>>,
    sides: [Side; 2],
    tags: TagAllocator,
}

impl Field {
    pub fn new(map: Arc<BattleMap>, rules: RulesConfig, defender: Side, attacker: Side) -> Self {
        Self {
            map,
            rules,
            units: Vec::new(),
            sides: [defender, attacker],
            tags: TagAllocator::new(),
        }
    }

    /// Place every creature of a legion on the field
    pub fn deploy(&mut self, role: SideRole, legion: &LegionSetup) -> Result<Vec<UnitTag>> {
        let mut placements = Vec::with_capacity(legion.units.len());
        for setup in &legion.units {
            let hex = match &setup.hex {
                Some(label) => self
                    .map
                    .hex_by_label(label)
                    .ok_or_else(|| BattleError::UnknownHex(label.clone()))?,
                None => self.entrance_of(role),
            };
            placements.push((setup, hex));
        }

        let mut tags = Vec::with_capacity(placements.len());
        for (setup, hex) in placements {
            let tag = self.add_unit(role, Arc::clone(&setup.archetype), hex);
            if let Some(unit) = self.unit_mut(tag) {
                unit.damage = setup.damage;
            }
            tags.push(tag);
        }
        Ok(tags)
    }

    /// Add one unit to a side at a hex
    pub fn add_unit(&mut self, role: SideRole, archetype: Arc<Archetype>, hex: HexId) -> UnitTag {
        let tag = self.tags.allocate();
        let unit = CombatUnit::new(tag, archetype, role, hex);
        debug_assert_eq!(tag.0 as usize, self.units.len());
        self.units.push(Some(unit));
        self.sides[role.index()].units.push(tag);
        tag
    }

    /// Drop a unit from its side and the arena
    pub fn remove_unit(&mut self, tag: UnitTag) -> Option<CombatUnit> {
        let unit = self.units.get_mut(tag.0 as usize)?.take()?;
        self.sides[unit.side.index()].units.retain(|t| *t != tag);
        Some(unit)
    }

    pub fn unit(&self, tag: UnitTag) -> Option<&CombatUnit> {
        self.units.get(tag.0 as usize).and_then(|slot| slot.as_ref())
    }

    pub fn unit_mut(&mut self, tag: UnitTag) -> Option<&mut CombatUnit> {
        self.units.get_mut(tag.0 as usize).and_then(|slot| slot.as_mut())
    }

    pub fn require(&self, tag: UnitTag) -> Result<&CombatUnit> {
        self.unit(tag).ok_or(BattleError::UnknownUnit(tag))
    }

    pub fn require_mut(&mut self, tag: UnitTag) -> Result<&mut CombatUnit> {
        self.unit_mut(tag).ok_or(BattleError::UnknownUnit(tag))
    }

    pub fn side(&self, role: SideRole) -> &Side {
        &self.sides[role.index()]
    }

    pub fn side_mut(&mut self, role: SideRole) -> &mut Side {
        &mut self.sides[role.index()]
    }

    /// All units still on the field, in tag order
    pub fn units(&self) -> impl Iterator<Item = &CombatUnit> {
        self.units.iter().filter_map(|slot| slot.as_ref())
    }

    pub fn units_of(&self, role: SideRole) -> impl Iterator<Item = &CombatUnit> {
        self.units().filter(move |unit| unit.side == role)
    }

    pub fn tags_of(&self, role: SideRole) -> Vec<UnitTag> {
        self.side(role).units.clone()
    }

    pub fn entrance_of(&self, role: SideRole) -> HexId {
        self.map.entrance(self.side(role).entry_side)
    }

    /// Unit standing on a board hex; entrances may hold many and report none
    pub fn unit_at(&self, hex: HexId) -> Option<&CombatUnit> {
        if self.map.is_entrance(hex) {
            return None;
        }
        self.units().find(|unit| unit.current_hex == hex)
    }

    pub fn is_occupied(&self, hex: HexId) -> bool {
        self.unit_at(hex).is_some()
    }

    pub fn effective_power(&self, unit: &CombatUnit) -> u32 {
        let score = self.side(unit.side).owner_score;
        unit.archetype.effective_power(score, &self.rules)
    }

    pub fn point_value(&self, unit: &CombatUnit) -> u32 {
        let score = self.side(unit.side).owner_score;
        unit.archetype.point_value(score, &self.rules)
    }

    pub fn is_dead(&self, unit: &CombatUnit) -> bool {
        unit.is_dead(self.effective_power(unit))
    }

    pub fn remaining_health(&self, unit: &CombatUnit) -> u32 {
        unit.remaining_health(self.effective_power(unit))
    }

    pub fn live_count(&self, role: SideRole) -> usize {
        self.units_of(role).filter(|unit| !self.is_dead(unit)).count()
    }

    /// Apply damage to a unit, returning the excess beyond its power
    pub fn wound(&mut self, tag: UnitTag, amount: u32) -> Result<u32> {
        let power = {
            let unit = self.require(tag)?;
            self.effective_power(unit)
        };
        Ok(self.require_mut(tag)?.wound(amount, power))
    }

    pub fn kill(&mut self, tag: UnitTag) -> Result<()> {
        let power = {
            let unit = self.require(tag)?;
            self.effective_power(unit)
        };
        self.require_mut(tag)?.kill(power);
        Ok(())
    }
}
