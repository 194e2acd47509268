//! Contact detection between units
//!
//! Units are in contact when adjacent across an edge with no cliff on either
//! side. Units waiting on an entrance are never in contact.

use crate::battle::field::Field;
use crate::battle::hex::HexDirection;
use crate::battle::units::CombatUnit;
use crate::core::types::UnitTag;

/// Units adjacent to `unit` across non-cliff edges, with the direction
fn adjacent_units<'a>(
    field: &'a Field,
    unit: &'a CombatUnit,
) -> impl Iterator<Item = (HexDirection, &'a CombatUnit)> + 'a {
    let map = &field.map;
    let hex = unit.current_hex;
    let on_board = !map.is_entrance(hex);
    HexDirection::all()
        .into_iter()
        .filter(move |_| on_board)
        .filter(move |dir| !map.is_cliff(hex, *dir))
        .filter_map(move |dir| {
            let neighbor = map.neighbor(hex, dir)?;
            field.unit_at(neighbor).map(|other| (dir, other))
        })
}

/// Enemies in contact with `unit`; dead ones only when `count_dead`
pub fn contacts(field: &Field, unit: &CombatUnit, count_dead: bool) -> Vec<UnitTag> {
    adjacent_units(field, unit)
        .filter(|(_, other)| other.side != unit.side)
        .filter(|(_, other)| count_dead || !field.is_dead(other))
        .map(|(_, other)| other.tag)
        .collect()
}

pub fn is_in_contact(field: &Field, unit: &CombatUnit, count_dead: bool) -> bool {
    contact_count(field, unit, count_dead) > 0
}

pub fn contact_count(field: &Field, unit: &CombatUnit, count_dead: bool) -> usize {
    contacts(field, unit, count_dead).len()
}

/// Live friendly units adjacent across non-cliff edges
pub fn adjacent_ally_count(field: &Field, unit: &CombatUnit) -> usize {
    adjacent_units(field, unit)
        .filter(|(_, other)| other.side == unit.side && !field.is_dead(other))
        .count()
}

/// Are these two units adjacent across a non-cliff edge?
pub fn pair_in_contact(field: &Field, a: &CombatUnit, b: &CombatUnit) -> bool {
    contact_direction(field, a, b).is_some()
}

/// Direction from `a` to an adjacent `b`, if they touch
pub fn contact_direction(field: &Field, a: &CombatUnit, b: &CombatUnit) -> Option<HexDirection> {
    adjacent_units(field, a)
        .find(|(_, other)| other.tag == b.tag)
        .map(|(dir, _)| dir)
}
