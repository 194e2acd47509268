//! Legal moves for one unit during the Move phase
//!
//! Movement points equal skill. Walkers pay each hex's entry cost; fliers
//! may pass over any hex for one point but must land somewhere enterable.

use std::collections::BTreeSet;

use crate::battle::archetype::Archetype;
use crate::battle::battle_map::HexId;
use crate::battle::constants::{IMPASSABLE_COST, NORMAL_MOVE_COST, SLOW_MOVE_COST};
use crate::battle::engagement::is_in_contact;
use crate::battle::field::Field;
use crate::battle::hex::HexDirection;
use crate::battle::terrain::Hexside;
use crate::battle::units::CombatUnit;

/// Cost to step from `from` into its neighbor in `direction`
///
/// Slowing effects do not stack: the worst single one applies.
pub fn entry_cost(field: &Field, archetype: &Archetype, from: HexId, direction: HexDirection) -> u32 {
    let map = &field.map;
    let Some(to) = map.neighbor(from, direction) else {
        return IMPASSABLE_COST;
    };
    let terrain = map.terrain(to);
    let terrain_cost = terrain.entry_cost(archetype.is_native(terrain), archetype.flier);
    if terrain_cost >= IMPASSABLE_COST {
        return IMPASSABLE_COST;
    }
    if !archetype.flier && map.is_cliff(from, direction) {
        return IMPASSABLE_COST;
    }

    let hazard = map.hexside(to, direction.opposite());
    let climbing = !archetype.flier
        && map.elevation(to) > map.elevation(from)
        && (hazard == Hexside::Wall || (hazard == Hexside::Slope && !archetype.natives.slope));
    let side_cost = if climbing {
        SLOW_MOVE_COST
    } else {
        NORMAL_MOVE_COST
    };

    terrain_cost.max(side_cost)
}

fn find_moves(
    field: &Field,
    unit: &CombatUnit,
    hex: HexId,
    moves_left: u32,
    came_from: Option<HexDirection>,
    found: &mut BTreeSet<HexId>,
) {
    let map = &field.map;
    let archetype = &unit.archetype;
    for dir in HexDirection::all() {
        if Some(dir) == came_from {
            continue;
        }
        let Some(neighbor) = map.neighbor(hex, dir) else {
            continue;
        };

        let cost = if field.is_occupied(neighbor) {
            IMPASSABLE_COST
        } else {
            entry_cost(field, archetype, hex, dir)
        };

        if cost < IMPASSABLE_COST && cost <= moves_left {
            found.insert(neighbor);
            if !archetype.flier && moves_left > cost {
                find_moves(field, unit, neighbor, moves_left - cost, Some(dir.opposite()), found);
            }
        }

        if archetype.flier && moves_left > 1 {
            find_moves(field, unit, neighbor, moves_left - 1, Some(dir.opposite()), found);
        }
    }
}

/// Hexes the unit may move to this half-turn
///
/// Units that have moved or are in contact with a live enemy stay put.
pub fn legal_moves(field: &Field, unit: &CombatUnit) -> Vec<HexId> {
    if unit.moved || is_in_contact(field, unit, false) {
        return Vec::new();
    }
    let mut found = BTreeSet::new();
    find_moves(
        field,
        unit,
        unit.current_hex,
        unit.archetype.skill,
        None,
        &mut found,
    );
    found.remove(&unit.current_hex);
    found.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::archetype::archetype;
    use crate::battle::field::test_support::skirmish;
    use crate::battle::terrain::BattlelandKind;

    fn labels(field: &Field, hexes: &[HexId]) -> Vec<String> {
        hexes.iter().map(|h| field.map.label(*h).to_string()).collect()
    }

    #[test]
    fn test_walker_reach_on_open_ground() {
        let (field, d, _) = skirmish(BattlelandKind::Plains, &[("Ogre", "D3")], &[]);
        let moves = legal_moves(&field, field.unit(d[0]).unwrap());
        let reach = labels(&field, &moves);
        // Skill 2: every hex within two steps
        assert!(reach.contains(&"D5".to_string()));
        assert!(reach.contains(&"D1".to_string()));
        assert!(!reach.contains(&"D6".to_string()));
        assert!(!reach.contains(&"D3".to_string()));
    }

    #[test]
    fn test_occupied_hexes_block_walkers() {
        let (field, d, _) = skirmish(
            BattlelandKind::Plains,
            &[("Ogre", "A1"), ("Troll", "A2"), ("Cyclops", "B1"), ("Lion", "B2")],
            &[],
        );
        let ogre = field.unit(d[0]).unwrap();
        assert!(legal_moves(&field, ogre).is_empty());
    }

    #[test]
    fn test_fliers_pass_over_units() {
        let (field, d, _) = skirmish(
            BattlelandKind::Plains,
            &[("Gargoyle", "A1"), ("Troll", "A2"), ("Cyclops", "B1"), ("Lion", "B2")],
            &[],
        );
        let reach = labels(&field, &legal_moves(&field, field.unit(d[0]).unwrap()));
        assert!(reach.contains(&"A3".to_string()));
        assert!(!reach.contains(&"A2".to_string()));
    }

    #[test]
    fn test_trees_and_bog_are_impassable() {
        let (field, d, _) = skirmish(BattlelandKind::Marsh, &[("Ogre", "D3"), ("Centaur", "C4")], &[]);
        let c3 = field.map.hex_by_label("C3").unwrap();
        // Ogre is bog native, centaur is not
        assert!(legal_moves(&field, field.unit(d[0]).unwrap()).contains(&c3));
        assert!(!legal_moves(&field, field.unit(d[1]).unwrap()).contains(&c3));

        assert_eq!(
            entry_cost_on(BattlelandKind::Woods, "Ogre", "C4", HexDirection::South),
            IMPASSABLE_COST
        );
    }

    fn entry_cost_on(kind: BattlelandKind, creature: &str, from: &str, dir: HexDirection) -> u32 {
        let (field, _, _) = skirmish(kind, &[], &[]);
        let from = field.map.hex_by_label(from).unwrap();
        entry_cost(&field, &archetype(creature).unwrap(), from, dir)
    }

    #[test]
    fn test_climbing_walls_and_slopes_is_slow() {
        let tower = BattlelandKind::Tower;
        // C5 south is C4, walled and one level up
        assert_eq!(entry_cost_on(tower, "Ogre", "C5", HexDirection::South), SLOW_MOVE_COST);
        assert_eq!(entry_cost_on(tower, "Gargoyle", "C5", HexDirection::South), NORMAL_MOVE_COST);
        assert_eq!(entry_cost_on(tower, "Ogre", "C4", HexDirection::North), NORMAL_MOVE_COST);
        // Sand slows walkers but not fliers
        let desert = BattlelandKind::Desert;
        assert_eq!(entry_cost_on(desert, "Ogre", "C5", HexDirection::NorthEast), SLOW_MOVE_COST);
        assert_eq!(entry_cost_on(desert, "Gargoyle", "C5", HexDirection::NorthEast), NORMAL_MOVE_COST);
    }

    #[test]
    fn test_units_in_contact_cannot_move() {
        let (field, d, _) = skirmish(BattlelandKind::Plains, &[("Ogre", "D4")], &[("Troll", "D5")]);
        assert!(legal_moves(&field, field.unit(d[0]).unwrap()).is_empty());
    }
}
