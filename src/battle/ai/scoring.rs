//! Strike and position scoring
//!
//! Quantifies how attractive a strike or a hex is for the AI strategies.

use crate::battle::battle_map::HexId;
use crate::battle::constants::{DIE_SIDES, OUT_OF_RANGE};
use crate::battle::field::Field;
use crate::battle::resolution::{odds, StrikeOdds};
use crate::battle::units::CombatUnit;
use crate::core::types::SideRole;

/// Average number of hits at these odds
pub fn expected_hits(odds: StrikeOdds) -> f32 {
    let sides = u32::from(DIE_SIDES);
    let hitting_faces = (sides + 1).saturating_sub(odds.strike_number);
    odds.dice as f32 * hitting_faces as f32 / sides as f32
}

/// Points of damage expected to land, weighted by the target's value,
/// plus the full value when the strike should kill
pub fn strike_value(field: &Field, attacker: &CombatUnit, target: &CombatUnit) -> f32 {
    let expected = expected_hits(odds(field, attacker, target));
    let health = field.remaining_health(target) as f32;
    let value = field.point_value(target) as f32;

    let share = expected.min(health) / health.max(1.0);
    let kill_bonus = if expected >= health { value } else { 0.0 };
    share * value + kill_bonus
}

/// Hex steps from `hex` to the closest live enemy of `side` on the board
pub fn nearest_enemy_distance(field: &Field, side: SideRole, hex: HexId) -> u32 {
    field
        .units_of(side.opponent())
        .filter(|enemy| !field.is_dead(enemy))
        .map(|enemy| field.map.range_between(hex, enemy.current_hex))
        .min()
        .unwrap_or(OUT_OF_RANGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::field::test_support::skirmish;
    use crate::battle::terrain::BattlelandKind;

    #[test]
    fn test_expected_hits() {
        let sure = StrikeOdds {
            dice: 6,
            strike_number: 1,
        };
        assert!((expected_hits(sure) - 6.0).abs() < f32::EPSILON);

        let even = StrikeOdds {
            dice: 6,
            strike_number: 4,
        };
        assert!((expected_hits(even) - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_wounded_targets_score_higher() {
        let (mut field, d, a) = skirmish(
            BattlelandKind::Plains,
            &[("Ogre", "D4"), ("Ogre", "C4")],
            &[("Troll", "D5")],
        );
        field.wound(d[1], 5).unwrap();
        let troll = field.unit(a[0]).unwrap();
        let fresh = strike_value(&field, troll, field.unit(d[0]).unwrap());
        let wounded = strike_value(&field, troll, field.unit(d[1]).unwrap());
        assert!(wounded > fresh);
    }

    #[test]
    fn test_nearest_enemy_distance() {
        let (field, d, _) = skirmish(BattlelandKind::Plains, &[("Ogre", "D1")], &[("Troll", "D4")]);
        let ogre = field.unit(d[0]).unwrap();
        assert_eq!(nearest_enemy_distance(&field, ogre.side, ogre.current_hex), 3);

        let (empty, d, _) = skirmish(BattlelandKind::Plains, &[("Ogre", "D1")], &[]);
        let lonely = empty.unit(d[0]).unwrap();
        assert_eq!(nearest_enemy_distance(&empty, lonely.side, lonely.current_hex), OUT_OF_RANGE);
    }
}
