//! Battle rule constants - all fixed numbers in one place
//!
//! Values that variants may change have a matching field in `RulesConfig`.

// Turn structure
pub const DEFAULT_MAX_ROUNDS: u32 = 7;
pub const DEFAULT_REINFORCEMENT_ROUND: u32 = 4;
/// A legion this tall cannot take a summon or reinforcement
pub const MAX_LEGION_HEIGHT: usize = 7;
/// Attacker entrances; any other request falls back to the middle one
pub const ATTACKER_ENTRY_SIDES: [u8; 3] = [1, 3, 5];
pub const DEFAULT_ATTACKER_ENTRY_SIDE: u8 = 3;

// Titan scaling
pub const DEFAULT_TITAN_BASE_POWER: u32 = 6;
pub const DEFAULT_TITAN_IMPROVEMENT: u32 = 100;

// Hazards
pub const DEFAULT_DRIFT_DAMAGE: u32 = 1;

// Dice
pub const DIE_SIDES: u8 = 6;
pub const BASE_STRIKE_NUMBER: i32 = 4;
pub const MIN_STRIKE_NUMBER: i32 = 1;
pub const MAX_STRIKE_NUMBER: i32 = 6;

// Range (hex steps)
pub const OUT_OF_RANGE: u32 = 99;
/// Magic missile reaches any hex it is not in contact with, even across a cliff
pub const MIN_RANGESTRIKE_RANGE: u32 = 1;
/// Ordinary rangestrikes need at least one hex between shooter and target
pub const MIN_NON_MAGIC_RANGESTRIKE_RANGE: u32 = 2;
pub const MAX_RANGESTRIKE_RANGE: u32 = 4;
pub const LONG_RANGE_PENALTY_RANGE: u32 = 4;

// Movement costs
pub const NORMAL_MOVE_COST: u32 = 1;
pub const SLOW_MOVE_COST: u32 = 2;
pub const IMPASSABLE_COST: u32 = 99;

// Battlefield
pub const BOARD_COLUMNS: i8 = 6;
pub const BOARD_ROWS: i8 = 6;
pub const BOARD_HEX_COUNT: usize = 27;
pub const ENTRANCE_COUNT: usize = 6;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strike_number_bounds_ordered() {
        assert!(MIN_STRIKE_NUMBER < BASE_STRIKE_NUMBER);
        assert!(BASE_STRIKE_NUMBER < MAX_STRIKE_NUMBER);
        assert_eq!(MAX_STRIKE_NUMBER, DIE_SIDES as i32);
    }

    #[test]
    fn test_range_ordering() {
        assert!(MIN_RANGESTRIKE_RANGE < MIN_NON_MAGIC_RANGESTRIKE_RANGE);
        assert!(LONG_RANGE_PENALTY_RANGE <= MAX_RANGESTRIKE_RANGE);
        assert!(MAX_RANGESTRIKE_RANGE < OUT_OF_RANGE);
    }

    #[test]
    fn test_movement_costs_ordered() {
        assert!(NORMAL_MOVE_COST < SLOW_MOVE_COST);
        assert!(SLOW_MOVE_COST < IMPASSABLE_COST);
    }
}
