//! Battle map with hex grid, terrain, and line of sight
//!
//! One immutable map exists per battleland. Maps are built on first use and
//! shared by every battle fought on that terrain.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::battle::constants::{BOARD_COLUMNS, ENTRANCE_COUNT, OUT_OF_RANGE};
use crate::battle::hex::{BattleHexCoord, HexDirection, LineBias};
use crate::battle::layouts::layout_for;
use crate::battle::terrain::{BattlelandKind, HexTerrain, Hexside};

/// Index of a hex within its map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HexId(pub usize);

impl fmt::Display for HexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hex {}", self.0)
    }
}

/// Rows present in each column of the board
const COLUMN_ROWS: [(i8, i8); BOARD_COLUMNS as usize] =
    [(2, 4), (1, 4), (1, 5), (0, 5), (1, 5), (1, 4)];

/// Board hexes each entrance leads onto, by direction index
const ENTRANCE_LINKS: [&[(usize, &str)]; ENTRANCE_COUNT] = [
    &[(3, "D6"), (4, "E5"), (5, "F4")],
    &[(3, "F4"), (4, "F3"), (5, "F2"), (0, "F1")],
    &[(4, "F1"), (5, "E1"), (0, "D1")],
    &[(5, "D1"), (0, "C1"), (1, "B1"), (2, "A1")],
    &[(0, "A1"), (1, "A2"), (2, "A3")],
    &[(1, "A3"), (2, "B4"), (3, "C5"), (4, "D6")],
];

/// A single hex on the battle map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleHex {
    pub id: HexId,
    pub label: String,
    /// Board position; entrances are off the board and have none
    pub coord: Option<BattleHexCoord>,
    pub terrain: HexTerrain,
    pub elevation: u8,
    pub hexsides: [Hexside; 6],
    pub neighbors: [Option<HexId>; 6],
    pub entrance: bool,
}

impl BattleHex {
    fn board(id: HexId, coord: BattleHexCoord) -> Self {
        Self {
            id,
            label: coord.label(),
            coord: Some(coord),
            terrain: HexTerrain::Open,
            elevation: 0,
            hexsides: [Hexside::None; 6],
            neighbors: [None; 6],
            entrance: false,
        }
    }

    fn entrance(id: HexId, side: usize) -> Self {
        Self {
            id,
            label: format!("X{}", side),
            coord: None,
            terrain: HexTerrain::Open,
            elevation: 0,
            hexsides: [Hexside::None; 6],
            neighbors: [None; 6],
            entrance: true,
        }
    }

    /// Does this hex block line of sight?
    pub fn blocks_los(&self) -> bool {
        self.terrain.blocks_los()
    }

    pub fn has_wall_on_any_side(&self) -> bool {
        self.hexsides.contains(&Hexside::Wall)
    }
}

/// The full battle map
#[derive(Debug, Clone)]
pub struct BattleMap {
    pub kind: BattlelandKind,
    hexes: Vec<BattleHex>,
    by_label: AHashMap<String, HexId>,
    by_coord: AHashMap<BattleHexCoord, HexId>,
    entrances: [HexId; ENTRANCE_COUNT],
}

impl BattleMap {
    /// Build the map for a battleland
    pub fn new(kind: BattlelandKind) -> Self {
        let mut hexes = Vec::new();
        let mut by_label = AHashMap::new();
        let mut by_coord = AHashMap::new();

        for (x, (first, last)) in COLUMN_ROWS.iter().enumerate() {
            for y in *first..=*last {
                let coord = BattleHexCoord::new(x as i8, y);
                let id = HexId(hexes.len());
                let hex = BattleHex::board(id, coord);
                by_label.insert(hex.label.clone(), id);
                by_coord.insert(coord, id);
                hexes.push(hex);
            }
        }

        for spec in layout_for(kind) {
            if let Some(id) = by_label.get(spec.label) {
                let hex = &mut hexes[id.0];
                hex.terrain = spec.terrain;
                hex.elevation = spec.elevation;
                for (dir, side) in spec.sides {
                    hex.hexsides[*dir] = *side;
                }
            }
        }

        for hex in hexes.iter_mut() {
            if let Some(coord) = hex.coord {
                for dir in HexDirection::all() {
                    hex.neighbors[dir.index()] = by_coord.get(&coord.step(dir)).copied();
                }
            }
        }

        let mut entrances = [HexId(0); ENTRANCE_COUNT];
        for (side, links) in ENTRANCE_LINKS.iter().enumerate() {
            let id = HexId(hexes.len());
            let mut hex = BattleHex::entrance(id, side);
            for (dir, label) in links.iter() {
                hex.neighbors[*dir] = by_label.get(*label).copied();
            }
            by_label.insert(hex.label.clone(), id);
            entrances[side] = id;
            hexes.push(hex);
        }

        Self {
            kind,
            hexes,
            by_label,
            by_coord,
            entrances,
        }
    }

    /// Shared read-only map for a battleland
    pub fn shared(kind: BattlelandKind) -> Arc<BattleMap> {
        static MAPS: OnceLock<Vec<Arc<BattleMap>>> = OnceLock::new();
        let maps = MAPS.get_or_init(|| {
            BattlelandKind::all()
                .into_iter()
                .map(|kind| Arc::new(BattleMap::new(kind)))
                .collect()
        });
        Arc::clone(&maps[kind as usize])
    }

    /// Get a hex by id
    pub fn hex(&self, id: HexId) -> &BattleHex {
        &self.hexes[id.0]
    }

    pub fn get_hex(&self, id: HexId) -> Option<&BattleHex> {
        self.hexes.get(id.0)
    }

    pub fn hex_by_label(&self, label: &str) -> Option<HexId> {
        self.by_label.get(&label.to_ascii_uppercase()).copied()
    }

    pub fn hex_at(&self, coord: BattleHexCoord) -> Option<HexId> {
        self.by_coord.get(&coord).copied()
    }

    pub fn label(&self, id: HexId) -> &str {
        &self.hex(id).label
    }

    /// All hexes, board first, then the six entrances
    pub fn hexes(&self) -> impl Iterator<Item = &BattleHex> {
        self.hexes.iter()
    }

    pub fn board_hexes(&self) -> impl Iterator<Item = &BattleHex> {
        self.hexes.iter().filter(|hex| !hex.entrance)
    }

    pub fn neighbor(&self, id: HexId, direction: HexDirection) -> Option<HexId> {
        self.hex(id).neighbors[direction.index()]
    }

    /// Obstruction on this hex's own side of the edge
    pub fn hexside(&self, id: HexId, direction: HexDirection) -> Hexside {
        self.hex(id).hexsides[direction.index()]
    }

    /// Obstruction recorded on the neighbor's side of the same edge
    pub fn opposite_hexside(&self, id: HexId, direction: HexDirection) -> Hexside {
        match self.neighbor(id, direction) {
            Some(other) => self.hexside(other, direction.opposite()),
            None => Hexside::None,
        }
    }

    /// A cliff on either side of the edge separates the two hexes
    pub fn is_cliff(&self, id: HexId, direction: HexDirection) -> bool {
        self.hexside(id, direction) == Hexside::Cliff
            || self.opposite_hexside(id, direction) == Hexside::Cliff
    }

    pub fn is_entrance(&self, id: HexId) -> bool {
        self.hex(id).entrance
    }

    /// Entrance hex for an entry side (0..5)
    pub fn entrance(&self, side: u8) -> HexId {
        self.entrances[side as usize % ENTRANCE_COUNT]
    }

    pub fn elevation(&self, id: HexId) -> u8 {
        self.hex(id).elevation
    }

    pub fn terrain(&self, id: HexId) -> HexTerrain {
        self.hex(id).terrain
    }

    pub fn has_wall_on_any_side(&self, id: HexId) -> bool {
        self.hex(id).has_wall_on_any_side()
    }

    /// Direction from `from` to an adjacent hex
    pub fn direction_to(&self, from: HexId, to: HexId) -> Option<HexDirection> {
        HexDirection::all()
            .into_iter()
            .find(|dir| self.neighbor(from, *dir) == Some(to))
    }

    /// Minimum hex-step distance; entrances are out of range
    pub fn range_between(&self, a: HexId, b: HexId) -> u32 {
        match (self.hex(a).coord, self.hex(b).coord) {
            (Some(from), Some(to)) => from.distance(&to),
            _ => OUT_OF_RANGE,
        }
    }

    /// Board hexes strictly between two hexes along the reference line
    fn interior(&self, a: HexId, b: HexId, bias: LineBias) -> Vec<HexId> {
        let (Some(from), Some(to)) = (self.hex(a).coord, self.hex(b).coord) else {
            return Vec::new();
        };
        from.line_to(&to, bias)
            .into_iter()
            .filter_map(|coord| self.hex_at(coord))
            .filter(|id| *id != a && *id != b)
            .collect()
    }

    /// Number of Bramble hexes strictly between two hexes
    ///
    /// A line running along a hexspine is evaluated on both sides and the
    /// lower count wins.
    pub fn count_bramble_between(&self, a: HexId, b: HexId) -> u32 {
        [LineBias::Left, LineBias::Right]
            .into_iter()
            .map(|bias| {
                self.interior(a, b, bias)
                    .into_iter()
                    .filter(|id| self.terrain(*id) == HexTerrain::Bramble)
                    .count() as u32
            })
            .min()
            .unwrap_or(0)
    }

    /// Check line of sight between two hexes
    ///
    /// Trees block; so does any occupied hex in between whose elevation is at
    /// least the lower of the two end elevations.
    pub fn has_line_of_sight(
        &self,
        a: HexId,
        b: HexId,
        is_occupied: impl Fn(HexId) -> bool,
    ) -> bool {
        if self.is_entrance(a) || self.is_entrance(b) {
            return false;
        }
        let floor = self.elevation(a).min(self.elevation(b));
        [LineBias::Left, LineBias::Right].into_iter().any(|bias| {
            self.interior(a, b, bias).into_iter().all(|id| {
                let hex = self.hex(id);
                !hex.blocks_los() && !(is_occupied(id) && hex.elevation >= floor)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::constants::BOARD_HEX_COUNT;

    #[test]
    fn test_board_has_fixed_shape() {
        let map = BattleMap::new(BattlelandKind::Plains);
        assert_eq!(map.board_hexes().count(), BOARD_HEX_COUNT);
        assert_eq!(map.hexes().count(), BOARD_HEX_COUNT + ENTRANCE_COUNT);
        assert!(map.hex_by_label("A1").is_some());
        assert!(map.hex_by_label("F5").is_none());
        assert!(map.hex_by_label("d6").is_some());
    }

    #[test]
    fn test_neighbors_are_symmetric_on_board() {
        let map = BattleMap::new(BattlelandKind::Plains);
        for hex in map.board_hexes() {
            for dir in HexDirection::all() {
                if let Some(other) = map.neighbor(hex.id, dir) {
                    assert_eq!(map.neighbor(other, dir.opposite()), Some(hex.id));
                }
            }
        }
    }

    #[test]
    fn test_entrances_link_onto_board_one_way() {
        let map = BattleMap::new(BattlelandKind::Plains);
        let x3 = map.entrance(3);
        assert!(map.is_entrance(x3));
        let a1 = map.hex_by_label("A1").unwrap();
        assert_eq!(map.neighbor(x3, HexDirection::SouthEast), Some(a1));
        assert!(HexDirection::all()
            .into_iter()
            .all(|dir| map.neighbor(a1, dir) != Some(x3)));
        assert_eq!(map.range_between(x3, a1), OUT_OF_RANGE);
    }

    #[test]
    fn test_desert_cliff_separates_both_ways() {
        let map = BattleMap::new(BattlelandKind::Desert);
        let b2 = map.hex_by_label("B2").unwrap();
        assert!(map.is_cliff(b2, HexDirection::South));
        let below = map.neighbor(b2, HexDirection::South).unwrap();
        assert!(map.is_cliff(below, HexDirection::North));
        assert_eq!(map.hexside(below, HexDirection::North), Hexside::None);
    }

    #[test]
    fn test_tower_walls() {
        let map = BattleMap::new(BattlelandKind::Tower);
        let d4 = map.hex_by_label("D4").unwrap();
        assert!(map.has_wall_on_any_side(d4));
        assert_eq!(map.elevation(d4), 2);
        assert!(!map.has_wall_on_any_side(map.hex_by_label("A1").unwrap()));
    }

    #[test]
    fn test_bramble_between_counts_interior_only() {
        let map = BattleMap::new(BattlelandKind::Brush);
        let d6 = map.hex_by_label("D6").unwrap();
        let d3 = map.hex_by_label("D3").unwrap();
        // D5 is bramble, D4 is not
        assert_eq!(map.count_bramble_between(d6, d3), 1);
        let d5 = map.hex_by_label("D5").unwrap();
        assert_eq!(map.count_bramble_between(d5, d3), 0);
    }

    #[test]
    fn test_line_of_sight_blocked_by_tree() {
        let map = BattleMap::new(BattlelandKind::Woods);
        let c5 = map.hex_by_label("C5").unwrap();
        let c1 = map.hex_by_label("C1").unwrap();
        assert!(!map.has_line_of_sight(c5, c1, |_| false));

        let plains = BattleMap::new(BattlelandKind::Plains);
        let c5 = plains.hex_by_label("C5").unwrap();
        let c1 = plains.hex_by_label("C1").unwrap();
        assert!(plains.has_line_of_sight(c5, c1, |_| false));
        let c3 = plains.hex_by_label("C3").unwrap();
        assert!(!plains.has_line_of_sight(c5, c1, |id| id == c3));
    }

    #[test]
    fn test_shared_maps_are_reused() {
        let a = BattleMap::shared(BattlelandKind::Hills);
        let b = BattleMap::shared(BattlelandKind::Hills);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.kind, BattlelandKind::Hills);
    }
}
