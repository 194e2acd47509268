//! Fixed battlefield tables, one per battleland
//!
//! Every hex not listed is open ground at elevation 0 with clear hexsides.
//! Hexside entries are `(direction index, obstruction)` on the listed hex.

use crate::battle::terrain::{BattlelandKind, HexTerrain, Hexside};

use Hexside::{Cliff as C, Dune as D, Slope as S, Wall as W};
use HexTerrain::{Bog, Bramble, Drift, Open, SandDune, Slope, Tree, Volcano};

/// One non-default hex of a layout
#[derive(Debug, Clone, Copy)]
pub struct HexSpec {
    pub label: &'static str,
    pub terrain: HexTerrain,
    pub elevation: u8,
    pub sides: &'static [(usize, Hexside)],
}

const fn hex(
    label: &'static str,
    terrain: HexTerrain,
    elevation: u8,
    sides: &'static [(usize, Hexside)],
) -> HexSpec {
    HexSpec {
        label,
        terrain,
        elevation,
        sides,
    }
}

const ALL_SLOPES: &[(usize, Hexside)] = &[(0, S), (1, S), (2, S), (3, S), (4, S), (5, S)];
const ALL_WALLS: &[(usize, Hexside)] = &[(0, W), (1, W), (2, W), (3, W), (4, W), (5, W)];

static WOODS: &[HexSpec] = &[
    hex("A3", Tree, 1, &[]),
    hex("C3", Tree, 1, &[]),
    hex("D1", Tree, 1, &[]),
    hex("E5", Tree, 1, &[]),
    hex("E3", Tree, 1, &[]),
];

static DESERT: &[HexSpec] = &[
    hex("A2", SandDune, 0, &[(0, D), (1, D)]),
    hex("A1", SandDune, 0, &[]),
    hex("B2", SandDune, 0, &[(0, D), (1, D), (2, D), (3, C)]),
    hex("D6", SandDune, 0, &[]),
    hex("D5", SandDune, 0, &[(4, D)]),
    hex("D4", SandDune, 0, &[(2, D), (3, C), (4, C), (5, D)]),
    hex("D1", SandDune, 0, &[(0, D), (5, D)]),
    hex("E5", SandDune, 0, &[]),
    hex("E4", SandDune, 0, &[(2, D), (3, D)]),
    hex("E1", SandDune, 0, &[(0, C), (1, D), (5, D)]),
    hex("F4", SandDune, 0, &[]),
];

static BRUSH: &[HexSpec] = &[
    hex("A3", Bramble, 0, &[]),
    hex("B2", Bramble, 0, &[]),
    hex("C4", Bramble, 0, &[]),
    hex("D5", Bramble, 0, &[]),
    hex("D2", Bramble, 0, &[]),
    hex("D1", Bramble, 0, &[]),
    hex("E3", Bramble, 0, &[]),
    hex("F4", Bramble, 0, &[]),
];

static JUNGLE: &[HexSpec] = &[
    hex("A2", Bramble, 0, &[]),
    hex("C5", Bramble, 0, &[]),
    hex("C3", Bramble, 0, &[]),
    hex("C1", Bramble, 0, &[]),
    hex("D4", Bramble, 0, &[]),
    hex("E2", Bramble, 0, &[]),
    hex("F4", Bramble, 0, &[]),
    hex("B4", Tree, 1, &[]),
    hex("D3", Tree, 1, &[]),
    hex("F3", Tree, 1, &[]),
];

static MARSH: &[HexSpec] = &[
    hex("A3", Bog, 0, &[]),
    hex("C3", Bog, 0, &[]),
    hex("C2", Bog, 0, &[]),
    hex("D5", Bog, 0, &[]),
    hex("E3", Bog, 0, &[]),
    hex("E1", Bog, 0, &[]),
];

static SWAMP: &[HexSpec] = &[
    hex("B2", Bog, 0, &[]),
    hex("C5", Bog, 0, &[]),
    hex("D3", Bog, 0, &[]),
    hex("D1", Bog, 0, &[]),
    hex("F2", Bog, 0, &[]),
    hex("C4", Tree, 1, &[]),
    hex("C2", Tree, 1, &[]),
    hex("E4", Tree, 1, &[]),
];

static HILLS: &[HexSpec] = &[
    hex("B3", Slope, 1, ALL_SLOPES),
    hex("B1", Slope, 1, &[(0, S), (1, S), (2, S), (5, S)]),
    hex("C4", Tree, 1, &[]),
    hex("C2", Tree, 1, &[]),
    hex("D6", Slope, 1, &[(2, S), (3, S), (4, S)]),
    hex("D2", Slope, 1, ALL_SLOPES),
    hex("E3", Slope, 1, ALL_SLOPES),
    hex("F2", Tree, 1, &[]),
];

static MOUNTAINS: &[HexSpec] = &[
    hex("A1", Open, 1, &[(0, S)]),
    hex("B4", Open, 1, &[(3, S), (4, S)]),
    hex("B2", Open, 1, &[(0, S), (1, S), (2, S), (5, S)]),
    hex("B1", Open, 2, &[(0, S), (1, C), (2, S), (5, S)]),
    hex("C5", Open, 2, &[(2, S), (3, S), (4, S)]),
    hex("C4", Open, 1, &[(3, S), (4, S)]),
    hex("C1", Open, 1, &[(0, S), (1, S), (2, S)]),
    hex("D6", Open, 2, &[(2, S), (3, S)]),
    hex("D5", Open, 1, &[]),
    hex("D4", Volcano, 2, &[(0, S), (1, S), (2, S), (3, S), (4, C), (5, S)]),
    hex("D3", Open, 1, &[(2, S), (3, S), (4, S), (5, S)]),
    hex("E5", Open, 1, &[]),
    hex("E4", Open, 1, &[]),
    hex("E3", Open, 1, &[(3, S)]),
    hex("F4", Open, 2, &[(3, S), (4, S), (5, S)]),
    hex("F3", Open, 1, &[]),
    hex("F2", Open, 2, &[(0, S), (3, S), (4, C), (5, S)]),
    hex("F1", Open, 1, &[(4, S), (5, S)]),
];

static TUNDRA: &[HexSpec] = &[
    hex("A1", Drift, 0, &[]),
    hex("B2", Drift, 0, &[]),
    hex("C5", Drift, 0, &[]),
    hex("C4", Drift, 0, &[]),
    hex("C2", Drift, 0, &[]),
    hex("D3", Drift, 0, &[]),
    hex("E4", Drift, 0, &[]),
    hex("E1", Drift, 0, &[]),
    hex("F2", Drift, 0, &[]),
];

static TOWER: &[HexSpec] = &[
    hex("C4", Open, 1, &[(0, W), (4, W), (5, W)]),
    hex("C3", Open, 1, &[(3, W), (4, W), (5, W)]),
    hex("D5", Open, 1, &[(0, W), (1, W), (5, W)]),
    hex("D4", Open, 2, ALL_WALLS),
    hex("D3", Open, 1, &[(2, W), (3, W), (4, W)]),
    hex("E4", Open, 1, &[(0, W), (1, W), (2, W)]),
    hex("E3", Open, 1, &[(1, W), (2, W), (3, W)]),
];

/// Non-default hexes of a battleland
pub fn layout_for(kind: BattlelandKind) -> &'static [HexSpec] {
    match kind {
        BattlelandKind::Plains => &[],
        BattlelandKind::Woods => WOODS,
        BattlelandKind::Desert => DESERT,
        BattlelandKind::Brush => BRUSH,
        BattlelandKind::Jungle => JUNGLE,
        BattlelandKind::Marsh => MARSH,
        BattlelandKind::Swamp => SWAMP,
        BattlelandKind::Hills => HILLS,
        BattlelandKind::Mountains => MOUNTAINS,
        BattlelandKind::Tundra => TUNDRA,
        BattlelandKind::Tower => TOWER,
    }
}
