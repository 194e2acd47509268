//! Hex coordinate system for the battlefield (offset columns)
//!
//! The board is six columns wide. Odd columns sit half a hex lower than even
//! ones, so neighbor offsets depend on column parity. Distances and lines are
//! computed in cube space.

use serde::{Deserialize, Serialize};

/// Column/row coordinate of an on-board hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct BattleHexCoord {
    pub x: i8,
    pub y: i8,
}

/// Which side of a hexspine a reference line favours when it runs exactly
/// along the edge between two hexes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineBias {
    Left,
    Right,
}

impl BattleHexCoord {
    pub fn new(x: i8, y: i8) -> Self {
        Self { x, y }
    }

    /// Cube coordinates (q, r, s)
    pub fn cube(&self) -> (i32, i32, i32) {
        let q = self.x as i32;
        let r = self.y as i32 - (q - (q & 1)) / 2;
        (q, r, -q - r)
    }

    fn from_cube(q: i32, r: i32) -> Self {
        let y = r + (q - (q & 1)) / 2;
        Self::new(q as i8, y as i8)
    }

    /// Hex-step distance
    pub fn distance(&self, other: &Self) -> u32 {
        let (q1, r1, s1) = self.cube();
        let (q2, r2, s2) = other.cube();
        (((q1 - q2).abs() + (r1 - r2).abs() + (s1 - s2).abs()) / 2) as u32
    }

    /// Coordinate one step away in `direction` (may be off the board)
    pub fn step(&self, direction: HexDirection) -> BattleHexCoord {
        let x = self.x;
        let y = self.y;
        let odd = x & 1;
        let even_next = (x + 1) & 1;
        match direction {
            HexDirection::North => BattleHexCoord::new(x, y - 1),
            HexDirection::NorthEast => BattleHexCoord::new(x + 1, y - even_next),
            HexDirection::SouthEast => BattleHexCoord::new(x + 1, y + odd),
            HexDirection::South => BattleHexCoord::new(x, y + 1),
            HexDirection::SouthWest => BattleHexCoord::new(x - 1, y + odd),
            HexDirection::NorthWest => BattleHexCoord::new(x - 1, y - even_next),
        }
    }

    /// Get hex coordinates in a line from self to other (inclusive)
    ///
    /// The end point is nudged slightly so lines along a hexspine resolve
    /// consistently to one side.
    pub fn line_to(&self, other: &Self, bias: LineBias) -> Vec<BattleHexCoord> {
        let n = self.distance(other) as i32;
        if n == 0 {
            return vec![*self];
        }

        let (q1, r1, _) = self.cube();
        let (q2, r2, _) = other.cube();
        let nudge = match bias {
            LineBias::Left => 1e-4,
            LineBias::Right => -1e-4,
        };

        let mut results = Vec::with_capacity((n + 1) as usize);
        for i in 0..=n {
            let t = i as f32 / n as f32;
            let q = q1 as f32 + nudge + (q2 - q1) as f32 * t;
            let r = r1 as f32 + nudge + (r2 - r1) as f32 * t;
            results.push(Self::round(q, r));
        }
        results
    }

    /// Round floating point cube hex to the nearest integer hex
    fn round(q: f32, r: f32) -> Self {
        let s = -q - r;
        let mut rq = q.round();
        let mut rr = r.round();
        let rs = s.round();

        let q_diff = (rq - q).abs();
        let r_diff = (rr - r).abs();
        let s_diff = (rs - s).abs();

        if q_diff > r_diff && q_diff > s_diff {
            rq = -rr - rs;
        } else if r_diff > s_diff {
            rr = -rq - rs;
        }

        Self::from_cube(rq as i32, rr as i32)
    }

    fn label_offset(x: i8) -> i8 {
        ((x - 3) / 2).abs()
    }

    /// Board label: a column letter and a number counted from the bottom
    pub fn label(&self) -> String {
        let letter = (b'A' + self.x as u8) as char;
        let number = 6 - self.y - Self::label_offset(self.x);
        format!("{}{}", letter, number)
    }

    /// Parse a board label such as `D5`
    pub fn from_label(label: &str) -> Option<Self> {
        let mut chars = label.chars();
        let letter = chars.next()?.to_ascii_uppercase();
        if !('A'..='F').contains(&letter) {
            return None;
        }
        let number: i8 = chars.as_str().parse().ok()?;
        let x = (letter as u8 - b'A') as i8;
        let y = 6 - number - Self::label_offset(x);
        Some(Self::new(x, y))
    }
}

/// The six hexside directions, clockwise from north
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HexDirection {
    #[default]
    North,
    NorthEast,
    SouthEast,
    South,
    SouthWest,
    NorthWest,
}

impl HexDirection {
    pub fn index(&self) -> usize {
        match self {
            HexDirection::North => 0,
            HexDirection::NorthEast => 1,
            HexDirection::SouthEast => 2,
            HexDirection::South => 3,
            HexDirection::SouthWest => 4,
            HexDirection::NorthWest => 5,
        }
    }

    pub fn from_index(index: usize) -> Self {
        Self::all()[index % 6]
    }

    /// Get opposite direction
    pub fn opposite(&self) -> Self {
        Self::from_index(self.index() + 3)
    }

    /// All directions
    pub fn all() -> [HexDirection; 6] {
        [
            HexDirection::North,
            HexDirection::NorthEast,
            HexDirection::SouthEast,
            HexDirection::South,
            HexDirection::SouthWest,
            HexDirection::NorthWest,
        ]
    }
}
