//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for one battle instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BattleId(pub Uuid);

impl BattleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BattleId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity tag of a combat unit, unique within one battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitTag(pub u32);

impl fmt::Display for UnitTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out monotonic unit tags for the lifetime of one battle.
#[derive(Debug, Clone, Default)]
pub struct TagAllocator {
    next: u32,
}

impl TagAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> UnitTag {
        let tag = UnitTag(self.next);
        self.next += 1;
        tag
    }

    /// Number of tags handed out so far
    pub fn issued(&self) -> u32 {
        self.next
    }
}

/// External player identity, used only to route decision queries
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which side of the engagement a legion fights on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SideRole {
    Attacker,
    Defender,
}

impl SideRole {
    pub fn opponent(&self) -> Self {
        match self {
            SideRole::Attacker => SideRole::Defender,
            SideRole::Defender => SideRole::Attacker,
        }
    }

    /// Storage slot; the defender is listed first, as it moves first.
    pub fn index(&self) -> usize {
        match self {
            SideRole::Defender => 0,
            SideRole::Attacker => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_are_monotonic() {
        let mut tags = TagAllocator::new();
        let a = tags.allocate();
        let b = tags.allocate();
        assert!(b > a);
        assert_eq!(tags.issued(), 2);
    }

    #[test]
    fn test_separate_allocators_restart() {
        let mut first = TagAllocator::new();
        first.allocate();
        let mut second = TagAllocator::new();
        assert_eq!(second.allocate(), UnitTag(0));
    }

    #[test]
    fn test_opponent_roles() {
        assert_eq!(SideRole::Attacker.opponent(), SideRole::Defender);
        assert_eq!(SideRole::Defender.opponent(), SideRole::Attacker);
        assert_ne!(SideRole::Attacker.index(), SideRole::Defender.index());
    }
}
