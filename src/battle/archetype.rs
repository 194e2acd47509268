//! Creature archetypes and their default properties
//!
//! Archetypes are immutable templates shared by every unit of that kind.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

use crate::battle::terrain::HexTerrain;
use crate::core::config::RulesConfig;

/// Where a creature's power comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerSource {
    Fixed(u32),
    /// Titans grow with their owner's score
    DerivedFromOwnerScore,
}

impl PowerSource {
    pub fn resolve(&self, owner_score: u32, rules: &RulesConfig) -> u32 {
        match self {
            PowerSource::Fixed(power) => *power,
            PowerSource::DerivedFromOwnerScore => {
                rules.titan_base_power + owner_score / rules.titan_improvement.max(1)
            }
        }
    }
}

/// Terrain features a creature is at home in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Natives {
    pub bramble: bool,
    pub drift: bool,
    pub bog: bool,
    pub sand: bool,
    pub slope: bool,
    pub volcano: bool,
}

impl Natives {
    pub fn is_native(&self, terrain: HexTerrain) -> bool {
        match terrain {
            HexTerrain::Bramble => self.bramble,
            HexTerrain::Drift => self.drift,
            HexTerrain::Bog => self.bog,
            HexTerrain::SandDune => self.sand,
            HexTerrain::Slope => self.slope,
            HexTerrain::Volcano => self.volcano,
            HexTerrain::Open | HexTerrain::Tree => false,
        }
    }
}

/// A creature type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archetype {
    pub name: String,
    pub power: PowerSource,
    pub skill: u32,
    pub flier: bool,
    pub rangestriker: bool,
    /// Rangestrikes ignore skill penalties, range minimums and lord immunity
    pub magic_missile: bool,
    pub lord: bool,
    pub demilord: bool,
    pub summonable: bool,
    pub natives: Natives,
}

impl Archetype {
    pub fn new(name: impl Into<String>, power: u32, skill: u32) -> Self {
        Self {
            name: name.into(),
            power: PowerSource::Fixed(power),
            skill,
            flier: false,
            rangestriker: false,
            magic_missile: false,
            lord: false,
            demilord: false,
            summonable: false,
            natives: Natives::default(),
        }
    }

    /// A titan: a lord whose power follows its owner's score
    pub fn titan(skill: u32) -> Self {
        Self {
            power: PowerSource::DerivedFromOwnerScore,
            lord: true,
            ..Self::new("Titan", 0, skill)
        }
    }

    pub fn flying(mut self) -> Self {
        self.flier = true;
        self
    }

    pub fn rangestriking(mut self) -> Self {
        self.rangestriker = true;
        self
    }

    pub fn magic_missile(mut self) -> Self {
        self.rangestriker = true;
        self.magic_missile = true;
        self
    }

    pub fn lord(mut self) -> Self {
        self.lord = true;
        self
    }

    pub fn demilord(mut self) -> Self {
        self.demilord = true;
        self
    }

    pub fn summonable(mut self) -> Self {
        self.summonable = true;
        self
    }

    pub fn native(mut self, terrain: HexTerrain) -> Self {
        match terrain {
            HexTerrain::Bramble => self.natives.bramble = true,
            HexTerrain::Drift => self.natives.drift = true,
            HexTerrain::Bog => self.natives.bog = true,
            HexTerrain::SandDune => self.natives.sand = true,
            HexTerrain::Slope => self.natives.slope = true,
            HexTerrain::Volcano => self.natives.volcano = true,
            HexTerrain::Open | HexTerrain::Tree => {}
        }
        self
    }

    pub fn is_native(&self, terrain: HexTerrain) -> bool {
        self.natives.is_native(terrain)
    }

    pub fn is_titan(&self) -> bool {
        self.power == PowerSource::DerivedFromOwnerScore
    }

    pub fn effective_power(&self, owner_score: u32, rules: &RulesConfig) -> u32 {
        self.power.resolve(owner_score, rules)
    }

    /// Points scored for killing this creature
    pub fn point_value(&self, owner_score: u32, rules: &RulesConfig) -> u32 {
        self.effective_power(owner_score, rules) * self.skill
    }
}

/// Default creature set
pub fn catalog() -> &'static [Arc<Archetype>] {
    static CATALOG: OnceLock<Vec<Arc<Archetype>>> = OnceLock::new();
    CATALOG.get_or_init(|| {
        use HexTerrain::{Bog, Bramble, Drift, SandDune, Slope, Volcano};
        vec![
            Archetype::new("Angel", 6, 4).flying().lord().summonable(),
            Archetype::new("Archangel", 9, 4).flying().lord().summonable(),
            Archetype::new("Behemoth", 8, 3),
            Archetype::new("Centaur", 3, 4),
            Archetype::new("Colossus", 10, 4),
            Archetype::new("Cyclops", 9, 2),
            Archetype::new("Dragon", 9, 3)
                .flying()
                .rangestriking()
                .native(Volcano)
                .native(Slope),
            Archetype::new("Gargoyle", 4, 3).flying(),
            Archetype::new("Giant", 7, 4).rangestriking(),
            Archetype::new("Gorgon", 6, 3).flying().rangestriking().native(Bramble),
            Archetype::new("Griffon", 5, 4).flying().native(SandDune),
            Archetype::new("Guardian", 12, 2).flying().demilord(),
            Archetype::new("Hydra", 10, 3).rangestriking().native(SandDune).native(Bog),
            Archetype::new("Lion", 5, 3).native(SandDune),
            Archetype::new("Minotaur", 4, 4).rangestriking().native(Slope),
            Archetype::new("Ogre", 6, 2).native(Bog),
            Archetype::new("Ranger", 4, 4).flying().rangestriking().native(Bog),
            Archetype::new("Serpent", 18, 2).native(Bramble),
            Archetype::titan(4),
            Archetype::new("Troll", 8, 2).native(Bog),
            Archetype::new("Unicorn", 12, 3).native(Slope),
            Archetype::new("Warbear", 6, 3).native(Drift),
            Archetype::new("Warlock", 5, 4).magic_missile().lord(),
            Archetype::new("Wyvern", 7, 3).flying().native(Bog),
        ]
        .into_iter()
        .map(Arc::new)
        .collect()
    })
}

/// Look up a default archetype by name (case-insensitive)
pub fn archetype(name: &str) -> Option<Arc<Archetype>> {
    catalog()
        .iter()
        .find(|a| a.name.eq_ignore_ascii_case(name))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lookup() {
        let hydra = archetype("hydra").expect("hydra");
        assert_eq!(hydra.power, PowerSource::Fixed(10));
        assert_eq!(hydra.skill, 3);
        assert!(hydra.rangestriker);
        assert!(hydra.is_native(HexTerrain::SandDune));
        assert!(!hydra.is_native(HexTerrain::Bramble));
        assert!(archetype("Kraken").is_none());
    }

    #[test]
    fn test_titan_power_follows_score() {
        let rules = RulesConfig::default();
        let titan = archetype("Titan").unwrap();
        assert!(titan.is_titan());
        assert!(titan.lord);
        assert_eq!(titan.effective_power(0, &rules), 6);
        assert_eq!(titan.effective_power(250, &rules), 8);
        assert_eq!(titan.point_value(250, &rules), 32);
    }

    #[test]
    fn test_warlock_is_magic_missile_lord() {
        let warlock = archetype("Warlock").unwrap();
        assert!(warlock.rangestriker && warlock.magic_missile && warlock.lord);
    }

    #[test]
    fn test_open_ground_has_no_natives() {
        let dragon = archetype("Dragon").unwrap();
        assert!(!dragon.is_native(HexTerrain::Open));
        assert!(dragon.is_native(HexTerrain::Volcano));
    }
}
