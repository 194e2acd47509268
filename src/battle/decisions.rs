//! Decision port: choices the striking player makes during a strike
//!
//! The engine blocks on these calls. Human front ends should fall back to a
//! default answer rather than stall a battle indefinitely.

use serde::{Deserialize, Serialize};

use crate::battle::field::Field;
use crate::core::types::{PlayerId, SideRole, UnitTag};

/// "Accept this penalty to allow carrying to these units?"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryPenaltyOffer {
    pub side: SideRole,
    pub player: PlayerId,
    pub striker: UnitTag,
    pub target: UnitTag,
    /// Dice the strike would roll after accepting
    pub dice: u32,
    /// Strike number the strike would need after accepting
    pub strike_number: u32,
    pub carry_targets: Vec<UnitTag>,
}

/// Which eligible unit receives the carried damage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryChoice {
    pub side: SideRole,
    pub player: PlayerId,
    pub striker: UnitTag,
    pub carry_pool: u32,
    pub targets: Vec<UnitTag>,
}

pub trait DecisionPort {
    fn offer_carry_penalty(&mut self, field: &Field, offer: &CarryPenaltyOffer) -> bool;

    /// Must return one of `choice.targets`; anything else falls back to the first
    fn choose_carry_target(&mut self, field: &Field, choice: &CarryChoice) -> UnitTag;
}

/// Takes every penalty offered
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAccept;

impl DecisionPort for AlwaysAccept {
    fn offer_carry_penalty(&mut self, _field: &Field, _offer: &CarryPenaltyOffer) -> bool {
        true
    }

    fn choose_carry_target(&mut self, _field: &Field, choice: &CarryChoice) -> UnitTag {
        choice.targets[0]
    }
}

/// Refuses every penalty
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverAccept;

impl DecisionPort for NeverAccept {
    fn offer_carry_penalty(&mut self, _field: &Field, _offer: &CarryPenaltyOffer) -> bool {
        false
    }

    fn choose_carry_target(&mut self, _field: &Field, choice: &CarryChoice) -> UnitTag {
        choice.targets[0]
    }
}

/// Records offers and answers from a fixed script; used to inspect prompts
#[derive(Debug, Clone, Default)]
pub struct RecordingDecisions {
    pub answers: Vec<bool>,
    pub offers: Vec<CarryPenaltyOffer>,
    pub choices: Vec<CarryChoice>,
}

impl RecordingDecisions {
    pub fn answering(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            ..Self::default()
        }
    }
}

impl DecisionPort for RecordingDecisions {
    fn offer_carry_penalty(&mut self, _field: &Field, offer: &CarryPenaltyOffer) -> bool {
        let answer = self.answers.get(self.offers.len()).copied().unwrap_or(false);
        self.offers.push(offer.clone());
        answer
    }

    fn choose_carry_target(&mut self, _field: &Field, choice: &CarryChoice) -> UnitTag {
        self.choices.push(choice.clone());
        choice.targets[0]
    }
}
