use thiserror::Error;

use crate::battle::execution::BattlePhase;
use crate::core::types::{SideRole, UnitTag};

#[derive(Error, Debug)]
pub enum BattleError {
    #[error("Illegal strike: {0}")]
    IllegalStrike(String),

    #[error("Illegal move: {0}")]
    IllegalMove(String),

    #[error("{operation} is not allowed during {phase:?} with {active:?} active")]
    PhaseMisuse {
        operation: &'static str,
        phase: BattlePhase,
        active: SideRole,
    },

    #[error("Unit not found: {0}")]
    UnknownUnit(UnitTag),

    #[error("Hex not found: {0}")]
    UnknownHex(String),

    #[error("Invalid battle setup: {0}")]
    InvalidSetup(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BattleError>;
