pub mod config;
pub mod error;
pub mod types;

pub use config::{load_config, EngineConfig, RulesConfig, RunnerConfig};
pub use error::{BattleError, Result};
pub use types::{BattleId, PlayerId, SideRole, TagAllocator, UnitTag};
