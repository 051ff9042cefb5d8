//! Player progression rules: leveling, reward accrual, and the idempotent
//! grant and state-transition operations built on them.

pub mod error;
pub mod leveling;
pub mod model;
pub mod service;
pub mod store;

pub use error::{Entity, ProgressionError};
pub use model::player::{Account, Player, Reward};
pub use service::PlayerProgressionService;
pub use store::{GrantOutcome, MemoryStore, ProgressionStore, RewardApplied};
