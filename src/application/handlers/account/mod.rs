//! Account operation handlers.

mod grant_trial;
mod start;

pub use grant_trial::{GrantTrialCommand, GrantTrialHandler, GrantTrialResult};
pub use start::{StartCommand, StartHandler, StartResult};
