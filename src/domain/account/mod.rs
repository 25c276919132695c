//! Account domain module.
//!
//! Owns the User aggregate and the derived subscription status.
//!
//! # Module Structure
//!
//! - `user` - User aggregate entity and access-window operations
//! - `status` - SubscriptionStatus derivation (display only)
//! - `errors` - Account-specific error types

mod errors;
mod status;
mod user;

pub use errors::AccountError;
pub use status::SubscriptionStatus;
pub use user::User;
