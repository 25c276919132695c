//! Adapters - concrete implementations of the storage ports.
//!
//! - `postgres` - production persistence via sqlx
//! - `memory` - single-process store for tests and embedded use

pub mod memory;
pub mod postgres;
