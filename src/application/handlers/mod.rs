//! Application handlers - one per inbound operation.
//!
//! Handlers follow a command/query pattern: each takes a command struct,
//! returns an outcome-typed result, and talks to storage through ports only.

pub mod account;
pub mod payment;
pub mod proxy;
