//! Application layer - operation handlers and their composition.
//!
//! One handler per inbound operation, each returning an outcome-typed result;
//! the [`engine::LifecycleEngine`] facade composes them into the narrow
//! interface the transport collaborator calls.

pub mod access_gate;
pub mod credential_issuer;
pub mod engine;
pub mod handlers;

pub use access_gate::{AccessDecision, AccessGate, DenyReason};
pub use credential_issuer::CredentialIssuer;
pub use engine::LifecycleEngine;
