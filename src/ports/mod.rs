//! Ports - Interfaces for the storage layer.
//!
//! Following hexagonal architecture, ports define the contracts between the
//! lifecycle engine and its backing store. Adapters implement these ports.
//!
//! Storage-level uniqueness constraints are part of the contracts here:
//! conflicts come back as typed outcomes (`Duplicate`, `PairExists`,
//! `SecretCollision`), never as generic errors, because the handlers use them
//! to make idempotency and retry decisions.

mod credential_repository;
mod payment_ledger;
mod user_repository;

pub use credential_repository::{
    CredentialInsertOutcome, CredentialRepository, CredentialRotateOutcome, SecretReplacement,
};
pub use payment_ledger::{PaymentLedger, RecordOutcome, SettleOutcome};
pub use user_repository::{InsertUserOutcome, TrialGrantOutcome, UserRepository};
