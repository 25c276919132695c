//! PostgreSQL adapters.
//!
//! One repository per aggregate, all sharing a `PgPool`. The schema-level
//! uniqueness constraints these adapters rely on live in `migrations/`.

mod credential_repository;
mod payment_ledger;
mod user_repository;

pub use credential_repository::PostgresCredentialRepository;
pub use payment_ledger::PostgresPaymentLedger;
pub use user_repository::PostgresUserRepository;
