//! Payment operation handlers.

mod confirm;
mod precheck;

pub use confirm::{ConfirmPaymentCommand, ConfirmPaymentHandler, ConfirmPaymentResult, RejectReason};
pub use precheck::{PrecheckCommand, PrecheckHandler, PrecheckRejectReason, PrecheckResult};
