//! Payment status state machine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Outcome state of a payment attempt.
///
/// A payment starts `Pending` and settles exactly once: completed and failed
/// are both terminal, so a ledger row can never be credited twice or flip
/// between outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Recorded, awaiting validation and settlement.
    Pending,

    /// Validated and credited to the user's access window.
    Completed,

    /// Rejected (price mismatch or provider failure). Never credited.
    Failed,
}

impl StateMachine for PaymentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use PaymentStatus::*;
        matches!((self, target), (Pending, Completed) | (Pending, Failed))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PaymentStatus::*;
        match self {
            Pending => vec![Completed, Failed],
            Completed | Failed => vec![],
        }
    }
}
