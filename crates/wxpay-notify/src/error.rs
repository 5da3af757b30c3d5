use wxpay_client::ClientError;

use crate::state_machine::{NotificationEvent, NotificationState};

/// Errors reported by a ledger implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The bill was settled already, possibly by a concurrent delivery.
    #[error("bill already settled: {0}")]
    AlreadySettled(String),

    /// No bill matches the criteria.
    #[error("bill not found: {0}")]
    NotFound(String),

    #[error("ledger storage error: {0}")]
    Storage(String),
}

/// Genuine internal failures of notification processing.
///
/// These are not rejections: the caller should not reply, so that the
/// provider redelivers the callback later.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("provider call failed: {0}")]
    Client(#[from] ClientError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("invalid notification state transition from {from} on {event:?}")]
    InvalidTransition {
        from: NotificationState,
        event: NotificationEvent,
    },
}
