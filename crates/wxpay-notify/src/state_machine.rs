use std::fmt;

use crate::error::NotifyError;

/// Stages a callback moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum NotificationState {
    /// Raw body received.
    Received,
    /// Body decoded and its signature checked.
    Parsed,
    /// A pending bill matches the callback.
    LedgerChecked,
    /// A fresh, verified order query confirmed the trade.
    ProviderConfirmed,
    /// Success reply produced. Final state.
    Replied,
    /// Failure reply produced. Final state.
    Rejected,
}

impl NotificationState {
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Replied | Self::Rejected)
    }
}

impl fmt::Display for NotificationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Received => write!(f, "Received"),
            Self::Parsed => write!(f, "Parsed"),
            Self::LedgerChecked => write!(f, "LedgerChecked"),
            Self::ProviderConfirmed => write!(f, "ProviderConfirmed"),
            Self::Replied => write!(f, "Replied"),
            Self::Rejected => write!(f, "Rejected"),
        }
    }
}

/// Events that move a callback forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationEvent {
    /// The body decoded and verified.
    Decoded,
    /// The ledger holds a matching unpaid bill.
    BillPending,
    /// The order query verified and reported a trade state.
    ProviderConfirmed,
    /// A success reply was produced.
    Acknowledged,
    /// A gate failed.
    Rejected,
}

/// Valid transitions:
/// - Received → Parsed (Decoded)
/// - Parsed → LedgerChecked (BillPending)
/// - Parsed → Replied (Acknowledged; bill already paid, or a native order placed)
/// - LedgerChecked → ProviderConfirmed (ProviderConfirmed)
/// - ProviderConfirmed → Replied (Acknowledged)
/// - any non-final state → Rejected (Rejected)
pub struct NotificationStateMachine;

impl NotificationStateMachine {
    pub fn transition(
        current: NotificationState,
        event: NotificationEvent,
    ) -> Result<NotificationState, NotifyError> {
        use NotificationEvent as E;
        use NotificationState as S;

        let next = match (current, event) {
            (S::Received, E::Decoded) => S::Parsed,
            (S::Parsed, E::BillPending) => S::LedgerChecked,
            (S::Parsed, E::Acknowledged) => S::Replied,
            (S::LedgerChecked, E::ProviderConfirmed) => S::ProviderConfirmed,
            (S::ProviderConfirmed, E::Acknowledged) => S::Replied,
            (state, E::Rejected) if !state.is_final() => S::Rejected,
            (from, event) => return Err(NotifyError::InvalidTransition { from, event }),
        };

        tracing::debug!(from = %current, to = %next, ?event, "notification state transition");
        Ok(next)
    }
}
