//! wxpay notify
//!
//! Turns an inbound payment callback into a settlement decision and the
//! exact reply frame the provider expects. Settlement is only authorised by
//! a fresh, verified order query, never by the callback body itself.

pub mod error;
pub mod types;
pub mod traits;
pub mod gateway;
pub mod state_machine;
pub mod processor;
pub mod adapters;

pub use error::{LedgerError, NotifyError};
pub use types::{Bill, BillCriteria, BillStatus, NotificationOutcome, NotificationResult};
pub use traits::{Ledger, NativeOrderFactory};
pub use gateway::PaymentGateway;
pub use state_machine::{NotificationEvent, NotificationState, NotificationStateMachine};
pub use processor::NotificationProcessor;
pub use adapters::memory::InMemoryLedger;
