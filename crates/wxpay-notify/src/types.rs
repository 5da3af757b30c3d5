use serde::{Deserialize, Serialize};
use wxpay_core::TradeState;

use crate::state_machine::NotificationState;

/// Reconciliation key for a callback.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillCriteria {
    pub out_trade_no: String,
    /// Amount in fen, when the callback carried a usable `total_fee`.
    pub final_amount: Option<u64>,
}

impl BillCriteria {
    pub fn new(out_trade_no: impl Into<String>) -> Self {
        Self {
            out_trade_no: out_trade_no.into(),
            final_amount: None,
        }
    }

    pub fn with_amount(mut self, final_amount: u64) -> Self {
        self.final_amount = Some(final_amount);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    Unpaid,
    Paid,
}

/// A bill as the ledger knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    pub out_trade_no: String,
    /// Amount due in fen.
    pub final_amount: u64,
    pub status: BillStatus,
    /// Provider completion time (`yyyyMMddHHmmss`) once paid.
    #[serde(default)]
    pub paid_at: Option<String>,
}

impl Bill {
    pub fn unpaid(out_trade_no: impl Into<String>, final_amount: u64) -> Self {
        Self {
            out_trade_no: out_trade_no.into(),
            final_amount,
            status: BillStatus::Unpaid,
            paid_at: None,
        }
    }

    /// Whether this bill is the one `criteria` describes.
    pub fn matches(&self, criteria: &BillCriteria) -> bool {
        self.out_trade_no == criteria.out_trade_no
            && criteria.final_amount.map_or(true, |amount| amount == self.final_amount)
    }
}

/// Per-callback result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// Acknowledged; carries the provider-confirmed trade state.
    Accepted(TradeState),
    /// Refused with the reason sent back in `return_msg`.
    Rejected(String),
}

impl NotificationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Everything the web layer needs to answer a callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationResult {
    pub outcome: NotificationOutcome,
    /// Terminal state reached: `Replied` or `Rejected`.
    pub state: NotificationState,
    /// Whether this delivery moved a bill to paid.
    pub settled: bool,
    /// XML reply body to send back verbatim.
    pub reply: String,
}
