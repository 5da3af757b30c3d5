use wxpay_core::request::UnifiedOrder;

use crate::error::LedgerError;
use crate::types::{Bill, BillCriteria};

/// Billing ledger the processor reconciles callbacks against.
///
/// `check_not_pay_bill` followed by `bill_paid` is not atomic from the
/// processor's side, so `bill_paid` must itself be a check-and-set: it
/// moves an unpaid bill to paid exactly once and reports
/// [`LedgerError::AlreadySettled`] to every later caller.
pub trait Ledger: Send + Sync {
    /// Whether a paid bill matches `criteria`.
    fn check_paid_bill(&self, criteria: &BillCriteria) -> Result<bool, LedgerError>;

    /// The unpaid bill matching `criteria`, if any.
    fn check_not_pay_bill(&self, criteria: &BillCriteria) -> Result<Option<Bill>, LedgerError>;

    /// Mark the bill paid at `paid_at` (`yyyyMMddHHmmss`).
    fn bill_paid(&self, criteria: &BillCriteria, paid_at: &str) -> Result<(), LedgerError>;
}

/// Builds the order for a scan-to-pay (mode one) callback.
pub trait NativeOrderFactory: Send + Sync {
    /// Order for `product_id` scanned by `openid`; `Err` carries the reason
    /// sent back to the provider.
    fn build_order(&self, product_id: &str, openid: &str) -> Result<UnifiedOrder, String>;
}
