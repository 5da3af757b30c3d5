use dashmap::DashMap;

use crate::error::LedgerError;
use crate::traits::Ledger;
use crate::types::{Bill, BillCriteria, BillStatus};

/// Process-local ledger keyed by trade number.
///
/// `bill_paid` flips a bill from unpaid to paid while holding the entry's
/// shard lock, so concurrent deliveries settle it exactly once.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    bills: DashMap<String, Bill>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bills(bills: impl IntoIterator<Item = Bill>) -> Self {
        let ledger = Self::new();
        for bill in bills {
            ledger.insert(bill);
        }
        ledger
    }

    /// Add or replace a bill.
    pub fn insert(&self, bill: Bill) {
        self.bills.insert(bill.out_trade_no.clone(), bill);
    }

    pub fn get(&self, out_trade_no: &str) -> Option<Bill> {
        self.bills.get(out_trade_no).map(|b| b.clone())
    }

    /// Snapshot of every bill, ordered by trade number.
    pub fn bills(&self) -> Vec<Bill> {
        let mut bills: Vec<Bill> = self.bills.iter().map(|b| b.value().clone()).collect();
        bills.sort_by(|a, b| a.out_trade_no.cmp(&b.out_trade_no));
        bills
    }

    fn find(&self, criteria: &BillCriteria, status: BillStatus) -> Option<Bill> {
        self.bills
            .get(&criteria.out_trade_no)
            .filter(|bill| bill.matches(criteria) && bill.status == status)
            .map(|bill| bill.clone())
    }
}

impl Ledger for InMemoryLedger {
    fn check_paid_bill(&self, criteria: &BillCriteria) -> Result<bool, LedgerError> {
        Ok(self.find(criteria, BillStatus::Paid).is_some())
    }

    fn check_not_pay_bill(&self, criteria: &BillCriteria) -> Result<Option<Bill>, LedgerError> {
        Ok(self.find(criteria, BillStatus::Unpaid))
    }

    fn bill_paid(&self, criteria: &BillCriteria, paid_at: &str) -> Result<(), LedgerError> {
        let mut bill = self
            .bills
            .get_mut(&criteria.out_trade_no)
            .filter(|bill| bill.matches(criteria))
            .ok_or_else(|| LedgerError::NotFound(criteria.out_trade_no.clone()))?;
        if bill.status == BillStatus::Paid {
            return Err(LedgerError::AlreadySettled(criteria.out_trade_no.clone()));
        }
        bill.status = BillStatus::Paid;
        bill.paid_at = Some(paid_at.to_string());
        tracing::info!(out_trade_no = %criteria.out_trade_no, paid_at, "bill settled");
        Ok(())
    }
}
