//! Callback processing.
//!
//! A payment callback is only a hint that something happened. The bill is
//! settled on the strength of a fresh order query whose response verifies,
//! and the ledger's check-and-set keeps redeliveries from settling twice.

use std::sync::Arc;

use wxpay_client::ClientError;
use wxpay_core::{from_xml, to_xml, ParameterSet, ReturnCode, TradeState};

use crate::error::{LedgerError, NotifyError};
use crate::gateway::PaymentGateway;
use crate::state_machine::{NotificationEvent, NotificationState, NotificationStateMachine};
use crate::traits::{Ledger, NativeOrderFactory};
use crate::types::{BillCriteria, NotificationOutcome, NotificationResult};

pub const PARAMETER_FORMAT_ERROR: &str = "parameter format error";
pub const BILL_NOT_FOUND: &str = "internal bill not found";
pub const ORDER_QUERY_FAILED: &str = "order query failed";
pub const UNIFIED_ORDER_FAILED: &str = "unified order failed";

/// Tracks one callback through the state machine.
struct Run {
    state: NotificationState,
}

impl Run {
    fn new() -> Self {
        Self {
            state: NotificationState::Received,
        }
    }

    fn advance(&mut self, event: NotificationEvent) -> Result<(), NotifyError> {
        self.state = NotificationStateMachine::transition(self.state, event)?;
        Ok(())
    }

    fn reject(mut self, reason: &str) -> Result<NotificationResult, NotifyError> {
        self.advance(NotificationEvent::Rejected)?;
        tracing::warn!(reason, "callback rejected");
        let reply = ParameterSet::new()
            .with("return_code", ReturnCode::Fail)
            .with("return_msg", reason);
        Ok(NotificationResult {
            outcome: NotificationOutcome::Rejected(reason.to_string()),
            state: self.state,
            settled: false,
            reply: to_xml(&reply),
        })
    }

    fn acknowledge(
        mut self,
        reply: ParameterSet,
        trade_state: TradeState,
        settled: bool,
    ) -> Result<NotificationResult, NotifyError> {
        self.advance(NotificationEvent::Acknowledged)?;
        Ok(NotificationResult {
            outcome: NotificationOutcome::Accepted(trade_state),
            state: self.state,
            settled,
            reply: to_xml(&reply),
        })
    }
}

fn success_reply() -> ParameterSet {
    ParameterSet::new()
        .with("return_code", ReturnCode::Success)
        .with("return_msg", "OK")
}

/// Reconciles provider callbacks with the ledger.
pub struct NotificationProcessor {
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<dyn Ledger>,
}

impl NotificationProcessor {
    pub fn new(gateway: Arc<dyn PaymentGateway>, ledger: Arc<dyn Ledger>) -> Self {
        Self { gateway, ledger }
    }

    /// Process a payment result callback.
    ///
    /// `Ok` always carries a reply to send. `Err` is an internal failure
    /// (transport, ledger storage); reply nothing and let the provider
    /// redeliver.
    pub fn process(&self, raw: &str) -> Result<NotificationResult, NotifyError> {
        let mut run = Run::new();

        let Some(params) = self.decode(raw)? else {
            return run.reject(PARAMETER_FORMAT_ERROR);
        };
        if params.get("return_code") != Some(ReturnCode::Success.as_str()) {
            tracing::warn!(
                return_msg = params.get("return_msg").unwrap_or_default(),
                "callback without return_code SUCCESS"
            );
            return run.reject(PARAMETER_FORMAT_ERROR);
        }
        let (Some(out_trade_no), Some(_)) = (
            non_empty(&params, "out_trade_no"),
            non_empty(&params, "transaction_id"),
        ) else {
            return run.reject(PARAMETER_FORMAT_ERROR);
        };
        run.advance(NotificationEvent::Decoded)?;

        let mut criteria = BillCriteria::new(out_trade_no);
        if let Some(amount) = params.get("total_fee").and_then(|fee| fee.parse::<u64>().ok()) {
            criteria = criteria.with_amount(amount);
        }
        let span = tracing::info_span!("notify", out_trade_no = %criteria.out_trade_no);
        let _guard = span.enter();

        if self.ledger.check_paid_bill(&criteria)? {
            tracing::info!("bill already paid, acknowledging redelivery");
            let reply = self.gateway.sign_reply(success_reply())?;
            return run.acknowledge(reply, TradeState::Success, false);
        }
        if self.ledger.check_not_pay_bill(&criteria)?.is_none() {
            return run.reject(BILL_NOT_FOUND);
        }
        run.advance(NotificationEvent::BillPending)?;

        let confirmed = match self.gateway.query_order(&criteria.out_trade_no) {
            Ok(resp) => resp,
            Err(e @ (ClientError::SignatureInvalid { .. } | ClientError::MalformedResponse(_))) => {
                tracing::warn!(error = %e, "order query unusable");
                return run.reject(ORDER_QUERY_FAILED);
            }
            Err(e) => return Err(e.into()),
        };
        if !confirmed.is_success() {
            tracing::warn!(
                return_msg = confirmed.return_msg().unwrap_or_default(),
                err_code = confirmed.err_code().unwrap_or_default(),
                "order query did not succeed"
            );
            return run.reject(ORDER_QUERY_FAILED);
        }
        let Some(trade_state) = confirmed.get("trade_state").filter(|s| !s.is_empty()) else {
            return run.reject(ORDER_QUERY_FAILED);
        };
        let trade_state = TradeState::from(trade_state);
        run.advance(NotificationEvent::ProviderConfirmed)?;

        let mut settled = false;
        if trade_state.is_paid() {
            let Some(paid_at) = non_empty(confirmed.params(), "time_end")
                .or_else(|| non_empty(&params, "time_end"))
            else {
                tracing::warn!("paid trade without time_end");
                return run.reject(ORDER_QUERY_FAILED);
            };
            match self.ledger.bill_paid(&criteria, paid_at) {
                Ok(()) => settled = true,
                Err(LedgerError::AlreadySettled(_)) => {
                    tracing::info!("bill settled by a concurrent delivery");
                }
                Err(LedgerError::NotFound(_)) => return run.reject(BILL_NOT_FOUND),
                Err(e) => return Err(e.into()),
            }
        } else {
            tracing::info!(trade_state = %trade_state, "trade not paid, acknowledging without settlement");
        }

        let reply = self.gateway.sign_reply(success_reply())?;
        run.acknowledge(reply, trade_state, settled)
    }

    /// Process a scan-to-pay (mode one) callback: place the order the
    /// factory builds and hand its `prepay_id` back to the provider.
    pub fn process_native(
        &self,
        raw: &str,
        factory: &dyn NativeOrderFactory,
    ) -> Result<NotificationResult, NotifyError> {
        let mut run = Run::new();

        let Some(params) = self.decode(raw)? else {
            return run.reject(PARAMETER_FORMAT_ERROR);
        };
        let (Some(product_id), Some(openid)) = (
            non_empty(&params, "product_id"),
            non_empty(&params, "openid"),
        ) else {
            return run.reject(PARAMETER_FORMAT_ERROR);
        };
        run.advance(NotificationEvent::Decoded)?;

        let order = match factory.build_order(product_id, openid) {
            Ok(order) => order,
            Err(reason) => return run.reject(&reason),
        };
        let placed = match self.gateway.place_order(&order) {
            Ok(resp) => resp,
            Err(e) if e.is_transport() => return Err(e.into()),
            Err(e) => {
                tracing::warn!(product_id, error = %e, "unified order failed");
                return run.reject(UNIFIED_ORDER_FAILED);
            }
        };
        let fields = (
            non_empty(placed.params(), "appid"),
            non_empty(placed.params(), "mch_id"),
            non_empty(placed.params(), "prepay_id"),
        );
        let (true, Some(appid), Some(mch_id), Some(prepay_id)) =
            (placed.is_success(), fields.0, fields.1, fields.2)
        else {
            return run.reject(UNIFIED_ORDER_FAILED);
        };
        tracing::info!(product_id, prepay_id, "native order placed");

        let reply = success_reply()
            .with("appid", appid)
            .with("mch_id", mch_id)
            .with("nonce_str", self.gateway.nonce())
            .with("prepay_id", prepay_id)
            .with("result_code", ReturnCode::Success)
            .with("err_code_des", "OK");
        let reply = self.gateway.sign_reply(reply)?;
        run.acknowledge(reply, TradeState::NotPay, false)
    }

    /// Decode a callback body and check its signature. `None` means the body
    /// is not a usable callback. Status fields are left to the caller: the
    /// scan-to-pay callback carries none.
    fn decode(&self, raw: &str) -> Result<Option<ParameterSet>, NotifyError> {
        let params = match from_xml(raw) {
            Ok(params) => params,
            Err(e) => {
                tracing::warn!(error = %e, "callback body not decodable");
                return Ok(None);
            }
        };
        if !self.gateway.verify_callback(&params)? {
            tracing::warn!("callback signature invalid");
            return Ok(None);
        }
        Ok(Some(params))
    }
}

fn non_empty<'a>(params: &'a ParameterSet, key: &str) -> Option<&'a str> {
    params.get(key).filter(|v| !v.is_empty())
}
