//! Typed views over verified provider responses.

use crate::error::CoreError;
use crate::types::{ProviderResponse, TradeState};

/// Build a typed record from a verified, successful response.
pub trait FromResponse: Sized {
    fn from_response(resp: &ProviderResponse) -> Result<Self, CoreError>;
}

fn optional(resp: &ProviderResponse, key: &str) -> Option<String> {
    resp.get(key).filter(|v| !v.is_empty()).map(str::to_owned)
}

fn parse_fee(resp: &ProviderResponse, key: &str) -> Result<u64, CoreError> {
    let raw = resp.require(key)?;
    raw.parse().map_err(|_| CoreError::InvalidValue {
        field: key.to_string(),
        value: raw.to_string(),
    })
}

/// Result of a unified order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnifiedOrderResponse {
    pub prepay_id: String,
    pub trade_type: String,
    /// QR code payload for NATIVE orders.
    pub code_url: Option<String>,
}

impl FromResponse for UnifiedOrderResponse {
    fn from_response(resp: &ProviderResponse) -> Result<Self, CoreError> {
        Ok(Self {
            prepay_id: resp.require("prepay_id")?.to_string(),
            trade_type: resp.require("trade_type")?.to_string(),
            code_url: optional(resp, "code_url"),
        })
    }
}

/// Result of an order query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQueryResponse {
    pub out_trade_no: String,
    pub trade_state: TradeState,
    pub transaction_id: Option<String>,
    pub total_fee: Option<u64>,
    /// Completion time, `yyyyMMddHHmmss`; present once paid.
    pub time_end: Option<String>,
    pub trade_state_desc: Option<String>,
}

impl FromResponse for OrderQueryResponse {
    fn from_response(resp: &ProviderResponse) -> Result<Self, CoreError> {
        let total_fee = match resp.get("total_fee") {
            Some(_) => Some(parse_fee(resp, "total_fee")?),
            None => None,
        };
        Ok(Self {
            out_trade_no: resp.require("out_trade_no")?.to_string(),
            trade_state: TradeState::from(resp.require("trade_state")?),
            transaction_id: optional(resp, "transaction_id"),
            total_fee,
            time_end: optional(resp, "time_end"),
            trade_state_desc: optional(resp, "trade_state_desc"),
        })
    }
}

/// Result of a refund request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundResponse {
    pub out_refund_no: String,
    pub refund_id: String,
    pub refund_fee: u64,
}

impl FromResponse for RefundResponse {
    fn from_response(resp: &ProviderResponse) -> Result<Self, CoreError> {
        Ok(Self {
            out_refund_no: resp.require("out_refund_no")?.to_string(),
            refund_id: resp.require("refund_id")?.to_string(),
            refund_fee: parse_fee(resp, "refund_fee")?,
        })
    }
}
