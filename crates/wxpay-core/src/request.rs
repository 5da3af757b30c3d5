//! Typed request records, one per provider operation.
//!
//! Required fields are constructor arguments; optional ones are set with
//! builder methods. `validate` catches what the type system cannot, such as
//! empty strings or a field that only one trade type needs.

use crate::operation::Operation;
use crate::params::{MissingFields, ParameterSet};
use crate::types::TradeType;

/// A request record that can be dispatched.
pub trait PayRequest {
    /// The endpoint this record is sent to.
    fn operation(&self) -> Operation;

    /// Caller-supplied fields, before identity fields and the signature.
    fn to_params(&self) -> ParameterSet;

    /// Check the record before it is sent.
    fn validate(&self) -> Result<(), MissingFields> {
        self.to_params().require(self.operation().required_fields())
    }
}

/// Reference to an order: the merchant's trade number or the provider's
/// transaction id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeRef {
    OutTradeNo(String),
    TransactionId(String),
}

impl TradeRef {
    fn apply(&self, params: &mut ParameterSet) {
        match self {
            Self::OutTradeNo(no) => params.insert("out_trade_no", no),
            Self::TransactionId(id) => params.insert("transaction_id", id),
        };
    }

    fn key(&self) -> &'static str {
        match self {
            Self::OutTradeNo(_) => "out_trade_no",
            Self::TransactionId(_) => "transaction_id",
        }
    }
}

/// Reference to a refund for the refund query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefundRef {
    OutRefundNo(String),
    RefundId(String),
    OutTradeNo(String),
    TransactionId(String),
}

impl RefundRef {
    fn key(&self) -> &'static str {
        match self {
            Self::OutRefundNo(_) => "out_refund_no",
            Self::RefundId(_) => "refund_id",
            Self::OutTradeNo(_) => "out_trade_no",
            Self::TransactionId(_) => "transaction_id",
        }
    }

    fn value(&self) -> &str {
        match self {
            Self::OutRefundNo(v) | Self::RefundId(v) | Self::OutTradeNo(v) | Self::TransactionId(v) => v,
        }
    }
}

/// Place an order (`/pay/unifiedorder`).
#[derive(Debug, Clone)]
pub struct UnifiedOrder {
    pub body: String,
    pub out_trade_no: String,
    /// Amount in fen.
    pub total_fee: u64,
    pub spbill_create_ip: String,
    pub trade_type: TradeType,
    pub notify_url: Option<String>,
    pub openid: Option<String>,
    pub product_id: Option<String>,
    pub attach: Option<String>,
    pub time_start: Option<String>,
    pub time_expire: Option<String>,
    /// Rarely used optional fields (`detail`, `goods_tag`, `limit_pay`, ...).
    pub extra: ParameterSet,
}

impl UnifiedOrder {
    pub fn new(
        body: impl Into<String>,
        out_trade_no: impl Into<String>,
        total_fee: u64,
        spbill_create_ip: impl Into<String>,
        trade_type: TradeType,
    ) -> Self {
        Self {
            body: body.into(),
            out_trade_no: out_trade_no.into(),
            total_fee,
            spbill_create_ip: spbill_create_ip.into(),
            trade_type,
            notify_url: None,
            openid: None,
            product_id: None,
            attach: None,
            time_start: None,
            time_expire: None,
            extra: ParameterSet::new(),
        }
    }

    pub fn openid(mut self, openid: impl Into<String>) -> Self {
        self.openid = Some(openid.into());
        self
    }

    pub fn product_id(mut self, product_id: impl Into<String>) -> Self {
        self.product_id = Some(product_id.into());
        self
    }

    pub fn notify_url(mut self, url: impl Into<String>) -> Self {
        self.notify_url = Some(url.into());
        self
    }

    pub fn attach(mut self, attach: impl Into<String>) -> Self {
        self.attach = Some(attach.into());
        self
    }

    pub fn time_window(mut self, start: impl Into<String>, expire: impl Into<String>) -> Self {
        self.time_start = Some(start.into());
        self.time_expire = Some(expire.into());
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.extra.insert(key, value);
        self
    }
}

impl PayRequest for UnifiedOrder {
    fn operation(&self) -> Operation {
        Operation::UnifiedOrder
    }

    fn to_params(&self) -> ParameterSet {
        let mut params = self.extra.clone();
        params.insert("body", &self.body);
        params.insert("out_trade_no", &self.out_trade_no);
        params.insert("total_fee", self.total_fee);
        params.insert("spbill_create_ip", &self.spbill_create_ip);
        params.insert("trade_type", self.trade_type);
        params.insert_opt("notify_url", self.notify_url.as_ref());
        params.insert_opt("openid", self.openid.as_ref());
        params.insert_opt("product_id", self.product_id.as_ref());
        params.insert_opt("attach", self.attach.as_ref());
        params.insert_opt("time_start", self.time_start.as_ref());
        params.insert_opt("time_expire", self.time_expire.as_ref());
        params
    }

    // notify_url may still come from configuration, so it is checked after
    // identity fields are merged.
    fn validate(&self) -> Result<(), MissingFields> {
        let params = self.to_params();
        let mut required = vec!["body", "out_trade_no", "spbill_create_ip"];
        match self.trade_type {
            TradeType::Jsapi => required.push("openid"),
            TradeType::Native => required.push("product_id"),
            TradeType::App | TradeType::Mweb => {}
        }
        params.require(&required)
    }
}

/// Query an order (`/pay/orderquery`).
#[derive(Debug, Clone)]
pub struct OrderQuery {
    pub trade: TradeRef,
}

impl OrderQuery {
    pub fn new(trade: TradeRef) -> Self {
        Self { trade }
    }

    pub fn by_out_trade_no(out_trade_no: impl Into<String>) -> Self {
        Self::new(TradeRef::OutTradeNo(out_trade_no.into()))
    }
}

impl PayRequest for OrderQuery {
    fn operation(&self) -> Operation {
        Operation::OrderQuery
    }

    fn to_params(&self) -> ParameterSet {
        let mut params = ParameterSet::new();
        self.trade.apply(&mut params);
        params
    }

    fn validate(&self) -> Result<(), MissingFields> {
        self.to_params().require(&[self.trade.key()])
    }
}

/// Close an unpaid order (`/pay/closeorder`).
#[derive(Debug, Clone)]
pub struct CloseOrder {
    pub out_trade_no: String,
}

impl CloseOrder {
    pub fn new(out_trade_no: impl Into<String>) -> Self {
        Self {
            out_trade_no: out_trade_no.into(),
        }
    }
}

impl PayRequest for CloseOrder {
    fn operation(&self) -> Operation {
        Operation::CloseOrder
    }

    fn to_params(&self) -> ParameterSet {
        ParameterSet::new().with("out_trade_no", &self.out_trade_no)
    }
}

/// Refund a paid order (`/secapi/pay/refund`, client certificate required).
#[derive(Debug, Clone)]
pub struct Refund {
    pub trade: TradeRef,
    pub out_refund_no: String,
    pub total_fee: u64,
    pub refund_fee: u64,
    pub op_user_id: String,
    pub refund_fee_type: Option<String>,
}

impl Refund {
    pub fn new(
        trade: TradeRef,
        out_refund_no: impl Into<String>,
        total_fee: u64,
        refund_fee: u64,
        op_user_id: impl Into<String>,
    ) -> Self {
        Self {
            trade,
            out_refund_no: out_refund_no.into(),
            total_fee,
            refund_fee,
            op_user_id: op_user_id.into(),
            refund_fee_type: None,
        }
    }
}

impl PayRequest for Refund {
    fn operation(&self) -> Operation {
        Operation::Refund
    }

    fn to_params(&self) -> ParameterSet {
        let mut params = ParameterSet::new()
            .with("out_refund_no", &self.out_refund_no)
            .with("total_fee", self.total_fee)
            .with("refund_fee", self.refund_fee)
            .with("op_user_id", &self.op_user_id);
        params.insert_opt("refund_fee_type", self.refund_fee_type.as_ref());
        self.trade.apply(&mut params);
        params
    }

    fn validate(&self) -> Result<(), MissingFields> {
        let mut required = Operation::Refund.required_fields().to_vec();
        required.push(self.trade.key());
        self.to_params().require(&required)
    }
}

/// Query refund progress (`/pay/refundquery`).
#[derive(Debug, Clone)]
pub struct RefundQuery {
    pub by: RefundRef,
}

impl RefundQuery {
    pub fn new(by: RefundRef) -> Self {
        Self { by }
    }
}

impl PayRequest for RefundQuery {
    fn operation(&self) -> Operation {
        Operation::RefundQuery
    }

    fn to_params(&self) -> ParameterSet {
        ParameterSet::new().with(self.by.key(), self.by.value())
    }

    fn validate(&self) -> Result<(), MissingFields> {
        self.to_params().require(&[self.by.key()])
    }
}

/// Download the statement for one day (`/pay/downloadbill`).
#[derive(Debug, Clone)]
pub struct DownloadBill {
    /// `yyyyMMdd`.
    pub bill_date: String,
    /// `ALL`, `SUCCESS`, `REFUND` or `REVOKED`; the provider defaults to `ALL`.
    pub bill_type: Option<String>,
}

impl DownloadBill {
    pub fn new(bill_date: impl Into<String>) -> Self {
        Self {
            bill_date: bill_date.into(),
            bill_type: None,
        }
    }

    pub fn bill_type(mut self, bill_type: impl Into<String>) -> Self {
        self.bill_type = Some(bill_type.into());
        self
    }
}

impl PayRequest for DownloadBill {
    fn operation(&self) -> Operation {
        Operation::DownloadBill
    }

    fn to_params(&self) -> ParameterSet {
        let mut params = ParameterSet::new().with("bill_date", &self.bill_date);
        params.insert_opt("bill_type", self.bill_type.as_ref());
        params
    }
}

/// Charge a payer's barcode at the counter (`/pay/micropay`).
#[derive(Debug, Clone)]
pub struct MicroPay {
    pub body: String,
    pub out_trade_no: String,
    pub total_fee: u64,
    pub auth_code: String,
    pub spbill_create_ip: String,
    pub extra: ParameterSet,
}

impl MicroPay {
    pub fn new(
        body: impl Into<String>,
        out_trade_no: impl Into<String>,
        total_fee: u64,
        auth_code: impl Into<String>,
        spbill_create_ip: impl Into<String>,
    ) -> Self {
        Self {
            body: body.into(),
            out_trade_no: out_trade_no.into(),
            total_fee,
            auth_code: auth_code.into(),
            spbill_create_ip: spbill_create_ip.into(),
            extra: ParameterSet::new(),
        }
    }
}

impl PayRequest for MicroPay {
    fn operation(&self) -> Operation {
        Operation::MicroPay
    }

    fn to_params(&self) -> ParameterSet {
        let mut params = self.extra.clone();
        params.insert("body", &self.body);
        params.insert("out_trade_no", &self.out_trade_no);
        params.insert("total_fee", self.total_fee);
        params.insert("auth_code", &self.auth_code);
        params.insert("spbill_create_ip", &self.spbill_create_ip);
        params
    }
}

/// Reverse a counter payment (`/secapi/pay/reverse`, client certificate required).
#[derive(Debug, Clone)]
pub struct Reverse {
    pub trade: TradeRef,
}

impl Reverse {
    pub fn new(trade: TradeRef) -> Self {
        Self { trade }
    }
}

impl PayRequest for Reverse {
    fn operation(&self) -> Operation {
        Operation::Reverse
    }

    fn to_params(&self) -> ParameterSet {
        let mut params = ParameterSet::new();
        self.trade.apply(&mut params);
        params
    }

    fn validate(&self) -> Result<(), MissingFields> {
        self.to_params().require(&[self.trade.key()])
    }
}

/// Timing report for one API call (`/payitil/report`).
#[derive(Debug, Clone)]
pub struct Report {
    pub interface_url: String,
    pub execute_time_ms: u64,
    pub return_code: String,
    pub result_code: String,
    pub user_ip: String,
    /// `yyyyMMddHHmmss`.
    pub time: String,
    pub return_msg: Option<String>,
    pub err_code: Option<String>,
    pub err_code_des: Option<String>,
    pub out_trade_no: Option<String>,
    pub device_info: Option<String>,
}

impl PayRequest for Report {
    fn operation(&self) -> Operation {
        Operation::Report
    }

    fn to_params(&self) -> ParameterSet {
        let mut params = ParameterSet::new()
            .with("interface_url", &self.interface_url)
            .with("execute_time_", self.execute_time_ms)
            .with("return_code", &self.return_code)
            .with("result_code", &self.result_code)
            .with("user_ip", &self.user_ip)
            .with("time", &self.time);
        params.insert_opt("return_msg", self.return_msg.as_ref());
        params.insert_opt("err_code", self.err_code.as_ref());
        params.insert_opt("err_code_des", self.err_code_des.as_ref());
        params.insert_opt("out_trade_no", self.out_trade_no.as_ref());
        params.insert_opt("device_info", self.device_info.as_ref());
        params
    }
}
