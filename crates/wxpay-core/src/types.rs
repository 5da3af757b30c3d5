use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::params::ParameterSet;

/// `return_code` / `result_code` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReturnCode {
    Success,
    Fail,
}

impl ReturnCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Fail => "FAIL",
        }
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReturnCode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(Self::Success),
            "FAIL" => Ok(Self::Fail),
            other => Err(CoreError::InvalidValue {
                field: "return_code".into(),
                value: other.into(),
            }),
        }
    }
}

/// Payment state of an order as reported by the order query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeState {
    /// Paid.
    Success,
    /// Moved to refund.
    Refund,
    /// Not paid yet.
    NotPay,
    /// Closed by the merchant.
    Closed,
    /// Reversed (micropay).
    Revoked,
    /// Waiting for the payer to enter a password.
    UserPaying,
    /// Payment failed at the bank.
    PayError,
    /// A state this client does not know about.
    Other(String),
}

impl TradeState {
    pub fn is_paid(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "SUCCESS",
            Self::Refund => "REFUND",
            Self::NotPay => "NOTPAY",
            Self::Closed => "CLOSED",
            Self::Revoked => "REVOKED",
            Self::UserPaying => "USERPAYING",
            Self::PayError => "PAYERROR",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for TradeState {
    fn from(s: &str) -> Self {
        match s {
            "SUCCESS" => Self::Success,
            "REFUND" => Self::Refund,
            "NOTPAY" => Self::NotPay,
            "CLOSED" => Self::Closed,
            "REVOKED" => Self::Revoked,
            "USERPAYING" => Self::UserPaying,
            "PAYERROR" => Self::PayError,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for TradeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the payer pays for a unified order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeType {
    /// In-app browser payment; requires `openid`.
    Jsapi,
    /// Scan-to-pay QR code; requires `product_id`.
    Native,
    /// Mobile app payment.
    App,
    /// Mobile web payment.
    Mweb,
}

impl TradeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jsapi => "JSAPI",
            Self::Native => "NATIVE",
            Self::App => "APP",
            Self::Mweb => "MWEB",
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "JSAPI" => Ok(Self::Jsapi),
            "NATIVE" => Ok(Self::Native),
            "APP" => Ok(Self::App),
            "MWEB" => Ok(Self::Mweb),
            _ => Err(CoreError::InvalidValue {
                field: "trade_type".into(),
                value: s.into(),
            }),
        }
    }
}

/// A decoded provider frame with its status fields parsed.
///
/// `return_code` is always present; `result_code` only accompanies a
/// `return_code` of SUCCESS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResponse {
    return_code: ReturnCode,
    result_code: Option<ReturnCode>,
    params: ParameterSet,
}

impl ProviderResponse {
    /// Wrap a decoded frame, failing if `return_code` is missing or unknown.
    pub fn from_params(params: ParameterSet) -> Result<Self, CoreError> {
        let return_code = params
            .get("return_code")
            .ok_or_else(|| CoreError::MalformedResponse("missing return_code".into()))?
            .parse()
            .map_err(|_| CoreError::MalformedResponse("unknown return_code".into()))?;
        let result_code = match params.get("result_code") {
            Some(code) => Some(
                code.parse()
                    .map_err(|_| CoreError::MalformedResponse("unknown result_code".into()))?,
            ),
            None => None,
        };
        Ok(Self {
            return_code,
            result_code,
            params,
        })
    }

    pub fn return_code(&self) -> ReturnCode {
        self.return_code
    }

    pub fn result_code(&self) -> Option<ReturnCode> {
        self.result_code
    }

    /// Both the transport and the business level succeeded.
    pub fn is_success(&self) -> bool {
        self.return_code == ReturnCode::Success && self.result_code == Some(ReturnCode::Success)
    }

    pub fn return_msg(&self) -> Option<&str> {
        self.params.get("return_msg")
    }

    pub fn err_code(&self) -> Option<&str> {
        self.params.get("err_code")
    }

    pub fn err_code_des(&self) -> Option<&str> {
        self.params.get("err_code_des")
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key)
    }

    /// Look up a field that must be present and non-empty.
    pub fn require(&self, key: &str) -> Result<&str, CoreError> {
        self.params
            .get(key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| CoreError::MissingField(key.to_string()))
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn into_params(self) -> ParameterSet {
        self.params
    }
}
