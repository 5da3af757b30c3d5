use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Endpoints of the merchant API this client speaks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    UnifiedOrder,
    OrderQuery,
    CloseOrder,
    Refund,
    RefundQuery,
    DownloadBill,
    MicroPay,
    Reverse,
    ShortUrl,
    Report,
    GetSignKey,
}

impl Operation {
    /// Path below the API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Self::UnifiedOrder => "/pay/unifiedorder",
            Self::OrderQuery => "/pay/orderquery",
            Self::CloseOrder => "/pay/closeorder",
            Self::Refund => "/secapi/pay/refund",
            Self::RefundQuery => "/pay/refundquery",
            Self::DownloadBill => "/pay/downloadbill",
            Self::MicroPay => "/pay/micropay",
            Self::Reverse => "/secapi/pay/reverse",
            Self::ShortUrl => "/tools/shorturl",
            Self::Report => "/payitil/report",
            Self::GetSignKey => "/sandboxnew/pay/getsignkey",
        }
    }

    /// Whether the provider demands a client certificate (mutual TLS).
    pub fn requires_client_cert(&self) -> bool {
        matches!(self, Self::Refund | Self::RefundQuery | Self::Reverse)
    }

    /// Timeout used when the caller does not pick one.
    pub fn default_timeout(&self) -> Duration {
        match self {
            Self::MicroPay => Duration::from_secs(10),
            Self::Report => Duration::from_secs(1),
            _ => Duration::from_secs(6),
        }
    }

    /// Whether the path moves under the sandbox namespace in sandbox mode.
    /// The key-issuing endpoint already lives there; short URLs have no
    /// sandbox counterpart.
    pub fn is_sandboxed(&self) -> bool {
        !matches!(self, Self::GetSignKey | Self::ShortUrl)
    }

    /// Whether the request carries `appid`. The sandbox key request is
    /// identified by merchant id alone.
    pub fn includes_app_id(&self) -> bool {
        !matches!(self, Self::GetSignKey)
    }

    /// Whether the call is timed and reported back to the provider.
    pub fn is_reported(&self) -> bool {
        !matches!(self, Self::Report | Self::DownloadBill)
    }

    /// Fields that must be present after identity fields are merged in.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Self::UnifiedOrder => &[
                "body",
                "out_trade_no",
                "total_fee",
                "spbill_create_ip",
                "trade_type",
                "notify_url",
            ],
            Self::CloseOrder => &["out_trade_no"],
            Self::Refund => &["out_refund_no", "total_fee", "refund_fee", "op_user_id"],
            Self::DownloadBill => &["bill_date"],
            Self::MicroPay => &[
                "body",
                "out_trade_no",
                "total_fee",
                "auth_code",
                "spbill_create_ip",
            ],
            Self::ShortUrl => &["long_url"],
            Self::Report => &[
                "interface_url",
                "execute_time_",
                "return_code",
                "result_code",
                "user_ip",
                "time",
            ],
            Self::OrderQuery | Self::RefundQuery | Self::Reverse | Self::GetSignKey => &[],
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UnifiedOrder => "unifiedorder",
            Self::OrderQuery => "orderquery",
            Self::CloseOrder => "closeorder",
            Self::Refund => "refund",
            Self::RefundQuery => "refundquery",
            Self::DownloadBill => "downloadbill",
            Self::MicroPay => "micropay",
            Self::Reverse => "reverse",
            Self::ShortUrl => "shorturl",
            Self::Report => "report",
            Self::GetSignKey => "getsignkey",
        };
        f.write_str(name)
    }
}
