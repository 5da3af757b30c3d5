//! wxpay core
//!
//! Provider-agnostic building blocks of the merchant protocol: the
//! [`ParameterSet`] every request and response is made of, the XML wire codec,
//! typed operation records and the client configuration.

pub mod error;
pub mod params;
pub mod codec;
pub mod types;
pub mod operation;
pub mod request;
pub mod response;
pub mod config;

pub use error::CoreError;
pub use params::{MissingFields, ParameterSet};
pub use codec::{from_xml, to_url_params, to_xml};
pub use types::{ProviderResponse, ReturnCode, TradeState, TradeType};
pub use operation::Operation;
pub use request::{PayRequest, RefundRef, TradeRef};
pub use response::FromResponse;
pub use config::PayConfig;
