use wxpay_client::{ClientError, PayClient};
use wxpay_core::request::{OrderQuery, UnifiedOrder};
use wxpay_core::{ParameterSet, ProviderResponse};
use wxpay_crypto::nonce_str;

/// What the processor needs from the provider side.
pub trait PaymentGateway: Send + Sync {
    /// Check a callback's `sign` against the active key.
    fn verify_callback(&self, params: &ParameterSet) -> Result<bool, ClientError>;

    /// Attach a `sign` computed with the active key.
    fn sign_reply(&self, params: ParameterSet) -> Result<ParameterSet, ClientError>;

    /// Fresh order query; `FAIL` answers come back as responses.
    fn query_order(&self, out_trade_no: &str) -> Result<ProviderResponse, ClientError>;

    /// Place a unified order; `FAIL` answers come back as responses.
    fn place_order(&self, order: &UnifiedOrder) -> Result<ProviderResponse, ClientError>;

    /// Fresh `nonce_str` of the configured length.
    fn nonce(&self) -> String;
}

impl PaymentGateway for PayClient {
    fn verify_callback(&self, params: &ParameterSet) -> Result<bool, ClientError> {
        self.dispatcher().verify(params)
    }

    fn sign_reply(&self, params: ParameterSet) -> Result<ParameterSet, ClientError> {
        Ok(self.dispatcher().sign(params)?.into_params())
    }

    fn query_order(&self, out_trade_no: &str) -> Result<ProviderResponse, ClientError> {
        self.call(&OrderQuery::by_out_trade_no(out_trade_no))
    }

    fn place_order(&self, order: &UnifiedOrder) -> Result<ProviderResponse, ClientError> {
        self.call(order)
    }

    fn nonce(&self) -> String {
        nonce_str(self.dispatcher().config().nonce_length)
    }
}
