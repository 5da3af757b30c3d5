use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use wxpay_core::request::{
    CloseOrder, DownloadBill, MicroPay, OrderQuery, Refund, RefundQuery, Report, Reverse, UnifiedOrder,
};
use wxpay_core::response::{OrderQueryResponse, RefundResponse, UnifiedOrderResponse};
use wxpay_core::{to_url_params, FromResponse, Operation, ParameterSet, PayConfig, PayRequest, ProviderResponse};
use wxpay_crypto::{jsapi_signature, nonce_str};

use crate::cache::{InMemoryTokenCache, TokenCache};
use crate::dispatcher::{failure_of, CallOptions, RequestDispatcher};
use crate::error::ClientError;
use crate::ticket::JsapiTicketSource;
use crate::transport::{ReqwestTransport, Transport};

const BIZPAY_URL: &str = "weixin://wxpay/bizpayurl";

/// Parameters handed to the in-page payment API, plus the JS-SDK page
/// signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsapiPayInfo {
    pub app_id: String,
    pub time_stamp: String,
    pub nonce_str: String,
    pub package: String,
    pub sign_type: String,
    pub pay_sign: String,
    pub url: String,
    pub signature: String,
}

/// Merchant API client: one typed method per provider operation.
pub struct PayClient {
    dispatcher: RequestDispatcher,
    tickets: Option<JsapiTicketSource>,
}

impl PayClient {
    /// Client over HTTPS with an in-memory token cache.
    pub fn new(config: PayConfig) -> Result<Self, ClientError> {
        let transport = Arc::new(ReqwestTransport::new(&config.transport)?);
        Self::with_transport(config, transport, Arc::new(InMemoryTokenCache::new()))
    }

    pub fn with_transport(
        config: PayConfig,
        transport: Arc<dyn Transport>,
        cache: Arc<dyn TokenCache>,
    ) -> Result<Self, ClientError> {
        let tickets = config.jsapi.ticket_secret.as_ref().map(|secret| {
            JsapiTicketSource::new(
                transport.clone(),
                cache,
                config.endpoint.token_base.clone(),
                config.merchant.app_id.clone(),
                secret.clone(),
            )
        });
        let dispatcher = RequestDispatcher::new(config, transport)?;
        Ok(Self { dispatcher, tickets })
    }

    pub fn dispatcher(&self) -> &RequestDispatcher {
        &self.dispatcher
    }

    /// Validate and send any request record; the response is returned
    /// whatever its status codes say.
    pub fn call<R: PayRequest>(&self, request: &R) -> Result<ProviderResponse, ClientError> {
        self.call_with(request, CallOptions::for_operation(request.operation()))
    }

    pub fn call_with<R: PayRequest>(
        &self,
        request: &R,
        options: CallOptions,
    ) -> Result<ProviderResponse, ClientError> {
        request.validate()?;
        self.dispatcher
            .execute(request.operation(), request.to_params(), options)
    }

    /// Send and require full success.
    fn call_checked<R: PayRequest>(&self, request: &R) -> Result<ProviderResponse, ClientError> {
        let resp = self.call(request)?;
        match failure_of(&resp) {
            Some(err) => Err(err),
            None => Ok(resp),
        }
    }

    fn call_typed<R: PayRequest, T: FromResponse>(&self, request: &R) -> Result<T, ClientError> {
        let resp = self.call_checked(request)?;
        Ok(T::from_response(&resp)?)
    }

    pub fn unified_order(&self, order: &UnifiedOrder) -> Result<UnifiedOrderResponse, ClientError> {
        self.call_typed(order)
    }

    pub fn order_query(&self, query: &OrderQuery) -> Result<OrderQueryResponse, ClientError> {
        self.call_typed(query)
    }

    pub fn close_order(&self, close: &CloseOrder) -> Result<ProviderResponse, ClientError> {
        self.call_checked(close)
    }

    pub fn refund(&self, refund: &Refund) -> Result<RefundResponse, ClientError> {
        self.call_typed(refund)
    }

    pub fn refund_query(&self, query: &RefundQuery) -> Result<ProviderResponse, ClientError> {
        self.call_checked(query)
    }

    /// Statement text for one day.
    pub fn download_bill(&self, request: &DownloadBill) -> Result<String, ClientError> {
        request.validate()?;
        let operation = request.operation();
        self.dispatcher.execute_raw(
            operation,
            request.to_params(),
            CallOptions::for_operation(operation),
        )
    }

    /// Counter payment. `USERPAYING` arrives as a business failure the
    /// caller polls on, so the response is not checked here.
    pub fn micropay(&self, request: &MicroPay) -> Result<ProviderResponse, ClientError> {
        self.call(request)
    }

    /// Reverse a counter payment; the caller inspects `recall`.
    pub fn reverse(&self, request: &Reverse) -> Result<ProviderResponse, ClientError> {
        self.call(request)
    }

    pub fn report(&self, report: &Report) -> Result<ProviderResponse, ClientError> {
        self.call(report)
    }

    /// Shorten a `weixin://` URL.
    pub fn short_url(&self, long_url: &str) -> Result<String, ClientError> {
        let operation = Operation::ShortUrl;
        let resp = self.dispatcher.execute(
            operation,
            ParameterSet::new().with("long_url", long_url),
            CallOptions::for_operation(operation),
        )?;
        if let Some(err) = failure_of(&resp) {
            return Err(err);
        }
        Ok(resp.require("short_url")?.to_string())
    }

    /// Signed scan-to-pay (mode one) link for `product_id`, shortened.
    pub fn bizpay_url(&self, product_id: &str) -> Result<String, ClientError> {
        let merchant = &self.dispatcher.config().merchant;
        let params = ParameterSet::new()
            .with("appid", &merchant.app_id)
            .with("mch_id", &merchant.mch_id)
            .with("product_id", product_id)
            .with("time_stamp", Utc::now().timestamp())
            .with("nonce_str", nonce_str(self.dispatcher.config().nonce_length));
        let signed = self.dispatcher.sign(params)?;
        let long_url = format!("{BIZPAY_URL}?{}", to_url_params(signed.params(), &[]));
        self.short_url(&long_url)
    }

    /// In-page payment parameters for `prepay_id`, signed for `page_url`.
    pub fn jsapi_pay_info(&self, prepay_id: &str, page_url: &str) -> Result<JsapiPayInfo, ClientError> {
        let tickets = self
            .tickets
            .as_ref()
            .ok_or_else(|| ClientError::Config("jsapi.ticket_secret is not configured".into()))?;
        let timestamp = Utc::now().timestamp();
        let nonce = nonce_str(self.dispatcher.config().nonce_length);
        let package = format!("prepay_id={prepay_id}");
        let app_id = self.dispatcher.config().merchant.app_id.clone();

        let signed = self.dispatcher.sign(
            ParameterSet::new()
                .with("appId", &app_id)
                .with("timeStamp", timestamp)
                .with("nonceStr", &nonce)
                .with("package", &package)
                .with("signType", "MD5"),
        )?;
        let ticket = tickets.ticket()?;

        Ok(JsapiPayInfo {
            app_id,
            time_stamp: timestamp.to_string(),
            signature: jsapi_signature(&ticket, &nonce, timestamp, page_url),
            nonce_str: nonce,
            package,
            sign_type: "MD5".into(),
            pay_sign: signed.signature().to_string(),
            url: page_url.to_string(),
        })
    }
}
