//! Request dispatcher.
//!
//! Every provider call goes through [`RequestDispatcher::execute`]:
//!
//! 1. identity fields (`appid`, `mch_id`, a fresh `nonce_str`) are merged
//!    in without overwriting caller values,
//! 2. required fields are checked,
//! 3. the set is signed with the active key (merchant or sandbox),
//! 4. the XML frame is posted and the answer decoded,
//! 5. a `return_code=SUCCESS` answer must verify, a `FAIL` answer is
//!    returned untouched.

use std::sync::Arc;
use std::time::{Duration, Instant};

use wxpay_core::{
    from_xml, to_xml, Operation, ParameterSet, PayConfig, PayRequest, ProviderResponse, ReturnCode,
};
use wxpay_crypto::{nonce_str, sign_params, verify, MerchantKey, SignedRequest};

use crate::error::ClientError;
use crate::report::CallReporter;
use crate::sandbox::SandboxKeyManager;
use crate::transport::Transport;

/// Path segment inserted in front of sandboxed operation paths.
pub const SANDBOX_SEGMENT: &str = "/sandboxnew";

/// Per-call transport options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallOptions {
    pub use_client_cert: bool,
    pub timeout: Duration,
}

impl CallOptions {
    /// Defaults for `operation`: its usual timeout and certificate need.
    pub fn for_operation(operation: Operation) -> Self {
        Self {
            use_client_cert: operation.requires_client_cert(),
            timeout: operation.default_timeout(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Signs, sends and verifies provider calls for one merchant.
pub struct RequestDispatcher {
    config: PayConfig,
    merchant_key: MerchantKey,
    transport: Arc<dyn Transport>,
    sandbox: SandboxKeyManager,
    reporter: CallReporter,
}

impl RequestDispatcher {
    pub fn new(config: PayConfig, transport: Arc<dyn Transport>) -> Result<Self, ClientError> {
        config.validate()?;
        let merchant_key = MerchantKey::new(config.merchant.api_key.clone())?;
        let reporter = CallReporter::new(&config.report);
        Ok(Self {
            config,
            merchant_key,
            transport,
            sandbox: SandboxKeyManager::new(),
            reporter,
        })
    }

    pub fn config(&self) -> &PayConfig {
        &self.config
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn is_sandbox(&self) -> bool {
        self.config.endpoint.sandbox
    }

    /// Full URL of `operation`, with the sandbox segment when it applies.
    pub fn url_for(&self, operation: Operation) -> String {
        let base = self.config.endpoint.api_base.trim_end_matches('/');
        let segment = if self.is_sandbox() && operation.is_sandboxed() {
            SANDBOX_SEGMENT
        } else {
            ""
        };
        format!("{base}{segment}{}", operation.path())
    }

    /// Key used to sign requests and verify responses: the sandbox key in
    /// sandbox mode, fetched on first use, the merchant key otherwise.
    pub fn active_key(&self) -> Result<MerchantKey, ClientError> {
        if !self.is_sandbox() {
            return Ok(self.merchant_key.clone());
        }
        self.sandbox.get_or_fetch(|| self.fetch_sandbox_key())
    }

    /// Sign `params` with the active key.
    pub fn sign(&self, params: ParameterSet) -> Result<SignedRequest, ClientError> {
        Ok(sign_params(params, &self.active_key()?))
    }

    /// Verify `params` (an inbound callback, say) against the active key.
    pub fn verify(&self, params: &ParameterSet) -> Result<bool, ClientError> {
        Ok(verify(params, &self.active_key()?))
    }

    /// Run one signed call and return the decoded response.
    ///
    /// A `return_code=FAIL` response is returned as is; a `SUCCESS` response
    /// that does not verify is [`ClientError::SignatureInvalid`].
    pub fn execute(
        &self,
        operation: Operation,
        params: ParameterSet,
        options: CallOptions,
    ) -> Result<ProviderResponse, ClientError> {
        let key = self.active_key()?;
        let out_trade_no = params.get("out_trade_no").map(str::to_owned);
        let started = Instant::now();
        let result = self
            .post(operation, params, &key, options)
            .and_then(|raw| self.decode_verified(operation, &raw, &key));
        if operation.is_reported() {
            self.report(operation, started.elapsed(), &result, out_trade_no.as_deref(), &key);
        }
        result
    }

    /// Run a call whose successful answer is not an XML frame
    /// (the statement download). An XML body is decoded as the failure it
    /// reports.
    pub fn execute_raw(
        &self,
        operation: Operation,
        params: ParameterSet,
        options: CallOptions,
    ) -> Result<String, ClientError> {
        let key = self.active_key()?;
        let raw = self.post(operation, params, &key, options)?;
        if !raw.trim_start().starts_with('<') {
            return Ok(raw);
        }
        let resp = self.decode_verified(operation, &raw, &key)?;
        Err(failure_of(&resp).unwrap_or_else(|| {
            ClientError::MalformedResponse("expected statement text, got an XML frame".into())
        }))
    }

    fn post(
        &self,
        operation: Operation,
        params: ParameterSet,
        key: &MerchantKey,
        options: CallOptions,
    ) -> Result<String, ClientError> {
        let frame = self.prepare(operation, params, key)?;
        let url = self.url_for(operation);
        tracing::debug!(
            operation = %operation,
            url = %url,
            timeout_ms = options.timeout.as_millis() as u64,
            client_cert = options.use_client_cert,
            "dispatching request"
        );
        self.transport
            .post_xml(&url, &to_xml(&frame), options.timeout, options.use_client_cert)
            .inspect_err(|e| tracing::warn!(operation = %operation, error = %e, "transport failure"))
    }

    /// Merge identity fields, validate and sign.
    fn prepare(
        &self,
        operation: Operation,
        mut params: ParameterSet,
        key: &MerchantKey,
    ) -> Result<ParameterSet, ClientError> {
        let merchant = &self.config.merchant;
        if operation.includes_app_id() {
            params.insert_if_absent("appid", &merchant.app_id);
        }
        params.insert_if_absent("mch_id", &merchant.mch_id);
        params.insert_if_absent("nonce_str", nonce_str(self.config.nonce_length));
        if operation == Operation::UnifiedOrder && !merchant.notify_url.is_empty() {
            params.insert_if_absent("notify_url", &merchant.notify_url);
        }
        params.require(operation.required_fields())?;

        let mut signed = sign_params(params, key).into_params();
        // The short URL call is signed over the raw URL but carries it encoded.
        if operation == Operation::ShortUrl {
            if let Some(encoded) = signed.get("long_url").map(|u| urlencoding::encode(u).into_owned()) {
                signed.insert("long_url", encoded);
            }
        }
        Ok(signed)
    }

    fn decode_verified(
        &self,
        operation: Operation,
        raw: &str,
        key: &MerchantKey,
    ) -> Result<ProviderResponse, ClientError> {
        let resp = ProviderResponse::from_params(from_xml(raw)?)?;
        if resp.return_code() != ReturnCode::Success {
            tracing::warn!(
                operation = %operation,
                return_msg = resp.return_msg().unwrap_or_default(),
                "provider returned FAIL"
            );
            return Ok(resp);
        }
        if !verify(resp.params(), key) {
            tracing::warn!(operation = %operation, "response signature invalid");
            return Err(ClientError::SignatureInvalid { operation });
        }
        tracing::debug!(
            operation = %operation,
            result_code = resp.result_code().map(|c| c.as_str()).unwrap_or_default(),
            "response verified"
        );
        Ok(resp)
    }

    fn fetch_sandbox_key(&self) -> Result<String, ClientError> {
        let operation = Operation::GetSignKey;
        tracing::info!(mch_id = %self.config.merchant.mch_id, "requesting sandbox signing key");
        let started = Instant::now();
        let result = self
            .post(operation, ParameterSet::new(), &self.merchant_key, CallOptions::for_operation(operation))
            .and_then(|raw| self.decode_verified(operation, &raw, &self.merchant_key));
        // Reported with the merchant key: the sandbox key does not exist yet.
        self.report(operation, started.elapsed(), &result, None, &self.merchant_key);

        let resp = result.map_err(|e| ClientError::SandboxUnavailable(e.to_string()))?;
        if resp.return_code() != ReturnCode::Success {
            return Err(ClientError::SandboxUnavailable(
                resp.return_msg().unwrap_or("return_code FAIL").to_string(),
            ));
        }
        resp.require("sandbox_signkey")
            .map(str::to_owned)
            .map_err(|_| ClientError::SandboxUnavailable("response carries no sandbox_signkey".into()))
    }

    /// Send a timing report; failures never reach the caller.
    fn report(
        &self,
        operation: Operation,
        elapsed: Duration,
        result: &Result<ProviderResponse, ClientError>,
        out_trade_no: Option<&str>,
        key: &MerchantKey,
    ) {
        let Some(report) = self
            .reporter
            .build(&self.url_for(operation), elapsed, result, out_trade_no)
        else {
            return;
        };
        let params = report.to_params();
        let outcome = self
            .post(Operation::Report, params, key, CallOptions::for_operation(Operation::Report))
            .and_then(|raw| self.decode_verified(Operation::Report, &raw, key));
        if let Err(e) = outcome {
            tracing::debug!(operation = %operation, error = %e, "call report not delivered");
        }
    }
}

/// The error a non-successful response stands for, if any.
pub fn failure_of(resp: &ProviderResponse) -> Option<ClientError> {
    if resp.return_code() != ReturnCode::Success {
        return Some(ClientError::ReturnFailure {
            return_msg: resp.return_msg().unwrap_or_default().to_string(),
        });
    }
    if resp.result_code() != Some(ReturnCode::Success) {
        return Some(ClientError::ProtocolBusinessFailure {
            err_code: resp.err_code().unwrap_or_default().to_string(),
            err_code_des: resp.err_code_des().unwrap_or_default().to_string(),
        });
    }
    None
}
