use wxpay_core::{CoreError, MissingFields, Operation};
use wxpay_crypto::CryptoError;

/// Errors surfaced to callers of the dispatcher and the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The response body was not a well-formed provider frame.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A nominally successful response failed signature verification.
    #[error("response to {operation} failed signature verification")]
    SignatureInvalid { operation: Operation },

    #[error("request timed out: {0}")]
    TransportTimeout(String),

    #[error("transport unavailable: {0}")]
    TransportUnavailable(String),

    #[error("sandbox key unavailable: {0}")]
    SandboxUnavailable(String),

    /// `return_code=SUCCESS` but `result_code=FAIL`.
    #[error("provider rejected the request: {err_code} ({err_code_des})")]
    ProtocolBusinessFailure { err_code: String, err_code_des: String },

    /// `return_code=FAIL`.
    #[error("provider returned FAIL: {return_msg}")]
    ReturnFailure { return_msg: String },

    #[error("missing required fields: {0}")]
    Validation(#[from] MissingFields),

    /// Access token or JSAPI ticket could not be obtained.
    #[error("token unavailable: {0}")]
    TokenUnavailable(String),

    #[error("key error: {0}")]
    Key(#[from] CryptoError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("core error: {0}")]
    Core(CoreError),
}

impl From<CoreError> for ClientError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MalformedResponse(msg) => ClientError::MalformedResponse(msg),
            CoreError::Validation(missing) => ClientError::Validation(missing),
            other => ClientError::Core(other),
        }
    }
}

impl ClientError {
    /// Network-level failure, as opposed to a protocol answer.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::TransportTimeout(_) | ClientError::TransportUnavailable(_)
        )
    }
}
