/// Signature errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("parameter set carries no signature")]
    MissingSignature,

    #[error("signature verification failed")]
    SignatureMismatch,

    #[error("invalid key: {0}")]
    InvalidKey(String),
}
