use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

/// Shared signing secret (the merchant API key, or the sandbox key issued in
/// its place). Zeroized on drop and never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MerchantKey(String);

impl MerchantKey {
    pub fn new(key: impl Into<String>) -> Result<Self, CryptoError> {
        let key = key.into();
        if key.is_empty() {
            return Err(CryptoError::InvalidKey("key is empty".into()));
        }
        Ok(Self(key))
    }

    /// Raw key text. Only the signer should need this.
    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for MerchantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MerchantKey(<redacted>)")
    }
}
