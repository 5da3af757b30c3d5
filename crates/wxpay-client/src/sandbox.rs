use std::sync::OnceLock;

use wxpay_crypto::MerchantKey;

use crate::error::ClientError;

/// Holds the sandbox signing key for the lifetime of one client.
///
/// The key is fetched lazily on the first sandbox call and never
/// persisted. Concurrent first calls may both fetch; the first stored key
/// wins and every caller sees that one afterwards.
#[derive(Debug, Default)]
pub struct SandboxKeyManager {
    key: OnceLock<MerchantKey>,
}

impl SandboxKeyManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached key, if one was fetched already.
    pub fn cached(&self) -> Option<MerchantKey> {
        self.key.get().cloned()
    }

    /// Return the cached key or obtain one with `fetch`.
    pub fn get_or_fetch<F>(&self, fetch: F) -> Result<MerchantKey, ClientError>
    where
        F: FnOnce() -> Result<String, ClientError>,
    {
        if let Some(key) = self.key.get() {
            return Ok(key.clone());
        }
        let fetched = MerchantKey::new(fetch()?)
            .map_err(|_| ClientError::SandboxUnavailable("provider issued an empty key".into()))?;
        if self.key.set(fetched).is_ok() {
            tracing::info!("sandbox signing key cached");
        }
        self.key
            .get()
            .cloned()
            .ok_or_else(|| ClientError::SandboxUnavailable("key was not cached".into()))
    }
}
