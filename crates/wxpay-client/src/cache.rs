use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Purpose-keyed store for short-lived provider tokens (access tokens,
/// JSAPI tickets).
pub trait TokenCache: Send + Sync {
    /// Cached value for `purpose`, only if it has not expired.
    fn get(&self, purpose: &str) -> Option<String>;

    /// Store `value` for `purpose`, valid for `ttl`.
    fn put(&self, purpose: &str, value: String, ttl: Duration);
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Process-local [`TokenCache`].
#[derive(Debug, Default)]
pub struct InMemoryTokenCache {
    entries: DashMap<String, CachedToken>,
}

impl InMemoryTokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TokenCache for InMemoryTokenCache {
    fn get(&self, purpose: &str) -> Option<String> {
        let now = Utc::now();
        self.entries
            .get(purpose)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone())
    }

    fn put(&self, purpose: &str, value: String, ttl: Duration) {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl));
        let Some(expires_at) = expires_at else {
            tracing::warn!(purpose = %purpose, ttl_secs = ttl.as_secs(), "token ttl out of range, not cached");
            return;
        };
        self.entries
            .insert(purpose.to_string(), CachedToken { value, expires_at });
    }
}
