//! Static subscription credential for the image API.
//!
//! The remote API authenticates every call with a fixed token sent in the
//! `X-Subscription-Token` header. The key is loaded once at startup and shared
//! read-only by every request; it is never written to logs.

use std::fmt;
use std::sync::Arc;

/// Header carrying the subscription token on every remote call.
pub const SUBSCRIPTION_HEADER: &str = "X-Subscription-Token";

/// API key for the remote image service.
///
/// Cloning is cheap. `Debug` output is redacted so the key can sit inside
/// structs that are logged with `?config`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(Arc<str>);

impl ApiKey {
    /// Wrap a raw key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(Arc::from(key.into()))
    }

    /// The raw key, for building request headers.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_exposes_raw_value() {
        let key = ApiKey::new("secret-123");
        assert_eq!(key.expose(), "secret-123");
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::new("secret-123");
        let debug = format!("{:?}", key);
        assert!(!debug.contains("secret-123"));
        assert_eq!(debug, "ApiKey(***)");
    }

    #[test]
    fn test_api_key_clones_share_value() {
        let key = ApiKey::new("k");
        assert_eq!(key.clone(), key);
    }
}
