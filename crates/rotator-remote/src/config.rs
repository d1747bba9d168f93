//! Client configuration

use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://api.twitter.com/1.1";

/// Seconds to wait after a 429 whose reset header is missing or stale
pub const DEFAULT_FALLBACK_WAIT_SECS: u64 = 60;

/// What the client does when the remote service signals a rate limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitPolicy {
    /// Block the calling operation until the window resets, then retry
    #[default]
    TrackAndAwait,
    /// Surface `RotatorError::RateLimited` immediately
    FailFast,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub rate_limit: RateLimitPolicy,
    pub fallback_wait_secs: u64,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            rate_limit: RateLimitPolicy::default(),
            fallback_wait_secs: DEFAULT_FALLBACK_WAIT_SECS,
            user_agent: concat!("rotator/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_rate_limit(mut self, policy: RateLimitPolicy) -> Self {
        self.rate_limit = policy;
        self
    }

    /// Seconds to wait after a 429 whose reset is missing or already past
    pub fn with_fallback_wait_secs(mut self, secs: u64) -> Self {
        self.fallback_wait_secs = secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_deserializes_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: RateLimitPolicy,
        }

        let w: Wrapper = serde_json::from_str(r#"{"policy":"fail_fast"}"#).unwrap();
        assert_eq!(w.policy, RateLimitPolicy::FailFast);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = ClientConfig::default().with_base_url("http://localhost:9000/1.1/");
        assert_eq!(config.base_url, "http://localhost:9000/1.1");
    }
}
