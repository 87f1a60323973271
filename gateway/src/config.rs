//! Gateway configuration.

use std::time::Duration;

/// Placeholder signature sent until real message signing lands.
///
/// The receiving side treats the field as opaque, so the literal shape
/// (including the unterminated quote) is preserved as-is.
pub const SIGNATURE_PLACEHOLDER: &str = "Signature:  namespace=\"g2p\", \
     kidId=\"{sender_id}|{unique_key_id}|{algorithm}\", \
     algorithm=\"ed25519\", created=\"1606970629\", expires=\"1607030629\", \
     headers=\"(created) (expires) digest\", \
     signature=\"Base64(signing content)";

/// Connection and identity settings for talking to an ID Mapper.
#[derive(Debug, Clone)]
pub struct MapperConfig {
    /// Endpoint URL for link requests.
    pub link_url: String,

    /// Endpoint URL for update requests.
    pub update_url: String,

    /// Endpoint URL for resolve requests.
    pub resolve_url: String,

    /// Sender identifier stamped on every outbound header.
    pub sender_id: String,

    /// Callback URI advertised for link outcomes.
    pub link_callback_url: String,

    /// Callback URI advertised for update outcomes.
    pub update_callback_url: String,

    /// Callback URI advertised for resolve outcomes.
    pub resolve_callback_url: String,

    /// Read timeout for one endpoint call.
    pub api_timeout: Duration,

    /// Signature string attached to outbound messages.
    pub signature: String,
}

impl MapperConfig {
    /// Create a config with action URLs derived from one base URL.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            link_url: format!("{base}/link"),
            update_url: format!("{base}/update"),
            resolve_url: format!("{base}/resolve"),
            ..Self::default()
        }
    }

    /// Set the sender identifier.
    #[must_use]
    pub fn with_sender_id(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = sender_id.into();
        self
    }

    /// Set all three callback URIs from one base URL.
    #[must_use]
    pub fn with_callback_base(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        self.link_callback_url = format!("{base}/on-link");
        self.update_callback_url = format!("{base}/on-update");
        self.resolve_callback_url = format!("{base}/on-resolve");
        self
    }

    /// Set the endpoint read timeout.
    #[must_use]
    pub const fn with_api_timeout(mut self, api_timeout: Duration) -> Self {
        self.api_timeout = api_timeout;
        self
    }

    /// Set the signature string.
    #[must_use]
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = signature.into();
        self
    }
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            link_url: "http://localhost:8000/link".to_string(),
            update_url: "http://localhost:8000/update".to_string(),
            resolve_url: "http://localhost:8000/resolve".to_string(),
            sender_id: "idmap-gateway".to_string(),
            link_callback_url: "http://localhost:3000/callback/on-link".to_string(),
            update_callback_url: "http://localhost:3000/callback/on-update".to_string(),
            resolve_callback_url: "http://localhost:3000/callback/on-resolve".to_string(),
            api_timeout: Duration::from_secs(10),
            signature: SIGNATURE_PLACEHOLDER.to_string(),
        }
    }
}

/// How long a waiting caller polls for a terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Pause between poll attempts.
    pub interval: Duration,

    /// Maximum number of poll attempts.
    pub max_attempts: u32,
}

impl PollPolicy {
    /// Create a policy with the default 1 s interval and 10 attempts.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: 10,
        }
    }

    /// Set the pause between attempts. Zero means no pause.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the maximum number of attempts.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Total budget as a single deadline (`interval × max_attempts`).
    #[must_use]
    pub const fn deadline(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MapperConfig::default();
        assert_eq!(config.link_url, "http://localhost:8000/link");
        assert_eq!(config.sender_id, "idmap-gateway");
        assert_eq!(config.api_timeout, Duration::from_secs(10));
        assert!(config.signature.starts_with("Signature:  namespace=\"g2p\""));
    }

    #[test]
    fn test_urls_derived_from_base() {
        let config = MapperConfig::new("http://mapper.example:9000/");
        assert_eq!(config.link_url, "http://mapper.example:9000/link");
        assert_eq!(config.update_url, "http://mapper.example:9000/update");
        assert_eq!(config.resolve_url, "http://mapper.example:9000/resolve");
    }

    #[test]
    fn test_callback_base_builder() {
        let config = MapperConfig::default()
            .with_sender_id("registry")
            .with_callback_base("http://gateway.example/cb/");
        assert_eq!(config.sender_id, "registry");
        assert_eq!(config.link_callback_url, "http://gateway.example/cb/on-link");
        assert_eq!(
            config.resolve_callback_url,
            "http://gateway.example/cb/on-resolve"
        );
    }

    #[test]
    fn test_poll_policy_defaults_and_deadline() {
        let poll = PollPolicy::default();
        assert_eq!(poll.interval, Duration::from_secs(1));
        assert_eq!(poll.max_attempts, 10);
        assert_eq!(poll.deadline(), Duration::from_secs(10));

        let poll = PollPolicy::new()
            .with_interval(Duration::from_millis(250))
            .with_max_attempts(4);
        assert_eq!(poll.deadline(), Duration::from_secs(1));
    }
}
