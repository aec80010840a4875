//! Core types for configuring the Connect client.

use std::time::Duration;

/// Subdomain label prefixed to the configured host to form the server authority.
pub const SERVER_AUTHORITY_SUBDOMAIN: &str = "connect";

/// How the client decides whether to trust the server certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrustPolicy {
    /// Verify the server certificate against the platform root store
    #[default]
    VerifySystemRoots,
    /// Accept any server certificate (local and development endpoints only)
    SkipVerify,
}

impl TrustPolicy {
    /// Map an `insecure_skip_verify` flag onto a policy.
    pub fn from_insecure_flag(insecure_skip_verify: bool) -> Self {
        if insecure_skip_verify {
            Self::SkipVerify
        } else {
            Self::VerifySystemRoots
        }
    }

    /// Whether certificate verification is disabled.
    pub fn is_insecure(&self) -> bool {
        matches!(self, Self::SkipVerify)
    }
}

/// Configuration for retry behavior.
///
/// The defaults mirror the policy the Connect API expects from its clients:
/// ten attempts, starting at 100ms and doubling up to one second.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_factor: f64,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with custom settings.
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff_factor,
            max_delay: Duration::from_secs(1),
        }
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let capped = delay.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Create a config that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

/// Everything needed to open the channel to a Connect server.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    /// Control plane address in `host:port` form
    pub endpoint: String,
    /// Certificate trust policy
    pub trust_policy: TrustPolicy,
    /// Retry policy applied to every call
    pub retry: RetryConfig,
    /// Value sent in the `user-agent` header
    pub user_agent: String,
}

impl ConnectConfig {
    /// Create a config with the default retry policy and user agent.
    pub fn new(endpoint: impl Into<String>, trust_policy: TrustPolicy) -> Self {
        Self {
            endpoint: endpoint.into(),
            trust_policy,
            retry: RetryConfig::default(),
            user_agent: concat!("connect-reconciler/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Override the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}
