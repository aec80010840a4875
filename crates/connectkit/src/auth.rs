//! Bearer credential injection.
//!
//! The token is looked up on every call rather than captured once at
//! connect time, so a rotated credential takes effect on the next request.

use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;
use tonic::metadata::{AsciiMetadataValue, MetadataValue};
use tonic::service::Interceptor;
use tonic::{Request, Status};

/// Source of the bearer token attached to each call.
pub trait TokenSource: Send + Sync {
    /// Return the token to use for the next call.
    fn token(&self) -> Result<String>;
}

/// A fixed token supplied at startup.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    /// Wrap a token value.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken(***)")
    }
}

impl TokenSource for StaticToken {
    fn token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Reads the token from an environment variable on every call,
/// falling back to a fixed value when the variable is unset or empty.
#[derive(Clone)]
pub struct EnvToken {
    var: String,
    fallback: Option<String>,
}

impl EnvToken {
    /// Read `var` on each call.
    pub fn new(var: impl Into<String>) -> Self {
        Self {
            var: var.into(),
            fallback: None,
        }
    }

    /// Use `token` when the variable is not set.
    pub fn with_fallback(mut self, token: impl Into<String>) -> Self {
        self.fallback = Some(token.into());
        self
    }
}

impl fmt::Debug for EnvToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvToken").field("var", &self.var).finish_non_exhaustive()
    }
}

impl TokenSource for EnvToken {
    fn token(&self) -> Result<String> {
        std::env::var(&self.var)
            .ok()
            .filter(|value| !value.is_empty())
            .or_else(|| self.fallback.clone())
            .ok_or_else(|| Error::Credential(format!("{} is not set", self.var)))
    }
}

/// Interceptor that writes `authorization: Bearer <token>` on each request.
#[derive(Clone)]
pub struct BearerInterceptor {
    source: Arc<dyn TokenSource>,
}

impl BearerInterceptor {
    /// Create an interceptor backed by `source`.
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self { source }
    }
}

/// A credential that cannot be produced locally is reported as
/// `FAILED_PRECONDITION` so the retry loop, which only retries
/// `UNAUTHENTICATED`, gives up on the first attempt.
impl Interceptor for BearerInterceptor {
    fn call(&mut self, mut request: Request<()>) -> std::result::Result<Request<()>, Status> {
        let token = self
            .source
            .token()
            .map_err(|e| Status::failed_precondition(e.to_string()))?;
        let value: AsciiMetadataValue = MetadataValue::try_from(format!("Bearer {token}"))
            .map_err(|_| {
                Status::failed_precondition("API token contains invalid header characters")
            })?;
        request.metadata_mut().insert("authorization", value);
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Rotating(AtomicU32);

    impl TokenSource for Rotating {
        fn token(&self) -> Result<String> {
            Ok(format!("token-{}", self.0.fetch_add(1, Ordering::SeqCst)))
        }
    }

    fn authorization(request: &Request<()>) -> String {
        request
            .metadata()
            .get("authorization")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_static_token_header() {
        let mut interceptor = BearerInterceptor::new(Arc::new(StaticToken::new("abc123")));
        let request = interceptor.call(Request::new(())).unwrap();
        assert_eq!(authorization(&request), "Bearer abc123");
    }

    #[test]
    fn test_token_read_per_call() {
        let mut interceptor = BearerInterceptor::new(Arc::new(Rotating(AtomicU32::new(0))));

        let first = interceptor.call(Request::new(())).unwrap();
        let second = interceptor.call(Request::new(())).unwrap();

        assert_eq!(authorization(&first), "Bearer token-0");
        assert_eq!(authorization(&second), "Bearer token-1");
    }

    #[test]
    fn test_invalid_token_rejected() {
        let mut interceptor = BearerInterceptor::new(Arc::new(StaticToken::new("bad\ntoken")));
        let status = interceptor.call(Request::new(())).unwrap_err();
        assert_eq!(status.code(), tonic::Code::FailedPrecondition);
    }

    #[test]
    fn test_missing_token_is_not_retryable() {
        let source = EnvToken::new("CONNECTKIT_TEST_UNSET_TOKEN_VAR");
        let mut interceptor = BearerInterceptor::new(Arc::new(source));
        let status = interceptor.call(Request::new(())).unwrap_err();
        assert_eq!(status.code(), tonic::Code::FailedPrecondition);
        assert!(status.message().contains("CONNECTKIT_TEST_UNSET_TOKEN_VAR is not set"));
        assert!(!Error::from(status).is_retryable());
    }

    #[test]
    fn test_env_token_fallback() {
        let source = EnvToken::new("CONNECTKIT_TEST_UNSET_TOKEN_VAR").with_fallback("fallback");
        assert_eq!(source.token().unwrap(), "fallback");

        let source = EnvToken::new("CONNECTKIT_TEST_UNSET_TOKEN_VAR");
        assert!(matches!(source.token(), Err(Error::Credential(_))));
    }

    #[test]
    fn test_static_token_debug_redacted() {
        let debug = format!("{:?}", StaticToken::new("secret"));
        assert!(!debug.contains("secret"));
    }
}
