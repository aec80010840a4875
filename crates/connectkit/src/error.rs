//! Error types for Connect API operations.
//!
//! Errors are categorized so the transport can decide what to retry and
//! reconcilers can tell a missing entity apart from a real failure.

use thiserror::Error;
use tonic::Code;

/// Categories of Connect errors for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The call was rejected as unauthenticated (transient, retryable)
    Unauthenticated,
    /// The requested entity does not exist
    NotFound,
    /// The server rejected the request payload
    InvalidArgument,
    /// The server or network could not be reached
    Unavailable,
    /// Client-side configuration problem (endpoint, TLS, credentials)
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Whether this error category is worth retrying at the transport layer.
    ///
    /// Only authentication races qualify; every other status is surfaced to
    /// the caller on the first failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "Authentication failed",
            Self::NotFound => "Entity not found",
            Self::InvalidArgument => "Request rejected",
            Self::Unavailable => "Connect server unavailable",
            Self::Config => "Client misconfigured",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "Check that the API token is valid and has not expired",
            Self::NotFound => "Verify the identifier or import the entity again",
            Self::InvalidArgument => "Check the declared configuration against the API schema",
            Self::Unavailable => "Check the Connect URL and your network connection",
            Self::Config => "Check the provider configuration and environment variables",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur while talking to the Connect API.
#[derive(Debug, Error)]
pub enum Error {
    /// The server answered with a non-OK gRPC status
    #[error("rpc error: code = {code:?} desc = {message}")]
    Status {
        /// gRPC status code returned by the server
        code: Code,
        /// Status message returned by the server
        message: String,
    },

    /// The configured endpoint is not a usable `host:port`
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint {
        /// Endpoint as it was configured
        endpoint: String,
        /// Why it was rejected
        reason: String,
    },

    /// The platform root certificate store could not be used
    #[error("no usable root certificates: {0}")]
    RootStore(String),

    /// TLS client configuration could not be built
    #[error("TLS configuration error: {0}")]
    Tls(#[from] rustls::Error),

    /// The credential source could not produce a token
    #[error("credential error: {0}")]
    Credential(String),

    /// Transport-level failure below the gRPC layer
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// The server answered OK but left out a required message
    #[error("malformed response from {method}: missing {field}")]
    MissingField {
        /// RPC method that produced the response
        method: &'static str,
        /// Field that was expected but absent
        field: &'static str,
    },
}

impl Error {
    /// Build a status error from a code and message.
    pub fn status(code: Code, message: impl Into<String>) -> Self {
        Self::Status {
            code,
            message: message.into(),
        }
    }

    /// Get the error category for retry logic.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Status { code, .. } => match code {
                Code::Unauthenticated => ErrorCategory::Unauthenticated,
                Code::NotFound => ErrorCategory::NotFound,
                Code::InvalidArgument | Code::FailedPrecondition | Code::AlreadyExists => {
                    ErrorCategory::InvalidArgument
                }
                Code::Unavailable | Code::DeadlineExceeded => ErrorCategory::Unavailable,
                _ => ErrorCategory::Other,
            },
            Error::InvalidEndpoint { .. }
            | Error::RootStore(_)
            | Error::Tls(_)
            | Error::Credential(_) => ErrorCategory::Config,
            Error::Transport(_) => ErrorCategory::Unavailable,
            Error::MissingField { .. } => ErrorCategory::Other,
        }
    }

    /// Whether this error is worth retrying at the transport layer.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Whether the server reported the entity as missing.
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }
}

impl From<tonic::Status> for Error {
    fn from(status: tonic::Status) -> Self {
        Self::Status {
            code: status.code(),
            message: status.message().to_string(),
        }
    }
}

/// Result type for Connect API operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::Unauthenticated.is_retryable());
        assert!(!ErrorCategory::NotFound.is_retryable());
        assert!(!ErrorCategory::InvalidArgument.is_retryable());
        assert!(!ErrorCategory::Unavailable.is_retryable());
    }

    #[test]
    fn test_status_unauthenticated() {
        let err = Error::from(tonic::Status::unauthenticated("token not yet valid"));
        assert_eq!(err.category(), ErrorCategory::Unauthenticated);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_status_not_found() {
        let err = Error::status(Code::NotFound, "trust zone tz-1 not found");
        assert!(err.is_not_found());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_status_invalid_argument() {
        let err = Error::status(Code::InvalidArgument, "trust_domain is required");
        assert_eq!(err.category(), ErrorCategory::InvalidArgument);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_config_errors() {
        let err = Error::InvalidEndpoint {
            endpoint: "nope".to_string(),
            reason: "missing port".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Config);
        assert!(err.to_string().contains("missing port"));
    }

    #[test]
    fn test_status_display() {
        let err = Error::status(Code::PermissionDenied, "denied");
        assert_eq!(
            err.to_string(),
            "rpc error: code = PermissionDenied desc = denied"
        );
        assert_eq!(err.category(), ErrorCategory::Other);
    }
}
