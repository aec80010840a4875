//! Reconciliation failures
//!
//! Every failure maps onto one diagnostic scoped to the operation that
//! raised it. Nothing here is retried; transport-level retries happen
//! before an error reaches this layer.

use crate::types::Diagnostic;
use thiserror::Error;

/// Why a lifecycle operation failed
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Declared configuration is invalid; no remote call was made
    #[error("{summary}: {detail}")]
    Validation { summary: String, detail: String },

    /// The persisted state lacks the remote id needed for the operation
    #[error("{detail}")]
    MissingId {
        /// Entity kind, e.g. "attestation policy"
        kind: &'static str,
        detail: String,
    },

    /// The operation is not supported for this kind; no remote call was made
    #[error("{summary}: {detail}")]
    Unsupported { summary: String, detail: String },

    /// A stored value could not be converted to or from its wire form
    #[error("{summary}: {detail}")]
    Codec { summary: String, detail: String },

    /// The remote call failed
    #[error("{summary}: {detail}")]
    Remote {
        summary: String,
        detail: String,
        /// The remote reported the entity as missing
        not_found: bool,
    },

    /// A lookup matched nothing
    #[error("{summary}: {detail}")]
    NoMatch { summary: String, detail: String },

    /// A lookup matched more than one entity
    #[error("{summary}: {detail}")]
    MultipleMatches {
        summary: String,
        detail: String,
        count: usize,
    },

    /// The caller cancelled the operation
    #[error("operation cancelled")]
    Cancelled,

    /// The operation deadline passed before the remote answered
    #[error("operation deadline exceeded")]
    DeadlineExceeded,
}

impl ReconcileError {
    pub fn validation(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Validation {
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    pub fn unsupported(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Unsupported {
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    pub fn codec(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Codec {
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    /// Whether the remote reported the entity as missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Remote { not_found: true, .. })
    }

    /// Whether the failure was detected locally, before any remote call
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::MissingId { .. }
                | Self::Unsupported { .. }
                | Self::Codec { .. }
        )
    }

    /// Render as an error diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Validation { summary, detail }
            | Self::Unsupported { summary, detail }
            | Self::Codec { summary, detail }
            | Self::Remote {
                summary, detail, ..
            }
            | Self::NoMatch { summary, detail }
            | Self::MultipleMatches {
                summary, detail, ..
            } => Diagnostic::error(summary.clone(), detail.clone()),
            Self::MissingId { kind, detail } => {
                Diagnostic::error(format!("Missing {kind} ID"), detail.clone())
            }
            Self::Cancelled => Diagnostic::error(
                "Operation cancelled",
                "The operation was cancelled before the remote call completed.",
            ),
            Self::DeadlineExceeded => Diagnostic::error(
                "Operation timed out",
                "The remote call did not complete before the deadline.",
            ),
        }
    }
}

impl From<ReconcileError> for Diagnostic {
    fn from(error: ReconcileError) -> Self {
        error.to_diagnostic()
    }
}

/// Result type for reconciliation operations
pub type Result<T> = std::result::Result<T, ReconcileError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;

    #[test]
    fn test_not_found_flag() {
        let err = ReconcileError::Remote {
            summary: "Error reading trust zone".into(),
            detail: "not found".into(),
            not_found: true,
        };
        assert!(err.is_not_found());
        assert!(!err.is_local());
    }

    #[test]
    fn test_local_errors() {
        assert!(ReconcileError::validation("Invalid configuration", "x").is_local());
        assert!(
            ReconcileError::unsupported(
                "Federation Update Not Supported",
                "The Connect API does not support updating federations."
            )
            .is_local()
        );
        assert!(!ReconcileError::Cancelled.is_local());
    }

    #[test]
    fn test_to_diagnostic() {
        let diag = ReconcileError::unsupported(
            "Federation Update Not Supported",
            "The Connect API does not support updating federations.",
        )
        .to_diagnostic();
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.summary, "Federation Update Not Supported");

        let diag = ReconcileError::MissingId {
            kind: "role binding",
            detail: "Role binding ID not found in state.".into(),
        }
        .to_diagnostic();
        assert_eq!(diag.summary, "Missing role binding ID");
    }
}
