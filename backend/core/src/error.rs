use thiserror::Error;

/// Failure reported by a completion backend.
///
/// `transient` separates rate-limit / transport / 5xx failures (worth
/// retrying) from auth and malformed-request failures (not worth retrying).
#[derive(Debug, Error)]
#[error("completion backend error ({provider}): {message}")]
pub struct BackendError {
    pub provider: String,
    pub message: String,
    pub transient: bool,
}

impl BackendError {
    pub fn transient(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            message: message.into(),
            transient: true,
        }
    }

    pub fn permanent(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            message: message.into(),
            transient: false,
        }
    }
}

/// Top-level error type for the StackForge runtime.
#[derive(Debug, Error)]
pub enum ForgeError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("unknown session: {0}")]
    SessionNotFound(String),

    #[error("edit request matched no known files")]
    NoAffectedFiles,

    #[error("description too short: {len} chars (minimum {min})")]
    InputTooShort { len: usize, min: usize },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ForgeError {
    /// Whether the failure is an upstream backend fault that was retryable.
    pub fn is_transient_backend(&self) -> bool {
        matches!(self, ForgeError::Backend(e) if e.transient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_classification() {
        let err = BackendError::transient("azure", "429 too many requests");
        assert!(err.transient);
        let err: ForgeError = err.into();
        assert!(err.is_transient_backend());

        let err: ForgeError = BackendError::permanent("azure", "401 unauthorized").into();
        assert!(!err.is_transient_backend());
    }

    #[test]
    fn input_too_short_message_names_limits() {
        let err = ForgeError::InputTooShort { len: 3, min: 10 };
        assert_eq!(err.to_string(), "description too short: 3 chars (minimum 10)");
    }
}
