//! Error types for stormline-ai

use thiserror::Error;

/// AI routing layer error type
#[derive(Debug, Error)]
pub enum Error {
    /// Upstream provider answered with a non-2xx status
    #[error("{provider} returned HTTP {status}: {}", crate::util::truncate_safe(.body, 300))]
    Provider {
        /// Provider family name
        provider: String,
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// No response or terminal event within the configured deadline
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// The resolved adapter does not implement the requested operation
    #[error("adapter {adapter} does not support {capability}")]
    UnsupportedCapability {
        /// Model identifier of the adapter
        adapter: String,
        /// Capability name
        capability: String,
    },

    /// Neither the preferred nor the fallback adapter is registered
    #[error("no adapter available for task {0}")]
    NoAdapterAvailable(String),

    /// Provider not configured
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Invalid response envelope
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Error event received in the middle of a stream
    #[error("stream error: {0}")]
    Stream(String),
}

impl Error {
    /// Upstream HTTP status, if this is a provider error
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Provider { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the call was aborted by the deadline
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Map a transport error, folding reqwest timeouts into [`Error::Timeout`]
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout_ms)
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_keeps_status_and_body() {
        let err = Error::Provider {
            provider: "openai".to_string(),
            status: 429,
            body: r#"{"error":"slow down"}"#.to_string(),
        };
        assert_eq!(err.status(), Some(429));
        assert!(err.to_string().contains("HTTP 429"));
        assert!(err.to_string().contains("slow down"));
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_provider_error_display_truncates_long_bodies() {
        let err = Error::Provider {
            provider: "gemini".to_string(),
            status: 500,
            body: "x".repeat(1000),
        };
        assert!(err.to_string().len() < 400);
        if let Error::Provider { body, .. } = err {
            assert_eq!(body.len(), 1000);
        }
    }

    #[test]
    fn test_timeout() {
        assert!(Error::Timeout(500).is_timeout());
        assert_eq!(Error::Timeout(500).status(), None);
    }
}
