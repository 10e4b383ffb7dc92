//! Error types for linode-ddns.

use std::fmt;
use thiserror::Error;

/// Result type alias for linode-ddns.
pub type Result<T> = std::result::Result<T, DdnsError>;

/// One entry of the provider's `ERRORARRAY`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFault {
    pub code: i64,
    pub message: String,
}

/// DDNS error types.
///
/// The display form never repeats the kind; the status line prints
/// `FAIL <kind>: <display>`.
#[derive(Error, Debug)]
pub enum DdnsError {
    /// Missing or invalid configuration.
    #[error("{0}")]
    Config(String),

    /// Transport failure on an HTTP call.
    #[error("{0}")]
    Network(String),

    /// Response body not parseable as expected.
    #[error("{0}")]
    Format(String),

    /// The provider reported an error in-band.
    #[error("Error {code}: {message}")]
    Provider {
        code: i64,
        message: String,
        /// Entries after the first one, if the provider reported several.
        additional: Vec<ProviderFault>,
    },

    /// Domain or record lookup yielded no match.
    #[error("no matching {what} found")]
    NotFound { what: &'static str },

    /// Lookup yielded a number of entries other than the one expected.
    #[error("expected exactly one {what}, provider returned {count}")]
    Ambiguous { what: &'static str, count: usize },

    /// Anything the taxonomy above does not cover.
    #[error("{0}")]
    Unexpected(String),
}

/// Closed set of failure kinds, as printed on the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Network,
    Format,
    Provider,
    NotFound,
    AmbiguousResult,
    Unexpected,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Config => "ConfigError",
            ErrorKind::Network => "NetworkError",
            ErrorKind::Format => "FormatError",
            ErrorKind::Provider => "ProviderError",
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::AmbiguousResult => "AmbiguousResultError",
            ErrorKind::Unexpected => "UnexpectedError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DdnsError {
    /// Get the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DdnsError::Config(_) => ErrorKind::Config,
            DdnsError::Network(_) => ErrorKind::Network,
            DdnsError::Format(_) => ErrorKind::Format,
            DdnsError::Provider { .. } => ErrorKind::Provider,
            DdnsError::NotFound { .. } => ErrorKind::NotFound,
            DdnsError::Ambiguous { .. } => ErrorKind::AmbiguousResult,
            DdnsError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }
}

/// The request URL is dropped: it carries the API key.
impl From<reqwest::Error> for DdnsError {
    fn from(e: reqwest::Error) -> Self {
        let e = e.without_url();
        if e.is_builder() {
            DdnsError::Unexpected(e.to_string())
        } else {
            DdnsError::Network(e.to_string())
        }
    }
}

impl From<toml::de::Error> for DdnsError {
    fn from(e: toml::de::Error) -> Self {
        DdnsError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for DdnsError {
    fn from(e: serde_json::Error) -> Self {
        DdnsError::Format(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(DdnsError::Config("x".into()).kind().as_str(), "ConfigError");
        assert_eq!(
            DdnsError::NotFound { what: "domain" }.kind().to_string(),
            "NotFoundError"
        );
        assert_eq!(
            DdnsError::Ambiguous {
                what: "record",
                count: 2
            }
            .kind()
            .to_string(),
            "AmbiguousResultError"
        );
    }

    #[test]
    fn test_provider_display() {
        let err = DdnsError::Provider {
            code: 4,
            message: "Authentication failed".to_string(),
            additional: Vec::new(),
        };
        assert_eq!(err.to_string(), "Error 4: Authentication failed");
        assert_eq!(err.kind(), ErrorKind::Provider);
    }

    #[test]
    fn test_json_error_is_format() {
        let err: DdnsError = serde_json::from_str::<serde_json::Value>("{nope")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::Format);
    }
}
