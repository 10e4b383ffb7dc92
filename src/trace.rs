//! Request/response tracing for debugging provider and IP endpoint calls.

use reqwest::StatusCode;
use std::sync::Arc;

/// Receives the raw traffic of every outbound call.
pub trait WireTrace: Send + Sync {
    /// Called before a request is sent.
    fn request(&self, uri: &str);

    /// Called with the status and full body of a response.
    fn response(&self, uri: &str, status: StatusCode, body: &str);
}

/// Discards everything.
pub struct NoTrace;

impl WireTrace for NoTrace {
    fn request(&self, _uri: &str) {}

    fn response(&self, _uri: &str, _status: StatusCode, _body: &str) {}
}

/// Emits traffic as `tracing` debug events on the `wire` target.
pub struct LogTrace;

impl WireTrace for LogTrace {
    fn request(&self, uri: &str) {
        tracing::debug!(target: "wire", "--> GET {}", uri);
    }

    fn response(&self, uri: &str, status: StatusCode, body: &str) {
        tracing::debug!(target: "wire", "<-- {} {}\n{}", status, uri, body);
    }
}

/// Pick the trace collaborator for the given debug setting.
pub fn for_debug(debug: bool) -> Arc<dyn WireTrace> {
    if debug {
        Arc::new(LogTrace)
    } else {
        Arc::new(NoTrace)
    }
}

/// Replace every occurrence of `secret` in `uri`.
pub fn redact(uri: &str, secret: &str) -> String {
    if secret.is_empty() {
        uri.to_string()
    } else {
        uri.replace(secret, "<redacted>")
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact() {
        assert_eq!(
            redact("https://api/?api_key=abc123&x=1", "abc123"),
            "https://api/?api_key=<redacted>&x=1"
        );
        assert_eq!(redact("https://api/", ""), "https://api/");
    }
}
