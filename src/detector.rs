//! Public IP detection.

use crate::error::{DdnsError, Result};
use crate::trace::WireTrace;
use std::net::IpAddr;
use std::sync::Arc;

/// Asks a plain-text endpoint for the caller's public address.
pub struct IpDetector {
    client: reqwest::Client,
    endpoint: String,
    trace: Arc<dyn WireTrace>,
}

impl IpDetector {
    /// Create a detector for `endpoint`.
    pub fn new(client: reqwest::Client, endpoint: String, trace: Arc<dyn WireTrace>) -> Self {
        Self {
            client,
            endpoint,
            trace,
        }
    }

    /// Fetch the public IP as the endpoint reports it.
    ///
    /// The trimmed body is returned verbatim so that the comparison against
    /// the record target sees exactly what the endpoint sent.
    pub async fn current_public_ip(&self) -> Result<String> {
        self.trace.request(&self.endpoint);
        let response = self.client.get(&self.endpoint).send().await?;
        let status = response.status();
        let text = response.text().await?;
        self.trace.response(&self.endpoint, status, &text);

        if !status.is_success() {
            return Err(DdnsError::Network(format!(
                "HTTP {} from {}",
                status, self.endpoint
            )));
        }

        let ip = parse_ip_body(&text)?;
        tracing::debug!("Detected public IP {} from {}", ip, self.endpoint);
        Ok(ip)
    }
}

/// Validate a plain-text IP response body.
fn parse_ip_body(body: &str) -> Result<String> {
    let ip_str = body.trim();
    if ip_str.is_empty() {
        return Err(DdnsError::Format("IP endpoint returned an empty body".to_string()));
    }

    ip_str
        .parse::<IpAddr>()
        .map(|_| ip_str.to_string())
        .map_err(|_| DdnsError::Format(format!("Invalid IP response: {}", truncate(ip_str))))
}

fn truncate(s: &str) -> &str {
    match s.char_indices().nth(64) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
