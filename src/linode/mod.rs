//! Linode DNS manager API client.
//!
//! The API answers every call with HTTP 200 and reports failures in-band:
//!
//! ```json
//! { "ERRORARRAY": [{"ERRORCODE": 4, "ERRORMESSAGE": "Authentication failed"}],
//!   "ACTION": "domain.list", "DATA": {} }
//! ```

mod records;

pub use records::{DomainRecord, ResourceRecord, UpdateRequest};
pub(crate) use records::{decode_domains, decode_resources};

use crate::config::{Config, KEY_PLACEHOLDER};
use crate::error::{DdnsError, ProviderFault, Result};
use crate::trace::{redact, WireTrace};
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Query parameters of an action, in the order they are sent.
pub type Params = Vec<(String, String)>;

/// Remote operations used by the reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Enumerate the zones visible to the key.
    DomainList,
    /// Enumerate the records of one zone.
    ResourceList,
    /// Overwrite one record.
    ResourceUpdate,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::DomainList => "domain.list",
            Action::ResourceList => "domain.resource.list",
            Action::ResourceUpdate => "domain.resource.update",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Executes provider actions and returns their `DATA` payload.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProviderApi: Send + Sync {
    async fn execute(&self, action: Action, params: Params) -> Result<Value>;
}

/// HTTP implementation of [`ProviderApi`].
pub struct LinodeClient {
    client: reqwest::Client,
    api_key: String,
    endpoint_template: String,
    trace: Arc<dyn WireTrace>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "ERRORARRAY")]
    errors: Vec<ApiError>,
    #[serde(rename = "DATA", default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "ERRORCODE", deserialize_with = "lenient_code")]
    code: i64,
    #[serde(rename = "ERRORMESSAGE", default)]
    message: String,
}

/// Error codes arrive as numbers, occasionally as numeric strings.
fn lenient_code<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Number(i64),
        Text(String),
    }

    match Code::deserialize(deserializer)? {
        Code::Number(n) => Ok(n),
        Code::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

impl LinodeClient {
    /// Create a client from the run configuration.
    pub fn new(client: reqwest::Client, config: &Config, trace: Arc<dyn WireTrace>) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            endpoint_template: config.api_endpoint_template.clone(),
            trace,
        }
    }

    /// Build the request URL for an action.
    fn action_url(&self, action: Action, params: &[(String, String)]) -> Result<Url> {
        let base = self
            .endpoint_template
            .replacen(KEY_PLACEHOLDER, &self.api_key, 1);
        let mut url = Url::parse(&base)
            .map_err(|e| DdnsError::Config(format!("invalid API endpoint: {}", e)))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("api_action", action.as_str());
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl ProviderApi for LinodeClient {
    async fn execute(&self, action: Action, params: Params) -> Result<Value> {
        let url = self.action_url(action, &params)?;
        let shown = redact(url.as_str(), &self.api_key);

        self.trace.request(&shown);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let text = response.text().await?;
        self.trace.response(&shown, status, &text);

        let envelope: Envelope = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(DdnsError::Network(format!(
                    "HTTP {} from provider ({})",
                    status, action
                )));
            }
            Err(e) => {
                return Err(DdnsError::Format(format!(
                    "unreadable {} response: {}",
                    action, e
                )));
            }
        };

        unwrap_envelope(action, envelope)
    }
}

/// Turn the in-band error array into an error, or hand back `DATA`.
fn unwrap_envelope(action: Action, envelope: Envelope) -> Result<Value> {
    let mut errors = envelope.errors.into_iter();
    if let Some(first) = errors.next() {
        let additional: Vec<ProviderFault> = errors
            .map(|e| ProviderFault {
                code: e.code,
                message: e.message,
            })
            .collect();
        for extra in &additional {
            tracing::warn!(
                "{} also reported error {}: {}",
                action,
                extra.code,
                extra.message
            );
        }
        return Err(DdnsError::Provider {
            code: first.code,
            message: first.message,
            additional,
        });
    }

    envelope
        .data
        .ok_or_else(|| DdnsError::Format(format!("{} response has no DATA", action)))
}
