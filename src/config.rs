//! Configuration management for linode-ddns.

use crate::error::{DdnsError, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Placeholder replaced by the API key in the endpoint template.
pub const KEY_PLACEHOLDER: &str = "%s";

/// Resolved, read-only configuration for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Linode API key (or environment variable name if prefixed with $).
    pub api_key: String,

    /// Fully-qualified host to keep updated (e.g., "home.example.com").
    pub domain_name: String,

    /// Leaf label of the record. Derived from `domain_name` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,

    /// URL returning the caller's public IP as plain text.
    #[serde(default = "default_ip_endpoint")]
    pub ip_endpoint: String,

    /// API URL; `%s` is replaced with the API key.
    #[serde(default = "default_api_endpoint_template")]
    pub api_endpoint_template: String,

    /// How the owning zone is matched against `domain_name`.
    #[serde(default)]
    pub domain_match: DomainMatch,

    /// HTTP timeout in seconds, applied to every request.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Trace raw requests and responses to stderr.
    #[serde(default)]
    pub debug: bool,

    /// How the record is picked out of the zone's resource list.
    #[serde(default)]
    pub lookup: LookupMode,
}

fn default_ip_endpoint() -> String {
    "http://ip.thegrebs.com/".to_string()
}

fn default_api_endpoint_template() -> String {
    "https://api.linode.com/api/?api_key=%s&resultFormat=JSON".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Zone matching mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainMatch {
    /// The host is the zone itself or lies under it.
    #[default]
    Suffix,
    /// The host must be the zone itself.
    Exact,
}

/// Record lookup strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LookupMode {
    /// Record name joined with the zone must equal the host.
    #[default]
    Name,
    /// Record name must equal the resource label.
    Label,
    /// Fetch one specific record by its provider id.
    ResourceId { resource_id: u64 },
}

impl Config {
    /// Get the default config file path.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DdnsError::Config("Could not find config directory".to_string()))?;

        Ok(config_dir.join("linode-ddns").join("config.toml"))
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DdnsError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse, resolve secrets and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.api_key = resolve_env(&config.api_key)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration before any network call is made.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(DdnsError::Config("api_key is empty".to_string()));
        }

        let host = self.host();
        if host.is_empty() || host.contains(char::is_whitespace) {
            return Err(DdnsError::Config(format!(
                "domain_name {:?} is not a valid host name",
                self.domain_name
            )));
        }

        if let Some(label) = &self.resource_name {
            if label.contains('.') || label.contains(char::is_whitespace) {
                return Err(DdnsError::Config(format!(
                    "resource_name {:?} must be a single label",
                    label
                )));
            }
        }

        let placeholders = self.api_endpoint_template.matches(KEY_PLACEHOLDER).count();
        if placeholders != 1 {
            return Err(DdnsError::Config(format!(
                "api_endpoint_template must contain exactly one {} placeholder, found {}",
                KEY_PLACEHOLDER, placeholders
            )));
        }
        check_http_url(
            "api_endpoint_template",
            &self.api_endpoint_template.replacen(KEY_PLACEHOLDER, "key", 1),
        )?;
        check_http_url("ip_endpoint", &self.ip_endpoint)?;

        if self.timeout_secs == 0 {
            return Err(DdnsError::Config("timeout_secs must be positive".to_string()));
        }

        if let LookupMode::ResourceId { resource_id: 0 } = self.lookup {
            return Err(DdnsError::Config("resource_id must be non-zero".to_string()));
        }

        Ok(())
    }

    /// Target host, lowercased and without a trailing dot.
    pub fn host(&self) -> String {
        normalize_name(&self.domain_name)
    }

    /// Leaf label of the record inside `zone`.
    ///
    /// An explicit `resource_name` wins. Otherwise the zone is stripped from
    /// the host; the apex maps to the empty label.
    pub fn resource_label(&self, zone: &str) -> Option<String> {
        if let Some(label) = &self.resource_name {
            return Some(label.to_ascii_lowercase());
        }

        let host = self.host();
        let zone = normalize_name(zone);
        if host == zone {
            return Some(String::new());
        }
        host.strip_suffix(&zone)
            .and_then(|rest| rest.strip_suffix('.'))
            .map(|label| label.to_string())
    }

    /// Generate example configuration.
    pub fn example() -> Self {
        Self {
            api_key: "$LINODE_API_KEY".to_string(),
            domain_name: "home.example.com".to_string(),
            resource_name: None,
            ip_endpoint: default_ip_endpoint(),
            api_endpoint_template: default_api_endpoint_template(),
            domain_match: DomainMatch::Suffix,
            timeout_secs: default_timeout(),
            debug: false,
            lookup: LookupMode::Name,
        }
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| DdnsError::Unexpected(e.to_string()))
    }
}

/// Lowercase a DNS name and drop a trailing dot.
pub fn normalize_name(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

fn check_http_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| DdnsError::Config(format!("{} is not a valid URL: {}", field, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(DdnsError::Config(format!(
            "{} must use http or https, not {}",
            field, other
        ))),
    }
}

/// Resolve environment variable references (values starting with $).
pub(crate) fn resolve_env(value: &str) -> Result<String> {
    match value.strip_prefix('$') {
        Some(var_name) => std::env::var(var_name).map_err(|_| {
            DdnsError::Config(format!("environment variable {} is not set", var_name))
        }),
        None => Ok(value.to_string()),
    }
}
