//! Zone and record types as the API lists them.

use super::Params;
use crate::error::{DdnsError, Result};
use serde::Deserialize;
use serde_json::Value;

/// A zone returned by `domain.list`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DomainRecord {
    #[serde(rename = "DOMAINID")]
    pub domain_id: u64,
    #[serde(rename = "DOMAIN")]
    pub domain_name: String,
}

/// The address record under management.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub resource_id: u64,
    pub domain_id: u64,
    pub name: String,
    pub record_type: String,
    pub target: String,
    pub ttl_seconds: u32,
}

#[derive(Debug, Deserialize)]
struct RawResource {
    #[serde(rename = "RESOURCEID")]
    resource_id: u64,
    #[serde(rename = "DOMAINID", default)]
    domain_id: Option<u64>,
    #[serde(rename = "NAME", default)]
    name: String,
    #[serde(rename = "TYPE")]
    record_type: String,
    #[serde(rename = "TARGET")]
    target: String,
    #[serde(rename = "TTL_SEC")]
    ttl_seconds: u32,
}

impl ResourceRecord {
    /// Whether this is an A or AAAA record.
    pub fn is_address(&self) -> bool {
        self.record_type.eq_ignore_ascii_case("A") || self.record_type.eq_ignore_ascii_case("AAAA")
    }
}

/// Full replacement of a record with a new target.
///
/// The update action overwrites every field, so all of them are resent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub record: ResourceRecord,
}

impl UpdateRequest {
    /// Copy `record` with only the target replaced.
    pub fn retarget(record: &ResourceRecord, target: &str) -> Self {
        Self {
            record: ResourceRecord {
                target: target.to_string(),
                ..record.clone()
            },
        }
    }

    /// Parameters of `domain.resource.update`.
    pub fn params(&self) -> Params {
        let r = &self.record;
        vec![
            ("ResourceID".to_string(), r.resource_id.to_string()),
            ("DomainID".to_string(), r.domain_id.to_string()),
            ("Name".to_string(), r.name.clone()),
            ("Type".to_string(), r.record_type.clone()),
            ("Target".to_string(), r.target.clone()),
            ("TTL_Sec".to_string(), r.ttl_seconds.to_string()),
        ]
    }
}

/// Normalize a `DATA` payload to a collection.
///
/// Arrays are taken as-is, a non-empty object counts as a single element and
/// an empty object as no elements.
pub(crate) fn into_collection(data: Value, what: &str) -> Result<Vec<Value>> {
    match data {
        Value::Array(items) => Ok(items),
        Value::Object(map) if map.is_empty() => Ok(Vec::new()),
        obj @ Value::Object(_) => Ok(vec![obj]),
        other => Err(DdnsError::Format(format!(
            "{} listing is neither a list nor an object: {}",
            what, other
        ))),
    }
}

/// Decode a `domain.list` payload.
pub(crate) fn decode_domains(data: Value) -> Result<Vec<DomainRecord>> {
    into_collection(data, "domain")?
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(DdnsError::from))
        .collect()
}

/// Decode a `domain.resource.list` payload scoped to `domain_id`.
pub(crate) fn decode_resources(data: Value, domain_id: u64) -> Result<Vec<ResourceRecord>> {
    into_collection(data, "record")?
        .into_iter()
        .map(|item| -> Result<ResourceRecord> {
            let raw: RawResource = serde_json::from_value(item)?;
            Ok(ResourceRecord {
                resource_id: raw.resource_id,
                domain_id: raw.domain_id.unwrap_or(domain_id),
                name: raw.name,
                record_type: raw.record_type,
                target: raw.target,
                ttl_seconds: raw.ttl_seconds,
            })
        })
        .collect()
}
