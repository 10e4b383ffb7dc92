//! Resolution of the managed record: zone first, then the record inside it.
//!
//! The API has no "find by name" query, so both steps list a collection and
//! scan it in the order the provider returned it. The first match wins; two
//! records with the same name are not disambiguated.

use crate::config::{normalize_name, Config, DomainMatch, LookupMode};
use crate::error::{DdnsError, Result};
use crate::linode::{
    decode_domains, decode_resources, Action, DomainRecord, ProviderApi, ResourceRecord,
};

/// Walks `domain.list` and `domain.resource.list` to find the record.
pub struct RecordLocator<'a> {
    api: &'a dyn ProviderApi,
}

impl<'a> RecordLocator<'a> {
    pub fn new(api: &'a dyn ProviderApi) -> Self {
        Self { api }
    }

    /// Resolve the record configured for this run.
    pub async fn locate(&self, config: &Config) -> Result<ResourceRecord> {
        let domain = self.find_domain(config).await?;
        tracing::debug!(
            "Resolved zone {} (id {})",
            domain.domain_name,
            domain.domain_id
        );

        let record = self.find_resource(config, &domain).await?;
        tracing::debug!(
            "Resolved record {} (id {}, {} {})",
            record.name,
            record.resource_id,
            record.record_type,
            record.target
        );
        Ok(record)
    }

    /// First zone in listing order that owns the configured host.
    async fn find_domain(&self, config: &Config) -> Result<DomainRecord> {
        let data = self.api.execute(Action::DomainList, Vec::new()).await?;
        let host = config.host();

        decode_domains(data)?
            .into_iter()
            .find(|domain| zone_matches(&host, &domain.domain_name, config.domain_match))
            .ok_or(DdnsError::NotFound { what: "domain" })
    }

    async fn find_resource(&self, config: &Config, domain: &DomainRecord) -> Result<ResourceRecord> {
        let mut params = vec![("DomainID".to_string(), domain.domain_id.to_string())];
        if let LookupMode::ResourceId { resource_id } = config.lookup {
            params.push(("ResourceID".to_string(), resource_id.to_string()));
        }

        let data = self.api.execute(Action::ResourceList, params).await?;
        let records = decode_resources(data, domain.domain_id)?;

        match &config.lookup {
            LookupMode::ResourceId { resource_id } => {
                let record = exactly_one(records)?;
                if record.resource_id != *resource_id {
                    tracing::warn!(
                        "Asked for record {} but provider returned {}",
                        resource_id,
                        record.resource_id
                    );
                    return Err(DdnsError::NotFound { what: "record" });
                }
                Ok(record)
            }
            LookupMode::Name => {
                let host = config.host();
                records
                    .into_iter()
                    .filter(ResourceRecord::is_address)
                    .find(|r| qualify(&r.name, &domain.domain_name) == host)
                    .ok_or(DdnsError::NotFound { what: "record" })
            }
            LookupMode::Label => {
                let label = config
                    .resource_label(&domain.domain_name)
                    .ok_or(DdnsError::NotFound { what: "record" })?;
                records
                    .into_iter()
                    .filter(ResourceRecord::is_address)
                    .find(|r| normalize_name(&r.name) == label)
                    .ok_or(DdnsError::NotFound { what: "record" })
            }
        }
    }
}

/// Whether `zone` owns `host` under the given mode.
fn zone_matches(host: &str, zone: &str, mode: DomainMatch) -> bool {
    let zone = normalize_name(zone);
    if zone.is_empty() {
        return false;
    }
    match mode {
        DomainMatch::Exact => host == zone,
        DomainMatch::Suffix => {
            host == zone
                || host
                    .strip_suffix(zone.as_str())
                    .is_some_and(|rest| rest.ends_with('.'))
        }
    }
}

/// Fully-qualified name of a record; the empty label is the apex.
fn qualify(name: &str, zone: &str) -> String {
    let name = normalize_name(name);
    let zone = normalize_name(zone);
    if name.is_empty() {
        zone
    } else {
        format!("{}.{}", name, zone)
    }
}

fn exactly_one(records: Vec<ResourceRecord>) -> Result<ResourceRecord> {
    let count = records.len();
    let mut iter = records.into_iter();
    match (iter.next(), iter.next()) {
        (Some(record), None) => Ok(record),
        _ => Err(DdnsError::Ambiguous {
            what: "record",
            count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::linode::MockProviderApi;
    use mockall::Sequence;
    use serde_json::{json, Value};

    fn domains() -> Value {
        json!([
            {"DOMAIN": "notexample.com", "DOMAINID": 3},
            {"DOMAIN": "example.com", "DOMAINID": 5},
            {"DOMAIN": "example.com", "DOMAINID": 6}
        ])
    }

    fn resources() -> Value {
        json!([
            {"NAME": "home", "RESOURCEID": 70, "TARGET": "v=spf1 -all", "TYPE": "TXT", "TTL_SEC": 300},
            {"NAME": "home", "RESOURCEID": 77, "TARGET": "1.2.3.4", "TYPE": "A", "TTL_SEC": 300},
            {"NAME": "home", "RESOURCEID": 78, "TARGET": "1.2.3.9", "TYPE": "A", "TTL_SEC": 300},
            {"NAME": "", "RESOURCEID": 80, "TARGET": "9.9.9.9", "TYPE": "A", "TTL_SEC": 0}
        ])
    }

    /// Mock that answers the two listing calls with the given payloads.
    fn mock_listing(domain_data: Value, resource_data: Value) -> MockProviderApi {
        let mut api = MockProviderApi::new();
        let mut seq = Sequence::new();
        api.expect_execute()
            .withf(|action, params| *action == Action::DomainList && params.is_empty())
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_, _| Ok(domain_data.clone()));
        api.expect_execute()
            .withf(|action, params| {
                *action == Action::ResourceList
                    && params.first() == Some(&("DomainID".to_string(), "5".to_string()))
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_, _| Ok(resource_data.clone()));
        api
    }

    #[tokio::test]
    async fn test_locate_by_name_takes_first_address_match() {
        let api = mock_listing(domains(), resources());
        let record = RecordLocator::new(&api)
            .locate(&Config::example())
            .await
            .unwrap();

        assert_eq!(record.resource_id, 77);
        assert_eq!(record.domain_id, 5);
        assert_eq!(record.target, "1.2.3.4");
    }

    #[tokio::test]
    async fn test_locate_apex() {
        let api = mock_listing(domains(), resources());
        let mut config = Config::example();
        config.domain_name = "EXAMPLE.com.".to_string();

        let record = RecordLocator::new(&api).locate(&config).await.unwrap();
        assert_eq!(record.resource_id, 80);
    }

    #[tokio::test]
    async fn test_locate_by_label() {
        let api = mock_listing(domains(), resources());
        let mut config = Config::example();
        config.domain_name = "example.com".to_string();
        config.domain_match = DomainMatch::Exact;
        config.resource_name = Some("home".to_string());
        config.lookup = LookupMode::Label;

        let record = RecordLocator::new(&api).locate(&config).await.unwrap();
        assert_eq!(record.resource_id, 77);
    }

    #[tokio::test]
    async fn test_locate_by_resource_id_accepts_singleton_object() {
        let mut api = MockProviderApi::new();
        api.expect_execute()
            .withf(|action, _| *action == Action::DomainList)
            .times(1)
            .returning(|_, _| Ok(domains()));
        api.expect_execute()
            .withf(|action, params| {
                *action == Action::ResourceList
                    && params.contains(&("ResourceID".to_string(), "77".to_string()))
            })
            .times(1)
            .returning(|_, _| {
                Ok(json!({"NAME": "home", "RESOURCEID": 77, "TARGET": "1.2.3.4", "TYPE": "A", "TTL_SEC": 300}))
            });

        let mut config = Config::example();
        config.lookup = LookupMode::ResourceId { resource_id: 77 };

        let record = RecordLocator::new(&api).locate(&config).await.unwrap();
        assert_eq!(record.resource_id, 77);
        assert_eq!(record.domain_id, 5);
    }

    #[tokio::test]
    async fn test_locate_by_resource_id_rejects_many() {
        let api = mock_listing(domains(), resources());
        let mut config = Config::example();
        config.lookup = LookupMode::ResourceId { resource_id: 77 };

        let err = RecordLocator::new(&api).locate(&config).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AmbiguousResult);
    }

    #[tokio::test]
    async fn test_locate_by_resource_id_rejects_none() {
        let api = mock_listing(domains(), json!([]));
        let mut config = Config::example();
        config.lookup = LookupMode::ResourceId { resource_id: 77 };

        let err = RecordLocator::new(&api).locate(&config).await.unwrap_err();
        assert!(matches!(err, DdnsError::Ambiguous { count: 0, .. }));
    }

    #[tokio::test]
    async fn test_locate_by_resource_id_rejects_other_record() {
        let mut api = MockProviderApi::new();
        api.expect_execute()
            .withf(|action, _| *action == Action::DomainList)
            .times(1)
            .returning(|_, _| Ok(domains()));
        api.expect_execute()
            .withf(|action, _| *action == Action::ResourceList)
            .times(1)
            .returning(|_, _| {
                Ok(json!([{"NAME": "home", "RESOURCEID": 78, "TARGET": "1.2.3.9", "TYPE": "A", "TTL_SEC": 300}]))
            });

        let mut config = Config::example();
        config.lookup = LookupMode::ResourceId { resource_id: 77 };

        let err = RecordLocator::new(&api).locate(&config).await.unwrap_err();
        assert!(matches!(err, DdnsError::NotFound { what: "record" }));
    }

    #[tokio::test]
    async fn test_unknown_domain_skips_resource_listing() {
        let mut api = MockProviderApi::new();
        api.expect_execute()
            .withf(|action, _| *action == Action::DomainList)
            .times(1)
            .returning(|_, _| Ok(json!([{"DOMAIN": "other.org", "DOMAINID": 1}])));

        let err = RecordLocator::new(&api)
            .locate(&Config::example())
            .await
            .unwrap_err();
        assert!(matches!(err, DdnsError::NotFound { what: "domain" }));
    }

    #[tokio::test]
    async fn test_unknown_record() {
        let api = mock_listing(domains(), resources());
        let mut config = Config::example();
        config.domain_name = "office.example.com".to_string();

        let err = RecordLocator::new(&api).locate(&config).await.unwrap_err();
        assert!(matches!(err, DdnsError::NotFound { what: "record" }));
    }

    #[tokio::test]
    async fn test_provider_error_stops_lookup() {
        let mut api = MockProviderApi::new();
        api.expect_execute().times(1).returning(|_, _| {
            Err(DdnsError::Provider {
                code: 4,
                message: "Authentication failed".to_string(),
                additional: Vec::new(),
            })
        });

        let err = RecordLocator::new(&api)
            .locate(&Config::example())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Provider);
    }

    #[tokio::test]
    async fn test_locate_is_idempotent() {
        let mut api = MockProviderApi::new();
        api.expect_execute()
            .withf(|action, _| *action == Action::DomainList)
            .times(2)
            .returning(|_, _| Ok(domains()));
        api.expect_execute()
            .withf(|action, _| *action == Action::ResourceList)
            .times(2)
            .returning(|_, _| Ok(resources()));

        let locator = RecordLocator::new(&api);
        let config = Config::example();
        let first = locator.locate(&config).await.unwrap();
        let second = locator.locate(&config).await.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_zone_matches() {
        assert!(zone_matches("home.example.com", "example.com", DomainMatch::Suffix));
        assert!(zone_matches("example.com", "Example.com.", DomainMatch::Suffix));
        assert!(!zone_matches("home.notexample.com", "example.com", DomainMatch::Suffix));
        assert!(!zone_matches("home.example.com", "example.com", DomainMatch::Exact));
        assert!(zone_matches("example.com", "example.com", DomainMatch::Exact));
        assert!(!zone_matches("example.com", "", DomainMatch::Suffix));
    }

    #[test]
    fn test_qualify() {
        assert_eq!(qualify("home", "example.com"), "home.example.com");
        assert_eq!(qualify("", "example.com"), "example.com");
    }
}
