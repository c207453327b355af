//! Search execution
//!
//! Builds the SPML search for a host query and turns result rows back into
//! connector objects.

use tracing::{debug, error, info, instrument, warn};

use idm_connector::error::{ConnectorError, ConnectorResult};
use idm_connector::names;
use idm_connector::operation::{
    AttributeSet, AttributeValue, ConnectorObject, Filter, SearchOptions, Uid,
};
use idm_connector::traits::ResultsHandler;

use crate::client::{OperationTag, SpmlClient};
use crate::dates::DateNormalizer;
use crate::filter::{full_scan, translate, FilterTerm};
use crate::object_class::UmeObjectClass;
use crate::schema::{
    is_date_attribute, is_relationship_attribute, SchemaRegistry, ATTR_ID, ATTR_ISLOCKED,
    ATTR_LOGONNAME, ATTR_VALIDFROM, ATTR_VALIDTO,
};
use crate::spml::{SearchRequest, SearchResultEntry, SpmlRequest};

/// Account attributes read from UME in place of the operational ones.
const ACCOUNT_WIRE_ATTRIBUTES: [&str; 4] =
    [ATTR_LOGONNAME, ATTR_ISLOCKED, ATTR_VALIDFROM, ATTR_VALIDTO];

/// UME attribute names to request for an object class.
///
/// Operational attributes do not exist on the wire and are rebuilt from
/// `islocked`, `validfrom` and `validto`.
pub fn requested_attributes(
    registry: &SchemaRegistry,
    object_class: UmeObjectClass,
) -> Vec<String> {
    let mut attributes: Vec<String> = registry
        .attribute_names(object_class)
        .into_iter()
        .filter(|name| name != names::NAME && !names::is_operational(name))
        .collect();

    if object_class.is_account() {
        for name in ACCOUNT_WIRE_ATTRIBUTES {
            if !attributes.iter().any(|a| a == name) {
                attributes.push(name.to_string());
            }
        }
    }
    attributes
}

/// Filter to send: the translated host filter, or a full scan over the
/// name attribute.
pub fn search_filter(
    object_class: UmeObjectClass,
    filter: Option<&Filter>,
    full_search_pattern: &str,
) -> ConnectorResult<FilterTerm> {
    match filter {
        Some(filter) => translate(object_class, filter),
        None => Ok(full_scan(object_class.name_attribute(), full_search_pattern)),
    }
}

/// Host name of a UME attribute in result objects.
fn host_name(object_class: UmeObjectClass, attribute: &str) -> &str {
    match attribute {
        ATTR_VALIDFROM if object_class.is_account() => names::ENABLE_DATE,
        ATTR_VALIDTO if object_class.is_account() => names::DISABLE_DATE,
        ATTR_ISLOCKED if object_class.is_account() => names::LOCK_OUT,
        other => other,
    }
}

/// Rebuild a connector object from a search row.
///
/// Returns `None` for rows without any identifier.
pub(crate) fn build_object(
    object_class: UmeObjectClass,
    entry: &SearchResultEntry,
    requested: &[String],
    dates: &DateNormalizer,
) -> Option<ConnectorObject> {
    // UME can return a null id when searching roles and groups by id
    let uid = entry
        .value(ATTR_ID)
        .filter(|id| !id.is_empty())
        .or(entry.identifier.as_deref())
        .filter(|id| !id.is_empty())?
        .to_string();
    let name = entry
        .value(object_class.name_attribute())
        .unwrap_or(uid.as_str())
        .to_string();

    let mut attributes = AttributeSet::new();
    for attribute in requested {
        let attribute = attribute.as_str();
        if attribute == ATTR_ID || attribute == object_class.name_attribute() {
            continue;
        }
        let target = host_name(object_class, attribute);

        if is_relationship_attribute(attribute) {
            let values: Vec<AttributeValue> = entry
                .values(attribute)
                .iter()
                .map(|v| AttributeValue::from(v.as_str()))
                .collect();
            attributes.set(target, AttributeValue::Array(values));
            continue;
        }

        let Some(value) = entry.value(attribute) else {
            continue;
        };

        if is_date_attribute(attribute) {
            if value.trim().is_empty() {
                attributes.set(target, AttributeValue::Null);
                continue;
            }
            match dates.decode(value) {
                Ok(instant) => attributes.set(target, instant),
                Err(e) => error!(
                    attribute = %attribute,
                    value = %value,
                    error = %e,
                    "Cannot decode UME date"
                ),
            }
        } else if attribute == ATTR_ISLOCKED {
            attributes.set(target, value.eq_ignore_ascii_case("true"));
        } else {
            attributes.set(target, value);
        }
    }

    Some(ConnectorObject::new(
        object_class.host_name(),
        Uid::from_value(uid),
        name,
        attributes,
    ))
}

/// Runs searches against UME.
pub struct QueryExecutor<'a> {
    client: &'a SpmlClient,
    registry: &'a SchemaRegistry,
    dates: &'a DateNormalizer,
    full_search_pattern: &'a str,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(
        client: &'a SpmlClient,
        registry: &'a SchemaRegistry,
        dates: &'a DateNormalizer,
        full_search_pattern: &'a str,
    ) -> Self {
        Self {
            client,
            registry,
            dates,
            full_search_pattern,
        }
    }

    /// Search and hand each object to `handler` until it returns `false`.
    #[instrument(skip(self, filter, handler, options), fields(object_class = %object_class))]
    pub async fn search(
        &self,
        object_class: UmeObjectClass,
        filter: Option<&Filter>,
        handler: ResultsHandler<'_>,
        options: &SearchOptions,
    ) -> ConnectorResult<()> {
        info!(filtered = filter.is_some(), "Query started");

        let requested = requested_attributes(self.registry, object_class);
        let term = search_filter(object_class, filter, self.full_search_pattern)?;
        let request = SearchRequest::new(object_class.base())
            .with_filter(term)
            .with_attributes(requested.iter().map(String::as_str));

        let response = self
            .client
            .execute(&SpmlRequest::from(request), OperationTag::Query)
            .await?
            .ok_or_else(|| ConnectorError::operation_failed("Search returned no response"))?;
        debug!(rows = response.entries.len(), "Search response received");

        let mut delivered = 0usize;
        for entry in &response.entries {
            let Some(mut object) = build_object(object_class, entry, &requested, self.dates)
            else {
                warn!("Skipping search row without identifier");
                continue;
            };
            if let Some(wanted) = &options.attributes_to_get {
                object.attributes.retain(|name| wanted.iter().any(|w| w == name));
            }

            delivered += 1;
            if !handler(object) {
                debug!("Result handler stopped the query");
                break;
            }
        }

        info!(delivered, "Query finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone, Utc};

    use crate::spml::SpmlAttribute;

    fn utc() -> DateNormalizer {
        DateNormalizer::with_zone(Some(0), FixedOffset::east_opt(0).unwrap())
    }

    fn attr(name: &str, values: &[&str]) -> SpmlAttribute {
        SpmlAttribute::new(name, values.iter().map(|v| v.to_string()).collect())
    }

    // ========================================================================
    // Request construction
    // ========================================================================

    #[test]
    fn test_account_requested_attributes() {
        let registry = SchemaRegistry::new(vec!["costcenter".into()]);
        let attributes = requested_attributes(&registry, UmeObjectClass::Account);

        for name in ["id", "uniquename", "logonname", "islocked", "validfrom", "validto"] {
            assert!(attributes.iter().any(|a| a == name), "{name}");
        }
        assert!(attributes.iter().any(|a| a == "costcenter"));
        assert!(!attributes.iter().any(|a| a.starts_with("__")));
    }

    #[test]
    fn test_group_requested_attributes() {
        let registry = SchemaRegistry::default();
        let attributes = requested_attributes(&registry, UmeObjectClass::Group);

        assert!(attributes.iter().any(|a| a == "member"));
        assert!(attributes.iter().any(|a| a == "uniquename"));
        assert!(!attributes.iter().any(|a| a == "__NAME__" || a == "logonname"));
    }

    #[test]
    fn test_full_scan_without_filter() {
        let term = search_filter(UmeObjectClass::Account, None, "xy").unwrap();
        assert_eq!(
            term,
            FilterTerm::Or(vec![
                FilterTerm::initial("logonname", "x"),
                FilterTerm::initial("logonname", "y"),
            ])
        );

        let term = search_filter(UmeObjectClass::Role, None, "a").unwrap();
        assert_eq!(term.operands(), [FilterTerm::initial("uniquename", "a")]);
    }

    #[test]
    fn test_account_name_filter_uses_logonname() {
        let filter = Filter::eq(names::NAME, "Test.User");
        let term = search_filter(UmeObjectClass::Account, Some(&filter), "ab").unwrap();
        assert_eq!(term, FilterTerm::equal("logonname", "Test.User"));
    }

    // ========================================================================
    // Row rebuild
    // ========================================================================

    #[test]
    fn test_build_account_object() {
        let registry = SchemaRegistry::default();
        let requested = requested_attributes(&registry, UmeObjectClass::Account);
        let entry = SearchResultEntry {
            identifier: Some("USER.PRIVATE_DATASOURCE.un:Test.User".into()),
            attributes: vec![
                attr("id", &["USER.PRIVATE_DATASOURCE.un:Test.User"]),
                attr("logonname", &["Test.User"]),
                attr("lastname", &["User"]),
                attr("assignedroles", &["R1", "R2"]),
                attr("islocked", &["TRUE"]),
                attr("validfrom", &["20240101000000Z"]),
                attr("validto", &[""]),
                attr("lastmodifydate", &["not-a-date"]),
            ],
        };

        let object = build_object(UmeObjectClass::Account, &entry, &requested, &utc()).unwrap();
        assert_eq!(object.object_class, "__ACCOUNT__");
        assert_eq!(object.uid.value(), "USER.PRIVATE_DATASOURCE.un:Test.User");
        assert_eq!(object.name, "Test.User");

        let attrs = &object.attributes;
        assert!(!attrs.has("id"));
        assert!(!attrs.has("logonname"));
        assert_eq!(attrs.get_string("lastname"), Some("User"));
        assert_eq!(attrs.get_strings("assignedroles").unwrap(), vec!["R1", "R2"]);
        assert_eq!(attrs.get_strings("certificate").unwrap(), Vec::<&str>::new());
        assert_eq!(
            attrs.get("__LOCK_OUT__").and_then(|v| v.as_boolean()),
            Some(true)
        );
        assert_eq!(
            attrs.get("__ENABLE_DATE__").and_then(|v| v.as_datetime()),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(attrs.get("__DISABLE_DATE__"), Some(&AttributeValue::Null));
        assert!(!attrs.has("validfrom"));
        assert!(!attrs.has("lastmodifydate"));
        assert!(!attrs.has("email"));
    }

    #[test]
    fn test_build_role_object_falls_back_to_entry_identifier() {
        let registry = SchemaRegistry::default();
        let requested = requested_attributes(&registry, UmeObjectClass::Role);
        let entry = SearchResultEntry {
            identifier: Some("ROLE.UME_ROLE_PERSISTENCE.un:Admin".into()),
            attributes: vec![
                attr("uniquename", &["Admin"]),
                attr("member", &["USER.1", "USER.2"]),
                attr("lastmodifydate", &["20240102030405Z"]),
            ],
        };

        let object = build_object(UmeObjectClass::Role, &entry, &requested, &utc()).unwrap();
        assert_eq!(object.uid.value(), "ROLE.UME_ROLE_PERSISTENCE.un:Admin");
        assert_eq!(object.name, "Admin");
        assert!(!object.attributes.has("uniquename"));
        assert_eq!(
            object.attributes.get_strings("member").unwrap(),
            vec!["USER.1", "USER.2"]
        );
        assert_eq!(
            object
                .attributes
                .get("lastmodifydate")
                .and_then(|v| v.as_datetime()),
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap())
        );
    }

    #[test]
    fn test_row_without_identifier_is_skipped() {
        let entry = SearchResultEntry {
            identifier: None,
            attributes: vec![attr("uniquename", &["x"])],
        };
        assert!(build_object(UmeObjectClass::Group, &entry, &[], &utc()).is_none());
    }
}
