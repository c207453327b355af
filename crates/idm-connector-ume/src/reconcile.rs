//! Create and update reconciliation
//!
//! Turns host attribute sets into SPML add and modify requests. Passwords,
//! lock and enable flags, validity dates and relationship lists each get
//! their own handling; everything else is written as a plain value.

use std::collections::HashSet;

use tracing::{debug, error, info, instrument};

use idm_connector::error::{ConnectorError, ConnectorResult};
use idm_connector::names;
use idm_connector::operation::{AttributeSet, AttributeValue, Uid};

use crate::client::{OperationTag, SpmlClient};
use crate::config::UmeConfig;
use crate::dates::DateNormalizer;
use crate::filter::FilterTerm;
use crate::object_class::UmeObjectClass;
use crate::schema::{
    is_date_attribute, is_relationship_attribute, ATTR_ID, ATTR_ISLOCKED, ATTR_OLDPASSWORD,
    ATTR_PASSWORD, ATTR_VALIDFROM, ATTR_VALIDTO,
};
use crate::spml::{AddRequest, Modification, ModifyRequest, SearchRequest, SpmlRequest};

/// Compute the changes turning `current` into `target`.
///
/// Returns `(adds, removes)`: values of `target` missing from `current`, and
/// values of `current` missing from `target`. Both keep input order and
/// contain no duplicates.
pub fn diff_lists(current: &[String], target: &[String]) -> (Vec<String>, Vec<String>) {
    let current_set: HashSet<&str> = current.iter().map(String::as_str).collect();
    let target_set: HashSet<&str> = target.iter().map(String::as_str).collect();

    let mut seen = HashSet::new();
    let adds = target
        .iter()
        .filter(|v| !current_set.contains(v.as_str()) && seen.insert(v.as_str()))
        .cloned()
        .collect();

    let mut seen = HashSet::new();
    let removes = current
        .iter()
        .filter(|v| !target_set.contains(v.as_str()) && seen.insert(v.as_str()))
        .cloned()
        .collect();

    (adds, removes)
}

/// Read a boolean flag from a host value. Strings compare to "true".
fn flag(value: &AttributeValue) -> Option<bool> {
    match value.first()? {
        AttributeValue::Boolean(b) => Some(*b),
        AttributeValue::String(s) => Some(s.eq_ignore_ascii_case("true")),
        _ => None,
    }
}

fn text(value: &AttributeValue) -> String {
    value.first().map(AttributeValue::to_text).unwrap_or_default()
}

/// Host attributes sorted by how they are written.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Plan {
    /// Plain values, keyed by UME name.
    pub scalars: Vec<(String, String)>,
    /// Target lists of relationship attributes.
    pub relationships: Vec<(String, Vec<String>)>,
    pub password: Option<String>,
    pub locked: Option<bool>,
    pub enable: Option<bool>,
    pub valid_from: Option<String>,
    pub valid_to: Option<String>,
}

/// Builds and sends create and update requests.
pub struct Reconciler<'a> {
    client: &'a SpmlClient,
    config: &'a UmeConfig,
    dates: &'a DateNormalizer,
}

impl<'a> Reconciler<'a> {
    pub fn new(client: &'a SpmlClient, config: &'a UmeConfig, dates: &'a DateNormalizer) -> Self {
        Self {
            client,
            config,
            dates,
        }
    }

    // ========================================================================
    // Planning
    // ========================================================================

    /// Sort host attributes into a write plan.
    pub(crate) fn plan(
        &self,
        object_class: UmeObjectClass,
        attributes: &AttributeSet,
    ) -> ConnectorResult<Plan> {
        let mut plan = Plan::default();

        for (name, value) in attributes.iter() {
            let remote = object_class.remote_name(name);
            match remote {
                ATTR_ID => debug!(attribute = %name, "Skipping identifier attribute"),
                ATTR_PASSWORD | names::PASSWORD => {
                    plan.password = value.first().map(AttributeValue::to_text);
                }
                names::LOCK_OUT => plan.locked = Some(flag(value).unwrap_or(false)),
                ATTR_ISLOCKED => debug!("islocked is not writable directly, use __LOCK_OUT__"),
                names::ENABLE => plan.enable = Some(flag(value) != Some(false)),
                names::ENABLE_DATE | ATTR_VALIDFROM => {
                    plan.valid_from = self.dates.encode_value(value)?;
                }
                names::DISABLE_DATE | ATTR_VALIDTO => {
                    plan.valid_to = self.dates.encode_value(value)?;
                }
                _ if is_date_attribute(remote) => {
                    if let Some(encoded) = self.dates.encode_value(value)? {
                        plan.scalars.push((remote.to_string(), encoded));
                    }
                }
                _ if is_relationship_attribute(remote) => {
                    let values = value.values().into_iter().map(AttributeValue::to_text);
                    plan.relationships.push((remote.to_string(), values.collect()));
                }
                _ => plan.scalars.push((remote.to_string(), text(value))),
            }
        }

        Ok(plan)
    }

    /// Validity window to write, explicit dates first.
    ///
    /// When the enable flag is present the configured enable or disable
    /// window fills whichever boundary has no explicit date.
    pub(crate) fn validity(
        &self,
        plan: &Plan,
    ) -> ConnectorResult<(Option<String>, Option<String>)> {
        let (window_from, window_to) = match plan.enable {
            Some(true) => (
                self.dates.parse_valid_time(&self.config.enable_valid_from_time)?,
                self.dates.parse_valid_time(&self.config.enable_valid_to_time)?,
            ),
            Some(false) => (
                self.dates.parse_valid_time(&self.config.disable_valid_from_time)?,
                self.dates.parse_valid_time(&self.config.disable_valid_to_time)?,
            ),
            None => (None, None),
        };

        Ok((
            plan.valid_from.clone().or(window_from),
            plan.valid_to.clone().or(window_to),
        ))
    }

    /// Password to send now, and the real one if it goes in a second request.
    fn password_phase(&self, real: &str, initial: bool) -> (String, Option<String>) {
        if initial {
            (real.to_string(), None)
        } else {
            (self.config.dummy_password.clone(), Some(real.to_string()))
        }
    }

    // ========================================================================
    // Create
    // ========================================================================

    /// Build the add request for a plan.
    ///
    /// Returns the request and the password still to be set afterwards.
    pub(crate) fn add_request(
        &self,
        object_class: UmeObjectClass,
        plan: &Plan,
    ) -> ConnectorResult<(AddRequest, Option<String>)> {
        let mut request = AddRequest::new(object_class.base());

        for (name, value) in &plan.scalars {
            request.set_value(name, value);
        }
        // Relationship lists are reconciled on update; an add carries the first value only
        for (name, values) in &plan.relationships {
            if let Some(first) = values.first() {
                request.set_value(name, first);
            }
        }
        if let Some(locked) = plan.locked {
            request.set_value(ATTR_ISLOCKED, locked.to_string());
        }

        let (valid_from, valid_to) = self.validity(plan)?;
        if let Some(from) = valid_from {
            request.set_value(ATTR_VALIDFROM, from);
        }
        if let Some(to) = valid_to {
            request.set_value(ATTR_VALIDTO, to);
        }

        let mut pending = None;
        if let Some(real) = &plan.password {
            let (now, later) =
                self.password_phase(real, self.config.initial_password_after_create);
            request.set_value(ATTR_PASSWORD, now);
            pending = later;
        }

        Ok((request, pending))
    }

    /// Create an object and return its identifier.
    ///
    /// Returns `None` without contacting UME when nothing is left to send.
    #[instrument(skip(self, attributes), fields(object_class = %object_class))]
    pub async fn create(
        &self,
        object_class: UmeObjectClass,
        attributes: &AttributeSet,
    ) -> ConnectorResult<Option<Uid>> {
        if !object_class.supports_create_delete() {
            return Err(ConnectorError::unsupported("create", object_class.host_name()));
        }

        let plan = self.plan(object_class, attributes)?;
        let (request, pending_password) = self.add_request(object_class, &plan)?;
        if request.is_empty() {
            error!("Add Request attributes can't be empty");
            return Ok(None);
        }

        let response = self
            .client
            .execute(&SpmlRequest::from(request), OperationTag::Create)
            .await?;
        let identifier = response
            .and_then(|r| r.identifier)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                ConnectorError::operation_failed("Add response carried no identifier")
            })?;

        if let Some(real) = pending_password {
            self.set_password(&identifier, &real).await?;
        }

        info!(uid = %identifier, "Object created successfully");
        Ok(Some(Uid::from_value(identifier)))
    }

    // ========================================================================
    // Update
    // ========================================================================

    /// Current values of one relationship attribute.
    async fn current_values(
        &self,
        object_class: UmeObjectClass,
        identifier: &str,
        attribute: &str,
    ) -> ConnectorResult<Vec<String>> {
        let request = SearchRequest::new(object_class.base())
            .with_filter(FilterTerm::equal(ATTR_ID, identifier))
            .with_attributes([attribute]);

        let response = self
            .client
            .execute(&SpmlRequest::from(request), OperationTag::Update)
            .await?
            .ok_or_else(|| ConnectorError::operation_failed("Search returned no response"))?;

        let entry = response.entries.first().ok_or_else(|| ConnectorError::ObjectNotFound {
            message: format!("{object_class} {identifier} not found"),
        })?;
        Ok(entry.values(attribute).to_vec())
    }

    /// Modifications for everything but relationship lists.
    ///
    /// Returns the modifications and the password still to be set afterwards.
    pub(crate) fn modifications(
        &self,
        plan: &Plan,
    ) -> ConnectorResult<(Vec<Modification>, Option<String>)> {
        let mut modifications: Vec<Modification> = plan
            .scalars
            .iter()
            .map(|(name, value)| Modification::replace(name, value))
            .collect();

        if let Some(locked) = plan.locked {
            modifications.push(Modification::replace(ATTR_ISLOCKED, locked.to_string()));
        }

        let (valid_from, valid_to) = self.validity(plan)?;
        if let Some(from) = valid_from {
            modifications.push(Modification::replace(ATTR_VALIDFROM, from));
        }
        if let Some(to) = valid_to {
            modifications.push(Modification::replace(ATTR_VALIDTO, to));
        }

        let mut pending = None;
        if let Some(real) = &plan.password {
            let (now, later) =
                self.password_phase(real, self.config.initial_password_after_update);
            modifications.push(Modification::replace(ATTR_PASSWORD, now));
            pending = later;
        }

        Ok((modifications, pending))
    }

    /// Update an object.
    ///
    /// Relationship attributes carry target lists. The current list is read
    /// first and only the difference is sent.
    #[instrument(skip(self, attributes), fields(object_class = %object_class, uid = %uid.value()))]
    pub async fn update(
        &self,
        object_class: UmeObjectClass,
        uid: &Uid,
        attributes: &AttributeSet,
    ) -> ConnectorResult<Uid> {
        let identifier = uid.value();
        let plan = self.plan(object_class, attributes)?;

        let mut request = ModifyRequest::new(identifier);
        for (name, target) in &plan.relationships {
            let current = self.current_values(object_class, identifier, name).await?;
            let (adds, removes) = diff_lists(&current, target);
            debug!(
                attribute = %name,
                adds = adds.len(),
                removes = removes.len(),
                "Relationship changes"
            );
            for value in adds {
                request.push(Modification::add(name, value));
            }
            for value in removes {
                request.push(Modification::delete(name, value));
            }
        }

        let (modifications, pending_password) = self.modifications(&plan)?;
        for modification in modifications {
            request.push(modification);
        }

        if request.is_empty() {
            error!("Modify Request attributes can't be empty");
            return Ok(Uid::from_value(identifier));
        }

        self.client
            .execute(&SpmlRequest::from(request), OperationTag::Update)
            .await?;

        if let Some(real) = pending_password {
            self.set_password(identifier, &real).await?;
        }

        info!(uid = %identifier, "Object updated successfully");
        Ok(Uid::from_value(identifier))
    }

    /// Replace the dummy password with the real one.
    ///
    /// Runs after the primary request succeeded. A failure here leaves the
    /// dummy password in place.
    async fn set_password(&self, identifier: &str, real: &str) -> ConnectorResult<()> {
        let mut request = ModifyRequest::new(identifier);
        request.push(Modification::replace(
            ATTR_OLDPASSWORD,
            self.config.dummy_password.clone(),
        ));
        request.push(Modification::replace(ATTR_PASSWORD, real));

        self.client
            .execute(&SpmlRequest::from(request), OperationTag::Update)
            .await?;
        debug!(uid = %identifier, "Password set");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone, Utc};

    use crate::spml::ModificationOp;

    fn config() -> UmeConfig {
        UmeConfig::new("http://ume.example.com/spml", "admin", "secret")
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn utc() -> DateNormalizer {
        DateNormalizer::with_zone(Some(0), FixedOffset::east_opt(0).unwrap())
    }

    // ========================================================================
    // diff_lists
    // ========================================================================

    #[test]
    fn test_diff_lists() {
        let (adds, removes) = diff_lists(&strings(&["R1", "R2"]), &strings(&["R2", "R3"]));
        assert_eq!(adds, strings(&["R3"]));
        assert_eq!(removes, strings(&["R1"]));
    }

    #[test]
    fn test_diff_lists_empty_target_removes_all() {
        let (adds, removes) = diff_lists(&strings(&["R1", "R2"]), &[]);
        assert!(adds.is_empty());
        assert_eq!(removes, strings(&["R1", "R2"]));
    }

    #[test]
    fn test_diff_lists_unchanged() {
        let (adds, removes) = diff_lists(&strings(&["R1", "R2"]), &strings(&["R2", "R1"]));
        assert!(adds.is_empty());
        assert!(removes.is_empty());
    }

    #[test]
    fn test_diff_lists_applied_yields_target() {
        let current = strings(&["a", "b", "c", "c"]);
        let target = strings(&["c", "d", "d", "e"]);
        let (adds, removes) = diff_lists(&current, &target);
        assert_eq!(adds, strings(&["d", "e"]));
        assert_eq!(removes, strings(&["a", "b"]));

        let mut applied: HashSet<String> = current.into_iter().collect();
        for r in &removes {
            applied.remove(r);
        }
        applied.extend(adds);
        let expected: HashSet<String> = target.into_iter().collect();
        assert_eq!(applied, expected);
    }

    // ========================================================================
    // Planning
    // ========================================================================

    #[test]
    fn test_plan_partitions_attributes() {
        let config = config();
        let client = SpmlClient::new(&config).unwrap();
        let dates = utc();
        let reconciler = Reconciler::new(&client, &config, &dates);

        let enable_at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let attrs = AttributeSet::new()
            .with(names::NAME, "Test.User")
            .with("lastname", "User")
            .with(names::PASSWORD, "s3cret!")
            .with(names::LOCK_OUT, AttributeValue::Null)
            .with(names::ENABLE_DATE, enable_at)
            .with("assignedroles", vec!["R1", "R2"])
            .with("islocked", "true")
            .with(names::UID, "ignored");

        let plan = reconciler.plan(UmeObjectClass::Account, &attrs).unwrap();
        assert_eq!(
            plan.scalars,
            vec![
                ("logonname".to_string(), "Test.User".to_string()),
                ("lastname".to_string(), "User".to_string()),
            ]
        );
        assert_eq!(
            plan.relationships,
            vec![("assignedroles".to_string(), strings(&["R1", "R2"]))]
        );
        assert_eq!(plan.password.as_deref(), Some("s3cret!"));
        assert_eq!(plan.locked, Some(false));
        assert_eq!(plan.valid_from.as_deref(), Some("20240301080000Z"));
        assert!(plan.enable.is_none());
    }

    #[test]
    fn test_plan_name_maps_to_uniquename_for_groups() {
        let config = config();
        let client = SpmlClient::new(&config).unwrap();
        let dates = utc();
        let reconciler = Reconciler::new(&client, &config, &dates);

        let attrs = AttributeSet::new().with(names::NAME, "GRP_ADMINS");
        let plan = reconciler.plan(UmeObjectClass::Group, &attrs).unwrap();
        assert_eq!(
            plan.scalars,
            vec![("uniquename".to_string(), "GRP_ADMINS".to_string())]
        );
    }

    #[test]
    fn test_plan_rejects_bad_date_type() {
        let config = config();
        let client = SpmlClient::new(&config).unwrap();
        let dates = utc();
        let reconciler = Reconciler::new(&client, &config, &dates);

        let attrs = AttributeSet::new().with(names::DISABLE_DATE, true);
        let err = reconciler.plan(UmeObjectClass::Account, &attrs).unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidAttributeValue { .. }));
    }

    #[test]
    fn test_flag() {
        assert_eq!(flag(&AttributeValue::Boolean(true)), Some(true));
        assert_eq!(flag(&AttributeValue::from("TRUE")), Some(true));
        assert_eq!(flag(&AttributeValue::from("no")), Some(false));
        assert_eq!(flag(&AttributeValue::Null), None);
        assert_eq!(flag(&AttributeValue::from(vec![false])), Some(false));
    }

    // ========================================================================
    // Requests
    // ========================================================================

    #[test]
    fn test_add_request_with_dummy_password() {
        let config = config();
        let client = SpmlClient::new(&config).unwrap();
        let dates = utc();
        let reconciler = Reconciler::new(&client, &config, &dates);

        let attrs = AttributeSet::new()
            .with(names::NAME, "Test.User")
            .with(names::PASSWORD, "s3cret!");
        let plan = reconciler.plan(UmeObjectClass::Account, &attrs).unwrap();
        let (request, pending) = reconciler
            .add_request(UmeObjectClass::Account, &plan)
            .unwrap();

        assert_eq!(request.object_class, "sapuser");
        assert_eq!(
            request.attribute("password").unwrap().value(),
            Some("5ecretDummyPWD")
        );
        assert_eq!(pending.as_deref(), Some("s3cret!"));
    }

    #[test]
    fn test_add_request_with_initial_password() {
        let config = config().with_initial_password(true, false);
        let client = SpmlClient::new(&config).unwrap();
        let dates = utc();
        let reconciler = Reconciler::new(&client, &config, &dates);

        let attrs = AttributeSet::new().with(names::PASSWORD, "s3cret!");
        let plan = reconciler.plan(UmeObjectClass::Account, &attrs).unwrap();
        let (request, pending) = reconciler
            .add_request(UmeObjectClass::Account, &plan)
            .unwrap();

        assert_eq!(request.attribute("password").unwrap().value(), Some("s3cret!"));
        assert!(pending.is_none());
    }

    #[test]
    fn test_add_request_keeps_first_relationship_value() {
        let config = config();
        let client = SpmlClient::new(&config).unwrap();
        let dates = utc();
        let reconciler = Reconciler::new(&client, &config, &dates);

        let attrs = AttributeSet::new()
            .with(names::NAME, "Test.User")
            .with("assignedroles", vec!["R1", "R2"])
            .with("assignedgroups", Vec::<String>::new());
        let plan = reconciler.plan(UmeObjectClass::Account, &attrs).unwrap();
        let (request, _) = reconciler
            .add_request(UmeObjectClass::Account, &plan)
            .unwrap();

        assert_eq!(
            request.attribute("assignedroles").unwrap().values,
            strings(&["R1"])
        );
        assert!(request.attribute("assignedgroups").is_none());
    }

    #[test]
    fn test_enable_window() {
        let config = config().with_enable_window("2024-01-01 00:00:00", "9999-12-31 00:00:00");
        let client = SpmlClient::new(&config).unwrap();
        let dates = utc();
        let reconciler = Reconciler::new(&client, &config, &dates);

        let attrs = AttributeSet::new().with(names::ENABLE, true);
        let plan = reconciler.plan(UmeObjectClass::Account, &attrs).unwrap();
        let (request, _) = reconciler
            .add_request(UmeObjectClass::Account, &plan)
            .unwrap();

        assert_eq!(
            request.attribute("validfrom").unwrap().value(),
            Some("20240101000000Z")
        );
        assert_eq!(
            request.attribute("validto").unwrap().value(),
            Some("99991231000000Z")
        );
    }

    #[test]
    fn test_explicit_date_wins_over_window() {
        let config = config().with_disable_window("2023-06-01 12:00:00", "2023-12-31 00:00:00");
        let client = SpmlClient::new(&config).unwrap();
        let dates = utc();
        let reconciler = Reconciler::new(&client, &config, &dates);

        let disable_at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let attrs = AttributeSet::new()
            .with(names::ENABLE, false)
            .with(names::DISABLE_DATE, disable_at);
        let plan = reconciler.plan(UmeObjectClass::Account, &attrs).unwrap();
        let (modifications, _) = reconciler.modifications(&plan).unwrap();

        assert_eq!(
            modifications,
            vec![
                Modification::replace("validfrom", "20230601120000Z"),
                Modification::replace("validto", "20250101000000Z"),
            ]
        );
    }

    #[test]
    fn test_disable_window_defaults_to_now() {
        let config = config();
        let client = SpmlClient::new(&config).unwrap();
        let dates = utc();
        let reconciler = Reconciler::new(&client, &config, &dates);

        let attrs = AttributeSet::new().with(names::ENABLE, false);
        let plan = reconciler.plan(UmeObjectClass::Account, &attrs).unwrap();
        let (modifications, _) = reconciler.modifications(&plan).unwrap();

        assert_eq!(modifications.len(), 1);
        assert_eq!(modifications[0].name, "validto");
        assert_eq!(modifications[0].values[0].len(), 15);
    }

    #[test]
    fn test_modifications_lock_and_password() {
        let config = config();
        let client = SpmlClient::new(&config).unwrap();
        let dates = utc();
        let reconciler = Reconciler::new(&client, &config, &dates);

        let attrs = AttributeSet::new()
            .with(names::LOCK_OUT, true)
            .with(names::PASSWORD, "n3w!")
            .with("title", AttributeValue::Null);
        let plan = reconciler.plan(UmeObjectClass::Account, &attrs).unwrap();
        let (modifications, pending) = reconciler.modifications(&plan).unwrap();

        assert_eq!(
            modifications,
            vec![
                Modification::replace("title", ""),
                Modification::replace("islocked", "true"),
                Modification::replace("password", "5ecretDummyPWD"),
            ]
        );
        assert!(modifications
            .iter()
            .all(|m| m.operation == ModificationOp::Replace));
        assert_eq!(pending.as_deref(), Some("n3w!"));
    }

    #[tokio::test]
    async fn test_create_role_is_unsupported() {
        let config = config();
        let client = SpmlClient::new(&config).unwrap();
        let dates = utc();
        let reconciler = Reconciler::new(&client, &config, &dates);

        let attrs = AttributeSet::new().with(names::NAME, "ROLE_X");
        let err = reconciler
            .create(UmeObjectClass::Role, &attrs)
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectorError::UnsupportedOperation { .. }));
    }

    #[tokio::test]
    async fn test_create_without_attributes_is_noop() {
        let config = config();
        let client = SpmlClient::new(&config).unwrap();
        let dates = utc();
        let reconciler = Reconciler::new(&client, &config, &dates);

        let uid = reconciler
            .create(UmeObjectClass::Account, &AttributeSet::new())
            .await
            .unwrap();
        assert!(uid.is_none());
    }
}
