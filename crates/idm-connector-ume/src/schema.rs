//! SAP UME schema
//!
//! Attribute names of the UME SPML provider and the object classes built
//! from them. The schema is built once per [`SchemaRegistry`] and cached.

use std::sync::OnceLock;

use tracing::info;

use idm_connector::names;
use idm_connector::schema::{AttributeDataType, ObjectClass, Schema, SchemaAttribute};

use crate::object_class::UmeObjectClass;

/// SPML provider of the UME principal schema.
pub const SCHEMA_PROVIDER: &str = "SAP";

/// Schema identifier requested by the connection test.
pub const SCHEMA_ID: &str = "SAPprincipals";

pub const OBJECT_SAPUSER: &str = "sapuser";
pub const OBJECT_SAPROLE: &str = "saprole";
pub const OBJECT_SAPGROUP: &str = "sapgroup";

pub const ATTR_ID: &str = "id";
pub const ATTR_UNIQUENAME: &str = "uniquename";
pub const ATTR_LOGONNAME: &str = "logonname";
pub const ATTR_DATASOURCE: &str = "datasource";
pub const ATTR_DISPLAYNAME: &str = "displayname";
pub const ATTR_DESCRIPTION: &str = "description";
pub const ATTR_LASTMODIFYDATE: &str = "lastmodifydate";
pub const ATTR_FIRSTNAME: &str = "firstname";
pub const ATTR_LASTNAME: &str = "lastname";
pub const ATTR_SALUTATION: &str = "salutation";
pub const ATTR_TITLE: &str = "title";
pub const ATTR_JOBTITLE: &str = "jobtitle";
pub const ATTR_MOBILE: &str = "mobile";
pub const ATTR_TELEPHONE: &str = "telephone";
pub const ATTR_PASSWORD: &str = "password";
pub const ATTR_OLDPASSWORD: &str = "oldpassword";
pub const ATTR_EMAIL: &str = "email";
pub const ATTR_FAX: &str = "fax";
pub const ATTR_LOCALE: &str = "locale";
pub const ATTR_TIMEZONE: &str = "timezone";
pub const ATTR_VALIDFROM: &str = "validfrom";
pub const ATTR_VALIDTO: &str = "validto";
pub const ATTR_CERTIFICATE: &str = "certificate";
pub const ATTR_ISLOCKED: &str = "islocked";
pub const ATTR_ISPASSWORDDISABLED: &str = "ispassworddisabled";
pub const ATTR_ISSERVICEUSER: &str = "isserviceuser";
pub const ATTR_SECURITYPOLICY: &str = "securitypolicy";
pub const ATTR_DEPARTMENT: &str = "department";
pub const ATTR_MEMBER: &str = "member";
pub const ATTR_ASSIGNEDROLES: &str = "assignedroles";
pub const ATTR_ALLASSIGNEDROLES: &str = "allassignedroles";
pub const ATTR_ASSIGNEDGROUPS: &str = "assignedgroups";
pub const ATTR_ALLASSIGNEDGROUPS: &str = "allassignedgroups";
pub const ATTR_DISTINGUISHEDNAME: &str = "distinguishedname";
pub const ATTR_COMPANY: &str = "company";
pub const ATTR_STREETADDRESS: &str = "streetaddress";
pub const ATTR_CITY: &str = "city";
pub const ATTR_ZIP: &str = "zip";
pub const ATTR_POBOX: &str = "pobox";
pub const ATTR_COUNTRY: &str = "country";
pub const ATTR_STATE: &str = "state";
pub const ATTR_ORGUNIT: &str = "orgunit";
pub const ATTR_ACCESSIBILITYLEVEL: &str = "accessibilitylevel";
pub const ATTR_PASSWORDCHANGEREQUIRED: &str = "passwordchangerequired";

/// Plain single-valued account attributes, in schema order.
const ACCOUNT_PROFILE_ATTRIBUTES: &[&str] = &[
    ATTR_ISSERVICEUSER,
    ATTR_FIRSTNAME,
    ATTR_LASTNAME,
    ATTR_SALUTATION,
    ATTR_TITLE,
    ATTR_JOBTITLE,
    ATTR_MOBILE,
    ATTR_PASSWORD,
    ATTR_OLDPASSWORD,
    ATTR_EMAIL,
    ATTR_FAX,
    ATTR_LOCALE,
    ATTR_TIMEZONE,
    ATTR_ISPASSWORDDISABLED,
    ATTR_TELEPHONE,
    ATTR_DEPARTMENT,
    ATTR_SECURITYPOLICY,
];

const ACCOUNT_ADDRESS_ATTRIBUTES: &[&str] = &[
    ATTR_COMPANY,
    ATTR_STREETADDRESS,
    ATTR_CITY,
    ATTR_ZIP,
    ATTR_POBOX,
    ATTR_COUNTRY,
    ATTR_STATE,
    ATTR_ORGUNIT,
    ATTR_ACCESSIBILITYLEVEL,
    ATTR_PASSWORDCHANGEREQUIRED,
];

/// Attribute listing assigned or inherited roles.
pub fn is_role_attribute(name: &str) -> bool {
    matches!(name, ATTR_ASSIGNEDROLES | ATTR_ALLASSIGNEDROLES)
}

/// Attribute listing assigned or inherited groups.
pub fn is_group_attribute(name: &str) -> bool {
    matches!(name, ATTR_ASSIGNEDGROUPS | ATTR_ALLASSIGNEDGROUPS)
}

/// Multi-valued attribute reconciled by set difference.
pub fn is_relationship_attribute(name: &str) -> bool {
    is_role_attribute(name)
        || is_group_attribute(name)
        || matches!(name, ATTR_MEMBER | ATTR_CERTIFICATE)
}

/// Attribute carrying a UME timestamp.
pub fn is_date_attribute(name: &str) -> bool {
    matches!(
        name,
        ATTR_VALIDFROM
            | ATTR_VALIDTO
            | ATTR_LASTMODIFYDATE
            | names::ENABLE_DATE
            | names::DISABLE_DATE
    )
}

/// Lazily built, cached schema.
///
/// The extra account attributes are captured at construction. The cached
/// schema is never rebuilt, so a registry must be replaced to pick up a
/// changed attribute list.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    extra_attributes: Vec<String>,
    schema: OnceLock<Schema>,
}

impl SchemaRegistry {
    /// Create a registry appending the given attributes to the account class.
    pub fn new(extra_attributes: Vec<String>) -> Self {
        Self {
            extra_attributes,
            schema: OnceLock::new(),
        }
    }

    /// The schema, built on first use.
    pub fn schema(&self) -> &Schema {
        self.schema.get_or_init(|| {
            let schema = build_schema(&self.extra_attributes);
            info!(
                object_classes = schema.object_classes.len(),
                extra_attributes = self.extra_attributes.len(),
                "UME schema created"
            );
            schema
        })
    }

    /// Attribute names of an object class, in schema order.
    pub fn attribute_names(&self, object_class: UmeObjectClass) -> Vec<String> {
        self.schema()
            .get_object_class(object_class.host_name())
            .map(|oc| oc.attribute_names().into_iter().map(String::from).collect())
            .unwrap_or_default()
    }
}

fn common_attributes(name_attribute: &str) -> Vec<SchemaAttribute> {
    vec![
        SchemaAttribute::new(names::NAME, name_attribute, AttributeDataType::String).required(),
        SchemaAttribute::string(ATTR_ID).read_only(),
        SchemaAttribute::string(ATTR_UNIQUENAME)
            .required()
            .not_updatable(),
        SchemaAttribute::string(ATTR_DATASOURCE).not_updatable(),
        SchemaAttribute::string(ATTR_DISPLAYNAME),
        SchemaAttribute::string(ATTR_DESCRIPTION),
        SchemaAttribute::string(ATTR_LASTMODIFYDATE),
    ]
}

fn multi(name: &str) -> SchemaAttribute {
    SchemaAttribute::string(name).multi_valued()
}

fn account_class(extra_attributes: &[String]) -> ObjectClass {
    ObjectClass::new(names::ACCOUNT, OBJECT_SAPUSER)
        .with_attributes(common_attributes(ATTR_LOGONNAME))
        .with_attribute(multi(ATTR_ALLASSIGNEDROLES).not_updatable())
        .with_attribute(multi(ATTR_ALLASSIGNEDGROUPS).not_updatable())
        .with_attribute(
            SchemaAttribute::new(names::PASSWORD, ATTR_PASSWORD, AttributeDataType::Secret)
                .write_only(),
        )
        .with_attribute(SchemaAttribute::new(
            names::ENABLE,
            names::ENABLE,
            AttributeDataType::Boolean,
        ))
        .with_attribute(SchemaAttribute::new(
            names::ENABLE_DATE,
            ATTR_VALIDFROM,
            AttributeDataType::DateTime,
        ))
        .with_attribute(SchemaAttribute::new(
            names::DISABLE_DATE,
            ATTR_VALIDTO,
            AttributeDataType::DateTime,
        ))
        .with_attribute(SchemaAttribute::new(
            names::LOCK_OUT,
            ATTR_ISLOCKED,
            AttributeDataType::Boolean,
        ))
        .with_attributes(ACCOUNT_PROFILE_ATTRIBUTES.iter().map(|n| SchemaAttribute::string(*n)))
        .with_attribute(multi(ATTR_CERTIFICATE))
        .with_attribute(multi(ATTR_ASSIGNEDROLES))
        .with_attribute(multi(ATTR_ASSIGNEDGROUPS))
        .with_attributes(ACCOUNT_ADDRESS_ATTRIBUTES.iter().map(|n| SchemaAttribute::string(*n)))
        .with_attributes(extra_attributes.iter().map(SchemaAttribute::string))
}

fn role_class() -> ObjectClass {
    ObjectClass::new(names::ROLE, OBJECT_SAPROLE)
        .with_attributes(common_attributes(ATTR_UNIQUENAME))
        .with_attribute(multi(ATTR_MEMBER).read_only())
        .without_create_delete()
}

fn group_class() -> ObjectClass {
    ObjectClass::new(names::GROUP, OBJECT_SAPGROUP)
        .with_attributes(common_attributes(ATTR_UNIQUENAME))
        .with_attribute(multi(ATTR_MEMBER))
        .with_attribute(multi(ATTR_ALLASSIGNEDROLES).not_updatable())
        .with_attribute(multi(ATTR_ASSIGNEDROLES))
        .with_attribute(SchemaAttribute::string(ATTR_DISTINGUISHEDNAME))
}

fn build_schema(extra_attributes: &[String]) -> Schema {
    let object_classes = UmeObjectClass::ALL
        .iter()
        .map(|oc| match oc {
            UmeObjectClass::Account => account_class(extra_attributes),
            UmeObjectClass::Role => role_class(),
            UmeObjectClass::Group => group_class(),
        })
        .collect();
    Schema::with_object_classes(object_classes)
}
