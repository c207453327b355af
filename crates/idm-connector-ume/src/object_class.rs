//! Object classes managed on SAP UME
//!
//! Maps host object classes onto UME base types and the host identity
//! attributes onto UME attribute names.

use idm_connector::error::{ConnectorError, ConnectorResult};
use idm_connector::names;

use crate::schema::{
    ATTR_ID, ATTR_LOGONNAME, ATTR_UNIQUENAME, OBJECT_SAPGROUP, OBJECT_SAPROLE, OBJECT_SAPUSER,
};

/// A UME object class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UmeObjectClass {
    /// User account (`sapuser`).
    Account,
    /// Role (`saprole`), cannot be created or deleted.
    Role,
    /// Group (`sapgroup`).
    Group,
}

impl UmeObjectClass {
    /// All object classes, in schema order.
    pub const ALL: [UmeObjectClass; 3] = [Self::Account, Self::Role, Self::Group];

    /// Resolve a host object class name.
    pub fn from_name(name: &str) -> ConnectorResult<Self> {
        match name {
            names::ACCOUNT => Ok(Self::Account),
            names::ROLE => Ok(Self::Role),
            names::GROUP => Ok(Self::Group),
            other => Err(ConnectorError::ObjectClassNotFound {
                object_class: other.to_string(),
            }),
        }
    }

    /// Host object class name.
    pub fn host_name(&self) -> &'static str {
        match self {
            Self::Account => names::ACCOUNT,
            Self::Role => names::ROLE,
            Self::Group => names::GROUP,
        }
    }

    /// UME base type used as search base and add-request object class.
    pub fn base(&self) -> &'static str {
        match self {
            Self::Account => OBJECT_SAPUSER,
            Self::Role => OBJECT_SAPROLE,
            Self::Group => OBJECT_SAPGROUP,
        }
    }

    pub fn is_account(&self) -> bool {
        matches!(self, Self::Account)
    }

    pub fn is_role(&self) -> bool {
        matches!(self, Self::Role)
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group)
    }

    /// UME attribute holding the object name.
    pub fn name_attribute(&self) -> &'static str {
        match self {
            Self::Account => ATTR_LOGONNAME,
            Self::Role | Self::Group => ATTR_UNIQUENAME,
        }
    }

    /// Map a host attribute name onto the UME attribute name.
    ///
    /// `__UID__` becomes `id` and `__NAME__` becomes the name attribute of the
    /// class. Everything else passes through unchanged.
    pub fn remote_name<'a>(&self, attribute: &'a str) -> &'a str {
        match attribute {
            names::UID => ATTR_ID,
            names::NAME => self.name_attribute(),
            other => other,
        }
    }

    /// Whether objects of this class can be created and deleted.
    pub fn supports_create_delete(&self) -> bool {
        !self.is_role()
    }
}

impl std::fmt::Display for UmeObjectClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.base(), self.host_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(
            UmeObjectClass::from_name("__ACCOUNT__").unwrap(),
            UmeObjectClass::Account
        );
        assert_eq!(
            UmeObjectClass::from_name("__ROLE__").unwrap(),
            UmeObjectClass::Role
        );
        assert_eq!(
            UmeObjectClass::from_name("__GROUP__").unwrap(),
            UmeObjectClass::Group
        );

        let err = UmeObjectClass::from_name("printer").unwrap_err();
        assert!(matches!(err, ConnectorError::ObjectClassNotFound { .. }));
    }

    #[test]
    fn test_bases() {
        assert_eq!(UmeObjectClass::Account.base(), "sapuser");
        assert_eq!(UmeObjectClass::Role.base(), "saprole");
        assert_eq!(UmeObjectClass::Group.base(), "sapgroup");
        assert_eq!(UmeObjectClass::Group.to_string(), "sapgroup:__GROUP__");
    }

    #[test]
    fn test_remote_name_account() {
        let oc = UmeObjectClass::Account;
        assert_eq!(oc.remote_name("__UID__"), "id");
        assert_eq!(oc.remote_name("__NAME__"), "logonname");
        assert_eq!(oc.remote_name("firstname"), "firstname");
    }

    #[test]
    fn test_remote_name_role_and_group() {
        for oc in [UmeObjectClass::Role, UmeObjectClass::Group] {
            assert_eq!(oc.remote_name("__UID__"), "id");
            assert_eq!(oc.remote_name("__NAME__"), "uniquename");
            assert_eq!(oc.remote_name("member"), "member");
        }
    }

    #[test]
    fn test_role_cannot_be_created() {
        assert!(UmeObjectClass::Account.supports_create_delete());
        assert!(UmeObjectClass::Group.supports_create_delete());
        assert!(!UmeObjectClass::Role.supports_create_delete());
    }
}
