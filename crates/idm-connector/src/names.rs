//! Well-known object class and attribute names
//!
//! Host-side names for the special identity attributes and operational
//! attributes. Connectors map these onto their native vocabulary.

/// Object class of user accounts.
pub const ACCOUNT: &str = "__ACCOUNT__";

/// Object class of groups.
pub const GROUP: &str = "__GROUP__";

/// Object class of roles.
pub const ROLE: &str = "__ROLE__";

/// Unique identifier attribute, assigned by the target system.
pub const UID: &str = "__UID__";

/// Human-readable name attribute (logon name or unique name).
pub const NAME: &str = "__NAME__";

/// Password attribute.
pub const PASSWORD: &str = "__PASSWORD__";

/// Enabled flag.
pub const ENABLE: &str = "__ENABLE__";

/// Instant from which the object is enabled.
pub const ENABLE_DATE: &str = "__ENABLE_DATE__";

/// Instant from which the object is disabled.
pub const DISABLE_DATE: &str = "__DISABLE_DATE__";

/// Lock-out flag.
pub const LOCK_OUT: &str = "__LOCK_OUT__";

/// Check whether a name is one of the operational attributes.
pub fn is_operational(name: &str) -> bool {
    matches!(
        name,
        PASSWORD | ENABLE | ENABLE_DATE | DISABLE_DATE | LOCK_OUT
    )
}
