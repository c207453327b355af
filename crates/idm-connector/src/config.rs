//! Connector Framework configuration types
//!
//! Base trait for connector-specific configuration.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::ConnectorResult;
use crate::types::ConnectorType;

/// Placeholder written over secrets in redacted configurations.
pub const REDACTED: &str = "***REDACTED***";

/// Trait for connector-specific configuration.
///
/// Each connector type implements this trait to define its configuration
/// schema and validation rules.
pub trait ConnectorConfig: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Get the connector type this configuration is for.
    fn connector_type() -> ConnectorType;

    /// Validate the configuration.
    ///
    /// Returns an error if the configuration is invalid.
    fn validate(&self) -> ConnectorResult<()>;

    /// Get credentials that the host must store securely.
    ///
    /// Returns a list of (field_name, value) pairs for sensitive data.
    fn get_credentials(&self) -> Vec<(&'static str, String)>;

    /// Create a redacted version of this config (for logging/display).
    ///
    /// Sensitive fields are replaced with [`REDACTED`].
    fn redacted(&self) -> Self;
}
