//! Connector Framework type definitions
//!
//! Enums identifying the connector implementations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type of connector for external system integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorType {
    /// SAP User Management Engine over SPML/SOAP
    SapUme,
}

impl ConnectorType {
    /// Get the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectorType::SapUme => "sap_ume",
        }
    }
}

impl fmt::Display for ConnectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConnectorType {
    type Err = ParseConnectorTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sap_ume" | "sapume" | "ume" => Ok(ConnectorType::SapUme),
            _ => Err(ParseConnectorTypeError(s.to_string())),
        }
    }
}

/// Error parsing connector type from string.
#[derive(Debug, Clone)]
pub struct ParseConnectorTypeError(String);

impl fmt::Display for ParseConnectorTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid connector type '{}', expected one of: sap_ume",
            self.0
        )
    }
}

impl std::error::Error for ParseConnectorTypeError {}
