//! # Connector Framework
//!
//! Identity-object model and capability traits for provisioning connectors.
//!
//! The host drives connectors through these types: it hands over attribute
//! sets and filter trees, and receives UIDs and connector objects back.
//!
//! ## Architecture
//!
//! The framework uses a capability-based trait system inspired by `ConnId`:
//!
//! - [`Connector`] - Base trait all connectors implement
//! - [`SchemaDiscovery`] - Describe the managed object classes
//! - [`CreateOp`], [`UpdateOp`], [`DeleteOp`] - CRUD operations
//! - [`SearchOp`] - Search with a result callback that may stop early
//!
//! ## Example
//!
//! ```ignore
//! use idm_connector::prelude::*;
//!
//! connector.test_connection().await?;
//!
//! let attrs = AttributeSet::new()
//!     .with(names::NAME, "Test.User")
//!     .with("lastname", "User");
//! let uid = connector.create(names::ACCOUNT, attrs).await?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`names`] - Object class and operational attribute names
//! - [`types`] - Connector type enum
//! - [`error`] - Error types with transient/permanent classification
//! - [`traits`] - Connector capability traits
//! - [`schema`] - Schema types (`ObjectClass`, `SchemaAttribute`)
//! - [`operation`] - Operation types (Uid, `AttributeSet`, Filter)
//! - [`config`] - Configuration trait
//!
//! [`Connector`]: traits::Connector
//! [`SchemaDiscovery`]: traits::SchemaDiscovery
//! [`CreateOp`]: traits::CreateOp
//! [`UpdateOp`]: traits::UpdateOp
//! [`DeleteOp`]: traits::DeleteOp
//! [`SearchOp`]: traits::SearchOp

pub mod config;
pub mod error;
pub mod names;
pub mod operation;
pub mod schema;
pub mod traits;
pub mod types;

/// Prelude module for convenient imports.
///
/// ```
/// use idm_connector::prelude::*;
/// ```
pub mod prelude {
    // Types and enums
    pub use crate::types::ConnectorType;

    // Error handling
    pub use crate::error::{ConnectorError, ConnectorResult};

    // Traits
    pub use crate::traits::{
        Connector, CreateOp, DeleteOp, FullCrud, ResultsHandler, SchemaDiscovery, SearchOp,
        UpdateOp,
    };

    // Schema
    pub use crate::schema::{AttributeDataType, ObjectClass, Schema, SchemaAttribute};

    // Operations
    pub use crate::operation::{
        AttributeSet, AttributeValue, ConnectorObject, Filter, SearchOptions, Uid,
    };

    // Configuration
    pub use crate::config::ConnectorConfig;

    // Names
    pub use crate::names;
}

// Re-export async_trait for connector implementors
pub use async_trait::async_trait;

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_imports() {
        let _ct = ConnectorType::SapUme;
        let _uid = Uid::from_value("USER.PRIVATE_DATASOURCE.un:test");
        let _attrs = AttributeSet::new().with(names::NAME, "test");
        let _filter = Filter::eq(names::NAME, "test");
        let _options = SearchOptions::default();
    }
}
