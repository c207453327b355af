//! # SAP UME Connector
//!
//! Provisioning connector for the SAP User Management Engine, speaking
//! SPML 1.0 over SOAP.
//!
//! This crate manages accounts, groups and roles on UME. Host attribute sets
//! are translated to UME attribute names, relationship lists are reconciled
//! against the current remote state, and UME timestamps are converted to and
//! from UTC instants.
//!
//! ## Features
//!
//! - Create, update, delete and search of accounts and groups
//! - Search and update of roles (roles cannot be created or deleted)
//! - Dummy-password sequencing for initial passwords
//! - Enable/disable through configurable validity windows
//! - Full-scan searches built from a configurable character pattern
//! - Optional SPML request/response logging with masked passwords
//!
//! ## Example
//!
//! ```ignore
//! use idm_connector::prelude::*;
//! use idm_connector_ume::{UmeConfig, UmeConnector};
//!
//! let config = UmeConfig::new("https://ume.example.com/spml/spmlservice", "admin", "secret")
//!     .with_timeouts(5_000, 30_000);
//!
//! let connector = UmeConnector::new(config)?;
//! connector.test_connection().await?;
//!
//! let attrs = AttributeSet::new()
//!     .with(names::NAME, "Test.User")
//!     .with("lastname", "User")
//!     .with(names::PASSWORD, "Initial1!");
//! let uid = connector.create(names::ACCOUNT, attrs).await?;
//! ```

pub mod client;
pub mod config;
pub mod connector;
pub mod dates;
pub mod filter;
pub mod object_class;
pub mod query;
pub mod reconcile;
pub mod schema;
pub mod spml;

// Re-exports
pub use client::{classify_failure, FailureKind, OperationTag, SpmlClient};
pub use config::UmeConfig;
pub use connector::UmeConnector;
pub use dates::DateNormalizer;
pub use object_class::UmeObjectClass;
pub use reconcile::diff_lists;
pub use schema::SchemaRegistry;
