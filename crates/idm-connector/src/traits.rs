//! Connector Framework traits
//!
//! Capability-based trait definitions for connectors, inspired by `ConnId`.

use async_trait::async_trait;

use crate::error::ConnectorResult;
use crate::operation::{AttributeSet, ConnectorObject, Filter, SearchOptions, Uid};
use crate::schema::Schema;
use crate::types::ConnectorType;

/// Callback receiving search results.
///
/// Returns `false` to stop the search; no further objects are delivered.
pub type ResultsHandler<'a> = &'a mut (dyn FnMut(ConnectorObject) -> bool + Send);

/// Base trait for all connectors.
///
/// This trait provides common functionality that all connectors must implement,
/// regardless of their specific capabilities.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Get the type of this connector.
    fn connector_type(&self) -> ConnectorType;

    /// Get the display name for this connector instance.
    fn display_name(&self) -> &str;

    /// Test the connection to the target system.
    ///
    /// Returns `Ok(())` if the connection is successful, or an error describing
    /// what went wrong.
    async fn test_connection(&self) -> ConnectorResult<()>;

    /// Dispose of connector resources.
    ///
    /// Called when the host is done with the connector. Later operations fail.
    async fn dispose(&self) -> ConnectorResult<()>;

    /// Check if the connector is still usable.
    ///
    /// This is a lightweight liveness probe, different from `test_connection`
    /// which contacts the target system.
    fn is_healthy(&self) -> bool {
        true
    }
}

/// Capability for describing the schema of a target system.
#[async_trait]
pub trait SchemaDiscovery: Connector {
    /// Return the object classes and attributes managed by this connector.
    async fn discover_schema(&self) -> ConnectorResult<Schema>;

    /// Check if a specific object class is managed by this connector.
    async fn has_object_class(&self, object_class: &str) -> ConnectorResult<bool> {
        let schema = self.discover_schema().await?;
        Ok(schema.has_object_class(object_class))
    }
}

/// Capability for creating objects in the target system.
#[async_trait]
pub trait CreateOp: Connector {
    /// Create a new object in the target system.
    ///
    /// # Arguments
    /// * `object_class` - The type of object to create (e.g., `__ACCOUNT__`)
    /// * `attributes` - The attributes for the new object
    ///
    /// # Returns
    /// The UID of the created object, or `None` when nothing was sent
    /// because the request carried no attributes.
    async fn create(
        &self,
        object_class: &str,
        attributes: AttributeSet,
    ) -> ConnectorResult<Option<Uid>>;
}

/// Capability for updating objects in the target system.
#[async_trait]
pub trait UpdateOp: Connector {
    /// Update an existing object in the target system.
    ///
    /// # Arguments
    /// * `object_class` - The type of object to update
    /// * `uid` - The unique identifier of the object in the target system
    /// * `attributes` - Replacement values; multi-valued attributes carry the
    ///   complete target list
    ///
    /// # Returns
    /// The UID of the updated object.
    async fn update(
        &self,
        object_class: &str,
        uid: &Uid,
        attributes: AttributeSet,
    ) -> ConnectorResult<Uid>;
}

/// Capability for deleting objects from the target system.
#[async_trait]
pub trait DeleteOp: Connector {
    /// Delete an object from the target system.
    ///
    /// # Arguments
    /// * `object_class` - The type of object to delete
    /// * `uid` - The unique identifier of the object to delete
    async fn delete(&self, object_class: &str, uid: &Uid) -> ConnectorResult<()>;
}

/// Capability for searching objects in the target system.
#[async_trait]
pub trait SearchOp: Connector {
    /// Search for objects in the target system.
    ///
    /// # Arguments
    /// * `object_class` - The type of objects to search for
    /// * `filter` - The search filter to apply; `None` returns every object
    /// * `handler` - Receives each object; returning `false` stops the search
    /// * `options` - Additional search options
    async fn search(
        &self,
        object_class: &str,
        filter: Option<Filter>,
        handler: ResultsHandler<'_>,
        options: &SearchOptions,
    ) -> ConnectorResult<()>;

    /// Search and collect every matching object.
    async fn search_all(
        &self,
        object_class: &str,
        filter: Option<Filter>,
        options: &SearchOptions,
    ) -> ConnectorResult<Vec<ConnectorObject>> {
        let mut objects = Vec::new();
        let mut collect = |object: ConnectorObject| {
            objects.push(object);
            true
        };
        self.search(object_class, filter, &mut collect, options)
            .await?;
        Ok(objects)
    }
}

/// Marker trait for connectors that support all CRUD operations.
pub trait FullCrud: CreateOp + UpdateOp + DeleteOp + SearchOp {}

// Blanket implementation for any connector that implements all CRUD ops
impl<T> FullCrud for T where T: CreateOp + UpdateOp + DeleteOp + SearchOp {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names;
    use crate::schema::ObjectClass;

    struct StaticConnector {
        objects: Vec<ConnectorObject>,
    }

    #[async_trait]
    impl Connector for StaticConnector {
        fn connector_type(&self) -> ConnectorType {
            ConnectorType::SapUme
        }

        fn display_name(&self) -> &str {
            "static"
        }

        async fn test_connection(&self) -> ConnectorResult<()> {
            Ok(())
        }

        async fn dispose(&self) -> ConnectorResult<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl SchemaDiscovery for StaticConnector {
        async fn discover_schema(&self) -> ConnectorResult<Schema> {
            Ok(Schema::with_object_classes(vec![ObjectClass::new(
                names::ACCOUNT,
                "sapuser",
            )]))
        }
    }

    #[async_trait]
    impl SearchOp for StaticConnector {
        async fn search(
            &self,
            _object_class: &str,
            _filter: Option<Filter>,
            handler: ResultsHandler<'_>,
            _options: &SearchOptions,
        ) -> ConnectorResult<()> {
            for object in &self.objects {
                if !handler(object.clone()) {
                    break;
                }
            }
            Ok(())
        }
    }

    fn object(id: &str) -> ConnectorObject {
        ConnectorObject::new(names::ACCOUNT, Uid::from_value(id), id, AttributeSet::new())
    }

    #[tokio::test]
    async fn test_search_all_collects_every_object() {
        let connector = StaticConnector {
            objects: vec![object("a"), object("b"), object("c")],
        };

        let objects = connector
            .search_all(names::ACCOUNT, None, &SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(objects.len(), 3);
    }

    #[tokio::test]
    async fn test_handler_can_stop_search() {
        let connector = StaticConnector {
            objects: vec![object("a"), object("b"), object("c")],
        };

        let mut seen = Vec::new();
        let mut first_only = |o: ConnectorObject| {
            seen.push(o.name);
            false
        };
        connector
            .search(names::ACCOUNT, None, &mut first_only, &SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(seen, vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_has_object_class() {
        let connector = StaticConnector { objects: vec![] };
        assert!(connector.has_object_class(names::ACCOUNT).await.unwrap());
        assert!(!connector.has_object_class(names::ROLE).await.unwrap());
        assert!(connector.is_healthy());
    }
}
