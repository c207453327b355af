//! SAP UME Connector implementation
//!
//! Implements the connector capability traits on top of the SPML client.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use idm_connector::config::ConnectorConfig;
use idm_connector::error::{ConnectorError, ConnectorResult};
use idm_connector::operation::{AttributeSet, Filter, SearchOptions, Uid};
use idm_connector::schema::Schema;
use idm_connector::traits::{
    Connector, CreateOp, DeleteOp, ResultsHandler, SchemaDiscovery, SearchOp, UpdateOp,
};
use idm_connector::types::ConnectorType;

use crate::client::{OperationTag, SpmlClient};
use crate::config::UmeConfig;
use crate::dates::DateNormalizer;
use crate::object_class::UmeObjectClass;
use crate::query::QueryExecutor;
use crate::reconcile::Reconciler;
use crate::schema::SchemaRegistry;
use crate::spml::{DeleteRequest, SpmlRequest};

/// SAP UME Connector for provisioning over SPML.
pub struct UmeConnector {
    /// Configuration.
    config: UmeConfig,

    /// Display name for this connector instance.
    display_name: String,

    /// SPML client.
    client: Arc<SpmlClient>,

    /// Schema, built on first use.
    registry: Arc<SchemaRegistry>,

    /// Timestamp conversion.
    dates: DateNormalizer,

    /// Whether the connector has been disposed.
    disposed: Arc<RwLock<bool>>,
}

impl std::fmt::Debug for UmeConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UmeConnector")
            .field("config", &self.config.redacted())
            .field("display_name", &self.display_name)
            .finish()
    }
}

impl UmeConnector {
    /// Create a new UME connector with the given configuration.
    pub fn new(config: UmeConfig) -> ConnectorResult<Self> {
        let registry = Arc::new(SchemaRegistry::new(config.ume_add_attrs.clone()));
        Self::with_registry(config, registry)
    }

    /// Create a connector sharing an existing schema registry.
    pub fn with_registry(
        config: UmeConfig,
        registry: Arc<SchemaRegistry>,
    ) -> ConnectorResult<Self> {
        config.validate()?;

        let display_name = format!("SAP UME: {}", config.url);
        let client = SpmlClient::new(&config)?;
        let dates = DateNormalizer::from_config(&config);

        Ok(Self {
            config,
            display_name,
            client: Arc::new(client),
            registry,
            dates,
            disposed: Arc::new(RwLock::new(false)),
        })
    }

    /// Use a specific date normalizer instead of the configured one.
    #[must_use]
    pub fn with_dates(mut self, dates: DateNormalizer) -> Self {
        self.dates = dates;
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &UmeConfig {
        &self.config
    }

    /// Check if disposed.
    async fn check_disposed(&self) -> ConnectorResult<()> {
        if *self.disposed.read().await {
            return Err(ConnectorError::InvalidConfiguration {
                message: "Connector has been disposed".to_string(),
            });
        }
        Ok(())
    }

    fn reconciler(&self) -> Reconciler<'_> {
        Reconciler::new(&self.client, &self.config, &self.dates)
    }

    fn query(&self) -> QueryExecutor<'_> {
        QueryExecutor::new(
            &self.client,
            &self.registry,
            &self.dates,
            &self.config.full_search_string_pattern,
        )
    }
}

#[async_trait]
impl Connector for UmeConnector {
    fn connector_type(&self) -> ConnectorType {
        ConnectorType::SapUme
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    #[instrument(skip(self))]
    async fn test_connection(&self) -> ConnectorResult<()> {
        self.check_disposed().await?;

        debug!(url = %self.config.url, "Testing UME connection");
        self.client.test().await?;

        info!(url = %self.config.url, "UME connection test successful");
        Ok(())
    }

    async fn dispose(&self) -> ConnectorResult<()> {
        *self.disposed.write().await = true;

        info!("UME connector disposed");
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        self.disposed.try_read().map_or(true, |disposed| !*disposed)
    }
}

#[async_trait]
impl SchemaDiscovery for UmeConnector {
    #[instrument(skip(self))]
    async fn discover_schema(&self) -> ConnectorResult<Schema> {
        self.check_disposed().await?;
        Ok(self.registry.schema().clone())
    }
}

#[async_trait]
impl CreateOp for UmeConnector {
    #[instrument(skip(self, attrs))]
    async fn create(
        &self,
        object_class: &str,
        attrs: AttributeSet,
    ) -> ConnectorResult<Option<Uid>> {
        self.check_disposed().await?;
        let object_class = UmeObjectClass::from_name(object_class)?;

        info!(object_class = %object_class, attributes = attrs.len(), "Creating UME object");
        self.reconciler().create(object_class, &attrs).await
    }
}

#[async_trait]
impl UpdateOp for UmeConnector {
    #[instrument(skip(self, attrs))]
    async fn update(
        &self,
        object_class: &str,
        uid: &Uid,
        attrs: AttributeSet,
    ) -> ConnectorResult<Uid> {
        self.check_disposed().await?;
        let object_class = UmeObjectClass::from_name(object_class)?;

        info!(
            object_class = %object_class,
            id = %uid.value(),
            attributes = attrs.len(),
            "Updating UME object"
        );
        self.reconciler().update(object_class, uid, &attrs).await
    }
}

#[async_trait]
impl DeleteOp for UmeConnector {
    #[instrument(skip(self))]
    async fn delete(&self, object_class: &str, uid: &Uid) -> ConnectorResult<()> {
        self.check_disposed().await?;
        let object_class = UmeObjectClass::from_name(object_class)?;
        if !object_class.supports_create_delete() {
            return Err(ConnectorError::unsupported("delete", object_class.host_name()));
        }

        debug!(object_class = %object_class, id = %uid.value(), "Deleting UME object");

        let request = SpmlRequest::from(DeleteRequest::new(uid.value()));
        self.client.execute(&request, OperationTag::Delete).await?;

        info!(object_class = %object_class, id = %uid.value(), "UME object deleted successfully");
        Ok(())
    }
}

#[async_trait]
impl SearchOp for UmeConnector {
    #[instrument(skip(self, filter, handler, options))]
    async fn search(
        &self,
        object_class: &str,
        filter: Option<Filter>,
        handler: ResultsHandler<'_>,
        options: &SearchOptions,
    ) -> ConnectorResult<()> {
        self.check_disposed().await?;
        let object_class = UmeObjectClass::from_name(object_class)?;

        self.query()
            .search(object_class, filter.as_ref(), handler, options)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idm_connector::names;

    fn config() -> UmeConfig {
        UmeConfig::new("https://ume.example.com/spml/spmlservice", "admin", "secret")
    }

    #[test]
    fn test_ume_connector_new() {
        let connector = UmeConnector::new(config()).unwrap();
        assert!(connector.display_name().contains("ume.example.com"));
        assert_eq!(connector.connector_type(), ConnectorType::SapUme);
        assert!(connector.is_healthy());
    }

    #[test]
    fn test_ume_connector_invalid_config() {
        let connector = UmeConnector::new(UmeConfig::new("", "admin", "secret"));
        assert!(connector.is_err());
    }

    #[test]
    fn test_debug_is_redacted() {
        let connector = UmeConnector::new(config()).unwrap();
        let debug = format!("{connector:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("admin"));
    }

    #[tokio::test]
    async fn test_discover_schema() {
        let connector = UmeConnector::new(config().with_extra_attributes(["costcenter"])).unwrap();
        let schema = connector.discover_schema().await.unwrap();

        assert_eq!(schema.object_classes.len(), 3);
        assert!(connector.has_object_class(names::ROLE).await.unwrap());
        let account = schema.get_object_class(names::ACCOUNT).unwrap();
        assert!(account.has_attribute("costcenter"));
    }

    #[tokio::test]
    async fn test_shared_registry_is_not_rebuilt() {
        let registry = Arc::new(SchemaRegistry::new(vec![]));
        let first = UmeConnector::with_registry(config(), Arc::clone(&registry)).unwrap();
        first.discover_schema().await.unwrap();

        let second = UmeConnector::with_registry(
            config().with_extra_attributes(["costcenter"]),
            Arc::clone(&registry),
        )
        .unwrap();
        let schema = second.discover_schema().await.unwrap();
        let account = schema.get_object_class(names::ACCOUNT).unwrap();
        assert!(!account.has_attribute("costcenter"));
    }

    #[tokio::test]
    async fn test_unknown_object_class() {
        let connector = UmeConnector::new(config()).unwrap();
        let err = connector
            .delete("__PRINTER__", &Uid::from_value("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectorError::ObjectClassNotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_role_is_unsupported() {
        let connector = UmeConnector::new(config()).unwrap();
        let err = connector
            .delete(names::ROLE, &Uid::from_value("ROLE.x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectorError::UnsupportedOperation { .. }));
    }

    #[tokio::test]
    async fn test_disposed_connector() {
        let connector = UmeConnector::new(config()).unwrap();
        connector.dispose().await.unwrap();

        assert!(!connector.is_healthy());
        let err = connector.test_connection().await.unwrap_err();
        assert!(err.to_string().contains("disposed"));
        let err = connector.discover_schema().await.unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidConfiguration { .. }));
    }
}
