//! Connector Framework error types
//!
//! Error definitions with transient/permanent classification for host retry logic.

use thiserror::Error;

/// Error that can occur during connector operations.
#[derive(Debug, Error)]
pub enum ConnectorError {
    // Configuration errors (permanent)
    /// Connector configuration is invalid or incomplete.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    // Authentication errors (permanent)
    /// Credentials are blank or were rejected by the target system.
    #[error("invalid credentials: {message}")]
    InvalidCredentials {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Connection errors (usually transient)
    /// Connection test against the target system failed.
    #[error("connection failed: {message}")]
    ConnectionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Connect or read timeout expired.
    #[error("operation timed out: {message}")]
    OperationTimeout {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Transport-level failure during communication.
    #[error("network error: {message}")]
    NetworkError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Target system errors (permanent)
    /// Object already exists in target system (create conflict).
    #[error("object already exists: {message}")]
    ObjectAlreadyExists { message: String },

    /// Target system refused the operation.
    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    /// Object not found in target system (update/delete target missing).
    #[error("object not found: {message}")]
    ObjectNotFound { message: String },

    /// Target system reported a failure that has no more specific kind.
    #[error("operation failed: {message}")]
    OperationFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Data errors
    /// An attribute value could not be converted.
    #[error("invalid attribute value: {message}")]
    InvalidAttributeValue {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation is not supported for the object class.
    #[error("{operation} is not supported for object class '{object_class}'")]
    UnsupportedOperation {
        operation: String,
        object_class: String,
    },

    /// Object class is unknown to the connector.
    #[error("object class '{object_class}' not found in schema")]
    ObjectClassNotFound { object_class: String },
}

impl ConnectorError {
    /// Check if this error is transient and the operation may succeed on retry.
    ///
    /// The connector never retries by itself; this is a hint for the host.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ConnectorError::ConnectionFailed { .. }
                | ConnectorError::OperationTimeout { .. }
                | ConnectorError::NetworkError { .. }
        )
    }

    /// Check if this error is permanent and retry won't help.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConnectorError::InvalidConfiguration { .. } => "INVALID_CONFIG",
            ConnectorError::InvalidCredentials { .. } => "INVALID_CREDENTIALS",
            ConnectorError::ConnectionFailed { .. } => "CONNECTION_FAILED",
            ConnectorError::OperationTimeout { .. } => "OPERATION_TIMEOUT",
            ConnectorError::NetworkError { .. } => "NETWORK_ERROR",
            ConnectorError::ObjectAlreadyExists { .. } => "OBJECT_EXISTS",
            ConnectorError::PermissionDenied { .. } => "PERMISSION_DENIED",
            ConnectorError::ObjectNotFound { .. } => "OBJECT_NOT_FOUND",
            ConnectorError::OperationFailed { .. } => "OPERATION_FAILED",
            ConnectorError::InvalidAttributeValue { .. } => "INVALID_ATTRIBUTE_VALUE",
            ConnectorError::UnsupportedOperation { .. } => "UNSUPPORTED_OPERATION",
            ConnectorError::ObjectClassNotFound { .. } => "OBJECT_CLASS_NOT_FOUND",
        }
    }

    // Convenience constructors

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        ConnectorError::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create an invalid credentials error.
    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        ConnectorError::InvalidCredentials {
            message: message.into(),
            source: None,
        }
    }

    /// Create an invalid credentials error with source.
    pub fn invalid_credentials_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::InvalidCredentials {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        ConnectorError::ConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection failed error with source.
    pub fn connection_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::ConnectionFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a timeout error with source.
    pub fn timeout_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::OperationTimeout {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        ConnectorError::NetworkError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a network error with source.
    pub fn network_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::NetworkError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an operation failed error.
    pub fn operation_failed(message: impl Into<String>) -> Self {
        ConnectorError::OperationFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create an operation failed error with source.
    pub fn operation_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::OperationFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid attribute value error.
    pub fn invalid_attribute_value(message: impl Into<String>) -> Self {
        ConnectorError::InvalidAttributeValue {
            message: message.into(),
            source: None,
        }
    }

    /// Create an invalid attribute value error with source.
    pub fn invalid_attribute_value_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::InvalidAttributeValue {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an unsupported operation error.
    pub fn unsupported(operation: impl Into<String>, object_class: impl Into<String>) -> Self {
        ConnectorError::UnsupportedOperation {
            operation: operation.into(),
            object_class: object_class.into(),
        }
    }
}

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;
