//! SPML protocol client
//!
//! Sends SPML requests in a SOAP envelope over HTTP POST with basic
//! authentication, parses the response and maps failures onto
//! [`ConnectorError`] kinds.

use reqwest::{header, Client, StatusCode};
use tracing::{debug, error, info, instrument};

use idm_connector::error::{ConnectorError, ConnectorResult};

use crate::config::UmeConfig;
use crate::spml::soap::{CONTENT_TYPE, SOAP_ACTION};
use crate::spml::{parse_response, wrap_envelope, SchemaRequest, SpmlRequest, SpmlResponse};

/// Operation an exchange belongs to, as shown in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationTag {
    Create,
    Update,
    Delete,
    Query,
    Test,
}

impl OperationTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationTag::Create => "CREATE",
            OperationTag::Update => "UPDATE",
            OperationTag::Delete => "DELETE",
            OperationTag::Query => "QUERY",
            OperationTag::Test => "TEST",
        }
    }
}

impl std::fmt::Display for OperationTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a failure reported by the SPML service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    AlreadyExists,
    PermissionDenied,
    NotFound,
    Other,
}

impl FailureKind {
    /// Build the error for a failure message.
    pub fn into_error(self, message: impl Into<String>) -> ConnectorError {
        let message = message.into();
        match self {
            FailureKind::AlreadyExists => ConnectorError::ObjectAlreadyExists { message },
            FailureKind::PermissionDenied => ConnectorError::PermissionDenied { message },
            FailureKind::NotFound => ConnectorError::ObjectNotFound { message },
            FailureKind::Other => ConnectorError::operation_failed(message),
        }
    }
}

/// Classify a failure message by the phrases UME uses.
pub fn classify_failure(message: &str) -> FailureKind {
    if message.contains("already exists") {
        FailureKind::AlreadyExists
    } else if message.contains("is not allowed") {
        FailureKind::PermissionDenied
    } else if message.contains("doesn't exist") {
        FailureKind::NotFound
    } else {
        FailureKind::Other
    }
}

/// Base64 encode bytes to string.
fn base64_encode(data: impl AsRef<[u8]>) -> String {
    use base64::{engine::general_purpose::STANDARD, Engine};
    STANDARD.encode(data)
}

fn transport_error(e: reqwest::Error) -> ConnectorError {
    if e.is_timeout() {
        ConnectorError::timeout_with_source("SPML request timed out", e)
    } else {
        ConnectorError::network_with_source("SPML request failed", e)
    }
}

/// HTTP client for the UME SPML service.
pub struct SpmlClient {
    url: String,
    user: String,
    password: String,
    log_request: bool,
    log_response: bool,
    http: Client,
}

impl std::fmt::Debug for SpmlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpmlClient")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("log_request", &self.log_request)
            .field("log_response", &self.log_response)
            .finish()
    }
}

impl SpmlClient {
    /// Create a client from connector configuration.
    pub fn new(config: &UmeConfig) -> ConnectorResult<Self> {
        Ok(Self {
            url: config.url.clone(),
            user: config.user.clone(),
            password: config.password.clone(),
            log_request: config.log_spml_request,
            log_response: config.log_spml_response,
            http: Self::build_http(config)?,
        })
    }

    fn build_http(config: &UmeConfig) -> ConnectorResult<Client> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = config.read_timeout() {
            builder = builder.read_timeout(timeout);
        }

        builder
            .build()
            .map_err(|e| ConnectorError::InvalidConfiguration {
                message: format!("Failed to build HTTP client: {e}"),
            })
    }

    fn check_credentials(&self) -> ConnectorResult<()> {
        if self.url.trim().is_empty() {
            return Err(ConnectorError::invalid_credentials("URL must not be empty"));
        }
        if self.user.trim().is_empty() || self.password.is_empty() {
            return Err(ConnectorError::invalid_credentials(
                "User and Password must not be empty",
            ));
        }
        Ok(())
    }

    fn log_request(&self, request: &SpmlRequest, tag: OperationTag) {
        if !self.log_request {
            return;
        }
        let xml = request.redacted().to_xml();
        let id = request.identifier().unwrap_or_default();
        info!(operation = %tag, id = %id, xml = %xml, "SPML REQUEST");
    }

    fn log_response(&self, xml: &str, tag: OperationTag) {
        if self.log_response {
            info!(operation = %tag, xml = %xml, "SPML RESPONSE");
        }
    }

    /// Send a request and return the parsed response.
    ///
    /// An empty response body yields `None`. A response that reports failure
    /// is turned into an error classified by [`classify_failure`].
    #[instrument(skip(self, request), fields(operation = %tag, request = request.kind()))]
    pub async fn execute(
        &self,
        request: &SpmlRequest,
        tag: OperationTag,
    ) -> ConnectorResult<Option<SpmlResponse>> {
        self.log_request(request, tag);
        self.check_credentials()?;

        let body = wrap_envelope(&request.to_xml());
        debug!(url = %self.url, bytes = body.len(), "Sending SPML request");

        let authorization = format!(
            "Basic {}",
            base64_encode(format!("{}:{}", self.user, self.password))
        );
        let response = self
            .http
            .post(&self.url)
            .header(header::AUTHORIZATION, authorization)
            .header(header::CONTENT_TYPE, CONTENT_TYPE)
            .header("SOAPAction", SOAP_ACTION)
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ConnectorError::invalid_credentials(format!(
                "Connection error {status}"
            )));
        }

        let text = response.text().await.map_err(transport_error)?;
        debug!(status = %status, bytes = text.len(), "Received SPML response");

        if text.trim().is_empty() {
            if !status.is_success() {
                return Err(ConnectorError::network(format!(
                    "SPML service returned {status}"
                )));
            }
            self.log_response("", tag);
            return Ok(None);
        }

        let parsed = match parse_response(&text) {
            Ok(parsed) => parsed,
            // SOAP faults usually come with a 500; anything else unparsable is transport noise
            Err(_) if !status.is_success() => {
                return Err(ConnectorError::network(format!(
                    "SPML service returned {status}: {text}"
                )));
            }
            Err(e) => {
                return Err(ConnectorError::operation_failed_with_source(
                    "Invalid SPML response",
                    e,
                ));
            }
        };
        self.log_response(&parsed.xml, tag);

        if parsed.is_failure() {
            let message = parsed.failure_message();
            error!(operation = %tag, message = %message, "SPML RESPONSE is failure");
            return Err(classify_failure(&message).into_error(message));
        }

        Ok(Some(parsed))
    }

    /// Check the service by requesting the UME principal schema.
    #[instrument(skip(self))]
    pub async fn test(&self) -> ConnectorResult<()> {
        let request = SpmlRequest::from(SchemaRequest::default());
        match self.execute(&request, OperationTag::Test).await {
            Ok(response) => {
                let schema = response.map(|r| r.xml).unwrap_or_default();
                info!(schema = %schema, "Backend UME schema");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Exception in connection");
                Err(ConnectorError::connection_failed_with_source(
                    "SPML connection test failed",
                    e,
                ))
            }
        }
    }
}
