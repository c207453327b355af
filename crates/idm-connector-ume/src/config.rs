//! SAP UME connector configuration
//!
//! Configuration types for the SPML endpoint, credentials, password policy,
//! validity windows and date handling.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use idm_connector::config::{ConnectorConfig, REDACTED};
use idm_connector::error::{ConnectorError, ConnectorResult};
use idm_connector::types::ConnectorType;

use crate::dates::{CONFIG_FORMAT, CURRENT_TIME};

/// Default characters used to enumerate all objects with prefix searches.
pub const DEFAULT_FULL_SEARCH_PATTERN: &str = "abcdefghijklmnopqrstuvwxyz1234567890";

/// Default password written before the real one.
pub const DEFAULT_DUMMY_PASSWORD: &str = "5ecretDummyPWD";

/// Default end of the validity window written when enabling.
pub const DEFAULT_ENABLE_VALID_TO: &str = "9999-12-31 00:00:00";

/// SAP UME connector configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UmeConfig {
    /// SPML endpoint URL (e.g., "https://host/spml/spmlservice").
    pub url: String,

    /// User for HTTP basic authentication.
    pub user: String,

    /// Password for HTTP basic authentication.
    pub password: String,

    /// Characters used for the prefix searches that enumerate all objects.
    #[serde(default = "default_full_search_pattern")]
    pub full_search_string_pattern: String,

    /// Password written first when the real password is set in a second request.
    #[serde(default = "default_dummy_password")]
    pub dummy_password: String,

    /// Extra account attributes exposed in the schema.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ume_add_attrs: Vec<String>,

    /// Log SPML requests (passwords masked).
    #[serde(default, rename = "logSPMLRequest")]
    pub log_spml_request: bool,

    /// Log SPML responses.
    #[serde(default, rename = "logSPMLResponse")]
    pub log_spml_response: bool,

    /// Write the real password directly on create.
    #[serde(default)]
    pub initial_password_after_create: bool,

    /// Write the real password directly on update.
    #[serde(default)]
    pub initial_password_after_update: bool,

    /// Connect timeout in milliseconds, 0 means unbounded.
    #[serde(default)]
    pub connect_timeout_ms: u64,

    /// Read timeout in milliseconds, 0 means unbounded.
    #[serde(default)]
    pub read_timeout_ms: u64,

    /// Start of the validity window written when enabling.
    #[serde(default)]
    pub enable_valid_from_time: String,

    /// End of the validity window written when enabling.
    #[serde(default = "default_enable_valid_to")]
    pub enable_valid_to_time: String,

    /// Start of the validity window written when disabling.
    #[serde(default)]
    pub disable_valid_from_time: String,

    /// End of the validity window written when disabling.
    #[serde(default = "default_disable_valid_to")]
    pub disable_valid_to_time: String,

    /// UTC offset of UME timestamps in whole hours. `None` uses the local
    /// standard offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ume_offset: Option<i32>,
}

fn default_full_search_pattern() -> String {
    DEFAULT_FULL_SEARCH_PATTERN.to_string()
}

fn default_dummy_password() -> String {
    DEFAULT_DUMMY_PASSWORD.to_string()
}

fn default_enable_valid_to() -> String {
    DEFAULT_ENABLE_VALID_TO.to_string()
}

fn default_disable_valid_to() -> String {
    CURRENT_TIME.to_string()
}

impl std::fmt::Debug for UmeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UmeConfig")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &REDACTED)
            .field("full_search_string_pattern", &self.full_search_string_pattern)
            .field("dummy_password", &REDACTED)
            .field("ume_add_attrs", &self.ume_add_attrs)
            .field("log_spml_request", &self.log_spml_request)
            .field("log_spml_response", &self.log_spml_response)
            .field(
                "initial_password_after_create",
                &self.initial_password_after_create,
            )
            .field(
                "initial_password_after_update",
                &self.initial_password_after_update,
            )
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("read_timeout_ms", &self.read_timeout_ms)
            .field("enable_valid_from_time", &self.enable_valid_from_time)
            .field("enable_valid_to_time", &self.enable_valid_to_time)
            .field("disable_valid_from_time", &self.disable_valid_from_time)
            .field("disable_valid_to_time", &self.disable_valid_to_time)
            .field("ume_offset", &self.ume_offset)
            .finish()
    }
}

impl UmeConfig {
    /// Create a new config with the required fields and defaults elsewhere.
    pub fn new(
        url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            user: user.into(),
            password: password.into(),
            full_search_string_pattern: default_full_search_pattern(),
            dummy_password: default_dummy_password(),
            ume_add_attrs: Vec::new(),
            log_spml_request: false,
            log_spml_response: false,
            initial_password_after_create: false,
            initial_password_after_update: false,
            connect_timeout_ms: 0,
            read_timeout_ms: 0,
            enable_valid_from_time: String::new(),
            enable_valid_to_time: default_enable_valid_to(),
            disable_valid_from_time: String::new(),
            disable_valid_to_time: default_disable_valid_to(),
            ume_offset: None,
        }
    }

    /// Set the full-scan search pattern.
    #[must_use]
    pub fn with_full_search_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.full_search_string_pattern = pattern.into();
        self
    }

    /// Set the dummy password.
    #[must_use]
    pub fn with_dummy_password(mut self, password: impl Into<String>) -> Self {
        self.dummy_password = password.into();
        self
    }

    /// Add extra account attributes.
    #[must_use]
    pub fn with_extra_attributes<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.ume_add_attrs.extend(names.into_iter().map(Into::into));
        self
    }

    /// Enable or disable SPML request and response logging.
    #[must_use]
    pub fn with_spml_logging(mut self, requests: bool, responses: bool) -> Self {
        self.log_spml_request = requests;
        self.log_spml_response = responses;
        self
    }

    /// Write real passwords directly instead of the dummy-password sequence.
    #[must_use]
    pub fn with_initial_password(mut self, after_create: bool, after_update: bool) -> Self {
        self.initial_password_after_create = after_create;
        self.initial_password_after_update = after_update;
        self
    }

    /// Set connect and read timeouts in milliseconds.
    #[must_use]
    pub fn with_timeouts(mut self, connect_ms: u64, read_ms: u64) -> Self {
        self.connect_timeout_ms = connect_ms;
        self.read_timeout_ms = read_ms;
        self
    }

    /// Set the validity window written when enabling.
    #[must_use]
    pub fn with_enable_window(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.enable_valid_from_time = from.into();
        self.enable_valid_to_time = to.into();
        self
    }

    /// Set the validity window written when disabling.
    #[must_use]
    pub fn with_disable_window(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.disable_valid_from_time = from.into();
        self.disable_valid_to_time = to.into();
        self
    }

    /// Set the UTC offset of UME timestamps in hours.
    #[must_use]
    pub fn with_ume_offset(mut self, hours: i32) -> Self {
        self.ume_offset = Some(hours);
        self
    }

    /// Connect timeout, `None` when unbounded.
    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.connect_timeout_ms > 0).then(|| Duration::from_millis(self.connect_timeout_ms))
    }

    /// Read timeout, `None` when unbounded.
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }
}

fn require(value: &str, field: &str) -> ConnectorResult<()> {
    if value.trim().is_empty() {
        return Err(ConnectorError::invalid_configuration(format!(
            "{field} is required"
        )));
    }
    Ok(())
}

fn validate_window_time(value: &str, field: &str) -> ConnectorResult<()> {
    let value = value.trim();
    if value.is_empty() || value == CURRENT_TIME {
        return Ok(());
    }
    NaiveDateTime::parse_from_str(value, CONFIG_FORMAT).map_err(|e| {
        ConnectorError::invalid_configuration(format!(
            "{field} must be empty, {CURRENT_TIME} or '{CONFIG_FORMAT}': {e}"
        ))
    })?;
    Ok(())
}

impl ConnectorConfig for UmeConfig {
    fn connector_type() -> ConnectorType {
        ConnectorType::SapUme
    }

    fn validate(&self) -> ConnectorResult<()> {
        require(&self.url, "url")?;
        require(&self.user, "user")?;
        require(&self.password, "password")?;
        require(&self.full_search_string_pattern, "fullSearchStringPattern")?;
        require(&self.dummy_password, "dummyPassword")?;

        url::Url::parse(&self.url).map_err(|e| {
            ConnectorError::invalid_configuration(format!("invalid url: {e}"))
        })?;

        validate_window_time(&self.enable_valid_from_time, "enableValidFromTime")?;
        validate_window_time(&self.enable_valid_to_time, "enableValidToTime")?;
        validate_window_time(&self.disable_valid_from_time, "disableValidFromTime")?;
        validate_window_time(&self.disable_valid_to_time, "disableValidToTime")?;

        if let Some(hours) = self.ume_offset {
            if !(-23..=23).contains(&hours) {
                return Err(ConnectorError::invalid_configuration(format!(
                    "umeOffset must be between -23 and 23 hours, got {hours}"
                )));
            }
        }

        Ok(())
    }

    fn get_credentials(&self) -> Vec<(&'static str, String)> {
        vec![
            ("password", self.password.clone()),
            ("dummy_password", self.dummy_password.clone()),
        ]
    }

    fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.password = REDACTED.to_string();
        config.dummy_password = REDACTED.to_string();
        config
    }
}
