//! Session configuration threaded through every plan stream.
//!
//! The configuration is never written into a stream. Writers and readers hold
//! it by reference, and node codecs consult it to decide the wire shape or to
//! restore values (time zone, current time, query text) on decode.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CommonError, Result};
use crate::version::TransportVersion;

/// Immutable per-session settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SessionConfiguration {
    transport_version: TransportVersion,
    zone_id: String,
    locale: String,
    query: String,
    username: String,
    cluster_name: String,
    now_millis: i64,
    pragmas: BTreeMap<String, String>,
    result_truncation_max_size: u32,
    result_truncation_default_size: u32,
}

impl Default for SessionConfiguration {
    fn default() -> Self {
        Self {
            transport_version: TransportVersion::CURRENT,
            zone_id: "UTC".to_string(),
            locale: "en-US".to_string(),
            query: String::new(),
            username: String::new(),
            cluster_name: "planwire".to_string(),
            now_millis: 0,
            pragmas: BTreeMap::new(),
            result_truncation_max_size: 10_000,
            result_truncation_default_size: 1_000,
        }
    }
}

impl SessionConfiguration {
    pub fn builder() -> SessionConfigurationBuilder {
        SessionConfigurationBuilder::new()
    }

    /// Parse and validate a configuration from JSON. Missing fields take
    /// their default values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SessionConfiguration = serde_json::from_str(json).map_err(|e| {
            CommonError::configuration_error_with_source("failed to parse session configuration", e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            CommonError::configuration_error_with_source(
                format!("failed to read configuration file {}", path.display()),
                e,
            )
        })?;
        let config = Self::from_json_str(&json)?;
        debug!(
            path = %path.display(),
            version = %config.transport_version,
            "loaded session configuration"
        );
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            CommonError::configuration_error_with_source(
                "failed to render session configuration",
                e,
            )
        })
    }

    fn validate(&self) -> Result<()> {
        TransportVersion::from_id(self.transport_version.id())?;
        if self.zone_id.is_empty() {
            return Err(CommonError::configuration_error("zone_id must not be empty"));
        }
        if self.locale.is_empty() {
            return Err(CommonError::configuration_error("locale must not be empty"));
        }
        if self.result_truncation_default_size > self.result_truncation_max_size {
            return Err(CommonError::configuration_error(format!(
                "result_truncation_default_size [{}] exceeds result_truncation_max_size [{}]",
                self.result_truncation_default_size, self.result_truncation_max_size
            )));
        }
        Ok(())
    }

    pub fn transport_version(&self) -> TransportVersion {
        self.transport_version
    }

    pub fn zone_id(&self) -> &str {
        &self.zone_id
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// The query text the plans of this session were parsed from.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    /// Wall clock captured when the session started, in epoch milliseconds.
    pub fn now_millis(&self) -> i64 {
        self.now_millis
    }

    pub fn pragma(&self, key: &str) -> Option<&str> {
        self.pragmas.get(key).map(String::as_str)
    }

    pub fn pragmas(&self) -> &BTreeMap<String, String> {
        &self.pragmas
    }

    pub fn result_truncation_max_size(&self) -> u32 {
        self.result_truncation_max_size
    }

    pub fn result_truncation_default_size(&self) -> u32 {
        self.result_truncation_default_size
    }

    /// A copy of this configuration speaking another transport version.
    pub fn with_transport_version(&self, version: TransportVersion) -> Self {
        Self {
            transport_version: version,
            ..self.clone()
        }
    }
}

/// Builder for session configurations.
pub struct SessionConfigurationBuilder {
    config: SessionConfiguration,
}

impl SessionConfigurationBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: SessionConfiguration::default(),
        }
    }

    pub fn transport_version(mut self, version: TransportVersion) -> Self {
        self.config.transport_version = version;
        self
    }

    pub fn zone_id<S: Into<String>>(mut self, zone_id: S) -> Self {
        self.config.zone_id = zone_id.into();
        self
    }

    pub fn locale<S: Into<String>>(mut self, locale: S) -> Self {
        self.config.locale = locale.into();
        self
    }

    pub fn query<S: Into<String>>(mut self, query: S) -> Self {
        self.config.query = query.into();
        self
    }

    pub fn username<S: Into<String>>(mut self, username: S) -> Self {
        self.config.username = username.into();
        self
    }

    pub fn cluster_name<S: Into<String>>(mut self, cluster_name: S) -> Self {
        self.config.cluster_name = cluster_name.into();
        self
    }

    pub fn now_millis(mut self, now_millis: i64) -> Self {
        self.config.now_millis = now_millis;
        self
    }

    pub fn pragma<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.config.pragmas.insert(key.into(), value.into());
        self
    }

    pub fn result_truncation(mut self, max_size: u32, default_size: u32) -> Self {
        self.config.result_truncation_max_size = max_size;
        self.config.result_truncation_default_size = default_size;
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<SessionConfiguration> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for SessionConfigurationBuilder {
    fn default() -> Self {
        Self::new()
    }
}
