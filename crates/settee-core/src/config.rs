use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{QueueError, Result};
use crate::queue::QueueConfig;

/// Top-level configuration, deserializable from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SetteeConfig {
    pub store: StoreSettings,
    pub queue: QueueConfig,
    pub telemetry: TelemetryConfig,
}

/// Where the queue's documents live and who is opening them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Database (queue) name.
    pub name: String,
    /// `memory`, `rocksdb://<path>` or a bare filesystem path.
    pub location: String,
    pub credentials: Option<Credentials>,
}

#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Log filter used when `RUST_LOG` is unset.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// A resolved store location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Memory,
    RocksDb(PathBuf),
}

impl SetteeConfig {
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| QueueError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| QueueError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml(&contents)
    }
}

impl StoreSettings {
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        credentials: Option<Credentials>,
    ) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            credentials,
        }
    }

    /// Reject settings with a missing name, location or credentials.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(QueueError::Config("store name is required".to_string()));
        }
        if self.location.trim().is_empty() {
            return Err(QueueError::Config("store location is required".to_string()));
        }
        match &self.credentials {
            Some(credentials) if !credentials.username.trim().is_empty() => Ok(()),
            _ => Err(QueueError::Config(
                "store credentials are required".to_string(),
            )),
        }
    }

    pub fn resolve_location(&self) -> Result<StoreLocation> {
        let location = self.location.trim();
        if location == "memory" || location.starts_with("memory://") {
            return Ok(StoreLocation::Memory);
        }
        if let Some(path) = location.strip_prefix("rocksdb://") {
            if path.is_empty() {
                return Err(QueueError::Config("rocksdb location needs a path".to_string()));
            }
            return Ok(StoreLocation::RocksDb(PathBuf::from(path)));
        }
        if location.contains("://") {
            return Err(QueueError::Config(format!(
                "unsupported store location: {location}"
            )));
        }
        Ok(StoreLocation::RocksDb(PathBuf::from(location)))
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::Order;

    fn settings(name: &str, location: &str, user: Option<&str>) -> StoreSettings {
        StoreSettings::new(name, location, user.map(|u| Credentials::new(u, "pw")))
    }

    #[test]
    fn default_config_values() {
        let config = SetteeConfig::default();
        assert!(config.store.name.is_empty());
        assert_eq!(config.queue.order, Order::Random);
        assert!(!config.queue.override_existing);
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn toml_parsing_with_overrides() {
        let config = SetteeConfig::from_toml(
            r#"
            [store]
            name = "crawl"
            location = "rocksdb:///var/lib/settee"

            [store.credentials]
            username = "worker"
            password = "secret"

            [queue]
            order = "fifo"
            override = true

            [telemetry]
            log_level = "debug"
        "#,
        )
        .unwrap();
        assert_eq!(config.store.name, "crawl");
        assert_eq!(config.queue.order, Order::Fifo);
        assert!(config.queue.override_existing);
        assert_eq!(config.telemetry.log_level, "debug");
        assert_eq!(
            config.store.resolve_location().unwrap(),
            StoreLocation::RocksDb(PathBuf::from("/var/lib/settee"))
        );
        config.store.validate().unwrap();
    }

    #[test]
    fn toml_parsing_empty_uses_defaults() {
        let config = SetteeConfig::from_toml("").unwrap();
        assert_eq!(config.queue, QueueConfig::default());
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn unknown_order_in_toml_is_a_config_error() {
        let err = SetteeConfig::from_toml("[queue]\norder = \"priority\"\n").unwrap_err();
        assert!(matches!(err, QueueError::Config(_)), "got {err:?}");
    }

    #[test]
    fn validate_requires_name_location_and_credentials() {
        assert!(settings("q", "memory", Some("u")).validate().is_ok());
        for bad in [
            settings("", "memory", Some("u")),
            settings("q", " ", Some("u")),
            settings("q", "memory", None),
            settings("q", "memory", Some("")),
        ] {
            let err = bad.validate().unwrap_err();
            assert!(matches!(err, QueueError::Config(_)), "got {err:?}");
        }
    }

    #[test]
    fn locations_resolve_by_scheme() {
        let resolve = |loc: &str| settings("q", loc, Some("u")).resolve_location();
        assert_eq!(resolve("memory").unwrap(), StoreLocation::Memory);
        assert_eq!(resolve("memory://scratch").unwrap(), StoreLocation::Memory);
        assert_eq!(
            resolve("data/queues").unwrap(),
            StoreLocation::RocksDb(PathBuf::from("data/queues"))
        );
        assert!(resolve("http://couch:5984").is_err());
        assert!(resolve("rocksdb://").is_err());
    }

    #[test]
    fn credentials_debug_hides_password() {
        let rendered = format!("{:?}", Credentials::new("worker", "hunter2"));
        assert!(rendered.contains("worker"));
        assert!(!rendered.contains("hunter2"));
    }
}
