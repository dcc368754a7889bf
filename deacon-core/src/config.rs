//! Configuration loading for the Deacon data layer.
//!
//! Every section has programmatic defaults; a TOML file only needs to name
//! what it overrides. Unknown keys are rejected.

use crate::{
    ConfigError, CACHE_PREFIX, CARE_GROUP_PREFIX, DEFAULT_API_URL, DEFAULT_BATCH_COUNT,
    DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_RETRY_DELAY_MS,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Master configuration struct.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeaconConfig {
    pub client: ClientConfig,
    pub cache: CacheConfig,
    pub bulk: BulkWriteConfig,
    pub enrichment: EnrichmentConfig,
}

/// Remote API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    /// Bearer token. Token refresh is handled outside this crate.
    pub token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            token: None,
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Optimistic cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Prefix applied to every cache key in the persistent store.
    pub namespace: String,
    /// JSON file backing the store. In-memory when unset.
    pub store_path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace: CACHE_PREFIX.to_string(),
            store_path: None,
        }
    }
}

/// Retry policy settings for a single remote write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    /// 1.0 keeps the delay fixed.
    pub backoff_multiplier: f64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff_ms: DEFAULT_RETRY_DELAY_MS,
            backoff_multiplier: 1.0,
            max_backoff_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl RetryConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

/// Bulk connection writer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BulkWriteConfig {
    /// Number of batches the contact set is split into. Batches run
    /// concurrently, so this is also the maximum number of in-flight writes.
    pub batch_count: usize,
    pub retry: RetryConfig,
}

impl Default for BulkWriteConfig {
    fn default() -> Self {
        Self {
            batch_count: DEFAULT_BATCH_COUNT,
            retry: RetryConfig::default(),
        }
    }
}

/// Grouping and enrichment settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnrichmentConfig {
    /// Realm title prefix that marks a care group.
    pub care_group_prefix: String,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            care_group_prefix: CARE_GROUP_PREFIX.to_string(),
        }
    }
}

impl DeaconConfig {
    /// Load from `--config <path>` or `DEACON_CONFIG`, then validate.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client.api_base_url.trim().is_empty() {
            return Err(invalid("client.api_base_url", "must not be empty"));
        }
        if self.client.request_timeout_ms == 0 {
            return Err(invalid("client.request_timeout_ms", "must be > 0"));
        }
        if self.cache.namespace.is_empty() {
            return Err(invalid("cache.namespace", "must not be empty"));
        }
        if let Some(path) = &self.cache.store_path {
            if path.as_os_str().is_empty() {
                return Err(invalid("cache.store_path", "must not be empty when set"));
            }
        }
        if self.bulk.batch_count == 0 {
            return Err(invalid("bulk.batch_count", "must be > 0"));
        }
        if self.bulk.retry.backoff_multiplier < 1.0 {
            return Err(invalid("bulk.retry.backoff_multiplier", "must be >= 1.0"));
        }
        if self.bulk.retry.max_backoff_ms < self.bulk.retry.initial_backoff_ms {
            return Err(invalid(
                "bulk.retry.max_backoff_ms",
                "must be >= initial_backoff_ms",
            ));
        }
        if self.enrichment.care_group_prefix.trim().is_empty() {
            return Err(invalid("enrichment.care_group_prefix", "must not be empty"));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("DEACON_CONFIG").ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = DeaconConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bulk.batch_count, 5);
        assert_eq!(config.bulk.retry.max_retries, 3);
        assert_eq!(config.bulk.retry.initial_backoff(), Duration::from_millis(300));
        assert_eq!(config.cache.namespace, "cache:");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DeaconConfig::from_toml_str(
            r#"
            [client]
            api_base_url = "https://crm.example.org"
            token = "abc"

            [bulk]
            batch_count = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.client.api_base_url, "https://crm.example.org");
        assert_eq!(config.client.token.as_deref(), Some("abc"));
        assert_eq!(config.client.request_timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
        assert_eq!(config.bulk.batch_count, 3);
        assert_eq!(config.bulk.retry, RetryConfig::default());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = DeaconConfig::from_toml_str("[bulk]\nbatches = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = DeaconConfig::default();
        config.bulk.batch_count = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "bulk.batch_count"
        ));

        let mut config = DeaconConfig::default();
        config.bulk.retry.backoff_multiplier = 0.5;
        assert!(config.validate().is_err());

        let mut config = DeaconConfig::default();
        config.bulk.retry.max_backoff_ms = 10;
        assert!(config.validate().is_err());

        let mut config = DeaconConfig::default();
        config.client.api_base_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_path_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[cache]\nnamespace = \"deacon:\"").unwrap();

        let config = DeaconConfig::from_path(file.path()).unwrap();
        assert_eq!(config.cache.namespace, "deacon:");
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = DeaconConfig::from_path(Path::new("/nonexistent/deacon.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
