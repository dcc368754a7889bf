//! Error types for Deacon operations

use thiserror::Error;

/// Persistent store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Failed to read key {key}: {reason}")]
    ReadFailed { key: String, reason: String },

    #[error("Failed to write key {key}: {reason}")]
    WriteFailed { key: String, reason: String },

    #[error("Failed to clear store: {reason}")]
    ClearFailed { reason: String },

    #[error("Failed to serialize value for {key}: {reason}")]
    SerializationFailed { key: String, reason: String },

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Remote API errors.
///
/// Callers only surface the message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Request to {path} failed with status {status}: {message}")]
    RequestFailed {
        path: String,
        status: u16,
        message: String,
    },

    #[error("Transport error for {path}: {reason}")]
    Transport { path: String, reason: String },

    #[error("Invalid response from {path}: {reason}")]
    InvalidResponse { path: String, reason: String },

    #[error("Fetch task failed: {reason}")]
    TaskFailed { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or DEACON_CONFIG)")]
    MissingConfigPath,

    #[error("Failed to read config file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse config TOML: {reason}")]
    Parse { reason: String },

    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Master error type for all Deacon errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeaconError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for Deacon operations.
pub type DeaconResult<T> = Result<T, DeaconError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_display() {
        let err = RemoteError::RequestFailed {
            path: "/post/parent1/connection".to_string(),
            status: 429,
            message: "Too many requests".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("429"));
        assert!(msg.contains("Too many requests"));
    }

    #[test]
    fn test_master_error_wraps_layers() {
        let err: DeaconError = StoreError::LockPoisoned.into();
        assert!(matches!(err, DeaconError::Store(StoreError::LockPoisoned)));
        assert_eq!(err.to_string(), "Store error: Store lock poisoned");

        let err: DeaconError = RemoteError::NotAuthenticated.into();
        assert_eq!(err.to_string(), "Remote error: Not logged in");
    }
}
