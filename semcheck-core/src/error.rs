//! Error types for semcheck operations
//!
//! Only startup work can fail: loading configuration, parsing the
//! semantic-convention registry and resolving match rules against it.
//! Request-time problems (missing attributes, unmatched signals, schema
//! mismatches) are findings, not errors, and never surface here.
//!
//! # Error Codes
//!
//! Each variant has a stable error code (e.g. `GROUP_NOT_FOUND`) suitable for
//! log aggregation and for scripts wrapping the server binary.
//!
//! # Example
//!
//! ```rust
//! use semcheck_core::error::{CheckerError, ErrorCategory};
//!
//! fn report(err: &CheckerError) {
//!     match err.category() {
//!         ErrorCategory::Configuration => eprintln!("fix the config: {err}"),
//!         ErrorCategory::Registry => eprintln!("fix the registry: {err}"),
//!         ErrorCategory::Io => eprintln!("I/O failure: {err}"),
//!     }
//!     eprintln!("code: {}", err.error_code());
//! }
//! ```

use thiserror::Error;

/// Result type alias for semcheck operations
pub type Result<T> = std::result::Result<T, CheckerError>;

/// Error category for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Configuration could not be read or is inconsistent
    Configuration,
    /// Semantic-convention registry could not be loaded or queried
    Registry,
    /// Underlying file system failure
    Io,
}

/// Errors that can occur while starting the checker
///
/// All of them are fatal: the process should refuse to start.
#[derive(Error, Debug)]
pub enum CheckerError {
    // ═══════════════════════════════════════════════════════════════════════
    // Configuration errors
    // ═══════════════════════════════════════════════════════════════════════

    /// Configuration sources could not be read or deserialized
    #[error("Failed to load configuration: {reason}")]
    ConfigLoad { reason: String },

    /// Configuration was read but is not usable
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// A name pattern in a match rule does not compile
    #[error("Invalid name pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Registry errors
    // ═══════════════════════════════════════════════════════════════════════

    /// Registry files could not be read
    #[error("Failed to load registry from '{path}': {reason}")]
    RegistryLoad { path: String, reason: String },

    /// Registry content is malformed or inconsistent
    #[error("Invalid registry: {reason}")]
    InvalidRegistry { reason: String },

    /// A match rule references a group the resolved version does not define
    #[error("Group '{group_id}' not found in semantic version '{version}'")]
    GroupNotFound { group_id: String, version: String },

    /// YAML parsing failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CheckerError {
    /// Returns the error category for grouping
    pub fn category(&self) -> ErrorCategory {
        match self {
            CheckerError::ConfigLoad { .. }
            | CheckerError::InvalidConfig { .. }
            | CheckerError::InvalidPattern { .. } => ErrorCategory::Configuration,

            CheckerError::RegistryLoad { .. }
            | CheckerError::InvalidRegistry { .. }
            | CheckerError::GroupNotFound { .. }
            | CheckerError::Yaml(_) => ErrorCategory::Registry,

            CheckerError::Io(_) => ErrorCategory::Io,
        }
    }

    /// Returns the stable error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            CheckerError::ConfigLoad { .. } => "CONFIG_LOAD_ERROR",
            CheckerError::InvalidConfig { .. } => "INVALID_CONFIG",
            CheckerError::InvalidPattern { .. } => "INVALID_PATTERN",
            CheckerError::RegistryLoad { .. } => "REGISTRY_LOAD_ERROR",
            CheckerError::InvalidRegistry { .. } => "INVALID_REGISTRY",
            CheckerError::GroupNotFound { .. } => "GROUP_NOT_FOUND",
            CheckerError::Yaml(_) => "YAML_ERROR",
            CheckerError::Io(_) => "IO_ERROR",
        }
    }
}

impl From<config::ConfigError> for CheckerError {
    fn from(err: config::ConfigError) -> Self {
        CheckerError::ConfigLoad {
            reason: err.to_string(),
        }
    }
}
