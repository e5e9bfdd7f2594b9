#![forbid(unsafe_code)]

//! Runtime configuration.
//!
//! Every field has a default, so an empty document is a valid config:
//!
//! ```toml
//! history_depth = 20
//! render_debounce_ms = 18
//! liveness_timeout_ms = 600000
//! session_keys = ["user", "token"]
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use weave_store::{DEFAULT_HISTORY_DEPTH, HistoryConfig};
use weave_view::SchedulerConfig;

/// Errors from loading a [`RuntimeConfig`].
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    /// A field is out of range.
    Invalid { field: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "reading {}: {source}", path.display()),
            Self::Parse(err) => write!(f, "parsing config: {err}"),
            Self::Invalid { field, reason } => write!(f, "invalid {field}: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        Self::Parse(err)
    }
}

/// Tunables for an [`App`](crate::App).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Mementos kept per record.
    pub history_depth: usize,
    /// Debounce window for render requests.
    pub render_debounce_ms: u64,
    /// Liveness timeout for transient views.
    pub liveness_timeout_ms: u64,
    /// Records mirrored into session storage.
    pub session_keys: Vec<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            history_depth: DEFAULT_HISTORY_DEPTH,
            render_debounce_ms: 18,
            liveness_timeout_ms: 600_000,
            session_keys: vec!["user".to_owned(), "token".to_owned()],
        }
    }
}

impl RuntimeConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed TOML or unknown fields,
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    ///
    /// # Errors
    ///
    /// As [`from_toml_str`](Self::from_toml_str), plus [`ConfigError::Io`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "history_depth",
                reason: "must be at least 1".into(),
            });
        }
        if let Some(key) = self
            .session_keys
            .iter()
            .find(|k| k.is_empty() || k.contains('.'))
        {
            return Err(ConfigError::Invalid {
                field: "session_keys",
                reason: format!("'{key}' is not a record name"),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn history(&self) -> HistoryConfig {
        HistoryConfig::with_max_depth(self.history_depth)
    }

    #[must_use]
    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig {
            debounce: Duration::from_millis(self.render_debounce_ms),
            liveness_timeout: Duration::from_millis(self.liveness_timeout_ms),
        }
    }
}
