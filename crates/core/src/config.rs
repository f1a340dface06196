//! Process-wide configuration via `app-error.toml`
//!
//! Configuration is installed at most once, by the embedding application at
//! startup, through [`init`] or [`init_with`]. Until then every operation
//! runs with [`Config::default`].

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::path::Path;
use tracing::info;

use crate::error::{Error, Result};

/// Config file name conventionally placed next to the application.
pub const CONFIG_FILE_NAME: &str = "app-error.toml";

/// Default nesting depth rendered by JSON conversion and reports
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// How backtraces are captured when an error has no explicit stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BacktraceMode {
    /// Never capture; the stack is just the header line
    Off,
    /// Capture when `RUST_BACKTRACE` / `RUST_LIB_BACKTRACE` ask for it
    #[default]
    Env,
    /// Always capture full backtraces
    Full,
}

/// Library configuration loaded from `app-error.toml`.
///
/// # Example
///
/// ```toml
/// # "off", "env" (default) or "full"
/// backtrace = "full"
///
/// # Deepest nesting level rendered as JSON (default: 1024)
/// max_depth = 1024
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Backtrace capture mode
    #[serde(default)]
    pub backtrace: BacktraceMode,
    /// Rendered JSON replaces deeper containers with `"[CircularError]"`.
    /// Sanitization itself is not depth-limited.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backtrace: BacktraceMode::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Config {
    /// Unlimited backtrace capture, installed by [`init`]
    pub fn unlimited() -> Self {
        Self {
            backtrace: BacktraceMode::Full,
            ..Self::default()
        }
    }

    /// Check field values.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_depth` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(Error::Config("max_depth must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::Config(msg) => {
                Error::Config(format!("Failed to parse '{}': {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# app-error configuration
#
# Backtrace capture for errors created without an explicit stack:
#   "off"  = never capture
#   "env"  = capture when RUST_BACKTRACE / RUST_LIB_BACKTRACE is set
#   "full" = always capture
backtrace = "env"

# Deepest nesting level rendered when an error is serialized or
# printed. Deeper containers are rendered as "[CircularError]".
# Sanitization walks any depth.
max_depth = 1024
"#
    }
}

static CONFIG: OnceCell<Config> = OnceCell::new();

/// Install unlimited backtrace capture for the whole process.
///
/// Call once at startup.
pub fn init() -> Result<()> {
    init_with(Config::unlimited())
}

/// Install `config` for the whole process.
///
/// # Errors
///
/// Returns [`Error::AlreadyInitialized`] if configuration was already
/// installed, or a config error if `config` is invalid.
pub fn init_with(config: Config) -> Result<()> {
    config.validate()?;
    CONFIG.set(config).map_err(|_| Error::AlreadyInitialized)?;
    info!(backtrace = ?config.backtrace, max_depth = config.max_depth, "app-error configured");
    Ok(())
}

/// The installed configuration, or the defaults.
pub fn current() -> Config {
    CONFIG.get().copied().unwrap_or_default()
}

/// Render the stack text for a newly created error.
pub(crate) fn capture_stack(message: &str) -> String {
    let backtrace = match current().backtrace {
        BacktraceMode::Off => None,
        BacktraceMode::Env => Some(Backtrace::capture()),
        BacktraceMode::Full => Some(Backtrace::force_capture()),
    };
    match backtrace {
        Some(bt) if bt.status() == BacktraceStatus::Captured => {
            format!("Error: {}\n{}", message, bt)
        }
        _ => format!("Error: {}", message),
    }
}
