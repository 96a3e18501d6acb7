// loganyapp - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Every error names the exact source and value that failed, because the
// user has to find and fix it in an option, flag, variable or config file.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all loganyapp operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum LogAnyAppError {
    /// A severity value failed validation.
    Level(LevelError),

    /// A caller-supplied option had the wrong key, shape, or value.
    Option(OptionError),

    /// A configuration file could not be loaded.
    Config(ConfigError),

    /// The backend rejected the configuration.
    Backend(BackendError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },

    /// The configuration dump could not be written.
    Dump { source: io::Error },
}

impl fmt::Display for LogAnyAppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Level(e) => write!(f, "Level error: {e}"),
            Self::Option(e) => write!(f, "Option error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Backend(e) => write!(f, "Backend error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
            Self::Dump { source } => write!(f, "failed to write configuration dump: {source}"),
        }
    }
}

impl std::error::Error for LogAnyAppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Level(e) => Some(e),
            Self::Option(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Backend(e) => Some(e),
            Self::Io { source, .. } => Some(source),
            Self::Dump { source } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Level errors
// ---------------------------------------------------------------------------

/// Errors related to severity values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelError {
    /// A value outside the severity enumeration.
    ///
    /// `source` names where the value came from, e.g.
    /// `environment variable FILE_LOG_LEVEL` or `category_level key 'Foo'`.
    Invalid { source: String, value: String },
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid { source, value } => write!(
                f,
                "invalid level '{value}' from {source}. \
                 Valid levels: off, fatal, error, warn, info, debug, trace"
            ),
        }
    }
}

impl std::error::Error for LevelError {}

impl From<LevelError> for LogAnyAppError {
    fn from(e: LevelError) -> Self {
        Self::Level(e)
    }
}

// ---------------------------------------------------------------------------
// Option errors
// ---------------------------------------------------------------------------

/// Errors related to the shape or content of caller-supplied options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionError {
    /// A top-level key the builder does not recognise.
    UnknownOption {
        key: String,
        allowed: &'static [&'static str],
    },

    /// A `-key` was the last element of a flat option sequence.
    MissingValue { key: String },

    /// A value was neither boolean, scalar, record, nor list, or was a
    /// scalar where the output does not take one.
    InvalidShape { option: String, reason: String },

    /// An output record contained a field not in the output's field set.
    UnknownField {
        output: &'static str,
        field: String,
        allowed: Vec<&'static str>,
    },

    /// An output record field had the wrong type.
    InvalidField {
        output: &'static str,
        field: String,
        expected: &'static str,
    },

    /// A pattern style name not in the style table.
    UnknownStyle {
        style: String,
        allowed: Vec<&'static str>,
    },

    /// A syslog facility name not in the facility table.
    UnknownFacility {
        facility: String,
        allowed: &'static [&'static str],
    },
}

impl fmt::Display for OptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOption { key, allowed } => write!(
                f,
                "unknown option '{key}'. Valid options: {}",
                allowed.join(", ")
            ),
            Self::MissingValue { key } => {
                write!(f, "option '{key}' is missing its value")
            }
            Self::InvalidShape { option, reason } => {
                write!(f, "invalid value for '{option}': {reason}")
            }
            Self::UnknownField {
                output,
                field,
                allowed,
            } => write!(
                f,
                "unknown field '{field}' for {output} output. Valid fields: {}",
                allowed.join(", ")
            ),
            Self::InvalidField {
                output,
                field,
                expected,
            } => write!(f, "{output} output field '{field}' must be {expected}"),
            Self::UnknownStyle { style, allowed } => write!(
                f,
                "unknown pattern style '{style}'. Valid styles: {}",
                allowed.join(", ")
            ),
            Self::UnknownFacility { facility, allowed } => write!(
                f,
                "unknown syslog facility '{facility}'. Valid facilities: {}",
                allowed.join(", ")
            ),
        }
    }
}

impl std::error::Error for OptionError {}

impl From<OptionError> for LogAnyAppError {
    fn from(e: OptionError) -> Self {
        Self::Option(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration file loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<ConfigError> for LogAnyAppError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Backend errors
// ---------------------------------------------------------------------------

/// Errors raised while serialising or activating the backend configuration.
#[derive(Debug)]
pub enum BackendError {
    /// The configuration blob could not be rendered as text.
    Serialize { source: toml::ser::Error },

    /// The configuration blob text could not be parsed.
    Deserialize { source: toml::de::Error },

    /// A category references an appender or filter the blob does not define.
    DanglingReference { category: String, name: String },

    /// An appender kind cannot be activated on this platform.
    Unsupported { appender: String, reason: String },

    /// An appender could not open its destination.
    Open {
        appender: String,
        path: PathBuf,
        source: io::Error,
    },

    /// A global subscriber was already installed by someone else.
    Install { reason: String },
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serialize { source } => {
                write!(f, "failed to serialise backend configuration: {source}")
            }
            Self::Deserialize { source } => {
                write!(f, "failed to parse backend configuration: {source}")
            }
            Self::DanglingReference { category, name } => write!(
                f,
                "category '{category}' references undefined appender or filter '{name}'"
            ),
            Self::Unsupported { appender, reason } => {
                write!(f, "appender '{appender}' is not supported: {reason}")
            }
            Self::Open {
                appender,
                path,
                source,
            } => write!(
                f,
                "appender '{appender}' could not open '{}': {source}",
                path.display()
            ),
            Self::Install { reason } => {
                write!(f, "failed to install logging backend: {reason}")
            }
        }
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Serialize { source } => Some(source),
            Self::Deserialize { source } => Some(source),
            Self::Open { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<BackendError> for LogAnyAppError {
    fn from(e: BackendError) -> Self {
        Self::Backend(e)
    }
}

/// Convenience type alias for loganyapp results.
pub type Result<T> = std::result::Result<T, LogAnyAppError>;
