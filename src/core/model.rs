// loganyapp - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no platform
// dependencies.
//
// These types are the shared vocabulary of the resolver, builder, compiler,
// and emitter.

use crate::util::error::LevelError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

// =============================================================================
// Severity
// =============================================================================

/// Severity levels, ordered from most suppressive to most verbose.
///
/// The derived `Ord` follows verbosity: `Off < Fatal < ... < Trace`. A
/// threshold `t` admits an event `e` when `e <= t`, so `Off` admits nothing
/// and the most verbose of two thresholds is their `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Off,
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Severity {
    /// All variants, most suppressive first.
    pub fn all() -> &'static [Severity] {
        &[
            Severity::Off,
            Severity::Fatal,
            Severity::Error,
            Severity::Warn,
            Severity::Info,
            Severity::Debug,
            Severity::Trace,
        ]
    }

    /// Lower-case name as accepted on input.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Off => "off",
            Severity::Fatal => "fatal",
            Severity::Error => "error",
            Severity::Warn => "warn",
            Severity::Info => "info",
            Severity::Debug => "debug",
            Severity::Trace => "trace",
        }
    }

    /// Upper-case name used in generated filter names and rendered records.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Off => "OFF",
            Severity::Fatal => "FATAL",
            Severity::Error => "ERROR",
            Severity::Warn => "WARN",
            Severity::Info => "INFO",
            Severity::Debug => "DEBUG",
            Severity::Trace => "TRACE",
        }
    }

    /// Parse a level name case-insensitively.
    ///
    /// `source` describes where the value came from and is carried into the
    /// error so the user can find it.
    pub fn parse(value: &str, source: impl Into<String>) -> Result<Self, LevelError> {
        let lower = value.trim().to_ascii_lowercase();
        Severity::all()
            .iter()
            .copied()
            .find(|s| s.as_str() == lower)
            .ok_or_else(|| LevelError::Invalid {
                source: source.into(),
                value: value.to_string(),
            })
    }

    /// The less suppressive of two thresholds. `Off` never wins against a
    /// real level.
    pub fn most_verbose(self, other: Severity) -> Severity {
        self.max(other)
    }

    /// True when an event at `event` passes a threshold of `self`.
    pub fn admits(self, event: Severity) -> bool {
        event != Severity::Off && event <= self
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Categories
// =============================================================================

/// Root category name.
pub const ROOT_CATEGORY: &str = "";

/// Normalise module-path separators (`::`) to the dot-delimited form.
pub fn normalize_category(name: &str) -> String {
    name.replace("::", ".")
}

/// The category itself followed by each ancestor, ending with the root.
///
/// `"a.b.c"` yields `"a.b.c"`, `"a.b"`, `"a"`, `""`. The root yields only
/// itself.
pub fn category_chain(category: &str) -> Vec<&str> {
    let mut chain = vec![category];
    let mut current = category;
    while !current.is_empty() {
        current = match current.rfind('.') {
            Some(idx) => &current[..idx],
            None => ROOT_CATEGORY,
        };
        chain.push(current);
    }
    chain
}

/// True when `category` lies in the subtree rooted at `scope`.
pub fn is_within(category: &str, scope: &str) -> bool {
    scope.is_empty()
        || category == scope
        || (category.len() > scope.len()
            && category.starts_with(scope)
            && category.as_bytes()[scope.len()] == b'.')
}

// =============================================================================
// Styles
// =============================================================================

/// Named message formats. Each maps to a fixed pattern string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Message only.
    Plain,
    /// Elapsed milliseconds prefix.
    ScriptShort,
    /// Timestamp prefix.
    ScriptLong,
    /// Pid and timestamp prefix.
    Daemon,
    /// Pid prefix; syslog adds its own timestamp.
    Syslog,
}

impl Style {
    /// All styles in table order.
    pub fn all() -> &'static [Style] {
        &[
            Style::Plain,
            Style::ScriptShort,
            Style::ScriptLong,
            Style::Daemon,
            Style::Syslog,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Style::Plain => "plain",
            Style::ScriptShort => "script_short",
            Style::ScriptLong => "script_long",
            Style::Daemon => "daemon",
            Style::Syslog => "syslog",
        }
    }

    pub fn pattern(&self) -> &'static str {
        match self {
            Style::Plain => "%m%n",
            Style::ScriptShort => "[%r] %m%n",
            Style::ScriptLong => "[%d] %m%n",
            Style::Daemon => "[pid %P] [%d] %m%n",
            Style::Syslog => "[pid %P] %m%n",
        }
    }

    pub fn from_name(name: &str) -> Option<Style> {
        Style::all().iter().copied().find(|s| s.name() == name)
    }

    pub fn names() -> Vec<&'static str> {
        Style::all().iter().map(Style::name).collect()
    }
}

// =============================================================================
// Loosely-typed caller arguments
// =============================================================================

/// A caller-supplied option value before it is validated into a typed
/// record.
///
/// Deserialises directly from TOML or JSON values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<ArgValue>),
    Map(BTreeMap<String, ArgValue>),
}

impl ArgValue {
    /// Short description of the value's shape for error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            ArgValue::Bool(_) => "a boolean",
            ArgValue::Int(_) => "an integer",
            ArgValue::Str(_) => "a string",
            ArgValue::List(_) => "a list",
            ArgValue::Map(_) => "a record",
        }
    }

    /// Truthiness of a scalar value; lists and records are truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            ArgValue::Bool(b) => *b,
            ArgValue::Int(i) => *i != 0,
            ArgValue::Str(s) => is_truthy_str(s),
            ArgValue::List(_) | ArgValue::Map(_) => true,
        }
    }

    /// The value as a string, if it is a scalar.
    pub fn as_scalar(&self) -> Option<String> {
        match self {
            ArgValue::Str(s) => Some(s.clone()),
            ArgValue::Int(i) => Some(i.to_string()),
            ArgValue::Bool(b) => Some(b.to_string()),
            ArgValue::List(_) | ArgValue::Map(_) => None,
        }
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        ArgValue::Str(s.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        ArgValue::Str(s)
    }
}

impl From<bool> for ArgValue {
    fn from(b: bool) -> Self {
        ArgValue::Bool(b)
    }
}

impl From<i64> for ArgValue {
    fn from(i: i64) -> Self {
        ArgValue::Int(i)
    }
}

impl<T: Into<ArgValue>> From<Vec<T>> for ArgValue {
    fn from(items: Vec<T>) -> Self {
        ArgValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<ArgValue>> FromIterator<(K, V)> for ArgValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        ArgValue::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Truthiness of a raw string: false when empty or one of the falsy words.
pub fn is_truthy_str(value: &str) -> bool {
    let lower = value.trim().to_ascii_lowercase();
    !lower.is_empty() && !crate::util::constants::FALSY_STRINGS.contains(&lower.as_str())
}

// =============================================================================
// Outputs
// =============================================================================

/// The four output families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    Screen,
    File,
    Dir,
    Syslog,
}

impl OutputType {
    /// Build order; also the order outputs are attached to categories.
    pub fn all() -> &'static [OutputType] {
        &[
            OutputType::Screen,
            OutputType::File,
            OutputType::Dir,
            OutputType::Syslog,
        ]
    }

    /// Lower-case label. Also the resolver scope prefix and option key.
    pub fn label(&self) -> &'static str {
        match self {
            OutputType::Screen => "screen",
            OutputType::File => "file",
            OutputType::Dir => "dir",
            OutputType::Syslog => "syslog",
        }
    }

    /// Prefix of generated output names (`FILE0`, `FILE1`, ...).
    pub fn name_prefix(&self) -> &'static str {
        match self {
            OutputType::Screen => "SCREEN",
            OutputType::File => "FILE",
            OutputType::Dir => "DIR",
            OutputType::Syslog => "SYSLOG",
        }
    }

    /// Style used when the caller names neither a pattern nor a style.
    pub fn default_style(&self) -> Style {
        match self {
            OutputType::Screen => Style::ScriptShort,
            OutputType::File => Style::Daemon,
            OutputType::Dir => Style::Plain,
            OutputType::Syslog => Style::Syslog,
        }
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind-specific settings of one output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OutputKind {
    Screen {
        color: bool,
        stderr: bool,
    },
    File {
        path: PathBuf,
        /// Rotate after this many bytes; 0 never rotates.
        max_size: u64,
        /// Rotate after this many seconds; 0 never rotates.
        max_age: u64,
        /// Rotated files kept.
        histories: u64,
    },
    Dir {
        path: PathBuf,
        /// Total bytes kept; 0 is unbounded.
        max_size: u64,
        /// Oldest record age kept, in seconds; 0 is unbounded.
        max_age: u64,
        /// Record files kept.
        histories: u64,
    },
    Syslog {
        ident: String,
        facility: String,
    },
}

impl OutputKind {
    pub fn output_type(&self) -> OutputType {
        match self {
            OutputKind::Screen { .. } => OutputType::Screen,
            OutputKind::File { .. } => OutputType::File,
            OutputKind::Dir { .. } => OutputType::Dir,
            OutputKind::Syslog { .. } => OutputType::Syslog,
        }
    }
}

/// One fully-resolved logging destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputSpec {
    /// Unique within a build: kind prefix plus zero-based ordinal.
    pub name: String,

    #[serde(flatten)]
    pub kind: OutputKind,

    /// Threshold for the output's default category scope.
    pub level: Severity,

    /// Default category scope; root unless set. May be an alias.
    pub category: String,

    /// Per-category overrides; keys may still be aliases.
    pub category_level: BTreeMap<String, Severity>,

    /// Resolved message pattern.
    pub pattern: String,
}
