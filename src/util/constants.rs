// loganyapp - util/constants.rs
//
// Single source of truth for all named constants, defaults, and lookup tables
// used while resolving a logging configuration.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "loganyapp";

/// Application identifier used for config directories.
pub const APP_ID: &str = "loganyapp";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Program name used when none can be derived from argv[0] or the `name`
/// option.
pub const FALLBACK_PROGRAM_NAME: &str = "main";

/// Filter used by the binary's own diagnostics when RUST_LOG is unset.
pub const DIAGNOSTIC_LOG_LEVEL: &str = "info";

// =============================================================================
// Level resolution
// =============================================================================

/// Global level applied when no source supplies one.
pub const DEFAULT_LEVEL: &str = "warn";

/// Explicit-level option names, probed in this order within a tier.
pub const LEVEL_KEYS: &[&str] = &["log_level", "loglevel"];

/// Shortcut labels, probed in this order within a tier after the
/// explicit-level keys.
pub const SHORTCUT_LABELS: &[&str] = &["trace", "debug", "verbose", "quiet"];

/// String values (case-insensitive) that count as false for shortcut labels
/// and boolean-ish options. The empty string is also false.
pub const FALSY_STRINGS: &[&str] = &["0", "false", "no", "off"];

/// String values (case-insensitive) that enable an output with defaults.
pub const TRUTHY_ENABLE_STRINGS: &[&str] = &["1", "yes", "true"];

/// Argument vector terminator; scanning stops here.
pub const ARGV_TERMINATOR: &str = "--";

// =============================================================================
// Environment
// =============================================================================

/// Environment variable forcing screen colour on or off.
pub const ENV_COLOR: &str = "COLOR";

/// Environment variable enabling the configuration dump.
pub const ENV_DUMP: &str = "LOGANYAPP_DEBUG";

// =============================================================================
// Output defaults
// =============================================================================

/// Extension appended to synthesized log file names.
pub const LOG_FILE_EXTENSION: &str = "log";

/// System-wide log directory used when running as root.
pub const SYSTEM_LOG_DIR: &str = "/var/log";

/// Subdirectory of the home directory holding per-record directory sinks.
pub const USER_LOG_SUBDIR: &str = "log";

/// Default number of record files kept by a directory output.
pub const DEFAULT_DIR_HISTORIES: u64 = 1_000;

/// Default syslog facility.
pub const DEFAULT_SYSLOG_FACILITY: &str = "daemon";

/// Facility names accepted for syslog outputs.
pub const SYSLOG_FACILITIES: &[&str] = &[
    "kern", "user", "mail", "daemon", "auth", "syslog", "lpr", "news", "uucp", "cron", "local0",
    "local1", "local2", "local3", "local4", "local5", "local6", "local7",
];

// =============================================================================
// Daemon detection
// =============================================================================

/// Loaded-component names whose presence marks the host as a long-running
/// daemon.
pub const DAEMON_MARKERS: &[&str] = &[
    "daemonize",
    "daemonize-me",
    "fork",
    "libsystemd",
    "sd-notify",
    "systemd",
    "service-manager",
    "windows-service",
    "shuttle-runtime",
];

/// Environment variables set by systemd for the services it starts.
pub const SERVICE_MANAGER_ENV: &[&str] = &["NOTIFY_SOCKET", "INVOCATION_ID"];

/// Marker recorded in the loaded-component set when a service manager
/// started the process.
pub const SERVICE_MANAGER_MARKER: &str = "systemd";

/// Marker recorded when the process has been reparented to init. Container
/// init processes and orphaned `nohup` jobs look the same, so it is not in
/// `DAEMON_MARKERS`; a custom detector may opt in.
pub const DETACHED_MARKER: &str = "orphaned";

// =============================================================================
// Backend
// =============================================================================

/// Timestamp format used by the `%d` pattern escape.
pub const PATTERN_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp format used in directory-sink record file names.
#[cfg(unix)]
pub const DIR_RECORD_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H:%M:%S";

/// Timestamp format used in directory-sink record file names. Colons are
/// not allowed in Windows file names.
#[cfg(not(unix))]
pub const DIR_RECORD_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
