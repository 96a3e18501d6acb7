// loganyapp - core/resolver.rs
//
// Severity Resolver: finds the effective level for a scope (global, or an
// output kind such as "file") by checking sources in strict priority order:
//
//   1. external option registry   file_log_level, file_debug, ...
//   2. argument vector             --file-log-level=debug, --file-debug
//   3. environment                 FILE_LOG_LEVEL, FILE_DEBUG
//   4. process-global variables    File_Log_Level, FILE_DEBUG, file_debug
//
// Within a tier, the explicit level names are checked before the shortcut
// labels. The first hit wins; no hit returns `None` and the caller applies
// its own default.

use crate::core::context::ResolutionContext;
use crate::core::model::{is_truthy_str, Severity};
use crate::util::constants;
use crate::util::error::{OptionError, Result};

/// A resolved level and a description of where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub level: Severity,
    pub source: String,
}

/// Resolve the level for `scope` (empty for global).
pub fn resolve(ctx: &ResolutionContext, scope: &str) -> Result<Option<Resolved>> {
    let found = match from_registry(ctx, scope)? {
        Some(r) => Some(r),
        None => match from_argv(ctx, scope)? {
            Some(r) => Some(r),
            None => match from_env(ctx, scope)? {
                Some(r) => Some(r),
                None => from_globals(ctx, scope)?,
            },
        },
    };

    if let Some(ref r) = found {
        tracing::debug!(
            scope = if scope.is_empty() { "global" } else { scope },
            level = %r.level,
            source = %r.source,
            "Level resolved"
        );
    }
    Ok(found)
}

/// `log_level` for the global scope, `file_log_level` for "file".
fn snake_key(scope: &str, key: &str) -> String {
    if scope.is_empty() {
        key.to_string()
    } else {
        format!("{scope}_{key}")
    }
}

fn shortcut(label: &str) -> Severity {
    match label {
        "trace" => Severity::Trace,
        "debug" => Severity::Debug,
        "verbose" => Severity::Info,
        _ => Severity::Error,
    }
}

fn from_registry(ctx: &ResolutionContext, scope: &str) -> Result<Option<Resolved>> {
    if !ctx.has_options() {
        return Ok(None);
    }
    for key in constants::LEVEL_KEYS {
        let key = snake_key(scope, key);
        if let Some(value) = ctx.option(&key) {
            let source = format!("option '{key}'");
            let level = Severity::parse(value, source.clone())?;
            return Ok(Some(Resolved { level, source }));
        }
    }
    for label in constants::SHORTCUT_LABELS {
        let key = snake_key(scope, label);
        if ctx.option(&key).is_some_and(is_truthy_str) {
            return Ok(Some(Resolved {
                level: shortcut(label),
                source: format!("option '{key}'"),
            }));
        }
    }
    Ok(None)
}

/// Scan the argument vector without consuming anything.
///
/// `--log-level=V` and `--log-level V` are both accepted; when repeated the
/// last occurrence wins, matching how a downstream parser reads the same
/// vector. Scanning stops at a bare `--`.
fn from_argv(ctx: &ResolutionContext, scope: &str) -> Result<Option<Resolved>> {
    let args = argv_before_terminator(ctx.args());
    let level_flag = kebab_flag(scope, "log-level");
    let with_eq = format!("{level_flag}=");

    let mut explicit: Option<&str> = None;
    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        if arg == level_flag {
            match args.get(i + 1) {
                Some(value) => {
                    explicit = Some(value.as_str());
                    i += 1;
                }
                None => {
                    return Err(OptionError::MissingValue { key: level_flag }.into());
                }
            }
        } else if let Some(value) = arg.strip_prefix(&with_eq) {
            explicit = Some(value);
        }
        i += 1;
    }
    if let Some(value) = explicit {
        let source = format!("flag {level_flag}");
        let level = Severity::parse(value, source.clone())?;
        return Ok(Some(Resolved { level, source }));
    }

    for label in constants::SHORTCUT_LABELS {
        let flag = kebab_flag(scope, label);
        let with_eq = format!("{flag}=");
        let set = args.iter().any(|arg| {
            arg == &flag || arg.strip_prefix(&with_eq).is_some_and(is_truthy_str)
        });
        if set {
            return Ok(Some(Resolved {
                level: shortcut(label),
                source: format!("flag {flag}"),
            }));
        }
    }
    Ok(None)
}

fn argv_before_terminator(args: &[String]) -> &[String] {
    match args.iter().position(|a| a == constants::ARGV_TERMINATOR) {
        Some(idx) => &args[..idx],
        None => args,
    }
}

/// `--log-level` for the global scope, `--file-log-level` for "file".
fn kebab_flag(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        format!("--{name}")
    } else {
        format!("--{scope}-{name}")
    }
}

fn from_env(ctx: &ResolutionContext, scope: &str) -> Result<Option<Resolved>> {
    for key in constants::LEVEL_KEYS {
        let var = snake_key(scope, key).to_ascii_uppercase();
        if let Some(value) = ctx.env(&var) {
            let source = format!("environment variable {var}");
            let level = Severity::parse(value, source.clone())?;
            return Ok(Some(Resolved { level, source }));
        }
    }
    for label in constants::SHORTCUT_LABELS {
        let var = snake_key(scope, label).to_ascii_uppercase();
        if ctx.env(&var).is_some_and(is_truthy_str) {
            return Ok(Some(Resolved {
                level: shortcut(label),
                source: format!("environment variable {var}"),
            }));
        }
    }
    Ok(None)
}

fn from_globals(ctx: &ResolutionContext, scope: &str) -> Result<Option<Resolved>> {
    for key in constants::LEVEL_KEYS {
        let name = snake_key(scope, key);
        if let Some(value) = ctx.global(&name) {
            let source = format!("global variable {name}");
            let level = Severity::parse(value, source.clone())?;
            return Ok(Some(Resolved { level, source }));
        }
    }
    for label in constants::SHORTCUT_LABELS {
        let name = snake_key(scope, label);
        if ctx.global(&name).is_some_and(is_truthy_str) {
            return Ok(Some(Resolved {
                level: shortcut(label),
                source: format!("global variable {name}"),
            }));
        }
    }
    Ok(None)
}
