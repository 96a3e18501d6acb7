// loganyapp - platform/process.rs
//
// Snapshot of the running process: argument vector, environment, effective
// uid, home directory, terminal colour support, and daemon hints. This is
// the only place that reads ambient process state; everything downstream
// works on the captured `ResolutionContext`.

use crate::core::context::ResolutionContext;
use crate::util::constants;
use directories::BaseDirs;
use std::path::PathBuf;

impl ResolutionContext {
    /// Capture the current process.
    pub fn from_process() -> Self {
        capture()
    }
}

/// Capture the current process into a `ResolutionContext`.
///
/// The process-global namespace and the option registry start empty; an
/// embedding application adds them with `with_globals` and `with_options`.
pub fn capture() -> ResolutionContext {
    let mut argv = std::env::args_os().map(|a| a.to_string_lossy().into_owned());
    let program = argv.next();
    let args: Vec<String> = argv.collect();

    // Non-UTF-8 variables cannot name a level; skip them.
    let env: Vec<(String, String)> = std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect();

    let modules = daemon_hints(&env);
    let root = is_root();
    let colors = console::colors_enabled_stderr();

    let mut ctx = ResolutionContext::new()
        .with_args(args)
        .with_env(env)
        .with_root(root)
        .with_terminal_colors(colors)
        .with_loaded_modules(modules);
    if let Some(program) = program {
        ctx = ctx.with_program(program);
    }
    if let Some(home) = home_dir() {
        ctx = ctx.with_home(home);
    }

    tracing::debug!(
        program = ctx.program().unwrap_or(""),
        args = ctx.args().len(),
        root,
        colors,
        "Process context captured"
    );
    ctx
}

/// The user's home directory, if the platform reports one.
pub fn home_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

#[cfg(unix)]
fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn is_root() -> bool {
    false
}

/// Markers for the daemon detector derived from the process environment.
fn daemon_hints(env: &[(String, String)]) -> Vec<String> {
    let mut hints = Vec::new();
    if env
        .iter()
        .any(|(k, _)| constants::SERVICE_MANAGER_ENV.contains(&k.as_str()))
    {
        hints.push(constants::SERVICE_MANAGER_MARKER.to_string());
    }
    if is_detached() {
        hints.push(constants::DETACHED_MARKER.to_string());
    }
    hints
}

/// A process reparented to init has detached from its session.
#[cfg(unix)]
fn is_detached() -> bool {
    // SAFETY: getppid has no preconditions and cannot fail.
    unsafe { libc::getppid() == 1 }
}

#[cfg(not(unix))]
fn is_detached() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_manager_env_is_a_hint() {
        let env = vec![("NOTIFY_SOCKET".to_string(), "/run/systemd/notify".to_string())];
        assert!(daemon_hints(&env).contains(&"systemd".to_string()));
    }

    #[test]
    fn test_plain_env_has_no_service_hint() {
        let env = vec![("HOME".to_string(), "/home/u".to_string())];
        assert!(!daemon_hints(&env).contains(&"systemd".to_string()));
    }

    #[test]
    fn test_detached_hint_does_not_mark_a_daemon() {
        use crate::core::daemon::{DaemonDetector, MarkerTableDetector};
        let ctx = ResolutionContext::new().with_loaded_modules([constants::DETACHED_MARKER]);
        assert!(!MarkerTableDetector::default().is_daemon(&ctx));
    }

    #[test]
    fn test_capture_reads_program_path() {
        let ctx = ResolutionContext::from_process();
        assert!(ctx.program().is_some());
        assert!(ctx.program_name().is_some());
    }
}
