// loganyapp - util/logging.rs
//
// Diagnostics logging for the binary when it does not activate a resolved
// configuration (`--no-init`). The library never calls this; it only emits
// `tracing` events and leaves subscriber choice to the caller.
//
// Activation:
//   - Environment variable: RUST_LOG=debug (or trace)
//   - CLI flag: --verbose (debug)
//
// Output: stderr.

use tracing_subscriber::EnvFilter;

/// Install a compact stderr subscriber for the binary's own diagnostics.
///
/// Priority: RUST_LOG env var > `verbose` flag > default level.
/// Does nothing if a global subscriber is already set.
pub fn init(verbose: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(super::constants::DIAGNOSTIC_LOG_LEVEL)
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(
            app = super::constants::APP_NAME,
            version = super::constants::APP_VERSION,
            "Diagnostics logging initialised"
        );
    }
}
