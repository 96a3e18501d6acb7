// loganyapp - core/daemon.rs
//
// Daemon detection decides whether syslog output is on by default. It sits
// behind a trait so callers can plug in whatever "is this a long-running
// service?" check suits their host.

use crate::core::context::ResolutionContext;
use crate::util::constants;

/// Decides whether the host process is a daemon-like service.
pub trait DaemonDetector {
    fn is_daemon(&self, ctx: &ResolutionContext) -> bool;
}

/// Reports a daemon when any loaded component appears in a marker table.
#[derive(Debug, Clone)]
pub struct MarkerTableDetector {
    markers: &'static [&'static str],
}

impl MarkerTableDetector {
    pub fn new(markers: &'static [&'static str]) -> Self {
        Self { markers }
    }
}

impl Default for MarkerTableDetector {
    fn default() -> Self {
        Self::new(constants::DAEMON_MARKERS)
    }
}

impl DaemonDetector for MarkerTableDetector {
    fn is_daemon(&self, ctx: &ResolutionContext) -> bool {
        let hit = self
            .markers
            .iter()
            .find(|m| ctx.loaded_modules().contains(**m));
        if let Some(marker) = hit {
            tracing::debug!(marker, "Daemon marker found");
        }
        hit.is_some()
    }
}

/// A detector with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct FixedDetector(pub bool);

impl DaemonDetector for FixedDetector {
    fn is_daemon(&self, _ctx: &ResolutionContext) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_modules_is_not_daemon() {
        let ctx = ResolutionContext::new();
        assert!(!MarkerTableDetector::default().is_daemon(&ctx));
    }

    #[test]
    fn test_marker_present_is_daemon() {
        let ctx = ResolutionContext::new().with_loaded_modules(["serde", "daemonize"]);
        assert!(MarkerTableDetector::default().is_daemon(&ctx));
    }

    #[test]
    fn test_custom_table() {
        let ctx = ResolutionContext::new().with_loaded_modules(["my-supervisor"]);
        assert!(!MarkerTableDetector::default().is_daemon(&ctx));
        assert!(MarkerTableDetector::new(&["my-supervisor"]).is_daemon(&ctx));
    }

    #[test]
    fn test_fixed_detector() {
        let ctx = ResolutionContext::new();
        assert!(FixedDetector(true).is_daemon(&ctx));
        assert!(!FixedDetector(false).is_daemon(&ctx));
    }
}
