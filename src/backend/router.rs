// loganyapp - backend/router.rs
//
// Category routing for activated appenders. An event reaches an appender
// when, at the nearest materialised category of its target:
//
//   1. the category threshold admits the event,
//   2. the appender is attached there, and
//   3. the attachment's filter, if any, accepts it.
//
// Tracing has no FATAL level, so ERROR events are gated as FATAL: an output
// set to `fatal` receives the most severe events tracing can produce
// instead of nothing.

use crate::core::emit::BackendConfig;
use crate::core::matrix::FilterKind;
use crate::core::model::{category_chain, normalize_category, Severity};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct Route {
    level: Severity,
    /// Attached appender to its filter, if any.
    appenders: BTreeMap<String, Option<FilterKind>>,
}

/// Routing table compiled from a backend configuration.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: BTreeMap<String, Route>,
}

impl Router {
    /// Build from a validated configuration. Dangling filter names are
    /// treated as reject-all.
    pub fn new(config: &BackendConfig) -> Self {
        let routes = config
            .categories
            .iter()
            .map(|(category, entry)| {
                let appenders = entry
                    .appenders
                    .iter()
                    .map(|r| {
                        let filter = r.filter.as_ref().map(|name| {
                            config
                                .filters
                                .get(name)
                                .map(|f| f.kind)
                                .unwrap_or(FilterKind::RejectAll)
                        });
                        (r.appender.clone(), filter)
                    })
                    .collect();
                (
                    category.clone(),
                    Route {
                        level: entry.level,
                        appenders,
                    },
                )
            })
            .collect();
        Self { routes }
    }

    /// Whether an event from `target` at `event` reaches `appender`.
    pub fn allows(&self, appender: &str, target: &str, event: Severity) -> bool {
        let event = match event {
            Severity::Error => Severity::Fatal,
            other => other,
        };
        let category = normalize_category(target);
        let Some(route) = category_chain(&category)
            .into_iter()
            .find_map(|c| self.routes.get(c))
        else {
            return false;
        };
        if !route.level.admits(event) {
            return false;
        }
        match route.appenders.get(appender) {
            None => false,
            Some(None) => true,
            Some(Some(filter)) => filter.accepts(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> Router {
        let text = r#"
            [appenders.SCREEN0]
            kind = "screen"
            level = "warn"
            pattern = "%m%n"
            color = false
            stderr = true

            [appenders.FILE0]
            kind = "file"
            level = "debug"
            pattern = "%m%n"
            path = "/tmp/app.log"
            max_size = 0
            max_age = 0
            histories = 0

            [filters.SCREEN0_WARN]
            appender = "SCREEN0"
            accept = "range"
            min = "warn"

            [filters.FILE0_OFF]
            appender = "FILE0"
            accept = "reject_all"

            [categories.""]
            level = "debug"
            appenders = [{ appender = "SCREEN0", filter = "SCREEN0_WARN" }, { appender = "FILE0" }]

            [categories."Noisy"]
            level = "warn"
            appenders = [{ appender = "SCREEN0" }, { appender = "FILE0", filter = "FILE0_OFF" }]
        "#;
        Router::new(&BackendConfig::from_text(text).unwrap())
    }

    #[test]
    fn test_root_gate_and_filter() {
        let r = router();
        assert!(r.allows("FILE0", "my_app", Severity::Debug));
        assert!(!r.allows("FILE0", "my_app", Severity::Trace));
        assert!(!r.allows("SCREEN0", "my_app", Severity::Info));
        assert!(r.allows("SCREEN0", "my_app", Severity::Warn));
    }

    #[test]
    fn test_nearest_category_and_module_path_targets() {
        let r = router();
        assert!(r.allows("SCREEN0", "Noisy::Child", Severity::Warn));
        assert!(!r.allows("SCREEN0", "Noisy::Child", Severity::Info));
        assert!(!r.allows("FILE0", "Noisy.Child", Severity::Error));
        // Prefix without a separator is not a descendant.
        assert!(r.allows("FILE0", "NoisyNeighbour", Severity::Debug));
    }

    #[test]
    fn test_fatal_output_receives_errors() {
        let text = r#"
            [appenders.FILE0]
            kind = "file"
            level = "fatal"
            pattern = "%m%n"
            path = "/tmp/app.log"
            max_size = 0
            max_age = 0
            histories = 0

            [appenders.SCREEN0]
            kind = "screen"
            level = "debug"
            pattern = "%m%n"
            color = false
            stderr = true

            [filters.FILE0_FATAL]
            appender = "FILE0"
            accept = "range"
            min = "fatal"

            [categories.""]
            level = "debug"
            appenders = [{ appender = "FILE0", filter = "FILE0_FATAL" }, { appender = "SCREEN0" }]

            [categories."quiet"]
            level = "fatal"
            appenders = [{ appender = "SCREEN0" }]
        "#;
        let r = Router::new(&BackendConfig::from_text(text).unwrap());
        assert!(r.allows("FILE0", "my_app", Severity::Error));
        assert!(!r.allows("FILE0", "my_app", Severity::Warn));
        assert!(r.allows("SCREEN0", "my_app", Severity::Error));
        assert!(r.allows("SCREEN0", "quiet", Severity::Error));
        assert!(!r.allows("SCREEN0", "quiet", Severity::Warn));
    }

    #[test]
    fn test_unattached_appender() {
        assert!(!router().allows("DIR0", "my_app", Severity::Error));
    }
}
