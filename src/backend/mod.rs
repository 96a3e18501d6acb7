// loganyapp - backend/mod.rs
//
// Logging backend shim. Loads a `BackendConfig` into a `tracing-subscriber`
// registry with one filtered fmt layer per appender, and installs it as the
// process-wide default.
//
// Dependencies: core (config types), tracing-subscriber, console, chrono,
// libc (unix syslog).

pub mod pattern;
pub mod router;
pub mod writers;

use crate::core::emit::{AppenderConfig, BackendConfig};
use crate::core::model::OutputKind;
use crate::util::error::{BackendError, Result};
use pattern::{severity_of, PatternFormatter};
use router::Router;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer, Registry};

/// One appender's layer, type-erased so every kind fits in one list.
pub type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// The subscriber an activated configuration runs on.
pub type ConfiguredSubscriber = Layered<Vec<BoxedLayer>, Registry>;

/// Something that can put a backend configuration into effect.
pub trait Backend {
    fn activate(&self, config: &BackendConfig) -> Result<()>;
}

/// Installs the configuration as the global `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingBackend;

impl Backend for TracingBackend {
    fn activate(&self, config: &BackendConfig) -> Result<()> {
        activate(config)
    }
}

/// Build the subscriber for `config` without installing it.
///
/// Opens every destination, so a failure here leaves nothing half-active.
pub fn subscriber(config: &BackendConfig) -> Result<ConfiguredSubscriber> {
    config.validate()?;
    let router = Arc::new(Router::new(config));
    let started = Instant::now();

    let layers = config
        .appenders
        .iter()
        .map(|(name, appender)| build_layer(name, appender, &router, started))
        .collect::<Result<Vec<_>>>()?;

    Ok(tracing_subscriber::registry().with(layers))
}

/// Build and install the subscriber for `config` as the global default.
pub fn activate(config: &BackendConfig) -> Result<()> {
    subscriber(config)?
        .try_init()
        .map_err(|e| BackendError::Install {
            reason: e.to_string(),
        })?;
    tracing::debug!(
        appenders = config.appenders.len(),
        categories = config.categories.len(),
        "Logging backend activated"
    );
    Ok(())
}

fn build_layer(
    name: &str,
    appender: &AppenderConfig,
    router: &Arc<Router>,
    started: Instant,
) -> Result<BoxedLayer> {
    let writer = writers::make_writer(name, &appender.kind)?;
    let color = matches!(appender.kind, OutputKind::Screen { color: true, .. });
    let formatter = PatternFormatter::new(&appender.pattern, started, color);

    let router = Arc::clone(router);
    let owner = name.to_string();
    let filter = filter_fn(move |meta| {
        meta.is_event() && router.allows(&owner, meta.target(), severity_of(meta.level()))
    });

    Ok(fmt::layer()
        .with_ansi(false)
        .with_writer(writer)
        .event_format(formatter)
        .with_filter(filter)
        .boxed())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_config(dir: &std::path::Path) -> BackendConfig {
        let text = format!(
            r#"
            [appenders.FILE0]
            kind = "file"
            level = "debug"
            pattern = "%p %c %m%n"
            path = "{}"
            max_size = 0
            max_age = 0
            histories = 0

            [filters.FILE0_INFO]
            appender = "FILE0"
            accept = "range"
            min = "info"

            [categories.""]
            level = "info"
            appenders = [{{ appender = "FILE0" }}]

            [categories."my_app.db"]
            level = "trace"
            appenders = [{{ appender = "FILE0", filter = "FILE0_INFO" }}]
            "#,
            dir.join("app.log").display()
        );
        BackendConfig::from_text(&text).unwrap()
    }

    #[test]
    fn test_subscriber_routes_by_category() {
        let tmp = tempfile::tempdir().unwrap();
        let config = file_config(tmp.path());
        let sub = subscriber(&config).unwrap();
        tracing::subscriber::with_default(sub, || {
            tracing::info!(target: "my_app", "kept");
            tracing::debug!(target: "my_app", "gated");
            tracing::info!(target: "my_app::db::pool", "db info");
            tracing::debug!(target: "my_app::db::pool", "db debug");
        });
        let text = std::fs::read_to_string(tmp.path().join("app.log")).unwrap();
        assert_eq!(text, "INFO my_app kept\nINFO my_app.db.pool db info\n");
    }

    #[test]
    fn test_structured_fields_follow_message() {
        let tmp = tempfile::tempdir().unwrap();
        let sub = subscriber(&file_config(tmp.path())).unwrap();
        tracing::subscriber::with_default(sub, || {
            tracing::warn!(target: "my_app", user = "alice", "login failed");
        });
        let text = std::fs::read_to_string(tmp.path().join("app.log")).unwrap();
        assert!(text.starts_with("WARN my_app login failed"), "{text}");
        assert!(text.contains("user=\"alice\""), "{text}");
    }

    #[test]
    fn test_unopenable_destination_fails_before_install() {
        let tmp = tempfile::tempdir().unwrap();
        let config = file_config(&tmp.path().join("missing"));
        assert!(matches!(
            subscriber(&config),
            Err(crate::util::error::LogAnyAppError::Backend(
                BackendError::Open { .. }
            ))
        ));
    }
}
