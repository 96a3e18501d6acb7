// loganyapp - tests/e2e_setup.rs
//
// End-to-end tests for configuration resolution and activation.
//
// These tests run the whole pipeline: build arguments and a context go in,
// a resolved setup and backend configuration come out, directories are
// created on a real filesystem, and records written through the activated
// subscriber are read back from disk.

use loganyapp::app::setup::{self, build, InitOutcome, Initializer};
use loganyapp::backend::{self, Backend};
use loganyapp::core::args::BuildArgs;
use loganyapp::core::context::ResolutionContext;
use loganyapp::core::daemon::{FixedDetector, MarkerTableDetector};
use loganyapp::core::emit::BackendConfig;
use loganyapp::core::matrix::FilterKind;
use loganyapp::core::model::{ArgValue, OutputKind, OutputSpec, Severity, Style};
use loganyapp::util::error::Result;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

// =============================================================================
// Helpers
// =============================================================================

/// A script named `app`, not root, with a home directory.
fn app_ctx() -> ResolutionContext {
    ResolutionContext::new()
        .with_program("/usr/local/bin/app")
        .with_home("/home/u")
        .with_terminal_colors(true)
}

fn output<'a>(outputs: &'a [OutputSpec], name: &str) -> &'a OutputSpec {
    outputs
        .iter()
        .find(|o| o.name == name)
        .unwrap_or_else(|| panic!("no output {name} in {outputs:?}"))
}

fn names(outputs: &[OutputSpec]) -> Vec<&str> {
    outputs.iter().map(|o| o.name.as_str()).collect()
}

fn path_arg(path: &Path) -> ArgValue {
    ArgValue::from(path.to_str().unwrap())
}

/// Stores the configuration it is asked to activate and checks that the
/// output directories already exist at that point.
#[derive(Default)]
struct RecordingBackend {
    seen: Mutex<Option<BackendConfig>>,
}

impl Backend for RecordingBackend {
    fn activate(&self, config: &BackendConfig) -> Result<()> {
        for appender in config.appenders.values() {
            match &appender.kind {
                OutputKind::File { path, .. } => {
                    assert!(path.parent().unwrap().is_dir(), "{path:?} has no parent dir")
                }
                OutputKind::Dir { path, .. } => assert!(path.is_dir(), "{path:?} missing"),
                _ => {}
            }
        }
        *self.seen.lock().unwrap() = Some(config.clone());
        Ok(())
    }
}

// =============================================================================
// Resolution scenarios
// =============================================================================

/// Defaults for a non-root script: one screen output, one file output.
#[test]
fn e2e_defaults_give_screen_and_file() {
    let built = build(&BuildArgs::default(), &app_ctx(), &FixedDetector(false)).unwrap();
    let outputs = &built.setup.outputs;
    assert_eq!(names(outputs), vec!["SCREEN0", "FILE0"]);

    let screen = output(outputs, "SCREEN0");
    assert_eq!(
        screen.kind,
        OutputKind::Screen {
            color: true,
            stderr: true
        }
    );
    assert_eq!(screen.level, Severity::Warn);
    assert_eq!(screen.pattern, Style::ScriptShort.pattern());

    let file = output(outputs, "FILE0");
    assert!(matches!(
        &file.kind,
        OutputKind::File { path, .. } if path == &PathBuf::from("/home/u/app.log")
    ));
    assert_eq!(file.level, Severity::Warn);
    assert_eq!(file.pattern, Style::Daemon.pattern());
}

/// A one-liner gets no default file output.
#[test]
fn e2e_one_liner_has_no_file() {
    let ctx = app_ctx().with_one_liner(true);
    let built = build(&BuildArgs::default(), &ctx, &FixedDetector(false)).unwrap();
    assert_eq!(names(&built.setup.outputs), vec!["SCREEN0"]);
}

/// `FILE_DEBUG=1` raises only the file output.
#[test]
fn e2e_kind_env_shortcut_raises_one_output() {
    let ctx = app_ctx().with_env([("FILE_DEBUG", "1")]);
    let built = build(&BuildArgs::default(), &ctx, &FixedDetector(false)).unwrap();
    assert_eq!(built.setup.level, Severity::Warn);
    assert_eq!(output(&built.setup.outputs, "FILE0").level, Severity::Debug);
    assert_eq!(output(&built.setup.outputs, "SCREEN0").level, Severity::Warn);

    // Root threshold follows the most verbose output; screen is filtered.
    let root = &built.config.categories[""];
    assert_eq!(root.level, Severity::Debug);
    assert!(root
        .appenders
        .iter()
        .any(|r| r.appender == "SCREEN0" && r.filter.as_deref() == Some("SCREEN0_WARN")));
}

/// A file path ending in a separator is a directory.
#[test]
fn e2e_trailing_separator_appends_log_name() {
    let ctx = app_ctx().with_program("/opt/bin/myapp");
    let args = BuildArgs::default().file("/var/log/");
    let built = build(&args, &ctx, &FixedDetector(false)).unwrap();
    assert!(matches!(
        &output(&built.setup.outputs, "FILE0").kind,
        OutputKind::File { path, .. } if path == &PathBuf::from("/var/log/myapp.log")
    ));
}

/// An alias set to OFF attaches reject-all filters on every output at each
/// alias target; other categories keep the global default.
#[test]
fn e2e_alias_off_attaches_reject_filters() {
    let args = BuildArgs::default()
        .alias("-noisy", ["Foo", "Bar.Baz"])
        .category_level("-noisy", Severity::Off);
    let built = build(&args, &app_ctx(), &FixedDetector(false)).unwrap();
    let matrix = &built.setup.matrix;

    for category in ["Foo", "Bar.Baz"] {
        let entry = &matrix.categories[category];
        assert_eq!(entry.level, Severity::Off, "{category}");
        let filters: Vec<_> = entry
            .bindings
            .iter()
            .map(|b| (b.output.as_str(), b.filter.as_deref()))
            .collect();
        assert_eq!(
            filters,
            vec![("SCREEN0", Some("SCREEN0_OFF")), ("FILE0", Some("FILE0_OFF"))]
        );
    }
    assert_eq!(matrix.filters["FILE0_OFF"].kind, FilterKind::RejectAll);

    assert_eq!(matrix.categories[""].level, Severity::Warn);
    assert_eq!(matrix.categories["Bar"].level, Severity::Warn);
    assert!(matrix.categories[""].bindings.iter().all(|b| b.filter.is_none()));

    let text = built.config.to_text().unwrap();
    assert!(text.contains("accept = \"reject_all\""), "{text}");
}

/// A daemon marker turns syslog on with program ident and daemon facility.
#[test]
fn e2e_daemon_marker_enables_syslog() {
    let ctx = app_ctx().with_loaded_modules(["daemonize"]);
    let built = build(&BuildArgs::default(), &ctx, &MarkerTableDetector::default()).unwrap();
    let syslog = output(&built.setup.outputs, "SYSLOG0");
    assert_eq!(
        syslog.kind,
        OutputKind::Syslog {
            ident: "app".to_string(),
            facility: "daemon".to_string()
        }
    );
    assert_eq!(syslog.level, Severity::Warn);
    assert!(built.setup.daemon);
}

/// Argv and environment tiers: argv wins over the environment.
#[test]
fn e2e_argv_beats_env_for_global_level() {
    let ctx = app_ctx()
        .with_args(["--log-level", "info", "--", "--log-level=trace"])
        .with_env([("LOG_LEVEL", "error")]);
    let built = build(&BuildArgs::default().file(false), &ctx, &FixedDetector(false)).unwrap();
    assert_eq!(built.setup.level, Severity::Info);
    assert_eq!(built.setup.level_source, "flag --log-level");
}

/// An alias as an output's scope puts the output on every alias target.
#[test]
fn e2e_alias_as_output_category() {
    let screen: ArgValue = [
        ("category", ArgValue::from("-noisy")),
        ("level", ArgValue::from("debug")),
    ]
    .into_iter()
    .collect();
    let args = BuildArgs::default()
        .file(false)
        .screen(screen)
        .alias("-noisy", ["Foo", "Bar::Baz"]);
    let built = build(&args, &app_ctx(), &FixedDetector(false)).unwrap();
    let matrix = &built.setup.matrix;

    assert!(!matrix.categories.contains_key("-noisy"));
    assert!(matrix.categories[""].bindings.is_empty());
    for category in ["Foo", "Bar.Baz"] {
        let entry = &matrix.categories[category];
        assert_eq!(entry.level, Severity::Debug, "{category}");
        assert_eq!(entry.bindings.len(), 1);
        assert_eq!(entry.bindings[0].output, "SCREEN0");
    }
}

/// The dump carries both the resolved structure and the backend text.
#[test]
fn e2e_dump_written_before_activation() {
    let tmp = tempfile::tempdir().unwrap();
    let args = BuildArgs::default()
        .screen(false)
        .file(path_arg(&tmp.path().join("app.log")))
        .dump(true);
    let backend = RecordingBackend::default();
    let mut dump = Vec::new();
    let outcome = Initializer::new()
        .run(&args, &app_ctx(), &FixedDetector(false), &backend, &mut dump)
        .unwrap();
    assert!(matches!(outcome, InitOutcome::Activated(_)));

    let text = String::from_utf8(dump).unwrap();
    assert!(text.contains("\"outputs\""), "{text}");
    assert!(text.contains("[appenders.FILE0]"), "{text}");
    assert!(backend.seen.lock().unwrap().is_some());
}

// =============================================================================
// Activation
// =============================================================================

/// Directories are created before activation, and records written through
/// the activated subscriber land in the right files.
#[test]
fn e2e_records_routed_to_file_and_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let log = tmp.path().join("logs").join("app.log");
    let records = tmp.path().join("records");

    let file: ArgValue = [
        ("path", path_arg(&log)),
        ("pattern", ArgValue::from("%p %c %m%n")),
    ]
    .into_iter()
    .collect();
    let dir: ArgValue = [
        ("path", path_arg(&records)),
        ("level", ArgValue::from("info")),
    ]
    .into_iter()
    .collect();
    let args = BuildArgs::default()
        .screen(false)
        .file(file)
        .dir(dir)
        .category_level("my_app::db", Severity::Debug);

    let backend = RecordingBackend::default();
    Initializer::new()
        .run(&args, &app_ctx(), &FixedDetector(false), &backend, &mut std::io::sink())
        .unwrap();
    assert!(records.is_dir());

    let config = backend.seen.lock().unwrap().clone().unwrap();
    let subscriber = backend::subscriber(&config).unwrap();
    tracing::subscriber::with_default(subscriber, || {
        tracing::warn!(target: "my_app", "w1");
        tracing::info!(target: "my_app", "i1");
        tracing::debug!(target: "my_app::db", "d1");
        tracing::debug!(target: "my_app", "d2");
    });

    assert_eq!(
        std::fs::read_to_string(&log).unwrap(),
        "WARN my_app w1\nDEBUG my_app.db d1\n"
    );

    let mut contents: Vec<String> = std::fs::read_dir(&records)
        .unwrap()
        .map(|e| std::fs::read_to_string(e.unwrap().path()).unwrap())
        .collect();
    contents.sort();
    assert_eq!(contents, vec!["d1\n", "i1\n", "w1\n"]);
}

/// The process-wide entry point activates once; later calls do nothing.
#[test]
fn e2e_global_init_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let log = tmp.path().join("nested").join("e2e.log");
    let args = BuildArgs::default().screen(false).file(path_arg(&log));
    let ctx = ResolutionContext::new()
        .with_program("e2e")
        .with_home(tmp.path());

    let first = setup::init_with_context(&args, &ctx).unwrap();
    assert!(matches!(first, InitOutcome::Activated(_)));
    assert!(setup::is_initialized());

    tracing::error!(target: "e2e", "global record");

    let second = setup::init_with_context(&args, &ctx).unwrap();
    assert!(matches!(second, InitOutcome::AlreadyInitialized));

    let text = std::fs::read_to_string(&log).unwrap();
    assert!(text.contains("global record"), "{text}");
}
