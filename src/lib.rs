// loganyapp - lib.rs
//
// Library entry point. Resolves a complete logging configuration from code
// options, argv, environment and process-global variables, then activates
// it as the global `tracing` subscriber.
//
// Layers:
//   util      constants, errors, diagnostics logging
//   core      pure resolution: levels, outputs, matrix, backend config
//   platform  process snapshot, config files, directories
//   backend   tracing-subscriber activation
//   app       build orchestration and the once-per-process guard

pub mod app;
pub mod backend;
pub mod core;
pub mod platform;
pub mod util;

pub use crate::app::setup::{init, InitOutcome};
pub use crate::core::args::BuildArgs;
pub use crate::core::model::{ArgValue, Severity};
