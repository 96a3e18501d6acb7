// loganyapp - util/mod.rs
//
// Utility modules: error types, named constants, diagnostics logging.
// No dependencies on core, app, backend, or platform layers.

pub mod constants;
pub mod error;
pub mod logging;
