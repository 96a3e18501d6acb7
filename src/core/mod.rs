// loganyapp - core/mod.rs
//
// Core resolution logic.
// Dependencies: standard library, serde, toml, tracing macros.
// Must NOT depend on: platform, app, backend, or read process state.

pub mod alias;
pub mod args;
pub mod context;
pub mod daemon;
pub mod emit;
pub mod matrix;
pub mod model;
pub mod output;
pub mod resolver;
