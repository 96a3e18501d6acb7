// loganyapp - platform/mod.rs
//
// Platform abstraction layer: process snapshot, config files, directories.
// Dependencies: core model types, directories, console, libc (unix).
// Must NOT depend on: app, backend.

pub mod config;
pub mod fs;
pub mod process;
