// loganyapp - app/mod.rs
//
// Application layer: build orchestration, debug dump, activation guard.
// Dependencies: core, platform, backend.

pub mod setup;
