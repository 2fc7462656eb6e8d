//! `oceaneye-diver` library crate.
//!
//! Re-exports internal modules for integration testing. The binary
//! entrypoint lives in `main.rs`.

pub mod camera;
pub mod config;
pub mod driver;
