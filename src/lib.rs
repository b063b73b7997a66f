//! Packwright - frontend bundle build coordinator
//!
//! Builds bundles through a long-running build server, serving results
//! from a live cache during development and from a precomputed manifest
//! in production.

pub mod bundle;
pub mod cache;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod error;
pub mod manifest;
pub mod ui;

pub use bundle::BundleResult;
pub use compiler::{BuildOptions, Compiler};
pub use error::{PackwrightError, PackwrightResult};
