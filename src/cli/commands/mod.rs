//! CLI command implementations

pub mod build;
pub mod completions;
pub mod config;
pub mod key;
pub mod manifest;

pub use build::execute as build;
pub use completions::execute as completions;
pub use config::execute as config;
pub use key::execute as key;
pub use manifest::execute as manifest;
