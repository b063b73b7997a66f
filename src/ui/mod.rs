//! UI module for consistent CLI output
//!
//! Uses `cliclack` for styled output and spinners, `indicatif` for the
//! manifest progress bar, with plain fallbacks in CI and when piped.

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{key_value, remark, section, step_ok, step_ok_detail, step_warn, step_warn_hint};
pub use progress::{ManifestProgress, TaskSpinner};
