//! Configuration module
//!
//! Loading and validation of light configuration files. The schema itself
//! lives in `trafficlight_core::config` and is re-exported here.

pub mod loader;
pub mod validation;

pub use loader::{ConfigLoader, LoadResult, apply_env_overrides, read_file};
pub use trafficlight_core::config::*;
pub use validation::{ValidationResult, Validator};
