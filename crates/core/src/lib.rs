//! Core utilities shared across the truckstop workspace
//!
//! - **Error handling**: coded errors with context and recovery suggestions
//! - **Configuration**: TOML-based configuration with defaults, environment
//!   overrides and validation
//!
//! # Example
//!
//! ```rust,no_run
//! use truckstop_core::config::Config;
//!
//! let config = Config::load(None).expect("config");
//! assert_eq!(config.schema.search.max_results, 5);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ConfigSchema};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
}
