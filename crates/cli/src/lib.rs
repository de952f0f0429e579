//! Terminal output for truckstop tools
//!
//! - Status messages and formatting helpers
//! - Spinners for the SDK load, location and search stages
//! - The nearby-station table

#![warn(missing_docs)]

pub mod output;
pub mod progress;
pub mod stations;
