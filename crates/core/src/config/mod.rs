//! Configuration loading and schema definitions

mod loader;
mod schema;

pub use loader::{Config, ENV_API_KEY, ENV_API_KEY_FALLBACK, ENV_LATITUDE, ENV_LOG, ENV_LONGITUDE};
pub use schema::*;
