//! Shared pieces for the tokenauth workspace: the unified error type with
//! its HTTP mapping, the module configuration, and timestamp helpers.

pub mod config;
pub mod error;
pub mod time;

pub use config::AuthOptions;
pub use error::ServiceError;
pub use time::{format_sqlite, parse_timestamp};
