//! Infrastructure layer: configuration and other host concerns.

pub mod config;

pub use config::{ConfigError, ConfigLoader};
