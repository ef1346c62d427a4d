//! Logging setup shared by the server binary and tests.

pub mod tracing;

pub use self::tracing::{LoggingConfig, init};
