//! Logging setup.
//!
//! The engine only emits through the `log` facade; applications call
//! [`init_logging`] to install `env_logger`.

mod init;

pub use init::{DEFAULT_FILTER, LoggingConfig, init_logging};
