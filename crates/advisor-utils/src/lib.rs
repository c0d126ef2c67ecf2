//! Shared utilities for the investment advisor
//!
//! Logging setup and typed environment-variable lookup used by the core crate
//! and the `advisor` binary.

pub mod env;
pub mod logging;

pub use env::{EnvError, env_or, env_parse, env_string};
pub use logging::{init_file_tracing, init_tracing};
