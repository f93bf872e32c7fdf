//! # Observability Infrastructure
//!
//! Structured logging for the certificate factory and the `dyncert` binary.

pub mod logging;

pub use logging::{init_logging, log_factory_config};
