//! # Observability
//!
//! Structured logging for the videotube backend. Output goes to stdout either as
//! human-readable lines or as JSON, filtered by `RUST_LOG` or the configured level.

pub mod logging;

pub use logging::{init_logging, log_config_info};
