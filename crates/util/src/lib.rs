//! Terminus CLI utility functions: configuration loading and log redaction.

pub mod config;
pub mod text_processing;

pub use config::{ConfigError, TerminusConfig, expand_tilde};
pub use text_processing::redact_sensitive;
