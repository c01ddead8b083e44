//! MME NAS configuration management
//!
//! This crate provides configuration loading and parsing for the NAS stack:
//! - TOML configuration file parsing
//! - Immutable MME configuration plus shared mutable allocation state

pub mod mme_config;
pub mod toml_config;

pub use mme_config::*;
pub use toml_config::*;
