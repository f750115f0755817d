//! # brainz Common Library
//!
//! Shared code for the brainz crates:
//! - MusicBrainz connection settings and rate-limit policy
//! - TOML configuration loading with environment overrides
//! - Common error type

pub mod config;
pub mod error;

pub use config::{LoggingConfig, MusicBrainzConfig, TomlConfig};
pub use error::{Error, Result};
