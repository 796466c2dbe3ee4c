//! Configuration management for the attest test runner.
//!
//! Settings come from four layers, each overriding the one before it:
//!
//! 1. Built-in defaults
//! 2. A home-level `~/.attest/config.toml` (the `[runner]` table)
//! 3. An `attest.toml` file in the working directory
//! 4. Environment variables (`ATTEST_PRIORITY`, `ATTEST_RESULT_DIR`,
//!    `NO_COLOR`)
//!
//! Command-line flags sit above all of these, but they are the caller's
//! business; this crate only produces the merged [`RunnerConfig`].

use std::path::PathBuf;

use thiserror::Error;

pub mod loader;
pub mod runner;

pub use loader::{global_config_path, load, load_from};
pub use runner::{ColorMode, RunnerConfig, Verbosity};

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The requested configuration file does not exist.
    #[error("configuration file not found: {0}")]
    NotFound(PathBuf),

    /// Reading the configuration file failed.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The configuration file is not valid TOML.
    #[error("failed to parse TOML in {file}: {error}")]
    TomlParseError { file: PathBuf, error: String },

    /// A value is syntactically valid but semantically wrong.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// No home directory to resolve `~/.attest/config.toml` against.
    #[error("home directory not found")]
    HomeNotFound,
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
