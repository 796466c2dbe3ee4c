//! The `[runner]` table of `attest.toml`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult};

/// How much the console reporter says while the suite runs.
///
/// Levels are ordered: anything written at a level above the configured one
/// is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Nothing at all.
    Silent,
    /// Progress marks and the fault listing.
    #[default]
    Normal,
    /// One line per test, grouped by case.
    Verbose,
}

impl FromStr for Verbosity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "s" | "silent" => Ok(Verbosity::Silent),
            "n" | "normal" => Ok(Verbosity::Normal),
            "v" | "verbose" => Ok(Verbosity::Verbose),
            other => Err(ConfigError::InvalidValue {
                field: "verbosity".to_string(),
                reason: format!("expected silent, normal, or verbose, got {other:?}"),
            }),
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Verbosity::Silent => "silent",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
        };
        f.write_str(name)
    }
}

/// Whether the console reporter colors its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Always,
    Never,
    /// Decide from the terminal environment.
    #[default]
    Auto,
}

impl FromStr for ColorMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yes" | "true" | "always" => Ok(ColorMode::Always),
            "no" | "false" | "never" => Ok(ColorMode::Never),
            "auto" => Ok(ColorMode::Auto),
            other => Err(ConfigError::InvalidValue {
                field: "color".to_string(),
                reason: format!("expected yes, no, or auto, got {other:?}"),
            }),
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorMode::Always => "always",
            ColorMode::Never => "never",
            ColorMode::Auto => "auto",
        };
        f.write_str(name)
    }
}

/// Runner settings. Every field is optional so that layers merge cleanly;
/// unset fields fall back to the defaults at the point of use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RunnerConfig {
    /// Console verbosity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<Verbosity>,

    /// Console color usage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorMode>,

    /// Whether to run in priority mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<bool>,

    /// Where priority mode keeps its pass markers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_dir: Option<PathBuf>,

    /// Where to write the XML report, if anywhere.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xml_report: Option<PathBuf>,
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks invariants that the type system cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(dir) = &self.result_dir {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "result_dir".to_string(),
                    reason: "path must not be empty".to_string(),
                });
            }
        }
        if let Some(path) = &self.xml_report {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "xml_report".to_string(),
                    reason: "path must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Overlays `other` on top of `self`: set fields of `other` win.
    pub fn merge(&mut self, other: RunnerConfig) {
        if other.verbosity.is_some() {
            self.verbosity = other.verbosity;
        }
        if other.color.is_some() {
            self.color = other.color;
        }
        if other.priority.is_some() {
            self.priority = other.priority;
        }
        if other.result_dir.is_some() {
            self.result_dir = other.result_dir;
        }
        if other.xml_report.is_some() {
            self.xml_report = other.xml_report;
        }
    }
}

/// Shape of the whole configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub(crate) struct ConfigFile {
    pub(crate) runner: RunnerConfig,
}
