//! TOML-based run configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::feeders::{IEEE34_CIRCUITS, IEEE34_REFERENCE_LATERAL, IEEE34_ROOT};
use crate::io::import::CsvFormat;
use crate::locate::SweepSettings;

/// Top-level run configuration parsed from TOML.
///
/// All fields have defaults; an empty document enumerates candidate paths
/// from the topology. Load from TOML with [`LocatorConfig::from_toml_file`]
/// or pick a built-in with [`LocatorConfig::from_preset`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocatorConfig {
    /// Feeder root and candidate paths.
    #[serde(default)]
    pub feeder: FeederConfig,
    /// Reactance sweep resolution and numerical guards.
    #[serde(default)]
    pub sweep: SweepConfig,
    /// Output unit conversion.
    #[serde(default)]
    pub report: ReportConfig,
    /// CSV dialect of the input and output tables.
    #[serde(default)]
    pub io: IoConfig,
}

/// Feeder root and candidate paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeederConfig {
    /// Substation bus.
    pub root: String,
    /// Explicit candidate paths; enumerated from the topology when absent.
    pub paths: Option<Vec<Vec<String>>>,
    /// Lines whose total length normalises the percentage error; the longest
    /// candidate path when absent.
    pub reference_lateral: Option<Vec<String>>,
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            root: IEEE34_ROOT.to_string(),
            paths: None,
            reference_lateral: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    /// Sweep steps per line (must be > 0).
    pub steps_per_line: usize,
    /// Relative determinant threshold for singular matrices.
    pub singular_tolerance: f64,
    /// Smallest accepted divisor magnitude.
    pub min_divisor: f64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        let s = SweepSettings::default();
        Self {
            steps_per_line: s.steps_per_line,
            singular_tolerance: s.singular_tolerance,
            min_divisor: s.min_divisor,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Multiplier from the simulator's length unit to output units
    /// (kft to metres by default).
    pub length_scale: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { length_scale: 304.8 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IoConfig {
    /// Single ASCII field separator.
    pub delimiter: String,
    /// Numbers use `,` as decimal separator.
    pub decimal_comma: bool,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            delimiter: ";".to_string(),
            decimal_comma: true,
        }
    }
}

/// A single configuration problem, tagged with the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    pub field: String,
    pub message: String,
}

impl LocatorConfig {
    /// The IEEE 34-bus feeder with its eight fixed circuits.
    pub fn ieee34() -> Self {
        Self {
            feeder: FeederConfig {
                root: IEEE34_ROOT.to_string(),
                paths: Some(
                    IEEE34_CIRCUITS
                        .iter()
                        .map(|c| c.iter().map(|l| l.to_string()).collect())
                        .collect(),
                ),
                reference_lateral: Some(
                    IEEE34_REFERENCE_LATERAL
                        .iter()
                        .map(|l| l.to_string())
                        .collect(),
                ),
            },
            ..Self::default()
        }
    }

    /// Paths enumerated from whatever topology the network file describes.
    pub fn generic() -> Self {
        Self::default()
    }

    pub const PRESETS: &[&str] = &["ieee34", "generic"];

    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "ieee34" => Ok(Self::ieee34()),
            "generic" => Ok(Self::generic()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    pub fn sweep_settings(&self) -> SweepSettings {
        SweepSettings {
            steps_per_line: self.sweep.steps_per_line,
            singular_tolerance: self.sweep.singular_tolerance,
            min_divisor: self.sweep.min_divisor,
        }
    }

    pub fn csv_format(&self) -> CsvFormat {
        CsvFormat {
            delimiter: self.io.delimiter.bytes().next().unwrap_or(b';'),
            decimal_comma: self.io.decimal_comma,
        }
    }

    /// Returns every violation found; an empty vector means the config is usable.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let f = &self.feeder;
        if f.root.trim().is_empty() {
            errors.push(ConfigError {
                field: "feeder.root".into(),
                message: "must not be empty".into(),
            });
        }
        if let Some(paths) = &f.paths {
            if paths.is_empty() {
                errors.push(ConfigError {
                    field: "feeder.paths".into(),
                    message: "must list at least one path when given".into(),
                });
            }
            for (i, p) in paths.iter().enumerate() {
                if p.is_empty() {
                    errors.push(ConfigError {
                        field: format!("feeder.paths[{i}]"),
                        message: "must not be empty".into(),
                    });
                }
            }
        }
        if f.reference_lateral.as_ref().is_some_and(Vec::is_empty) {
            errors.push(ConfigError {
                field: "feeder.reference_lateral".into(),
                message: "must not be empty when given".into(),
            });
        }

        let s = &self.sweep;
        if s.steps_per_line == 0 {
            errors.push(ConfigError {
                field: "sweep.steps_per_line".into(),
                message: "must be > 0".into(),
            });
        }
        if !(s.singular_tolerance >= 0.0 && s.singular_tolerance.is_finite()) {
            errors.push(ConfigError {
                field: "sweep.singular_tolerance".into(),
                message: "must be a finite value >= 0".into(),
            });
        }
        if !(s.min_divisor > 0.0 && s.min_divisor.is_finite()) {
            errors.push(ConfigError {
                field: "sweep.min_divisor".into(),
                message: "must be a finite value > 0".into(),
            });
        }

        if !(self.report.length_scale > 0.0 && self.report.length_scale.is_finite()) {
            errors.push(ConfigError {
                field: "report.length_scale".into(),
                message: "must be a finite value > 0".into(),
            });
        }

        let io = &self.io;
        if io.delimiter.len() != 1 || !io.delimiter.is_ascii() {
            errors.push(ConfigError {
                field: "io.delimiter".into(),
                message: format!("must be a single ASCII character, got \"{}\"", io.delimiter),
            });
        } else if io.decimal_comma && io.delimiter == "," {
            errors.push(ConfigError {
                field: "io.delimiter".into(),
                message: "cannot be \",\" when io.decimal_comma is set".into(),
            });
        }

        errors
    }
}
