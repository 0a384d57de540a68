//! Circuit-model oracle and its TOML-backed implementation.
//!
//! The power-flow simulator that owns the feeder model stays outside this
//! crate. [`CircuitModel`] is the narrow view the locator needs of it, and
//! [`NetworkFile`] provides that view from a static export of the model.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{LocatorError, Result};
use crate::phasor::{Phase, Phasors, phasors_from_interleaved};

/// A line element as reported by the circuit model.
#[derive(Debug, Clone, PartialEq)]
pub struct LineElement {
    pub name: String,
    /// Length in the simulator's native unit.
    pub length: f64,
    /// Upstream bus name without node suffix.
    pub bus1: String,
    /// Downstream bus name without node suffix.
    pub bus2: String,
    /// Phases present on the line, ascending.
    pub phases: Vec<Phase>,
    pub line_code: String,
}

/// Per-unit-length resistance and reactance of a line code, row major.
///
/// Holds 9 entries for a three-phase code, 4 for a two-phase code and 1 for
/// a single-phase code.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineCodeData {
    pub name: String,
    pub rmatrix: Vec<f64>,
    pub xmatrix: Vec<f64>,
}

/// A series element without line data, such as a voltage regulator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeriesElement {
    pub name: String,
    pub bus1: String,
    pub bus2: String,
}

/// Pre-fault phasors at the monitored substation element.
#[derive(Debug, Clone, PartialEq)]
pub struct SubstationMeasurement {
    pub element: String,
    pub voltage: Phasors,
    pub current: Phasors,
}

/// What the locator needs from the external circuit simulator.
pub trait CircuitModel {
    /// Every line element of the feeder.
    fn lines(&self) -> Result<Vec<LineElement>>;

    /// Looks up a line code by name.
    fn line_code(&self, name: &str) -> Option<LineCodeData>;

    /// Series elements that are graph edges but not lines.
    fn series_elements(&self) -> Vec<SeriesElement>;

    /// Pre-fault voltage and current at the substation element.
    fn substation(&self) -> Result<SubstationMeasurement>;
}

/// Splits simulator bus notation (`"808.1.2.3"`) into the bus name and its
/// phase set. Node `0` (ground) is ignored; a bare name means all phases.
///
/// # Errors
///
/// Returns `LocatorError::InvalidBus` for an empty name or a node other than
/// `0`-`3`.
pub fn parse_bus_spec(spec: &str) -> Result<(String, Vec<Phase>)> {
    let mut parts = spec.trim().split('.');
    let name = parts.next().unwrap_or_default();
    if name.is_empty() {
        return Err(LocatorError::InvalidBus(spec.to_string()));
    }

    let mut phases = Vec::new();
    for node in parts {
        let n: u8 = node
            .parse()
            .map_err(|_| LocatorError::InvalidBus(spec.to_string()))?;
        if n == 0 {
            continue;
        }
        let phase = Phase::from_node(n).ok_or_else(|| LocatorError::InvalidBus(spec.to_string()))?;
        if !phases.contains(&phase) {
            phases.push(phase);
        }
    }
    if phases.is_empty() {
        phases = Phase::ALL.to_vec();
    }
    phases.sort_unstable();
    Ok((name.to_string(), phases))
}

/// Static export of a circuit model, read from TOML.
///
/// ```toml
/// [substation]
/// element = "l1"
/// prefault_voltage = [7200.0, 0.0, -3600.0, -6235.4, -3600.0, 6235.4]
/// prefault_current = [50.0, -10.0, -33.7, -38.3, -16.3, 48.3]
///
/// [[linecodes]]
/// name = "mtx1"
/// rmatrix = [0.3]
/// xmatrix = [0.6]
///
/// [[lines]]
/// name = "l1"
/// bus1 = "800.1"
/// bus2 = "802.1"
/// linecode = "mtx1"
/// length = 2.58
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkFile {
    pub substation: SubstationSection,
    #[serde(default)]
    pub linecodes: Vec<LineCodeData>,
    pub lines: Vec<LineSection>,
    #[serde(default)]
    pub regulators: Vec<SeriesElement>,
}

/// `[substation]` table of a [`NetworkFile`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubstationSection {
    pub element: String,
    /// Interleaved `[re, im]` pairs for phases a, b, c.
    pub prefault_voltage: Vec<f64>,
    pub prefault_current: Vec<f64>,
}

/// `[[lines]]` entry of a [`NetworkFile`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineSection {
    pub name: String,
    pub bus1: String,
    pub bus2: String,
    pub linecode: String,
    pub length: f64,
}

impl NetworkFile {
    /// Reads and parses a network file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read or a TOML error if it
    /// does not match the schema.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

impl CircuitModel for NetworkFile {
    fn lines(&self) -> Result<Vec<LineElement>> {
        self.lines
            .iter()
            .map(|l| {
                let (bus1, phases) = parse_bus_spec(&l.bus1)?;
                let (bus2, _) = parse_bus_spec(&l.bus2)?;
                Ok(LineElement {
                    name: l.name.clone(),
                    length: l.length,
                    bus1,
                    bus2,
                    phases,
                    line_code: l.linecode.clone(),
                })
            })
            .collect()
    }

    fn line_code(&self, name: &str) -> Option<LineCodeData> {
        self.linecodes.iter().find(|c| c.name == name).cloned()
    }

    fn series_elements(&self) -> Vec<SeriesElement> {
        self.regulators
            .iter()
            .map(|r| SeriesElement {
                name: r.name.clone(),
                bus1: bus_name(&r.bus1),
                bus2: bus_name(&r.bus2),
            })
            .collect()
    }

    fn substation(&self) -> Result<SubstationMeasurement> {
        let s = &self.substation;
        let phasors = |raw: &[f64], column: &str| {
            phasors_from_interleaved(raw).ok_or_else(|| LocatorError::Schema {
                record: 0,
                column: format!("substation.{column}"),
                message: format!("expected 6 values, got {}", raw.len()),
            })
        };
        Ok(SubstationMeasurement {
            element: s.element.clone(),
            voltage: phasors(&s.prefault_voltage, "prefault_voltage")?,
            current: phasors(&s.prefault_current, "prefault_current")?,
        })
    }
}

fn bus_name(spec: &str) -> String {
    spec.split('.').next().unwrap_or_default().trim().to_string()
}
