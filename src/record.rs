//! Fault records: the measurements taken during one fault event.

use std::collections::HashMap;

use crate::locate::FaultType;
use crate::phasor::{Phase, Phasors};

/// Per-phase current magnitude at each sensor, keyed by `(sensor, phase)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorReadings {
    values: HashMap<(String, Phase), f64>,
}

impl SensorReadings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sensor: impl Into<String>, phase: Phase, magnitude: f64) {
        self.values.insert((sensor.into(), phase), magnitude);
    }

    pub fn get(&self, sensor: &str, phase: Phase) -> Option<f64> {
        self.values.get(&(sensor.to_string(), phase)).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Simulated truth carried by study records; used only for accuracy scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundTruth {
    pub line: String,
    /// Distance from the substation in output units.
    pub distance: f64,
    /// Fault resistance as written in the input, passed through untouched.
    pub resistance: Option<String>,
}

/// One fault event.
#[derive(Debug, Clone, PartialEq)]
pub struct FaultRecord {
    /// Zero-based position in the input table.
    pub index: usize,
    pub fault_type: FaultType,
    /// Substation voltage during the fault.
    pub v_fault: Phasors,
    /// Substation current during the fault.
    pub i_fault: Phasors,
    pub sensors: SensorReadings,
    pub truth: Option<GroundTruth>,
}

/// Column layout of the measurement table for one feeder.
///
/// Complex quantities use one real and one imaginary column per phase; sensor
/// magnitudes use `<sensor>_ia`, `<sensor>_ib`, `<sensor>_ic` for every
/// canonical sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementSchema {
    sensors: Vec<String>,
}

impl MeasurementSchema {
    pub const VOLTAGE: [(&'static str, &'static str); 3] =
        [("va_r", "va_i"), ("vb_r", "vb_i"), ("vc_r", "vc_i")];
    pub const CURRENT: [(&'static str, &'static str); 3] =
        [("ia_r", "ia_i"), ("ib_r", "ib_i"), ("ic_r", "ic_i")];
    pub const FAULTED_LINE: &'static str = "faulted_line";
    pub const DISTANCE: &'static str = "distance";
    pub const FAULT_TYPE: &'static str = "fault_type";
    pub const RESISTANCE: &'static str = "fault_resistance";

    pub fn new(sensors: &[String]) -> Self {
        Self {
            sensors: sensors.to_vec(),
        }
    }

    pub fn sensors(&self) -> &[String] {
        &self.sensors
    }

    /// Column holding the magnitude of `phase` at `sensor`.
    pub fn sensor_column(sensor: &str, phase: Phase) -> String {
        format!("{sensor}_i{}", phase.letter())
    }

    /// Every sensor column in canonical order.
    pub fn sensor_columns(&self) -> Vec<String> {
        self.sensors
            .iter()
            .flat_map(|s| Phase::ALL.map(|p| Self::sensor_column(s, p)))
            .collect()
    }

    /// Full header, ground-truth columns included.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Self::VOLTAGE
            .iter()
            .chain(Self::CURRENT.iter())
            .flat_map(|(re, im)| [re.to_string(), im.to_string()])
            .collect();
        columns.extend(
            [
                Self::FAULTED_LINE,
                Self::DISTANCE,
                Self::FAULT_TYPE,
                Self::RESISTANCE,
            ]
            .map(String::from),
        );
        columns.extend(self.sensor_columns());
        columns
    }
}
