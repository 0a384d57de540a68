//! Line parameter table: static per-line data keyed by line identifier.

use std::collections::HashMap;

use num_complex::Complex64;

use crate::error::{LocatorError, Result};
use crate::phasor::{Matrix3, Phase};

use super::model::{CircuitModel, LineCodeData, LineElement};

/// A line segment with its per-unit-length impedance expanded to 3x3.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSegment {
    pub id: String,
    /// Length in the simulator's native unit.
    pub length: f64,
    pub phases: Vec<Phase>,
    /// Per-unit-length impedance; zero rows/columns for absent phases.
    pub impedance: Matrix3,
    pub upstream_bus: String,
    pub downstream_bus: String,
    pub line_code: String,
}

impl LineSegment {
    /// Total series impedance of the whole segment.
    pub fn total_impedance(&self) -> Matrix3 {
        self.impedance.scale(self.length)
    }
}

/// Read-only mapping from line identifier to [`LineSegment`].
#[derive(Debug, Clone, Default)]
pub struct LineTable {
    lines: HashMap<String, LineSegment>,
}

impl LineTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, segment: LineSegment) {
        self.lines.insert(segment.id.clone(), segment);
    }

    /// Looks up a line.
    ///
    /// # Errors
    ///
    /// Returns `LocatorError::UnknownLine` if the identifier is absent.
    pub fn get(&self, id: &str) -> Result<&LineSegment> {
        self.lines
            .get(id)
            .ok_or_else(|| LocatorError::UnknownLine(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Summed length of the given lines.
    pub fn path_length<S: AsRef<str>>(&self, ids: &[S]) -> Result<f64> {
        ids.iter()
            .map(|id| self.get(id.as_ref()).map(|l| l.length))
            .sum()
    }

    /// `sum(line.impedance * line.length)` over the given lines.
    pub fn path_impedance<S: AsRef<str>>(&self, ids: &[S]) -> Result<Matrix3> {
        let mut z = Matrix3::zeros();
        for id in ids {
            z += self.get(id.as_ref())?.total_impedance();
        }
        Ok(z)
    }
}

/// Builds the line table from the circuit model.
///
/// # Errors
///
/// Returns `LocatorError::UnknownLineCode` if a line references a missing
/// code and `LocatorError::InvalidLineCode` if the code's matrices cannot be
/// placed on the line's phases.
pub fn build_line_table(model: &impl CircuitModel) -> Result<LineTable> {
    let mut table = LineTable::new();
    for line in model.lines()? {
        let code = model
            .line_code(&line.line_code)
            .ok_or_else(|| LocatorError::UnknownLineCode {
                line: line.name.clone(),
                code: line.line_code.clone(),
            })?;
        let impedance = expand_impedance(&line, &code)?;
        table.insert(LineSegment {
            id: line.name,
            length: line.length,
            phases: line.phases,
            impedance,
            upstream_bus: line.bus1,
            downstream_bus: line.bus2,
            line_code: line.line_code,
        });
    }
    Ok(table)
}

/// Places a line code's matrix on the line's phases inside a zero 3x3.
///
/// A 9-entry code is used as is. A 4-entry code fills the rows/columns of the
/// line's two phases; a 1-entry code fills the diagonal of its single phase.
pub fn expand_impedance(line: &LineElement, code: &LineCodeData) -> Result<Matrix3> {
    let invalid = |message: String| LocatorError::InvalidLineCode {
        line: line.name.clone(),
        code: code.name.clone(),
        message,
    };

    if code.rmatrix.len() != code.xmatrix.len() {
        return Err(invalid(format!(
            "rmatrix has {} entries but xmatrix has {}",
            code.rmatrix.len(),
            code.xmatrix.len()
        )));
    }

    let n = match code.rmatrix.len() {
        9 => 3,
        4 => 2,
        1 => 1,
        other => return Err(invalid(format!("unsupported matrix size {other}"))),
    };

    if n == 3 {
        return Ok(Matrix3::from_fn(|i, j| {
            Complex64::new(code.rmatrix[3 * i + j], code.xmatrix[3 * i + j])
        }));
    }

    if line.phases.len() < n {
        return Err(invalid(format!(
            "{n}-phase code on a line with {} phase(s)",
            line.phases.len()
        )));
    }

    let mut m = Matrix3::zeros();
    for (i, pi) in line.phases.iter().take(n).enumerate() {
        for (j, pj) in line.phases.iter().take(n).enumerate() {
            m[(pi.index(), pj.index())] =
                Complex64::new(code.rmatrix[n * i + j], code.xmatrix[n * i + j]);
        }
    }
    Ok(m)
}
