//! Minimum-reactance distance estimator.
//!
//! A hypothetical fault point is swept along one candidate path. At each step
//! the network downstream of the point is reduced to a Thevenin impedance,
//! the fault-point voltage and current are reconstructed from the substation
//! measurements, and the apparent reactance is evaluated. The fault is placed
//! where that reactance first turns negative, refined by linear
//! interpolation between the last two samples.

use std::fmt;

use num_complex::Complex64;
use tracing::{debug, warn};

use crate::error::{LocatorError, Result};
use crate::network::{LineSegment, LineTable};
use crate::phasor::{Matrix3, Phasors, invert};
use crate::topology::CandidatePath;

use super::fault_type::FaultType;

/// Numerical settings of the sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepSettings {
    /// Steps per line; 100 gives a step of 1% of each line's length.
    pub steps_per_line: usize,
    /// Relative determinant threshold below which a matrix is treated as singular.
    pub singular_tolerance: f64,
    /// Smallest magnitude accepted as a divisor.
    pub min_divisor: f64,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            steps_per_line: 100,
            singular_tolerance: 1e-12,
            min_divisor: 1e-12,
        }
    }
}

/// Substation voltage and current before the fault.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrefaultState {
    pub voltage: Phasors,
    pub current: Phasors,
}

/// How an estimate was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    /// The apparent reactance changed sign on this path.
    Crossing,
    /// No sign change; the path end is reported and the path is presumably
    /// not faulted.
    Fallback,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Crossing => write!(f, "crossing"),
            Confidence::Fallback => write!(f, "fallback"),
        }
    }
}

/// Distance estimate for one candidate path.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    /// Index of the candidate path this estimate belongs to.
    pub path: usize,
    /// Line segment in which the detecting (or final) step fell.
    pub line: String,
    /// Distance from the substation in the simulator's native unit.
    pub distance: f64,
    pub confidence: Confidence,
    /// Steps skipped because the downstream impedance was singular or the
    /// reactance term vanished.
    pub skipped_steps: usize,
}

impl Estimate {
    pub fn is_crossing(&self) -> bool {
        self.confidence == Confidence::Crossing
    }
}

/// Per-path impedances, computed once and shared by every fault record.
#[derive(Debug, Clone)]
pub struct PathModel {
    index: usize,
    name: String,
    segments: Vec<LineSegment>,
    z_path: Matrix3,
    z_load: Matrix3,
    z_total: Matrix3,
    settings: SweepSettings,
}

impl PathModel {
    /// Precomputes `Z_path`, the equivalent load `Z_load` and `Z_total`.
    ///
    /// `Z_load[p] = Vpre[p]/Ipre[p] - (sum_q Z_path[q,p] * Ipre[q]) / Ipre[p]`
    ///
    /// # Errors
    ///
    /// Returns `LocatorError::UnknownLine` if a path line is missing from the
    /// table, `LocatorError::Topology` for an empty path, and
    /// `LocatorError::Numerical` if a pre-fault phase current is near zero.
    pub fn prepare(
        index: usize,
        path: &CandidatePath,
        table: &LineTable,
        prefault: &PrefaultState,
        settings: &SweepSettings,
    ) -> Result<Self> {
        if path.lines.is_empty() {
            return Err(LocatorError::Topology(format!(
                "candidate path `{}` has no lines",
                path.name
            )));
        }
        let segments = path
            .lines
            .iter()
            .map(|id| table.get(id).cloned())
            .collect::<Result<Vec<_>>>()?;
        let z_path = table.path_impedance(&path.lines)?;

        let mut load = Phasors::zeros();
        for (p, z) in load.iter_mut().enumerate() {
            let ipre = prefault.current[p];
            if ipre.norm() < settings.min_divisor {
                return Err(LocatorError::Numerical {
                    quantity: format!("pre-fault current of phase {}", p + 1),
                    value: ipre.norm(),
                });
            }
            let drop: Complex64 = (0..3).map(|q| z_path[(q, p)] * prefault.current[q]).sum();
            *z = prefault.voltage[p] / ipre - drop / ipre;
        }
        let z_load = Matrix3::from_diagonal(&load);

        Ok(Self {
            index,
            name: path.name.clone(),
            segments,
            z_path,
            z_load,
            z_total: z_path + z_load,
            settings: settings.clone(),
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn z_path(&self) -> &Matrix3 {
        &self.z_path
    }

    pub fn z_load(&self) -> &Matrix3 {
        &self.z_load
    }

    pub fn z_total(&self) -> &Matrix3 {
        &self.z_total
    }

    /// Total path length in the native unit.
    pub fn length(&self) -> f64 {
        self.segments.iter().map(|s| s.length).sum()
    }

    /// Sweeps the path for one fault record.
    ///
    /// # Errors
    ///
    /// Returns `LocatorError::UndefinedReactance` for an unrecognized fault type
    /// and `LocatorError::Numerical` if the two interpolation samples carry the
    /// same reactance. A path without a sign change is not an error; it yields
    /// a [`Confidence::Fallback`] estimate at the end of the path.
    ///
    /// Steps whose downstream impedance is singular, or whose reactance term
    /// vanishes, are skipped and counted in [`Estimate::skipped_steps`]; the
    /// first such step is logged as a warning once the sweep ends.
    pub fn estimate(
        &self,
        fault_type: &FaultType,
        v_fault: &Phasors,
        i_fault: &Phasors,
    ) -> Result<Estimate> {
        if let FaultType::Unrecognized(code) = fault_type {
            return Err(LocatorError::UndefinedReactance(code.clone()));
        }

        let steps = self.settings.steps_per_line.max(1);
        let fraction = 1.0 / steps as f64;
        let mut z_up = Matrix3::zeros();
        let mut distance = 0.0;
        let mut previous: Option<(f64, f64)> = None;
        let mut skipped = 0usize;
        let mut first_skip: Option<LocatorError> = None;

        for segment in &self.segments {
            let delta = segment.length * fraction;
            let dz = segment.impedance.scale(delta);

            for _ in 0..steps {
                distance += delta;
                z_up += dz;

                let z_down = self.z_total - z_up;
                let Some(y_down) = invert(&z_down, self.settings.singular_tolerance) else {
                    skipped += 1;
                    let error = LocatorError::Singular {
                        context: format!(
                            "downstream impedance on path {}, line {}, distance {distance:.4}",
                            self.name, segment.id
                        ),
                    };
                    debug!(%error, "step skipped");
                    if first_skip.is_none() {
                        first_skip = Some(error);
                    }
                    continue;
                };

                let vf = v_fault - z_up * i_fault;
                let i_f = i_fault - y_down * vf;
                let xf = match fault_type.apparent_reactance(&vf, &i_f) {
                    Ok(x) => x,
                    Err(error @ LocatorError::Numerical { .. }) => {
                        skipped += 1;
                        debug!(path = %self.name, line = %segment.id, distance, %error, "step skipped");
                        if first_skip.is_none() {
                            first_skip = Some(error);
                        }
                        continue;
                    }
                    Err(e) => return Err(e),
                };

                if xf < 0.0 {
                    let refined = match previous {
                        Some((d1, x1)) => {
                            let dx = xf - x1;
                            if dx.abs() < self.settings.min_divisor {
                                return Err(LocatorError::Numerical {
                                    quantity: "reactance difference at crossing".into(),
                                    value: dx,
                                });
                            }
                            distance - xf * (distance - d1) / dx
                        }
                        None => distance,
                    };
                    self.report_skipped(skipped, first_skip);
                    return Ok(Estimate {
                        path: self.index,
                        line: segment.id.clone(),
                        distance: refined,
                        confidence: Confidence::Crossing,
                        skipped_steps: skipped,
                    });
                }
                previous = Some((distance, xf));
            }
        }

        let last = self
            .segments
            .last()
            .map(|s| s.id.clone())
            .unwrap_or_default();
        debug!(path = %self.name, line = %last, "no reactance sign change");
        self.report_skipped(skipped, first_skip);
        Ok(Estimate {
            path: self.index,
            line: last,
            distance,
            confidence: Confidence::Fallback,
            skipped_steps: skipped,
        })
    }

    fn report_skipped(&self, skipped: usize, first: Option<LocatorError>) {
        if let Some(error) = first {
            warn!(path = %self.name, skipped, first = %error, "sweep steps skipped");
        }
    }
}

/// One-shot form: prepares the path model and sweeps a single record.
pub fn estimate(
    path: &CandidatePath,
    fault_type: &FaultType,
    v_fault: &Phasors,
    i_fault: &Phasors,
    table: &LineTable,
    prefault: &PrefaultState,
    settings: &SweepSettings,
) -> Result<Estimate> {
    PathModel::prepare(0, path, table, prefault, settings)?.estimate(fault_type, v_fault, i_fault)
}
