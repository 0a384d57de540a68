//! True-branch selection among per-path estimates.
//!
//! Every candidate path yields some distance, so the estimates alone cannot
//! tell which lateral is faulted. The lateral sensor carrying the largest
//! current on the diagnostic phase decides.

use std::fmt;

use tracing::warn;

use crate::error::{LocatorError, Result};
use crate::record::SensorReadings;
use crate::topology::SensorMap;

use super::estimator::Estimate;
use super::fault_type::FaultType;

/// How much trust to put in a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reliability {
    Confident,
    /// Two different sensors share the maximum reading; the first candidate won.
    Tie,
    /// Every candidate's sensor read zero.
    AllZero,
    /// No candidate path showed a reactance sign change.
    FallbackOnly,
}

impl Reliability {
    pub fn is_low(self) -> bool {
        self != Reliability::Confident
    }
}

impl fmt::Display for Reliability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Reliability::Confident => "confident",
            Reliability::Tie => "tie",
            Reliability::AllZero => "all_zero",
            Reliability::FallbackOnly => "fallback_only",
        };
        f.write_str(s)
    }
}

/// The chosen estimate and the evidence behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub estimate: Estimate,
    pub sensor: String,
    pub reading: f64,
    pub reliability: Reliability,
}

/// Picks the estimate whose lateral sensor reads the highest current.
///
/// Estimates that found a sign change are preferred; fallback estimates are
/// only considered when no path crossed. On equal readings the first
/// candidate wins, so the result is deterministic. A sensor missing from the
/// record counts as zero.
///
/// # Errors
///
/// Returns `LocatorError::NoCandidates` for an empty slice,
/// `LocatorError::UndefinedReactance` when the fault type has no diagnostic
/// phase, and `LocatorError::UnknownLine` when an estimate's line has no
/// sensor.
pub fn select_true_branch(
    fault_type: &FaultType,
    estimates: &[Estimate],
    readings: &SensorReadings,
    sensors: &SensorMap,
) -> Result<Selection> {
    if estimates.is_empty() {
        return Err(LocatorError::NoCandidates);
    }
    let phase = fault_type
        .diagnostic_phase()
        .ok_or_else(|| LocatorError::UndefinedReactance(fault_type.code()))?;

    let crossing: Vec<&Estimate> = estimates.iter().filter(|e| e.is_crossing()).collect();
    let fallback_only = crossing.is_empty();
    let pool: Vec<&Estimate> = if fallback_only {
        estimates.iter().collect()
    } else {
        crossing
    };

    let mut scored = Vec::with_capacity(pool.len());
    for estimate in pool {
        let sensor = &sensors.resolve_sensor(&estimate.line)?.sensor;
        let reading = readings.get(sensor, phase).unwrap_or_else(|| {
            warn!(sensor = %sensor, phase = %phase, "sensor reading missing, treated as zero");
            0.0
        });
        scored.push((estimate, sensor.as_str(), reading));
    }

    let mut best = 0;
    for (i, (_, _, reading)) in scored.iter().enumerate().skip(1) {
        if *reading > scored[best].2 {
            best = i;
        }
    }
    let (estimate, sensor, reading) = scored[best];

    let tie = scored
        .iter()
        .any(|(_, s, r)| *s != sensor && *r == reading);
    let reliability = if fallback_only {
        Reliability::FallbackOnly
    } else if reading == 0.0 {
        Reliability::AllZero
    } else if tie {
        Reliability::Tie
    } else {
        Reliability::Confident
    };

    Ok(Selection {
        estimate: estimate.clone(),
        sensor: sensor.to_string(),
        reading,
        reliability,
    })
}
