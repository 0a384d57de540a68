//! Three-phase phasors and 3x3 complex impedance matrices.
//!
//! Rows and columns are indexed by phase: index 0 is phase 1 (a), index 1
//! is phase 2 (b), index 2 is phase 3 (c). Absent phases carry zeros.

use std::fmt;

use nalgebra::Vector3;
use num_complex::Complex64;

/// One conductor phase of a three-phase feeder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    A,
    B,
    C,
}

impl Phase {
    /// All phases in canonical order.
    pub const ALL: [Phase; 3] = [Phase::A, Phase::B, Phase::C];

    /// Zero-based matrix/vector index.
    pub fn index(self) -> usize {
        match self {
            Phase::A => 0,
            Phase::B => 1,
            Phase::C => 2,
        }
    }

    /// Maps a simulator node number (`1`, `2`, `3`) to a phase.
    pub fn from_node(node: u8) -> Option<Self> {
        match node {
            1 => Some(Phase::A),
            2 => Some(Phase::B),
            3 => Some(Phase::C),
            _ => None,
        }
    }

    /// Simulator node number of this phase.
    pub fn node(self) -> u8 {
        self.index() as u8 + 1
    }

    /// Lower-case letter used in column names (`a`, `b`, `c`).
    pub fn letter(self) -> char {
        match self {
            Phase::A => 'a',
            Phase::B => 'b',
            Phase::C => 'c',
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Complex voltage or current triple, one entry per phase.
pub type Phasors = Vector3<Complex64>;

/// Dense 3x3 complex impedance or admittance matrix.
pub type Matrix3 = nalgebra::Matrix3<Complex64>;

/// Builds a phasor triple from the simulator's interleaved `[re, im, re, im, ...]`
/// layout. Only the first three pairs (the first terminal) are used.
///
/// Returns `None` when fewer than six values are given.
pub fn phasors_from_interleaved(raw: &[f64]) -> Option<Phasors> {
    if raw.len() < 6 {
        return None;
    }
    Some(Phasors::new(
        Complex64::new(raw[0], raw[1]),
        Complex64::new(raw[2], raw[3]),
        Complex64::new(raw[4], raw[5]),
    ))
}

/// Inverts `m` unless it is singular relative to its own scale.
///
/// Returns `None` when `|det| <= tolerance * max_abs^3` or the determinant is
/// not finite; otherwise defers to nalgebra's inverse.
pub fn invert(m: &Matrix3, tolerance: f64) -> Option<Matrix3> {
    let scale = m.iter().map(|z| z.norm()).fold(0.0, f64::max);
    if scale == 0.0 || !scale.is_finite() {
        return None;
    }
    let det = m.determinant();
    if !det.is_finite() || det.norm() <= tolerance * scale.powi(3) {
        return None;
    }
    m.try_inverse()
}
