//! Fault-type codes and the apparent-reactance formula for each class.

use std::fmt;

use num_complex::Complex64;

use crate::error::{LocatorError, Result};
use crate::phasor::{Phase, Phasors};

/// Fault classes the estimator distinguishes.
///
/// Phase pairs are stored in cyclic order (a,b), (b,c), (c,a), which fixes
/// the sign convention of the pairwise reactance formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultType {
    /// Single phase to ground.
    PhaseToGround(Phase),
    /// Two phases, with or without ground.
    PhasePair {
        first: Phase,
        second: Phase,
        grounded: bool,
    },
    /// All three phases, with or without ground.
    ThreePhase { grounded: bool },
    /// A code with no formula; kept verbatim for reporting.
    Unrecognized(String),
}

impl FaultType {
    /// Parses either simulator node notation (`.1.0`, `.2.3`, `.1.2.3.0`) or
    /// letter codes (`at`, `bc`, `abt`, `abc`). Unknown codes become
    /// [`FaultType::Unrecognized`].
    pub fn parse(code: &str) -> Self {
        let trimmed = code.trim();
        let lower = trimmed.to_ascii_lowercase();

        let parsed = if lower.starts_with('.') {
            parse_nodes(&lower)
        } else {
            parse_letters(&lower)
        };
        parsed.unwrap_or_else(|| FaultType::Unrecognized(trimmed.to_string()))
    }

    fn from_parts(phases: &[Phase], grounded: bool) -> Option<Self> {
        match phases {
            [p] if grounded => Some(FaultType::PhaseToGround(*p)),
            [p, q] => {
                let (first, second) = cyclic_pair(*p, *q);
                Some(FaultType::PhasePair {
                    first,
                    second,
                    grounded,
                })
            }
            [_, _, _] => Some(FaultType::ThreePhase { grounded }),
            _ => None,
        }
    }

    /// Simulator node notation of this fault type.
    pub fn code(&self) -> String {
        match self {
            FaultType::PhaseToGround(p) => format!(".{}.0", p.node()),
            FaultType::PhasePair {
                first,
                second,
                grounded,
            } => {
                let (lo, hi) = if first < second {
                    (first, second)
                } else {
                    (second, first)
                };
                let ground = if *grounded { ".0" } else { "" };
                format!(".{}.{}{ground}", lo.node(), hi.node())
            }
            FaultType::ThreePhase { grounded: true } => ".1.2.3.0".to_string(),
            FaultType::ThreePhase { grounded: false } => ".1.2.3".to_string(),
            FaultType::Unrecognized(code) => code.clone(),
        }
    }

    /// Phases involved in the fault.
    pub fn phases(&self) -> Vec<Phase> {
        match self {
            FaultType::PhaseToGround(p) => vec![*p],
            FaultType::PhasePair { first, second, .. } => {
                let mut v = vec![*first, *second];
                v.sort_unstable();
                v
            }
            FaultType::ThreePhase { .. } => Phase::ALL.to_vec(),
            FaultType::Unrecognized(_) => Vec::new(),
        }
    }

    /// Phase whose sensor current magnitude identifies the faulted lateral.
    ///
    /// Single-phase faults use their own phase. Multi-phase faults take the
    /// first involved phase in priority order a, b, c.
    pub fn diagnostic_phase(&self) -> Option<Phase> {
        self.phases().into_iter().min()
    }

    /// Pair of phase indices `(p, q)` used by the formula `(V[q]-V[p])/(I[q]-I[p])`,
    /// or a single index for phase-to-ground.
    fn formula(&self) -> Option<Formula> {
        match self {
            FaultType::PhaseToGround(p) => Some(Formula::Single(p.index())),
            FaultType::PhasePair { first, second, .. } => {
                Some(Formula::Pair(first.index(), second.index()))
            }
            // Phases a and b stand in for the balanced three-phase case.
            FaultType::ThreePhase { .. } => Some(Formula::Pair(0, 1)),
            FaultType::Unrecognized(_) => None,
        }
    }

    /// Imaginary part of the fault-point voltage/current ratio for this class.
    ///
    /// # Errors
    ///
    /// Returns `LocatorError::UndefinedReactance` for an unrecognized code and
    /// `LocatorError::Numerical` if the current term is zero or the ratio is
    /// not finite.
    pub fn apparent_reactance(&self, vf: &Phasors, i_f: &Phasors) -> Result<f64> {
        let formula = self
            .formula()
            .ok_or_else(|| LocatorError::UndefinedReactance(self.code()))?;

        let (num, den): (Complex64, Complex64) = match formula {
            Formula::Single(p) => (vf[p], i_f[p]),
            Formula::Pair(p, q) => (vf[q] - vf[p], i_f[q] - i_f[p]),
        };

        let z = num / den;
        if den.norm() == 0.0 || !z.is_finite() {
            return Err(LocatorError::Numerical {
                quantity: format!("fault current term of `{}`", self.code()),
                value: den.norm(),
            });
        }
        Ok(z.im)
    }
}

#[derive(Debug, Clone, Copy)]
enum Formula {
    Single(usize),
    Pair(usize, usize),
}

/// Free-function form of [`FaultType::apparent_reactance`].
pub fn apparent_reactance(fault_type: &FaultType, vf: &Phasors, i_f: &Phasors) -> Result<f64> {
    fault_type.apparent_reactance(vf, i_f)
}

impl fmt::Display for FaultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

fn cyclic_pair(p: Phase, q: Phase) -> (Phase, Phase) {
    let (lo, hi) = if p < q { (p, q) } else { (q, p) };
    match (lo, hi) {
        (Phase::A, Phase::C) => (Phase::C, Phase::A),
        other => other,
    }
}

fn parse_nodes(code: &str) -> Option<FaultType> {
    let mut phases = Vec::new();
    let mut grounded = false;
    for node in code.split('.').skip(1) {
        let n: u8 = node.parse().ok()?;
        if n == 0 {
            grounded = true;
            continue;
        }
        let p = Phase::from_node(n)?;
        if phases.contains(&p) {
            return None;
        }
        phases.push(p);
    }
    phases.sort_unstable();
    FaultType::from_parts(&phases, grounded)
}

fn parse_letters(code: &str) -> Option<FaultType> {
    let mut phases = Vec::new();
    let mut grounded = false;
    for ch in code.chars() {
        let p = match ch {
            'a' => Phase::A,
            'b' => Phase::B,
            'c' => Phase::C,
            't' | 'g' if !grounded => {
                grounded = true;
                continue;
            }
            _ => return None,
        };
        if phases.contains(&p) {
            return None;
        }
        phases.push(p);
    }
    // The letter code for all three phases always names a fault to ground.
    if phases.len() == 3 {
        grounded = true;
    }
    phases.sort_unstable();
    FaultType::from_parts(&phases, grounded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn node_and_letter_codes_agree() {
        let pairs = [
            (".1.0", "at"),
            (".2.0", "bt"),
            (".3.0", "ct"),
            (".1.2", "ab"),
            (".2.3", "bc"),
            (".1.3", "ac"),
            (".1.2.0", "abt"),
            (".2.3.0", "bct"),
            (".1.3.0", "act"),
            (".1.2.3.0", "abct"),
        ];
        for (nodes, letters) in pairs {
            assert_eq!(FaultType::parse(nodes), FaultType::parse(letters), "{nodes}");
        }
        assert_eq!(FaultType::parse(".3.1"), FaultType::parse(".1.3"));
        assert_eq!(FaultType::parse("abc"), FaultType::ThreePhase { grounded: true });
        assert_eq!(FaultType::parse("abc"), FaultType::parse(".1.2.3.0"));
        assert_eq!(FaultType::parse(".1.2.3"), FaultType::ThreePhase { grounded: false });
    }

    #[test]
    fn unknown_codes_are_explicit() {
        for code in ["", "x", ".1", ".4.0", "aat", ".1.1.0"] {
            assert!(
                matches!(FaultType::parse(code), FaultType::Unrecognized(_)),
                "{code:?} should be unrecognized"
            );
        }
    }

    #[test]
    fn code_round_trips() {
        for code in [".1.0", ".2.3", ".1.3.0", ".1.2.3.0", ".1.2.3"] {
            assert_eq!(FaultType::parse(code).code(), code);
        }
    }

    #[test]
    fn single_phase_formula() {
        let vf = Phasors::new(c(0.0, 0.0), c(3.0, 4.0), c(0.0, 0.0));
        let i_f = Phasors::new(c(1.0, 0.0), c(1.0, 0.0), c(1.0, 0.0));
        let x = FaultType::PhaseToGround(Phase::B)
            .apparent_reactance(&vf, &i_f)
            .expect("defined");
        assert!((x - 4.0).abs() < 1e-12);
    }

    #[test]
    fn ca_pair_uses_a_minus_c() {
        let vf = Phasors::new(c(2.0, 6.0), c(0.0, 0.0), c(1.0, 1.0));
        let i_f = Phasors::new(c(2.0, 0.0), c(0.0, 0.0), c(1.0, 0.0));
        let x = FaultType::parse("ac")
            .apparent_reactance(&vf, &i_f)
            .expect("defined");
        // (vf[0]-vf[2]) / (if[0]-if[2]) = (1+5j)/1
        assert!((x - 5.0).abs() < 1e-12);
    }

    #[test]
    fn unrecognized_code_is_undefined_not_zero() {
        let vf = Phasors::from_element(c(1.0, 1.0));
        let i_f = Phasors::from_element(c(1.0, 0.0));
        let r = FaultType::parse("zz").apparent_reactance(&vf, &i_f);
        assert!(matches!(r, Err(LocatorError::UndefinedReactance(_))));
    }

    #[test]
    fn zero_current_term_is_numerical_error() {
        let vf = Phasors::from_element(c(1.0, 1.0));
        let i_f = Phasors::from_element(c(1.0, 0.0));
        let r = FaultType::parse("ab").apparent_reactance(&vf, &i_f);
        assert!(matches!(r, Err(LocatorError::Numerical { .. })));
    }

    #[test]
    fn pair_formula_is_invariant_under_phase_swap() {
        let mut rng = StdRng::seed_from_u64(7);
        let sample =
            |rng: &mut StdRng| c(rng.random_range(-1e3..1e3), rng.random_range(-1e3..1e3));
        for _ in 0..500 {
            let vf = Phasors::new(sample(&mut rng), sample(&mut rng), sample(&mut rng));
            let i_f = Phasors::new(sample(&mut rng), sample(&mut rng), sample(&mut rng));
            for (p, q) in [(Phase::A, Phase::B), (Phase::B, Phase::C), (Phase::C, Phase::A)] {
                let forward = FaultType::PhasePair {
                    first: p,
                    second: q,
                    grounded: false,
                }
                .apparent_reactance(&vf, &i_f);
                let swapped = FaultType::PhasePair {
                    first: q,
                    second: p,
                    grounded: false,
                }
                .apparent_reactance(&vf, &i_f);
                let (Ok(a), Ok(b)) = (forward, swapped) else {
                    continue;
                };
                assert!((a - b).abs() <= 1e-9 * a.abs().max(1.0));
            }
        }
    }

    #[test]
    fn diagnostic_phase_priority() {
        assert_eq!(FaultType::parse(".3.0").diagnostic_phase(), Some(Phase::C));
        assert_eq!(FaultType::parse(".2.3").diagnostic_phase(), Some(Phase::B));
        assert_eq!(FaultType::parse(".3.1.0").diagnostic_phase(), Some(Phase::A));
        assert_eq!(FaultType::parse(".1.2.3.0").diagnostic_phase(), Some(Phase::A));
        assert_eq!(FaultType::parse("??").diagnostic_phase(), None);
    }
}
