//! Post-hoc accuracy summary of a batch.

use std::fmt;

use crate::batch::BatchResult;

/// Aggregate accuracy indicators derived from a complete batch.
///
/// Computed from the outcomes after the run so the printed figures always
/// agree with the exported tables.
#[derive(Debug, Clone, PartialEq)]
pub struct AccuracyReport {
    /// Records read and processed.
    pub records: usize,
    /// Records with at least one failure.
    pub failed: usize,
    /// Records that produced a branch selection.
    pub selected: usize,
    /// Share of scored records whose selected sensor governs the true line (0-100).
    pub branch_hit_pct: f64,
    /// Mean absolute percentage error against the reference lateral.
    pub mean_abs_error_pct: f64,
    /// Largest absolute percentage error.
    pub max_abs_error_pct: f64,
    /// Selections flagged as tie, all-zero, or fallback-only.
    pub low_confidence: usize,
    /// Sweep steps skipped on a singular downstream impedance, all paths.
    pub skipped_steps: usize,
}

impl AccuracyReport {
    /// Computes the report; records without ground truth count toward
    /// `records` and `selected` only.
    pub fn from_batch(result: &BatchResult) -> Self {
        let mut selected = 0usize;
        let mut hits = 0usize;
        let mut scored = 0usize;
        let mut abs_sum = 0.0_f64;
        let mut abs_max = 0.0_f64;
        let mut errors = 0usize;
        let mut low = 0usize;
        let mut skipped = 0usize;

        for o in &result.outcomes {
            if o.selection.is_some() {
                selected += 1;
            }
            if o.is_low_confidence() {
                low += 1;
            }
            skipped += o.skipped_steps();
            if let Some(hit) = o.branch_hit {
                scored += 1;
                if hit {
                    hits += 1;
                }
            }
            if let Some(e) = o.error_pct {
                abs_sum += e.abs();
                abs_max = abs_max.max(e.abs());
                errors += 1;
            }
        }

        Self {
            records: result.outcomes.len(),
            failed: result.failed_records(),
            selected,
            branch_hit_pct: if scored > 0 {
                100.0 * hits as f64 / scored as f64
            } else {
                0.0
            },
            mean_abs_error_pct: if errors > 0 {
                abs_sum / errors as f64
            } else {
                0.0
            },
            max_abs_error_pct: abs_max,
            low_confidence: low,
            skipped_steps: skipped,
        }
    }
}

impl fmt::Display for AccuracyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Accuracy Report ---")?;
        writeln!(f, "Records processed:     {}", self.records)?;
        writeln!(f, "Records failed:        {}", self.failed)?;
        writeln!(f, "Branches selected:     {}", self.selected)?;
        writeln!(f, "Branch hit rate:       {:.1}%", self.branch_hit_pct)?;
        writeln!(f, "Mean |error|:          {:.3}%", self.mean_abs_error_pct)?;
        writeln!(f, "Max |error|:           {:.3}%", self.max_abs_error_pct)?;
        writeln!(f, "Low-confidence picks:  {}", self.low_confidence)?;
        write!(f, "Sweep steps skipped:   {}", self.skipped_steps)
    }
}
