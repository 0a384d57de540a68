//! Fault classification, per-path distance estimation, and branch selection.

pub mod estimator;
pub mod fault_type;
pub mod filter;

pub use estimator::{Confidence, Estimate, PathModel, PrefaultState, SweepSettings, estimate};
pub use fault_type::{FaultType, apparent_reactance};
pub use filter::{Reliability, Selection, select_true_branch};
