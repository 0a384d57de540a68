//! Impedance-based fault location for radial distribution feeders.
//!
//! Given substation phasors captured during a fault and per-lateral current
//! magnitudes, the locator sweeps every candidate path for the point where
//! the apparent fault reactance vanishes, then picks the lateral whose sensor
//! saw the largest current.

pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod feeders;
pub mod io;
pub mod locate;
pub mod network;
pub mod phasor;
pub mod record;
pub mod report;
/// Bus graph, sensor partition, and candidate paths.
pub mod topology;
