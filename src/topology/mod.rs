//! Feeder topology: bus graph, sensor resolution, and candidate paths.

/// Directed bus/edge graph.
pub mod graph;
/// Root-to-terminal path enumeration.
pub mod paths;
/// Branch-free segment partition and sensor lookup.
pub mod sensor;

pub use graph::{EdgeKind, FeederEdge, TopologyGraph};
pub use paths::{CandidatePath, PathSet, enumerate_paths};
pub use sensor::{SensorAssignment, SensorMap};
