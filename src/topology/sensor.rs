//! Branch-free segment partition and line-to-sensor resolution.
//!
//! A segment starts at the root or right below a bus with more than one
//! outgoing edge and follows the single-successor chain until the next
//! branching or terminal bus. The first edge of a segment is the sensor for
//! every edge inside it.

use std::collections::HashMap;

use petgraph::graph::EdgeIndex;

use crate::error::{LocatorError, Result};

use super::graph::TopologyGraph;

/// Result of resolving a line to its governing sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorAssignment {
    /// `(upstream bus, downstream bus)` of the segment's first edge.
    pub upstream_edge: (String, String),
    /// Identifier of the segment's first edge.
    pub sensor: String,
}

/// Precomputed partition of a graph into branch-free segments.
///
/// The graph is immutable for a run, so the partition is built once and
/// lookups are table reads.
#[derive(Debug, Clone)]
pub struct SensorMap {
    /// One assignment per maximal branch-free run of edges.
    segments: Vec<SensorAssignment>,
    by_edge: HashMap<String, usize>,
    sensors: Vec<String>,
}

impl SensorMap {
    /// Partitions `graph` into segments starting from `root`.
    ///
    /// # Errors
    ///
    /// Returns `LocatorError::Topology` if `root` is not a bus of the graph.
    pub fn build(graph: &TopologyGraph, root: &str) -> Result<Self> {
        let root_idx = graph
            .bus(root)
            .ok_or_else(|| LocatorError::Topology(format!("root bus `{root}` not in graph")))?;

        let mut segments = Vec::new();
        let mut by_edge = HashMap::new();

        for node in graph.buses() {
            let outgoing = graph.outgoing(node);
            if outgoing.len() <= 1 && node != root_idx {
                continue;
            }
            for first in outgoing {
                let edges = follow_chain(graph, first);
                let (up, down) = graph.endpoints(first).unwrap_or_default();
                let first_id = graph.edge_data(first).id.clone();
                let index = segments.len();
                for &e in &edges {
                    by_edge
                        .entry(graph.edge_data(e).id.clone())
                        .or_insert(index);
                }
                segments.push(SensorAssignment {
                    upstream_edge: (up.to_string(), down.to_string()),
                    sensor: first_id,
                });
            }
        }

        let mut sensors: Vec<String> = Vec::new();
        for e in graph.edges_ordered() {
            let Some(&seg) = by_edge.get(&graph.edge_data(e).id) else {
                continue;
            };
            let sensor = &segments[seg].sensor;
            if !sensors.contains(sensor) {
                sensors.push(sensor.clone());
            }
        }

        Ok(Self {
            segments,
            by_edge,
            sensors,
        })
    }

    /// Returns the upstream edge and sensor of the segment containing `line_id`.
    ///
    /// # Errors
    ///
    /// Returns `LocatorError::UnknownLine` if the line is not part of any
    /// segment reachable from the root.
    pub fn resolve_sensor(&self, line_id: &str) -> Result<&SensorAssignment> {
        self.by_edge
            .get(line_id)
            .map(|&i| &self.segments[i])
            .ok_or_else(|| LocatorError::UnknownLine(line_id.to_string()))
    }

    /// Sensor identifier for a line, if the line is known.
    pub fn sensor_of(&self, line_id: &str) -> Option<&str> {
        self.by_edge
            .get(line_id)
            .map(|&i| self.segments[i].sensor.as_str())
    }

    /// Canonical, deduplicated sensor list in graph edge order.
    pub fn list_sensors(&self) -> &[String] {
        &self.sensors
    }

    /// Number of edges covered by the partition.
    pub fn covered_edges(&self) -> usize {
        self.by_edge.len()
    }
}

/// Collects `first` and every following edge while the reached bus has
/// exactly one successor.
fn follow_chain(graph: &TopologyGraph, first: EdgeIndex) -> Vec<EdgeIndex> {
    let mut chain = vec![first];
    let mut current = first;
    // A chain can never be longer than the graph; the bound stops cycles.
    while chain.len() <= graph.edge_count() {
        let Some(bus) = graph.target(current) else {
            break;
        };
        let next = graph.outgoing(bus);
        if next.len() != 1 {
            break;
        }
        current = next[0];
        chain.push(current);
    }
    chain
}
