//! Directed bus/edge graph of a radial feeder.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::error::{LocatorError, Result};
use crate::network::CircuitModel;

/// What a graph edge represents in the circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// A line segment with impedance data in the line table.
    Line,
    /// A series voltage regulator; carries no line data.
    Regulator,
}

/// Edge payload: the element identifier and its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeederEdge {
    pub id: String,
    pub kind: EdgeKind,
}

/// Directed graph of buses and series elements, rooted at the substation.
///
/// Edge iteration follows bus insertion order, then edge insertion order
/// within each bus, so every derived listing is deterministic.
#[derive(Debug, Clone, Default)]
pub struct TopologyGraph {
    graph: DiGraph<String, FeederEdge>,
    buses: HashMap<String, NodeIndex>,
    edges: HashMap<String, EdgeIndex>,
}

impl TopologyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph from `(from_bus, to_bus, id, kind)` tuples.
    ///
    /// # Errors
    ///
    /// Returns `LocatorError::Topology` if an identifier repeats.
    pub fn from_edges<'a, I>(edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str, &'a str, EdgeKind)>,
    {
        let mut g = Self::new();
        for (from, to, id, kind) in edges {
            g.add_edge(from, to, id, kind)?;
        }
        Ok(g)
    }

    /// Builds the graph from a circuit model's lines followed by its series
    /// regulators.
    pub fn from_model(model: &impl CircuitModel) -> Result<Self> {
        let mut g = Self::new();
        for line in model.lines()? {
            g.add_edge(&line.bus1, &line.bus2, &line.name, EdgeKind::Line)?;
        }
        for reg in model.series_elements() {
            g.add_edge(&reg.bus1, &reg.bus2, &reg.name, EdgeKind::Regulator)?;
        }
        Ok(g)
    }

    /// Adds a directed edge, creating its buses on first use.
    pub fn add_edge(&mut self, from: &str, to: &str, id: &str, kind: EdgeKind) -> Result<()> {
        if self.edges.contains_key(id) {
            return Err(LocatorError::Topology(format!("duplicate edge `{id}`")));
        }
        let a = self.ensure_bus(from);
        let b = self.ensure_bus(to);
        let e = self.graph.add_edge(
            a,
            b,
            FeederEdge {
                id: id.to_string(),
                kind,
            },
        );
        self.edges.insert(id.to_string(), e);
        Ok(())
    }

    fn ensure_bus(&mut self, name: &str) -> NodeIndex {
        if let Some(&n) = self.buses.get(name) {
            return n;
        }
        let n = self.graph.add_node(name.to_string());
        self.buses.insert(name.to_string(), n);
        n
    }

    pub fn bus(&self, name: &str) -> Option<NodeIndex> {
        self.buses.get(name).copied()
    }

    pub fn bus_name(&self, node: NodeIndex) -> &str {
        &self.graph[node]
    }

    pub fn edge(&self, id: &str) -> Option<EdgeIndex> {
        self.edges.get(id).copied()
    }

    pub fn edge_data(&self, edge: EdgeIndex) -> &FeederEdge {
        &self.graph[edge]
    }

    /// Upstream and downstream bus names of an edge.
    pub fn endpoints(&self, edge: EdgeIndex) -> Option<(&str, &str)> {
        self.graph
            .edge_endpoints(edge)
            .map(|(a, b)| (self.bus_name(a), self.bus_name(b)))
    }

    pub fn target(&self, edge: EdgeIndex) -> Option<NodeIndex> {
        self.graph.edge_endpoints(edge).map(|(_, b)| b)
    }

    pub fn bus_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn out_degree(&self, node: NodeIndex) -> usize {
        self.graph.edges_directed(node, Direction::Outgoing).count()
    }

    /// Outgoing edges of a bus in insertion order.
    pub fn outgoing(&self, node: NodeIndex) -> Vec<EdgeIndex> {
        let mut out: Vec<EdgeIndex> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|e| e.id())
            .collect();
        out.sort_unstable();
        out
    }

    /// Buses in insertion order.
    pub fn buses(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// All edges, grouped by upstream bus in bus insertion order.
    pub fn edges_ordered(&self) -> Vec<EdgeIndex> {
        self.buses().flat_map(|n| self.outgoing(n)).collect()
    }

    /// Checks that the graph is a tree hanging from `root`: no cycles, no edge
    /// into the root, and at most one feeding edge per bus.
    ///
    /// # Errors
    ///
    /// Returns `LocatorError::Topology` describing the first violation.
    pub fn check_radial(&self, root: &str) -> Result<()> {
        let root_idx = self
            .bus(root)
            .ok_or_else(|| LocatorError::Topology(format!("root bus `{root}` not in graph")))?;
        if is_cyclic_directed(&self.graph) {
            return Err(LocatorError::Topology("graph contains a cycle".into()));
        }
        for node in self.buses() {
            let feeding = self.graph.edges_directed(node, Direction::Incoming).count();
            if node == root_idx && feeding > 0 {
                return Err(LocatorError::Topology(format!(
                    "root bus `{root}` has a feeding edge"
                )));
            }
            if feeding > 1 {
                return Err(LocatorError::Topology(format!(
                    "bus `{}` is fed by {feeding} edges",
                    self.bus_name(node)
                )));
            }
        }
        Ok(())
    }
}
