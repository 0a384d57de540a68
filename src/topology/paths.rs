//! Root-to-terminal candidate paths.

use std::collections::HashSet;

use crate::error::{LocatorError, Result};

use super::graph::{EdgeKind, TopologyGraph};

/// One hypothesis for where the fault lies: the line identifiers from the
/// substation to a terminal bus, in downstream order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePath {
    pub name: String,
    pub lines: Vec<String>,
}

/// Fixed, ordered set of candidate paths for a feeder.
#[derive(Debug, Clone, Default)]
pub struct PathSet {
    paths: Vec<CandidatePath>,
}

impl PathSet {
    pub fn new(paths: Vec<CandidatePath>) -> Self {
        Self { paths }
    }

    /// Wraps explicit line lists, naming them `ckt1`, `ckt2`, ...
    pub fn from_line_lists<I, L, S>(lists: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let paths = lists
            .into_iter()
            .enumerate()
            .map(|(i, lines)| CandidatePath {
                name: format!("ckt{}", i + 1),
                lines: lines.into_iter().map(Into::into).collect(),
            })
            .collect();
        Self { paths }
    }

    /// Enumerates every root-to-terminal path depth first, visiting children
    /// in insertion order. Regulator edges are left out of the line lists.
    ///
    /// # Errors
    ///
    /// Returns `LocatorError::Topology` if `root` is unknown.
    pub fn enumerate(graph: &TopologyGraph, root: &str) -> Result<Self> {
        let root_idx = graph
            .bus(root)
            .ok_or_else(|| LocatorError::Topology(format!("root bus `{root}` not in graph")))?;

        let mut found: Vec<Vec<String>> = Vec::new();
        let mut stack = vec![(root_idx, Vec::<String>::new(), 0usize)];
        let limit = graph.edge_count();

        while let Some((bus, lines, depth)) = stack.pop() {
            let children = graph.outgoing(bus);
            if children.is_empty() || depth > limit {
                if !lines.is_empty() {
                    found.push(lines);
                }
                continue;
            }
            for &e in children.iter().rev() {
                let Some(next) = graph.target(e) else {
                    continue;
                };
                let edge = graph.edge_data(e);
                let mut extended = lines.clone();
                if edge.kind == EdgeKind::Line {
                    extended.push(edge.id.clone());
                }
                stack.push((next, extended, depth + 1));
            }
        }

        Ok(Self::from_line_lists(found))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CandidatePath> {
        self.paths.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CandidatePath> {
        self.paths.iter()
    }

    /// Line edges of `graph` that appear on no candidate path.
    pub fn uncovered_lines(&self, graph: &TopologyGraph) -> Vec<String> {
        let on_paths: HashSet<&str> = self
            .paths
            .iter()
            .flat_map(|p| p.lines.iter().map(String::as_str))
            .collect();
        graph
            .edges_ordered()
            .into_iter()
            .map(|e| graph.edge_data(e))
            .filter(|e| e.kind == EdgeKind::Line && !on_paths.contains(e.id.as_str()))
            .map(|e| e.id.clone())
            .collect()
    }

    /// Fails if any line of `graph` is on no candidate path.
    ///
    /// # Errors
    ///
    /// Returns `LocatorError::Topology` naming the uncovered lines.
    pub fn check_coverage(&self, graph: &TopologyGraph) -> Result<()> {
        let missing = self.uncovered_lines(graph);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(LocatorError::Topology(format!(
                "lines on no candidate path: {}",
                missing.join(", ")
            )))
        }
    }
}

/// Enumerates every root-to-terminal path of `graph`.
pub fn enumerate_paths(graph: &TopologyGraph, root: &str) -> Result<PathSet> {
    PathSet::enumerate(graph, root)
}
