//! petgraph view of a country graph, used to check its structure.

use std::collections::HashMap;

use papertrail_core::{Error, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::types::{ConceptEdge, ConceptNode, CountryGraph, NodeKind};

/// Directed graph of one country's topics, indexed by node id.
pub struct GraphBackend {
    graph: DiGraph<ConceptNode, ConceptEdge>,
    node_index: HashMap<String, NodeIndex>,
}

impl GraphBackend {
    /// Load and check a country graph.
    ///
    /// Rejects duplicate node ids, a `parent` that disagrees with the node
    /// kind or does not name a main topic, and edges whose endpoints do not
    /// resolve or do not follow the declared parent.
    pub fn load(country: &str, source: &CountryGraph) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidGraph {
            country: country.to_string(),
            reason,
        };

        let mut graph = DiGraph::with_capacity(source.nodes.len(), source.edges.len());
        let mut node_index = HashMap::with_capacity(source.nodes.len());
        for node in &source.nodes {
            if node_index.contains_key(&node.id) {
                return Err(invalid(format!("duplicate node {:?}", node.id)));
            }
            let idx = graph.add_node(node.clone());
            node_index.insert(node.id.clone(), idx);
        }

        for node in &source.nodes {
            match (node.kind, node.parent.as_deref()) {
                (NodeKind::Main, None) => {}
                (NodeKind::Sub, Some(parent)) => {
                    let is_main = node_index
                        .get(parent)
                        .map(|&idx| graph[idx].kind == NodeKind::Main)
                        .unwrap_or(false);
                    if !is_main {
                        return Err(invalid(format!(
                            "{:?} names {:?} as parent, which is not a main topic",
                            node.id, parent
                        )));
                    }
                }
                (NodeKind::Main, Some(_)) => {
                    return Err(invalid(format!("main topic {:?} has a parent", node.id)));
                }
                (NodeKind::Sub, None) => {
                    return Err(invalid(format!("child {:?} has no parent", node.id)));
                }
            }
        }

        for edge in &source.edges {
            let (Some(&from), Some(&to)) =
                (node_index.get(&edge.source), node_index.get(&edge.target))
            else {
                return Err(invalid(format!(
                    "edge {:?} -> {:?} has an unresolved endpoint",
                    edge.source, edge.target
                )));
            };
            if graph[to].parent.as_deref() != Some(edge.source.as_str()) {
                return Err(invalid(format!(
                    "edge {:?} -> {:?} does not follow the declared parent",
                    edge.source, edge.target
                )));
            }
            graph.add_edge(from, to, edge.clone());
        }

        Ok(Self { graph, node_index })
    }

    /// Get graph statistics.
    pub fn stats(&self) -> GraphStats {
        let main_nodes = self
            .graph
            .node_weights()
            .filter(|n| n.kind == NodeKind::Main)
            .count();
        GraphStats {
            node_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            main_nodes,
            sub_nodes: self.graph.node_count() - main_nodes,
        }
    }

    /// Children reached from `id` by an edge, in insertion order.
    #[cfg(test)]
    pub fn children(&self, id: &str) -> Vec<&ConceptNode> {
        let Some(&idx) = self.node_index.get(id) else {
            return Vec::new();
        };
        let mut children: Vec<(NodeIndex, &ConceptNode)> = self
            .graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .map(|n| (n, &self.graph[n]))
            .collect();
        children.sort_by_key(|(n, _)| n.index());
        children.into_iter().map(|(_, node)| node).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub main_nodes: usize,
    pub sub_nodes: usize,
}
