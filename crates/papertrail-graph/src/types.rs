//! Node-link graph types, shaped for the visualization layer.

use std::collections::BTreeMap;

use papertrail_core::QueryFailure;
use serde::{Deserialize, Serialize};

/// Level of a node in the two-level graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Main,
    Sub,
}

/// A topic or child concept with its per-country count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptNode {
    /// Display label; unique within one country's graph.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Set iff `kind` is `Sub`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub count: u64,
    #[serde(rename = "concept_id", skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

impl ConceptNode {
    pub fn main(label: impl Into<String>, count: u64) -> Self {
        Self {
            id: label.into(),
            kind: NodeKind::Main,
            parent: None,
            count,
            external_id: None,
        }
    }

    pub fn sub(
        label: impl Into<String>,
        parent: impl Into<String>,
        count: u64,
        external_id: impl Into<String>,
    ) -> Self {
        Self {
            id: label.into(),
            kind: NodeKind::Sub,
            parent: Some(parent.into()),
            count,
            external_id: Some(external_id.into()),
        }
    }
}

/// Main topic → child concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptEdge {
    pub source: String,
    pub target: String,
}

/// One country's nodes and edges, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryGraph {
    pub nodes: Vec<ConceptNode>,
    #[serde(rename = "links")]
    pub edges: Vec<ConceptEdge>,
}

impl CountryGraph {
    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    pub fn count_kind(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|n| n.kind == kind).count()
    }
}

/// A discovered child of a top-level topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildConcept {
    /// Short catalog id (`C...`), URL prefix stripped.
    pub external_id: String,
    pub display_name: String,
    pub works_count: u64,
}

/// Output of a graph pass: graphs that completed, and countries that failed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicGraphs {
    pub graphs: BTreeMap<String, CountryGraph>,
    pub failures: Vec<QueryFailure>,
}
