//! Catalog response model.
//!
//! The catalog answers in one of three shapes: a single count
//! (`{meta:{count}}`), counts per distinct value (`{group_by:[...]}`), or an
//! entity listing (`{results:[...]}`). One struct deserializes all of them;
//! the accessors fail instead of defaulting when a shape is absent.

use papertrail_core::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogResponse {
    #[serde(default)]
    pub meta: Option<Meta>,
    #[serde(default)]
    pub group_by: Option<Vec<GroupEntry>>,
    #[serde(default)]
    pub results: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub count: Option<u64>,
}

/// One bucket of a grouped count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEntry {
    /// Raw grouping key; `null` when the catalog could not attribute it.
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub key_display_name: Option<String>,
    pub count: u64,
}

/// A concept entity from the `concepts` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptEntity {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub works_count: u64,
    #[serde(default)]
    pub level: Option<u32>,
}

impl CatalogResponse {
    /// Single-count shape.
    pub fn count(&self) -> Result<u64> {
        self.meta
            .as_ref()
            .and_then(|m| m.count)
            .ok_or_else(|| Error::UnexpectedResponse("missing meta.count".into()))
    }

    /// Grouped-count shape. An empty list is a valid answer.
    pub fn groups(&self) -> Result<&[GroupEntry]> {
        self.group_by
            .as_deref()
            .ok_or_else(|| Error::UnexpectedResponse("missing group_by".into()))
    }

    /// Listing shape, read as concept entities.
    pub fn concepts(&self) -> Result<Vec<ConceptEntity>> {
        let results = self
            .results
            .as_ref()
            .ok_or_else(|| Error::UnexpectedResponse("missing results".into()))?;
        results
            .iter()
            .map(|r| serde_json::from_value(r.clone()).map_err(Error::from))
            .collect()
    }
}
