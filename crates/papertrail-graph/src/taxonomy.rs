//! Child-concept discovery and the per-run taxonomy cache.
//!
//! Discovery is country-independent: each top-level topic is looked up once,
//! ranked by `works_count`, trimmed to the top K, and reused for every
//! country.

use std::collections::HashMap;

use papertrail_core::{NamedConcept, PipelineConfig, Result};
use papertrail_fetch::query::{ANCESTORS_ID, CONCEPTS, PARAM_PER_PAGE};
use papertrail_fetch::{CatalogClient, Filter};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::types::ChildConcept;

const ENTITY_URL_PREFIX: &str = "https://openalex.org/";

/// Children per top-level topic id, filled once per run.
pub struct TaxonomyCache {
    inner: Mutex<HashMap<String, Vec<ChildConcept>>>,
}

impl TaxonomyCache {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Cached children of a topic. Returns None if not discovered yet.
    pub fn get(&self, topic_id: &str) -> Option<Vec<ChildConcept>> {
        self.inner.lock().get(topic_id).cloned()
    }

    pub fn put(&self, topic_id: impl Into<String>, children: Vec<ChildConcept>) {
        self.inner.lock().insert(topic_id.into(), children);
    }

    /// Number of topics cached.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discover every configured topic that is not cached yet.
    ///
    /// Any discovery failure is returned; topics discovered before it stay
    /// cached.
    pub async fn populate(&self, client: &CatalogClient, config: &PipelineConfig) -> Result<()> {
        for topic in &config.main_topics {
            if self.inner.lock().contains_key(&topic.id) {
                continue;
            }
            let children = discover_children(
                client,
                topic,
                config.children_per_topic,
                config.listing_page_size,
            )
            .await?;
            self.put(topic.id.clone(), children);
        }
        info!("Taxonomy ready: {} topics cached", self.len());
        Ok(())
    }
}

impl Default for TaxonomyCache {
    fn default() -> Self {
        Self::new()
    }
}

/// The `top_k` most-cited descendants of `topic`, by `works_count`.
///
/// Concepts without works are dropped; repeated display names keep only the
/// first (largest) occurrence.
pub async fn discover_children(
    client: &CatalogClient,
    topic: &NamedConcept,
    top_k: usize,
    page_size: u32,
) -> Result<Vec<ChildConcept>> {
    let filter = Filter::new().and(ANCESTORS_ID, &topic.id);
    let response = client
        .perform(CONCEPTS, &filter, &[(PARAM_PER_PAGE, page_size.to_string())])
        .await?;

    let mut concepts = response.concepts()?;
    concepts.retain(|c| c.works_count > 0);
    concepts.sort_by(|a, b| b.works_count.cmp(&a.works_count));

    let mut children: Vec<ChildConcept> = Vec::with_capacity(top_k);
    for concept in concepts {
        if children.len() == top_k {
            break;
        }
        if children.iter().any(|c| c.display_name == concept.display_name) {
            continue;
        }
        children.push(ChildConcept {
            external_id: short_id(&concept.id),
            display_name: concept.display_name,
            works_count: concept.works_count,
        });
    }

    debug!(
        "{}: kept {} children",
        topic.name,
        children.len()
    );
    Ok(children)
}

fn short_id(id: &str) -> String {
    id.strip_prefix(ENTITY_URL_PREFIX).unwrap_or(id).to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use papertrail_fetch::transport::query_value;
    use papertrail_fetch::{RawResponse, StubTransport, VirtualClock};

    const LISTING: &str = r#"{"results": [
        {"id": "https://openalex.org/C3", "display_name": "Feature extraction", "works_count": 300},
        {"id": "https://openalex.org/C1", "display_name": "Object detection", "works_count": 900},
        {"id": "https://openalex.org/C9", "display_name": "Unused", "works_count": 0},
        {"id": "https://openalex.org/C2", "display_name": "Segmentation", "works_count": 500},
        {"id": "https://openalex.org/C4", "display_name": "Object detection", "works_count": 100}
    ]}"#;

    fn config() -> PipelineConfig {
        PipelineConfig {
            mailto: "team@example.org".into(),
            main_topics: vec![
                NamedConcept::new("Computer Vision", "C121332964"),
                NamedConcept::new("Robotics", "C15744967"),
            ],
            ..Default::default()
        }
    }

    fn client(stub: Arc<StubTransport>) -> CatalogClient {
        CatalogClient::with_parts(&config(), stub, Arc::new(VirtualClock::new()))
    }

    #[tokio::test]
    async fn test_discover_ranks_and_trims() {
        let stub = Arc::new(StubTransport::new(|_, _| Ok(RawResponse::ok(LISTING))));
        let client = client(stub.clone());

        let topic = NamedConcept::new("Computer Vision", "C121332964");
        let children = discover_children(&client, &topic, 2, 200).await.unwrap();

        assert_eq!(
            children,
            vec![
                ChildConcept {
                    external_id: "C1".into(),
                    display_name: "Object detection".into(),
                    works_count: 900,
                },
                ChildConcept {
                    external_id: "C2".into(),
                    display_name: "Segmentation".into(),
                    works_count: 500,
                },
            ]
        );

        let (url, query) = &stub.calls()[0];
        assert!(url.ends_with("/concepts"));
        assert_eq!(query_value(query, "filter"), Some("ancestors.id:C121332964"));
    }

    #[tokio::test]
    async fn test_discover_drops_zero_and_duplicate_names() {
        let stub = Arc::new(StubTransport::new(|_, _| Ok(RawResponse::ok(LISTING))));
        let client = client(stub);

        let topic = NamedConcept::new("Computer Vision", "C121332964");
        let children = discover_children(&client, &topic, 10, 200).await.unwrap();
        let names: Vec<&str> = children.iter().map(|c| c.display_name.as_str()).collect();
        assert_eq!(names, vec!["Object detection", "Segmentation", "Feature extraction"]);
    }

    #[tokio::test]
    async fn test_populate_fetches_each_topic_once() {
        let stub = Arc::new(StubTransport::new(|_, _| Ok(RawResponse::ok(LISTING))));
        let client = client(stub.clone());
        let cache = TaxonomyCache::new();

        cache.populate(&client, &config()).await.unwrap();
        cache.populate(&client, &config()).await.unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(stub.call_count(), 2);
        assert!(cache.get("C15744967").is_some());
        assert!(cache.get("C999").is_none());
    }

    #[tokio::test]
    async fn test_populate_surfaces_failure() {
        let stub = Arc::new(StubTransport::new(|_, _| Ok(RawResponse::status(500))));
        let client = client(stub);
        let cache = TaxonomyCache::new();

        assert!(cache.populate(&client, &config()).await.is_err());
        assert!(cache.is_empty());
    }
}
