//! Per-country topic graph construction.

use std::collections::HashSet;

use papertrail_core::inputs::require_countries;
use papertrail_core::{Error, Pass, PipelineConfig, QueryFailure, Result};
use papertrail_fetch::query::{base_topic_filter, PARAM_PER_PAGE, WORKS};
use papertrail_fetch::CatalogClient;
use tracing::{debug, error, info, warn};

use crate::graph::GraphBackend;
use crate::taxonomy::TaxonomyCache;
use crate::types::{ConceptEdge, ConceptNode, CountryGraph, TopicGraphs};

/// Builds one two-level graph per country from a discovered taxonomy.
///
/// Each node count is a country-scoped query over the whole year range,
/// conjoined with the base topic predicate.
pub struct TopicGraphBuilder<'a> {
    client: &'a CatalogClient,
    config: &'a PipelineConfig,
    taxonomy: TaxonomyCache,
}

impl<'a> TopicGraphBuilder<'a> {
    pub fn new(client: &'a CatalogClient, config: &'a PipelineConfig) -> Self {
        Self {
            client,
            config,
            taxonomy: TaxonomyCache::new(),
        }
    }

    pub fn taxonomy(&self) -> &TaxonomyCache {
        &self.taxonomy
    }

    /// Build graphs for `countries`, in order.
    ///
    /// Fails up front on an empty country list or a taxonomy discovery
    /// failure. A country whose counts cannot be fetched is recorded as a
    /// failure and left out; the others are still built.
    pub async fn build(&self, countries: &[String]) -> Result<TopicGraphs> {
        require_countries(countries, "topic graph input")?;
        self.taxonomy.populate(self.client, self.config).await?;

        info!(
            "Building topic graphs for {} countries ({} topics)",
            countries.len(),
            self.config.main_topics.len()
        );

        let mut out = TopicGraphs::default();
        for country in countries {
            match self.build_country(country).await {
                Ok(graph) => {
                    out.graphs.insert(country.clone(), graph);
                }
                Err(e) => {
                    error!("Topic graph for {} failed: {}", country, e);
                    out.failures
                        .push(QueryFailure::new(Pass::TopicGraph, &e).with_country(country.clone()));
                }
            }
        }

        info!(
            "Topic graphs complete: {} built, {} failed",
            out.graphs.len(),
            out.failures.len()
        );
        Ok(out)
    }

    /// One country's graph. Requires the taxonomy to be populated.
    pub async fn build_country(&self, country: &str) -> Result<CountryGraph> {
        let main_labels: HashSet<&str> = self
            .config
            .main_topics
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        let mut graph = CountryGraph::default();

        for topic in &self.config.main_topics {
            let children = self.taxonomy.get(&topic.id).ok_or_else(|| {
                Error::MissingUpstreamInput(format!("taxonomy for {} was not discovered", topic.name))
            })?;

            let main_count = self.count(country, &topic.id).await?;
            graph.nodes.push(ConceptNode::main(topic.name.clone(), main_count));

            for child in children {
                let label = child.display_name;
                if main_labels.contains(label.as_str()) || graph.has_node(&label) {
                    warn!(
                        "{}: skipping child {:?} of {}, label already in graph",
                        country, label, topic.name
                    );
                    continue;
                }
                let count = self.count(country, &child.external_id).await?;
                graph.edges.push(ConceptEdge {
                    source: topic.name.clone(),
                    target: label.clone(),
                });
                graph
                    .nodes
                    .push(ConceptNode::sub(label, topic.name.clone(), count, child.external_id));
            }
        }

        let stats = GraphBackend::load(country, &graph)?.stats();
        debug!(
            "{}: {} main, {} sub, {} edges",
            country, stats.main_nodes, stats.sub_nodes, stats.edge_count
        );
        Ok(graph)
    }

    /// Works for one concept in one country over the configured years.
    async fn count(&self, country: &str, concept_id: &str) -> Result<u64> {
        let filter = base_topic_filter(self.config)
            .concept(concept_id)
            .country(country)
            .year_span(self.config.start_year, self.config.end_year);
        self.client
            .perform(WORKS, &filter, &[(PARAM_PER_PAGE, "1".to_string())])
            .await?
            .count()
    }
}
