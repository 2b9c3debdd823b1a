//! Orchestrator: sequences the passes of one run.

use papertrail_aggregate::{CountryYearAggregator, SubfieldAggregator};
use papertrail_analysis::{ranked_countries, top_k_per_year, TrendAnalyzer};
use papertrail_core::{Pass, PipelineConfig, QueryFailure, Result};
use papertrail_fetch::CatalogClient;
use papertrail_graph::{TopicGraphBuilder, TopicGraphs};
use tracing::{error, info, warn};

use crate::types::SweepReport;

/// Owns the config and the one catalog client shared by every pass.
pub struct Orchestrator {
    config: PipelineConfig,
    client: CatalogClient,
}

impl Orchestrator {
    /// Create an orchestrator with a live HTTP client.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let client = CatalogClient::new(&config)?;
        Ok(Self::with_client(config, client))
    }

    /// Create with a prebuilt client (for testing).
    pub fn with_client(config: PipelineConfig, client: CatalogClient) -> Self {
        info!(
            "Orchestrator initialized: years={}..={}, subfields={}, topics={}",
            config.start_year,
            config.end_year,
            config.subfields.len(),
            config.main_topics.len()
        );
        Self { config, client }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn client(&self) -> &CatalogClient {
        &self.client
    }

    /// Full run: country-year sweep, summary and rankings, subfield sweep,
    /// then topic graphs for the top-ranked countries.
    ///
    /// Failed queries are collected in the report. A summary that cannot be
    /// computed, or a graph pass that cannot start (no ranked countries,
    /// taxonomy discovery failed), is recorded as one failure without a
    /// country; everything collected so far is kept.
    pub async fn run(&self) -> SweepReport {
        let mut report = SweepReport {
            started_at: chrono::Utc::now().to_rfc3339(),
            ..Default::default()
        };

        let country_year = CountryYearAggregator::new(&self.client, &self.config)
            .run()
            .await;
        report.failures.extend(country_year.failures);
        report.country_year = country_year.records;

        match TrendAnalyzer::summarize(
            &report.country_year,
            self.config.start_year,
            self.config.end_year,
        ) {
            Ok(summary) => report.summary = summary,
            Err(e) => {
                error!("Trend summary failed: {}", e);
                report.failures.push(QueryFailure::new(Pass::Summary, &e));
            }
        }
        report.top_per_year = top_k_per_year(&report.country_year, self.config.top_k_per_year);

        let subfield = SubfieldAggregator::new(&self.client, &self.config)
            .run()
            .await;
        report.failures.extend(subfield.failures);
        report.subfield_year = subfield.records;

        let countries = ranked_countries(&report.summary, self.config.graph_countries);
        match self.graphs(&countries).await {
            Ok(graphs) => {
                report.failures.extend(graphs.failures);
                report.topic_graphs = graphs.graphs;
            }
            Err(e) => {
                error!("Topic graph pass aborted: {}", e);
                report.failures.push(QueryFailure::new(Pass::TopicGraph, &e));
            }
        }

        report.finished_at = chrono::Utc::now().to_rfc3339();
        if report.is_complete() {
            info!(
                "Run complete: {} country-year records, {} countries, {} graphs",
                report.country_year.len(),
                report.summary.len(),
                report.topic_graphs.len()
            );
        } else {
            warn!(
                "Run finished with {} failures (country-year {}, summary {}, subfield {}, graph {})",
                report.failures.len(),
                report.failures_in(Pass::CountryYear),
                report.failures_in(Pass::Summary),
                report.failures_in(Pass::Subfield),
                report.failures_in(Pass::TopicGraph)
            );
        }
        report
    }

    /// Graph pass only, over an explicit ranked country list.
    pub async fn graphs(&self, countries: &[String]) -> Result<TopicGraphs> {
        TopicGraphBuilder::new(&self.client, &self.config)
            .build(countries)
            .await
    }
}
