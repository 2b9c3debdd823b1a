//! Subfield × year sweep.

use papertrail_core::{
    country_display_name, Aggregation, NamedConcept, Pass, PipelineConfig, QueryFailure, Result,
    SubfieldCountRecord,
};
use papertrail_fetch::query::base_topic_filter;
use papertrail_fetch::CatalogClient;
use tracing::{debug, error, info};

use crate::grouped::fetch_country_groups;

/// One grouped query per (subfield, year).
pub struct SubfieldAggregator<'a> {
    client: &'a CatalogClient,
    config: &'a PipelineConfig,
}

impl<'a> SubfieldAggregator<'a> {
    pub fn new(client: &'a CatalogClient, config: &'a PipelineConfig) -> Self {
        Self { client, config }
    }

    pub async fn run(&self) -> Aggregation<SubfieldCountRecord> {
        let mut out = Aggregation::default();
        info!(
            "Subfield sweep: {} subfields × {} years",
            self.config.subfields.len(),
            self.config.years().count()
        );

        for subfield in &self.config.subfields {
            for year in self.config.years() {
                match self.fetch_cell(subfield, year).await {
                    Ok(records) => {
                        debug!("{} {}: {} country groups", subfield.name, year, records.len());
                        out.records.extend(records);
                    }
                    Err(e) => {
                        error!("Subfield query {} / {} failed: {}", subfield.name, year, e);
                        out.failures.push(
                            QueryFailure::new(Pass::Subfield, &e)
                                .with_subfield(subfield.name.clone())
                                .with_year(year),
                        );
                    }
                }
            }
        }

        info!(
            "Subfield sweep complete: {} records, {} failed queries",
            out.records.len(),
            out.failures.len()
        );
        out
    }

    /// Records for one (subfield, year) cell.
    pub async fn fetch_cell(
        &self,
        subfield: &NamedConcept,
        year: i32,
    ) -> Result<Vec<SubfieldCountRecord>> {
        let filter = base_topic_filter(self.config)
            .concept(&subfield.id)
            .year(year);
        let groups = fetch_country_groups(self.client, &filter, self.config.group_page_size).await?;
        Ok(groups
            .into_iter()
            .map(|(country_code, count)| SubfieldCountRecord {
                subfield: subfield.name.clone(),
                year,
                country: country_display_name(&country_code),
                country_code,
                count,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use papertrail_fetch::query::PARAM_FILTER;
    use papertrail_fetch::transport::query_value;
    use papertrail_fetch::{Clock, RawResponse, StubTransport, VirtualClock};

    fn config() -> PipelineConfig {
        PipelineConfig {
            mailto: "team@example.org".into(),
            start_year: 2019,
            end_year: 2020,
            subfields: vec![
                NamedConcept::new("Robotics", "C15744967"),
                NamedConcept::new("Computer Vision", "C121332964"),
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_iterates_subfields_then_years() {
        let config = config();
        let stub = Arc::new(StubTransport::new(|_, _| {
            Ok(RawResponse::ok(
                r#"{"group_by": [{"key": "https://openalex.org/countries/JP", "count": 9}]}"#,
            ))
        }));
        let client = CatalogClient::with_parts(&config, stub.clone(), Arc::new(VirtualClock::new()));

        let out = SubfieldAggregator::new(&client, &config).run().await;

        assert!(out.is_complete());
        let cells: Vec<(&str, i32)> = out
            .records
            .iter()
            .map(|r| (r.subfield.as_str(), r.year))
            .collect();
        assert_eq!(
            cells,
            vec![
                ("Robotics", 2019),
                ("Robotics", 2020),
                ("Computer Vision", 2019),
                ("Computer Vision", 2020),
            ]
        );
        assert!(out
            .records
            .iter()
            .all(|r| r.country_code == "JP" && r.country == "Japan" && r.count == 9));

        let (_, query) = &stub.calls()[1];
        assert_eq!(
            query_value(query, PARAM_FILTER),
            Some("concept.id:C154945302|C119857082|C112194779,concept.id:C15744967,publication_year:2020")
        );
    }

    #[tokio::test]
    async fn test_failed_cell_recorded_with_subfield() {
        let config = config();
        let stub = Arc::new(StubTransport::new(|_, query| {
            let filter = query_value(query, PARAM_FILTER).unwrap_or_default();
            if filter.contains("C121332964") && filter.ends_with("2019") {
                Ok(RawResponse::status(500))
            } else {
                Ok(RawResponse::ok(r#"{"group_by": [{"key": "DE", "count": 1}]}"#))
            }
        }));
        let client = CatalogClient::with_parts(&config, stub, Arc::new(VirtualClock::new()));

        let out = SubfieldAggregator::new(&client, &config).run().await;

        assert_eq!(out.records.len(), 3);
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].subfield.as_deref(), Some("Computer Vision"));
        assert_eq!(out.failures[0].year, Some(2019));
        assert_eq!(out.failures[0].pass, Pass::Subfield);
    }

    #[tokio::test]
    async fn test_rate_limited_cell_recovers() {
        let config = config();
        let stub = Arc::new(StubTransport::scripted(vec![
            Ok(RawResponse::status(429)),
            Ok(RawResponse::ok(r#"{"group_by": [{"key": "KR", "count": 4}]}"#)),
        ]));
        let clock = Arc::new(VirtualClock::new());
        let client = CatalogClient::with_parts(&config, stub, clock.clone());

        let out = SubfieldAggregator::new(&client, &config).run().await;

        assert!(out.is_complete());
        assert_eq!(out.records.len(), 4);
        assert_eq!(out.records[0].subfield, "Robotics");
        assert_eq!(out.records[0].year, 2019);
        assert!(clock.now() >= Duration::from_secs(10));
    }
}
