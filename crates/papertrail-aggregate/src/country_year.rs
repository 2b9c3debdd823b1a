//! Country × year sweep.

use papertrail_core::{
    country_display_name, Aggregation, CountYearRecord, Pass, PipelineConfig, QueryFailure, Result,
};
use papertrail_fetch::query::base_topic_filter;
use papertrail_fetch::CatalogClient;
use tracing::{debug, error, info};

use crate::grouped::fetch_country_groups;

/// One grouped query per year over the configured range.
pub struct CountryYearAggregator<'a> {
    client: &'a CatalogClient,
    config: &'a PipelineConfig,
}

impl<'a> CountryYearAggregator<'a> {
    pub fn new(client: &'a CatalogClient, config: &'a PipelineConfig) -> Self {
        Self { client, config }
    }

    /// Sweep every year. A failed year is recorded and skipped; the records
    /// of all other years are kept.
    pub async fn run(&self) -> Aggregation<CountYearRecord> {
        let mut out = Aggregation::default();
        info!(
            "Country-year sweep: {}..={}",
            self.config.start_year, self.config.end_year
        );

        for year in self.config.years() {
            match self.fetch_year(year).await {
                Ok(records) => {
                    debug!("{}: {} country groups", year, records.len());
                    out.records.extend(records);
                }
                Err(e) => {
                    error!("Country-year query for {} failed: {}", year, e);
                    out.failures
                        .push(QueryFailure::new(Pass::CountryYear, &e).with_year(year));
                }
            }
        }

        info!(
            "Country-year sweep complete: {} records, {} failed years",
            out.records.len(),
            out.failures.len()
        );
        out
    }

    /// Records for one year. No groups means no records, not zero records.
    pub async fn fetch_year(&self, year: i32) -> Result<Vec<CountYearRecord>> {
        let filter = base_topic_filter(self.config).year(year);
        let groups = fetch_country_groups(self.client, &filter, self.config.group_page_size).await?;
        Ok(groups
            .into_iter()
            .map(|(country_code, count)| CountYearRecord {
                year,
                country: country_display_name(&country_code),
                country_code,
                count,
            })
            .collect())
    }
}
