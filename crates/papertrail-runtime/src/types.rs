//! Runtime types.

use std::collections::BTreeMap;
use std::path::Path;

use papertrail_core::{
    CountYearRecord, CountrySummary, DataPaths, Pass, QueryFailure, Result, SubfieldCountRecord,
    YearRanking,
};
use papertrail_graph::CountryGraph;
use serde::Serialize;
use tracing::info;

/// Everything one full run produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    #[serde(rename = "startedAt")]
    pub started_at: String,
    #[serde(rename = "finishedAt")]
    pub finished_at: String,
    pub country_year: Vec<CountYearRecord>,
    pub summary: Vec<CountrySummary>,
    pub top_per_year: Vec<YearRanking>,
    pub subfield_year: Vec<SubfieldCountRecord>,
    pub topic_graphs: BTreeMap<String, CountryGraph>,
    /// Failures from every pass, in the order they happened.
    pub failures: Vec<QueryFailure>,
}

impl SweepReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of failures recorded for one pass.
    pub fn failures_in(&self, pass: Pass) -> usize {
        self.failures.iter().filter(|f| f.pass == pass).count()
    }

    /// Write every collection as pretty JSON under `paths`.
    pub fn persist(&self, paths: &DataPaths) -> Result<()> {
        write_json(&paths.country_year, &self.country_year)?;
        write_json(&paths.summary, &self.summary)?;
        write_json(&paths.top_per_year, &self.top_per_year)?;
        write_json(&paths.subfield_year, &self.subfield_year)?;
        write_json(&paths.topic_graphs, &self.topic_graphs)?;
        write_json(&paths.failures, &self.failures)?;
        info!("Wrote run outputs to {}", paths.root.display());
        Ok(())
    }
}

/// Serialize `value` to `path`, replacing any previous file.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_string_pretty(value)?;
    std::fs::write(path, data)?;
    Ok(())
}
