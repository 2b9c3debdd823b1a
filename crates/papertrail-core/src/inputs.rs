//! Precomputed inputs a run depends on.

use std::path::Path;

use tracing::info;

use crate::country::UNKNOWN_COUNTRY;
use crate::error::{Error, Result};
use crate::types::CountrySummary;

/// Load the ranked country list from a summary written by an earlier run.
///
/// Keeps the file's order, drops `UNKNOWN`, and truncates to `limit`. A
/// missing, unreadable or empty summary halts the run.
pub fn load_ranked_countries(summary_path: &Path, limit: usize) -> Result<Vec<String>> {
    let data = std::fs::read_to_string(summary_path).map_err(|e| {
        Error::MissingUpstreamInput(format!(
            "country summary {} could not be read ({}); run the full sweep first",
            summary_path.display(),
            e
        ))
    })?;
    let summary: Vec<CountrySummary> = serde_json::from_str(&data)?;

    let countries: Vec<String> = summary
        .into_iter()
        .map(|s| s.country_code)
        .filter(|cc| cc != UNKNOWN_COUNTRY)
        .take(limit)
        .collect();

    require_countries(&countries, &summary_path.display().to_string())?;
    info!(
        "Loaded {} ranked countries from {}",
        countries.len(),
        summary_path.display()
    );
    Ok(countries)
}

/// Fail with [`Error::MissingUpstreamInput`] if the ranked list is empty.
pub fn require_countries(countries: &[String], source: &str) -> Result<()> {
    if countries.is_empty() {
        return Err(Error::MissingUpstreamInput(format!(
            "ranked country list from {} is empty",
            source
        )));
    }
    Ok(())
}
