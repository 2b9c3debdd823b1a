//! Record types shared by the aggregation, analysis and export stages.

use serde::{Deserialize, Serialize};

/// Publications for one (year, country) cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountYearRecord {
    pub year: i32,
    pub country_code: String,
    /// ISO short name of `country_code`, or the code itself when unregistered.
    #[serde(default)]
    pub country: String,
    pub count: u64,
}

/// Publications for one (subfield, year, country) cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubfieldCountRecord {
    pub subfield: String,
    pub year: i32,
    pub country_code: String,
    #[serde(default)]
    pub country: String,
    pub count: u64,
}

/// Cross-year trend statistics for one country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountrySummary {
    pub country_code: String,
    #[serde(default)]
    pub country: String,
    pub total_count: u64,
    pub growth_ratio: f64,
    pub recent_slope: f64,
}

/// One row of the per-year ranking table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRanking {
    pub year: i32,
    /// 1-based position within the year.
    pub rank: usize,
    pub country_code: String,
    #[serde(default)]
    pub country: String,
    pub count: u64,
}

/// Which pass a failure belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pass {
    CountryYear,
    /// Trend summary over the country-year records.
    Summary,
    Subfield,
    TopicGraph,
}

/// A query that did not produce data. Kept next to the records that did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFailure {
    pub pass: Pass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subfield: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(rename = "lastStatus", skip_serializing_if = "Option::is_none")]
    pub last_status: Option<u16>,
    pub message: String,
}

impl QueryFailure {
    pub fn new(pass: Pass, error: &crate::Error) -> Self {
        Self {
            pass,
            year: None,
            subfield: None,
            country: None,
            last_status: error.last_status(),
            message: error.to_string(),
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_subfield(mut self, subfield: impl Into<String>) -> Self {
        self.subfield = Some(subfield.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }
}

/// Output of one aggregation pass: what succeeded, and what did not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aggregation<R> {
    pub records: Vec<R>,
    pub failures: Vec<QueryFailure>,
}

impl<R> Default for Aggregation<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<R> Aggregation<R> {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
