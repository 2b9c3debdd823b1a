//! Aggregation sweeps: grouped publication counts per country.
//!
//! Both sweeps issue one grouped query per cell, normalize country keys on
//! ingestion, and keep going past a failed query. Their outputs are
//! independent record streams and are never merged.

pub mod country_year;
pub mod grouped;
pub mod subfield;

pub use country_year::CountryYearAggregator;
pub use grouped::fetch_country_groups;
pub use subfield::SubfieldAggregator;
