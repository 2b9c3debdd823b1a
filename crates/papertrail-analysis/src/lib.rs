//! Growth and trend analysis over country × year records.
//!
//! Pure functions: pivot the records into a dense year × country table,
//! then derive totals, smoothed growth ratios and a trailing-window OLS
//! slope per country.

pub mod pivot;
pub mod ranking;
pub mod trend;

pub use pivot::PivotTable;
pub use ranking::{ranked_countries, top_k_per_year};
pub use trend::{growth_ratio, ols_slope, TrendAnalyzer, RECENT_WINDOW_YEARS};
