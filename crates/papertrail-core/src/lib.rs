//! papertrail core: records, configuration, errors, country normalization.

pub mod config;
pub mod country;
pub mod error;
pub mod inputs;
pub mod types;

pub use config::{DataPaths, NamedConcept, PipelineConfig, RetryPolicy};
pub use country::{
    country_display_name, normalize_country_code, UNKNOWN_COUNTRY, UNKNOWN_COUNTRY_NAME,
};
pub use error::{Error, Result};
pub use types::*;
