//! Filter expressions and query parameter names.

use std::fmt;

use papertrail_core::PipelineConfig;

pub const WORKS: &str = "works";
pub const CONCEPTS: &str = "concepts";

pub const CONCEPT_ID: &str = "concept.id";
pub const ANCESTORS_ID: &str = "ancestors.id";
pub const PUBLICATION_YEAR: &str = "publication_year";
pub const INSTITUTION_COUNTRY: &str = "institutions.country_code";

pub const PARAM_FILTER: &str = "filter";
pub const PARAM_GROUP_BY: &str = "group-by";
pub const PARAM_PER_PAGE: &str = "per-page";
pub const PARAM_MAILTO: &str = "mailto";

/// Boolean-AND of `facet:value` clauses, rendered comma-separated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    clauses: Vec<(String, String)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, facet: &str, value: impl fmt::Display) -> Self {
        self.clauses.push((facet.to_string(), value.to_string()));
        self
    }

    /// One clause matching any of `values` (`a|b|c`).
    pub fn any_of<S: AsRef<str>>(self, facet: &str, values: &[S]) -> Self {
        let joined = values
            .iter()
            .map(|v| v.as_ref())
            .collect::<Vec<_>>()
            .join("|");
        self.and(facet, joined)
    }

    pub fn concept(self, concept_id: &str) -> Self {
        self.and(CONCEPT_ID, concept_id)
    }

    pub fn year(self, year: i32) -> Self {
        self.and(PUBLICATION_YEAR, year)
    }

    /// Inclusive publication-year span.
    pub fn year_span(self, from: i32, to: i32) -> Self {
        self.and(PUBLICATION_YEAR, format!("{}-{}", from, to))
    }

    pub fn country(self, country_code: &str) -> Self {
        self.and(INSTITUTION_COUNTRY, country_code)
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Whether any clause has this facet and value.
    pub fn has(&self, facet: &str, value: &str) -> bool {
        self.clauses.iter().any(|(f, v)| f == facet && v == value)
    }
}

/// The base topic predicate: any of the configured AI concepts.
pub fn base_topic_filter(config: &PipelineConfig) -> Filter {
    Filter::new().any_of(CONCEPT_ID, &config.ai_concepts)
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (facet, value)) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}:{}", facet, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_conjunction() {
        let filter = Filter::new()
            .any_of(CONCEPT_ID, &["C154945302", "C119857082"])
            .year(2021);
        assert_eq!(
            filter.to_string(),
            "concept.id:C154945302|C119857082,publication_year:2021"
        );
    }

    #[test]
    fn test_country_span() {
        let filter = Filter::new()
            .concept("C121332964")
            .country("US")
            .year_span(2010, 2025);
        assert_eq!(
            filter.to_string(),
            "concept.id:C121332964,institutions.country_code:US,publication_year:2010-2025"
        );
        assert!(filter.has(INSTITUTION_COUNTRY, "US"));
        assert!(!filter.has(INSTITUTION_COUNTRY, "GB"));
    }

    #[test]
    fn test_empty() {
        assert!(Filter::new().is_empty());
        assert_eq!(Filter::new().to_string(), "");
    }
}
