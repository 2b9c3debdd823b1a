//! Pipeline configuration and output directory management.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openalex.org";
pub const DEFAULT_START_YEAR: i32 = 2010;
pub const DEFAULT_END_YEAR: i32 = 2025;

/// Artificial intelligence, machine learning, deep learning.
pub const DEFAULT_AI_CONCEPTS: &[&str] = &["C154945302", "C119857082", "C112194779"];

/// A catalog concept with the label it is reported under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedConcept {
    pub name: String,
    pub id: String,
}

impl NamedConcept {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// Retry, backoff and pacing knobs for the fetch client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Fixed pause between consecutive outbound requests.
    #[serde(default = "default_politeness_delay_ms")]
    pub politeness_delay_ms: u64,
    /// Wait applied after a 429 before the next attempt.
    #[serde(default = "default_rate_limit_cooldown_ms")]
    pub rate_limit_cooldown_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_max_attempts() -> u32 {
    5
}
fn default_politeness_delay_ms() -> u64 {
    200
}
fn default_rate_limit_cooldown_ms() -> u64 {
    10_000
}
fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            politeness_delay_ms: default_politeness_delay_ms(),
            rate_limit_cooldown_ms: default_rate_limit_cooldown_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl RetryPolicy {
    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_millis(self.rate_limit_cooldown_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Backoff before retrying after failed attempt `attempt` (zero-based):
    /// `2^attempt + 0.1` seconds.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = 2u64.saturating_pow(attempt.min(16));
        Duration::from_secs(exp) + Duration::from_millis(100)
    }
}

/// Everything a sweep needs. Passed into each component at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Identification token appended to every call (`mailto=`).
    #[serde(default)]
    pub mailto: String,
    #[serde(default = "default_start_year")]
    pub start_year: i32,
    #[serde(default = "default_end_year")]
    pub end_year: i32,
    /// Concepts OR-ed together to define the base topic predicate.
    #[serde(default = "default_ai_concepts")]
    pub ai_concepts: Vec<String>,
    /// Named subfields for the subfield aggregation pass.
    #[serde(default = "default_subfields")]
    pub subfields: Vec<NamedConcept>,
    /// Top-level topics of the per-country topic graph.
    #[serde(default = "default_main_topics")]
    pub main_topics: Vec<NamedConcept>,
    /// Children kept per top-level topic after discovery.
    #[serde(default = "default_children_per_topic")]
    pub children_per_topic: usize,
    /// How many ranked countries get a topic graph.
    #[serde(default = "default_graph_countries")]
    pub graph_countries: usize,
    /// Countries listed per year in the ranking table.
    #[serde(default = "default_top_k_per_year")]
    pub top_k_per_year: usize,
    #[serde(default = "default_group_page_size")]
    pub group_page_size: u32,
    #[serde(default = "default_listing_page_size")]
    pub listing_page_size: u32,
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_start_year() -> i32 {
    DEFAULT_START_YEAR
}
fn default_end_year() -> i32 {
    DEFAULT_END_YEAR
}
fn default_ai_concepts() -> Vec<String> {
    DEFAULT_AI_CONCEPTS.iter().map(|s| s.to_string()).collect()
}
fn default_subfields() -> Vec<NamedConcept> {
    vec![
        NamedConcept::new("Computer Vision", "C121332964"),
        NamedConcept::new("Natural Language Processing", "C144133560"),
        NamedConcept::new("Robotics", "C15744967"),
        NamedConcept::new("Reinforcement Learning", "C55535154"),
    ]
}
fn default_main_topics() -> Vec<NamedConcept> {
    vec![
        NamedConcept::new("Computer Vision", "C121332964"),
        NamedConcept::new("Natural Language Processing", "C144133560"),
        NamedConcept::new("Robotics", "C15744967"),
        NamedConcept::new("Theory", "C154945302"),
    ]
}
fn default_children_per_topic() -> usize {
    6
}
fn default_graph_countries() -> usize {
    50
}
fn default_top_k_per_year() -> usize {
    10
}
fn default_group_page_size() -> u32 {
    200
}
fn default_listing_page_size() -> u32 {
    200
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            mailto: String::new(),
            start_year: default_start_year(),
            end_year: default_end_year(),
            ai_concepts: default_ai_concepts(),
            subfields: default_subfields(),
            main_topics: default_main_topics(),
            children_per_topic: default_children_per_topic(),
            graph_countries: default_graph_countries(),
            top_k_per_year: default_top_k_per_year(),
            group_page_size: default_group_page_size(),
            listing_page_size: default_listing_page_size(),
            retry: RetryPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Load config from an optional JSON file, then apply env overrides and
    /// validate.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config: PipelineConfig = match config_path {
            Some(path) => {
                let data = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("cannot read {}: {}", path.display(), e))
                })?;
                let config = serde_json::from_str(&data)?;
                info!("Loaded pipeline config from {}", path.display());
                config
            }
            None => PipelineConfig::default(),
        };

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(mailto) = std::env::var("PAPERTRAIL_MAILTO") {
            self.mailto = mailto;
        }
        if let Ok(url) = std::env::var("PAPERTRAIL_BASE_URL") {
            self.base_url = url;
        }
        if let Ok(year) = std::env::var("PAPERTRAIL_START_YEAR") {
            self.start_year = parse_year("PAPERTRAIL_START_YEAR", &year)?;
        }
        if let Ok(year) = std::env::var("PAPERTRAIL_END_YEAR") {
            self.end_year = parse_year("PAPERTRAIL_END_YEAR", &year)?;
        }
        Ok(())
    }

    /// Check the invariants every component relies on.
    pub fn validate(&self) -> Result<()> {
        if self.mailto.trim().is_empty() {
            return Err(Error::Config(
                "mailto is required (set PAPERTRAIL_MAILTO or \"mailto\" in the config file)"
                    .into(),
            ));
        }
        if self.start_year >= self.end_year {
            return Err(Error::Config(format!(
                "start_year ({}) must be before end_year ({})",
                self.start_year, self.end_year
            )));
        }
        if self.ai_concepts.is_empty() {
            return Err(Error::Config("ai_concepts must not be empty".into()));
        }
        if self.main_topics.is_empty() {
            return Err(Error::Config("main_topics must not be empty".into()));
        }
        let mut names = HashSet::new();
        for topic in &self.main_topics {
            if !names.insert(topic.name.as_str()) {
                return Err(Error::Config(format!(
                    "main_topics has duplicate name {:?}",
                    topic.name
                )));
            }
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::Config("retry.max_attempts must be at least 1".into()));
        }
        Ok(())
    }

    /// Every year of the sweep, in order.
    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.start_year..=self.end_year
    }
}

fn parse_year(var: &str, value: &str) -> Result<i32> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} is not a year: {:?}", var, value)))
}

/// Where a run writes its collections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root output directory (e.g., `data/`).
    pub root: PathBuf,
    /// Country × year records (`data/country_year.json`).
    pub country_year: PathBuf,
    /// Per-country summary (`data/summary.json`).
    pub summary: PathBuf,
    /// Top countries per year (`data/top_per_year.json`).
    pub top_per_year: PathBuf,
    /// Subfield × year × country records (`data/subfield_year.json`).
    pub subfield_year: PathBuf,
    /// Topic graphs by country (`data/topic_graphs.json`).
    pub topic_graphs: PathBuf,
    /// Queries that exhausted their retry budget (`data/failures.json`).
    pub failures: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates it if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            country_year: root.join("country_year.json"),
            summary: root.join("summary.json"),
            top_per_year: root.join("top_per_year.json"),
            subfield_year: root.join("subfield_year.json"),
            topic_graphs: root.join("topic_graphs.json"),
            failures: root.join("failures.json"),
            root,
        })
    }

    /// Resolve the root from `PAPERTRAIL_DATA_DIR`, defaulting to `data/`.
    pub fn from_env() -> std::io::Result<Self> {
        let root = std::env::var("PAPERTRAIL_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));
        Self::new(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> PipelineConfig {
        PipelineConfig {
            mailto: "team@example.org".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_validate() {
        let config = valid();
        assert!(config.validate().is_ok());
        assert_eq!(config.years().count(), 16);
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn test_missing_mailto_rejected() {
        let config = PipelineConfig::default();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_duplicate_topic_names_rejected() {
        let config = PipelineConfig {
            main_topics: vec![
                NamedConcept::new("Robotics", "C15744967"),
                NamedConcept::new("Robotics", "C154945302"),
            ],
            ..valid()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate name \"Robotics\""));
    }

    #[test]
    fn test_single_year_range_rejected() {
        let config = PipelineConfig {
            start_year: 2020,
            end_year: 2020,
            ..valid()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_backoff_grows_exponentially() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_millis(1100));
        assert_eq!(policy.backoff(1), Duration::from_millis(2100));
        assert_eq!(policy.backoff(3), Duration::from_millis(8100));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"mailto": "a@b.org", "start_year": 2018}"#).unwrap();
        assert_eq!(config.start_year, 2018);
        assert_eq!(config.end_year, DEFAULT_END_YEAR);
        assert_eq!(config.main_topics.len(), 4);
        assert_eq!(config.retry.rate_limit_cooldown_ms, 10_000);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("papertrail.json");
        std::fs::write(
            &path,
            r#"{"mailto": "a@b.org", "start_year": 2015, "end_year": 2016}"#,
        )
        .unwrap();

        let config = PipelineConfig::load(Some(&path)).unwrap();
        assert_eq!(config.years().collect::<Vec<_>>(), vec![2015, 2016]);
    }

    #[test]
    fn test_data_paths_created() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path().join("out")).unwrap();
        assert!(paths.root.exists());
        assert_eq!(paths.summary, dir.path().join("out").join("summary.json"));
    }
}
