//! Topic graphs: main topics and their discovered child concepts, counted
//! per country.
//!
//! The taxonomy is discovered once per top-level topic and cached; only the
//! per-country counts are fetched inside the country loop.

pub mod builder;
pub mod graph;
pub mod taxonomy;
pub mod types;

pub use builder::TopicGraphBuilder;
pub use graph::{GraphBackend, GraphStats};
pub use taxonomy::TaxonomyCache;
pub use types::*;
