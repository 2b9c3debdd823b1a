//! Catalog client with bounded retry, rate-limit cooldown and politeness
//! pacing.
//!
//! All calls are read-only GETs, issued one at a time over a single pooled
//! connection. Waits go through an injected [`Clock`].

pub mod client;
pub mod pacing;
pub mod query;
pub mod transport;
pub mod types;

pub use client::CatalogClient;
pub use pacing::{Clock, IntervalGate, SystemClock};
pub use query::Filter;
pub use transport::{RawResponse, ReqwestTransport, Transport};
pub use types::*;

#[cfg(any(test, feature = "test-util"))]
pub use pacing::VirtualClock;
#[cfg(any(test, feature = "test-util"))]
pub use transport::StubTransport;
