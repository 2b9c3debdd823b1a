//! Error types for papertrail.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// One attempt failed below the HTTP layer, or with a retryable status.
    #[error("Transport error: {0}")]
    Transport(String),

    /// One attempt was throttled by the catalog.
    #[error("Rate limited, cooling down for {cooldown:?}")]
    RateLimited { cooldown: Duration },

    /// Every attempt for one query failed. Never a zero count.
    #[error("Fetch exhausted for {endpoint} after {attempts} attempts (last status: {})", display_status(.last_status))]
    FetchExhausted {
        endpoint: String,
        attempts: u32,
        last_status: Option<u16>,
    },

    #[error("Missing upstream input: {0}")]
    MissingUpstreamInput(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Year {year} outside configured range {start}..={end}")]
    YearOutOfRange { year: i32, start: i32, end: i32 },

    #[error("Degenerate trend window: {0} point(s), need at least 2")]
    DegenerateWindow(usize),

    #[error("Invalid graph for {country}: {reason}")]
    InvalidGraph { country: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn display_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "none".into(),
    }
}

impl Error {
    /// Last HTTP status carried by a terminal fetch failure.
    pub fn last_status(&self) -> Option<u16> {
        match self {
            Error::FetchExhausted { last_status, .. } => *last_status,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_exhausted_message() {
        let err = Error::FetchExhausted {
            endpoint: "works".into(),
            attempts: 5,
            last_status: Some(503),
        };
        assert_eq!(err.last_status(), Some(503));
        assert!(err.to_string().contains("last status: 503"));

        let err = Error::FetchExhausted {
            endpoint: "works".into(),
            attempts: 2,
            last_status: None,
        };
        assert!(err.to_string().contains("last status: none"));
    }
}
