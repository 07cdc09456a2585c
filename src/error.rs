// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Error types for the follow-up planner.
//!
//! A search that finds no usable window is **not** an error: it is reported
//! as `None` (Stage 2) or a failed task. The variants below cover invalid
//! input, astronomical failures that make a search meaningless, and I/O.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type for planner operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or running a search.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid option, policy name or coordinate, raised before any
    /// astronomical computation runs.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Rise/set search failed; the whole search is aborted.
    #[error("Ephemeris error: {0}")]
    Ephemeris(#[from] EphemerisError),

    /// The cancellation token was observed between nights.
    #[error("Search cancelled")]
    Cancelled,

    /// I/O error (config or alert files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }
}

/// The sun never crosses the horizon inside the scan span (polar day or
/// polar night).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EphemerisError {
    #[error("no sunset at {site} within {span_hours} h of {from}")]
    NoSunset {
        site: String,
        from: DateTime<Utc>,
        span_hours: f64,
    },

    #[error("no sunrise at {site} within {span_hours} h of {from}")]
    NoSunrise {
        site: String,
        from: DateTime<Utc>,
        span_hours: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn ephemeris_error_converts_and_displays() {
        let from = Utc.with_ymd_and_hms(2021, 6, 21, 0, 0, 0).unwrap();
        let err: Error = EphemerisError::NoSunset {
            site: "Pole".into(),
            from,
            span_hours: 48.0,
        }
        .into();
        let text = err.to_string();
        assert!(text.starts_with("Ephemeris error: no sunset at Pole"), "{text}");
        assert!(matches!(err, Error::Ephemeris(EphemerisError::NoSunset { .. })));
    }

    #[test]
    fn configuration_helper() {
        let err = Error::config("bad policy");
        assert_eq!(err.to_string(), "Configuration error: bad policy");
    }
}
