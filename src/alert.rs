// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Science alerts: where, when, and whatever the instrument measured.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::coords::SkyPosition;
use crate::error::Result;

/// A scalar measurement attached to an alert.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Number(f64),
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        ParameterValue::Bool(value)
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        ParameterValue::Number(value)
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Bool(b) => write!(f, "{b}"),
            ParameterValue::Number(n) => write!(f, "{n}"),
        }
    }
}

/// An incoming transient alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub coords: SkyPosition,
    pub alert_time: DateTime<Utc>,
    #[serde(default)]
    pub measured_parameters: BTreeMap<String, ParameterValue>,
}

impl AlertEvent {
    pub fn new(coords: SkyPosition, alert_time: DateTime<Utc>) -> Self {
        Self {
            coords,
            alert_time,
            measured_parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.measured_parameters.insert(name.into(), value.into());
        self
    }

    pub fn parameter(&self, name: &str) -> Option<ParameterValue> {
        self.measured_parameters.get(name).copied()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::io::Write;

    const ALERT: &str = r#"{
        "coords": {"raInDeg": 262.8109, "decInDeg": 14.6481},
        "alert_time": "2021-02-10T02:00:27.000091Z",
        "measured_parameters": {"count_rate": 1.2e3, "system_stable": true}
    }"#;

    #[test]
    fn parses_alert_json() {
        let alert = AlertEvent::from_json_str(ALERT).unwrap();
        assert_eq!(alert.parameter("count_rate"), Some(ParameterValue::Number(1200.0)));
        assert_eq!(alert.parameter("system_stable"), Some(ParameterValue::Bool(true)));
        assert_eq!(alert.parameter("missing"), None);
        assert_eq!(alert.alert_time.timestamp(), 1_612_922_427);
    }

    #[test]
    fn parameters_are_optional() {
        let alert = AlertEvent::from_json_str(
            r#"{"coords": {"raInDeg": 10, "decInDeg": 20}, "alert_time": "2021-02-10T02:00:27Z"}"#,
        )
        .unwrap();
        assert!(alert.measured_parameters.is_empty());
    }

    #[test]
    fn invalid_coordinates_fail_to_parse() {
        let err = AlertEvent::from_json_str(
            r#"{"coords": {"raInDeg": 361, "decInDeg": 20}, "alert_time": "2021-02-10T02:00:27Z"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(ALERT.as_bytes()).unwrap();
        let alert = AlertEvent::from_json_file(file.path()).unwrap();
        assert_eq!(alert.coords.ra().value(), 262.8109);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AlertEvent::from_json_file("/nonexistent/alert.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
