// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Filters on the measured parameters carried by an alert.

use serde::{Deserialize, Serialize};

use crate::alert::{AlertEvent, ParameterValue};
use crate::error::Error;

/// The comparison a parameter must satisfy, with its operand typed at
/// parse time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison {
    Equal(ParameterValue),
    Greater(f64),
    Less(f64),
}

impl Comparison {
    /// A boolean compared against a number (or vice versa) never holds.
    pub fn holds(&self, actual: ParameterValue) -> bool {
        match (*self, actual) {
            (Comparison::Equal(ParameterValue::Number(req)), ParameterValue::Number(v)) => v == req,
            (Comparison::Equal(ParameterValue::Bool(req)), ParameterValue::Bool(v)) => v == req,
            (Comparison::Greater(req), ParameterValue::Number(v)) => v > req,
            (Comparison::Less(req), ParameterValue::Number(v)) => v < req,
            _ => false,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Comparison::Equal(_) => "equal",
            Comparison::Greater(_) => "greater",
            Comparison::Less(_) => "less",
        }
    }

    fn operand(&self) -> ParameterValue {
        match *self {
            Comparison::Equal(v) => v,
            Comparison::Greater(v) | Comparison::Less(v) => ParameterValue::Number(v),
        }
    }
}

/// Requirement on one named alert parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawParameterFilter", into = "RawParameterFilter")]
pub struct ParameterFilter {
    pub name: String,
    pub comparison: Comparison,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawParameterFilter {
    parameter_name: String,
    parameter_requirement: ParameterValue,
    parameter_comparison: String,
}

impl TryFrom<RawParameterFilter> for ParameterFilter {
    type Error = Error;

    fn try_from(raw: RawParameterFilter) -> Result<Self, Self::Error> {
        let requirement = raw.parameter_requirement;
        let comparison = match (raw.parameter_comparison.trim(), requirement) {
            ("equal", value) => Comparison::Equal(value),
            ("greater", ParameterValue::Number(v)) => Comparison::Greater(v),
            ("less", ParameterValue::Number(v)) => Comparison::Less(v),
            (op @ ("greater" | "less"), ParameterValue::Bool(_)) => {
                return Err(Error::config(format!(
                    "parameter '{}': '{op}' needs a numeric requirement",
                    raw.parameter_name
                )))
            }
            (other, _) => {
                return Err(Error::config(format!(
                    "parameter '{}': unknown comparison '{other}' (expected equal, greater or less)",
                    raw.parameter_name
                )))
            }
        };
        Ok(Self {
            name: raw.parameter_name,
            comparison,
        })
    }
}

impl From<ParameterFilter> for RawParameterFilter {
    fn from(filter: ParameterFilter) -> Self {
        Self {
            parameter_requirement: filter.comparison.operand(),
            parameter_comparison: filter.comparison.name().to_string(),
            parameter_name: filter.name,
        }
    }
}

impl ParameterFilter {
    pub fn new(name: impl Into<String>, comparison: Comparison) -> Self {
        Self {
            name: name.into(),
            comparison,
        }
    }

    /// A parameter missing from the alert does not pass.
    pub fn evaluate(&self, alert: &AlertEvent) -> bool {
        alert
            .parameter(&self.name)
            .is_some_and(|actual| self.comparison.holds(actual))
    }
}

/// Outcome of a parameter check, as reported by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterResult {
    pub parameter_name: String,
    pub parameter_ok: bool,
}
