// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Options for the window search (Stage 1) and the window filter (Stage 2).
//!
//! Both structs keep the unit-suffixed scalar fields found in pipeline
//! files and expose typed accessors. Ranges are enforced by `validate()`,
//! which the search and pipeline call before any astronomy runs.

use qtty::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::window::SelectionPolicy;

/// How Stage 1 turns a night's admissible instants into windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// One window from the first to the last admissible instant.
    #[default]
    Span,
    /// One window per run of consecutive admissible instants.
    Contiguous,
}

/// Finest sampling step: one second.
pub const MIN_PRECISION_MINUTES: f64 = 1.0 / 60.0;

fn default_max_sun_altitude() -> f64 {
    -18.0
}

fn default_max_moon_altitude() -> f64 {
    -0.5
}

/// Stage 1 options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSearchConfig {
    pub search_range_hours: f64,
    pub precision_minutes: f64,
    pub max_zenith_deg: f64,
    #[serde(default = "default_max_sun_altitude")]
    pub max_sun_altitude_deg: f64,
    #[serde(default = "default_max_moon_altitude")]
    pub max_moon_altitude_deg: f64,
    // Downstream bounds: validated and carried, not applied in Stage 1.
    #[serde(default)]
    pub min_delay_minutes: f64,
    #[serde(default)]
    pub max_delay_minutes: f64,
    #[serde(default)]
    pub min_duration_minutes: f64,
    #[serde(default)]
    pub extraction: ExtractionMode,
}

fn check(ok: bool, message: impl FnOnce() -> String) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(Error::Configuration(message()))
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    check(value.is_finite() && value >= 0.0, || {
        format!("{name} must be a finite value >= 0, got {value}")
    })
}

impl WindowSearchConfig {
    /// Search options with the default Sun/Moon limits and no downstream
    /// bounds.
    pub fn new(search_range_hours: f64, precision_minutes: f64, max_zenith_deg: f64) -> Self {
        Self {
            search_range_hours,
            precision_minutes,
            max_zenith_deg,
            max_sun_altitude_deg: default_max_sun_altitude(),
            max_moon_altitude_deg: default_max_moon_altitude(),
            min_delay_minutes: 0.0,
            max_delay_minutes: 0.0,
            min_duration_minutes: 0.0,
            extraction: ExtractionMode::Span,
        }
    }

    pub fn validate(&self) -> Result<()> {
        non_negative("search_range_hours", self.search_range_hours)?;
        check(
            self.precision_minutes.is_finite() && self.precision_minutes >= MIN_PRECISION_MINUTES,
            || {
                format!(
                    "precision_minutes must be at least one second ({MIN_PRECISION_MINUTES:.4}), got {}",
                    self.precision_minutes
                )
            },
        )?;
        check((0.0..=90.0).contains(&self.max_zenith_deg), || {
            format!("max_zenith_deg must lie in [0, 90], got {}", self.max_zenith_deg)
        })?;
        check(
            self.max_sun_altitude_deg.is_finite() && self.max_sun_altitude_deg <= 0.0,
            || format!("max_sun_altitude_deg must be <= 0, got {}", self.max_sun_altitude_deg),
        )?;
        check(
            self.max_moon_altitude_deg.is_finite() && self.max_moon_altitude_deg <= 90.0,
            || format!("max_moon_altitude_deg must be <= 90, got {}", self.max_moon_altitude_deg),
        )?;
        non_negative("min_delay_minutes", self.min_delay_minutes)?;
        non_negative("max_delay_minutes", self.max_delay_minutes)?;
        non_negative("min_duration_minutes", self.min_duration_minutes)?;
        Ok(())
    }

    #[inline]
    pub fn search_range(&self) -> Hours {
        Hours::new(self.search_range_hours)
    }

    #[inline]
    pub fn precision(&self) -> Minutes {
        Minutes::new(self.precision_minutes)
    }

    #[inline]
    pub fn max_zenith(&self) -> Degrees {
        Degrees::new(self.max_zenith_deg)
    }

    /// Lowest admissible target altitude, `90° − max_zenith`.
    #[inline]
    pub fn min_target_altitude(&self) -> Degrees {
        Degrees::new(90.0) - self.max_zenith()
    }

    #[inline]
    pub fn max_sun_altitude(&self) -> Degrees {
        Degrees::new(self.max_sun_altitude_deg)
    }

    #[inline]
    pub fn max_moon_altitude(&self) -> Degrees {
        Degrees::new(self.max_moon_altitude_deg)
    }

    pub fn with_extraction(mut self, extraction: ExtractionMode) -> Self {
        self.extraction = extraction;
        self
    }
}

/// Stage 2 options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowFilterConfig {
    pub min_window_duration_hours: f64,
    pub max_window_delay_hours: f64,
    pub window_selection: SelectionPolicy,
}

impl WindowFilterConfig {
    pub fn validate(&self) -> Result<()> {
        non_negative("min_window_duration_hours", self.min_window_duration_hours)?;
        non_negative("max_window_delay_hours", self.max_window_delay_hours)
    }

    #[inline]
    pub fn min_duration(&self) -> Hours {
        Hours::new(self.min_window_duration_hours)
    }

    #[inline]
    pub fn max_delay(&self) -> Hours {
        Hours::new(self.max_window_delay_hours)
    }
}
