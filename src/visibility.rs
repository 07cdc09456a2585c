// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Sun, Moon and zenith-angle constraints on candidate instants.

use chrono::{DateTime, Utc};
use qtty::*;

use crate::alert::AlertEvent;
use crate::config::WindowSearchConfig;
use crate::coords::ObservingSite;
use crate::ephemeris::{Ephemeris, SkyState};

/// The three altitude limits a sample must satisfy, all strict.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityLimits {
    pub max_sun_altitude: Degrees,
    pub max_moon_altitude: Degrees,
    pub min_target_altitude: Degrees,
}

impl VisibilityLimits {
    pub fn from_config(config: &WindowSearchConfig) -> Self {
        Self {
            max_sun_altitude: config.max_sun_altitude(),
            max_moon_altitude: config.max_moon_altitude(),
            min_target_altitude: config.min_target_altitude(),
        }
    }

    #[inline]
    pub fn admits(&self, state: &SkyState) -> bool {
        state.sun < self.max_sun_altitude
            && state.moon < self.max_moon_altitude
            && state.target > self.min_target_altitude
    }
}

/// Per-candidate admissibility, from one batched ephemeris call.
pub fn admissibility_mask<E: Ephemeris + ?Sized>(
    ephemeris: &E,
    alert: &AlertEvent,
    config: &WindowSearchConfig,
    site: &ObservingSite,
    candidates: &[DateTime<Utc>],
) -> Vec<bool> {
    let limits = VisibilityLimits::from_config(config);
    ephemeris
        .observe(site, &alert.coords, candidates)
        .iter()
        .map(|state| limits.admits(state))
        .collect()
}

/// The candidates that pass every limit, in their original order.
pub fn admissible_times<E: Ephemeris + ?Sized>(
    ephemeris: &E,
    alert: &AlertEvent,
    config: &WindowSearchConfig,
    site: &ObservingSite,
    candidates: &[DateTime<Utc>],
) -> Vec<DateTime<Utc>> {
    let mask = admissibility_mask(ephemeris, alert, config, site, candidates);
    candidates
        .iter()
        .zip(mask)
        .filter_map(|(&at, ok)| ok.then_some(at))
        .collect()
}
