// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Splitting the search horizon into nights and sampling each night.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use log::debug;
use qtty::*;
use serde::Serialize;

use crate::config::MIN_PRECISION_MINUTES;
use crate::coords::ObservingSite;
use crate::ephemeris::{next_sunset_sunrise, Ephemeris};
use crate::error::EphemerisError;
use crate::instant::to_time_delta;

/// One sunset-to-sunrise interval at the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Night {
    /// UTC calendar date of the sunset.
    pub evening_date: NaiveDate,
    pub sunset: DateTime<Utc>,
    pub sunrise: DateTime<Utc>,
}

impl Night {
    #[inline]
    pub fn duration(&self) -> TimeDelta {
        self.sunrise - self.sunset
    }

    /// Whether `at` falls inside this night (inclusive bounds).
    #[inline]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.sunset <= at && at <= self.sunrise
    }
}

/// Nights whose sunsets fall within `[alert_time, alert_time + search_range]`.
///
/// An alert that arrives after dark yields the night in progress first, so
/// that night's sunset precedes the alert. The list is ordered and the
/// nights never overlap. A zero horizon gives an empty list.
pub fn setup_nights<E: Ephemeris + ?Sized>(
    ephemeris: &E,
    site: &ObservingSite,
    alert_time: DateTime<Utc>,
    search_range: Hours,
) -> Result<Vec<Night>, EphemerisError> {
    let cutoff = alert_time + to_time_delta(search_range.to::<Second>());
    let mut nights = Vec::new();
    let mut cursor = alert_time;

    while cursor < cutoff {
        let (sunset, sunrise) = next_sunset_sunrise(ephemeris, site, cursor)?;
        if sunset > cutoff {
            break;
        }
        let night = Night {
            evening_date: sunset.date_naive(),
            sunset,
            sunrise,
        };
        debug!(
            "night of {}: sunset {} sunrise {}",
            night.evening_date, night.sunset, night.sunrise
        );
        nights.push(night);
        cursor = sunrise;
    }
    Ok(nights)
}

/// Evenly spaced instants from sunset to sunrise, both included.
///
/// The count is `max(2, ⌊duration / precision⌋)`, with the precision held
/// to at least [`MIN_PRECISION_MINUTES`]. Instants are interpolated in
/// integer nanoseconds so repeated runs agree bit for bit.
pub fn sample_night(night: &Night, precision: Minutes) -> Vec<DateTime<Utc>> {
    let span_ns = night
        .duration()
        .num_nanoseconds()
        .map(i128::from)
        .unwrap_or_else(|| i128::from(night.duration().num_milliseconds()) * 1_000_000);

    // f64::max drops NaN
    let step_ns = precision.value().max(MIN_PRECISION_MINUTES) * 60e9;
    let count = ((span_ns as f64 / step_ns).floor() as usize).max(2);

    let last = (count - 1) as i128;
    (0..count)
        .map(|i| {
            let offset = span_ns * i as i128 / last;
            night.sunset + TimeDelta::nanoseconds(offset as i64)
        })
        .collect()
}
