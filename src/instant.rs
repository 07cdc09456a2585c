// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! UTC timestamps against the `tempoch` time axes.
//!
//! Alerts, nights and windows are carried as `chrono` UTC instants. The
//! ephemeris works on [`ModifiedJulianDate`] (TT axis); `tempoch` applies
//! ΔT in both directions.

use chrono::{DateTime, TimeDelta, Utc};
use qtty::*;
use tempoch::ModifiedJulianDate;

/// A UTC instant on the MJD(TT) axis.
#[inline]
pub(crate) fn to_mjd(at: DateTime<Utc>) -> ModifiedJulianDate {
    ModifiedJulianDate::from_utc(at)
}

/// Back to UTC; `None` outside chrono's representable range.
#[inline]
pub(crate) fn from_mjd(mjd: ModifiedJulianDate) -> Option<DateTime<Utc>> {
    mjd.to_utc()
}

/// Elapsed time `later − earlier` as a typed quantity.
pub(crate) fn elapsed(earlier: DateTime<Utc>, later: DateTime<Utc>) -> Seconds {
    let delta = later - earlier;
    Seconds::new(delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) / 1e9)
}

/// A typed duration as a chrono `TimeDelta`, rounded to the millisecond.
pub(crate) fn to_time_delta(duration: Seconds) -> TimeDelta {
    TimeDelta::milliseconds((duration.value() * 1_000.0).round() as i64)
}
