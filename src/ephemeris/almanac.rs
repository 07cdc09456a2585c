// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Sunset / sunrise search.
//!
//! Any [`Ephemeris`] is lifted into a `siderust` altitude provider so the
//! crossing search (coarse scan in [`SCAN_STEP`] increments, then root
//! refinement to [`RESOLUTION`]) runs on `siderust`'s event finder. The
//! scan gives up after [`SCAN_SPAN`], which is how polar day and polar
//! night surface as errors.

use chrono::{DateTime, TimeDelta, Utc};
use log::trace;
use qtty::*;
use siderust::calculus::altitude::{
    altitude_ranges, crossings, AltitudePeriodsProvider, AltitudeQuery, CrossingDirection,
    SearchOpts,
};
use siderust::coordinates::centers::Geodetic;
use siderust::coordinates::frames::ECEF;
use tempoch::{ModifiedJulianDate, Period, MJD};

use super::Ephemeris;
use crate::coords::ObservingSite;
use crate::error::EphemerisError;
use crate::instant::{from_mjd, to_mjd};

/// Geometric altitude of the Sun's centre at apparent rise/set: 34' of
/// horizontal refraction plus 16' of semi-diameter.
pub const SUN_HORIZON: Degrees = Degrees::new(-0.5667);

const SCAN_STEP: Minutes = Minutes::new(10.0);
const SCAN_SPAN: TimeDelta = TimeDelta::hours(48);
const RESOLUTION: Seconds = Seconds::new(1.0);

/// Gap left after the reference instant so a crossing found exactly at the
/// cursor is not reported again.
const FORWARD_GAP: TimeDelta = TimeDelta::seconds(1);

fn search_opts() -> SearchOpts {
    SearchOpts {
        time_tolerance: RESOLUTION.to::<Day>(),
        scan_step_days: Some(SCAN_STEP.to::<Day>()),
    }
}

/// The Sun's altitude track from one ephemeris at one site.
struct SunTrack<'a, E: ?Sized> {
    ephemeris: &'a E,
    site: &'a ObservingSite,
}

impl<E: Ephemeris + ?Sized> AltitudePeriodsProvider for SunTrack<'_, E> {
    fn altitude_periods(&self, query: &AltitudeQuery) -> Vec<Period<MJD>> {
        altitude_ranges(
            self,
            &query.observer,
            query.window,
            query.min_altitude,
            query.max_altitude,
            search_opts(),
        )
    }

    fn altitude_at(&self, _observer: &Geodetic<ECEF>, mjd: ModifiedJulianDate) -> Radians {
        // NaN never brackets a crossing.
        from_mjd(mjd).map_or(Radians::new(f64::NAN), |at| {
            self.ephemeris.sun_altitude(self.site, at).to::<Radian>()
        })
    }
}

/// Every crossing of [`SUN_HORIZON`] in `[from, to]`, oldest first.
pub(crate) fn sun_crossings<E: Ephemeris + ?Sized>(
    ephemeris: &E,
    site: &ObservingSite,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Vec<(DateTime<Utc>, CrossingDirection)> {
    let track = SunTrack { ephemeris, site };
    let window = Period::new(to_mjd(from), to_mjd(to));
    crossings(&track, &site.geodetic(), window, SUN_HORIZON, search_opts())
        .into_iter()
        .filter_map(|event| Some((from_mjd(event.mjd)?, event.direction)))
        .inspect(|(at, direction)| trace!("{direction:?} of the Sun at {at} ({})", site.name()))
        .collect()
}

/// Next sunset/sunrise pair for a night that is upcoming or in progress.
///
/// When `at` already falls between a sunset and the following sunrise the
/// returned sunset is the *previous* one, so the pair always brackets a
/// single night and `sunset < sunrise`.
pub fn next_sunset_sunrise<E: Ephemeris + ?Sized>(
    ephemeris: &E,
    site: &ObservingSite,
    at: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), EphemerisError> {
    let span_hours = SCAN_SPAN.num_hours() as f64;
    let no_sunset = || EphemerisError::NoSunset {
        site: site.name().to_string(),
        from: at,
        span_hours,
    };
    let first = |events: &[(DateTime<Utc>, CrossingDirection)], wanted: CrossingDirection| {
        events
            .iter()
            .find(|(_, direction)| *direction == wanted)
            .map(|(t, _)| *t)
    };

    let start = at + FORWARD_GAP;
    let ahead = sun_crossings(ephemeris, site, start, start + SCAN_SPAN);
    let sunrise = first(&ahead, CrossingDirection::Rising).ok_or_else(|| {
        EphemerisError::NoSunrise {
            site: site.name().to_string(),
            from: at,
            span_hours,
        }
    })?;
    let mut sunset = first(&ahead, CrossingDirection::Setting).ok_or_else(no_sunset)?;

    if sunset > sunrise {
        sunset = sun_crossings(ephemeris, site, at - SCAN_SPAN, at)
            .iter()
            .rev()
            .find(|(_, direction)| *direction == CrossingDirection::Setting)
            .map(|(t, _)| *t)
            .ok_or_else(no_sunset)?;
    }
    Ok((sunset, sunrise))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::testing::SinusoidalSky;
    use crate::ephemeris::SiderustEphemeris;
    use chrono::{Datelike, TimeZone, Timelike};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn daytime_reference_gives_tonight() {
        let sky = SinusoidalSky::new(Degrees::new(-30.0));
        let site = ObservingSite::cta_north();
        let (set, rise) = next_sunset_sunrise(&sky, &site, utc(2021, 2, 10, 12, 0)).unwrap();
        assert_eq!((set.day(), set.hour(), set.minute()), (10, 18, 3));
        assert_eq!((rise.day(), rise.hour(), rise.minute()), (11, 5, 56));
    }

    #[test]
    fn night_reference_gives_the_night_in_progress() {
        let sky = SinusoidalSky::new(Degrees::new(-30.0));
        let site = ObservingSite::cta_north();
        let at = utc(2021, 2, 10, 2, 0);
        let (set, rise) = next_sunset_sunrise(&sky, &site, at).unwrap();
        assert!(set < at);
        assert_eq!((set.day(), set.hour()), (9, 18));
        assert_eq!((rise.day(), rise.hour()), (10, 5));
    }

    #[test]
    fn crossings_resolve_to_a_second() {
        let sky = SinusoidalSky::new(Degrees::new(-30.0));
        let site = ObservingSite::cta_north();
        let from = utc(2021, 2, 10, 12, 0);
        let events = sun_crossings(&sky, &site, from, from + TimeDelta::hours(24));
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].1, CrossingDirection::Setting);
        assert_eq!(events[1].1, CrossingDirection::Rising);
        // The Sun moves ≈ 0.01° per second near the horizon.
        for (at, _) in events {
            let altitude = sky.sun_altitude(&site, at);
            assert!((altitude - SUN_HORIZON).abs() < Degrees::new(0.01), "{altitude} at {at}");
        }
    }

    #[test]
    fn cta_north_february_sunset_and_sunrise() {
        let site = ObservingSite::cta_north();
        let (set, rise) =
            next_sunset_sunrise(&SiderustEphemeris, &site, utc(2021, 2, 10, 12, 0)).unwrap();
        // La Palma, mid-February: sunset ≈ 18:50 UT, sunrise ≈ 07:55 UT
        assert_eq!(set.day(), 10);
        assert!((18..=19).contains(&set.hour()), "sunset {set}");
        assert_eq!(rise.day(), 11);
        assert!((7..=8).contains(&rise.hour()), "sunrise {rise}");
    }

    #[test]
    fn polar_day_has_no_sunset() {
        let site = ObservingSite::new(
            "Pole",
            Degrees::new(89.0),
            Degrees::new(0.0),
            Meters::new(0.0),
        )
        .unwrap();
        let err =
            next_sunset_sunrise(&SiderustEphemeris, &site, utc(2021, 6, 21, 0, 0)).unwrap_err();
        assert!(matches!(
            err,
            EphemerisError::NoSunrise { .. } | EphemerisError::NoSunset { .. }
        ));
    }

    #[test]
    fn midnight_sun_has_no_sunrise_ahead() {
        let from = utc(2021, 2, 10, 12, 0);
        let sky = SinusoidalSky::new(Degrees::new(-30.0)).with_midnight_sun_from(from);
        let err = next_sunset_sunrise(&sky, &ObservingSite::cta_north(), from).unwrap_err();
        assert!(matches!(err, EphemerisError::NoSunrise { .. }));
    }
}
