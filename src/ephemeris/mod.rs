// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Solar, lunar and target altitudes as seen from an observing site.
//!
//! The search only needs two things from an ephemeris: the Sun's altitude
//! at an instant (for the rise/set search) and, for a whole night of
//! sample instants at once, the altitudes of the Sun, the Moon and the
//! target. Both live on the [`Ephemeris`] trait so the astronomy can be
//! swapped for a synthetic sky in tests.
//!
//! [`SiderustEphemeris`] is the bundled implementation. Every altitude is
//! topocentric and geometric (no refraction):
//!
//! | Body   | `siderust` source |
//! |--------|-------------------|
//! | Sun    | `bodies::solar_system::Sun` (VSOP87) |
//! | Moon   | `bodies::solar_system::Moon` (ELP2000) |
//! | Target | ICRS direction from the alert |

mod almanac;

pub use almanac::{next_sunset_sunrise, SUN_HORIZON};

use chrono::{DateTime, Utc};
use qtty::*;
use siderust::bodies::solar_system::{Moon, Sun};
use siderust::calculus::altitude::AltitudePeriodsProvider;
use siderust::coordinates::centers::Geodetic;
use siderust::coordinates::frames::ECEF;
use tempoch::ModifiedJulianDate;

use crate::coords::{ObservingSite, SkyPosition};
use crate::instant::to_mjd;

/// Altitudes of the three bodies that gate observability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyState {
    pub sun: Degrees,
    pub moon: Degrees,
    pub target: Degrees,
}

/// Source of positions for the window search.
pub trait Ephemeris: Send + Sync {
    /// Altitude of the Sun's centre.
    fn sun_altitude(&self, site: &ObservingSite, at: DateTime<Utc>) -> Degrees;

    /// Sun, Moon and target altitudes at every instant in `times`, in the
    /// same order.
    fn observe(
        &self,
        site: &ObservingSite,
        target: &SkyPosition,
        times: &[DateTime<Utc>],
    ) -> Vec<SkyState>;
}

/// Ephemeris backed by the `siderust` VSOP87 / ELP2000 series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SiderustEphemeris;

#[inline]
fn altitude_of<B: AltitudePeriodsProvider>(
    body: &B,
    observer: &Geodetic<ECEF>,
    mjd: ModifiedJulianDate,
) -> Degrees {
    body.altitude_at(observer, mjd).to::<Degree>()
}

impl Ephemeris for SiderustEphemeris {
    fn sun_altitude(&self, site: &ObservingSite, at: DateTime<Utc>) -> Degrees {
        altitude_of(&Sun, &site.geodetic(), to_mjd(at))
    }

    fn observe(
        &self,
        site: &ObservingSite,
        target: &SkyPosition,
        times: &[DateTime<Utc>],
    ) -> Vec<SkyState> {
        let observer = site.geodetic();
        let direction = target.direction();
        times
            .iter()
            .map(|&at| {
                let mjd = to_mjd(at);
                SkyState {
                    sun: altitude_of(&Sun, &observer, mjd),
                    moon: altitude_of(&Moon, &observer, mjd),
                    target: altitude_of(&direction, &observer, mjd),
                }
            })
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn observe_preserves_order_and_length() {
        let site = ObservingSite::cta_north();
        let target = SkyPosition::new(262.81, 14.65).unwrap();
        let start = Utc.with_ymd_and_hms(2021, 2, 10, 0, 0, 0).unwrap();
        let times: Vec<_> = (0..6).map(|h| start + chrono::TimeDelta::hours(h)).collect();
        let states = SiderustEphemeris.observe(&site, &target, &times);
        assert_eq!(states.len(), times.len());
        for (state, at) in states.iter().zip(&times) {
            assert_eq!(state.sun, SiderustEphemeris.sun_altitude(&site, *at));
        }
    }

    #[test]
    fn sun_is_down_at_la_palma_midnight_and_up_at_noon() {
        let site = ObservingSite::cta_north();
        let midnight = Utc.with_ymd_and_hms(2021, 2, 10, 0, 0, 0).unwrap();
        let noon = Utc.with_ymd_and_hms(2021, 2, 10, 13, 15, 0).unwrap();
        assert!(SiderustEphemeris.sun_altitude(&site, midnight) < Degrees::new(-40.0));
        // Upper culmination: 90 − φ + δ with δ ≈ −14.3°
        let culmination = SiderustEphemeris.sun_altitude(&site, noon);
        assert!(
            (culmination.value() - 46.9).abs() < 1.0,
            "noon altitude {culmination}"
        );
    }

    #[test]
    fn moon_altitude_is_bounded_and_moves() {
        let site = ObservingSite::cta_north();
        let target = SkyPosition::new(262.81, 14.65).unwrap();
        let t1 = Utc.with_ymd_and_hms(2021, 2, 10, 0, 0, 0).unwrap();
        let t2 = t1 + chrono::TimeDelta::hours(3);
        let states = SiderustEphemeris.observe(&site, &target, &[t1, t2]);
        for state in &states {
            assert!(state.moon.abs() <= Degrees::new(90.0));
        }
        assert_ne!(states[0].moon, states[1].moon);
    }

    #[test]
    fn target_rises_before_dawn_in_february() {
        // RA 262.81° transits at La Palma around 09:30 UTC in mid-February,
        // so it climbs through 30° in the small hours.
        let site = ObservingSite::cta_north();
        let target = SkyPosition::new(262.8109, 14.6481).unwrap();
        let t1 = Utc.with_ymd_and_hms(2021, 2, 10, 3, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2021, 2, 10, 6, 0, 0).unwrap();
        let states = SiderustEphemeris.observe(&site, &target, &[t1, t2]);
        assert!(states[1].target > states[0].target);
        assert!(states[1].target > Degrees::new(30.0));
    }
}
