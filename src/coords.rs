// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Sky positions and observing sites, plus the wobble offset used when
//! pointing off-source.
//!
//! Both types validate on construction and on deserialization. Their
//! [`SkyPosition::direction`] and [`ObservingSite::geodetic`] views are what
//! the `siderust` ephemeris consumes.

use qtty::*;
use serde::{Deserialize, Serialize};
use siderust::coordinates::centers::Geodetic;
use siderust::coordinates::frames::ECEF;
use siderust::coordinates::spherical::direction::ICRS;

use crate::error::Error;

#[inline]
fn degrees_from_radians(value: f64) -> Degrees {
    Radians::new(value).to::<Degree>()
}

// ═══════════════════════════════════════════════════════════════════════════
// SkyPosition
// ═══════════════════════════════════════════════════════════════════════════

/// Target coordinates (J2000) as carried by an alert.
///
/// Both components are accepted in `[0, 360)`; the declination is read as a
/// signed angle (350° is −10°) and must land inside `[-90, 90]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSkyPosition")]
pub struct SkyPosition {
    #[serde(rename = "raInDeg")]
    ra_deg: f64,
    #[serde(rename = "decInDeg")]
    dec_deg: f64,
}

#[derive(Deserialize)]
struct RawSkyPosition {
    #[serde(rename = "raInDeg")]
    ra_deg: f64,
    #[serde(rename = "decInDeg")]
    dec_deg: f64,
}

impl TryFrom<RawSkyPosition> for SkyPosition {
    type Error = Error;

    fn try_from(raw: RawSkyPosition) -> Result<Self, Self::Error> {
        SkyPosition::new(raw.ra_deg, raw.dec_deg)
    }
}

impl SkyPosition {
    pub fn new(ra_deg: f64, dec_deg: f64) -> Result<Self, Error> {
        if !(0.0..360.0).contains(&ra_deg) {
            return Err(Error::config(format!(
                "right ascension {ra_deg}° outside [0, 360)"
            )));
        }
        if !(0.0..360.0).contains(&dec_deg) {
            return Err(Error::config(format!(
                "declination {dec_deg}° outside [0, 360)"
            )));
        }
        let signed = Degrees::new(dec_deg).wrap_signed();
        if signed.abs() > Degrees::new(90.0) {
            return Err(Error::config(format!(
                "declination {dec_deg}° is not a valid latitude"
            )));
        }
        Ok(Self { ra_deg, dec_deg })
    }

    #[inline]
    pub fn ra(&self) -> Degrees {
        Degrees::new(self.ra_deg)
    }

    /// Signed declination in `[-90, 90]`.
    #[inline]
    pub fn dec(&self) -> Degrees {
        Degrees::new(self.dec_deg).wrap_signed()
    }

    #[inline]
    pub fn equatorial(&self) -> Equatorial {
        Equatorial {
            ra: self.ra(),
            dec: self.dec(),
        }
    }

    /// ICRS direction of the target.
    #[inline]
    pub fn direction(&self) -> ICRS {
        ICRS::new(self.ra(), self.dec())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ObservingSite
// ═══════════════════════════════════════════════════════════════════════════

/// Geodetic location of the observatory. Longitude is east-positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawObservingSite")]
pub struct ObservingSite {
    name: String,
    #[serde(rename = "latitude_deg")]
    latitude: f64,
    #[serde(rename = "longitude_deg")]
    longitude: f64,
    #[serde(rename = "elevation_m")]
    elevation: f64,
}

#[derive(Deserialize)]
struct RawObservingSite {
    name: String,
    latitude_deg: f64,
    longitude_deg: f64,
    #[serde(default)]
    elevation_m: f64,
}

impl TryFrom<RawObservingSite> for ObservingSite {
    type Error = Error;

    fn try_from(raw: RawObservingSite) -> Result<Self, Self::Error> {
        ObservingSite::new(
            raw.name,
            Degrees::new(raw.latitude_deg),
            Degrees::new(raw.longitude_deg),
            Meters::new(raw.elevation_m),
        )
    }
}

impl ObservingSite {
    pub fn new(
        name: impl Into<String>,
        latitude: Degrees,
        longitude: Degrees,
        elevation: Meters,
    ) -> Result<Self, Error> {
        let (lat, lon, elev) = (latitude.value(), longitude.value(), elevation.value());
        if !(-90.0..=90.0).contains(&lat) {
            return Err(Error::config(format!("latitude {lat}° outside [-90, 90]")));
        }
        if !(-180.0..360.0).contains(&lon) {
            return Err(Error::config(format!(
                "longitude {lon}° outside [-180, 360)"
            )));
        }
        if !elev.is_finite() {
            return Err(Error::config("elevation must be finite"));
        }
        Ok(Self {
            name: name.into(),
            latitude: lat,
            longitude: lon,
            elevation: elev,
        })
    }

    /// CTA North (MAGIC site), La Palma.
    pub fn cta_north() -> Self {
        Self {
            name: "CTA North".to_string(),
            latitude: 28.7619,
            longitude: -18.8900,
            elevation: 2200.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn latitude(&self) -> Degrees {
        Degrees::new(self.latitude)
    }

    pub fn longitude(&self) -> Degrees {
        Degrees::new(self.longitude)
    }

    pub fn elevation(&self) -> Meters {
        Meters::new(self.elevation)
    }

    /// WGS84 position of the site (longitude first).
    pub fn geodetic(&self) -> Geodetic<ECEF> {
        Geodetic::<ECEF>::new(self.longitude(), self.latitude(), self.elevation())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Pointing
// ═══════════════════════════════════════════════════════════════════════════

/// Right ascension / declination pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Equatorial {
    pub ra: Degrees,
    pub dec: Degrees,
}

/// Point reached by moving `separation` from `origin` along the great
/// circle at `position_angle` (east of north).
pub fn offset_by(origin: Equatorial, position_angle: Degrees, separation: Degrees) -> Equatorial {
    let (sin_d, cos_d) = origin.dec.sin_cos();
    let (sin_r, cos_r) = separation.sin_cos();
    let (sin_pa, cos_pa) = position_angle.sin_cos();

    let sin_d2 = (sin_d * cos_r + cos_d * sin_r * cos_pa).clamp(-1.0, 1.0);
    let dec = sin_d2.asin();
    let d_ra = (sin_pa * sin_r * cos_d).atan2(cos_r - sin_d * sin_d2);
    Equatorial {
        ra: (origin.ra + degrees_from_radians(d_ra)).wrap_pos(),
        dec: degrees_from_radians(dec),
    }
}
