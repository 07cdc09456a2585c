// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Stage 1 driver: nights → samples → admissible instants → windows.

use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::alert::AlertEvent;
use crate::config::{ExtractionMode, WindowSearchConfig};
use crate::coords::ObservingSite;
use crate::ephemeris::Ephemeris;
use crate::error::{Error, Result};
use crate::night::{sample_night, setup_nights, Night};
use crate::visibility::admissibility_mask;
use crate::window::{extract_contiguous, extract_window, ObservationWindow};

/// Shared flag that stops a running search at the next night boundary.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A validated Stage 1 search bound to an ephemeris.
pub struct WindowSearch<'a, E: Ephemeris + ?Sized> {
    ephemeris: &'a E,
    config: WindowSearchConfig,
    cancel: CancellationToken,
}

impl<'a, E: Ephemeris + ?Sized> WindowSearch<'a, E> {
    /// Fails with [`Error::Configuration`] before any astronomy runs if
    /// `config` is out of range.
    pub fn new(ephemeris: &'a E, config: WindowSearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            ephemeris,
            config,
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &WindowSearchConfig {
        &self.config
    }

    /// The nights covered by the search horizon.
    pub fn nights(&self, alert: &AlertEvent, site: &ObservingSite) -> Result<Vec<Night>> {
        Ok(setup_nights(
            self.ephemeris,
            site,
            alert.alert_time,
            self.config.search_range(),
        )?)
    }

    /// Stage 1 for a single night.
    pub fn night_windows(
        &self,
        alert: &AlertEvent,
        site: &ObservingSite,
        night: &Night,
    ) -> Vec<ObservationWindow> {
        let candidates = sample_night(night, self.config.precision());
        let mask = admissibility_mask(self.ephemeris, alert, &self.config, site, &candidates);

        let windows = match self.config.extraction {
            ExtractionMode::Span => {
                let admissible: Vec<_> = candidates
                    .iter()
                    .zip(&mask)
                    .filter_map(|(&at, &ok)| ok.then_some(at))
                    .collect();
                extract_window(&admissible, alert.alert_time).into_iter().collect()
            }
            ExtractionMode::Contiguous => extract_contiguous(&candidates, &mask, alert.alert_time),
        };
        debug!(
            "night of {}: {} candidates, {} admissible, {} window(s)",
            night.evening_date,
            candidates.len(),
            mask.iter().filter(|ok| **ok).count(),
            windows.len()
        );
        windows
    }

    fn checked_night_windows(
        &self,
        alert: &AlertEvent,
        site: &ObservingSite,
        night: &Night,
    ) -> Result<Vec<ObservationWindow>> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(self.night_windows(alert, site, night))
    }

    /// Stage 1 over the whole horizon, windows in night order.
    ///
    /// The cancellation token is checked before each night; a cancelled
    /// search returns [`Error::Cancelled`]. Ephemeris failures abort the
    /// search.
    pub fn run(&self, alert: &AlertEvent, site: &ObservingSite) -> Result<Vec<ObservationWindow>> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let nights = self.nights(alert, site)?;

        #[cfg(feature = "parallel")]
        let per_night: Vec<Vec<ObservationWindow>> = {
            use rayon::prelude::*;
            nights
                .par_iter()
                .map(|night| self.checked_night_windows(alert, site, night))
                .collect::<Result<_>>()?
        };

        #[cfg(not(feature = "parallel"))]
        let per_night: Vec<Vec<ObservationWindow>> = nights
            .iter()
            .map(|night| self.checked_night_windows(alert, site, night))
            .collect::<Result<_>>()?;

        let windows: Vec<_> = per_night.into_iter().flatten().collect();
        debug!(
            "{} window(s) over {} night(s) at {}",
            windows.len(),
            nights.len(),
            site.name()
        );
        Ok(windows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::SkyPosition;
    use crate::ephemeris::testing::SinusoidalSky;
    use chrono::{DateTime, TimeZone, Timelike, Utc};
    use qtty::*;

    fn alert_at(h: u32, m: u32) -> AlertEvent {
        AlertEvent::new(
            SkyPosition::new(262.81, 14.65).unwrap(),
            Utc.with_ymd_and_hms(2021, 2, 10, h, m, 0).unwrap(),
        )
    }

    fn config(hours: f64) -> WindowSearchConfig {
        WindowSearchConfig::new(hours, 1.0, 60.0)
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let sky = SinusoidalSky::new(Degrees::new(-10.0));
        let result = WindowSearch::new(&sky, WindowSearchConfig::new(48.0, 0.0, 60.0));
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn one_window_per_dark_night() {
        let sky = SinusoidalSky::new(Degrees::new(-10.0));
        let site = ObservingSite::cta_north();
        let search = WindowSearch::new(&sky, config(48.0)).unwrap();
        let windows = search.run(&alert_at(12, 0), &site).unwrap();
        assert_eq!(windows.len(), 2);
        for w in &windows {
            // Astronomical darkness ≈ 19:47 → 04:13
            assert_eq!((w.start_time.hour(), w.start_time.minute()), (19, 47));
            assert_eq!((w.end_time.hour(), w.end_time.minute()), (4, 12));
            assert!(w.end_time >= w.start_time);
        }
        assert!(windows[0].delay_hours < windows[1].delay_hours);
    }

    #[test]
    fn alert_mid_window_trims_the_start() {
        let sky = SinusoidalSky::new(Degrees::new(-10.0));
        let site = ObservingSite::cta_north();
        let search = WindowSearch::new(&sky, config(12.0)).unwrap();
        let alert = alert_at(2, 0);
        let windows = search.run(&alert, &site).unwrap();
        assert_eq!(windows.len(), 1);
        assert!(windows[0].start_time > alert.alert_time);
        assert!(windows[0].delay_hours < 0.02);
    }

    #[test]
    fn contiguous_mode_splits_a_gapped_night() {
        // Target dips below 30° between 23:00 and 01:00.
        let sky = SinusoidalSky::new(Degrees::new(-10.0)).with_target(|t: DateTime<Utc>| {
            let h = t.hour();
            Degrees::new(if h == 23 || h == 0 { 20.0 } else { 60.0 })
        });
        let site = ObservingSite::cta_north();
        let alert = alert_at(12, 0);

        let span = WindowSearch::new(&sky, config(24.0)).unwrap().run(&alert, &site).unwrap();
        assert_eq!(span.len(), 1);

        let split = WindowSearch::new(&sky, config(24.0).with_extraction(ExtractionMode::Contiguous))
            .unwrap()
            .run(&alert, &site)
            .unwrap();
        assert_eq!(split.len(), 2);
        assert_eq!(split[0].start_time, span[0].start_time);
        assert_eq!(split[1].end_time, span[0].end_time);
        assert!(split[0].end_time.hour() == 22 && split[1].start_time.hour() == 1);
    }

    #[test]
    fn ephemeris_failure_on_a_later_night_discards_earlier_windows() {
        // The first night (10th → 11th) is normal; from noon on the 11th the
        // Sun never sets again, so the second rise/set query fails.
        let sky = SinusoidalSky::new(Degrees::new(-10.0))
            .with_midnight_sun_from(Utc.with_ymd_and_hms(2021, 2, 11, 12, 0, 0).unwrap());
        let site = ObservingSite::cta_north();
        let alert = alert_at(12, 0);

        let first_night = WindowSearch::new(&sky, config(12.0)).unwrap().run(&alert, &site);
        assert_eq!(first_night.unwrap().len(), 1);

        let result = WindowSearch::new(&sky, config(48.0)).unwrap().run(&alert, &site);
        assert!(matches!(result, Err(Error::Ephemeris(_))), "{result:?}");
    }

    #[test]
    fn cancelled_token_stops_the_search() {
        let sky = SinusoidalSky::new(Degrees::new(-10.0));
        let site = ObservingSite::cta_north();
        let token = CancellationToken::new();
        let search = WindowSearch::new(&sky, config(48.0))
            .unwrap()
            .with_cancellation(token.clone());
        token.cancel();
        assert!(matches!(search.run(&alert_at(12, 0), &site), Err(Error::Cancelled)));
    }

    #[test]
    fn horizon_monotonicity() {
        let sky = SinusoidalSky::new(Degrees::new(-10.0));
        let site = ObservingSite::cta_north();
        let alert = alert_at(9, 30);
        let mut previous = 0;
        for hours in [0.0, 6.0, 12.0, 24.0, 36.0, 48.0, 72.0] {
            let count = WindowSearch::new(&sky, config(hours))
                .unwrap()
                .run(&alert, &site)
                .unwrap()
                .len();
            assert!(count >= previous, "{hours} h gave {count} < {previous}");
            previous = count;
        }
        assert_eq!(previous, 3);
    }
}
