// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Follow-up planning for transient alerts.
//!
//! Given where an alert points on the sky, when it arrived and where the
//! telescope is, find the spans of the coming nights during which the
//! target can be observed, then pick one by policy.
//!
//! # Stages
//!
//! | Stage | Module | Does |
//! |-------|--------|------|
//! | Nights | [`setup_nights`] | sunset → sunrise intervals over the search horizon |
//! | Sampling | [`sample_night`] | evenly spaced instants across one night |
//! | Visibility | [`admissible_times`] | instants with Sun, Moon and target inside their limits |
//! | Stage 1 | [`WindowSearch`] | one window per night (or per contiguous run) |
//! | Stage 2 | [`filter_and_select`] | duration/delay filter, then `earliest` or `longest` |
//!
//! The [`pipeline`] module wraps the search with parameter checks and
//! post-actions (scheduling block, observation blocks) driven by a YAML
//! file.
//!
//! # Astronomy
//!
//! Altitudes come through the [`Ephemeris`] trait. [`SiderustEphemeris`]
//! implements it on top of `siderust` (VSOP87 Sun, ELP2000 Moon, ICRS
//! targets); UTC instants reach it as `tempoch` MJD on the TT axis, with
//! ΔT applied by `tempoch`.
//!
//! # Example
//!
//! ```no_run
//! use chrono::{TimeZone, Utc};
//! use followup::{
//!     filter_and_select, AlertEvent, SiderustEphemeris, ObservingSite, SkyPosition,
//!     WindowFilterConfig, WindowSearch, WindowSearchConfig,
//! };
//!
//! let alert = AlertEvent::new(
//!     SkyPosition::new(262.81, 14.65)?,
//!     Utc.with_ymd_and_hms(2021, 2, 10, 2, 0, 27).unwrap(),
//! );
//! let site = ObservingSite::cta_north();
//! let search = WindowSearch::new(&SiderustEphemeris, WindowSearchConfig::new(48.0, 1.0, 60.0))?;
//! let windows = search.run(&alert, &site)?;
//! let filter = WindowFilterConfig {
//!     min_window_duration_hours: 0.1,
//!     max_window_delay_hours: 50.0,
//!     window_selection: "longest".parse()?,
//! };
//! if let Some(window) = filter_and_select(&windows, &filter) {
//!     println!("{window}");
//! }
//! # Ok::<(), followup::Error>(())
//! ```

mod alert;
mod config;
mod coords;
pub mod ephemeris;
mod error;
mod instant;
mod night;
pub mod pipeline;
mod search;
mod visibility;
mod window;

// ── Re-exports ────────────────────────────────────────────────────────────

pub use alert::{AlertEvent, ParameterValue};
pub use config::{ExtractionMode, WindowFilterConfig, WindowSearchConfig, MIN_PRECISION_MINUTES};
pub use coords::{offset_by, Equatorial, ObservingSite, SkyPosition};
pub use ephemeris::{next_sunset_sunrise, Ephemeris, SiderustEphemeris, SkyState, SUN_HORIZON};
pub use error::{EphemerisError, Error, Result};
pub use night::{sample_night, setup_nights, Night};
pub use search::{CancellationToken, WindowSearch};
pub use visibility::{admissibility_mask, admissible_times, VisibilityLimits};
pub use window::{
    extract_contiguous, extract_window, filter_and_select, filter_windows, select_window,
    ObservationWindow, SelectionPolicy,
};
