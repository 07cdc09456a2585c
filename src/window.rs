// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Observation windows: extraction from admissible instants (Stage 1) and
//! filtering plus policy-based selection (Stage 2).

use chrono::{DateTime, Utc};
use log::debug;
use qtty::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::WindowFilterConfig;
use crate::error::Error;
use crate::instant::elapsed;

/// A span of one night during which the target is observable.
///
/// `delay_hours` counts from the alert to `start_time`; both it and
/// `duration_hours` are rounded to three decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationWindow {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub delay_hours: f64,
    pub duration_hours: f64,
}

#[inline]
fn round_hours(duration: Seconds) -> f64 {
    (duration.to::<Hour>().value() * 1_000.0).round() / 1_000.0
}

impl ObservationWindow {
    /// Window from `start` to `end` for an alert received at `alert_time`.
    pub fn from_span(start: DateTime<Utc>, end: DateTime<Utc>, alert_time: DateTime<Utc>) -> Self {
        Self {
            start_time: start,
            end_time: end,
            delay_hours: round_hours(elapsed(alert_time, start)),
            duration_hours: round_hours(elapsed(start, end)),
        }
    }

    #[inline]
    pub fn delay(&self) -> Hours {
        Hours::new(self.delay_hours)
    }

    #[inline]
    pub fn duration(&self) -> Hours {
        Hours::new(self.duration_hours)
    }
}

impl fmt::Display for ObservationWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {} (delay {:.3} h, duration {:.3} h)",
            self.start_time, self.end_time, self.delay_hours, self.duration_hours
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Stage 1
// ═══════════════════════════════════════════════════════════════════════════

/// Span-mode extraction: the first and last admissible instants after the
/// alert bound a single window, gaps included.
///
/// Returns `None` when nothing admissible follows the alert or when only a
/// single instant does.
pub fn extract_window(
    admissible: &[DateTime<Utc>],
    alert_time: DateTime<Utc>,
) -> Option<ObservationWindow> {
    let mut after_alert = admissible.iter().copied().filter(|t| *t > alert_time);
    let start = after_alert.next()?;
    let end = after_alert.last().unwrap_or(start);
    let window = ObservationWindow::from_span(start, end, alert_time);
    (window.duration_hours > 0.0).then_some(window)
}

/// Contiguous-mode extraction: every maximal run of consecutive admissible
/// candidates after the alert becomes its own window.
///
/// `mask[i]` tells whether `candidates[i]` passed the visibility filter.
pub fn extract_contiguous(
    candidates: &[DateTime<Utc>],
    mask: &[bool],
    alert_time: DateTime<Utc>,
) -> Vec<ObservationWindow> {
    let mut windows = Vec::new();
    let mut run: Option<(DateTime<Utc>, DateTime<Utc>)> = None;

    let mut close = |run: &mut Option<(DateTime<Utc>, DateTime<Utc>)>| {
        if let Some((start, end)) = run.take() {
            let window = ObservationWindow::from_span(start, end, alert_time);
            if window.duration_hours > 0.0 {
                windows.push(window);
            }
        }
    };

    for (&at, &ok) in candidates.iter().zip(mask) {
        if ok && at > alert_time {
            run = Some(match run {
                Some((start, _)) => (start, at),
                None => (at, at),
            });
        } else {
            close(&mut run);
        }
    }
    close(&mut run);
    windows
}

// ═══════════════════════════════════════════════════════════════════════════
// Stage 2
// ═══════════════════════════════════════════════════════════════════════════

/// How Stage 2 picks one window among the survivors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SelectionPolicy {
    /// Smallest delay after the alert.
    Earliest,
    /// Largest duration.
    Longest,
}

impl SelectionPolicy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SelectionPolicy::Earliest => "earliest",
            SelectionPolicy::Longest => "longest",
        }
    }
}

impl FromStr for SelectionPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "earliest" => Ok(SelectionPolicy::Earliest),
            "longest" => Ok(SelectionPolicy::Longest),
            other => Err(Error::config(format!(
                "unknown window selection policy '{other}' (expected 'earliest' or 'longest')"
            ))),
        }
    }
}

impl TryFrom<String> for SelectionPolicy {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SelectionPolicy> for String {
    fn from(policy: SelectionPolicy) -> Self {
        policy.as_str().to_string()
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Windows with `delay < max_window_delay_hours` and
/// `duration > min_window_duration_hours`, in their original order.
pub fn filter_windows(
    windows: &[ObservationWindow],
    config: &WindowFilterConfig,
) -> Vec<ObservationWindow> {
    windows
        .iter()
        .filter(|w| {
            w.delay_hours < config.max_window_delay_hours
                && w.duration_hours > config.min_window_duration_hours
        })
        .copied()
        .collect()
}

/// Pick one window by `policy`; ties go to the window listed first.
pub fn select_window(
    windows: &[ObservationWindow],
    policy: SelectionPolicy,
) -> Option<ObservationWindow> {
    let better = |candidate: &ObservationWindow, best: &ObservationWindow| match policy {
        SelectionPolicy::Earliest => candidate.delay_hours < best.delay_hours,
        SelectionPolicy::Longest => candidate.duration_hours > best.duration_hours,
    };
    windows.iter().copied().fold(None, |best, w| match best {
        Some(b) if !better(&w, &b) => Some(b),
        _ => Some(w),
    })
}

/// Stage 2: filter by the configured bounds, then select by policy.
///
/// `None` means no window survived; it is a clean negative, not an error.
pub fn filter_and_select(
    windows: &[ObservationWindow],
    config: &WindowFilterConfig,
) -> Option<ObservationWindow> {
    let survivors = filter_windows(windows, config);
    debug!(
        "{} of {} windows pass delay < {} h and duration > {} h",
        survivors.len(),
        windows.len(),
        config.max_window_delay_hours,
        config.min_window_duration_hours
    );
    select_window(&survivors, config.window_selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn alert() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 2, 10, 2, 0, 27).unwrap()
    }

    fn window(delay_h: f64, duration_h: f64) -> ObservationWindow {
        let start = alert() + TimeDelta::seconds((delay_h * 3600.0) as i64);
        let end = start + TimeDelta::seconds((duration_h * 3600.0) as i64);
        ObservationWindow::from_span(start, end, alert())
    }

    fn filter(min_dur: f64, max_delay: f64, policy: SelectionPolicy) -> WindowFilterConfig {
        WindowFilterConfig {
            min_window_duration_hours: min_dur,
            max_window_delay_hours: max_delay,
            window_selection: policy,
        }
    }

    #[test]
    fn test_from_span_rounds_to_three_decimals() {
        let start = alert() + TimeDelta::seconds(11_521);
        let end = start + TimeDelta::seconds(5_000);
        let w = ObservationWindow::from_span(start, end, alert());
        assert_eq!(w.delay_hours, 3.2);
        assert_eq!(w.duration_hours, 1.389);
        assert_eq!(w.delay(), Hours::new(3.2));
    }

    #[test]
    fn test_extract_drops_times_before_and_at_alert() {
        let times = [
            alert() - TimeDelta::minutes(5),
            alert(),
            alert() + TimeDelta::minutes(30),
            alert() + TimeDelta::minutes(90),
        ];
        let w = extract_window(&times, alert()).unwrap();
        assert_eq!(w.start_time, times[2]);
        assert_eq!(w.end_time, times[3]);
        assert_eq!(w.delay_hours, 0.5);
        assert_eq!(w.duration_hours, 1.0);
    }

    #[test]
    fn test_extract_empty_and_stale() {
        assert!(extract_window(&[], alert()).is_none());
        let stale = [alert() - TimeDelta::hours(2), alert() - TimeDelta::hours(1)];
        assert!(extract_window(&stale, alert()).is_none());
    }

    #[test]
    fn test_extract_single_instant_is_not_a_window() {
        let only = [alert() + TimeDelta::hours(1)];
        assert!(extract_window(&only, alert()).is_none());
    }

    #[test]
    fn test_span_mode_bridges_gaps() {
        let base = alert() + TimeDelta::hours(1);
        let times: Vec<_> = [0, 1, 2, 10, 11]
            .iter()
            .map(|m| base + TimeDelta::minutes(*m))
            .collect();
        let w = extract_window(&times, alert()).unwrap();
        assert_eq!(w.end_time - w.start_time, TimeDelta::minutes(11));
    }

    #[test]
    fn test_contiguous_mode_splits_gaps() {
        let base = alert() + TimeDelta::hours(1);
        let candidates: Vec<_> = (0..12).map(|m| base + TimeDelta::minutes(m)).collect();
        let mask = [
            true, true, true, false, false, false, false, false, false, false, true, true,
        ];
        let windows = extract_contiguous(&candidates, &mask, alert());
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].start_time, candidates[0]);
        assert_eq!(windows[0].end_time, candidates[2]);
        assert_eq!(windows[1].start_time, candidates[10]);
        assert_eq!(windows[1].end_time, candidates[11]);
    }

    #[test]
    fn test_contiguous_mode_respects_alert() {
        let candidates: Vec<_> = (-3..3).map(|m| alert() + TimeDelta::minutes(m * 10)).collect();
        let windows = extract_contiguous(&candidates, &[true; 6], alert());
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start_time, candidates[4]);
    }

    #[test]
    fn test_selection_earliest_and_longest() {
        let windows = [window(2.0, 1.0), window(5.0, 4.0)];
        let cfg = filter(0.0, 100.0, SelectionPolicy::Earliest);
        assert_eq!(filter_and_select(&windows, &cfg).unwrap().delay_hours, 2.0);
        let cfg = filter(0.0, 100.0, SelectionPolicy::Longest);
        assert_eq!(filter_and_select(&windows, &cfg).unwrap().duration_hours, 4.0);
    }

    #[test]
    fn test_filter_bounds_are_strict() {
        let windows = [window(2.0, 1.0), window(5.0, 4.0)];
        assert!(filter_windows(&windows, &filter(1.0, 100.0, SelectionPolicy::Longest))
            .iter()
            .all(|w| w.duration_hours != 1.0));
        assert!(filter_windows(&windows, &filter(0.0, 5.0, SelectionPolicy::Longest))
            .iter()
            .all(|w| w.delay_hours != 5.0));
        assert!(filter_and_select(&windows, &filter(4.0, 100.0, SelectionPolicy::Longest)).is_none());
    }

    #[test]
    fn test_no_survivors_is_none() {
        let windows = [window(3.2, 1.4)];
        assert!(filter_and_select(&windows, &filter(0.1, 0.01, SelectionPolicy::Earliest)).is_none());
        assert!(select_window(&[], SelectionPolicy::Longest).is_none());
    }

    #[test]
    fn test_ties_go_to_lowest_index() {
        let a = window(2.0, 3.0);
        let mut b = window(2.0, 3.0);
        b.end_time = b.end_time + TimeDelta::seconds(1);
        let windows = [a, b];
        assert_eq!(select_window(&windows, SelectionPolicy::Earliest), Some(a));
        assert_eq!(select_window(&windows, SelectionPolicy::Longest), Some(a));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("longest".parse::<SelectionPolicy>().unwrap(), SelectionPolicy::Longest);
        assert_eq!(" Earliest ".parse::<SelectionPolicy>().unwrap(), SelectionPolicy::Earliest);
        assert!(matches!(
            "latest".parse::<SelectionPolicy>(),
            Err(Error::Configuration(_))
        ));
        let json = serde_json::to_string(&SelectionPolicy::Longest).unwrap();
        assert_eq!(json, "\"longest\"");
        assert!(serde_json::from_str::<SelectionPolicy>("\"shortest\"").is_err());
    }
}
