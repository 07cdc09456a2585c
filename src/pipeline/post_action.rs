// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Post-actions turn the selected window into schedulable artefacts.
//!
//! Each action consumes the artefact produced by the previous one:
//!
//! ```text
//! ObservationWindow ──CreateWobbleSchedulingBlock──▶ SchedulingBlock
//! SchedulingBlock   ──CreateObservationBlocks──────▶ [ObservationBlock]
//! ```

use chrono::{DateTime, Utc};
use qtty::*;
use serde::{Deserialize, Serialize};

use crate::alert::AlertEvent;
use crate::coords::{offset_by, SkyPosition};
use crate::error::{Error, Result};
use crate::instant::{elapsed, to_time_delta};
use crate::window::ObservationWindow;

// ═══════════════════════════════════════════════════════════════════════════
// Options
// ═══════════════════════════════════════════════════════════════════════════

/// Wobble pattern: the i-th pointing is `offsets[i]` degrees away from the
/// target at position angle `angles[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWobble")]
pub struct Wobble {
    offsets: Vec<f64>,
    angles: Vec<f64>,
}

#[derive(Deserialize)]
struct RawWobble {
    offsets: Vec<f64>,
    angles: Vec<f64>,
}

impl TryFrom<RawWobble> for Wobble {
    type Error = Error;

    fn try_from(raw: RawWobble) -> Result<Self> {
        Wobble::new(raw.offsets, raw.angles)
    }
}

impl Wobble {
    pub fn new(offsets: Vec<f64>, angles: Vec<f64>) -> Result<Self> {
        if offsets.len() != angles.len() {
            return Err(Error::config(format!(
                "wobble offsets ({}) and angles ({}) must have the same length",
                offsets.len(),
                angles.len()
            )));
        }
        if offsets.is_empty() {
            return Err(Error::config("wobble needs at least one offset"));
        }
        Ok(Self { offsets, angles })
    }

    /// `(separation, position angle)` pairs, repeating forever.
    pub fn pointings(&self) -> impl Iterator<Item = (Degrees, Degrees)> + '_ {
        self.offsets
            .iter()
            .zip(&self.angles)
            .map(|(&o, &a)| (Degrees::new(o), Degrees::new(a)))
            .cycle()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProposal")]
pub struct Proposal {
    pub proposal_id: i64,
    pub proposal_class: String,
    pub proposal_rank: f64,
}

#[derive(Deserialize)]
struct RawProposal {
    proposal_id: i64,
    proposal_class: String,
    proposal_rank: f64,
}

impl TryFrom<RawProposal> for Proposal {
    type Error = Error;

    fn try_from(raw: RawProposal) -> Result<Self> {
        if raw.proposal_class.chars().count() > 1 {
            return Err(Error::config(format!(
                "proposal class '{}' must be a single character",
                raw.proposal_class
            )));
        }
        if !(raw.proposal_rank >= 0.0) {
            return Err(Error::config(format!(
                "proposal rank must be >= 0, got {}",
                raw.proposal_rank
            )));
        }
        Ok(Self {
            proposal_id: raw.proposal_id,
            proposal_class: raw.proposal_class,
            proposal_rank: raw.proposal_rank,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationBlockOptions {
    pub min_block_duration_minutes: f64,
    /// Upper bound on block length; blocks are currently cut at the minimum.
    pub max_block_duration_minutes: f64,
}

impl ObservationBlockOptions {
    pub fn validate(&self) -> Result<()> {
        let (min, max) = (self.min_block_duration_minutes, self.max_block_duration_minutes);
        if !(min.is_finite() && min > 0.0) {
            return Err(Error::config(format!(
                "min_block_duration_minutes must be > 0, got {min}"
            )));
        }
        if !(max >= min) {
            return Err(Error::config(format!(
                "max_block_duration_minutes ({max}) must be >= min_block_duration_minutes ({min})"
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn block_duration(&self) -> Minutes {
        Minutes::new(self.min_block_duration_minutes)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Artefacts
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeConstraints {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingBlock {
    pub coords: SkyPosition,
    pub time_constraints: TimeConstraints,
    pub wobble_options: Wobble,
    pub proposal: Proposal,
}

/// One pointed exposure. Coordinates are in `[0, 360)` like the alert's.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationBlock {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub ra_target_deg: f64,
    pub dec_target_deg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Window,
    SchedulingBlock,
    ObservationBlocks,
}

/// Whatever the last pipeline step produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Artifact {
    Window(ObservationWindow),
    SchedulingBlock(SchedulingBlock),
    ObservationBlocks(Vec<ObservationBlock>),
}

impl Artifact {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Artifact::Window(_) => ArtifactKind::Window,
            Artifact::SchedulingBlock(_) => ArtifactKind::SchedulingBlock,
            Artifact::ObservationBlocks(_) => ArtifactKind::ObservationBlocks,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Actions
// ═══════════════════════════════════════════════════════════════════════════

/// A post-action as written in the pipeline file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PostActionConfig {
    CreateWobbleSchedulingBlock { wobble: Wobble, proposal: Proposal },
    CreateObservationBlocks(ObservationBlockOptions),
}

impl PostActionConfig {
    pub fn name(&self) -> &'static str {
        match self {
            PostActionConfig::CreateWobbleSchedulingBlock { .. } => "CreateWobbleSchedulingBlock",
            PostActionConfig::CreateObservationBlocks(_) => "CreateObservationBlocks",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            // Wobble and proposal are checked while parsing.
            PostActionConfig::CreateWobbleSchedulingBlock { .. } => Ok(()),
            PostActionConfig::CreateObservationBlocks(options) => options.validate(),
        }
    }

    pub fn input_kind(&self) -> ArtifactKind {
        match self {
            PostActionConfig::CreateWobbleSchedulingBlock { .. } => ArtifactKind::Window,
            PostActionConfig::CreateObservationBlocks(_) => ArtifactKind::SchedulingBlock,
        }
    }

    pub fn output_kind(&self) -> ArtifactKind {
        match self {
            PostActionConfig::CreateWobbleSchedulingBlock { .. } => ArtifactKind::SchedulingBlock,
            PostActionConfig::CreateObservationBlocks(_) => ArtifactKind::ObservationBlocks,
        }
    }

    pub fn run(&self, alert: &AlertEvent, input: &Artifact) -> Result<Artifact> {
        match (self, input) {
            (
                PostActionConfig::CreateWobbleSchedulingBlock { wobble, proposal },
                Artifact::Window(window),
            ) => Ok(Artifact::SchedulingBlock(scheduling_block(
                alert, window, wobble, proposal,
            ))),
            (PostActionConfig::CreateObservationBlocks(options), Artifact::SchedulingBlock(block)) => {
                Ok(Artifact::ObservationBlocks(observation_blocks(block, options)))
            }
            (action, input) => Err(Error::config(format!(
                "{} cannot consume {:?}",
                action.name(),
                input.kind()
            ))),
        }
    }
}

/// Scheduling block spanning the selected window.
pub fn scheduling_block(
    alert: &AlertEvent,
    window: &ObservationWindow,
    wobble: &Wobble,
    proposal: &Proposal,
) -> SchedulingBlock {
    SchedulingBlock {
        coords: alert.coords,
        time_constraints: TimeConstraints {
            start_time: window.start_time,
            end_time: window.end_time,
        },
        wobble_options: wobble.clone(),
        proposal: proposal.clone(),
    }
}

/// Back-to-back blocks of the minimum duration filling the scheduling
/// block, pointings cycling through the wobble pattern.
pub fn observation_blocks(
    block: &SchedulingBlock,
    options: &ObservationBlockOptions,
) -> Vec<ObservationBlock> {
    let start = block.time_constraints.start_time;
    let available = elapsed(start, block.time_constraints.end_time).to::<Minute>();
    let length = options.block_duration();
    let count = (available.value() / length.value()).floor().max(0.0) as usize;

    let target = block.coords.equatorial();
    let at = |i: usize| start + to_time_delta((length * i as f64).to::<Second>());

    block
        .wobble_options
        .pointings()
        .take(count)
        .enumerate()
        .map(|(i, (separation, angle))| {
            let pointing = offset_by(target, angle, separation);
            ObservationBlock {
                start_time: at(i),
                end_time: at(i + 1),
                ra_target_deg: pointing.ra.wrap_pos().value(),
                dec_target_deg: pointing.dec.wrap_pos().value(),
            }
        })
        .collect()
}
