// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Alert follow-up pipeline.
//!
//! A pipeline is read from YAML and holds a site, an ordered list of tasks
//! and an ordered list of post-actions:
//!
//! ```yaml
//! site:
//!   name: CTA-North
//!   latitude_deg: 28.7619
//!   longitude_deg: -18.89
//!   elevation_m: 2200
//! tasks:
//!   - name: ParameterCountRate
//!     type: Parameter
//!     filter_options:
//!       parameter_name: count_rate
//!       parameter_requirement: 1000.0
//!       parameter_comparison: greater
//!   - name: ObservationWindowTask
//!     type: ObservationWindow
//!     task_options:
//!       search_range_hours: 48
//!       precision_minutes: 1
//!       max_zenith_deg: 60
//!     filter_options:
//!       min_window_duration_hours: 0.1
//!       max_window_delay_hours: 50
//!       window_selection: longest
//! post_actions:
//!   - type: CreateWobbleSchedulingBlock
//!     wobble: { offsets: [0.4, 0.4], angles: [0, 180] }
//!     proposal: { proposal_id: 1, proposal_class: A, proposal_rank: 1.0 }
//!   - type: CreateObservationBlocks
//!     min_block_duration_minutes: 20
//!     max_block_duration_minutes: 40
//! ```
//!
//! Tasks run in order and the pipeline stops at the first one that fails.
//! Post-actions only run when every task passed; the first consumes the
//! window selected by the first `ObservationWindow` task and each later one
//! consumes its predecessor's artefact.

mod parameter;
mod post_action;
mod task;

pub use parameter::{Comparison, ParameterFilter, ParameterResult};
pub use post_action::{
    observation_blocks, scheduling_block, Artifact, ArtifactKind, ObservationBlock,
    ObservationBlockOptions, PostActionConfig, Proposal, SchedulingBlock, TimeConstraints, Wobble,
};
pub use task::{Task, TaskConfig, TaskContext, TaskKind, TaskPayload, TaskResult, TaskState};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::alert::AlertEvent;
use crate::coords::ObservingSite;
use crate::ephemeris::Ephemeris;
use crate::error::{Error, Result};
use crate::search::CancellationToken;

/// Pipeline definition as read from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub site: ObservingSite,
    pub tasks: Vec<TaskConfig>,
    #[serde(default)]
    pub post_actions: Vec<PostActionConfig>,
}

impl PipelineConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}

/// One task's line in the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskReport {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<TaskPayload>,
}

/// Everything a pipeline run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub site: String,
    pub alert: AlertEvent,
    /// Only the tasks that ran; a failed task is the last entry.
    pub tasks: Vec<TaskReport>,
    /// Artefacts in post-action order; empty unless every task passed.
    pub artifacts: Vec<Artifact>,
    pub passed: bool,
}

impl PipelineReport {
    /// The artefact produced by the last post-action, if any ran.
    pub fn final_artifact(&self) -> Option<&Artifact> {
        self.artifacts.last()
    }
}

/// A validated pipeline bound to an ephemeris.
pub struct Pipeline<'a> {
    ephemeris: &'a dyn Ephemeris,
    site: ObservingSite,
    tasks: Vec<TaskConfig>,
    post_actions: Vec<PostActionConfig>,
    cancel: CancellationToken,
}

impl<'a> Pipeline<'a> {
    /// Validate every task and post-action, and check that each post-action
    /// can consume what its predecessor produces.
    pub fn from_config(config: PipelineConfig, ephemeris: &'a dyn Ephemeris) -> Result<Self> {
        for task in &config.tasks {
            task.kind
                .validate()
                .map_err(|e| Error::config(format!("task '{}': {e}", task.name)))?;
        }

        let has_window_task = config
            .tasks
            .iter()
            .any(|t| matches!(t.kind, TaskKind::ObservationWindow { .. }));
        if !config.post_actions.is_empty() && !has_window_task {
            return Err(Error::config(
                "post-actions need an ObservationWindow task to start from",
            ));
        }

        let mut produced = ArtifactKind::Window;
        for action in &config.post_actions {
            action
                .validate()
                .map_err(|e| Error::config(format!("{}: {e}", action.name())))?;
            if action.input_kind() != produced {
                return Err(Error::config(format!(
                    "{} expects {:?} but the previous step produces {:?}",
                    action.name(),
                    action.input_kind(),
                    produced
                )));
            }
            produced = action.output_kind();
        }

        Ok(Self {
            ephemeris,
            site: config.site,
            tasks: config.tasks,
            post_actions: config.post_actions,
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn site(&self) -> &ObservingSite {
        &self.site
    }

    /// Run the tasks and, if they all pass, the post-actions.
    ///
    /// A task that does not pass is reported, not returned as an error.
    /// Configuration, ephemeris and cancellation errors abort the run.
    pub fn run(&self, alert: &AlertEvent) -> Result<PipelineReport> {
        let ctx = TaskContext {
            ephemeris: self.ephemeris,
            alert,
            site: &self.site,
            cancel: self.cancel.clone(),
        };

        let mut reports = Vec::with_capacity(self.tasks.len());
        let mut selected = None;
        let mut passed = true;

        for config in &self.tasks {
            let mut task = Task::new(config.clone())?;
            task.execute(&ctx)?;
            let output = task.output().cloned();
            if let (None, Some(TaskPayload::Window(window))) = (&selected, &output) {
                selected = Some(*window);
            }
            reports.push(TaskReport {
                name: task.name().to_string(),
                kind: task.kind().type_name(),
                passed: task.passed(),
                output,
            });
            if !task.passed() {
                warn!("task '{}' did not pass, skipping the rest of the pipeline", task.name());
                passed = false;
                break;
            }
        }

        let mut artifacts: Vec<Artifact> = Vec::with_capacity(self.post_actions.len());
        if passed {
            if let Some(window) = selected {
                let mut current = Artifact::Window(window);
                for action in &self.post_actions {
                    current = action.run(alert, &current)?;
                    info!("post-action {} produced {:?}", action.name(), current.kind());
                    artifacts.push(current.clone());
                }
            }
        }

        Ok(PipelineReport {
            site: self.site.name().to_string(),
            alert: alert.clone(),
            tasks: reports,
            artifacts,
            passed,
        })
    }
}
