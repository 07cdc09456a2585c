// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Pipeline tasks and their state machine.
//!
//! ```text
//! Pending ──run()──▶ Computed ──filter()──▶ Filtered ──▶ Passed | Failed
//! ```
//!
//! `Passed` carries the task's output (the selected window, or the checked
//! parameter); `Failed` carries nothing and stops the pipeline.

use log::info;
use serde::{Deserialize, Serialize};

use super::parameter::{ParameterFilter, ParameterResult};
use crate::alert::AlertEvent;
use crate::config::{WindowFilterConfig, WindowSearchConfig};
use crate::coords::ObservingSite;
use crate::ephemeris::Ephemeris;
use crate::error::Result;
use crate::search::{CancellationToken, WindowSearch};
use crate::window::{filter_and_select, ObservationWindow};

/// The closed set of task kinds, with their options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TaskKind {
    /// Stage 1 search over the coming nights, then Stage 2 selection.
    ObservationWindow {
        task_options: WindowSearchConfig,
        filter_options: WindowFilterConfig,
    },
    /// Check on one measured parameter of the alert.
    Parameter { filter_options: ParameterFilter },
}

/// A named task as written in the pipeline file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    pub name: String,
    #[serde(flatten)]
    pub kind: TaskKind,
}

/// Everything a task may read while it runs.
pub struct TaskContext<'a> {
    pub ephemeris: &'a dyn Ephemeris,
    pub alert: &'a AlertEvent,
    pub site: &'a ObservingSite,
    pub cancel: CancellationToken,
}

/// Raw output of [`TaskKind::run`].
#[derive(Debug, Clone, PartialEq)]
pub enum TaskResult {
    Windows(Vec<ObservationWindow>),
    Parameter(ParameterResult),
}

/// Output of a task that passed its filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPayload {
    Window(ObservationWindow),
    Parameter(ParameterResult),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskState {
    Pending,
    Computed(TaskResult),
    Filtered(Option<TaskPayload>),
    Passed(TaskPayload),
    Failed,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Passed(_) | TaskState::Failed)
    }
}

impl TaskKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            TaskKind::ObservationWindow { .. } => "ObservationWindow",
            TaskKind::Parameter { .. } => "Parameter",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            TaskKind::ObservationWindow {
                task_options,
                filter_options,
            } => {
                task_options.validate()?;
                filter_options.validate()
            }
            // Comparison and operand are checked while parsing.
            TaskKind::Parameter { .. } => Ok(()),
        }
    }

    pub fn run(&self, ctx: &TaskContext<'_>) -> Result<TaskResult> {
        match self {
            TaskKind::ObservationWindow { task_options, .. } => {
                let search = WindowSearch::new(ctx.ephemeris, task_options.clone())?
                    .with_cancellation(ctx.cancel.clone());
                Ok(TaskResult::Windows(search.run(ctx.alert, ctx.site)?))
            }
            TaskKind::Parameter { filter_options } => Ok(TaskResult::Parameter(ParameterResult {
                parameter_name: filter_options.name.clone(),
                parameter_ok: filter_options.evaluate(ctx.alert),
            })),
        }
    }

    /// `None` when the result does not satisfy the filter options.
    pub fn filter(&self, result: TaskResult) -> Option<TaskPayload> {
        match (self, result) {
            (TaskKind::ObservationWindow { filter_options, .. }, TaskResult::Windows(windows)) => {
                filter_and_select(&windows, filter_options).map(TaskPayload::Window)
            }
            (TaskKind::Parameter { .. }, TaskResult::Parameter(outcome)) => {
                outcome.parameter_ok.then_some(TaskPayload::Parameter(outcome))
            }
            _ => None,
        }
    }
}

/// A task instance moving through its states.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    name: String,
    kind: TaskKind,
    state: TaskState,
}

impl Task {
    /// Fails with a configuration error if the options are out of range.
    pub fn new(config: TaskConfig) -> Result<Self> {
        config.kind.validate()?;
        Ok(Self {
            name: config.name,
            kind: config.kind,
            state: TaskState::Pending,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    pub fn state(&self) -> &TaskState {
        &self.state
    }

    /// Advance by one transition. Terminal states stay put.
    pub fn step(&mut self, ctx: &TaskContext<'_>) -> Result<()> {
        let state = std::mem::replace(&mut self.state, TaskState::Failed);
        self.state = match state {
            TaskState::Pending => TaskState::Computed(self.kind.run(ctx)?),
            TaskState::Computed(result) => TaskState::Filtered(self.kind.filter(result)),
            TaskState::Filtered(Some(payload)) => TaskState::Passed(payload),
            TaskState::Filtered(None) => TaskState::Failed,
            terminal => terminal,
        };
        Ok(())
    }

    /// Run to a terminal state.
    pub fn execute(&mut self, ctx: &TaskContext<'_>) -> Result<&TaskState> {
        while !self.state.is_terminal() {
            self.step(ctx)?;
        }
        info!(
            "task '{}' ({}): {}",
            self.name,
            self.kind.type_name(),
            if self.passed() { "passed" } else { "failed" }
        );
        Ok(&self.state)
    }

    pub fn passed(&self) -> bool {
        matches!(self.state, TaskState::Passed(_))
    }

    pub fn output(&self) -> Option<&TaskPayload> {
        match &self.state {
            TaskState::Passed(payload) => Some(payload),
            _ => None,
        }
    }
}
