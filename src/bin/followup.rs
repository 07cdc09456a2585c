// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! followup: run an alert through a follow-up pipeline and print the
//! report as JSON.
//!
//! Exit status is 0 when every task passed, 2 when a task did not pass and
//! 1 on any error.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use log::info;

use followup::ephemeris::SiderustEphemeris;
use followup::pipeline::{Pipeline, PipelineConfig};
use followup::AlertEvent;

// ── CLI ─────────────────────────────────────────────────────────────

/// Compute an observation window for a transient alert.
#[derive(Parser, Debug)]
#[command(name = "followup", version, about)]
struct Cli {
    /// Pipeline definition (YAML).
    #[arg(long, short, default_value = "configs/pipeline.yaml")]
    config: PathBuf,

    /// Alert to process (JSON).
    #[arg(long, short)]
    alert: PathBuf,

    /// Pretty-print the report.
    #[arg(long)]
    pretty: bool,
}

// ── main ────────────────────────────────────────────────────────────

fn run(cli: &Cli) -> anyhow::Result<bool> {
    let config = PipelineConfig::from_file(&cli.config)
        .with_context(|| format!("loading pipeline {}", cli.config.display()))?;
    let alert = AlertEvent::from_json_file(&cli.alert)
        .with_context(|| format!("loading alert {}", cli.alert.display()))?;
    info!(
        "alert at {} (RA {}, Dec {})",
        alert.alert_time,
        alert.coords.ra(),
        alert.coords.dec()
    );

    let ephemeris = SiderustEphemeris;
    let pipeline = Pipeline::from_config(config, &ephemeris)?;
    let report = pipeline.run(&alert)?;

    let json = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(report.passed)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
