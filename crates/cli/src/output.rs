// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Text/JSON rendering for runs: an [`OutputFormat`]-driven set of
//! `print_*` helpers shared by every query subcommand.

use clap::ValueEnum;
use jobctl_core::Run;

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Render a single run.
pub fn print_run(run: &Run, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(run).unwrap_or_default());
        }
        OutputFormat::Text => print_run_line(run),
    }
}

/// Render `None` as a format-appropriate "nothing here" marker.
pub fn print_optional_run(run: Option<&Run>, format: OutputFormat) {
    match run {
        Some(run) => print_run(run, format),
        None => match format {
            OutputFormat::Json => println!("null"),
            OutputFormat::Text => println!("(none)"),
        },
    }
}

/// Render a list of runs, one per line in text mode.
pub fn print_runs(runs: &[Run], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(runs).unwrap_or_default());
        }
        OutputFormat::Text => {
            if runs.is_empty() {
                println!("(no runs)");
            }
            for run in runs {
                print_run_line(run);
            }
        }
    }
}

fn print_run_line(run: &Run) {
    let end = run
        .end
        .map(|e| e.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{:<28} {:<18} start={:<14} end={:<14} steps={}",
        run.id.to_string(),
        run.status.to_string(),
        run.start,
        end,
        format_steps(run),
    );
}

fn format_steps(run: &Run) -> String {
    run.steps
        .iter()
        .map(|(name, info)| format!("{name}:{}", info.status))
        .collect::<Vec<_>>()
        .join(",")
}
