// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jobctl - a thin operator CLI over the deployment job controller.
//!
//! Global `-o`/`-C` flags, a `clap::Subcommand` enum, anyhow error
//! formatting in `main`; the binary carries no business logic of its
//! own, and every subcommand is a direct forward to a
//! [`jobctl_engine::JobController`] method.

mod output;
mod profile_arg;
mod wiring;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jobctl_core::{ApplicationId, JobType, PlatformVersion, RunId};

use output::OutputFormat;

#[derive(Parser)]
#[command(name = "jobctl", version, about = "Operator CLI for the deployment job controller")]
struct Cli {
    /// Root directory the file-backed store reads and writes under.
    #[arg(short = 'C', long = "root", global = true, default_value = "./jobctl-data")]
    root: PathBuf,

    /// Output format.
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    /// Register a platform version as deployable (repeatable). `deploy`
    /// without `--platform-major` needs at least one of these, since
    /// platform discovery is genuinely external.
    #[arg(long = "known-platform", global = true)]
    known_platforms: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start a new run for (application, job type).
    Start {
        app: String,
        job_type: String,
        /// Target platform version, e.g. "8.400.10".
        #[arg(long)]
        platform: String,
        /// Target application build number.
        #[arg(long)]
        build: u64,
        /// Comma-separated step chain, e.g. "deploy,installTests,tests".
        #[arg(long, default_value = "deploy")]
        steps: String,
        /// Steps that should run even if a prior step failed.
        #[arg(long = "run-always")]
        run_always: Vec<String>,
        /// `step=status` overrides for what a step's failure maps to.
        #[arg(long = "fails-as")]
        fails_as: Vec<String>,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Finalize an active run into history, if it is ready.
    Finish { run_id: String },
    /// Mark an active run aborted.
    Abort {
        run_id: String,
        #[arg(long, default_value = "aborted by operator")]
        reason: String,
    },
    /// Abort a run and block until it settles.
    AbortWait { run_id: String },
    /// Deploy a package, resolving the target platform automatically.
    Deploy {
        app: String,
        job_type: String,
        /// Path to the application package to deploy.
        package: PathBuf,
        /// Restrict the platform to this major version.
        #[arg(long)]
        platform_major: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Submit a new application+test package pair, independent of any
    /// deployment.
    Submit {
        app: String,
        package: PathBuf,
        /// Path to the paired test package.
        #[arg(long)]
        test_package: Option<PathBuf>,
        /// Path to a JSON file of submission metadata.
        #[arg(long)]
        meta: Option<PathBuf>,
    },
    /// Delete all data for applications not named here.
    Gc {
        /// Applications considered live; everything else is collected.
        #[arg(required = true)]
        live: Vec<String>,
    },
    /// Show the active or most recently finished run.
    Run { run_id: String },
    /// Show the active run, if any, for (application, job type).
    Last { app: String, job_type: String },
    /// Show history for (application, job type).
    Runs { app: String, job_type: String },
    /// Show the most recently finished run, regardless of status.
    LastCompleted { app: String, job_type: String },
    /// Show the most recent successful run.
    LastSuccess { app: String, job_type: String },
    /// Show the oldest non-success run after the latest success.
    FirstFailing { app: String, job_type: String },
    /// List every active run, across every application.
    Active,
    /// List every active run for one application.
    ActiveApp { app: String },
    /// Show the status of a single run.
    Status { run_id: String },
    /// Show the status of the most recent run for (application, job type).
    DeploymentStatus { app: String, job_type: String },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let format = cli.output;
    let known_platforms = cli.known_platforms.into_iter().map(PlatformVersion::new).collect();
    let engine = wiring::build(cli.root, known_platforms, Default::default());
    let controller = &engine.controller;

    match cli.command {
        Command::Start {
            app,
            job_type,
            platform,
            build,
            steps,
            run_always,
            fails_as,
            reason,
        } => {
            let profile = profile_arg::linear_profile(&steps, &run_always, &fails_as)?;
            let versions = jobctl_core::Versions::new(
                PlatformVersion::new(platform),
                jobctl_core::ApplicationVersion::new(build),
            );
            let run = controller.start(
                &ApplicationId::new(app),
                &JobType::new(job_type),
                versions,
                false,
                profile,
                reason,
            )?;
            output::print_run(&run, format);
        }
        Command::Finish { run_id } => {
            controller.finish(&parse_run_id(&run_id)?)?;
        }
        Command::Abort { run_id, reason } => {
            controller.abort(&parse_run_id(&run_id)?, reason)?;
        }
        Command::AbortWait { run_id } => {
            controller.abort_and_wait(&parse_run_id(&run_id)?)?;
        }
        Command::Deploy {
            app,
            job_type,
            package,
            platform_major,
            dry_run,
        } => {
            let package_bytes =
                std::fs::read(&package).with_context(|| format!("reading {}", package.display()))?;
            let run = controller.deploy(
                &ApplicationId::new(app),
                &JobType::new(job_type),
                platform_major.map(PlatformVersion::new),
                &package_bytes,
                dry_run,
            )?;
            output::print_run(&run, format);
        }
        Command::Submit {
            app,
            package,
            test_package,
            meta,
        } => {
            let package_bytes =
                std::fs::read(&package).with_context(|| format!("reading {}", package.display()))?;
            let test_package_bytes = test_package
                .map(|path| -> Result<Vec<u8>> {
                    std::fs::read(&path).with_context(|| format!("reading {}", path.display()))
                })
                .transpose()?;
            let meta = meta
                .map(|path| -> Result<serde_json::Value> {
                    let text = std::fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    Ok(serde_json::from_str(&text)?)
                })
                .transpose()?;
            let build = controller.submit(
                &ApplicationId::new(app),
                &package_bytes,
                test_package_bytes.as_deref(),
                meta,
            )?;
            println!("{build}");
        }
        Command::Gc { live } => {
            let live = live.into_iter().map(ApplicationId::new).collect();
            controller.collect_garbage(&live)?;
        }
        Command::Run { run_id } => {
            let run = controller.run(&parse_run_id(&run_id)?)?;
            output::print_optional_run(run.as_ref(), format);
        }
        Command::Last { app, job_type } => {
            let run = controller.last(&ApplicationId::new(app), &JobType::new(job_type))?;
            output::print_optional_run(run.as_ref(), format);
        }
        Command::Runs { app, job_type } => {
            let runs = controller.runs(&ApplicationId::new(app), &JobType::new(job_type))?;
            output::print_runs(&runs, format);
        }
        Command::LastCompleted { app, job_type } => {
            let run =
                controller.last_completed(&ApplicationId::new(app), &JobType::new(job_type))?;
            output::print_optional_run(run.as_ref(), format);
        }
        Command::LastSuccess { app, job_type } => {
            let run = controller.last_success(&ApplicationId::new(app), &JobType::new(job_type))?;
            output::print_optional_run(run.as_ref(), format);
        }
        Command::FirstFailing { app, job_type } => {
            let run =
                controller.first_failing(&ApplicationId::new(app), &JobType::new(job_type))?;
            output::print_optional_run(run.as_ref(), format);
        }
        Command::Active => {
            output::print_runs(&controller.active()?, format);
        }
        Command::ActiveApp { app } => {
            output::print_runs(&controller.active_for_application(&ApplicationId::new(app))?, format);
        }
        Command::Status { run_id } => {
            print_status(controller.job_status(&parse_run_id(&run_id)?)?, format);
        }
        Command::DeploymentStatus { app, job_type } => {
            let status = controller
                .deployment_status(&ApplicationId::new(app), &JobType::new(job_type))?;
            print_status(status, format);
        }
    }

    Ok(())
}

fn parse_run_id(s: &str) -> Result<RunId> {
    let mut parts = s.splitn(3, '/');
    let (app, job_type, number) = match (parts.next(), parts.next(), parts.next()) {
        (Some(app), Some(job_type), Some(number)) => (app, job_type, number),
        _ => anyhow::bail!("run id must look like \"app/jobType/number\", got {s:?}"),
    };
    let number: u64 = number.parse().with_context(|| format!("invalid run number in {s:?}"))?;
    Ok(RunId::new(ApplicationId::new(app), JobType::new(job_type), number))
}

fn print_status(status: Option<jobctl_core::RunStatus>, format: OutputFormat) {
    match (status, format) {
        (Some(status), OutputFormat::Json) => println!("{}", serde_json::json!(status.to_string())),
        (Some(status), OutputFormat::Text) => println!("{status}"),
        (None, OutputFormat::Json) => println!("null"),
        (None, OutputFormat::Text) => println!("(none)"),
    }
}

