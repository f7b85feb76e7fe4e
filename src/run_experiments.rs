// SATEXP: Batch Experiments and Forwarding State Analysis for Satellite Network Simulations
// Copyright (C) 2024-2025 Roland Schmid <roschmi@ethz.ch> and Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
use std::{path::PathBuf, process::ExitCode, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;

use satexp::{
    experiments::{build_run_list, load_config, ExperimentConfig, Filter, RUNS_DIR},
    scheduler::{
        jobs_for_runs, JobLayout, JobScheduler, SchedulerConfig, SchedulerError, ScreenRunner,
    },
    util::{self, PathBufExt},
};
use satexp_utils::{local_shell, other::get_timestamp};

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Compile the simulator and execute all generated runs, each in its own detached screen session.
struct Args {
    /// Experiment configuration (json). Uses the built-in defaults if omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Root directory of the simulator. All commands are executed in this directory.
    #[arg(short, long, default_value = "../../")]
    simulator_root: PathBuf,
    /// Experiment directory, relative to the simulator root.
    #[arg(short, long, default_value = "experiments/a_b")]
    experiment_dir: PathBuf,
    /// Maximum number of simulations running at the same time.
    #[arg(short = 'j', long, default_value_t = 4)]
    max_parallel: usize,
    /// Seconds between two polls of the active sessions.
    #[arg(long, default_value_t = 2)]
    poll_interval: u64,
    /// Seconds to wait after launching a simulation.
    #[arg(long, default_value_t = 10)]
    launch_delay: u64,
    /// Only execute runs whose name contains this string.
    #[arg(short, long, default_value = "")]
    filter: String,
    /// Only execute runs whose name ends with this string.
    #[arg(long = "filter-end", default_value = "")]
    filter_end: String,
    /// Command building (and running) the simulator.
    #[arg(long, default_value = "./waf")]
    build_command: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    if let Err(e) = util::init_logging() {
        eprintln!("Cannot initialize logging: {e}");
    }

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            load_config(path).with_context(|| format!("cannot load the configuration {path:?}"))?
        }
        None => ExperimentConfig::default(),
    };
    let filter = Filter {
        name: args.filter,
        name_end: args.filter_end,
    };
    let runs: Vec<_> = build_run_list(&config)
        .context("invalid experiment configuration")?
        .into_iter()
        .filter(|run| filter.matches(run))
        .collect();
    log::info!("Selected {} runs", runs.len());

    let layout = JobLayout {
        simulator_root: args.simulator_root,
        experiment_dir: args.experiment_dir,
        build_command: args.build_command,
    };
    let runs_dir = layout.simulator_root.join(&layout.experiment_dir).then(RUNS_DIR);
    local_shell::make_full_dir(&runs_dir).with_context(|| format!("cannot create {runs_dir:?}"))?;

    let mut scheduler = JobScheduler::new(
        ScreenRunner::default(),
        SchedulerConfig {
            max_parallel: args.max_parallel,
            poll_interval: Duration::from_secs(args.poll_interval),
            launch_delay: Duration::from_secs(args.launch_delay),
            ..Default::default()
        },
    );

    // refuse to touch any log directory while other sessions are running.
    if let Err(e) = scheduler.check_no_stale_sessions().await {
        return stale_or_fail(e);
    }
    for run in &runs {
        layout
            .prepare_log_dir(run)
            .with_context(|| format!("cannot prepare the log directory of {}", run.name))?;
    }

    let report = match scheduler
        .run_all(layout.prepare_job(), jobs_for_runs(&layout, &runs))
        .await
    {
        Ok(report) => report,
        Err(e) => return stale_or_fail(e),
    };
    log::info!(
        "Executed {} runs in {:?} (at most {} sessions observed)",
        report.jobs.len(),
        report.duration,
        report.peak_active
    );

    let report_path = runs_dir.then_ts("scheduler_report_{}.json", &get_timestamp());
    std::fs::write(&report_path, serde_json::to_string_pretty(&report)?)
        .with_context(|| format!("cannot write {report_path:?}"))?;

    Ok(ExitCode::SUCCESS)
}

fn stale_or_fail(e: SchedulerError) -> Result<ExitCode> {
    match e {
        SchedulerError::StaleSessions(_) => {
            println!("{e}");
            Ok(ExitCode::FAILURE)
        }
        e => Err(e.into()),
    }
}
