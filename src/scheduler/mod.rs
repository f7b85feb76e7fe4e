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
//! Module that launches simulation runs as detached sessions, keeping at most a fixed number of
//! them running at the same time.
//!
//! The scheduler has no handle on the launched processes. The only signal it gets is the number
//! of currently active sessions, which it polls in fixed intervals (see [`JobRunner`]). Jobs are
//! launched in order; once launched, a job is considered completed as soon as all sessions are
//! gone, regardless of its exit code. The output of each job is captured in its log file.

pub mod runner;

pub use runner::*;

use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use serde::Serialize;

use crate::experiments::RunDescriptor;

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error(
        "There are {0} screen sessions already running. \
         Please kill all screens before running the experiments (killall screen)."
    )]
    StaleSessions(usize),
    #[error("At least one job must be allowed to run at the same time")]
    InvalidParallelism,
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot launch {job}: {reason}")]
    Launch { job: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobState {
    Pending,
    Launched,
    Completed,
}

/// An opaque shell command, executed in `working_dir`, with stdout and stderr captured in
/// `log_path` (relative to `working_dir`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    pub name: String,
    pub command: String,
    pub working_dir: PathBuf,
    pub log_path: PathBuf,
    pub state: JobState,
}

impl Job {
    pub fn new(
        name: impl Into<String>,
        command: impl Into<String>,
        working_dir: impl Into<PathBuf>,
        log_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            working_dir: working_dir.into(),
            log_path: log_path.into(),
            state: JobState::Pending,
        }
    }

    /// Location of the log file.
    pub fn log_file(&self) -> PathBuf {
        self.working_dir.join(&self.log_path)
    }

    /// The complete shell line: change into the working directory, run the command and copy
    /// its output into the log file.
    pub fn shell_line(&self) -> String {
        format!(
            "cd {}; {} 2>&1 | tee {}",
            shell_quote(&self.working_dir.to_string_lossy()),
            self.command,
            shell_quote(&self.log_path.to_string_lossy()),
        )
    }
}

/// Quote `s` as a single argument for `bash`.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Describes where the simulator lives and how it is invoked for a run.
#[derive(Debug, Clone)]
pub struct JobLayout {
    /// Root of the simulator; all jobs run in this directory.
    pub simulator_root: PathBuf,
    /// Experiment directory, relative to `simulator_root`.
    pub experiment_dir: PathBuf,
    /// Command building the simulator, executed once before all runs.
    pub build_command: String,
}

impl JobLayout {
    /// Log directory of a run, relative to `simulator_root`.
    pub fn log_dir(&self, run: &RunDescriptor) -> PathBuf {
        self.experiment_dir.join(run.run_dir()).join("logs_ns3")
    }

    /// The job compiling the simulator.
    pub fn prepare_job(&self) -> Job {
        Job::new(
            "compile",
            &self.build_command,
            &self.simulator_root,
            self.experiment_dir.join(crate::experiments::RUNS_DIR).join("compile.txt"),
        )
    }

    /// The job simulating `run`.
    pub fn job(&self, run: &RunDescriptor) -> Job {
        Job::new(
            &run.name,
            format!(
                "{} --run=\"{} --run_dir='{}'\"",
                self.build_command,
                run.client.program(),
                run.name
            ),
            &self.simulator_root,
            self.log_dir(run).join("console.txt"),
        )
    }

    /// Remove old logs of `run` and create an empty log directory.
    pub fn prepare_log_dir(&self, run: &RunDescriptor) -> std::io::Result<PathBuf> {
        let dir = self.simulator_root.join(self.log_dir(run));
        satexp_utils::local_shell::recreate_dir(&dir)?;
        Ok(dir)
    }
}

/// Polling and throttling parameters of the [`JobScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Maximum number of jobs running at the same time. This bound is checked by polling, so it
    /// is not enforced atomically.
    pub max_parallel: usize,
    /// Polling interval while waiting for a free slot and for the final jobs.
    pub poll_interval: Duration,
    /// Polling interval while waiting for the prepare job.
    pub prepare_poll_interval: Duration,
    /// Pause after each launch, so that not all jobs do their (expensive) setup at once.
    pub launch_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_parallel: 4,
            poll_interval: Duration::from_secs(2),
            prepare_poll_interval: Duration::from_secs(1),
            launch_delay: Duration::from_secs(10),
        }
    }
}

/// Summary of a call to [`JobScheduler::run_all`].
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerReport {
    pub prepare: Job,
    pub jobs: Vec<Job>,
    /// Largest number of active sessions observed directly after launching a job.
    pub peak_active: usize,
    pub duration: Duration,
}

/// Launches jobs with bounded parallelism through a [`JobRunner`].
pub struct JobScheduler<R> {
    runner: R,
    config: SchedulerConfig,
}

impl<R: JobRunner> JobScheduler<R> {
    pub fn new(runner: R, config: SchedulerConfig) -> Self {
        Self { runner, config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn into_runner(self) -> R {
        self.runner
    }

    /// Fail if any session is active, e.g., left over from a previous (aborted) execution.
    pub async fn check_no_stale_sessions(&mut self) -> Result<(), SchedulerError> {
        match self.runner.active_count().await? {
            0 => Ok(()),
            n => Err(SchedulerError::StaleSessions(n)),
        }
    }

    /// Run `prepare` to completion, then launch all `jobs` in order while keeping fewer than
    /// `max_parallel` of them active before each new launch, and wait until all are finished.
    ///
    /// Returns an error before launching anything if there are active sessions already.
    pub async fn run_all(
        &mut self,
        mut prepare: Job,
        mut jobs: Vec<Job>,
    ) -> Result<SchedulerReport, SchedulerError> {
        let max_parallel = self.config.max_parallel;
        if max_parallel == 0 {
            return Err(SchedulerError::InvalidParallelism);
        }
        self.check_no_stale_sessions().await?;
        let start = Instant::now();

        log::info!("Compiling");
        self.launch(&mut prepare).await?;
        self.wait_until(|n| n == 0, self.config.prepare_poll_interval)
            .await?;
        prepare.state = JobState::Completed;

        log::info!("Running commands (at most {max_parallel} in parallel)...");
        let num_jobs = jobs.len();
        let mut peak_active = 0;
        for (i, job) in jobs.iter_mut().enumerate() {
            log::info!(
                "Starting command {} out of {num_jobs}: {}",
                i + 1,
                job.command
            );
            self.launch(job).await?;
            let active = self
                .wait_until(|n| n < max_parallel, self.config.poll_interval)
                .await?;
            peak_active = peak_active.max(active);
            tokio::time::sleep(self.config.launch_delay).await;
        }

        log::info!(
            "Waiting completion of the last {}...",
            max_parallel.min(num_jobs)
        );
        self.wait_until(|n| n == 0, self.config.poll_interval)
            .await?;
        jobs.iter_mut().for_each(|job| job.state = JobState::Completed);
        log::info!("Finished.");

        Ok(SchedulerReport {
            prepare,
            jobs,
            peak_active,
            duration: start.elapsed(),
        })
    }

    async fn launch(&mut self, job: &mut Job) -> Result<(), SchedulerError> {
        log::debug!("launching {}: {}", job.name, job.shell_line());
        self.runner.launch(job).await?;
        job.state = JobState::Launched;
        Ok(())
    }

    /// Poll the number of active sessions until `done` holds, sleeping `interval` in between.
    /// Returns the first number observed.
    async fn wait_until<F>(&mut self, done: F, interval: Duration) -> Result<usize, SchedulerError>
    where
        F: Fn(usize) -> bool,
    {
        let mut first = None;
        loop {
            let active = self.runner.active_count().await?;
            first.get_or_insert(active);
            if done(active) {
                return Ok(first.unwrap_or(active));
            }
            log::trace!("{active} sessions active, waiting...");
            tokio::time::sleep(interval).await;
        }
    }
}

/// Build the jobs for all `runs`, relative to `layout`.
pub fn jobs_for_runs(layout: &JobLayout, runs: &[RunDescriptor]) -> Vec<Job> {
    runs.iter().map(|run| layout.job(run)).collect()
}

