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
//! Launching jobs as detached `screen` sessions and counting the active ones.

use lazy_static::lazy_static;
use regex::Regex;
use tokio::process::Command;

use super::{Job, SchedulerError};

/// Capability to launch jobs detached from the current process, and to count how many of them
/// are still active.
#[async_trait::async_trait]
pub trait JobRunner: Send {
    /// Start `job` without waiting for it to finish.
    async fn launch(&mut self, job: &Job) -> Result<(), SchedulerError>;

    /// Number of currently active sessions. This counts all sessions, not only those launched by
    /// this runner.
    async fn active_count(&mut self) -> Result<usize, SchedulerError>;
}

/// Runs each job in its own detached GNU `screen` session.
#[derive(Debug, Clone)]
pub struct ScreenRunner {
    screen: String,
}

impl Default for ScreenRunner {
    fn default() -> Self {
        Self::new("screen")
    }
}

impl ScreenRunner {
    /// Use the `screen` executable at `screen`.
    pub fn new(screen: impl Into<String>) -> Self {
        Self {
            screen: screen.into(),
        }
    }
}

#[async_trait::async_trait]
impl JobRunner for ScreenRunner {
    async fn launch(&mut self, job: &Job) -> Result<(), SchedulerError> {
        let status = Command::new(&self.screen)
            .args(["-d", "-m", "bash", "-c"])
            .arg(job.shell_line())
            .status()
            .await?;
        if status.success() {
            Ok(())
        } else {
            Err(SchedulerError::Launch {
                job: job.name.clone(),
                reason: format!("{} exited with {status}", self.screen),
            })
        }
    }

    async fn active_count(&mut self) -> Result<usize, SchedulerError> {
        // `screen -ls` exits with a non-zero status if there are no sessions.
        let output = Command::new(&self.screen).arg("-ls").output().await?;
        Ok(count_sessions(&String::from_utf8_lossy(&output.stdout)))
    }
}

lazy_static! {
    static ref SCREEN_SESSION: Regex =
        Regex::new(r"(?i)^\s+\d+\.\S+\s.*\((?:multi, )?(?:detached|attached)\)\s*$").unwrap();
}

/// Count the sessions listed in the output of `screen -ls`. Dead sessions are not counted.
pub fn count_sessions(screen_ls: &str) -> usize {
    screen_ls
        .lines()
        .filter(|line| SCREEN_SESSION.is_match(line))
        .count()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_screen_ls() {
        assert_eq!(
            count_sessions("No Sockets found in /run/screen/S-roschmi.\n\n"),
            0
        );
        assert_eq!(
            count_sessions(
                "There are screens on:
\t2403513.pts-3.orval\t(10/19/2026 09:12:44 AM)\t(Detached)
\t2403001.pts-3.orval\t(Attached)
\t2402999.sim_run\t(Multi, detached)
\t2400000.pts-1.orval\t(Dead ???)
4 Sockets in /run/screen/S-roschmi.
"
            ),
            3
        );
    }
}
