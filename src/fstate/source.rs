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
//! Sources of forwarding state snapshots.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Duration,
};

use satexp_utils::fstate::{
    discover_snapshots_with_step, fstate_file_name, fstate_path, read_fstate, FstateEntry,
    SnapshotError,
};

use super::FstateError;

/// Provides the forwarding state snapshot of each time step.
pub trait SnapshotSource {
    /// Load the complete snapshot of time step `step`, taken at simulation time `time_ns`.
    fn load(&self, step: usize, time_ns: u64) -> Result<Vec<FstateEntry>, SnapshotError>;
}

/// Snapshots stored as `fstate_<time_ns>.txt` files in a directory, as written by the simulator.
#[derive(Debug, Clone)]
pub struct FstateDir {
    dir: PathBuf,
}

impl FstateDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of steps and step duration to scan. Values that are not given are taken from the
    /// snapshot files: the step duration is inferred from their timestamps, and the number of
    /// steps reaches up to the last file, which requires every step before it to be present.
    /// A given step duration is checked against the timestamps of all files. A directory with a
    /// single snapshot at time 0 falls back to `default_step`.
    pub fn steps_to_scan(
        &self,
        steps: Option<usize>,
        step_duration: Option<Duration>,
        default_step: Duration,
    ) -> Result<(usize, Duration), FstateError> {
        if let (Some(steps), Some(step_duration)) = (steps, step_duration) {
            return Ok((steps, step_duration));
        }
        let step_ns = step_duration.map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX));
        let index =
            discover_snapshots_with_step(&self.dir, step_ns).map_err(FstateError::Discovery)?;
        let step_duration = index
            .step_ns
            .map(Duration::from_nanos)
            .unwrap_or(default_step);
        match steps {
            Some(steps) => Ok((steps, step_duration)),
            None if index.is_complete() => Ok((index.num_steps(), step_duration)),
            None => Err(FstateError::MissingSteps(index.missing_steps)),
        }
    }
}

impl SnapshotSource for FstateDir {
    fn load(&self, _step: usize, time_ns: u64) -> Result<Vec<FstateEntry>, SnapshotError> {
        read_fstate(fstate_path(&self.dir, time_ns))
    }
}

/// Snapshots kept in memory, indexed by time step.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshots {
    snapshots: BTreeMap<usize, Vec<FstateEntry>>,
}

impl MemorySnapshots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the snapshot of `step`.
    pub fn insert(&mut self, step: usize, entries: impl IntoIterator<Item = FstateEntry>) {
        self.snapshots.insert(step, entries.into_iter().collect());
    }

    /// Builder-style variant of [`MemorySnapshots::insert`].
    pub fn with_step(mut self, step: usize, entries: impl IntoIterator<Item = FstateEntry>) -> Self {
        self.insert(step, entries);
        self
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl FromIterator<Vec<FstateEntry>> for MemorySnapshots {
    /// Snapshots for steps `0, 1, 2, ...` in iteration order.
    fn from_iter<T: IntoIterator<Item = Vec<FstateEntry>>>(iter: T) -> Self {
        Self {
            snapshots: iter.into_iter().enumerate().collect(),
        }
    }
}

impl SnapshotSource for MemorySnapshots {
    fn load(&self, step: usize, time_ns: u64) -> Result<Vec<FstateEntry>, SnapshotError> {
        self.snapshots
            .get(&step)
            .cloned()
            .ok_or_else(|| SnapshotError::Missing(PathBuf::from(fstate_file_name(time_ns))))
    }
}
