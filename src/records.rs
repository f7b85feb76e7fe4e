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
//! Module defining record data types to serialize the results of the forwarding state analysis
//! to CSV.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use satexp_utils::fstate::NodeId;

use crate::fstate::{ChangeCount, ScanResult, UpdateInterval};

/// File name of the update intervals within the output directory.
pub const UPDATE_INTERVALS_FILE: &str = "update_intervals.csv";
/// File name of the change counts within the output directory.
pub const CHANGE_COUNTS_FILE: &str = "change_counts.csv";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
/// A next-hop change of a pair, and the time since its previous change.
pub struct UpdateIntervalRecord {
    pub gap_steps: usize,
    /// gap in seconds
    pub gap: f64,
    pub step: usize,
    /// time of the change in seconds
    pub time: f64,
    pub src: NodeId,
    pub dst: NodeId,
    pub next_hop: NodeId,
}

impl UpdateIntervalRecord {
    pub fn new(interval: &UpdateInterval, result: &ScanResult) -> Self {
        let step_s = result.step_duration.as_secs_f64();
        Self {
            gap_steps: interval.gap,
            gap: interval.gap as f64 * step_s,
            step: interval.step,
            time: interval.step as f64 * step_s,
            src: interval.src,
            dst: interval.dst,
            next_hop: interval.next_hop,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
/// Number of next-hop changes of a pair, with its position in the ranking (starting at 1).
pub struct ChangeCountRecord {
    pub rank: usize,
    pub src: NodeId,
    pub dst: NodeId,
    pub changes: usize,
}

impl ChangeCountRecord {
    pub fn new(rank: usize, count: &ChangeCount) -> Self {
        Self {
            rank,
            src: count.src,
            dst: count.dst,
            changes: count.changes,
        }
    }
}

/// Write both views of `result` as CSV files with headers into `dir`, returning the paths of the
/// update intervals and the change counts.
pub fn write_scan_result(
    result: &ScanResult,
    dir: impl AsRef<Path>,
) -> Result<(PathBuf, PathBuf), csv::Error> {
    std::fs::create_dir_all(dir.as_ref())?;

    let intervals_path = dir.as_ref().join(UPDATE_INTERVALS_FILE);
    let mut csv = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(&intervals_path)?;
    for interval in &result.update_intervals {
        csv.serialize(UpdateIntervalRecord::new(interval, result))?;
    }
    csv.flush()?;

    let counts_path = dir.as_ref().join(CHANGE_COUNTS_FILE);
    let mut csv = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(&counts_path)?;
    for (i, count) in result.change_counts.iter().enumerate() {
        csv.serialize(ChangeCountRecord::new(i + 1, count))?;
    }
    csv.flush()?;

    Ok((intervals_path, counts_path))
}
