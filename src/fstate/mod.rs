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
//! Module that reconstructs the history of next-hop changes from a time series of forwarding
//! state snapshots, one snapshot per time step.
//!
//! Snapshots are processed strictly in time order and one at a time. For each (source,
//! destination) pair, only the current next hop, the step of its last change, and the number of
//! changes are kept. Pairs are assigned a dense index when they are first observed, and their
//! state lives in vectors indexed by it.
//!
//! A pair missing from a snapshot keeps its previous next hop. The first observation of a pair
//! initializes its state and does not count as a change.

mod source;

pub use source::*;

use std::{
    collections::{HashMap, HashSet},
    time::{Duration, Instant},
};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use satexp_utils::fstate::{FstateEntry, NodeId, SnapshotError};

/// (source, destination) of a route.
pub type RoutePair = (NodeId, NodeId);

#[derive(Debug, thiserror::Error)]
pub enum FstateError {
    #[error("Snapshot Error at step {step}: {source}")]
    Snapshot { step: usize, source: SnapshotError },
    #[error("Steps must be processed in increasing order, got step {got} after step {last}")]
    OutOfOrder { last: usize, got: usize },
    #[error("Cannot list the snapshots: {0}")]
    Discovery(SnapshotError),
    #[error("{} snapshots are missing (steps {})", .0.len(), .0.iter().take(10).join(", "))]
    MissingSteps(Vec<u64>),
}

/// A change of the next hop of a pair, `gap` steps after its previous change (or its first
/// observation). Ordered by gap, then step, source, destination and next hop.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize,
)]
pub struct UpdateInterval {
    pub gap: usize,
    pub step: usize,
    pub src: NodeId,
    pub dst: NodeId,
    pub next_hop: NodeId,
}

impl UpdateInterval {
    pub fn as_tuple(&self) -> (usize, usize, NodeId, NodeId, NodeId) {
        (self.gap, self.step, self.src, self.dst, self.next_hop)
    }

    /// The gap converted to time, saturating at `u64::MAX` nanoseconds.
    pub fn gap_duration(&self, step_duration: Duration) -> Duration {
        let step_ns = u64::try_from(step_duration.as_nanos()).unwrap_or(u64::MAX);
        let gap = u64::try_from(self.gap).unwrap_or(u64::MAX);
        Duration::from_nanos(step_ns.saturating_mul(gap))
    }
}

/// Total number of next-hop changes of a pair during the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct ChangeCount {
    pub src: NodeId,
    pub dst: NodeId,
    pub changes: usize,
}

/// Result of scanning a sequence of snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// Changes of the watched pairs, sorted ascending.
    pub update_intervals: Vec<UpdateInterval>,
    /// All observed pairs, sorted by descending number of changes (ties by ascending pair).
    pub change_counts: Vec<ChangeCount>,
    /// Number of snapshots processed.
    pub num_steps: usize,
    pub step_duration: Duration,
}

impl ScanResult {
    /// Number of changes of a pair, or `None` if it was never observed.
    pub fn changes_of(&self, src: NodeId, dst: NodeId) -> Option<usize> {
        self.change_counts
            .iter()
            .find(|c| c.src == src && c.dst == dst)
            .map(|c| c.changes)
    }

    pub fn num_pairs(&self) -> usize {
        self.change_counts.len()
    }
}

/// Incremental analysis of forwarding state snapshots. Feed the snapshots with
/// [`FstateAnalyzer::ingest`] in increasing step order, then call [`FstateAnalyzer::finish`].
#[derive(Debug, Clone, Default)]
pub struct FstateAnalyzer {
    /// Pairs for which update intervals are recorded. Empty means all pairs.
    watched: HashSet<RoutePair>,
    index: HashMap<RoutePair, usize>,
    pairs: Vec<RoutePair>,
    next_hop: Vec<NodeId>,
    last_change: Vec<usize>,
    changes: Vec<usize>,
    is_watched: Vec<bool>,
    update_intervals: Vec<UpdateInterval>,
    last_step: Option<usize>,
    num_steps: usize,
}

impl FstateAnalyzer {
    /// Create an analyzer recording update intervals for the `watched` pairs. If no pair is
    /// given, intervals are recorded for every pair.
    pub fn new(watched: impl IntoIterator<Item = RoutePair>) -> Self {
        Self {
            watched: watched.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Number of distinct pairs observed so far.
    pub fn num_pairs(&self) -> usize {
        self.pairs.len()
    }

    /// Process the snapshot of time step `step`.
    pub fn ingest(
        &mut self,
        step: usize,
        entries: impl IntoIterator<Item = FstateEntry>,
    ) -> Result<(), FstateError> {
        if let Some(last) = self.last_step {
            if step <= last {
                return Err(FstateError::OutOfOrder { last, got: step });
            }
        }
        for entry in entries {
            self.observe(step, entry);
        }
        self.last_step = Some(step);
        self.num_steps += 1;
        Ok(())
    }

    fn observe(&mut self, step: usize, entry: FstateEntry) {
        let pair = (entry.src, entry.dst);
        let id = match self.index.get(&pair).copied() {
            Some(id) => id,
            None => {
                let id = self.pairs.len();
                self.index.insert(pair, id);
                self.pairs.push(pair);
                self.next_hop.push(entry.next_hop);
                self.last_change.push(step);
                self.changes.push(0);
                self.is_watched
                    .push(self.watched.is_empty() || self.watched.contains(&pair));
                return;
            }
        };

        if self.next_hop[id] == entry.next_hop {
            return;
        }
        if self.is_watched[id] {
            self.update_intervals.push(UpdateInterval {
                gap: step - self.last_change[id],
                step,
                src: entry.src,
                dst: entry.dst,
                next_hop: entry.next_hop,
            });
        }
        self.next_hop[id] = entry.next_hop;
        self.last_change[id] = step;
        self.changes[id] += 1;
    }

    /// Sort and return the results.
    pub fn finish(self, step_duration: Duration) -> ScanResult {
        let mut update_intervals = self.update_intervals;
        update_intervals.sort();

        let mut change_counts: Vec<ChangeCount> = self
            .pairs
            .iter()
            .zip(self.changes.iter())
            .map(|(&(src, dst), &changes)| ChangeCount { src, dst, changes })
            .collect();
        change_counts.sort_by(|a, b| {
            b.changes
                .cmp(&a.changes)
                .then_with(|| (a.src, a.dst).cmp(&(b.src, b.dst)))
        });

        ScanResult {
            update_intervals,
            change_counts,
            num_steps: self.num_steps,
            step_duration,
        }
    }
}

/// Scan the snapshots of steps `0..num_steps` from `source`. Step `i` is read from the snapshot
/// at time `i * step_duration`. Any missing or malformed snapshot aborts the scan.
pub fn scan<S: SnapshotSource + ?Sized>(
    source: &S,
    watched: impl IntoIterator<Item = RoutePair>,
    num_steps: usize,
    step_duration: Duration,
) -> Result<ScanResult, FstateError> {
    let start = Instant::now();
    let mut analyzer = FstateAnalyzer::new(watched);
    for step in 0..num_steps {
        let entries = load_step(source, step, step_duration)?;
        analyzer.ingest(step, entries)?;
        if (step + 1) % 1000 == 0 {
            log::debug!(
                "processed {} of {num_steps} snapshots ({} pairs)",
                step + 1,
                analyzer.num_pairs()
            );
        }
    }
    log::debug!("scanned {num_steps} snapshots in {:?}", start.elapsed());
    Ok(analyzer.finish(step_duration))
}

/// Load the snapshot of step `step` from `source`.
pub fn load_step<S: SnapshotSource + ?Sized>(
    source: &S,
    step: usize,
    step_duration: Duration,
) -> Result<Vec<FstateEntry>, FstateError> {
    let time_ns = step as u64 * step_duration.as_nanos() as u64;
    source
        .load(step, time_ns)
        .map_err(|source| FstateError::Snapshot { step, source })
}
