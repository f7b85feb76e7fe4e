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
//! Library for running batches of satellite network simulations and analyzing the forwarding
//! state they produce.

pub mod experiments;
pub mod fstate;
pub mod records;
pub mod scheduler;
pub mod util;

#[cfg(test)]
mod test;

pub use satexp_utils::fstate::{FstateEntry, NodeId};

pub mod prelude {
    pub use super::{
        experiments::{build_run_list, ExperimentConfig, RunDescriptor},
        fstate::{scan, FstateAnalyzer, FstateDir, ScanResult, SnapshotSource},
        scheduler::{Job, JobRunner, JobScheduler, SchedulerConfig},
        FstateEntry, NodeId,
    };
}
