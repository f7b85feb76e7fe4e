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
//! Test cases covering the run list expansion, the scheduler, and the forwarding state analysis.
//!
//! Use the following command to run them:
//!
//! ```shell
//! cargo test --release -- --nocapture
//! ```

use crate::{FstateEntry, NodeId};

/// Build a snapshot from `(src, dst, next_hop)` triples.
pub fn snapshot(routes: &[(NodeId, NodeId, NodeId)]) -> Vec<FstateEntry> {
    routes
        .iter()
        .map(|&(src, dst, next_hop)| FstateEntry { src, dst, next_hop })
        .collect()
}

mod fstate;
