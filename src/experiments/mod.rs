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
//! Module describing the batch of simulation runs of an experiment: the parameter axes, the
//! resulting run descriptors, and how they are written to disk for the simulator.

pub mod experiment_serde;
pub mod materialize;
pub mod run_list;

pub use experiment_serde::*;
pub use materialize::*;
pub use run_list::*;

use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};

use satexp_utils::fstate::NodeId;

/// Directory (below the experiment directory) holding one sub-directory per run.
pub const RUNS_DIR: &str = "runs";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Topology {topology} has no satellite network for the {algorithm} algorithm")]
    MissingSatelliteNetwork {
        topology: String,
        algorithm: DynamicStateAlgorithm,
    },
    #[error("Invalid loss ratio {0:?}: must be a number in [0, 1]")]
    InvalidLossRatio(String),
    #[error("{0:?} cannot be used as part of a run name")]
    UnsafeName(String),
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Deserialize,
    Serialize,
    strum::Display,
    strum::EnumIter,
    strum_macros::EnumString,
)]
/// NDN consumer application running at the source of a run.
pub enum ClientVariant {
    Ping,
    PingInstantRetx,
    FixedWindow,
}

impl ClientVariant {
    /// Name of the simulator program implementing this client.
    pub fn program(&self) -> &'static str {
        match self {
            Self::Ping => "a_b_ping",
            Self::PingInstantRetx => "a_b_ping_instant_retx",
            Self::FixedWindow => "a_b_fixed_window",
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Deserialize,
    Serialize,
    strum::Display,
    strum::EnumIter,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
/// Algorithm used to compute the dynamic (forwarding) state of the satellite network.
pub enum DynamicStateAlgorithm {
    /// Paths computed for many pairs at once.
    Paired,
    /// Fast algorithm, one free path per destination.
    Free,
}

/// A satellite network topology, together with the name of the generated network for each
/// dynamic state algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TopologyVariant {
    pub name: String,
    pub satellite_networks: BTreeMap<DynamicStateAlgorithm, String>,
}

/// Source and destination ground station of a run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EndpointPair {
    pub from: NodeId,
    pub to: NodeId,
    /// Human-readable description, e.g., `Sao-Paulo 11000k`.
    #[serde(default)]
    pub label: String,
}

/// Error rate applied to all ISLs and GSLs of a run. The label is kept exactly as configured
/// and becomes part of the run name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LossRatio {
    label: String,
    value: f64,
}

impl LossRatio {
    pub fn new(label: impl Into<String>) -> Result<Self, ConfigError> {
        let label = label.into();
        let value: f64 = label
            .parse()
            .map_err(|_| ConfigError::InvalidLossRatio(label.clone()))?;
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::InvalidLossRatio(label));
        }
        check_name(&label)?;
        Ok(Self { label, value })
    }

    /// Loss ratio used when no loss ratios are configured.
    pub fn zero() -> Self {
        Self {
            label: "0".to_string(),
            value: 0.0,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl TryFrom<String> for LossRatio {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LossRatio> for String {
    fn from(value: LossRatio) -> Self {
        value.label
    }
}

/// Check that `name` only consists of characters that are safe in a directory name and in a
/// single-quoted shell argument.
pub(crate) fn check_name(name: &str) -> Result<(), ConfigError> {
    let safe = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+'));
    if safe {
        Ok(())
    } else {
        Err(ConfigError::UnsafeName(name.to_string()))
    }
}

/// All parameters of an experiment. The axes `topologies`, `pairs`, `clients`, `algorithms` and
/// `loss_ratios` are expanded into their cross product by [`build_run_list`]; all other fields are
/// shared by every run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub dynamic_state_update_interval_ms: u64,
    pub simulation_end_time_s: u64,
    pub enable_isl_utilization_tracking: bool,
    pub isl_utilization_tracking_interval_ns: u64,
    pub isl_data_rate_megabit_per_s: f64,
    pub isl_queue_size_pkt: u64,
    pub gsl_data_rate_megabit_per_s: f64,
    pub gsl_queue_size_pkt: u64,
    pub topologies: Vec<TopologyVariant>,
    pub pairs: Vec<EndpointPair>,
    pub clients: Vec<ClientVariant>,
    pub algorithms: Vec<DynamicStateAlgorithm>,
    pub loss_ratios: Vec<LossRatio>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            dynamic_state_update_interval_ms: 100,
            simulation_end_time_s: 200,
            enable_isl_utilization_tracking: true,
            isl_utilization_tracking_interval_ns: 1_000_000_000,
            isl_data_rate_megabit_per_s: 10_000.0,
            isl_queue_size_pkt: 100_000,
            gsl_data_rate_megabit_per_s: 10_000.0,
            gsl_queue_size_pkt: 100_000,
            topologies: vec![TopologyVariant {
                name: "starlink_550_isls".to_string(),
                satellite_networks: BTreeMap::from([
                    (
                        DynamicStateAlgorithm::Paired,
                        "starlink_550_isls_plus_grid_ground_stations_4_different_orbits_algorithm_paired_many_only_over_isls".to_string(),
                    ),
                    (
                        DynamicStateAlgorithm::Free,
                        "starlink_550_isls_plus_grid_ground_stations_4_different_orbits_fast_algorithm_free_one_only_over_isls".to_string(),
                    ),
                ]),
            }],
            pairs: vec![EndpointPair {
                from: 1584,
                to: 1585,
                label: "Sao-Paulo 11000k".to_string(),
            }],
            clients: vec![ClientVariant::PingInstantRetx],
            algorithms: vec![DynamicStateAlgorithm::Paired],
            loss_ratios: vec![LossRatio {
                label: "1e-5".to_string(),
                value: 1e-5,
            }],
        }
    }
}

impl ExperimentConfig {
    pub fn dynamic_state_update_interval_ns(&self) -> u64 {
        self.dynamic_state_update_interval_ms * 1_000_000
    }

    pub fn simulation_end_time_ns(&self) -> u64 {
        self.simulation_end_time_s * 1_000_000_000
    }

    /// Name of the directory holding the precomputed dynamic state, e.g.,
    /// `dynamic_state_100ms_for_200s`.
    pub fn dynamic_state(&self) -> String {
        format!(
            "dynamic_state_{}ms_for_{}s",
            self.dynamic_state_update_interval_ms, self.simulation_end_time_s
        )
    }
}

/// One fully parameterized simulation run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RunDescriptor {
    /// Unique name of the run, also used as its directory name.
    pub name: String,
    pub topology: String,
    pub satellite_network: String,
    pub dynamic_state: String,
    pub dynamic_state_update_interval_ns: u64,
    pub simulation_end_time_ns: u64,
    pub isl_data_rate_megabit_per_s: f64,
    pub isl_queue_size_pkt: u64,
    pub gsl_data_rate_megabit_per_s: f64,
    pub gsl_queue_size_pkt: u64,
    pub enable_isl_utilization_tracking: bool,
    pub isl_utilization_tracking_interval_ns: u64,
    pub from_id: NodeId,
    pub to_id: NodeId,
    pub pair_label: String,
    pub client: ClientVariant,
    pub algorithm: DynamicStateAlgorithm,
    pub isl_error_rate: f64,
    pub gsl_error_rate: f64,
}

impl RunDescriptor {
    /// Directory of this run below the experiment directory.
    pub fn run_dir(&self) -> PathBuf {
        PathBuf::from(RUNS_DIR).join(&self.name)
    }
}

/// allows filtering the runs to be processed
#[derive(Clone, Debug, Default)]
pub struct Filter {
    pub name: String,
    pub name_end: String,
}

impl Filter {
    pub fn matches(&self, run: &RunDescriptor) -> bool {
        run.name.contains(&self.name) && run.name.ends_with(&self.name_end)
    }
}
