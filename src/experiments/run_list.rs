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
//! Expands the parameter axes of an [`ExperimentConfig`] into the list of runs.

use itertools::{iproduct, Itertools};

use super::{check_name, ConfigError, ExperimentConfig, LossRatio, RunDescriptor};

/// Build the cross product of all parameter axes, in the order clients, topologies, pairs,
/// algorithms and loss ratios (innermost). Repeated axis entries are ignored.
///
/// An empty list of loss ratios does not remove any run, but yields one run without any errors
/// for each combination of the other axes.
pub fn build_run_list(config: &ExperimentConfig) -> Result<Vec<RunDescriptor>, ConfigError> {
    let clients = config.clients.iter().unique().collect_vec();
    let topologies = config.topologies.iter().unique_by(|t| &t.name).collect_vec();
    let pairs = config
        .pairs
        .iter()
        .unique_by(|p| (p.from, p.to))
        .collect_vec();
    let algorithms = config.algorithms.iter().unique().collect_vec();
    let loss_ratios = if config.loss_ratios.is_empty() {
        vec![LossRatio::zero()]
    } else {
        config
            .loss_ratios
            .iter()
            .unique_by(|r| r.label())
            .cloned()
            .collect_vec()
    };

    for topo in &topologies {
        check_name(&topo.name)?;
    }

    let dynamic_state = config.dynamic_state();

    iproduct!(clients, topologies, pairs, algorithms, loss_ratios)
        .map(|(client, topo, pair, algorithm, loss)| -> Result<RunDescriptor, ConfigError> {
            let satellite_network = topo
                .satellite_networks
                .get(algorithm)
                .ok_or_else(|| ConfigError::MissingSatelliteNetwork {
                    topology: topo.name.clone(),
                    algorithm: *algorithm,
                })?
                .clone();
            Ok(RunDescriptor {
                name: run_name(&topo.name, pair.from, pair.to, client, algorithm, &loss, &loss),
                topology: topo.name.clone(),
                satellite_network,
                dynamic_state: dynamic_state.clone(),
                dynamic_state_update_interval_ns: config.dynamic_state_update_interval_ns(),
                simulation_end_time_ns: config.simulation_end_time_ns(),
                isl_data_rate_megabit_per_s: config.isl_data_rate_megabit_per_s,
                isl_queue_size_pkt: config.isl_queue_size_pkt,
                gsl_data_rate_megabit_per_s: config.gsl_data_rate_megabit_per_s,
                gsl_queue_size_pkt: config.gsl_queue_size_pkt,
                enable_isl_utilization_tracking: config.enable_isl_utilization_tracking,
                isl_utilization_tracking_interval_ns: config.isl_utilization_tracking_interval_ns,
                from_id: pair.from,
                to_id: pair.to,
                pair_label: pair.label.clone(),
                client: *client,
                algorithm: *algorithm,
                isl_error_rate: loss.value(),
                gsl_error_rate: loss.value(),
            })
        })
        .collect()
}

/// Name of a run, e.g., `starlink_550_isls_1584_to_1585_with_PingInstantRetx_paired_loss_1e-5_1e-5`.
fn run_name(
    topology: &str,
    from: impl std::fmt::Display,
    to: impl std::fmt::Display,
    client: impl std::fmt::Display,
    algorithm: impl std::fmt::Display,
    isl_loss: &LossRatio,
    gsl_loss: &LossRatio,
) -> String {
    format!(
        "{topology}_{from}_to_{to}_with_{client}_{algorithm}_loss_{}_{}",
        isl_loss.label(),
        gsl_loss.label()
    )
}
