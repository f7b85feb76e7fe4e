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
//! Writes the simulator configuration of each run from a properties template.

use std::{
    io,
    path::{Path, PathBuf},
};

use satexp_utils::local_shell;

use super::{RunDescriptor, RUNS_DIR};

/// Name of the configuration file within a run directory.
pub const CONFIG_FILE_NAME: &str = "config_ns3.properties";

#[derive(Debug, thiserror::Error)]
pub enum MaterializeError {
    #[error("Template {0:?} does not exist")]
    MissingTemplate(PathBuf),
    #[error("IO Error on {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

trait IoContext<T> {
    fn at(self, path: &Path) -> Result<T, MaterializeError>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn at(self, path: &Path) -> Result<T, MaterializeError> {
        self.map_err(|source| MaterializeError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Turns a run into the configuration artifact consumed by the simulator.
pub trait ConfigMaterializer {
    /// Create the configuration of `run`, returning the path of the written file.
    fn materialize(&self, run: &RunDescriptor) -> Result<PathBuf, MaterializeError>;
}

/// Copies a properties template into the run directory and substitutes all placeholders of the
/// form `[KEY]` with the values of the run.
#[derive(Debug, Clone)]
pub struct TemplateMaterializer {
    template: PathBuf,
    experiment_dir: PathBuf,
}

impl TemplateMaterializer {
    pub fn new(
        template: impl Into<PathBuf>,
        experiment_dir: impl Into<PathBuf>,
    ) -> Result<Self, MaterializeError> {
        let template = template.into();
        if !template.is_file() {
            return Err(MaterializeError::MissingTemplate(template));
        }
        Ok(Self {
            template,
            experiment_dir: experiment_dir.into(),
        })
    }

    /// Absolute location of the directory of `run`.
    pub fn run_dir(&self, run: &RunDescriptor) -> PathBuf {
        self.experiment_dir.join(run.run_dir())
    }
}

impl ConfigMaterializer for TemplateMaterializer {
    fn materialize(&self, run: &RunDescriptor) -> Result<PathBuf, MaterializeError> {
        let run_dir = self.run_dir(run);
        local_shell::recreate_dir(&run_dir).at(&run_dir)?;

        let config_path = run_dir.join(CONFIG_FILE_NAME);
        local_shell::copy_file(&self.template, &config_path).at(&config_path)?;
        local_shell::replace_all_in_file_plain(&config_path, placeholders(run)).at(&config_path)?;

        log::debug!("generated {config_path:?}");
        Ok(config_path)
    }
}

/// Placeholders of the properties template and the values they are replaced with.
pub fn placeholders(run: &RunDescriptor) -> Vec<(&'static str, String)> {
    vec![
        ("[SATELLITE-NETWORK]", run.satellite_network.clone()),
        ("[DYNAMIC-STATE]", run.dynamic_state.clone()),
        (
            "[DYNAMIC-STATE-UPDATE-INTERVAL-NS]",
            run.dynamic_state_update_interval_ns.to_string(),
        ),
        ("[SIMULATION-END-TIME-NS]", run.simulation_end_time_ns.to_string()),
        (
            "[ISL-DATA-RATE-MEGABIT-PER-S]",
            format!("{:?}", run.isl_data_rate_megabit_per_s),
        ),
        (
            "[GSL-DATA-RATE-MEGABIT-PER-S]",
            format!("{:?}", run.gsl_data_rate_megabit_per_s),
        ),
        ("[ISL-MAX-QUEUE-SIZE-PKTS]", run.isl_queue_size_pkt.to_string()),
        ("[GSL-MAX-QUEUE-SIZE-PKTS]", run.gsl_queue_size_pkt.to_string()),
        (
            "[ENABLE-ISL-UTILIZATION-TRACKING]",
            run.enable_isl_utilization_tracking.to_string(),
        ),
        (
            "[ISL-UTILIZATION-TRACKING-INTERVAL-NS]",
            run.isl_utilization_tracking_interval_ns.to_string(),
        ),
        ("[FROM-ID]", run.from_id.to_string()),
        ("[TO-ID]", run.to_id.to_string()),
        ("[ISL-ERROR-RATE]", format!("{:?}", run.isl_error_rate)),
        ("[GSL-ERROR-RATE]", format!("{:?}", run.gsl_error_rate)),
        ("[NDN-CLIENT]", run.client.to_string()),
    ]
}

/// Remove all outputs of a previous generation (`runs`, `pdf` and `data`) below the experiment
/// directory.
pub fn prepare_output_dirs(experiment_dir: impl AsRef<Path>) -> Result<(), MaterializeError> {
    for dir in [RUNS_DIR, "pdf", "data"] {
        let path = experiment_dir.as_ref().join(dir);
        local_shell::remove_force_recursive(&path).at(&path)?;
    }
    let runs = experiment_dir.as_ref().join(RUNS_DIR);
    local_shell::make_full_dir(&runs).at(&runs)
}

/// Materialize all runs, stopping at the first error.
pub fn materialize_all<M: ConfigMaterializer + ?Sized>(
    materializer: &M,
    runs: &[RunDescriptor],
) -> Result<Vec<PathBuf>, MaterializeError> {
    runs.iter().map(|run| materializer.materialize(run)).collect()
}
