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
//! Allows to (de-)serialize the experiment configuration and the generated run list to and from
//! a file.

use std::{io::Write, path::Path};

use super::{ConfigError, ExperimentConfig, RunDescriptor};

/// Name of the file storing the run list, placed in the runs directory.
pub const RUN_LIST_FILE: &str = "run_list.json";

fn write_file(path: &Path, content: &str) -> Result<(), ConfigError> {
    // open file, ensuring that an existing file is overwritten
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Load an `ExperimentConfig` from a json file. Missing fields take their default value.
pub fn load_config(path: impl AsRef<Path>) -> Result<ExperimentConfig, ConfigError> {
    let serialized = std::fs::read_to_string(path.as_ref())?;
    Ok(serde_json::from_str(&serialized)?)
}

/// Store an `ExperimentConfig` as pretty-printed json.
pub fn store_config(path: impl AsRef<Path>, config: &ExperimentConfig) -> Result<(), ConfigError> {
    write_file(path.as_ref(), &serde_json::to_string_pretty(config)?)
}

/// Serialize the list of runs and store it at the given file location.
pub fn store_run_list(path: impl AsRef<Path>, runs: &[RunDescriptor]) -> Result<(), ConfigError> {
    write_file(path.as_ref(), &serde_json::to_string_pretty(runs)?)
}

/// Deserialize a list of runs from the given file path.
pub fn load_run_list(path: impl AsRef<Path>) -> Result<Vec<RunDescriptor>, ConfigError> {
    let serialized = std::fs::read_to_string(path.as_ref())?;
    match serde_json::from_str(&serialized) {
        Ok(runs) => Ok(runs),
        Err(e) => {
            log::debug!("Deserialization of the run list failed: {e:?}");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::experiments::{build_run_list, DynamicStateAlgorithm, LossRatio};

    #[test]
    fn config_from_partial_json() {
        let config: ExperimentConfig = serde_json::from_str(
            r#"{
  "simulation_end_time_s": 10,
  "algorithms": ["free"],
  "loss_ratios": ["0", "3e-6"]
}"#,
        )
        .unwrap();
        assert_eq!(config.simulation_end_time_s, 10);
        assert_eq!(config.dynamic_state_update_interval_ms, 100);
        assert_eq!(config.algorithms, vec![DynamicStateAlgorithm::Free]);
        assert_eq!(
            config.loss_ratios,
            vec![LossRatio::new("0").unwrap(), LossRatio::new("3e-6").unwrap()]
        );
        assert_eq!(config.dynamic_state(), "dynamic_state_100ms_for_10s");
    }

    #[test]
    fn invalid_loss_ratio_in_json() {
        let result: Result<ExperimentConfig, _> =
            serde_json::from_str(r#"{"loss_ratios": ["1.5"]}"#);
        assert!(result.is_err());
        let result: Result<ExperimentConfig, _> =
            serde_json::from_str(r#"{"loss_ratios": ["abc"]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn store_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExperimentConfig::default();
        store_config(dir.path().join("experiment.json"), &config).unwrap();
        assert_eq!(load_config(dir.path().join("experiment.json")).unwrap(), config);

        let runs = build_run_list(&config).unwrap();
        store_run_list(dir.path().join(RUN_LIST_FILE), &runs).unwrap();
        assert_eq!(load_run_list(dir.path().join(RUN_LIST_FILE)).unwrap(), runs);
    }
}
