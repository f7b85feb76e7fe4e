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
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use satexp::{
    experiments::{
        build_run_list, load_config, materialize_all, prepare_output_dirs, store_run_list,
        ExperimentConfig, TemplateMaterializer, RUNS_DIR, RUN_LIST_FILE,
    },
    util,
};

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Generate the run directories and their simulator configuration for all combinations of the
/// experiment configuration.
struct Args {
    /// Experiment configuration (json). Uses the built-in defaults if omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Experiment directory in which `runs/` is generated.
    #[arg(short, long, default_value = ".")]
    experiment_dir: PathBuf,
    /// Properties template, relative to the experiment directory.
    #[arg(short, long, default_value = "templates/template_ndn_a_b_config_ns3.properties")]
    template: PathBuf,
}

fn main() -> Result<()> {
    if let Err(e) = util::init_logging() {
        eprintln!("Cannot initialize logging: {e}");
    }

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            load_config(path).with_context(|| format!("cannot load the configuration {path:?}"))?
        }
        None => ExperimentConfig::default(),
    };
    log::debug!("{config:#?}");

    let runs = build_run_list(&config).context("invalid experiment configuration")?;
    log::info!("Generating {} runs in {:?}", runs.len(), args.experiment_dir);

    let materializer =
        TemplateMaterializer::new(args.experiment_dir.join(&args.template), &args.experiment_dir)?;
    prepare_output_dirs(&args.experiment_dir)?;
    materialize_all(&materializer, &runs)?;

    let run_list = args.experiment_dir.join(RUNS_DIR).join(RUN_LIST_FILE);
    store_run_list(&run_list, &runs)
        .with_context(|| format!("cannot write the run list {run_list:?}"))?;

    println!("Success: generated runs");
    Ok(())
}
