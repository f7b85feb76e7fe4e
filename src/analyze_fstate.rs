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
use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;

use satexp::{
    fstate::{load_step, FstateAnalyzer, FstateDir, RoutePair},
    records::write_scan_result,
    util,
};

const DEFAULT_STEP: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Reconstruct the next-hop changes of all source-destination pairs from a directory of
/// forwarding state snapshots.
struct Args {
    /// Directory containing the `fstate_<time_ns>.txt` files.
    #[arg(short, long)]
    fstate_dir: PathBuf,
    /// Number of time steps to analyze. If omitted, all steps up to the last snapshot file are
    /// analyzed, and missing snapshots are reported before scanning.
    #[arg(short, long)]
    steps: Option<usize>,
    /// Duration of a time step in nanoseconds. If omitted, it is inferred as the greatest common
    /// divisor of the snapshot timestamps. Snapshot files that are no multiple of the given step
    /// are rejected.
    #[arg(long)]
    step_ns: Option<u64>,
    /// Record update intervals only for this `src,dst` pair. Can be given multiple times. If
    /// omitted, intervals of all pairs are recorded.
    #[arg(short, long, value_parser = util::parse_pair)]
    pair: Vec<RoutePair>,
    /// Number of entries to print from each result list.
    #[arg(short, long, default_value_t = 10)]
    top: usize,
    /// Directory to write the CSV results to.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let logger = pretty_env_logger::formatted_builder().build();
    let multi = MultiProgress::new();
    LogWrapper::new(multi.clone(), logger).try_init()?;

    let args = Args::parse();

    let source = FstateDir::new(&args.fstate_dir);
    let (num_steps, step_duration) = source
        .steps_to_scan(
            args.steps,
            args.step_ns.map(Duration::from_nanos),
            DEFAULT_STEP,
        )
        .with_context(|| format!("cannot determine the steps to scan in {:?}", args.fstate_dir))?;
    log::info!(
        "Analyzing {num_steps} snapshots in {:?}, {step_duration:?} apart",
        args.fstate_dir
    );

    let mut analyzer = FstateAnalyzer::new(args.pair.iter().copied());
    let pb = multi.add(
        ProgressBar::new(num_steps as u64).with_style(
            ProgressStyle::with_template(
                "[{bar:80}] step: {pos:>7}/{len:7}, elapsed: {elapsed}, eta: {eta}, speed: {per_sec}",
            )?
            .progress_chars("##-"),
        ),
    );
    for step in 0..num_steps {
        let entries = load_step(&source, step, step_duration)?;
        analyzer.ingest(step, entries)?;
        pb.inc(1);
    }
    pb.finish_and_clear();
    multi.remove(&pb);

    let result = analyzer.finish(step_duration);
    log::info!(
        "Found {} update intervals of {} pairs",
        result.update_intervals.len(),
        result.num_pairs()
    );

    println!("Shortest update intervals (gap, step, src, dst, next hop):");
    for interval in result.update_intervals.iter().take(args.top) {
        println!(
            "  {:?} ({:?})",
            interval.as_tuple(),
            interval.gap_duration(step_duration)
        );
    }
    println!("Pairs with the most next-hop changes (src, dst, changes):");
    for count in result.change_counts.iter().take(args.top) {
        println!("  ({}, {}, {})", count.src, count.dst, count.changes);
    }

    let output_dir = args.output_dir.unwrap_or_else(|| {
        PathBuf::from(format!(
            "fstate_analysis_{}",
            chrono::Local::now().format("%Y-%m-%d_%H:%M:%S")
        ))
    });
    let (intervals, counts) = write_scan_result(&result, &output_dir)
        .with_context(|| format!("cannot write the results to {output_dir:?}"))?;
    log::info!("Results written to {intervals:?} and {counts:?}");

    Ok(())
}
