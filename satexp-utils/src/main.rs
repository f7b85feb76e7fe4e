use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use itertools::Itertools;

use satexp_utils::fstate::{discover_snapshots_with_step, read_fstate};

#[derive(Parser, Debug)]
#[command(author, version, about)] // get author/version information from Cargo.toml
/// Check the numbering of the forwarding state snapshots in a directory before analyzing them.
struct Args {
    /// Directory containing the `fstate_<time_ns>.txt` files.
    fstate_dir: PathBuf,
    /// Expected step duration in nanoseconds. Inferred from the timestamps if omitted.
    #[arg(long)]
    step_ns: Option<u64>,
    /// Additionally parse every snapshot file to detect malformed lines.
    #[arg(long)]
    parse: bool,
}

fn main() -> ExitCode {
    pretty_env_logger::init();

    let args = Args::parse();

    let index = match discover_snapshots_with_step(&args.fstate_dir, args.step_ns) {
        Ok(index) => index,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    println!("directory:      {}", index.dir.display());
    println!("snapshot files: {}", index.times_ns.len());
    match index.step_ns {
        Some(step) => println!("step duration:  {step}ns"),
        None => println!("step duration:  unknown (single snapshot)"),
    }
    println!("time steps:     {}", index.num_steps());

    let mut ok = index.is_complete();
    if !ok {
        println!(
            "missing steps:  {} ({})",
            index.missing_steps.len(),
            index.missing_steps.iter().take(20).join(", ")
        );
    }

    if args.parse {
        for time_ns in &index.times_ns {
            let path = satexp_utils::fstate::fstate_path(&index.dir, *time_ns);
            match read_fstate(&path) {
                Ok(entries) => log::debug!("{path:?}: {} routes", entries.len()),
                Err(e) => {
                    println!("{e}");
                    ok = false;
                }
            }
        }
    }

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
