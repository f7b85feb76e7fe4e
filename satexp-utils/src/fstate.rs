//! Module for the forwarding state snapshots (`fstate_<time_ns>.txt`) written by the simulator.
//!
//! Each file holds one line `source,destination,next_hop` per route, without a header.

use std::{
    collections::BTreeSet,
    fs::File,
    io,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Node identifier as used in the snapshot files.
pub type NodeId = u32;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Snapshot file {0:?} does not exist")]
    Missing(PathBuf),
    #[error("IO Error on {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("CSV Error on {path:?}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("Malformed line {line} in {path:?}: {reason}")]
    Malformed {
        path: PathBuf,
        line: u64,
        reason: String,
    },
    #[error("Path {0:?} is not valid unicode")]
    InvalidPath(PathBuf),
    #[error("Glob Error: {0}")]
    Glob(#[from] glob::GlobError),
    #[error("Pattern Error: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("No snapshot files found in {0:?}")]
    Empty(PathBuf),
    #[error("Snapshot at {time_ns}ns is not a multiple of the step duration {step_ns}ns")]
    IrregularTimestamp { time_ns: u64, step_ns: u64 },
}

/// One route of a forwarding state snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct FstateEntry {
    pub src: NodeId,
    pub dst: NodeId,
    pub next_hop: NodeId,
}

/// File name of the snapshot taken at `time_ns`.
pub fn fstate_file_name(time_ns: u64) -> String {
    format!("fstate_{time_ns}.txt")
}

/// Path of the snapshot taken at `time_ns` within `dir`.
pub fn fstate_path(dir: impl AsRef<Path>, time_ns: u64) -> PathBuf {
    dir.as_ref().join(fstate_file_name(time_ns))
}

lazy_static! {
    static ref FSTATE_FILE: Regex = Regex::new(r"^fstate_(?P<time_ns>[0-9]+)\.txt$").unwrap();
}

/// Extract the timestamp from a snapshot file name, e.g., `fstate_100000000.txt`.
pub fn parse_fstate_file_name(name: impl AsRef<str>) -> Option<u64> {
    FSTATE_FILE
        .captures(name.as_ref())?
        .name("time_ns")?
        .as_str()
        .parse()
        .ok()
}

/// Read an entire snapshot file. A missing file and every line that is not exactly three
/// unsigned integers is an error.
pub fn read_fstate(path: impl AsRef<Path>) -> Result<Vec<FstateEntry>, SnapshotError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => SnapshotError::Missing(path.to_path_buf()),
        _ => SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    parse_fstate(file, path)
}

/// Parse snapshot lines from any reader. `path` is only used for error messages.
pub fn parse_fstate<R: io::Read>(
    reader: R,
    path: impl AsRef<Path>,
) -> Result<Vec<FstateEntry>, SnapshotError> {
    let path = path.as_ref();
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut entries = Vec::new();
    for record in csv.records() {
        let record = record.map_err(|source| SnapshotError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let malformed = |reason: String| SnapshotError::Malformed {
            path: path.to_path_buf(),
            line,
            reason,
        };
        if record.len() != 3 {
            return Err(malformed(format!("expected 3 fields, found {}", record.len())));
        }
        let field = |i: usize| -> Result<NodeId, SnapshotError> {
            record[i]
                .parse()
                .map_err(|e| malformed(format!("field {i} ({:?}): {e}", &record[i])))
        };
        entries.push(FstateEntry {
            src: field(0)?,
            dst: field(1)?,
            next_hop: field(2)?,
        });
    }

    Ok(entries)
}

/// Overview of the snapshot files present in a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotIndex {
    pub dir: PathBuf,
    /// Timestamps of all snapshot files, sorted ascending.
    pub times_ns: Vec<u64>,
    /// Step duration, either given or inferred as the greatest common divisor of all positive
    /// timestamps. `None` if there is only a snapshot at time 0.
    pub step_ns: Option<u64>,
    /// Step indices between 0 and the last snapshot that have no file.
    pub missing_steps: Vec<u64>,
}

impl SnapshotIndex {
    /// Number of time steps covered, from step 0 up to and including the last snapshot.
    pub fn num_steps(&self) -> usize {
        match (self.step_ns, self.times_ns.last()) {
            (Some(step), Some(last)) => (last / step) as usize + 1,
            _ => self.times_ns.len(),
        }
    }

    /// Whether all steps from 0 to the last snapshot are present.
    pub fn is_complete(&self) -> bool {
        self.missing_steps.is_empty()
    }
}

/// List all `fstate_<time_ns>.txt` files of `dir` and check their numbering. The step duration is
/// inferred from the timestamps, see [`discover_snapshots_with_step`].
pub fn discover_snapshots(dir: impl AsRef<Path>) -> Result<SnapshotIndex, SnapshotError> {
    discover_snapshots_with_step(dir, None)
}

/// List all `fstate_<time_ns>.txt` files of `dir` and check their numbering against `step_ns`.
///
/// Without a given step, the greatest common divisor of all positive timestamps is used. This
/// detects any missing step as long as two present snapshots are one step apart; if every other
/// step is missing, only an explicit step reveals the gaps.
pub fn discover_snapshots_with_step(
    dir: impl AsRef<Path>,
    step_ns: Option<u64>,
) -> Result<SnapshotIndex, SnapshotError> {
    let dir = dir.as_ref();
    let dir_str = dir
        .to_str()
        .ok_or_else(|| SnapshotError::InvalidPath(dir.to_path_buf()))?;
    let pattern = format!("{}/fstate_*.txt", glob::Pattern::escape(dir_str));

    let mut times = BTreeSet::new();
    for path in glob::glob(&pattern)? {
        let path = path?;
        match path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_fstate_file_name)
        {
            Some(t) => {
                times.insert(t);
            }
            None => log::trace!("ignoring {path:?}"),
        }
    }
    if times.is_empty() {
        return Err(SnapshotError::Empty(dir.to_path_buf()));
    }
    let times_ns = times.into_iter().collect_vec();

    let step_ns = step_ns
        .filter(|step| *step > 0)
        .or_else(|| match times_ns.iter().fold(0, |acc, t| gcd(acc, *t)) {
            0 => None,
            step => Some(step),
        });
    let missing_steps = match step_ns {
        Some(step_ns) => {
            if let Some(time_ns) = times_ns.iter().copied().find(|t| t % step_ns != 0) {
                return Err(SnapshotError::IrregularTimestamp { time_ns, step_ns });
            }
            let last_step = times_ns.last().copied().unwrap_or_default() / step_ns;
            let mut present = times_ns.iter().map(|t| t / step_ns).peekable();
            (0..=last_step)
                .filter(|step| {
                    if present.peek() == Some(step) {
                        present.next();
                        false
                    } else {
                        true
                    }
                })
                .collect()
        }
        None => Vec::new(),
    };

    Ok(SnapshotIndex {
        dir: dir.to_path_buf(),
        times_ns,
        step_ns,
        missing_steps,
    })
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[cfg(test)]
mod test {
    use std::fs;

    use super::*;

    #[test]
    fn file_names() {
        assert_eq!(fstate_file_name(100_000_000), "fstate_100000000.txt");
        assert_eq!(parse_fstate_file_name("fstate_0.txt"), Some(0));
        assert_eq!(parse_fstate_file_name("fstate_200000000.txt"), Some(200_000_000));
        assert_eq!(parse_fstate_file_name("fstate_abc.txt"), None);
        assert_eq!(parse_fstate_file_name("gsl_if_bandwidth_0.txt"), None);
    }

    #[test]
    fn parse_lines() {
        let data = "1543,1612,17\n1543, 1613 ,18\n\n0,1,2\n";
        let entries = parse_fstate(data.as_bytes(), "test").unwrap();
        assert_eq!(
            entries,
            vec![
                FstateEntry { src: 1543, dst: 1612, next_hop: 17 },
                FstateEntry { src: 1543, dst: 1613, next_hop: 18 },
                FstateEntry { src: 0, dst: 1, next_hop: 2 },
            ]
        );
    }

    #[test]
    fn parse_malformed() {
        let err = parse_fstate("1,2,3\n1,2\n".as_bytes(), "test").unwrap_err();
        assert!(matches!(err, SnapshotError::Malformed { line: 2, .. }), "{err}");

        let err = parse_fstate("1,x,3\n".as_bytes(), "test").unwrap_err();
        assert!(matches!(err, SnapshotError::Malformed { line: 1, .. }), "{err}");

        let err = parse_fstate("1,2,-3\n".as_bytes(), "test").unwrap_err();
        assert!(matches!(err, SnapshotError::Malformed { .. }), "{err}");
    }

    #[test]
    fn read_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_fstate(fstate_path(dir.path(), 0)).unwrap_err();
        assert!(matches!(err, SnapshotError::Missing(_)));
    }

    #[test]
    fn discover() {
        let dir = tempfile::tempdir().unwrap();
        for step in [0, 1, 2, 4] {
            fs::write(fstate_path(dir.path(), step * 100_000_000), "0,1,2\n").unwrap();
        }
        fs::write(dir.path().join("fstate_notes.txt"), "").unwrap();

        let index = discover_snapshots(dir.path()).unwrap();
        assert_eq!(index.step_ns, Some(100_000_000));
        assert_eq!(index.num_steps(), 5);
        assert_eq!(index.missing_steps, vec![3]);
        assert!(!index.is_complete());
    }

    #[test]
    fn discover_single_and_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            discover_snapshots(dir.path()),
            Err(SnapshotError::Empty(_))
        ));

        fs::write(fstate_path(dir.path(), 0), "").unwrap();
        let index = discover_snapshots(dir.path()).unwrap();
        assert_eq!(index.step_ns, None);
        assert_eq!(index.num_steps(), 1);
        assert!(index.is_complete());
    }

    #[test]
    fn discover_first_step_missing() {
        let dir = tempfile::tempdir().unwrap();
        for step in [0, 2, 3, 4] {
            fs::write(fstate_path(dir.path(), step * 100_000_000), "0,1,2\n").unwrap();
        }

        let index = discover_snapshots(dir.path()).unwrap();
        assert_eq!(index.step_ns, Some(100_000_000));
        assert_eq!(index.num_steps(), 5);
        assert_eq!(index.missing_steps, vec![1]);
    }

    #[test]
    fn discover_every_other_step_missing() {
        let dir = tempfile::tempdir().unwrap();
        for step in [0, 2, 4, 6] {
            fs::write(fstate_path(dir.path(), step * 100_000_000), "").unwrap();
        }

        // looks complete at twice the step
        let index = discover_snapshots(dir.path()).unwrap();
        assert_eq!(index.step_ns, Some(200_000_000));
        assert!(index.is_complete());

        let index = discover_snapshots_with_step(dir.path(), Some(100_000_000)).unwrap();
        assert_eq!(index.step_ns, Some(100_000_000));
        assert_eq!(index.num_steps(), 7);
        assert_eq!(index.missing_steps, vec![1, 3, 5]);
    }

    #[test]
    fn discover_irregular() {
        let dir = tempfile::tempdir().unwrap();
        for t in [0, 100, 250] {
            fs::write(fstate_path(dir.path(), t), "").unwrap();
        }
        let index = discover_snapshots(dir.path()).unwrap();
        assert_eq!(index.step_ns, Some(50));
        assert_eq!(index.missing_steps, vec![1, 3, 4]);

        assert!(matches!(
            discover_snapshots_with_step(dir.path(), Some(100)),
            Err(SnapshotError::IrregularTimestamp { time_ns: 250, step_ns: 100 })
        ));
    }
}
