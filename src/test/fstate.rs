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
use std::{fs, time::Duration};

use satexp_utils::fstate::{fstate_path, SnapshotError};

use super::snapshot;
use crate::fstate::*;

const STEP: Duration = Duration::from_millis(100);

#[test]
fn single_change() {
    let (a, b, x, y) = (1, 2, 7, 8);
    let source: MemorySnapshots = [
        snapshot(&[(a, b, x)]),
        snapshot(&[(a, b, x)]),
        snapshot(&[(a, b, y)]),
    ]
    .into_iter()
    .collect();

    let result = scan(&source, [(a, b)], 3, STEP).unwrap();
    assert_eq!(
        result.update_intervals,
        vec![UpdateInterval {
            gap: 2,
            step: 2,
            src: a,
            dst: b,
            next_hop: y
        }]
    );
    assert_eq!(result.changes_of(a, b), Some(1));
    assert_eq!(result.num_steps, 3);
}

#[test]
fn absent_pair_keeps_next_hop() {
    let source: MemorySnapshots = [
        snapshot(&[(1, 2, 5), (3, 4, 9)]),
        snapshot(&[(3, 4, 9)]),
        snapshot(&[(1, 2, 5), (3, 4, 9)]),
        snapshot(&[(3, 4, 9)]),
        snapshot(&[(1, 2, 6)]),
    ]
    .into_iter()
    .collect();

    let result = scan(&source, [], 5, STEP).unwrap();
    assert_eq!(result.changes_of(1, 2), Some(1));
    assert_eq!(result.changes_of(3, 4), Some(0));
    assert_eq!(
        result
            .update_intervals
            .iter()
            .map(UpdateInterval::as_tuple)
            .collect::<Vec<_>>(),
        vec![(4, 4, 1, 2, 6)]
    );
}

#[test]
fn end_to_end_intervals() {
    // next hop of (10, 20) changes at steps 2 and 4, and is initialized at step 0.
    let dir = tempfile::tempdir().unwrap();
    let hops = [30, 30, 31, 31, 32];
    for (step, hop) in hops.iter().enumerate() {
        let time_ns = step as u64 * STEP.as_nanos() as u64;
        fs::write(
            fstate_path(dir.path(), time_ns),
            format!("10,20,{hop}\n10,21,40\n11,20,{}\n", 50 + step),
        )
        .unwrap();
    }

    let source = FstateDir::new(dir.path());
    let result = scan(&source, [(10, 20)], hops.len(), STEP).unwrap();
    assert_eq!(
        result
            .update_intervals
            .iter()
            .map(UpdateInterval::as_tuple)
            .collect::<Vec<_>>(),
        vec![(2, 2, 10, 20, 31), (2, 4, 10, 20, 32)]
    );
    assert_eq!(result.changes_of(10, 20), Some(2));

    // ranking: (11, 20) changes at every step
    assert_eq!(
        result
            .change_counts
            .iter()
            .map(|c| (c.src, c.dst, c.changes))
            .collect::<Vec<_>>(),
        vec![(11, 20, 4), (10, 20, 2), (10, 21, 0)]
    );

    // scanning again yields the same result
    assert_eq!(scan(&source, [(10, 20)], hops.len(), STEP).unwrap(), result);
}

#[test]
fn intervals_are_sorted_by_gap() {
    // (1, 2) changes after 3 steps, (3, 4) after 1 and then after 2 steps
    let source: MemorySnapshots = [
        snapshot(&[(1, 2, 10), (3, 4, 10)]),
        snapshot(&[(3, 4, 11)]),
        snapshot(&[]),
        snapshot(&[(1, 2, 11), (3, 4, 12)]),
    ]
    .into_iter()
    .collect();

    let result = scan(&source, [(1, 2), (3, 4)], 4, STEP).unwrap();
    assert_eq!(
        result
            .update_intervals
            .iter()
            .map(UpdateInterval::as_tuple)
            .collect::<Vec<_>>(),
        vec![(1, 1, 3, 4, 11), (2, 3, 3, 4, 12), (3, 3, 1, 2, 11)]
    );

    // only watched pairs are recorded
    let result = scan(&source, [(1, 2)], 4, STEP).unwrap();
    assert_eq!(result.update_intervals.len(), 1);
    assert_eq!(result.changes_of(3, 4), Some(2));
}

#[test]
fn ranking_ties_by_pair() {
    let source: MemorySnapshots = [
        snapshot(&[(5, 1, 1), (2, 9, 1), (2, 3, 1)]),
        snapshot(&[(5, 1, 2), (2, 9, 2), (2, 3, 2)]),
    ]
    .into_iter()
    .collect();
    let result = scan(&source, [], 2, STEP).unwrap();
    assert_eq!(
        result
            .change_counts
            .iter()
            .map(|c| (c.src, c.dst))
            .collect::<Vec<_>>(),
        vec![(2, 3), (2, 9), (5, 1)]
    );
}

#[test]
fn missing_snapshot_is_fatal() {
    let source = MemorySnapshots::new()
        .with_step(0, snapshot(&[(1, 2, 3)]))
        .with_step(2, snapshot(&[(1, 2, 4)]));
    let err = scan(&source, [], 3, STEP).unwrap_err();
    assert!(
        matches!(
            err,
            FstateError::Snapshot {
                step: 1,
                source: SnapshotError::Missing(_)
            }
        ),
        "{err}"
    );
}

#[test]
fn malformed_snapshot_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(fstate_path(dir.path(), 0), "1,2,3\n").unwrap();
    fs::write(fstate_path(dir.path(), 100_000_000), "1,2,3\n1;2;4\n").unwrap();
    fs::write(fstate_path(dir.path(), 200_000_000), "1,2,3\n").unwrap();

    let err = scan(&FstateDir::new(dir.path()), [], 3, STEP).unwrap_err();
    assert!(
        matches!(
            err,
            FstateError::Snapshot {
                step: 1,
                source: SnapshotError::Malformed { line: 2, .. }
            }
        ),
        "{err}"
    );

    // a missing file in the directory is fatal as well
    fs::remove_file(fstate_path(dir.path(), 200_000_000)).unwrap();
    fs::write(fstate_path(dir.path(), 100_000_000), "1,2,3\n").unwrap();
    let err = scan(&FstateDir::new(dir.path()), [], 3, STEP).unwrap_err();
    assert!(matches!(
        err,
        FstateError::Snapshot {
            step: 2,
            source: SnapshotError::Missing(_)
        }
    ));
}

#[test]
fn incremental_matches_scan() {
    let snapshots = vec![
        snapshot(&[(1, 2, 3), (4, 5, 6)]),
        snapshot(&[(1, 2, 4)]),
        snapshot(&[(4, 5, 7), (1, 2, 3)]),
    ];
    let source: MemorySnapshots = snapshots.clone().into_iter().collect();

    let mut analyzer = FstateAnalyzer::new([]);
    for (step, entries) in snapshots.into_iter().enumerate() {
        analyzer.ingest(step, entries).unwrap();
    }
    assert_eq!(analyzer.num_pairs(), 2);
    assert_eq!(
        analyzer.finish(STEP),
        scan(&source, [], 3, STEP).unwrap()
    );
}

fn write_steps(dir: &std::path::Path, steps: &[u64]) {
    for step in steps {
        fs::write(fstate_path(dir, step * 100_000_000), "1,2,3\n").unwrap();
    }
}

#[test]
fn steps_from_snapshot_files() {
    let dir = tempfile::tempdir().unwrap();
    write_steps(dir.path(), &[0, 1, 2]);
    let source = FstateDir::new(dir.path());

    assert_eq!(
        source.steps_to_scan(None, None, STEP * 3).unwrap(),
        (3, STEP)
    );
    assert_eq!(
        source.steps_to_scan(Some(2), None, STEP * 3).unwrap(),
        (2, STEP)
    );

    // a given step that does not match the files is rejected
    let err = source
        .steps_to_scan(None, Some(STEP * 2), STEP)
        .unwrap_err();
    assert!(
        matches!(
            err,
            FstateError::Discovery(SnapshotError::IrregularTimestamp {
                time_ns: 100_000_000,
                step_ns: 200_000_000
            })
        ),
        "{err}"
    );

    // nothing is read if both are given
    let empty = tempfile::tempdir().unwrap();
    assert_eq!(
        FstateDir::new(empty.path())
            .steps_to_scan(Some(5), Some(STEP), STEP)
            .unwrap(),
        (5, STEP)
    );
}

#[test]
fn steps_with_missing_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    write_steps(dir.path(), &[0, 2, 3, 4]);
    let source = FstateDir::new(dir.path());

    let err = source.steps_to_scan(None, None, STEP).unwrap_err();
    assert!(matches!(&err, FstateError::MissingSteps(m) if m == &[1]), "{err}");

    // a prefix before the gap can still be scanned
    assert_eq!(source.steps_to_scan(Some(1), None, STEP).unwrap(), (1, STEP));

    // every other step missing is only detected with the step given
    let dir = tempfile::tempdir().unwrap();
    write_steps(dir.path(), &[0, 2, 4]);
    let source = FstateDir::new(dir.path());
    assert_eq!(
        source.steps_to_scan(None, None, STEP).unwrap(),
        (3, STEP * 2)
    );
    let err = source.steps_to_scan(None, Some(STEP), STEP).unwrap_err();
    assert!(matches!(&err, FstateError::MissingSteps(m) if m == &[1, 3]), "{err}");
}
