//! # Scheduler Tests
//!
//! Multi-threaded runs: barrier ordering, uneven streams, serialized mode,
//! per-core failures, and the classic two-core scenario.

use std::collections::BTreeSet;
use std::io::Cursor;

use mesisim_core::common::{AccessKind, Address, SimError};
use mesisim_core::config::ExecutionMode;
use mesisim_core::core::cache::MesiState;
use mesisim_core::core::coherence::SystemSnapshot;
use mesisim_core::sim::report::ReportEvent;
use mesisim_core::sim::{ClockScheduler, EventLog, InstructionSource, ProgramSource, TextSource};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::harness::{program, run, run_with_dumps, system};

// ══════════════════════════════════════════════════════════
// 1. Clocking
// ══════════════════════════════════════════════════════════

/// Cycle K holds exactly instruction K of every core that still has one.
#[rstest]
#[case(ExecutionMode::Interleaved)]
#[case(ExecutionMode::Serialized)]
fn test_barrier_property(#[case] mode: ExecutionMode) {
    let ctl = system(3, 2, 24);
    let programs = [
        "WR 0 1\nWR 1 2\nWR 2 3",
        "RD 5\nRD 6\nRD 7",
        "WR 10 4\nRD 10\nWR 11 5",
    ];
    let result = run(&ctl, mode, &programs);
    assert!(result.summary.is_clean());
    assert_eq!(result.summary.cycles, 3);

    let cycles = result.log.cycles();
    assert_eq!(cycles.len(), 3);
    for (k, cycle) in cycles.iter().enumerate() {
        let cores: BTreeSet<usize> = cycle.iter().map(|o| o.core).collect();
        assert_eq!(cores, BTreeSet::from([0, 1, 2]), "cycle {}", k + 1);
    }
    assert_eq!(cycles[1].iter().find(|o| o.core == 2).unwrap().value, 4);

    let markers: Vec<u64> = result
        .log
        .events()
        .iter()
        .filter_map(|e| match e {
            ReportEvent::CycleEnd(c) => Some(*c),
            _ => None,
        })
        .collect();
    assert_eq!(markers, vec![1, 2, 3]);
}

/// Finished cores leave the barrier; the rest keep going.
#[test]
fn test_uneven_streams() {
    let ctl = system(3, 2, 24);
    let result = run(&ctl, ExecutionMode::Interleaved, &["RD 0\nRD 1\nRD 2", "WR 3 3", ""]);
    assert!(result.summary.is_clean());
    assert_eq!(result.summary.cycles, 3);
    let sizes: Vec<usize> = result.log.cycles().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![2, 1, 1]);
    let executed: Vec<u64> = result.summary.cores.iter().map(|r| r.executed()).collect();
    assert_eq!(executed, vec![3, 1, 0]);
}

/// All cores empty: nothing runs and no cycle completes.
#[test]
fn test_empty_run() {
    let ctl = system(2, 2, 24);
    let result = run(&ctl, ExecutionMode::Interleaved, &["", ""]);
    assert_eq!(result.summary.cycles, 0);
    assert!(result.log.events().is_empty());
}

/// A write in cycle K is visible to every read in cycle K + 1.
#[test]
fn test_cross_core_visibility_across_cycles() {
    let ctl = system(2, 2, 24);
    let result = run(&ctl, ExecutionMode::Interleaved, &["WR 3 7", "RD 0\nRD 3"]);
    let last = result.log.cycles()[1][0];
    assert_eq!(last.core, 1);
    assert_eq!(last.value, 7);
    assert!(ctl.snapshot().check_coherence().is_ok());
}

// ══════════════════════════════════════════════════════════
// 2. Serialized mode
// ══════════════════════════════════════════════════════════

/// Within every cycle observations appear in ascending core order, run after run.
#[test]
fn test_serialized_is_deterministic() {
    let programs = ["WR 0 1\nRD 1\nWR 2 2", "WR 0 2\nRD 0", "RD 0\nWR 1 9\nRD 1\nRD 2"];
    let mut first = None;
    for _ in 0..10 {
        let ctl = system(3, 2, 24);
        let result = run(&ctl, ExecutionMode::Serialized, &programs);
        for cycle in result.log.cycles() {
            let order: Vec<usize> = cycle.iter().map(|o| o.core).collect();
            let mut sorted = order.clone();
            sorted.sort_unstable();
            assert_eq!(order, sorted);
        }
        let observations = result.log.observations();
        match &first {
            None => first = Some(observations),
            Some(expected) => assert_eq!(&observations, expected),
        }
    }
}

// ══════════════════════════════════════════════════════════
// 3. Failures
// ══════════════════════════════════════════════════════════

/// A malformed line stops its core only; the report names core and line.
#[rstest]
#[case(ExecutionMode::Interleaved)]
#[case(ExecutionMode::Serialized)]
fn test_parse_error_aborts_one_core(#[case] mode: ExecutionMode) {
    let ctl = system(2, 2, 24);
    let sources: Vec<Box<dyn InstructionSource>> = vec![
        Box::new(program("WR 0 1\nWR 1 2\nWR 2 3")),
        Box::new(TextSource::new(1, Cursor::new("RD 0\nRD 999\nRD 1\n"))),
    ];
    let mut log = EventLog::new();
    let summary = ClockScheduler::new(&ctl, mode).run(sources, &mut log).unwrap();

    assert!(!summary.is_clean());
    assert_eq!(summary.cycles, 3);
    assert_eq!(summary.cores[0].executed(), 3);
    assert_eq!(summary.cores[1].executed(), 1);
    match summary.cores[1].error.as_ref() {
        Some(SimError::Parse { core: 1, line: 2, .. }) => {}
        other => panic!("unexpected error: {other:?}"),
    }
}

/// An out-of-range address stops its core after the preceding instructions ran.
#[test]
fn test_out_of_bounds_aborts_one_core() {
    let ctl = system(2, 2, 24);
    let result = run(&ctl, ExecutionMode::Interleaved, &["WR 1 1\nRD 24\nRD 1", "RD 2\nRD 3"]);
    let errors: Vec<&SimError> = result.summary.errors().collect();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], SimError::OutOfBounds { .. }));
    assert_eq!(result.summary.cores[0].executed(), 1);
    assert_eq!(result.summary.cores[1].executed(), 2);
    assert_eq!(result.summary.cycles, 2);
}

/// A core whose stream could not be opened takes no part in the run.
#[test]
fn test_missing_source_excludes_core() {
    let ctl = system(2, 2, 24);
    let sources = vec![
        Ok(program("RD 0\nRD 1")),
        Err(SimError::MissingSource {
            core: 1,
            path: "core_1.txt".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }),
    ];
    let mut log = EventLog::new();
    let summary = ClockScheduler::new(&ctl, ExecutionMode::Serialized)
        .run_loaded(sources, &mut log)
        .unwrap();
    assert_eq!(summary.cycles, 2);
    assert_eq!(summary.cores.len(), 2);
    assert!(matches!(summary.cores[1].error, Some(SimError::MissingSource { .. })));
    assert!(log.observations().iter().all(|o| o.core == 0));
}

/// More streams than cores is a configuration error.
#[test]
fn test_too_many_sources_rejected() {
    let ctl = system(1, 2, 24);
    let sources = vec![ProgramSource::default(), ProgramSource::default()];
    let err = ClockScheduler::new(&ctl, ExecutionMode::Interleaved)
        .run(sources, &mut EventLog::new())
        .unwrap_err();
    assert!(matches!(err, SimError::InvalidConfig(_)));
}

// ══════════════════════════════════════════════════════════
// 4. Scenarios
// ══════════════════════════════════════════════════════════

/// Two cores, 24 bytes, two slots: racing writes to address 0 then a colliding read.
#[test]
fn test_two_core_scenario() {
    for _ in 0..20 {
        let ctl = system(2, 2, 24);
        let result = run_with_dumps(&ctl, ExecutionMode::Interleaved, &["WR 0 5\nRD 2", "WR 0 9"], true);
        assert!(result.summary.is_clean());

        let mut end_of_cycle_1: Option<&SystemSnapshot> = None;
        for event in result.log.events() {
            match event {
                ReportEvent::Dump(snapshot) => end_of_cycle_1 = Some(snapshot),
                ReportEvent::CycleEnd(1) => break,
                _ => {}
            }
        }
        let snapshot = end_of_cycle_1.unwrap();
        let lines = [snapshot.line(0, 0).unwrap(), snapshot.line(1, 0).unwrap()];
        let owner = lines.iter().position(|l| l.state == MesiState::Modified).unwrap();
        let other = 1 - owner;
        assert_eq!(lines[owner].address, Some(Address::new(0)));
        assert_eq!(lines[owner].value, [5, 9][owner]);
        assert_eq!(lines[other].address, Some(Address::new(0)));
        assert_eq!(lines[other].state, MesiState::Invalid);

        let memory0 = ctl.memory().read(Address::new(0)).unwrap();
        if owner == 0 {
            assert_eq!(memory0, 5);
        } else {
            assert_eq!(memory0, 0);
            assert_eq!(ctl.line(1, 0).unwrap().value, 9);
        }
        let read = result.log.cycles()[1][0];
        assert_eq!((read.core, read.kind, read.value), (0, AccessKind::Read, 0));
        assert!(ctl.snapshot().check_coherence().is_ok());
        assert!(result.log.dumps().all(|d| d.check_coherence().is_ok()));
    }
}

/// Many cores hammering a few addresses keep every intermediate state coherent.
#[test]
fn test_contended_run_stays_coherent() {
    let programs: Vec<String> = (0..6)
        .map(|core| {
            (0..40)
                .map(|i| {
                    let addr = (core * 7 + i * 3) % 8;
                    if (core + i) % 3 == 0 {
                        format!("WR {addr} {}\n", (core * 40 + i) % 256)
                    } else {
                        format!("RD {addr}\n")
                    }
                })
                .collect()
        })
        .collect();
    let texts: Vec<&str> = programs.iter().map(String::as_str).collect();
    for mode in [ExecutionMode::Interleaved, ExecutionMode::Serialized] {
        let ctl = system(6, 3, 8);
        let result = run_with_dumps(&ctl, mode, &texts, true);
        assert!(result.summary.is_clean());
        assert_eq!(result.summary.cycles, 40);
        assert_eq!(result.summary.stats().totals().instructions(), 240);
        assert_eq!(result.log.dumps().count(), 240);
        for dump in result.log.dumps() {
            assert_eq!(dump.check_coherence(), Ok(()), "{dump}");
        }
        assert!(ctl.snapshot().check_coherence().is_ok());
    }
}
