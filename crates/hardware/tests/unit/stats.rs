//! # Statistics Tests
//!
//! Accumulation of per-core counters from executed instructions and run totals.

use mesisim_core::isa::Instruction;
use mesisim_core::stats::{CoreStats, SimStats};
use pretty_assertions::assert_eq;

use crate::common::harness::system;

#[test]
fn test_record_classifies_accesses() {
    let ctl = system(2, 2, 24);
    let mut core0 = CoreStats::default();
    let mut core1 = CoreStats::default();

    core0.record(&ctl.execute(0, Instruction::write(0, 5)).unwrap());
    core1.record(&ctl.execute(1, Instruction::read(0)).unwrap());
    core1.record(&ctl.execute(1, Instruction::read(0)).unwrap());
    core1.record(&ctl.execute(1, Instruction::write(0, 6)).unwrap());
    core0.record(&ctl.execute(0, Instruction::read(2)).unwrap());

    assert_eq!(
        core0,
        CoreStats {
            reads: 1,
            writes: 1,
            read_hits: 0,
            read_misses: 1,
            peer_fills: 0,
            memory_fills: 1,
            evictions: 0,
            writebacks: 0,
            invalidations_sent: 0,
        }
    );
    assert_eq!(
        core1,
        CoreStats {
            reads: 2,
            writes: 1,
            read_hits: 1,
            read_misses: 1,
            peer_fills: 1,
            memory_fills: 0,
            evictions: 0,
            writebacks: 1,
            invalidations_sent: 1,
        }
    );
    assert!((core1.hit_rate() - 0.5).abs() < f64::EPSILON);
}

#[test]
fn test_totals_and_empty_hit_rate() {
    let stats = SimStats {
        cycles: 3,
        cores: vec![
            CoreStats {
                reads: 2,
                read_hits: 1,
                ..CoreStats::default()
            },
            CoreStats {
                writes: 4,
                invalidations_sent: 2,
                ..CoreStats::default()
            },
        ],
    };
    let total = stats.totals();
    assert_eq!(total.instructions(), 6);
    assert_eq!(total.invalidations_sent, 2);
    assert!(stats.cores[1].hit_rate().abs() < f64::EPSILON);
}

#[test]
fn test_stats_serialize_to_json() {
    let stats = SimStats {
        cycles: 1,
        cores: vec![CoreStats::default()],
    };
    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["cycles"], 1);
    assert_eq!(json["cores"][0]["reads"], 0);
}
