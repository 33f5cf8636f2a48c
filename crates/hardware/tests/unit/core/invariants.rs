//! # Coherence Invariant Tests
//!
//! Random interleavings of random per-core programs, executed one transaction
//! at a time. Every read must return the latest value written to its address in
//! execution order, and every intermediate state must satisfy the protocol
//! invariants.

use mesisim_core::core::cache::MesiState;
use mesisim_core::isa::Instruction;
use proptest::prelude::*;

use crate::common::harness::system;
use crate::common::reference::ReferenceMemory;

const MEMORY: usize = 12;

fn instruction() -> impl Strategy<Value = Instruction> {
    prop_oneof![
        (0..MEMORY).prop_map(Instruction::read),
        (0..MEMORY, any::<u8>()).prop_map(|(addr, value)| Instruction::write(addr, value)),
    ]
}

/// A schedule of `(core, instruction)` steps over up to four cores.
fn schedule() -> impl Strategy<Value = (usize, usize, Vec<(usize, Instruction)>)> {
    (1_usize..=4, 1_usize..=4).prop_flat_map(|(cores, slots)| {
        (
            Just(cores),
            Just(slots),
            prop::collection::vec((0..cores, instruction()), 1..80),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Reads observe the reference value and the invariants hold after every step.
    #[test]
    fn prop_matches_reference_and_stays_coherent((cores, slots, steps) in schedule()) {
        let ctl = system(cores, slots, MEMORY);
        let mut reference = ReferenceMemory::new(MEMORY);

        for (core, instruction) in steps {
            let exec = ctl.execute(core, instruction).unwrap();
            let expected = reference.apply(instruction);
            prop_assert_eq!(exec.observation.value, expected, "{} on core {}", instruction, core);

            let snapshot = ctl.snapshot();
            let violations = snapshot.violations();
            prop_assert!(violations.is_empty(), "{:?}\n{}", violations, snapshot);
        }
    }

    /// Flushing every line leaves memory equal to the reference.
    #[test]
    fn prop_memory_converges_after_flush((cores, slots, steps) in schedule()) {
        let ctl = system(cores, slots, MEMORY);
        let mut reference = ReferenceMemory::new(MEMORY);
        for (core, instruction) in steps {
            let _ = ctl.execute(core, instruction).unwrap();
            let _ = reference.apply(instruction);
        }

        let snapshot = ctl.snapshot();
        let mut memory = snapshot.memory.clone();
        for line in snapshot.cores.iter().flatten() {
            if let (Some(address), MesiState::Modified) = (line.address, line.state) {
                memory[address.val()] = line.value;
            }
        }
        for (addr, value) in memory.iter().enumerate() {
            prop_assert_eq!(*value, reference.get(addr), "address {}", addr);
        }
    }
}
