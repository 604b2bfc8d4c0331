//! Memory arbitration and fill-timing tests.

use mipsim_core::config::MemoryConfig;
use mipsim_core::isa::{Instruction, Op};
use mipsim_core::mem::{Access, BusyAt, MemorySystem, Word};

fn system_with(instructions: usize, data: &[i32]) -> MemorySystem {
    let program: Vec<Instruction> = (0..instructions)
        .map(|_| Instruction::new(Op::Halt, String::from("hlt")))
        .collect();
    MemorySystem::new(&MemoryConfig::default(), &program, data).expect("program fits")
}

#[test]
fn instruction_fill_takes_twenty_five_attempts() {
    let mut mem = system_with(4, &[]);

    // Attempt 1 starts the fill and counts the request.
    assert_eq!(
        mem.fetch_instr(0).expect("in range"),
        Access::Busy(BusyAt::Fetch)
    );
    assert_eq!(mem.stats.i_requests, 1);

    // Attempts 2..=24 work the timer down.
    for attempt in 2..=24 {
        assert_eq!(
            mem.fetch_instr(0).expect("in range"),
            Access::Busy(BusyAt::Fetch),
            "attempt {}",
            attempt
        );
    }

    // Attempt 25 installs the block and returns the instruction.
    match mem.fetch_instr(0).expect("in range") {
        Access::Ready(inst) => assert_eq!(inst.op, Op::Halt),
        Access::Busy(_) => panic!("fill should have completed"),
    }
    // The completion counts neither a request nor a hit.
    assert_eq!(mem.stats.i_requests, 1);
    assert_eq!(mem.stats.i_hits, 0);
}

#[test]
fn fetch_after_fill_hits_whole_block() {
    let mut mem = system_with(8, &[]);
    while !matches!(mem.fetch_instr(0).expect("in range"), Access::Ready(_)) {}

    // All eight words of the block are now resident.
    for addr in (4..32).step_by(4) {
        assert!(
            matches!(mem.fetch_instr(addr).expect("in range"), Access::Ready(_)),
            "address {} should hit",
            addr
        );
    }
    assert_eq!(mem.stats.i_hits, 7);
    assert_eq!(mem.stats.i_requests, 8);
}

#[test]
fn data_fill_takes_thirteen_attempts() {
    let mut mem = system_with(1, &[7]);

    assert_eq!(
        mem.fetch_data(0x100).expect("in range"),
        Access::Busy(BusyAt::Mem)
    );
    assert_eq!(mem.stats.d_requests, 1);

    for _ in 2..=12 {
        assert_eq!(
            mem.fetch_data(0x100).expect("in range"),
            Access::Busy(BusyAt::Mem)
        );
    }

    assert_eq!(mem.fetch_data(0x100).expect("in range"), Access::Ready(7));
    assert_eq!(mem.stats.d_requests, 1);
    assert_eq!(mem.stats.d_hits, 0);
}

#[test]
fn instruction_fill_preempts_data_miss() {
    let mut mem = system_with(1, &[7]);

    // Start an instruction fill.
    assert_eq!(
        mem.fetch_instr(0).expect("in range"),
        Access::Busy(BusyAt::Fetch)
    );

    // Data misses yield the port to the instruction fill, working its
    // timer down without starting their own.
    for _ in 0..23 {
        assert_eq!(
            mem.fetch_data(0x100).expect("in range"),
            Access::Busy(BusyAt::Mem)
        );
    }
    assert_eq!(mem.stats.d_requests, 0);

    // The instruction fill now completes immediately.
    assert!(matches!(
        mem.fetch_instr(0).expect("in range"),
        Access::Ready(_)
    ));
}

#[test]
fn write_hit_enqueues_and_drains() {
    let mut mem = system_with(1, &[7]);
    // Fill the data block first so the store hits.
    while !matches!(mem.fetch_data(0x100).expect("in range"), Access::Ready(_)) {}

    assert_eq!(
        mem.write_word(42, 0x100).expect("in range"),
        Access::Ready(())
    );
    assert_eq!(mem.stats.d_hits, 1);
    assert!(!mem.write_buffer_empty());
    // RAM still holds the old word until the buffer drains.
    assert_eq!(mem.peek(0x100), Some(&Word::Data(7)));

    for _ in 0..3 {
        mem.drain_write_buffer();
    }
    assert_eq!(mem.peek(0x100), Some(&Word::Data(42)));
    assert!(mem.write_buffer_empty());

    // The cache saw the write immediately.
    assert_eq!(mem.fetch_data(0x100).expect("in range"), Access::Ready(42));
}

#[test]
fn write_miss_fills_then_writes() {
    let mut mem = system_with(1, &[7]);

    assert_eq!(
        mem.write_word(42, 0x100).expect("in range"),
        Access::Busy(BusyAt::Mem)
    );
    for _ in 2..=12 {
        assert_eq!(
            mem.write_word(42, 0x100).expect("in range"),
            Access::Busy(BusyAt::Mem)
        );
    }
    assert_eq!(
        mem.write_word(42, 0x100).expect("in range"),
        Access::Ready(())
    );
    assert_eq!(mem.stats.d_requests, 1);
    assert_eq!(mem.stats.d_hits, 0);
    assert!(!mem.write_buffer_empty());
}

#[test]
fn busy_write_buffer_blocks_new_fills() {
    let mut mem = system_with(1, &[7]);
    while !matches!(mem.fetch_data(0x100).expect("in range"), Access::Ready(_)) {}
    mem.write_word(42, 0x100).expect("in range");

    // Start the drain.
    mem.drain_write_buffer();

    // A conflicting-block miss cannot start while the drain holds the port.
    assert_eq!(
        mem.fetch_data(0x140).expect("in range"),
        Access::Busy(BusyAt::Mem)
    );
    // Neither can an instruction miss; it stalls behind MEM.
    assert_eq!(
        mem.fetch_instr(0x40).expect("in range"),
        Access::Busy(BusyAt::Mem)
    );
}

#[test]
fn data_word_fetched_as_instruction_is_diagnosed() {
    let mut mem = system_with(1, &[7]);
    loop {
        match mem.fetch_instr(0x100) {
            Ok(Access::Busy(_)) => continue,
            Ok(Access::Ready(_)) => panic!("data word must not execute"),
            Err(e) => {
                assert!(e.is_missing_halt());
                break;
            }
        }
    }
}

#[test]
fn empty_slot_fetch_is_diagnosed() {
    let mut mem = system_with(1, &[]);
    loop {
        match mem.fetch_instr(8) {
            Ok(Access::Busy(_)) => continue,
            Ok(Access::Ready(_)) => panic!("empty slot must not execute"),
            Err(e) => {
                assert!(e.is_missing_halt());
                break;
            }
        }
    }
}

#[test]
fn out_of_range_access_is_an_error() {
    let mut mem = system_with(1, &[]);
    assert!(mem.fetch_data(512).is_err());
    assert!(mem.fetch_data(-4).is_err());
    assert!(mem.write_word(1, 600).is_err());
}
