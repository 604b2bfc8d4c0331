//! End-to-end pipeline scenarios and trace invariants.

use crate::common::harness::TestContext;
use mipsim_core::mem::Word;

#[test]
fn halt_only_program_retires_cleanly() {
    let mut ctx = TestContext::assemble("hlt\n");
    ctx.run();

    let stats = ctx.stats();
    assert_eq!(stats.d_requests, 0);
    assert_eq!(stats.i_misses(), 1);

    // The halt's own line plus the stats block.
    let times = ctx.times_of("hlt");
    assert_eq!(times.len(), 5);
    assert!(ctx.output().contains("Total number of access requests"));
}

#[test]
fn stage_timestamps_are_monotonic() {
    let mut ctx = TestContext::assemble(
        "li r1, 5\nli r2, 9\nadd r3, r1, r2\nsub r4, r3, r1\nhlt\n",
    );
    ctx.run();

    for (name, times) in ctx.timing_lines() {
        if times.len() == 5 {
            for pair in times.windows(2) {
                assert!(pair[0] <= pair[1], "{}: {:?}", name, times);
            }
        }
    }
}

// Scenario A: cache-miss accounting on a straight-line program.
#[test]
fn cache_miss_accounting() {
    let mut ctx = TestContext::assemble("li r1, 5\nli r2, 9\nadd r3, r1, r2\nhlt\n");
    ctx.run();

    assert_eq!(ctx.reg(3), 14);
    let stats = ctx.stats();
    assert_eq!(stats.d_requests, 0);
    assert_eq!(stats.d_hits, 0);
    // One cold miss for the first fetch; everything after hits in-block.
    assert_eq!(stats.i_misses(), 1);
    assert!(stats.i_hits >= 2);
}

// Scenario B: back-to-back add dependence resolves through forwarding
// after the single add/sub bubble.
#[test]
fn raw_dependence_with_forwarding() {
    let mut ctx =
        TestContext::assemble("li r1, 3\nli r2, 4\nadd r3, r1, r2\nadd r4, r3, r3\nhlt\n");
    ctx.run();

    assert_eq!(ctx.reg(3), 7);
    assert_eq!(ctx.reg(4), 14);

    // One bubble: the consumer decodes two ticks after the producer, then
    // takes the producer's EX2 row.
    let producer = ctx.times_of("add r3, r1, r2");
    let consumer = ctx.times_of("add r4, r3, r3");
    assert_eq!(consumer[1] - producer[1], 2);
}

// Scenario C: a multiply publishes nothing before EX3, so a dependent
// consumer stalls twice and then forwards the EX3 row.
#[test]
fn mult_hazard_stalls_consumer() {
    let mut ctx =
        TestContext::assemble("li r1, 3\nli r2, 4\nmult r3, r1, r2\nadd r4, r3, r3\nhlt\n");
    ctx.run();

    assert_eq!(ctx.reg(3), 12);
    assert_eq!(ctx.reg(4), 24);

    let mult = ctx.times_of("mult r3, r1, r2");
    let add = ctx.times_of("add r4, r3, r3");
    assert!(
        add[1] > mult[1] + 1,
        "consumer ID {} must trail producer ID {} by more than one tick",
        add[1],
        mult[1]
    );
}

// Scenario D: load-use hazard stalls until the loaded value is forwarded.
#[test]
fn load_use_hazard_stalls_consumer() {
    let mut ctx =
        TestContext::with_data("li r2, 256\nlw r1, 0(r2)\nadd r3, r1, r1\nhlt\n", &[7]);
    ctx.run();

    assert_eq!(ctx.reg(1), 7);
    assert_eq!(ctx.reg(3), 14);

    let stats = ctx.stats();
    assert_eq!(stats.d_requests, 1);
    assert_eq!(stats.d_hits, 0);

    // The consumer sits in ID until the load's MEM completes.
    let lw = ctx.times_of("lw r1, 0(r2)");
    let add = ctx.times_of("add r3, r1, r1");
    assert!(add[1] >= lw[3], "add ID {} before lw MEM {}", add[1], lw[3]);
}

// Scenario E: a taken branch flushes the speculative fetch, and the flush
// bubble retires carrying the discarded instruction's text.
#[test]
fn taken_branch_flushes_and_shadows() {
    let mut ctx = TestContext::assemble(
        "li r1, 1\nli r2, 1\nbeq r1, r2, skip\nli r3, 99\nskip: li r3, 7\nhlt\n",
    );
    ctx.run();

    assert_eq!(ctx.reg(3), 7);

    // The branch retires with IF and ID only.
    let branch = ctx.times_of("beq r1, r2, skip");
    assert_eq!(branch.len(), 2);

    // The wrong-path instruction appears as a bare shadow line.
    let lines = ctx.timing_lines();
    let shadow = lines
        .iter()
        .find(|(name, _)| name == "li r3, 99")
        .expect("shadow line present");
    assert!(shadow.1.is_empty(), "shadow line carries no timestamps");
}

#[test]
fn untaken_branch_does_not_flush() {
    let mut ctx = TestContext::assemble(
        "li r1, 1\nli r2, 2\nbeq r1, r2, skip\nli r3, 99\nskip: li r4, 7\nhlt\n",
    );
    ctx.run();

    assert_eq!(ctx.reg(3), 99);
    assert_eq!(ctx.reg(4), 7);
}

#[test]
fn jump_is_unconditional() {
    let mut ctx = TestContext::assemble("li r1, 1\nj skip\nli r2, 99\nskip: li r3, 5\nhlt\n");
    ctx.run();

    assert_eq!(ctx.reg(2), 0);
    assert_eq!(ctx.reg(3), 5);
    assert_eq!(ctx.times_of("j skip").len(), 2);
}

#[test]
fn backward_branch_loops() {
    // r1 counts down from 3; the loop body runs three times.
    let mut ctx = TestContext::assemble(
        "li r1, 3\nli r2, 0\nloop: subi r1, r1, 1\naddi r2, r2, 10\nbne r1, r0, loop\nhlt\n",
    );
    ctx.run();

    assert_eq!(ctx.reg(1), 0);
    assert_eq!(ctx.reg(2), 30);
}

// Scenario F: termination waits for the write buffer; the word lands in
// RAM before the machine reports done.
#[test]
fn write_buffer_drains_before_termination() {
    let mut ctx = TestContext::assemble("li r1, 42\nli r2, 256\nsw r1, 0(r2)\nhlt\n");
    ctx.run();

    assert!(ctx.sim.cpu.mem.write_buffer_empty());
    assert_eq!(ctx.sim.cpu.mem.peek(0x100), Some(&Word::Data(42)));

    let stats = ctx.stats();
    assert_eq!(stats.d_requests, 1);
    assert_eq!(stats.d_hits, 0);
}

// Store-then-load round trip through the data cache.
#[test]
fn store_load_round_trip() {
    for k in [1, -1, 32767, -32768, 12345] {
        let source = format!("li r1, {}\nli r2, 256\nsw r1, 0(r2)\nlw r3, 0(r2)\nhlt\n", k);
        let mut ctx = TestContext::assemble(&source);
        ctx.run();
        assert_eq!(ctx.reg(3), k, "round trip of {}", k);
    }
}

#[test]
fn register_zero_is_not_hardwired() {
    let mut ctx = TestContext::assemble("li r0, 5\nadd r1, r0, r0\nhlt\n");
    ctx.run();

    assert_eq!(ctx.reg(0), 5);
    assert_eq!(ctx.reg(1), 10);
}

// Spacing producers and consumers by the forwarding depth removes stalls.
#[test]
fn independent_fillers_absorb_mult_latency() {
    let mut ctx = TestContext::assemble(
        "li r1, 3\nli r2, 4\nmult r3, r1, r2\nli r8, 0\nli r9, 0\nadd r4, r3, r3\nhlt\n",
    );
    ctx.run();

    assert_eq!(ctx.reg(4), 24);
    // With two fillers in between the consumer decodes without stalling:
    // its ID exit trails the mult's by exactly the fetch distance.
    let mult = ctx.times_of("mult r3, r1, r2");
    let add = ctx.times_of("add r4, r3, r3");
    assert_eq!(add[1] - mult[1], 3);
}

#[test]
fn logic_ops_forward_from_ex1() {
    // and/or publish their result during EX1, so an adjacent consumer
    // never stalls.
    let mut ctx = TestContext::assemble(
        "li r1, 12\nli r2, 10\nand r3, r1, r2\nor r4, r3, r2\nhlt\n",
    );
    ctx.run();

    assert_eq!(ctx.reg(3), 8);
    assert_eq!(ctx.reg(4), 10);

    let and = ctx.times_of("and r3, r1, r2");
    let or = ctx.times_of("or r4, r3, r2");
    assert_eq!(or[1] - and[1], 1, "adjacent or must not stall");
}

#[test]
fn immediate_arithmetic() {
    let mut ctx = TestContext::assemble(
        "li r1, 100\naddi r2, r1, 5\nsubi r3, r2, 55\nandi r4, r3, 31\nori r5, r4, 64\nmulti r6, r5, 2\nhlt\n",
    );
    ctx.run();

    assert_eq!(ctx.reg(2), 105);
    assert_eq!(ctx.reg(3), 50);
    assert_eq!(ctx.reg(4), 18);
    assert_eq!(ctx.reg(5), 82);
    assert_eq!(ctx.reg(6), 164);
}

#[test]
fn unaligned_load_is_fatal() {
    let mut ctx = TestContext::assemble("li r1, 2\nlw r2, 1(r1)\nhlt\n");
    let err = ctx.run_result().expect_err("unaligned address must fail");
    assert!(err.to_string().contains("not word aligned"));
}

#[test]
fn missing_halt_is_diagnosed() {
    let mut ctx = TestContext::assemble("li r1, 1\n");
    let err = ctx.run_result().expect_err("running off the end must fail");
    assert!(err.is_missing_halt());
    // The statistics block is withheld on the diagnostic path.
    assert!(!ctx.output().contains("Total number of access requests"));
}

#[test]
fn clock_advances_once_per_tick() {
    let mut ctx = TestContext::assemble("hlt\n");
    let mut last = ctx.clock();
    loop {
        match ctx.sim.cpu.tick() {
            Ok(true) => {
                assert_eq!(ctx.clock(), last + 1);
                last = ctx.clock();
            }
            Ok(false) => break,
            Err(e) => panic!("tick failed: {}", e),
        }
    }
}
