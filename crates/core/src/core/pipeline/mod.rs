//! Pipeline slots and control events.
//!
//! The pipeline is an ordered sequence of exactly six in-flight slots,
//! newest first: `IF, EX1, EX2, EX3, MEM, WB`. (The ID stage's work happens
//! on the IF slot the tick after it entered.) Each slot pairs the immutable
//! instruction descriptor with its per-execution scratch, so two in-flight
//! copies of the same program location are independent.

/// Forwarding buffers.
pub mod forwarding;
/// Hazard predicates.
pub mod hazards;
/// Per-stage behaviors.
pub mod stages;

use crate::isa::{Instruction, Op};

/// Number of in-flight slots between ticks.
pub const PIPE_SLOTS: usize = 6;

/// Bubble insert position for a fetch stall.
pub const IF_POS: usize = 0;
/// Bubble insert position for a decode stall.
pub const ID_POS: usize = 1;
/// Bubble insert position for a memory stall (behind the MEM occupant).
pub const MEM_POS: usize = 5;

/// Stage-exit timestamp indexes.
pub const T_IF: usize = 0;
pub const T_ID: usize = 1;
pub const T_EX: usize = 2;
pub const T_MEM: usize = 3;
pub const T_WB: usize = 4;

/// What a stage invocation asks of the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    /// Keep going.
    Continue,
    /// Insert a bubble at the given position and rewind the PC.
    Stall(usize),
    /// A taken branch or jump: discard the speculative fetch. `shadow` is
    /// the source text of the instruction that would have come next.
    Flush { shadow: Option<String> },
}

/// One pipeline slot: an instruction plus its execution scratch.
#[derive(Debug, Clone)]
pub struct ExecSlot {
    /// The instruction occupying the slot.
    pub inst: Instruction,
    /// First operand snapshot (`reg[rs]` as refreshed by forwarding).
    pub op1: i32,
    /// Second operand snapshot.
    pub op2: i32,
    /// Computed result; the effective address for memory accesses.
    pub result: i32,
    /// Value returned by the data cache for `lw`.
    pub loaded: i32,
    /// Clock tick at which the slot exited each stage, indexed by
    /// `T_IF..=T_WB`.
    pub times: [u64; 5],
}

impl ExecSlot {
    /// Wraps a fetched instruction with empty scratch.
    pub fn new(inst: Instruction) -> Self {
        Self {
            inst,
            op1: 0,
            op2: 0,
            result: 0,
            loaded: 0,
            times: [0; 5],
        }
    }

    /// A plain bubble.
    pub fn bubble() -> Self {
        Self::new(Instruction::nop())
    }

    /// A bubble standing in for a flushed fetch.
    pub fn shadow_bubble(text: Option<String>) -> Self {
        Self::new(Instruction::shadow_nop(text))
    }

    /// True for bubbles.
    pub fn is_bubble(&self) -> bool {
        matches!(self.inst.op, Op::Nop)
    }

    /// Records the clock tick at which the slot left a stage. Bubbles keep
    /// no timestamps.
    pub fn stamp(&mut self, stage: usize, clock: u64) {
        if !self.is_bubble() {
            self.times[stage] = clock;
        }
    }
}
