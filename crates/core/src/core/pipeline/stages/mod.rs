//! Per-stage behaviors.
//!
//! Each stage is a free function dispatching on the slot's opcode kind:
//! 1. **Decode:** Operand snapshots, forwarding, hazard stalls, branch and
//!    jump resolution.
//! 2. **Execute:** The three EX sub-stages compute, then publish into the
//!    forwarding tables on the producer's schedule.
//! 3. **Memory:** Data-cache access and the last forwarding refresh.
//! 4. **Writeback:** Architectural register commit.
//!
//! Stages report back through [`StageEvent`](super::StageEvent); real
//! faults come back as errors.

/// Decode (ID) stage.
pub mod decode;
/// Execute (EX1/EX2/EX3) stages.
pub mod execute;
/// Memory (MEM) stage.
pub mod memory;
/// Writeback (WB) stage.
pub mod writeback;

use crate::common::reg::RegisterFile;
use crate::core::pipeline::forwarding::Forwarding;
use crate::mem::MemorySystem;

/// Mutable engine state handed to a stage invocation, split off from the
/// pipeline so a slot can be borrowed alongside it.
pub struct StageCtx<'a> {
    /// The register file.
    pub regs: &'a mut RegisterFile,
    /// The forwarding tables.
    pub fwd: &'a mut Forwarding,
    /// The memory subsystem.
    pub mem: &'a mut MemorySystem,
    /// The program counter.
    pub pc: &'a mut i32,
    /// The current clock tick.
    pub clock: u64,
    /// Emit per-stage diagnostics to stderr.
    pub trace: bool,
}
