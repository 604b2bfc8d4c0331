//! Memory (MEM) stage.
//!
//! Loads and stores refresh their operands one last time from the DA row
//! (the producer one slot ahead in MEM completion) and then go to the data
//! cache. A busy port stalls the stage; the access is retried, forwarding
//! included, every tick until it completes. Producers passing through MEM
//! publish their final forwarding rows here.

use crate::common::error::SimError;
use crate::core::pipeline::stages::StageCtx;
use crate::core::pipeline::{ExecSlot, StageEvent, IF_POS, MEM_POS, T_MEM};
use crate::isa::Op;
use crate::mem::{Access, BusyAt};

/// Maps a busy memory port to the bubble position it stalls.
pub fn busy_pos(at: BusyAt) -> usize {
    match at {
        BusyAt::Fetch => IF_POS,
        BusyAt::Mem => MEM_POS,
    }
}

/// Runs the memory stage.
pub fn mem_stage(slot: &mut ExecSlot, ctx: &mut StageCtx<'_>) -> Result<StageEvent, SimError> {
    match slot.inst.op {
        Op::Alu { dest, .. } | Op::AluImm { dest, .. } => {
            ctx.fwd.set_id(3, dest, slot.result);
            ctx.fwd.set_ex(2, dest, slot.result);
            ctx.fwd.set_da(0, dest, slot.result);
            slot.stamp(T_MEM, ctx.clock);
        }

        Op::LoadImm { dest, imm } => {
            ctx.fwd.set_da(0, dest, imm);
            ctx.fwd.set_id(3, dest, imm);
            ctx.fwd.set_ex(2, dest, imm);
            slot.stamp(T_MEM, ctx.clock);
        }

        Op::Load { dest, base, .. } => {
            if let Some(v) = ctx.fwd.da_lookup(dest) {
                slot.op1 = v;
            }
            if let Some(v) = ctx.fwd.da_lookup(base) {
                slot.op2 = v;
            }
            match ctx.mem.fetch_data(slot.result)? {
                Access::Ready(value) => {
                    slot.loaded = value;
                    ctx.fwd.set_id(3, dest, value);
                    ctx.fwd.set_ex(2, dest, value);
                    ctx.fwd.set_da(0, dest, value);
                    slot.stamp(T_MEM, ctx.clock);
                }
                Access::Busy(at) => {
                    if ctx.trace {
                        eprintln!("MEM stall: load @{:#x}", slot.result);
                    }
                    return Ok(StageEvent::Stall(busy_pos(at)));
                }
            }
        }

        Op::Store { src, base, .. } => {
            if let Some(v) = ctx.fwd.da_lookup(src) {
                slot.op1 = v;
            }
            if let Some(v) = ctx.fwd.da_lookup(base) {
                slot.op2 = v;
            }
            match ctx.mem.write_word(slot.op1, slot.result)? {
                Access::Ready(()) => {
                    slot.stamp(T_MEM, ctx.clock);
                }
                Access::Busy(at) => {
                    if ctx.trace {
                        eprintln!("MEM stall: store @{:#x}", slot.result);
                    }
                    return Ok(StageEvent::Stall(busy_pos(at)));
                }
            }
        }

        Op::Nop => {
            ctx.fwd.clear_id(3);
            ctx.fwd.clear_ex(2);
            ctx.fwd.clear_da(0);
        }

        Op::Branch { .. } | Op::Jump { .. } | Op::Halt | Op::Stop => {
            slot.stamp(T_MEM, ctx.clock);
        }
    }

    Ok(StageEvent::Continue)
}
