//! Writeback (WB) stage.
//!
//! Commits the slot's value to the architectural register file. By the time
//! a producer retires here, every forwarding row it owns has already agreed
//! with the committed value.

use crate::core::pipeline::stages::StageCtx;
use crate::core::pipeline::{ExecSlot, T_WB};
use crate::isa::Op;

/// Runs the writeback stage on the retiring slot.
pub fn wb_stage(slot: &mut ExecSlot, ctx: &mut StageCtx<'_>) {
    match slot.inst.op {
        Op::Alu { dest, .. } | Op::AluImm { dest, .. } => {
            ctx.regs.write(dest, slot.result);
            if ctx.trace {
                eprintln!("WB  r{} <= {}", dest, slot.result);
            }
            slot.stamp(T_WB, ctx.clock);
        }

        Op::LoadImm { dest, imm } => {
            ctx.regs.write(dest, imm);
            if ctx.trace {
                eprintln!("WB  r{} <= {}", dest, imm);
            }
            slot.stamp(T_WB, ctx.clock);
        }

        Op::Load { dest, .. } => {
            ctx.regs.write(dest, slot.loaded);
            if ctx.trace {
                eprintln!("WB  r{} <= {} (load)", dest, slot.loaded);
            }
            slot.stamp(T_WB, ctx.clock);
        }

        Op::Store { .. } | Op::Branch { .. } | Op::Jump { .. } | Op::Halt | Op::Stop => {
            slot.stamp(T_WB, ctx.clock);
        }

        Op::Nop => {}
    }
}
