//! Decode (ID) stage.
//!
//! Readers snapshot their operands from the register file, refresh them
//! from the ID forwarding table, and stall when a hazard predicate says the
//! producer cannot have published in time. Branches compare and redirect
//! here, one cycle before R-type reads become available, which is why their
//! hazard windows run one slot deeper.
//!
//! The ordering of snapshot / forward / hazard-check differs per family:
//! R-type and arithmetic I-type forward before checking hazards, memory
//! accesses and branches check hazards first.

use crate::core::pipeline::stages::StageCtx;
use crate::core::pipeline::{hazards, ExecSlot, StageEvent, ID_POS, T_ID};
use crate::isa::Op;

/// Captures the source text of the instruction the flush is about to
/// discard: the slot at the current (pre-redirect) PC.
fn shadow_at(ctx: &StageCtx<'_>) -> Option<String> {
    ctx.mem.peek_text(*ctx.pc)
}

/// Runs the decode stage on `slot`. `older` holds the EX1..MEM occupants,
/// which already ran their stages this tick.
pub fn id_stage(slot: &mut ExecSlot, older: &[ExecSlot], ctx: &mut StageCtx<'_>) -> StageEvent {
    match slot.inst.op {
        Op::Alu { lhs, rhs, .. } => {
            slot.op1 = ctx.regs.read(lhs);
            slot.op2 = ctx.regs.read(rhs);
            if let Some(v) = ctx.fwd.id_lookup(lhs) {
                slot.op1 = v;
            }
            if let Some(v) = ctx.fwd.id_lookup(rhs) {
                slot.op2 = v;
            }
            if hazards::load_use(older, false, &[lhs, rhs])
                || hazards::mult_use(older, lhs)
                || hazards::mult_use(older, rhs)
                || hazards::add_sub_use(older, false, &[lhs, rhs])
            {
                if ctx.trace {
                    eprintln!("ID  stall: hazard on r{}/r{}", lhs, rhs);
                }
                return StageEvent::Stall(ID_POS);
            }
            slot.stamp(T_ID, ctx.clock);
        }

        Op::AluImm { src, .. } => {
            slot.op1 = ctx.regs.read(src);
            if let Some(v) = ctx.fwd.id_lookup(src) {
                slot.op1 = v;
            }
            if hazards::load_use(older, false, &[src])
                || hazards::mult_use(older, src)
                || hazards::add_sub_use(older, false, &[src])
            {
                if ctx.trace {
                    eprintln!("ID  stall: hazard on r{}", src);
                }
                return StageEvent::Stall(ID_POS);
            }
            slot.stamp(T_ID, ctx.clock);
        }

        Op::Load { dest, base, .. } | Op::Store { src: dest, base, .. } => {
            slot.op1 = ctx.regs.read(dest);
            slot.op2 = ctx.regs.read(base);
            if hazards::load_use(older, false, &[base])
                || hazards::mult_use(older, base)
                || hazards::add_sub_use(older, false, &[base])
            {
                if ctx.trace {
                    eprintln!("ID  stall: hazard on base r{}", base);
                }
                return StageEvent::Stall(ID_POS);
            }
            if let Some(v) = ctx.fwd.id_lookup(dest) {
                slot.op1 = v;
            }
            if let Some(v) = ctx.fwd.id_lookup(base) {
                slot.op2 = v;
            }
            slot.stamp(T_ID, ctx.clock);
        }

        Op::Branch {
            kind,
            lhs,
            rhs,
            target,
        } => {
            slot.op1 = ctx.regs.read(lhs);
            slot.op2 = ctx.regs.read(rhs);
            if hazards::load_use(older, true, &[lhs, rhs])
                || hazards::mult_use(older, lhs)
                || hazards::mult_use(older, rhs)
                || hazards::add_sub_use(older, true, &[lhs, rhs])
            {
                if ctx.trace {
                    eprintln!("ID  stall: branch hazard on r{}/r{}", lhs, rhs);
                }
                return StageEvent::Stall(ID_POS);
            }
            if let Some(v) = ctx.fwd.id_lookup(lhs) {
                slot.op1 = v;
            }
            if let Some(v) = ctx.fwd.id_lookup(rhs) {
                slot.op2 = v;
            }
            slot.stamp(T_ID, ctx.clock);

            if kind.taken(slot.op1, slot.op2) {
                let shadow = shadow_at(ctx);
                // -4 compensates the increment at the start of the next tick.
                *ctx.pc = (target as i32) * 4 - 4;
                if ctx.trace {
                    eprintln!("ID  branch taken -> index {}", target);
                }
                return StageEvent::Flush { shadow };
            }
        }

        Op::Jump { target } => {
            let shadow = shadow_at(ctx);
            *ctx.pc = target - 4;
            slot.stamp(T_ID, ctx.clock);
            if ctx.trace {
                eprintln!("ID  jump -> {:#x}", target);
            }
            return StageEvent::Flush { shadow };
        }

        Op::LoadImm { .. } | Op::Halt | Op::Stop => {
            slot.stamp(T_ID, ctx.clock);
        }

        Op::Nop => {}
    }

    StageEvent::Continue
}
