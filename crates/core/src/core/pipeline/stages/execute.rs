//! Execute (EX1/EX2/EX3) stages.
//!
//! EX1 re-applies forwarding from the EX table (the immediately preceding
//! producer may only just have published) and computes the result or
//! effective address. EX2 and EX3 publish into the forwarding tables on the
//! producer's schedule:
//!
//! * `and`/`or`/`andi`/`ori`/`li` publish from EX1 on, which is what makes
//!   a distance-one dependence on them forwardable without a stall;
//! * `add`/`sub`/`addi`/`subi` publish from EX2 on (distance one is covered
//!   by the add/sub stall);
//! * `mult`/`multi` publish from EX3 on.
//!
//! Bubbles clear the rows a producer at their position would have owned.

use crate::common::error::SimError;
use crate::core::pipeline::stages::StageCtx;
use crate::core::pipeline::{ExecSlot, StageEvent, T_EX};
use crate::isa::{AluKind, Op};

/// Runs the first execute sub-stage.
pub fn ex1_stage(slot: &mut ExecSlot, ctx: &mut StageCtx<'_>) -> Result<StageEvent, SimError> {
    match slot.inst.op {
        Op::Alu {
            kind,
            dest,
            lhs,
            rhs,
        } => {
            if let Some(v) = ctx.fwd.ex_lookup(lhs) {
                slot.op1 = v;
            }
            if let Some(v) = ctx.fwd.ex_lookup(rhs) {
                slot.op2 = v;
            }
            slot.result = kind.apply(slot.op1, slot.op2);
            if matches!(kind, AluKind::And | AluKind::Or) {
                ctx.fwd.set_id(0, dest, slot.result);
            }
        }

        Op::AluImm {
            kind,
            dest,
            src,
            imm,
        } => {
            if let Some(v) = ctx.fwd.ex_lookup(src) {
                slot.op1 = v;
            }
            slot.result = kind.apply(slot.op1, imm);
            if matches!(kind, AluKind::And | AluKind::Or) {
                ctx.fwd.set_id(0, dest, slot.result);
            }
        }

        Op::LoadImm { dest, imm } => {
            ctx.fwd.set_id(0, dest, imm);
        }

        Op::Load { dest, base, offset } | Op::Store {
            src: dest,
            base,
            offset,
        } => {
            if let Some(v) = ctx.fwd.ex_lookup(dest) {
                slot.op1 = v;
            }
            if let Some(v) = ctx.fwd.ex_lookup(base) {
                slot.op2 = v;
            }
            slot.result = slot.op2.wrapping_add(offset);
            if slot.result & 0b11 != 0 {
                return Err(SimError::UnalignedAccess {
                    address: slot.result,
                    name: slot.inst.text.clone().unwrap_or_default(),
                });
            }
        }

        Op::Nop => {
            ctx.fwd.clear_id(0);
        }

        Op::Branch { .. } | Op::Jump { .. } | Op::Halt | Op::Stop => {}
    }

    Ok(StageEvent::Continue)
}

/// Runs the second execute sub-stage.
pub fn ex2_stage(slot: &mut ExecSlot, ctx: &mut StageCtx<'_>) -> StageEvent {
    match slot.inst.op {
        Op::Alu { kind, dest, .. } | Op::AluImm { kind, dest, .. } => {
            // Multiplies have nothing to publish a cycle early.
            if !matches!(kind, AluKind::Mult) {
                ctx.fwd.set_id(1, dest, slot.result);
                ctx.fwd.set_ex(0, dest, slot.result);
            }
        }

        Op::LoadImm { dest, imm } => {
            ctx.fwd.set_id(1, dest, imm);
            ctx.fwd.set_ex(0, dest, imm);
        }

        Op::Nop => {
            ctx.fwd.clear_id(1);
            ctx.fwd.clear_ex(0);
        }

        _ => {}
    }

    StageEvent::Continue
}

/// Runs the third execute sub-stage.
pub fn ex3_stage(slot: &mut ExecSlot, ctx: &mut StageCtx<'_>) -> StageEvent {
    match slot.inst.op {
        Op::Alu { dest, .. } | Op::AluImm { dest, .. } => {
            ctx.fwd.set_id(2, dest, slot.result);
            ctx.fwd.set_ex(1, dest, slot.result);
            slot.stamp(T_EX, ctx.clock);
        }

        Op::LoadImm { dest, imm } => {
            ctx.fwd.set_id(2, dest, imm);
            ctx.fwd.set_ex(1, dest, imm);
            slot.stamp(T_EX, ctx.clock);
        }

        Op::Nop => {
            ctx.fwd.clear_id(2);
            ctx.fwd.clear_ex(1);
        }

        _ => {
            slot.stamp(T_EX, ctx.clock);
        }
    }

    StageEvent::Continue
}
