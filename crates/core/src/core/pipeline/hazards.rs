//! Hazard predicates.
//!
//! Three orthogonal checks run during ID, each asking whether a producer
//! ahead in the pipeline will not have published its value by the time this
//! consumer needs it. On a hit the consumer stalls at ID; otherwise
//! forwarding covers the dependence.
//!
//! `older` is the window of slots behind the decoding instruction, ordered
//! `EX1, EX2, EX3, MEM`: the occupants that already ran their stages this
//! tick.

use crate::core::pipeline::ExecSlot;
use crate::isa::WriteClass;

fn scan(older: &[ExecSlot], depth: usize, class: WriteClass, regs: &[usize]) -> bool {
    older.iter().take(depth).any(|slot| {
        matches!(slot.inst.op.producer(), Some((c, dest)) if c == class && regs.contains(&dest))
    })
}

/// A `lw` destined for one of `regs` sits in EX1..EX3; its value exists
/// only after MEM. Branches extend the window through MEM because they
/// consume a cycle earlier than other readers.
pub fn load_use(older: &[ExecSlot], through_mem: bool, regs: &[usize]) -> bool {
    let depth = if through_mem { 4 } else { 3 };
    scan(older, depth, WriteClass::Load, regs)
}

/// A `mult`/`multi` destined for `reg` sits in EX1 or EX2. Multiplies
/// publish nothing before EX3, so the window is two deep for every
/// consumer.
pub fn mult_use(older: &[ExecSlot], reg: usize) -> bool {
    scan(older, 2, WriteClass::Mult, &[reg])
}

/// An `add`/`sub`/`addi`/`subi` destined for one of `regs` sits in EX1
/// (its EX2 publication lands in time for next tick's ID). Branches also
/// scan EX2.
pub fn add_sub_use(older: &[ExecSlot], two_deep: bool, regs: &[usize]) -> bool {
    let depth = if two_deep { 2 } else { 1 };
    scan(older, depth, WriteClass::AddSub, regs)
}
