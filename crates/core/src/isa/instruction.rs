//! Instruction descriptors.
//!
//! An [`Instruction`] is an immutable record produced by the assembler: the
//! operation with its resolved operands plus the padded source text used for
//! output. Per-execution scratch (operand snapshots, results, stage-exit
//! timestamps) lives in the pipeline slot, so two in-flight copies of the
//! same program location never share state.

/// Arithmetic/logic operation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluKind {
    Add,
    Sub,
    And,
    Or,
    Mult,
}

impl AluKind {
    /// Applies the operation with wrapping 32-bit semantics.
    pub fn apply(self, a: i32, b: i32) -> i32 {
        match self {
            AluKind::Add => a.wrapping_add(b),
            AluKind::Sub => a.wrapping_sub(b),
            AluKind::And => a & b,
            AluKind::Or => a | b,
            AluKind::Mult => a.wrapping_mul(b),
        }
    }
}

/// Branch comparison selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    /// `beq`: taken when the operands are equal.
    Eq,
    /// `bne`: taken when the operands differ.
    Ne,
}

impl BranchKind {
    /// Evaluates the comparison.
    pub fn taken(self, a: i32, b: i32) -> bool {
        match self {
            BranchKind::Eq => a == b,
            BranchKind::Ne => a != b,
        }
    }
}

/// The closed set of operations, with operands resolved to register indexes,
/// immediates, or instruction-index targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// R-type arithmetic/logic: `kind rd, rs, rt` writing `dest`.
    Alu {
        kind: AluKind,
        dest: usize,
        lhs: usize,
        rhs: usize,
    },
    /// I-type arithmetic/logic: `kind rt, rs, imm` writing `dest`.
    AluImm {
        kind: AluKind,
        dest: usize,
        src: usize,
        imm: i32,
    },
    /// `li rt, imm`.
    LoadImm { dest: usize, imm: i32 },
    /// `lw rd, offset(base)`. The first register is the destination.
    Load {
        dest: usize,
        base: usize,
        offset: i32,
    },
    /// `sw src, offset(base)`.
    Store {
        src: usize,
        base: usize,
        offset: i32,
    },
    /// `beq`/`bne lhs, rhs, target` where `target` is an instruction index.
    Branch {
        kind: BranchKind,
        lhs: usize,
        rhs: usize,
        target: usize,
    },
    /// `j target` where `target` is a pre-scaled byte address (`index * 4`).
    Jump { target: i32 },
    /// `hlt`: stops fetch once it enters the pipeline.
    Halt,
    /// Pipeline bubble; clears forwarding rows as it advances.
    Nop,
    /// Synthetic terminator enqueued once fetch has stopped.
    Stop,
}

/// Hazard classification of an instruction's register write, keyed by when
/// its result becomes forwardable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteClass {
    /// `lw`: value available only after MEM.
    Load,
    /// `mult`/`multi`: value published starting at EX3.
    Mult,
    /// `add`/`sub`/`addi`/`subi`: value published starting at EX2.
    AddSub,
    /// `and`/`or`/`andi`/`ori`/`li`: value published starting at EX1,
    /// never hazard-checked.
    Other,
}

impl Op {
    /// The destination register and hazard class, for operations that write
    /// one. Hazard predicates match on the returned class instead of
    /// inspecting concrete variants.
    pub fn producer(&self) -> Option<(WriteClass, usize)> {
        match *self {
            Op::Alu { kind, dest, .. } | Op::AluImm { kind, dest, .. } => {
                let class = match kind {
                    AluKind::Add | AluKind::Sub => WriteClass::AddSub,
                    AluKind::Mult => WriteClass::Mult,
                    AluKind::And | AluKind::Or => WriteClass::Other,
                };
                Some((class, dest))
            }
            Op::LoadImm { dest, .. } => Some((WriteClass::Other, dest)),
            Op::Load { dest, .. } => Some((WriteClass::Load, dest)),
            _ => None,
        }
    }

    /// The raw integer a memory word carrying this operation yields when it
    /// is read as data. Only `j` carries a nonzero payload, its pre-scaled
    /// target.
    pub fn raw_value(&self) -> i32 {
        match *self {
            Op::Jump { target } => target,
            _ => 0,
        }
    }
}

/// An assembled instruction: the operation plus the padded original source
/// line. Bubbles have no text unless they shadow a flushed fetch; the
/// synthetic terminator carries an empty string.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// The operation and its operands.
    pub op: Op,
    /// Original source line, right-padded for output; `None` for bubbles.
    pub text: Option<String>,
}

impl Instruction {
    /// Builds an instruction from an operation and its padded source text.
    pub fn new(op: Op, text: String) -> Self {
        Self {
            op,
            text: Some(text),
        }
    }

    /// A plain pipeline bubble.
    pub fn nop() -> Self {
        Self {
            op: Op::Nop,
            text: None,
        }
    }

    /// A bubble standing in for a flushed fetch, remembering what would
    /// have been fetched.
    pub fn shadow_nop(text: Option<String>) -> Self {
        Self { op: Op::Nop, text }
    }

    /// The synthetic terminator.
    pub fn stop() -> Self {
        Self {
            op: Op::Stop,
            text: Some(String::new()),
        }
    }
}
