//! Instruction set model.
//!
//! This module defines the simulated ISA: the closed operation set, the
//! immutable instruction descriptor, and the hazard classification helpers
//! used by the pipeline.

/// Instruction descriptors and operation kinds.
pub mod instruction;

pub use self::instruction::{AluKind, BranchKind, Instruction, Op, WriteClass};
