//! Simulator error definitions.
//!
//! This module defines the error type shared across the simulator. It covers:
//! 1. **Assembly errors:** Syntax, unknown opcodes, unresolved labels, size limits.
//! 2. **Runtime faults:** Unaligned effective addresses, out-of-range accesses.
//! 3. **Missing-HLT diagnostics:** Fetching data or empty slots as instructions.
//! 4. **I/O failures:** Wrapping `std::io::Error` for file and sink problems.
//!
//! Pipeline `Stall` and `Flush` are control events, not errors; they travel in
//! [`StageEvent`](crate::core::pipeline::StageEvent) and never appear here.

use std::fmt;
use std::io;

/// All failure modes of the simulator.
#[derive(Debug)]
pub enum SimError {
    /// A source line did not match any supported instruction name.
    UnknownOpcode {
        /// One-based source line number.
        line: usize,
        /// The offending mnemonic.
        name: String,
    },

    /// A source line named a known instruction but its operands did not
    /// match the instruction's syntax.
    BadOperands {
        /// One-based source line number.
        line: usize,
        /// The instruction mnemonic.
        name: String,
        /// The operand text that failed to match.
        operands: String,
    },

    /// A branch or jump referenced a label that was never defined.
    UndefinedLabel {
        /// One-based source line number.
        line: usize,
        /// The unresolved label.
        label: String,
    },

    /// An immediate operand does not fit in signed 16 bits.
    ImmediateOverflow {
        /// One-based source line number.
        line: usize,
        /// The parsed value.
        value: i64,
    },

    /// A data-file line is not a valid word.
    BadDataWord {
        /// One-based data-file line number.
        line: usize,
        /// The offending text.
        text: String,
    },

    /// The program exceeds the source-line limit or overflows the
    /// instruction region of RAM.
    ProgramTooLarge {
        /// Number of instructions supplied.
        words: usize,
    },

    /// The data file holds more words than fit above the data base address.
    DataTooLarge {
        /// Number of data words supplied.
        words: usize,
    },

    /// A load or store computed an effective address whose low two bits
    /// are not zero.
    UnalignedAccess {
        /// The misaligned effective address.
        address: i32,
        /// Source text of the faulting instruction.
        name: String,
    },

    /// A memory access fell outside the RAM array.
    AddressOutOfRange {
        /// The faulting address.
        address: i32,
    },

    /// A fetch returned a data word where an instruction was expected.
    /// Recoverable diagnostic: the program probably lacks a `hlt`.
    NotAnInstruction {
        /// The fetched address.
        address: i32,
    },

    /// A fetch or load reached a slot that was never written.
    /// Recoverable diagnostic: the program probably lacks a `hlt`.
    EmptyWord {
        /// The accessed address.
        address: i32,
    },

    /// An I/O operation on an input file or the output sink failed.
    Io(io::Error),
}

impl SimError {
    /// True for the recoverable missing-HLT diagnostics, which the driver
    /// reports to the user and then terminates cleanly.
    pub fn is_missing_halt(&self) -> bool {
        matches!(
            self,
            SimError::NotAnInstruction { .. } | SimError::EmptyWord { .. }
        )
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::UnknownOpcode { line, name } => {
                write!(f, "line {}: {} instruction not supported.", line, name)
            }
            SimError::BadOperands {
                line,
                name,
                operands,
            } => write!(
                f,
                "line {}: {} operands are incorrect for {}",
                line, operands, name
            ),
            SimError::UndefinedLabel { line, label } => {
                write!(f, "line {}: label {} was not found.", line, label)
            }
            SimError::ImmediateOverflow { line, value } => write!(
                f,
                "line {}: immediate value {} cannot fit into 16 bits.",
                line, value
            ),
            SimError::BadDataWord { line, text } => {
                write!(f, "data line {}: {} is not a valid word.", line, text)
            }
            SimError::ProgramTooLarge { words } => {
                write!(f, "program size must be 256 words or less (got {}).", words)
            }
            SimError::DataTooLarge { words } => {
                write!(f, "data does not fit in memory ({} words).", words)
            }
            SimError::UnalignedAccess { address, name } => write!(
                f,
                "Effective address {} not word aligned in {}",
                address,
                name.trim()
            ),
            SimError::AddressOutOfRange { address } => {
                write!(f, "address {} is outside memory.", address)
            }
            SimError::NotAnInstruction { address } => write!(
                f,
                "Word at address {} is not an instruction. Forget to add HLT?",
                address
            ),
            SimError::EmptyWord { address } => write!(
                f,
                "Empty word encountered at address {}. Forget to add HLT?",
                address
            ),
            SimError::Io(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SimError {
    fn from(e: io::Error) -> Self {
        SimError::Io(e)
    }
}
