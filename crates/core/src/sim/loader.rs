//! Program loading.
//!
//! Reads the instruction and data files and hands them to the assembler.

use std::fs;
use std::path::Path;

use crate::asm::{self, Program};
use crate::common::error::SimError;

/// Loads and assembles a program from its two input files.
pub fn load_program(inst_path: &Path, data_path: &Path) -> Result<Program, SimError> {
    let source = fs::read_to_string(inst_path)?;
    let data_text = fs::read_to_string(data_path)?;
    Ok(Program {
        instructions: asm::assemble(&source)?,
        data: asm::parse_data(&data_text)?,
    })
}
