//! The assembler front-end.
//!
//! Turns a textual program and a data file into what the engine consumes:
//! 1. **Syntax check:** Every line must match its mnemonic's operand
//!    pattern.
//! 2. **Labels:** `name:` prefixes resolve to instruction indexes in a
//!    first pass; branches take indexes, `j` takes the pre-scaled byte
//!    address.
//! 3. **Construction:** Each line becomes an [`Instruction`] carrying its
//!    operation and the original text right-padded for output. I-type
//!    immediates must fit signed 16 bits.
//! 4. **Data:** One base-2 word per non-empty data-file line.

/// Line-level parsing primitives.
pub mod parse;

use std::collections::HashMap;

use crate::common::error::SimError;
use crate::config::defaults;
use crate::isa::{AluKind, BranchKind, Instruction, Op};

/// An assembled program: the instruction listing plus the data words
/// placed at the data base address.
#[derive(Debug, Clone, Default)]
pub struct Program {
    /// Instructions in program order.
    pub instructions: Vec<Instruction>,
    /// Data words in file order.
    pub data: Vec<i32>,
}

/// One source line after normalization.
struct SourceLine {
    /// One-based line number in the source file.
    number: usize,
    /// The line as typed, for output.
    original: String,
    /// Tokens of the trimmed, lowercased line.
    tokens: Vec<String>,
}

/// Right-pads the original text to the output column width.
fn pad_text(original: &str) -> String {
    let mut text = original.to_owned();
    while text.len() < defaults::TEXT_PAD {
        text.push(' ');
    }
    text
}

/// Checks the 16-bit signed immediate range.
fn check_imm(line: usize, value: i64) -> Result<i32, SimError> {
    if value > i64::from(i16::MAX) || value < i64::from(i16::MIN) {
        return Err(SimError::ImmediateOverflow { line, value });
    }
    Ok(value as i32)
}

fn bad_operands(line: &SourceLine, name: &str) -> SimError {
    let operands = line.tokens[line.tokens.len().min(1)..].join(" ");
    SimError::BadOperands {
        line: line.number,
        name: name.to_owned(),
        operands,
    }
}

/// Validates one line's syntax: known mnemonic, operands matching its
/// pattern.
fn verify_syntax(number: usize, lowered: &str) -> Result<(), SimError> {
    let no_label = parse::strip_label(lowered);
    let name = no_label.split(' ').next().unwrap_or(no_label);
    let pattern = parse::operand_pattern(name).ok_or_else(|| SimError::UnknownOpcode {
        line: number,
        name: name.to_owned(),
    })?;
    let operands = no_label[name.len()..].trim_start();
    if !pattern.is_match(operands) {
        return Err(SimError::BadOperands {
            line: number,
            name: name.to_owned(),
            operands: operands.to_owned(),
        });
    }
    Ok(())
}

fn reg_token(line: &SourceLine, name: &str, token: &str) -> Result<usize, SimError> {
    parse::parse_reg(token).ok_or_else(|| bad_operands(line, name))
}

/// Resolves a third operand: a defined label wins, then a numeric
/// literal.
fn resolve_target(
    line: &SourceLine,
    symbols: &HashMap<String, usize>,
    token: &str,
) -> Result<i64, SimError> {
    if let Some(&index) = symbols.get(token) {
        return Ok(index as i64);
    }
    parse::parse_imm(token).ok_or_else(|| SimError::UndefinedLabel {
        line: line.number,
        label: token.to_owned(),
    })
}

/// Assembles a source listing into instructions.
pub fn assemble(source: &str) -> Result<Vec<Instruction>, SimError> {
    let mut lines = Vec::new();
    for (idx, raw) in source.lines().enumerate() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        if raw.is_empty() {
            continue;
        }
        let number = idx + 1;
        let lowered = raw.trim().to_lowercase();
        verify_syntax(number, &lowered)?;
        lines.push(SourceLine {
            number,
            original: raw.to_owned(),
            tokens: parse::tokenize(&lowered),
        });
    }

    if lines.len() > defaults::PROGRAM_MAX_LINES {
        return Err(SimError::ProgramTooLarge { words: lines.len() });
    }

    // First pass: collect labels.
    let mut symbols: HashMap<String, usize> = HashMap::new();
    for (index, line) in lines.iter().enumerate() {
        let first = &line.tokens[0];
        if first.contains(':') {
            symbols.insert(first[..first.len() - 1].to_owned(), index);
        }
    }

    // Second pass: construct.
    let mut instructions = Vec::with_capacity(lines.len());
    for line in &lines {
        let start = usize::from(line.tokens[0].contains(':'));
        let name = line.tokens[start].as_str();
        let ops = &line.tokens[start + 1..];

        let op = match name {
            "add" | "sub" | "and" | "or" | "mult" => {
                let kind = alu_kind(name);
                Op::Alu {
                    kind,
                    dest: reg_token(line, name, &ops[0])?,
                    lhs: reg_token(line, name, &ops[1])?,
                    rhs: reg_token(line, name, &ops[2])?,
                }
            }

            "addi" | "subi" | "andi" | "ori" | "multi" => {
                let kind = alu_kind(&name[..name.len() - 1]);
                let value = resolve_target(line, &symbols, &ops[2])?;
                Op::AluImm {
                    kind,
                    dest: reg_token(line, name, &ops[0])?,
                    src: reg_token(line, name, &ops[1])?,
                    imm: check_imm(line.number, value)?,
                }
            }

            "li" => {
                let value = parse::parse_imm(&ops[1]).ok_or_else(|| bad_operands(line, name))?;
                Op::LoadImm {
                    dest: reg_token(line, name, &ops[0])?,
                    imm: check_imm(line.number, value)?,
                }
            }

            "lw" | "sw" => {
                let (off_text, reg_text) =
                    parse::split_mem_operand(&ops[1]).ok_or_else(|| bad_operands(line, name))?;
                let value = parse::parse_imm(off_text).ok_or_else(|| bad_operands(line, name))?;
                let offset = check_imm(line.number, value)?;
                let first = reg_token(line, name, &ops[0])?;
                let base = reg_token(line, name, reg_text)?;
                if name == "lw" {
                    Op::Load {
                        dest: first,
                        base,
                        offset,
                    }
                } else {
                    Op::Store {
                        src: first,
                        base,
                        offset,
                    }
                }
            }

            "beq" | "bne" => {
                let target = resolve_target(line, &symbols, &ops[2])?;
                let target = check_imm(line.number, target)? as usize;
                Op::Branch {
                    kind: if name == "beq" {
                        BranchKind::Eq
                    } else {
                        BranchKind::Ne
                    },
                    lhs: reg_token(line, name, &ops[0])?,
                    rhs: reg_token(line, name, &ops[1])?,
                    target,
                }
            }

            "j" => {
                let index = symbols
                    .get(ops[0].as_str())
                    .ok_or_else(|| SimError::UndefinedLabel {
                        line: line.number,
                        label: ops[0].clone(),
                    })?;
                Op::Jump {
                    target: (*index as i32) * 4,
                }
            }

            _ => Op::Halt,
        };

        instructions.push(Instruction::new(op, pad_text(&line.original)));
    }

    Ok(instructions)
}

fn alu_kind(name: &str) -> AluKind {
    match name {
        "add" => AluKind::Add,
        "sub" => AluKind::Sub,
        "and" => AluKind::And,
        "or" => AluKind::Or,
        _ => AluKind::Mult,
    }
}

/// Parses a data file: one base-2 word per non-empty line.
pub fn parse_data(text: &str) -> Result<Vec<i32>, SimError> {
    let mut words = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        if raw.is_empty() {
            continue;
        }
        let word = i32::from_str_radix(raw, 2).map_err(|_| SimError::BadDataWord {
            line: idx + 1,
            text: raw.to_owned(),
        })?;
        words.push(word);
    }
    Ok(words)
}
