//! Assembler tests.

use mipsim_core::asm;
use mipsim_core::common::error::SimError;
use mipsim_core::isa::{AluKind, BranchKind, Op};

fn ops(source: &str) -> Vec<Op> {
    asm::assemble(source)
        .expect("assembles")
        .into_iter()
        .map(|inst| inst.op)
        .collect()
}

#[test]
fn r_type_operand_order() {
    // add rd, rs, rt: first register is the destination.
    assert_eq!(
        ops("add r3, r1, r2\nhlt"),
        vec![
            Op::Alu {
                kind: AluKind::Add,
                dest: 3,
                lhs: 1,
                rhs: 2,
            },
            Op::Halt,
        ]
    );
}

#[test]
fn arith_i_type_operand_order() {
    // subi rt, rs, imm: first register is the destination.
    assert_eq!(
        ops("subi r5, r6, 10\nhlt")[0],
        Op::AluImm {
            kind: AluKind::Sub,
            dest: 5,
            src: 6,
            imm: 10,
        }
    );
}

#[test]
fn load_destination_is_first_register() {
    assert_eq!(
        ops("lw r1, 8(r2)\nhlt")[0],
        Op::Load {
            dest: 1,
            base: 2,
            offset: 8,
        }
    );
}

#[test]
fn store_operands() {
    assert_eq!(
        ops("sw r1, 4(r2)\nhlt")[0],
        Op::Store {
            src: 1,
            base: 2,
            offset: 4,
        }
    );
}

#[test]
fn hex_immediates() {
    assert_eq!(
        ops("li r1, 0ah\nhlt")[0],
        Op::LoadImm { dest: 1, imm: 10 }
    );
    assert_eq!(
        ops("li r1, -ffh\nhlt")[0],
        Op::LoadImm { dest: 1, imm: -255 }
    );
}

#[test]
fn branch_resolves_label_to_instruction_index() {
    let program = ops("li r1, 1\nloop: li r2, 2\nbne r1, r2, loop\nhlt");
    assert_eq!(
        program[2],
        Op::Branch {
            kind: BranchKind::Ne,
            lhs: 1,
            rhs: 2,
            target: 1,
        }
    );
}

#[test]
fn jump_target_is_prescaled() {
    let program = ops("li r1, 1\nend: hlt\nj end");
    assert_eq!(program[2], Op::Jump { target: 4 });
}

#[test]
fn immediate_boundaries() {
    assert!(asm::assemble("li r1, 32767\nhlt").is_ok());
    assert!(asm::assemble("li r1, -32768\nhlt").is_ok());
    assert!(matches!(
        asm::assemble("li r1, 32768\nhlt"),
        Err(SimError::ImmediateOverflow { value: 32768, .. })
    ));
    assert!(matches!(
        asm::assemble("li r1, -32769\nhlt"),
        Err(SimError::ImmediateOverflow { value: -32769, .. })
    ));
}

#[test]
fn unknown_opcode_rejected() {
    assert!(matches!(
        asm::assemble("xor r1, r2, r3\nhlt"),
        Err(SimError::UnknownOpcode { line: 1, .. })
    ));
}

#[test]
fn bad_operands_rejected() {
    // R-type with an immediate third operand.
    assert!(matches!(
        asm::assemble("add r1, r2, 3\nhlt"),
        Err(SimError::BadOperands { line: 1, .. })
    ));
    // Register out of range.
    assert!(asm::assemble("add r1, r2, r32\nhlt").is_err());
}

#[test]
fn undefined_label_rejected() {
    assert!(matches!(
        asm::assemble("j nowhere\nhlt"),
        Err(SimError::UndefinedLabel { .. })
    ));
    assert!(matches!(
        asm::assemble("beq r1, r2, nowhere\nhlt"),
        Err(SimError::UndefinedLabel { .. })
    ));
}

#[test]
fn program_size_limit() {
    let source: String = std::iter::repeat("li r1, 0\n").take(257).collect();
    assert!(matches!(
        asm::assemble(&source),
        Err(SimError::ProgramTooLarge { words: 257 })
    ));
}

#[test]
fn original_text_is_padded() {
    let program = asm::assemble("add r1, r2, r3\nhlt").expect("assembles");
    let text = program[0].text.as_deref().expect("has text");
    assert!(text.len() >= 35);
    assert!(text.starts_with("add r1, r2, r3"));
}

#[test]
fn data_words_are_base_two() {
    assert_eq!(
        asm::parse_data("101\n-101\n0\n").expect("parses"),
        vec![5, -5, 0]
    );
}

#[test]
fn bad_data_word_rejected() {
    assert!(matches!(
        asm::parse_data("102\n"),
        Err(SimError::BadDataWord { line: 1, .. })
    ));
}

#[test]
fn blank_lines_are_skipped() {
    assert_eq!(ops("li r1, 1\n\nhlt").len(), 2);
}
