//! Line-level parsing primitives.
//!
//! Each supported mnemonic maps to an anchored operand pattern; a line is
//! valid only if, after stripping the optional label prefix and the
//! mnemonic, the remainder matches its pattern exactly. Immediates are
//! decimal or trailing-`h` hexadecimal.

use once_cell::sync::Lazy;
use regex::Regex;

/// Signed immediate: decimal or `h`-suffixed hex.
const IMM: &str = r"-?(?:\d{1,5}|[0-9a-f]+h)";
/// Unsigned immediate, for memory-operand offsets.
const POS_IMM: &str = r"(?:\d{1,5}|[0-9a-f]+h)";
/// A register, `r0` through `r31`.
const REG: &str = r"r(?:[12]?[0-9]|3[01])";
/// Operand delimiter.
const DELIM: &str = r",\s*";
/// A label symbol.
const LABEL: &str = r"\w+";

fn anchored(body: String) -> Regex {
    Regex::new(&format!("^{}$", body)).expect("operand pattern is valid")
}

static R_PAT: Lazy<Regex> = Lazy::new(|| anchored(format!("{REG}{DELIM}{REG}{DELIM}{REG}")));
static I_PAT: Lazy<Regex> = Lazy::new(|| anchored(format!("{REG}{DELIM}{REG}{DELIM}{IMM}")));
static MEM_PAT: Lazy<Regex> =
    Lazy::new(|| anchored(format!(r"{REG}{DELIM}{POS_IMM}\({REG}\)")));
static BRANCH_PAT: Lazy<Regex> =
    Lazy::new(|| anchored(format!("{REG}{DELIM}{REG}{DELIM}{LABEL}")));
static LI_PAT: Lazy<Regex> = Lazy::new(|| anchored(format!("{REG}{DELIM}{IMM}")));
static LABEL_PAT: Lazy<Regex> = Lazy::new(|| anchored(LABEL.to_string()));
static NOTHING: Lazy<Regex> = Lazy::new(|| anchored(String::new()));

static LABEL_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+:\s+").expect("label prefix"));
static TOKEN_DELIM: Lazy<Regex> = Lazy::new(|| Regex::new(r",?\s+").expect("token delimiter"));

/// The operand pattern for `name`, or `None` for unsupported mnemonics.
pub fn operand_pattern(name: &str) -> Option<&'static Regex> {
    match name {
        "add" | "sub" | "and" | "or" | "mult" => Some(&R_PAT),
        "addi" | "subi" | "andi" | "ori" | "multi" => Some(&I_PAT),
        "lw" | "sw" => Some(&MEM_PAT),
        "beq" | "bne" => Some(&BRANCH_PAT),
        "li" => Some(&LI_PAT),
        "j" => Some(&LABEL_PAT),
        "hlt" => Some(&NOTHING),
        _ => None,
    }
}

/// Strips the optional `name:` label prefix.
pub fn strip_label(line: &str) -> &str {
    match LABEL_PREFIX.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}

/// Splits a normalized line into tokens on commas and whitespace.
pub fn tokenize(line: &str) -> Vec<String> {
    TOKEN_DELIM.split(line).map(str::to_owned).collect()
}

/// Parses a register token (`rN`) into its index.
pub fn parse_reg(token: &str) -> Option<usize> {
    token.strip_prefix('r')?.parse().ok()
}

/// Parses an immediate token: trailing `h` means hexadecimal, otherwise
/// decimal. The sign, if any, precedes the digits either way.
pub fn parse_imm(token: &str) -> Option<i64> {
    if let Some(hex) = token.strip_suffix('h') {
        i64::from_str_radix(hex, 16).ok()
    } else {
        token.parse().ok()
    }
}

/// Splits a memory operand `offset(reg)` into its offset and register
/// tokens.
pub fn split_mem_operand(token: &str) -> Option<(&str, &str)> {
    let open = token.find('(')?;
    let close = token.find(')')?;
    Some((&token[..open], &token[open + 1..close]))
}
