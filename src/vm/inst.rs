//! Bytecode instruction set.
//!
//! Instructions are 32-bit words. The top two bits select the class:
//!
//! | Bits 31..30 | Layout                          | Opcodes                 |
//! |-------------|---------------------------------|-------------------------|
//! | `00`        | 30-bit target                   | `J`                     |
//! | `01`        | 30-bit target                   | `B`                     |
//! | `1x`        | 8-bit opcode + 24-bit immediate | everything else         |
//!
//! Consuming instructions are "halt" tests: a thread dies when the test
//! hits, otherwise it falls through to `pc + 1`, or for the advancing (`A`)
//! variants moves on to the next input codepoint. Range tests compare against
//! the immediate as lower bound and the upper bound loaded by the preceding
//! `LR`.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use phf::{Map, phf_map};

/// Width mask of a 30-bit jump or split target.
const TARGET_MASK: u32 = 0x3FFF_FFFF;
/// Width mask of a 24-bit immediate.
const IMM_MASK: u32 = 0x00FF_FFFF;

/// Largest program whose every pc fits a 24-bit `BWP` target.
pub const MAX_PROGRAM_LEN: usize = IMM_MASK as usize + 1;

/// An operation code, valued as its high encoding byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// `J t`: continue at `t`.
    Jump = 0x00,
    /// `B t`: fork. The thread continues at `pc + 1`; a lower-priority
    /// thread starts at `t`.
    Split = 0x40,
    /// `HI c`: halt if the codepoint is `c`.
    HaltImm = 0x81,
    /// `HIA c`: halt if the codepoint is `c`, otherwise advance.
    HaltImmAdvance = 0x82,
    /// `HNI c`: halt unless the codepoint is `c`.
    HaltNotImm = 0x83,
    /// `HNIA c`: halt unless the codepoint is `c`, otherwise advance.
    HaltNotImmAdvance = 0x84,
    /// `HR lo`: halt if the codepoint is in `[lo, range_max]`.
    HaltRange = 0x85,
    /// `HRA lo`: halt if the codepoint is in `[lo, range_max]`, otherwise advance.
    HaltRangeAdvance = 0x86,
    /// `BWP t`: fork. The thread moves to `t`; a lower-priority thread
    /// continues at `pc + 1`.
    SplitPriority = 0xC0,
    /// `LR hi`: load `range_max` for the next range test.
    LoadRange = 0xC1,
    /// `SS n`: store the current input position in capture slot `n`.
    Save = 0xC2,
    /// `M`: the thread has matched.
    Match = 0xC3,
}

impl Opcode {
    /// Mnemonic used by the assembler and the disassembly listing.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::Jump => "J",
            Self::Split => "B",
            Self::HaltImm => "HI",
            Self::HaltImmAdvance => "HIA",
            Self::HaltNotImm => "HNI",
            Self::HaltNotImmAdvance => "HNIA",
            Self::HaltRange => "HR",
            Self::HaltRangeAdvance => "HRA",
            Self::SplitPriority => "BWP",
            Self::LoadRange => "LR",
            Self::Save => "SS",
            Self::Match => "M",
        }
    }

    /// True for `J`, `B`, `BWP` and `SS`, which the VM resolves without
    /// looking at input.
    pub fn is_control(&self) -> bool {
        matches!(self, Self::Jump | Self::Split | Self::SplitPriority | Self::Save)
    }

    /// True for the opcodes whose operand is a program counter.
    pub fn is_branch(&self) -> bool {
        matches!(self, Self::Jump | Self::Split | Self::SplitPriority)
    }

    fn operand_mask(&self) -> u32 {
        match self {
            Self::Jump | Self::Split => TARGET_MASK,
            _ => IMM_MASK,
        }
    }
}

const MNEMONICS: Map<&'static str, Opcode> = phf_map! {
    "J" => Opcode::Jump,
    "B" => Opcode::Split,
    "HI" => Opcode::HaltImm,
    "HIA" => Opcode::HaltImmAdvance,
    "HNI" => Opcode::HaltNotImm,
    "HNIA" => Opcode::HaltNotImmAdvance,
    "HR" => Opcode::HaltRange,
    "HRA" => Opcode::HaltRangeAdvance,
    "BWP" => Opcode::SplitPriority,
    "LR" => Opcode::LoadRange,
    "SS" => Opcode::Save,
    "M" => Opcode::Match,
};

/// One encoded instruction word.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction(u32);

impl Instruction {
    pub const MATCH: Self = Self((Opcode::Match as u32) << 24);

    /// Encode `op` with `operand`, truncated to the opcode's operand width.
    pub fn new(op: Opcode, operand: u32) -> Self {
        Self(((op as u32) << 24) | (operand & op.operand_mask()))
    }

    pub fn from_word(word: u32) -> Self {
        Self(word)
    }

    pub fn word(&self) -> u32 {
        self.0
    }

    /// Decode the opcode, or `None` for a word outside the instruction set.
    pub fn opcode(&self) -> Option<Opcode> {
        match self.0 >> 30 {
            0b00 => Some(Opcode::Jump),
            0b01 => Some(Opcode::Split),
            _ => match (self.0 >> 24) as u8 {
                0x81 => Some(Opcode::HaltImm),
                0x82 => Some(Opcode::HaltImmAdvance),
                0x83 => Some(Opcode::HaltNotImm),
                0x84 => Some(Opcode::HaltNotImmAdvance),
                0x85 => Some(Opcode::HaltRange),
                0x86 => Some(Opcode::HaltRangeAdvance),
                0xC0 => Some(Opcode::SplitPriority),
                0xC1 => Some(Opcode::LoadRange),
                0xC2 => Some(Opcode::Save),
                0xC3 => Some(Opcode::Match),
                _ => None,
            },
        }
    }

    /// The immediate or target field.
    pub fn operand(&self) -> u32 {
        match self.0 >> 30 {
            0b00 | 0b01 => self.0 & TARGET_MASK,
            _ => self.0 & IMM_MASK,
        }
    }
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self} ({:#010x})", self.0)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(op) = self.opcode() else {
            return write!(f, "?? {:#010x}", self.0);
        };
        let operand = self.operand();
        match op {
            Opcode::Match => write!(f, "M"),
            op if op.is_branch() || op == Opcode::Save => {
                write!(f, "{} {operand}", op.mnemonic())
            }
            op => match char::from_u32(operand) {
                Some(ch) if ch.is_ascii_graphic() && ch != '\'' => {
                    write!(f, "{} '{ch}'", op.mnemonic())
                }
                _ => write!(f, "{} {operand:#x}", op.mnemonic()),
            },
        }
    }
}

impl FromStr for Instruction {
    type Err = anyhow::Error;

    /// Parse `MNEMONIC [operand]`, where the operand is decimal, `0x` hex or
    /// a character, optionally in single quotes.
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        let name = parts.next().ok_or_else(|| anyhow!("empty instruction"))?;
        let op = MNEMONICS
            .get(name.to_ascii_uppercase().as_str())
            .copied()
            .ok_or_else(|| anyhow!("unknown mnemonic '{name}'"))?;
        let operand = match (op, parts.next()) {
            (Opcode::Match, None) => 0,
            (Opcode::Match, Some(extra)) => bail!("'M' takes no operand, got '{extra}'"),
            (_, None) => bail!("'{}' needs an operand", op.mnemonic()),
            (_, Some(text)) => parse_operand(text)
                .with_context(|| format!("bad operand for '{}'", op.mnemonic()))?,
        };
        if let Some(extra) = parts.next() {
            bail!("unexpected trailing text '{extra}'");
        }
        if operand & !op.operand_mask() != 0 {
            bail!("operand {operand:#x} does not fit '{}'", op.mnemonic());
        }
        Ok(Self::new(op, operand))
    }
}

fn parse_operand(text: &str) -> Result<u32> {
    let unquoted = text
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .unwrap_or(text);
    let mut chars = unquoted.chars();
    if let (Some(ch), None) = (chars.next(), chars.next())
        && !(unquoted == text && ch.is_ascii_digit())
    {
        return Ok(ch as u32);
    }
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return Ok(u32::from_str_radix(hex, 16)?);
    }
    Ok(text.parse::<u32>()?)
}

/// Assemble mnemonic text, one instruction per line. Blank lines and lines
/// starting with `#` are skipped.
pub fn assemble(text: &str) -> Result<Vec<Instruction>> {
    text.lines()
        .enumerate()
        .map(|(n, line)| (n, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(n, line)| {
            line.parse::<Instruction>()
                .with_context(|| format!("line {}: '{line}'", n + 1))
        })
        .collect()
}
