//! Errors reported by the compiler and the VM.

/// What was wrong with a pattern that failed to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxKind {
    /// No charset atom could be parsed at this offset.
    InvalidAtom,
    /// A `)` without a matching `(`, or a `(` never closed.
    UnbalancedParen,
    /// An operator is missing an operand, e.g. `*a`, `a|`, `()`.
    MissingOperand,
    /// The pattern contains no expression.
    EmptyPattern,
    /// The tree did not reduce to exactly one root. Indicates a builder bug.
    MalformedTree,
}

/// Errors returned by [`compile`](crate::compile) and [`Vm::exec`](crate::Vm::exec).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The pattern is malformed. `offset` is a byte offset into the pattern.
    Syntax { offset: usize, kind: SyntaxKind },
    /// A fixed-size buffer is too small. Retry with at least `needed` units.
    OutOfMemory { needed: usize, available: usize },
    /// The program contains an instruction the VM cannot execute at `pc`,
    /// or a branch at `pc` leaves the program.
    BadInstruction { pc: usize, word: u32 },
    /// A required argument was missing or empty.
    BadParam(&'static str),
}

impl Error {
    pub(crate) fn syntax(offset: usize, kind: SyntaxKind) -> Self {
        Self::Syntax { offset, kind }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax { .. })
    }

    pub fn is_out_of_memory(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. })
    }
}

impl std::fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAtom => write!(f, "invalid character, escape or set"),
            Self::UnbalancedParen => write!(f, "unbalanced parenthesis"),
            Self::MissingOperand => write!(f, "operator is missing an operand"),
            Self::EmptyPattern => write!(f, "empty pattern"),
            Self::MalformedTree => write!(f, "malformed expression tree"),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syntax { offset, kind } => write!(f, "Syntax error at offset {offset}: {kind}"),
            Self::OutOfMemory { needed, available } => {
                write!(f, "Out of memory: need {needed}, have {available}")
            }
            Self::BadInstruction { pc, word } => {
                write!(f, "Bad instruction {word:#010x} at pc {pc}")
            }
            Self::BadParam(what) => write!(f, "Bad parameter: {what}"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_syntax() {
        let err = Error::syntax(4, SyntaxKind::UnbalancedParen);
        assert_eq!(
            err.to_string(),
            "Syntax error at offset 4: unbalanced parenthesis"
        );
        assert!(err.is_syntax());
        assert!(!err.is_out_of_memory());
    }

    #[test]
    fn test_display_out_of_memory() {
        let err = Error::OutOfMemory {
            needed: 96,
            available: 64,
        };
        assert_eq!(err.to_string(), "Out of memory: need 96, have 64");
        assert!(err.is_out_of_memory());
    }

    #[test]
    fn test_display_bad_instruction() {
        let err = Error::BadInstruction {
            pc: 3,
            word: 0xFF00_0000,
        };
        assert_eq!(err.to_string(), "Bad instruction 0xff000000 at pc 3");
    }
}
