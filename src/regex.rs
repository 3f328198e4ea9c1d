use crate::compile::{CompileOptions, Compiler};
use crate::error::Error;
use crate::span::Span;
use crate::vm::{Program, Vm};

/// A compiled pattern bundled with a VM sized to run it.
///
/// Matching needs `&mut self` since the VM's scratch block is reused across
/// calls. Clone the regex to match from several threads.
#[derive(Debug, Clone)]
pub struct Regex {
    program: Program,
    vm: Vm,
}

impl Regex {
    pub fn new(pattern: &str) -> Result<Self, Error> {
        Self::with_options(pattern, CompileOptions::default())
    }

    pub fn with_options(pattern: &str, options: CompileOptions) -> Result<Self, Error> {
        let program = Compiler::new(options).compile(pattern.as_bytes())?;
        Ok(Self::from_program(program))
    }

    /// Wrap an existing program, e.g. one loaded from words.
    pub fn from_program(program: Program) -> Self {
        let vm = Vm::for_program(&program, 1);
        Self { program, vm }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// True if a prefix of `input` matches.
    pub fn is_match(&mut self, input: impl AsRef<[u8]>) -> Result<bool, Error> {
        self.vm.exec(&self.program, input.as_ref(), &mut [])
    }

    /// The preferred match starting at offset 0 of `input`.
    pub fn find(&mut self, input: impl AsRef<[u8]>) -> Result<Option<Span>, Error> {
        let mut captures = [None];
        let matched = self.vm.exec(&self.program, input.as_ref(), &mut captures)?;
        Ok(if matched { captures[0] } else { None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyntaxKind;

    #[test]
    fn test_find() {
        let mut re = Regex::new(r"\d+(\.\d+)?").unwrap();
        assert_eq!(re.find("3.14 rad").unwrap(), Some(Span::new(0, 4)));
        assert_eq!(re.find("42.").unwrap(), Some(Span::new(0, 2)));
        assert_eq!(re.find("x1").unwrap(), None);
    }

    #[test]
    fn test_is_match() {
        let mut re = Regex::new("[A-Z][a-z]*").unwrap();
        assert!(re.is_match("Hello").unwrap());
        assert!(re.is_match(b"Q").unwrap());
        assert!(!re.is_match("hello").unwrap());
    }

    #[test]
    fn test_reused_across_calls() {
        let mut re = Regex::new("ab|a").unwrap();
        for _ in 0..3 {
            assert_eq!(re.find("abc").unwrap(), Some(Span::new(0, 2)));
            assert_eq!(re.find("ac").unwrap(), Some(Span::new(0, 1)));
        }
    }

    #[test]
    fn test_from_program() {
        let program = Program::from_words(&Regex::new("a").unwrap().program().as_words());
        let mut re = Regex::from_program(program);
        assert!(re.is_match("a").unwrap());
    }

    #[test]
    fn test_ascii_ceiling() {
        let mut re = Regex::with_options(".+", CompileOptions::default().ceiling(0x7F)).unwrap();
        assert_eq!(re.find("abé").unwrap(), Some(Span::new(0, 2)));
    }

    #[test]
    fn test_syntax_error() {
        assert_eq!(
            Regex::new("a)").unwrap_err(),
            Error::syntax(1, SyntaxKind::UnbalancedParen)
        );
    }
}
