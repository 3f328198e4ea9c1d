//! A small UTF-8 regular expression engine.
//!
//! Patterns are parsed with a shunting-yard pass into a postfix tree,
//! compiled to a compact bytecode and run on a Pike VM, which follows every
//! alternative in parallel and never backtracks. Greedy, lazy and
//! leftmost-alternative preferences are all expressed through thread
//! priority.
//!
//! # Example
//!
//! ```rust
//! use rex::{Span, Vm, compile};
//!
//! let program = compile(br"\w+").unwrap();
//! let mut vm = Vm::for_program(&program, 1);
//! let mut captures = [None];
//!
//! assert!(vm.exec(&program, b"hello, world", &mut captures).unwrap());
//! assert_eq!(captures[0], Some(Span::new(0, 5)));
//!
//! // Matching is anchored at the start of the input.
//! assert!(!vm.exec(&program, b", world", &mut captures).unwrap());
//! ```
//!
//! The [`Regex`] wrapper bundles the two steps:
//!
//! ```rust
//! use rex::{Regex, Span};
//!
//! let mut re = Regex::new("[☀-⛿]+").unwrap();
//! assert_eq!(re.find("☀☁!").unwrap(), Some(Span::new(0, 6)));
//! ```

pub mod compile;
mod error;
mod regex;
mod span;
pub mod syntax;
pub mod vm;

pub use compile::{CompileOptions, Compiler, compile, compiled_len};
pub use error::{Error, SyntaxKind};
pub use regex::Regex;
pub use span::Span;
pub use vm::{Instruction, Opcode, Program, Vm, assemble};
