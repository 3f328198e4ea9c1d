//! Bytecode generation from parsed patterns.

pub mod compiler;
pub mod ranges;

pub use compiler::{CompileOptions, Compiler, charset_ranges, compile, compiled_len};
pub use ranges::{inverted_ranges, ranges, simplify, simplify_inverted};
