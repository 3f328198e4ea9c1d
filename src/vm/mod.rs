//! Bytecode and the Pike VM that runs it.
//!
//! A [`Program`] is a flat list of 32-bit [`Instruction`]s. [`Vm::exec`]
//! simulates every thread of the program in parallel over the input, so
//! matching never backtracks and takes time linear in the input length.

pub mod exec;
pub mod inst;
pub mod program;
mod threads;

pub use exec::Vm;
pub use inst::{Instruction, MAX_PROGRAM_LEN, Opcode, assemble};
pub use program::Program;
