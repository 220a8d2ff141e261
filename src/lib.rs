//! # pebble
//!
//! A line-oriented compiler emitting flat, variable-width bytecode, and the
//! stack machine that runs it.
//!
//! ```text
//! source text --compile--> Bytecode --Vm::run--> printed values, final memory
//! ```
//!
//! The source language has two statement shapes, `x = 1 + 2` and `print x`.
//! The VM additionally understands stack shuffling, the four integer
//! operations and absolute jumps, reachable through the assembler
//! (`"push 1 print halt".parse::<Bytecode>()`).

pub mod bytecode;
pub mod runtime;

pub use bytecode::compile::{Compiler, compile};
pub use bytecode::compile_error::CompileError;
pub use bytecode::{Bytecode, Cell, Instruction, Opcode};
pub use runtime::{Fault, Memory, State, Vm, VmConfig};
