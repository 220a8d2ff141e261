pub mod asm;
pub mod check;
pub mod compile;
pub mod compile_error;
pub mod disasm;
pub mod image;
pub mod ir;
pub mod op;

pub use ir::{Bytecode, Cell, DecodeError, decode_at};
pub use op::{Instruction, Opcode};
