pub mod fault;
pub mod memory;
pub mod vm;

pub use fault::{ArithmeticKind, Fault, State};
pub use memory::Memory;
pub use vm::{Vm, VmConfig};
