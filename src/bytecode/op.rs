use serde::{Deserialize, Serialize};

// =============================================================================
// OPCODE - tags that may appear in opcode position
// =============================================================================

/// Opcode tag stored in a single bytecode cell.
///
/// Operands are not part of the tag: they follow it as separate cells, and
/// [`Opcode::arity`] says how many the interpreter must fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    // literals
    Push,

    // stack ops
    Pop,
    Dup,
    Swap,

    // arithmetic
    Add,
    Sub,
    Mul,
    Div,

    // variables
    Store,
    Load,

    // control flow
    Jmp,
    JmpIfZero,

    // I/O
    Print,
    Halt,
}

impl Opcode {
    pub const ALL: [Opcode; 14] = [
        Opcode::Push,
        Opcode::Pop,
        Opcode::Dup,
        Opcode::Swap,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Store,
        Opcode::Load,
        Opcode::Jmp,
        Opcode::JmpIfZero,
        Opcode::Print,
        Opcode::Halt,
    ];

    /// Lowercase mnemonic used by the flat rendering and the assembler.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Push => "push",
            Opcode::Pop => "pop",
            Opcode::Dup => "dup",
            Opcode::Swap => "swap",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Div => "div",
            Opcode::Store => "store",
            Opcode::Load => "load",
            Opcode::Jmp => "jmp",
            Opcode::JmpIfZero => "jmp_if_zero",
            Opcode::Print => "print",
            Opcode::Halt => "halt",
        }
    }

    pub fn from_mnemonic(word: &str) -> Option<Opcode> {
        Opcode::ALL.into_iter().find(|op| op.mnemonic() == word)
    }

    /// Number of immediate operand cells that follow the tag.
    pub fn arity(self) -> usize {
        match self {
            Opcode::Push | Opcode::Store | Opcode::Load | Opcode::Jmp | Opcode::JmpIfZero => 1,
            Opcode::Pop
            | Opcode::Dup
            | Opcode::Swap
            | Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Print
            | Opcode::Halt => 0,
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

// =============================================================================
// INSTRUCTION - an opcode with its decoded operands
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Push(i64),

    Pop,
    Dup,
    Swap,

    Add,
    Sub,
    Mul,
    Div,

    /// ( value -- ) writes into the variable store.
    Store(String),
    /// ( -- value ) reads from the variable store; the name is immediate.
    Load(String),

    /// Absolute jump: the target is a cell index, not an offset.
    Jmp(usize),
    /// ( value -- ) jumps to the absolute target only when value is 0.
    JmpIfZero(usize),

    Print,
    Halt,
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Push(_) => Opcode::Push,
            Instruction::Pop => Opcode::Pop,
            Instruction::Dup => Opcode::Dup,
            Instruction::Swap => Opcode::Swap,
            Instruction::Add => Opcode::Add,
            Instruction::Sub => Opcode::Sub,
            Instruction::Mul => Opcode::Mul,
            Instruction::Div => Opcode::Div,
            Instruction::Store(_) => Opcode::Store,
            Instruction::Load(_) => Opcode::Load,
            Instruction::Jmp(_) => Opcode::Jmp,
            Instruction::JmpIfZero(_) => Opcode::JmpIfZero,
            Instruction::Print => Opcode::Print,
            Instruction::Halt => Opcode::Halt,
        }
    }

    /// Returns (pops, pushes) for the instruction.
    pub fn effect(&self) -> (usize, usize) {
        match self {
            Instruction::Push(_) => (0, 1),
            Instruction::Pop => (1, 0),
            Instruction::Dup => (1, 2),
            Instruction::Swap => (2, 2),
            Instruction::Add | Instruction::Sub | Instruction::Mul | Instruction::Div => (2, 1),
            Instruction::Store(_) => (1, 0),
            Instruction::Load(_) => (0, 1),
            Instruction::Jmp(_) => (0, 0),
            Instruction::JmpIfZero(_) => (1, 0),
            Instruction::Print => (1, 0),
            Instruction::Halt => (0, 0),
        }
    }

    /// Jump target, if this instruction can transfer control.
    pub fn target(&self) -> Option<usize> {
        match self {
            Instruction::Jmp(addr) | Instruction::JmpIfZero(addr) => Some(*addr),
            _ => None,
        }
    }
}
