use crate::bytecode::op::{Instruction, Opcode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One element of a flat bytecode sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    /// Opcode tag.
    Op(Opcode),

    /// Integer operand (a literal or an absolute address).
    Int(i64),

    /// Symbolic name operand (a variable).
    Name(String),
}

impl Cell {
    pub fn kind(&self) -> &'static str {
        match self {
            Cell::Op(_) => "opcode",
            Cell::Int(_) => "integer",
            Cell::Name(_) => "name",
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Op(op) => write!(f, "{}", op),
            Cell::Int(n) => write!(f, "{}", n),
            Cell::Name(name) => write!(f, ":{}", name),
        }
    }
}

impl From<Opcode> for Cell {
    fn from(op: Opcode) -> Self {
        Cell::Op(op)
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Int(n)
    }
}

/// A compiled program: the flat cell sequence handed from compiler to VM.
///
/// Instructions are variable-width. Nothing in the encoding marks where an
/// instruction ends; the consumer relies on [`Opcode::arity`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bytecode {
    cells: Vec<Cell>,
}

impl Bytecode {
    pub fn new() -> Self {
        Self { cells: Vec::new() }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn emit(&mut self, cell: impl Into<Cell>) {
        self.cells.push(cell.into());
    }

    pub fn emit_name(&mut self, name: impl Into<String>) {
        self.cells.push(Cell::Name(name.into()));
    }

    pub fn extend(&mut self, other: Bytecode) {
        self.cells.extend(other.cells);
    }
}

impl From<Vec<Cell>> for Bytecode {
    fn from(cells: Vec<Cell>) -> Self {
        Self { cells }
    }
}

impl std::fmt::Display for Bytecode {
    /// Renders as `[push, 1, push, 2, add, store, :x, halt]`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, cell) in self.cells.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", cell)?;
        }
        write!(f, "]")
    }
}

// =============================================================================
// Decoding
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("missing opcode at ip={ip}")]
    MissingOpcode { ip: usize },

    #[error("unknown opcode at ip={ip}: {cell}")]
    UnknownOpcode { ip: usize, cell: String },

    #[error("missing operand for '{opcode}' at ip={ip}")]
    MissingOperand { ip: usize, opcode: Opcode },

    #[error("invalid operand for '{opcode}' at ip={ip}: expected {expected}, got {found}")]
    InvalidOperand {
        ip: usize,
        opcode: Opcode,
        expected: &'static str,
        found: String,
    },
}

impl DecodeError {
    pub fn ip(&self) -> usize {
        match self {
            DecodeError::MissingOpcode { ip }
            | DecodeError::UnknownOpcode { ip, .. }
            | DecodeError::MissingOperand { ip, .. }
            | DecodeError::InvalidOperand { ip, .. } => *ip,
        }
    }
}

fn fetch<'a>(cells: &'a [Cell], ip: &mut usize) -> Option<&'a Cell> {
    let cell = cells.get(*ip)?;
    *ip += 1;
    Some(cell)
}

/// Decodes the instruction starting at `*ip`, advancing `*ip` by one for
/// every cell consumed.
///
/// On error `*ip` is left wherever the failing fetch stopped.
pub fn decode_at(cells: &[Cell], ip: &mut usize) -> Result<Instruction, DecodeError> {
    let start = *ip;

    let opcode = match fetch(cells, ip) {
        None => return Err(DecodeError::MissingOpcode { ip: start }),
        Some(Cell::Op(op)) => *op,
        Some(other) => {
            return Err(DecodeError::UnknownOpcode {
                ip: start,
                cell: other.to_string(),
            });
        }
    };

    let instruction = match opcode {
        Opcode::Push => Instruction::Push(fetch_int(cells, ip, start, opcode)?),
        Opcode::Pop => Instruction::Pop,
        Opcode::Dup => Instruction::Dup,
        Opcode::Swap => Instruction::Swap,
        Opcode::Add => Instruction::Add,
        Opcode::Sub => Instruction::Sub,
        Opcode::Mul => Instruction::Mul,
        Opcode::Div => Instruction::Div,
        Opcode::Store => Instruction::Store(fetch_name(cells, ip, start, opcode)?),
        Opcode::Load => Instruction::Load(fetch_name(cells, ip, start, opcode)?),
        Opcode::Jmp => Instruction::Jmp(fetch_addr(cells, ip, start, opcode)?),
        Opcode::JmpIfZero => Instruction::JmpIfZero(fetch_addr(cells, ip, start, opcode)?),
        Opcode::Print => Instruction::Print,
        Opcode::Halt => Instruction::Halt,
    };

    Ok(instruction)
}

fn fetch_operand<'a>(
    cells: &'a [Cell],
    ip: &mut usize,
    start: usize,
    opcode: Opcode,
) -> Result<&'a Cell, DecodeError> {
    fetch(cells, ip).ok_or(DecodeError::MissingOperand { ip: start, opcode })
}

fn fetch_int(
    cells: &[Cell],
    ip: &mut usize,
    start: usize,
    opcode: Opcode,
) -> Result<i64, DecodeError> {
    match fetch_operand(cells, ip, start, opcode)? {
        Cell::Int(n) => Ok(*n),
        other => Err(invalid_operand(start, opcode, "integer", other)),
    }
}

fn fetch_name(
    cells: &[Cell],
    ip: &mut usize,
    start: usize,
    opcode: Opcode,
) -> Result<String, DecodeError> {
    match fetch_operand(cells, ip, start, opcode)? {
        Cell::Name(name) => Ok(name.clone()),
        other => Err(invalid_operand(start, opcode, "name", other)),
    }
}

fn fetch_addr(
    cells: &[Cell],
    ip: &mut usize,
    start: usize,
    opcode: Opcode,
) -> Result<usize, DecodeError> {
    match fetch_operand(cells, ip, start, opcode)? {
        Cell::Int(n) => usize::try_from(*n)
            .map_err(|_| invalid_operand(start, opcode, "non-negative address", &Cell::Int(*n))),
        other => Err(invalid_operand(start, opcode, "address", other)),
    }
}

fn invalid_operand(ip: usize, opcode: Opcode, expected: &'static str, found: &Cell) -> DecodeError {
    DecodeError::InvalidOperand {
        ip,
        opcode,
        expected,
        found: format!("{} {}", found.kind(), found),
    }
}
