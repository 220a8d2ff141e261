use std::str::FromStr;

use thiserror::Error;

use crate::bytecode::{Bytecode, Cell, Opcode};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AsmError {
    #[error("asm error: token {index}: unknown mnemonic '{token}'")]
    UnknownMnemonic { index: usize, token: String },

    #[error("asm error: token {index}: empty name")]
    EmptyName { index: usize },
}

/// Reads the flat rendering back into cells.
///
/// Accepts exactly what `Display` produces (`[push, 1, store, :x, halt]`) as
/// well as the bare form (`push 1 store :x halt`). Tokens are classified one
/// by one with no notion of instruction boundaries, so malformed sequences
/// such as `[3, halt]` are accepted here and fault later in the VM.
impl FromStr for Bytecode {
    type Err = AsmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.trim();
        let body = body.strip_prefix('[').unwrap_or(body);
        let body = body.strip_suffix(']').unwrap_or(body);

        let mut bc = Bytecode::new();
        let tokens = body
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty());

        for (index, token) in tokens.enumerate() {
            bc.emit(parse_cell(index, token)?);
        }

        Ok(bc)
    }
}

fn parse_cell(index: usize, token: &str) -> Result<Cell, AsmError> {
    if let Some(name) = token.strip_prefix(':') {
        if name.is_empty() {
            return Err(AsmError::EmptyName { index });
        }
        return Ok(Cell::Name(name.to_string()));
    }

    if let Ok(n) = token.parse::<i64>() {
        return Ok(Cell::Int(n));
    }

    Opcode::from_mnemonic(token)
        .map(Cell::Op)
        .ok_or_else(|| AsmError::UnknownMnemonic {
            index,
            token: token.to_string(),
        })
}
