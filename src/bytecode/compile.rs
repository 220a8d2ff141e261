use log::debug;

use crate::bytecode::{Bytecode, Opcode, compile_error::CompileError};

/// Line-oriented compiler for the two statement shapes:
///
/// ```text
/// <name> = <int> + <int>
/// print <name>
/// ```
///
/// Lines are compiled independently; the only shared state is the output
/// sequence, which is terminated with a single `halt`.
pub struct Compiler {
    /// Output bytecode program
    program_bc: Bytecode,
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            program_bc: Bytecode::new(),
        }
    }

    /// Compile a whole source text. The first error aborts compilation and no
    /// bytecode is returned.
    pub fn compile_source(mut self, source: &str) -> Result<Bytecode, CompileError> {
        for (index, raw) in source.lines().enumerate() {
            let text = raw.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }

            let line_bc = self.compile_line(index + 1, text)?;
            debug!("line {}: {} -> {}", index + 1, text, line_bc);
            self.program_bc.extend(line_bc);
        }

        self.program_bc.emit(Opcode::Halt);
        Ok(self.program_bc)
    }

    /// Compile a single stripped, non-comment line.
    pub fn compile_line(&self, line: usize, text: &str) -> Result<Bytecode, CompileError> {
        let tokens: Vec<&str> = text.split_whitespace().collect();

        if tokens.get(1) == Some(&"=") && tokens.get(3) == Some(&"+") {
            self.compile_assignment(line, text, &tokens)
        } else if tokens.first() == Some(&"print") {
            self.compile_print(line, text, &tokens)
        } else {
            Err(CompileError::UnknownStatement {
                line,
                text: text.to_string(),
            })
        }
    }

    /// `x = a + b` => push a, push b, add, store x
    fn compile_assignment(
        &self,
        line: usize,
        text: &str,
        tokens: &[&str],
    ) -> Result<Bytecode, CompileError> {
        let right = tokens.get(4).ok_or_else(|| CompileError::MissingToken {
            line,
            text: text.to_string(),
            expected: "integer after '+'",
        })?;
        ensure_no_trailing(line, text, tokens, 5)?;

        let var = check_name(line, tokens[0])?;
        let left = parse_int(line, tokens[2])?;
        let right = parse_int(line, right)?;

        let mut bc = Bytecode::new();
        bc.emit(Opcode::Push);
        bc.emit(left);
        bc.emit(Opcode::Push);
        bc.emit(right);
        bc.emit(Opcode::Add);
        bc.emit(Opcode::Store);
        bc.emit_name(var);
        Ok(bc)
    }

    /// `print x` => load x, print
    fn compile_print(
        &self,
        line: usize,
        text: &str,
        tokens: &[&str],
    ) -> Result<Bytecode, CompileError> {
        let var = tokens.get(1).ok_or_else(|| CompileError::MissingToken {
            line,
            text: text.to_string(),
            expected: "variable name after 'print'",
        })?;
        ensure_no_trailing(line, text, tokens, 2)?;
        let var = check_name(line, var)?;

        let mut bc = Bytecode::new();
        bc.emit(Opcode::Load);
        bc.emit_name(var);
        bc.emit(Opcode::Print);
        Ok(bc)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Compile source text into a bytecode sequence.
pub fn compile(source: &str) -> Result<Bytecode, CompileError> {
    Compiler::new().compile_source(source)
}

fn parse_int(line: usize, token: &str) -> Result<i64, CompileError> {
    token.parse::<i64>().map_err(|_| CompileError::InvalidInteger {
        line,
        token: token.to_string(),
    })
}

/// Names are rendered as `:name` in a comma separated list, so they may not
/// contain list punctuation or start with the name marker.
fn check_name(line: usize, name: &str) -> Result<&str, CompileError> {
    if name.starts_with(':') || name.contains([',', '[', ']']) {
        return Err(CompileError::InvalidName {
            line,
            name: name.to_string(),
        });
    }
    Ok(name)
}

fn ensure_no_trailing(
    line: usize,
    text: &str,
    tokens: &[&str],
    expected_len: usize,
) -> Result<(), CompileError> {
    if tokens.len() > expected_len {
        return Err(CompileError::TrailingTokens {
            line,
            text: text.to_string(),
        });
    }
    Ok(())
}
