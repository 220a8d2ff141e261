use thiserror::Error;

/// Errors produced while translating source lines.
///
/// `line` is the 1-based line number in the source text, counting blank
/// and comment lines. `text` is the offending line with surrounding
/// whitespace stripped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// A line matching neither statement shape
    #[error("compile error: line {line}: unknown statement: {text}")]
    UnknownStatement { line: usize, text: String },

    /// A recognised statement cut short
    #[error("compile error: line {line}: expected {expected}: {text}")]
    MissingToken {
        line: usize,
        text: String,
        expected: &'static str,
    },

    /// A literal that does not fit a 64-bit signed integer
    #[error("compile error: line {line}: invalid integer literal '{token}'")]
    InvalidInteger { line: usize, token: String },

    #[error("compile error: line {line}: unexpected tokens after statement: {text}")]
    TrailingTokens { line: usize, text: String },

    /// A variable name the bytecode rendering cannot carry
    #[error("compile error: line {line}: invalid variable name '{name}'")]
    InvalidName { line: usize, name: String },
}

impl CompileError {
    pub fn line(&self) -> usize {
        match self {
            CompileError::UnknownStatement { line, .. }
            | CompileError::MissingToken { line, .. }
            | CompileError::InvalidInteger { line, .. }
            | CompileError::TrailingTokens { line, .. }
            | CompileError::InvalidName { line, .. } => *line,
        }
    }
}
