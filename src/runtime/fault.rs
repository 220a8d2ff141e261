use thiserror::Error;

use crate::bytecode::{DecodeError, Opcode};

/// Execution state of a VM instance. `Halted` and `Faulted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Halted,
    Faulted,
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            State::Running => write!(f, "running"),
            State::Halted => write!(f, "halted"),
            State::Faulted => write!(f, "faulted"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticKind {
    DivisionByZero,
    Overflow,
}

impl std::fmt::Display for ArithmeticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArithmeticKind::DivisionByZero => write!(f, "division by zero"),
            ArithmeticKind::Overflow => write!(f, "integer overflow"),
        }
    }
}

/// A terminal VM error. Once returned, the instance is `Faulted`.
#[derive(Debug, Error)]
pub enum Fault {
    #[error("runtime error: stack underflow at ip={ip}: '{opcode}' needs {needed} items, stack has {found}")]
    StackUnderflow {
        ip: usize,
        opcode: Opcode,
        needed: usize,
        found: usize,
    },

    #[error("runtime error: {kind} in '{opcode}' at ip={ip}")]
    Arithmetic {
        ip: usize,
        opcode: Opcode,
        kind: ArithmeticKind,
    },

    /// Missing or unknown opcode, or a bad immediate operand.
    #[error("runtime error: {0}")]
    Decode(#[from] DecodeError),

    #[error("runtime error: undefined variable '{name}' at ip={ip}")]
    UndefinedVariable { ip: usize, name: String },

    #[error("runtime error: execution step limit exceeded ({0})")]
    StepLimitExceeded(usize),

    #[error("runtime error: stack size limit exceeded ({0})")]
    StackOverflow(usize),

    #[error("runtime error: cannot write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("runtime error: vm is {0}, not running")]
    NotRunning(State),
}

impl Fault {
    pub(crate) fn underflow(ip: usize, opcode: Opcode, needed: usize, found: usize) -> Self {
        Fault::StackUnderflow {
            ip,
            opcode,
            needed,
            found,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underflow_display() {
        let fault = Fault::underflow(4, Opcode::Add, 2, 1);
        let msg = fault.to_string();

        assert!(msg.contains("stack underflow"));
        assert!(msg.contains("ip=4"));
        assert!(msg.contains("'add'"));
    }

    #[test]
    fn test_arithmetic_display() {
        let fault = Fault::Arithmetic {
            ip: 6,
            opcode: Opcode::Div,
            kind: ArithmeticKind::DivisionByZero,
        };

        assert_eq!(
            fault.to_string(),
            "runtime error: division by zero in 'div' at ip=6"
        );
    }

    #[test]
    fn test_decode_errors_convert() {
        let fault: Fault = DecodeError::MissingOpcode { ip: 9 }.into();

        assert!(matches!(
            fault,
            Fault::Decode(DecodeError::MissingOpcode { ip: 9 })
        ));
        assert!(fault.to_string().contains("missing opcode"));
    }

    #[test]
    fn test_not_running_display() {
        let fault = Fault::NotRunning(State::Halted);
        assert!(fault.to_string().contains("halted"));
    }
}
