use thiserror::Error;

use crate::bytecode::{Bytecode, DecodeError, Instruction, Opcode, decode_at};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    #[error("stack-check error: stack underflow at ip={ip}, op={opcode}, needed {needed} items, had {height}")]
    Underflow {
        ip: usize,
        opcode: Opcode,
        needed: usize,
        height: usize,
    },

    #[error("stack-check error: {0}")]
    Malformed(#[from] DecodeError),
}

/// Check stack effects with a given initial stack height.
///
/// NOTE: This is a linear scan along the fall-through path. It continues
/// past `jmp_if_zero` (the not-taken branch has a known height) and stops at
/// `jmp` or `halt`. Branch targets are not followed; full verification would
/// need a control flow graph with heights merged at join points.
pub fn check_with_initial(bc: &Bytecode, initial_height: usize) -> Result<(), CheckError> {
    let cells = bc.cells();
    let mut height = initial_height;
    let mut ip = 0;

    while ip < cells.len() {
        let start = ip;
        let instr = decode_at(cells, &mut ip)?;
        let (pops, pushes) = instr.effect();

        if height < pops {
            return Err(CheckError::Underflow {
                ip: start,
                opcode: instr.opcode(),
                needed: pops,
                height,
            });
        }
        height = height - pops + pushes;

        if matches!(instr, Instruction::Jmp(_) | Instruction::Halt) {
            return Ok(());
        }
    }

    // Fell off the end without halting.
    Err(CheckError::Malformed(DecodeError::MissingOpcode { ip }))
}

/// Check stack effects starting from empty stack.
pub fn check(bc: &Bytecode) -> Result<(), CheckError> {
    check_with_initial(bc, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bc(text: &str) -> Bytecode {
        text.parse().unwrap()
    }

    #[test]
    fn test_simple_ops() {
        assert!(check(&bc("push 1 push 2 add print halt")).is_ok());
    }

    #[test]
    fn test_compiled_programs_pass() {
        let program = crate::bytecode::compile::compile("a = 1 + 2\nprint a\nprint a").unwrap();
        assert!(check(&program).is_ok());
    }

    #[test]
    fn test_underflow() {
        let err = check(&bc("push 1 add halt")).unwrap_err();

        assert_eq!(
            err,
            CheckError::Underflow {
                ip: 2,
                opcode: Opcode::Add,
                needed: 2,
                height: 1
            }
        );
        assert!(err.to_string().contains("underflow"));
    }

    #[test]
    fn test_initial_height() {
        assert!(check(&bc("swap halt")).is_err());
        assert!(check_with_initial(&bc("swap halt"), 2).is_ok());
    }

    #[test]
    fn test_jump_stops_analysis() {
        // Code after an unconditional jump is only reachable by address.
        assert!(check(&bc("jmp 3 add halt")).is_ok());
    }

    #[test]
    fn test_fall_through_after_conditional_jump() {
        // 0: push 0 | 2: jmp_if_zero 6 | 4: add | 5: halt
        let err = check(&bc("push 0 jmp_if_zero 6 add halt")).unwrap_err();
        assert_eq!(
            err,
            CheckError::Underflow {
                ip: 4,
                opcode: Opcode::Add,
                needed: 2,
                height: 0
            }
        );

        assert!(check(&bc("push 1 push 2 push 0 jmp_if_zero 9 add print halt")).is_ok());
    }

    #[test]
    fn test_conditional_jump_without_halt() {
        let err = check(&bc("push 0 jmp_if_zero 0")).unwrap_err();
        assert_eq!(
            err,
            CheckError::Malformed(DecodeError::MissingOpcode { ip: 4 })
        );
    }

    #[test]
    fn test_jump_if_zero_pops_one() {
        assert!(check(&bc("jmp_if_zero 2")).is_err());
    }

    #[test]
    fn test_missing_halt() {
        let err = check(&bc("push 1 print")).unwrap_err();
        assert_eq!(
            err,
            CheckError::Malformed(DecodeError::MissingOpcode { ip: 3 })
        );
    }

    #[test]
    fn test_malformed_encoding() {
        let err = check(&bc("push :x halt")).unwrap_err();
        assert!(matches!(
            err,
            CheckError::Malformed(DecodeError::InvalidOperand { .. })
        ));
    }
}
