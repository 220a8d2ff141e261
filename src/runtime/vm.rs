use std::io::{self, Write};

use log::{debug, trace};

use crate::bytecode::{Bytecode, Instruction, Opcode, decode_at};
use crate::runtime::fault::{ArithmeticKind, Fault, State};
use crate::runtime::memory::Memory;

#[derive(Debug, Clone)]
pub struct VmConfig {
    /// `None` lets jump loops run forever.
    pub max_steps: Option<usize>,
    pub max_stack_size: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            max_steps: None,
            max_stack_size: 10_000,
        }
    }
}

/// Stack machine executing one bytecode sequence, once.
///
/// `print` writes one line per value to `out`.
pub struct Vm<'a, W: Write> {
    code: &'a Bytecode,
    ip: usize,
    stack: Vec<i64>,
    memory: Memory,
    state: State,
    // Safety limits
    config: VmConfig,
    steps: usize,
    out: W,
}

impl<'a> Vm<'a, io::Stdout> {
    pub fn new(code: &'a Bytecode) -> Self {
        Self::with_config(code, VmConfig::default())
    }

    pub fn with_config(code: &'a Bytecode, config: VmConfig) -> Self {
        Self::with_output(code, config, io::stdout())
    }
}

impl<'a, W: Write> Vm<'a, W> {
    pub fn with_output(code: &'a Bytecode, config: VmConfig, out: W) -> Self {
        Self {
            code,
            ip: 0,
            stack: Vec::new(),
            memory: Memory::new(),
            state: State::Running,
            config,
            steps: 0,
            out,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn stack(&self) -> &[i64] {
        &self.stack
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Run until `halt` or the first fault.
    ///
    /// A fault moves the instance to `Faulted`; the stack and memory stay as
    /// they were just before the faulting instruction.
    pub fn run(&mut self) -> Result<(), Fault> {
        if self.state != State::Running {
            return Err(Fault::NotRunning(self.state));
        }

        while self.state == State::Running {
            if let Err(fault) = self.step() {
                self.state = State::Faulted;
                debug!("faulted after {} steps: {}", self.steps, fault);
                return Err(fault);
            }
        }

        debug!(
            "halted after {} steps, stack depth {}",
            self.steps,
            self.stack.len()
        );
        Ok(())
    }

    // Execution

    fn check_limits(&mut self) -> Result<(), Fault> {
        self.steps += 1;

        if let Some(max) = self.config.max_steps {
            if self.steps > max {
                return Err(Fault::StepLimitExceeded(max));
            }
        }

        Ok(())
    }

    /// Fetch, decode and execute one instruction.
    fn step(&mut self) -> Result<(), Fault> {
        self.check_limits()?;

        let at = self.ip;
        let instr = decode_at(self.code.cells(), &mut self.ip)?;
        trace!("{:04} {:?} stack={:?}", at, instr, self.stack);

        self.execute(at, instr)
    }

    fn execute(&mut self, at: usize, instr: Instruction) -> Result<(), Fault> {
        let opcode = instr.opcode();
        let (needed, _) = instr.effect();
        if self.stack.len() < needed {
            return Err(Fault::underflow(at, opcode, needed, self.stack.len()));
        }

        match instr {
            Instruction::Push(value) => self.push(value)?,

            // Stack operations
            Instruction::Pop => {
                self.pop(at, opcode)?;
            }
            Instruction::Dup => {
                let top = self.peek(at, opcode)?;
                self.push(top)?;
            }
            Instruction::Swap => {
                // height checked above
                let len = self.stack.len();
                self.stack.swap(len - 2, len - 1);
            }

            // Arithmetic
            Instruction::Add => self.binary_op(at, opcode, |a, b| {
                a.checked_add(b).ok_or(ArithmeticKind::Overflow)
            })?,
            Instruction::Sub => self.binary_op(at, opcode, |a, b| {
                a.checked_sub(b).ok_or(ArithmeticKind::Overflow)
            })?,
            Instruction::Mul => self.binary_op(at, opcode, |a, b| {
                a.checked_mul(b).ok_or(ArithmeticKind::Overflow)
            })?,
            Instruction::Div => self.binary_op(at, opcode, |a, b| {
                if b == 0 {
                    return Err(ArithmeticKind::DivisionByZero);
                }
                a.checked_div(b).ok_or(ArithmeticKind::Overflow)
            })?,

            // Variables
            Instruction::Store(name) => {
                let value = self.pop(at, opcode)?;
                self.memory.set(name, value);
            }
            Instruction::Load(name) => {
                let value = self
                    .memory
                    .get(&name)
                    .ok_or(Fault::UndefinedVariable { ip: at, name })?;
                self.push(value)?;
            }

            // Control flow
            Instruction::Jmp(target) => self.ip = target,
            Instruction::JmpIfZero(target) => {
                if self.pop(at, opcode)? == 0 {
                    self.ip = target;
                }
            }

            // I/O
            Instruction::Print => {
                // pop only once the line is written
                let value = self.peek(at, opcode)?;
                writeln!(self.out, "{}", value)?;
                self.pop(at, opcode)?;
            }
            Instruction::Halt => self.state = State::Halted,
        }

        Ok(())
    }

    /// Pops `top`, then `second`, and pushes `f(second, top)`.
    ///
    /// Operands are read before anything is popped, so a failing `f` leaves
    /// the stack untouched.
    fn binary_op(
        &mut self,
        at: usize,
        opcode: Opcode,
        f: impl FnOnce(i64, i64) -> Result<i64, ArithmeticKind>,
    ) -> Result<(), Fault> {
        let (second, top) = match self.stack.as_slice() {
            [.., second, top] => (*second, *top),
            _ => return Err(Fault::underflow(at, opcode, 2, self.stack.len())),
        };

        let result = f(second, top).map_err(|kind| Fault::Arithmetic {
            ip: at,
            opcode,
            kind,
        })?;

        self.stack.truncate(self.stack.len() - 2);
        self.push(result)
    }

    // Stack operations

    fn push(&mut self, value: i64) -> Result<(), Fault> {
        if self.stack.len() >= self.config.max_stack_size {
            return Err(Fault::StackOverflow(self.config.max_stack_size));
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self, at: usize, opcode: Opcode) -> Result<i64, Fault> {
        self.stack
            .pop()
            .ok_or(Fault::underflow(at, opcode, 1, 0))
    }

    fn peek(&self, at: usize, opcode: Opcode) -> Result<i64, Fault> {
        self.stack
            .last()
            .copied()
            .ok_or(Fault::underflow(at, opcode, 1, 0))
    }
}
