mod exec;

use crate::constants;
use crate::instr::{register_index, Reg};
use crate::io::IoHandler;
use crate::ram::Ram;
use crate::rom::Rom;
use crate::Word;

use std::error::Error as StdError;
use std::fmt;
use std::num::Wrapping;

use self::exec::exec;

/// Instructions executed per [`Machine::run`] iteration before the budget
/// is renewed.
///
/// [`Machine::run`]: struct.Machine.html#method.run
const RUN_CHUNK: usize = 4096;

/// Reasons execution can fail.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Fault {
    /// RAM access outside `[0, RAM_WORDS)`.
    BadMemoryAccess(Word),
    /// Push while `sp` is already below the bottom of the stack.
    StackOverflow,
    /// Pop while `sp` is already at the top of RAM.
    StackUnderflow,
    /// Jump target outside the instruction array.
    BadJump(Word),
    /// An immediate operand was used as a destination.
    StoreToImmediate,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Fault::BadMemoryAccess(address) => {
                write!(f, "memory access out of range: {}", address)
            }
            Fault::StackOverflow => f.write_str("stack overflow"),
            Fault::StackUnderflow => f.write_str("stack underflow"),
            Fault::BadJump(target) => write!(f, "jump target out of range: {}", target),
            Fault::StoreToImmediate => f.write_str("immediate operand used as destination"),
        }
    }
}

/// A [`Fault`] together with the index of the instruction that raised it.
///
/// There is no recovery: the machine state past the failing instruction is
/// unspecified and the host should discard the instance.
///
/// [`Fault`]: enum.Fault.html
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExecError {
    pc: usize,
    fault: Fault,
}

impl ExecError {
    pub fn new(pc: usize, fault: Fault) -> ExecError {
        ExecError { pc, fault }
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn fault(&self) -> Fault {
        self.fault
    }
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "fault at instruction {}: {}", self.pc, self.fault)
    }
}

impl StdError for ExecError {}

pub(crate) struct State {
    pub registers: [Word; constants::REGISTER_COUNT],
    pub ram: Ram,
    pub pc: Wrapping<usize>,
    pub input: Word,
    pub output: Word,
    pub finished: bool,
    pub sync: bool,
}

impl State {
    fn new() -> State {
        let mut registers = [0; constants::REGISTER_COUNT];
        registers[register_index(Reg::SP)] = constants::STACK_TOP;

        State {
            registers,
            ram: Ram::new(),
            pc: Wrapping(0),
            input: 0,
            output: 0,
            finished: false,
            sync: false,
        }
    }
}

/// One machine instance: register file, RAM, program counter, I/O latches
/// and the currently installed [`Rom`].
///
/// Nothing runs until the host grants a step budget via [`steps`] or
/// [`step`]; a single instance must not be entered concurrently.
///
/// [`Rom`]: struct.Rom.html
/// [`steps`]: #method.steps
/// [`step`]: #method.step
pub struct Machine {
    rom: Rom,
    state: State,
    handler: Option<Box<dyn IoHandler>>,
}

impl Machine {
    pub fn new() -> Machine {
        Machine {
            rom: Rom::default(),
            state: State::new(),
            handler: None,
        }
    }

    /// Replaces the ROM wholesale and resets the machine state.
    pub fn install(&mut self, rom: Rom) {
        self.rom = rom;
        self.reset();
    }

    /// Zeroes registers, RAM, latches and flags; `sp` returns to the top
    /// of RAM and `pc` to 0. The ROM and the I/O handler are kept.
    pub fn reset(&mut self) {
        self.state = State::new();
    }

    pub fn rom(&self) -> &Rom {
        &self.rom
    }

    pub fn registers(&self) -> &[Word] {
        &self.state.registers[..]
    }

    pub fn registers_mut(&mut self) -> &mut [Word] {
        &mut self.state.registers[..]
    }

    pub fn register(&self, reg: Reg) -> Word {
        self.state.registers[register_index(reg)]
    }

    pub fn register_mut(&mut self, reg: Reg) -> &mut Word {
        &mut self.state.registers[register_index(reg)]
    }

    pub fn ram(&self) -> &Ram {
        &self.state.ram
    }

    pub fn ram_mut(&mut self) -> &mut Ram {
        &mut self.state.ram
    }

    pub fn pc(&self) -> usize {
        self.state.pc.0
    }

    /// Restore hook for image loading; not part of normal operation.
    pub fn set_pc(&mut self, pc: usize) {
        self.state.pc = Wrapping(pc);
    }

    pub fn input(&self) -> Word {
        self.state.input
    }

    pub fn set_input(&mut self, value: Word) {
        self.state.input = value;
    }

    pub fn output(&self) -> Word {
        self.state.output
    }

    pub fn set_output(&mut self, value: Word) {
        self.state.output = value;
    }

    pub fn finished(&self) -> bool {
        self.state.finished
    }

    /// Restore hook for image loading; not part of normal operation.
    pub fn set_finished(&mut self, finished: bool) {
        self.state.finished = finished;
    }

    pub fn set_io_handler<H: IoHandler + 'static>(&mut self, handler: H) {
        self.handler = Some(Box::new(handler));
    }

    pub fn clear_io_handler(&mut self) {
        self.handler = None;
    }

    /// Executes up to `budget` instructions.
    ///
    /// Returns `Ok(true)` while the machine can still make progress and
    /// `Ok(false)` once the terminator has executed (or no program is
    /// installed). The loop exits early when the budget runs out or when a
    /// `sync` instruction executed this tick; in the latter case the I/O
    /// handler, if any, is invoked before control returns and the `sync`
    /// flag is cleared.
    pub fn steps(&mut self, budget: usize) -> Result<bool, ExecError> {
        if self.rom.is_empty() {
            return Ok(false);
        }

        let rom_len = self.rom.len();

        for _ in 0..budget {
            if self.state.finished {
                break;
            }

            let pc = self.state.pc.0;
            let record = self
                .rom
                .get(pc)
                .ok_or_else(|| ExecError::new(pc, Fault::BadJump(pc as Word)))?;

            exec(&mut self.state, record, rom_len).map_err(|fault| ExecError::new(pc, fault))?;
            self.state.pc += Wrapping(1);

            if self.state.sync {
                if let Some(handler) = self.handler.as_mut() {
                    handler.exchange(&mut self.state.input, self.state.output);
                }
                self.state.sync = false;
                break;
            }
        }

        Ok(!self.state.finished)
    }

    /// Executes a single instruction. Equivalent to `steps(1)`.
    pub fn step(&mut self) -> Result<bool, ExecError> {
        self.steps(1)
    }

    /// Steps until the terminator executes. Syncs are serviced along the
    /// way; a guest that never halts keeps this from returning.
    pub fn run(&mut self) -> Result<(), ExecError> {
        while self.steps(RUN_CHUNK)? {}
        Ok(())
    }
}

impl Default for Machine {
    fn default() -> Machine {
        Machine::new()
    }
}
