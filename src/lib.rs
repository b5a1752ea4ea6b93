//! Virtual word machine for the pico toolchain.
//!
//! The machine operates on a single value type, the 32-bit signed [`Word`].
//! It owns a bank of registers, 256 words of RAM (which doubles as the
//! stack), a program counter and a pair of I/O latches. Programs are
//! installed as a [`Rom`] of instruction records and advanced with
//! [`Machine::steps`]; the guest cooperates with the host through the
//! `sync` instruction and an [`IoHandler`] callback.
//!
//! Assembling ROMs from text is the job of the `pasm` crate; compiling the
//! high-level source language down to assembly text is the job of `pcc`.

pub mod constants;

mod instr;
mod io;
mod machine;
mod ram;
mod rom;

pub use crate::instr::{register_index, AluFunct, Cond, Instr, Operand, Reg};
pub use crate::io::IoHandler;
pub use crate::machine::{ExecError, Fault, Machine};
pub use crate::ram::Ram;
pub use crate::rom::{Rom, RomError};

/// 32-bit signed machine word. All registers, RAM cells, immediates and
/// I/O traffic use this type.
pub type Word = i32;
