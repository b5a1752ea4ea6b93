//! Assembler for the [pcpu](../pcpu/index.html) virtual machine.
//!
//! The main entry points are [`assemble`](fn.assemble.html), which turns a
//! program written in pico assembly into an executable
//! [`Rom`](../pcpu/struct.Rom.html), and [`program`](fn.program.html),
//! which additionally installs the result into a
//! [`Machine`](../pcpu/struct.Machine.html).
//! [`assemble_with_map`](fn.assemble_with_map.html) also returns a
//! [`SourceMap`](type.SourceMap.html) associating each assembled
//! instruction with its source line, so runtime faults can be reported
//! against the assembly text.
//!
//! Parsing is implemented with [pest]; the [`Error`](type.Error.html) type
//! is an alias of `pest::error::Error`, so positioned pretty-printing of
//! assembly errors comes for free.
//!
//! # Pico Assembly Language
//!
//! One instruction per line; tokens are whitespace-separated. A `;` starts
//! a comment that runs to the end of the line. A line consisting of a name
//! followed by `:` declares a label naming the index of the next
//! instruction. Mnemonics and register names are case-insensitive.
//!
//! ## Operands
//!
//! | Operand  | Syntax                       | Meaning                       |
//! |----------|------------------------------|-------------------------------|
//! | register | `x0`..`x7`, `ra`, `sp`, `s0`..`s5` | a register file slot    |
//! | immediate| decimal or `0x` hexadecimal, optionally negative | a literal |
//! | memory   | `[operand]`, recursively (`[[x]]` is legal) | the RAM word addressed by the inner operand |
//! | label    | identifier                   | a branch or jump target       |
//!
//! ## Instructions
//!
//! Mnemonic  | Short description                        | Syntax
//! ----------|------------------------------------------|----------------------
//! `c+`      | Add                                      | `c+ dst a b`
//! `c-`      | Subtract                                 | `c- dst a b`
//! `c&`      | Bitwise and                              | `c& dst a b`
//! `c\|`     | Bitwise or                               | `c\| dst a b`
//! `c^`      | Bitwise xor                              | `c^ dst a b`
//! `c<<`     | Shift left                               | `c<< dst a b`
//! `c>>`     | Shift right arithmetic                   | `c>> dst a b`
//! `c>>>`    | Shift right logical                      | `c>>> dst a b`
//! `c==`     | Set if equal                             | `c== dst a b`
//! `c!=`     | Set if not equal                         | `c!= dst a b`
//! `c<`      | Set if less than                         | `c< dst a b`
//! `c>=`     | Set if greater or equal                  | `c>= dst a b`
//! `c>`      | Set if greater than (swapped `c<`)       | `c> dst a b`
//! `c<=`     | Set if less or equal (swapped `c>=`)     | `c<= dst a b`
//! `mv`      | Copy                                     | `mv dst src`
//! `push`    | Push values, `sp` pre-decremented        | `push s1 .. sn`
//! `pop`     | Pop values written by a matching push    | `pop d1 .. dn`
//! `b==`     | Branch if equal                          | `b== a b label`
//! `b!=`     | Branch if not equal                      | `b!= a b label`
//! `b<`      | Branch if less than                      | `b< a b label`
//! `b>=`     | Branch if greater or equal               | `b>= a b label`
//! `b>`      | Branch if greater than (swapped `b<`)    | `b> a b label`
//! `b<=`     | Branch if less or equal (swapped `b>=`)  | `b<= a b label`
//! `j`       | Jump to a label, or indirectly through a register | `j label`, `j reg`
//! `apc`     | `dst = pc + k`                           | `apc dst k`
//! `in`      | `dst = dst \| (input << shift)`          | `in dst port (shift)`
//! `out`     | `output = src >> shift`                  | `out port src (shift)`
//! `sync`    | Yield to the host for I/O                | `sync`
//!
//! # Examples
//! ```
//! use pcpu::{Machine, Reg};
//!
//! let mut machine = Machine::new();
//! pasm::program(&mut machine, "mv s0 2\nc+ s0 s0 40").unwrap();
//! machine.run().unwrap();
//! assert_eq!(machine.register(Reg::S0), 42);
//! ```
//!
//! [pest]: https://docs.rs/pest/

mod instructions;
mod int_util;
mod labels;
mod parser;


use pcpu::{Machine, Rom};
use pest::iterators::Pair;
use pest::{Parser, Span};

use parser::AsmParser;
pub use parser::Rule;

pub type Error = pest::error::Error<Rule>;

pub type Result<T> = std::result::Result<T, Error>;

/// Maps each user instruction index to its 1-based source line.
pub type SourceMap = Vec<u32>;

/// Assembles `input` into a ROM.
pub fn assemble(input: &str) -> Result<Rom> {
    assemble_with_map(input).map(|(rom, _)| rom)
}

/// Assembles `input` into a ROM plus the instruction-to-line source map.
pub fn assemble_with_map(input: &str) -> Result<(Rom, SourceMap)> {
    assemble_parsed(parse(input)?)
}

/// Assembles `input` and installs the result, resetting the machine.
pub fn program(machine: &mut Machine, input: &str) -> Result<()> {
    let rom = assemble(input)?;
    machine.install(rom);
    Ok(())
}

fn new_parser_error(span: Span, message: String) -> Error {
    Error::new_from_span(pest::error::ErrorVariant::CustomError { message }, span)
}

fn parse(input: &str) -> Result<Pair<Rule>> {
    Ok(AsmParser::parse(Rule::program, input)?.next().unwrap())
}

fn assemble_parsed(pair: Pair<Rule>) -> Result<(Rom, SourceMap)> {
    let program_span = pair.as_span();
    let (parsed, labels, source_map) = instructions::process_lines(pair)?;
    let records = instructions::finalize_instructions(&parsed, &labels)?;

    let rom = Rom::new(records)
        .map_err(|err| new_parser_error(program_span, format!("{}", err)))?;

    Ok((rom, source_map))
}
