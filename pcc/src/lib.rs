//! Compiler front-end for the pico source language.
//!
//! The language is a line-oriented imperative mini-language: integer
//! literals, bare identifiers as mutable variables, binary operators,
//! assignment, `if expr ... end`, `while expr ... end` and the single
//! built-in `read(port)`. Statements are separated by newlines; `;` and
//! `:` also act as statement separators, so
//! `while b<=100: ... end` reads naturally.
//!
//! [`compile`](fn.compile.html) lowers a program to textual pico assembly
//! (see the `pasm` crate) and returns the assembly together with a
//! [`VarMap`](type.VarMap.html), mapping each variable to the memory slot
//! it was assigned, so a host can locate results after a run.
//!
//! Variables and temporaries share one integer-addressed slot namespace
//! and appear in the emitted assembly as `[slot]` memory operands.
//!
//! # Examples
//! ```
//! let (assembly, vars) = pcc::compile("a = 2\nb = a + 40").unwrap();
//! assert_eq!(assembly, "mv [0] 2\nc+ [1] [0] 40\nmv [1] [1]\n");
//! assert_eq!(vars["b"], 1);
//! ```

mod ast;
mod codegen;
mod error;
mod lexer;
mod parser;
mod token;


pub use crate::codegen::VarMap;
pub use crate::error::{Error, Result};

/// Compiles pico source text to assembly plus the variable slot table.
pub fn compile(source: &str) -> Result<(String, VarMap)> {
    let tokens = lexer::lex(source)?;
    let program = parser::parse(&tokens)?;
    codegen::CodeGen::new().lower(&program)
}
