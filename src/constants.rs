use crate::Word;

/// Size of the register bank. Only the first [`NAMED_REGISTERS`] are
/// addressable from assembly; the rest is headroom.
pub const REGISTER_COUNT: usize = 16;

/// Number of registers reachable by name (`x0`..`x7` and their aliases).
pub const NAMED_REGISTERS: usize = 8;

/// Main memory size in words.
pub const RAM_WORDS: usize = 256;

/// Maximum number of user instructions per program.
pub const ROM_CAPACITY: usize = 128;

/// Number of no-op records appended after the terminator so that small
/// overshoots of the program counter still land on defined records.
pub const ROM_PADDING: usize = 20;

/// Initial value of `sp`: the stack grows downward from the top of RAM.
pub const STACK_TOP: Word = (RAM_WORDS - 1) as Word;
