use crate::constants;
use crate::instr::Instr;
use std::error::Error as StdError;
use std::fmt;
use std::iter;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RomError {
    /// The program exceeds [`ROM_CAPACITY`] user instructions.
    ///
    /// [`ROM_CAPACITY`]: constants/constant.ROM_CAPACITY.html
    TooLarge(usize),
}

impl fmt::Display for RomError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            RomError::TooLarge(len) => write!(
                f,
                "Program has {} instructions, at most {} are allowed.",
                len,
                constants::ROM_CAPACITY
            ),
        }
    }
}

impl StdError for RomError {}

/// The assembled instruction array.
///
/// A `Rom` owns its records; nothing else mutates or outlives them. After
/// the user instructions comes one terminator record followed by
/// [`ROM_PADDING`] no-ops, so a fall-through, a stray branch or a
/// slightly overshot `apc` target still lands on a defined record.
///
/// [`ROM_PADDING`]: constants/constant.ROM_PADDING.html
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Rom {
    records: Vec<Instr>,
}

impl Rom {
    /// Builds a ROM from user instructions, appending the terminator and
    /// the no-op padding.
    pub fn new(user: Vec<Instr>) -> Result<Rom, RomError> {
        if user.len() > constants::ROM_CAPACITY {
            return Err(RomError::TooLarge(user.len()));
        }

        let mut records = user;
        records.push(Instr::Halt);
        records.extend(iter::repeat(Instr::Nop).take(constants::ROM_PADDING));

        Ok(Rom { records })
    }

    /// Rebuilds a ROM from records captured by an image snapshot. The
    /// records are taken verbatim; no terminator or padding is appended.
    pub fn from_records(records: Vec<Instr>) -> Rom {
        Rom { records }
    }

    pub fn records(&self) -> &[Instr] {
        &self.records[..]
    }

    pub fn get(&self, index: usize) -> Option<&Instr> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
