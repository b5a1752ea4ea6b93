use crate::Word;
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::ToPrimitive;
use std::str::FromStr;
use util::ParseEnumError;

/// Named registers of the machine.
///
/// The bank holds [`REGISTER_COUNT`] words but only these eight have
/// names; `xN` in assembly addresses the same slots by index.
///
/// | Register  | Index | Purpose                                   |
/// |-----------|-------|-------------------------------------------|
/// | `ra`      | 0     | Return address (`apc` / `j ra` idiom)     |
/// | `sp`      | 1     | Stack pointer, starts at the top of RAM   |
/// | `s0`-`s5` | 2-7   | General purpose                           |
///
/// [`REGISTER_COUNT`]: constants/constant.REGISTER_COUNT.html
#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive)]
pub enum Reg {
    RA,
    SP,
    S0,
    S1,
    S2,
    S3,
    S4,
    S5,
}

impl FromStr for Reg {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Reg, ParseEnumError> {
        match s {
            "ra" => Ok(Reg::RA),
            "sp" => Ok(Reg::SP),
            "s0" => Ok(Reg::S0),
            "s1" => Ok(Reg::S1),
            "s2" => Ok(Reg::S2),
            "s3" => Ok(Reg::S3),
            "s4" => Ok(Reg::S4),
            "s5" => Ok(Reg::S5),
            _ => Err(ParseEnumError::new(s, "Reg")),
        }
    }
}

/// Functions of the `c*` compute instructions.
///
/// `c>` and `c<=` have no function of their own; the assembler rewrites
/// them as `SLT` / `SGE` with swapped operands.
#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive)]
pub enum AluFunct {
    ADD,  // c+    a + b
    SUB,  // c-    a - b
    AND,  // c&    a & b
    OR,   // c|    a | b
    XOR,  // c^    a ^ b
    SLL,  // c<<   a << b
    SRA,  // c>>   a >> b (inserting sign bit)
    SRL,  // c>>>  a >> b (inserting zeros)
    SEQ,  // c==   (a == b) ? 1 : 0
    SNE,  // c!=   (a != b) ? 1 : 0
    SLT,  // c<    (a < b) ? 1 : 0
    SGE,  // c>=   (a >= b) ? 1 : 0
}

/// Predicates of the `b*` branch instructions.
///
/// `b>` and `b<=` are assembled as `LT` / `GE` with swapped operands.
#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive)]
pub enum Cond {
    EQ,
    NE,
    LT,
    GE,
}

macro_rules! impl_enum_display {
    ($e:ty) => {
        impl std::fmt::Display for $e {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                std::fmt::Debug::fmt(self, f)
            }
        }
    };
}

impl_enum_display!(Reg);
impl_enum_display!(AluFunct);
impl_enum_display!(Cond);

#[inline]
pub fn register_index(reg: Reg) -> usize {
    reg.to_usize().unwrap()
}

/// A tagged instruction operand, resolved at execution time.
///
/// Reads and writes behave as follows:
///
/// | Variant | Read                          | Write                    |
/// |---------|-------------------------------|--------------------------|
/// | `Imm`   | the literal                   | fault                    |
/// | `Reg`   | `rf[index]`                   | `rf[index]`              |
/// | `Mem`   | `ram[inner]` (recursive)      | `ram[inner]`             |
/// | `Port`  | the `input` latch             | the `output` latch       |
///
/// Register indices are always in `0..NAMED_REGISTERS`; the assembler and
/// the image loader are the only producers and both enforce this.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    Imm(Word),
    Reg(u8),
    Mem(Box<Operand>),
    Port(u8),
}

impl Operand {
    /// Wraps `inner` in a memory reference (`[inner]` in assembly).
    pub fn mem(inner: Operand) -> Operand {
        Operand::Mem(Box::new(inner))
    }

    /// An immediate cannot be a destination; everything else can.
    pub fn is_writable(&self) -> bool {
        !matches!(self, Operand::Imm(_))
    }
}

/// One record of an assembled program.
///
/// The generic variants carry tagged [`Operand`]s resolved on every
/// execution. The remaining variants are operand-shape specializations
/// picked by the assembler for the hot shapes (`mv reg, imm`,
/// `c+ reg, reg, imm` and two-operand branches), collapsing the per-tick
/// operand dispatch into direct register accesses.
///
/// Branch and jump targets are stored as `label_index - 1` (wrapping), so
/// the dispatch loop's unconditional increment lands on the label itself.
///
/// [`Operand`]: enum.Operand.html
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instr {
    Alu {
        funct: AluFunct,
        dst: Operand,
        lhs: Operand,
        rhs: Operand,
    },
    AddRegRegImm {
        rd: u8,
        rs: u8,
        imm: Word,
    },
    Mv {
        dst: Operand,
        src: Operand,
    },
    MvRegImm {
        rd: u8,
        imm: Word,
    },
    /// Sources are stored in push order.
    Push {
        srcs: Vec<Operand>,
    },
    /// Destinations are stored in pop order; the assembler reverses the
    /// written operand list so execution can iterate forward.
    Pop {
        dsts: Vec<Operand>,
    },
    Branch {
        cond: Cond,
        lhs: Operand,
        rhs: Operand,
        target: usize,
    },
    BranchRegReg {
        cond: Cond,
        rs1: u8,
        rs2: u8,
        target: usize,
    },
    BranchRegImm {
        cond: Cond,
        rs: u8,
        imm: Word,
        target: usize,
    },
    BranchImmReg {
        cond: Cond,
        imm: Word,
        rs: u8,
        target: usize,
    },
    Jmp {
        target: usize,
    },
    /// Indirect jump through a register; the register value is the target
    /// index and is bounds-checked at execution.
    JmpReg {
        rs: u8,
    },
    /// `dst = pc + offset`, where `pc` is the index of this record.
    Apc {
        dst: Operand,
        offset: Word,
    },
    /// `dst = dst | (port << shift)`.
    In {
        dst: Operand,
        port: Operand,
        shift: u32,
    },
    /// `port = src >> shift`.
    Out {
        port: Operand,
        src: Operand,
        shift: u32,
    },
    Sync,
    Halt,
    Nop,
}
