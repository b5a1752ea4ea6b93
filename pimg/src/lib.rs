//! Persistent images of [pcpu](../pcpu/index.html) machines.
//!
//! An [`Image`](struct.Image.html) captures everything observable about a
//! machine at a step boundary: the register file, RAM, the program
//! counter, the I/O latches, the `finished` flag and every installed ROM
//! record. [`Image::restore`](struct.Image.html#method.restore) rebuilds
//! a machine that continues exactly where the snapshot was taken.
//!
//! The on-disk format is little-endian (see `util::Endian`) and
//! versionless: counts first, then the raw state, then the instruction
//! records as tagged bytes. The `sync` flag is not stored because it is
//! always clear between steps.

use byteorder::{ReadBytesExt, WriteBytesExt};
use num_traits::{FromPrimitive, ToPrimitive};
use pcpu::{constants, AluFunct, Cond, Instr, Machine, Operand, Rom, Word};
use std::fs::File;
use std::io::prelude::*;
use std::io::{BufReader, BufWriter, Error, ErrorKind};
use std::path::Path;
use util::Endian;


/// Nesting limit for memory operands when decoding, so a corrupt image
/// cannot recurse without bound.
const MAX_MEM_DEPTH: usize = 64;

/// Largest record count a well-formed image can contain.
const MAX_RECORDS: usize = constants::ROM_CAPACITY + 1 + constants::ROM_PADDING;

#[derive(Debug, PartialEq)]
pub struct Image {
    registers: Vec<Word>,
    ram: Vec<Word>,
    pc: u32,
    input: Word,
    output: Word,
    finished: bool,
    records: Vec<Instr>,
}

impl Image {
    /// Captures the machine state at a step boundary.
    pub fn snapshot(machine: &Machine) -> Image {
        Image {
            registers: machine.registers().to_vec(),
            ram: machine.ram().words().to_vec(),
            pc: machine.pc() as u32,
            input: machine.input(),
            output: machine.output(),
            finished: machine.finished(),
            records: machine.rom().records().to_vec(),
        }
    }

    /// Rebuilds a machine from the snapshot. Stepping the result behaves
    /// as if the original execution had never been interrupted.
    pub fn restore(&self) -> Machine {
        let mut machine = Machine::new();
        machine.install(Rom::from_records(self.records.clone()));
        machine.registers_mut().copy_from_slice(&self.registers);
        machine.ram_mut().words_mut().copy_from_slice(&self.ram);
        machine.set_pc(self.pc as usize);
        machine.set_input(self.input);
        machine.set_output(self.output);
        machine.set_finished(self.finished);
        machine
    }
}

fn invalid_data(message: &str) -> Error {
    Error::new(ErrorKind::InvalidData, message)
}

fn enum_tag<T: ToPrimitive + Copy>(value: T) -> u8 {
    value.to_u8().unwrap()
}

fn read_register_id<R: Read>(reader: &mut R) -> std::io::Result<u8> {
    let index = reader.read_u8()?;
    if (index as usize) < constants::NAMED_REGISTERS {
        Ok(index)
    } else {
        Err(invalid_data("register index out of range"))
    }
}

/// Targets are stored in label form (index of the destination record);
/// the `target - 1` execution form is reapplied on decode so it survives
/// the round trip on any pointer width.
fn write_target<W: Write>(writer: &mut W, target: usize) -> std::io::Result<()> {
    writer.write_u32::<Endian>(target.wrapping_add(1) as u32)
}

fn read_target<R: Read>(reader: &mut R) -> std::io::Result<usize> {
    Ok((reader.read_u32::<Endian>()? as usize).wrapping_sub(1))
}

fn write_operand<W: Write>(writer: &mut W, operand: &Operand) -> std::io::Result<()> {
    match operand {
        Operand::Imm(value) => {
            writer.write_u8(0)?;
            writer.write_i32::<Endian>(*value)
        }
        Operand::Reg(index) => {
            writer.write_u8(1)?;
            writer.write_u8(*index)
        }
        Operand::Mem(inner) => {
            writer.write_u8(2)?;
            write_operand(writer, inner)
        }
        Operand::Port(id) => {
            writer.write_u8(3)?;
            writer.write_u8(*id)
        }
    }
}

fn read_operand<R: Read>(reader: &mut R, depth: usize) -> std::io::Result<Operand> {
    if depth > MAX_MEM_DEPTH {
        return Err(invalid_data("memory operand nesting too deep"));
    }

    match reader.read_u8()? {
        0 => Ok(Operand::Imm(reader.read_i32::<Endian>()?)),
        1 => Ok(Operand::Reg(read_register_id(reader)?)),
        2 => Ok(Operand::mem(read_operand(reader, depth + 1)?)),
        3 => Ok(Operand::Port(reader.read_u8()?)),
        _ => Err(invalid_data("unknown operand tag")),
    }
}

fn write_record<W: Write>(writer: &mut W, record: &Instr) -> std::io::Result<()> {
    match record {
        Instr::Alu {
            funct,
            dst,
            lhs,
            rhs,
        } => {
            writer.write_u8(0)?;
            writer.write_u8(enum_tag(*funct))?;
            write_operand(writer, dst)?;
            write_operand(writer, lhs)?;
            write_operand(writer, rhs)
        }
        Instr::AddRegRegImm { rd, rs, imm } => {
            writer.write_u8(1)?;
            writer.write_u8(*rd)?;
            writer.write_u8(*rs)?;
            writer.write_i32::<Endian>(*imm)
        }
        Instr::Mv { dst, src } => {
            writer.write_u8(2)?;
            write_operand(writer, dst)?;
            write_operand(writer, src)
        }
        Instr::MvRegImm { rd, imm } => {
            writer.write_u8(3)?;
            writer.write_u8(*rd)?;
            writer.write_i32::<Endian>(*imm)
        }
        Instr::Push { srcs } => {
            writer.write_u8(4)?;
            writer.write_u32::<Endian>(srcs.len() as u32)?;
            for operand in srcs {
                write_operand(writer, operand)?;
            }
            Ok(())
        }
        Instr::Pop { dsts } => {
            writer.write_u8(5)?;
            writer.write_u32::<Endian>(dsts.len() as u32)?;
            for operand in dsts {
                write_operand(writer, operand)?;
            }
            Ok(())
        }
        Instr::Branch {
            cond,
            lhs,
            rhs,
            target,
        } => {
            writer.write_u8(6)?;
            writer.write_u8(enum_tag(*cond))?;
            write_operand(writer, lhs)?;
            write_operand(writer, rhs)?;
            write_target(writer, *target)
        }
        Instr::BranchRegReg {
            cond,
            rs1,
            rs2,
            target,
        } => {
            writer.write_u8(7)?;
            writer.write_u8(enum_tag(*cond))?;
            writer.write_u8(*rs1)?;
            writer.write_u8(*rs2)?;
            write_target(writer, *target)
        }
        Instr::BranchRegImm {
            cond,
            rs,
            imm,
            target,
        } => {
            writer.write_u8(8)?;
            writer.write_u8(enum_tag(*cond))?;
            writer.write_u8(*rs)?;
            writer.write_i32::<Endian>(*imm)?;
            write_target(writer, *target)
        }
        Instr::BranchImmReg {
            cond,
            imm,
            rs,
            target,
        } => {
            writer.write_u8(9)?;
            writer.write_u8(enum_tag(*cond))?;
            writer.write_i32::<Endian>(*imm)?;
            writer.write_u8(*rs)?;
            write_target(writer, *target)
        }
        Instr::Jmp { target } => {
            writer.write_u8(10)?;
            write_target(writer, *target)
        }
        Instr::JmpReg { rs } => {
            writer.write_u8(11)?;
            writer.write_u8(*rs)
        }
        Instr::Apc { dst, offset } => {
            writer.write_u8(12)?;
            write_operand(writer, dst)?;
            writer.write_i32::<Endian>(*offset)
        }
        Instr::In { dst, port, shift } => {
            writer.write_u8(13)?;
            write_operand(writer, dst)?;
            write_operand(writer, port)?;
            writer.write_u32::<Endian>(*shift)
        }
        Instr::Out { port, src, shift } => {
            writer.write_u8(14)?;
            write_operand(writer, port)?;
            write_operand(writer, src)?;
            writer.write_u32::<Endian>(*shift)
        }
        Instr::Sync => writer.write_u8(15),
        Instr::Halt => writer.write_u8(16),
        Instr::Nop => writer.write_u8(17),
    }
}

fn read_funct<R: Read>(reader: &mut R) -> std::io::Result<AluFunct> {
    AluFunct::from_u8(reader.read_u8()?).ok_or_else(|| invalid_data("unknown ALU function"))
}

fn read_cond<R: Read>(reader: &mut R) -> std::io::Result<Cond> {
    Cond::from_u8(reader.read_u8()?).ok_or_else(|| invalid_data("unknown branch predicate"))
}

fn read_operand_list<R: Read>(reader: &mut R) -> std::io::Result<Vec<Operand>> {
    let count = reader.read_u32::<Endian>()? as usize;
    if count > constants::RAM_WORDS {
        return Err(invalid_data("operand list too long"));
    }

    let mut operands = Vec::with_capacity(count);
    for _ in 0..count {
        operands.push(read_operand(reader, 0)?);
    }
    Ok(operands)
}

fn read_record<R: Read>(reader: &mut R) -> std::io::Result<Instr> {
    Ok(match reader.read_u8()? {
        0 => Instr::Alu {
            funct: read_funct(reader)?,
            dst: read_operand(reader, 0)?,
            lhs: read_operand(reader, 0)?,
            rhs: read_operand(reader, 0)?,
        },
        1 => Instr::AddRegRegImm {
            rd: read_register_id(reader)?,
            rs: read_register_id(reader)?,
            imm: reader.read_i32::<Endian>()?,
        },
        2 => Instr::Mv {
            dst: read_operand(reader, 0)?,
            src: read_operand(reader, 0)?,
        },
        3 => Instr::MvRegImm {
            rd: read_register_id(reader)?,
            imm: reader.read_i32::<Endian>()?,
        },
        4 => Instr::Push {
            srcs: read_operand_list(reader)?,
        },
        5 => Instr::Pop {
            dsts: read_operand_list(reader)?,
        },
        6 => Instr::Branch {
            cond: read_cond(reader)?,
            lhs: read_operand(reader, 0)?,
            rhs: read_operand(reader, 0)?,
            target: read_target(reader)?,
        },
        7 => Instr::BranchRegReg {
            cond: read_cond(reader)?,
            rs1: read_register_id(reader)?,
            rs2: read_register_id(reader)?,
            target: read_target(reader)?,
        },
        8 => Instr::BranchRegImm {
            cond: read_cond(reader)?,
            rs: read_register_id(reader)?,
            imm: reader.read_i32::<Endian>()?,
            target: read_target(reader)?,
        },
        9 => Instr::BranchImmReg {
            cond: read_cond(reader)?,
            imm: reader.read_i32::<Endian>()?,
            rs: read_register_id(reader)?,
            target: read_target(reader)?,
        },
        10 => Instr::Jmp {
            target: read_target(reader)?,
        },
        11 => Instr::JmpReg {
            rs: read_register_id(reader)?,
        },
        12 => Instr::Apc {
            dst: read_operand(reader, 0)?,
            offset: reader.read_i32::<Endian>()?,
        },
        13 => Instr::In {
            dst: read_operand(reader, 0)?,
            port: read_operand(reader, 0)?,
            shift: reader.read_u32::<Endian>()?,
        },
        14 => Instr::Out {
            port: read_operand(reader, 0)?,
            src: read_operand(reader, 0)?,
            shift: reader.read_u32::<Endian>()?,
        },
        15 => Instr::Sync,
        16 => Instr::Halt,
        17 => Instr::Nop,
        _ => return Err(invalid_data("unknown record tag")),
    })
}

fn read_word_block<R: Read>(reader: &mut R, expected: usize, what: &str) -> std::io::Result<Vec<Word>> {
    let count = reader.read_u32::<Endian>()? as usize;
    if count != expected {
        return Err(invalid_data(what));
    }

    let mut words = vec![0; count];
    for word in &mut words {
        *word = reader.read_i32::<Endian>()?;
    }
    Ok(words)
}

pub fn read<R: Read>(reader: &mut R) -> std::io::Result<Image> {
    let registers = read_word_block(reader, constants::REGISTER_COUNT, "unexpected register bank size")?;
    let ram = read_word_block(reader, constants::RAM_WORDS, "unexpected RAM size")?;

    let pc = reader.read_u32::<Endian>()?;
    let input = reader.read_i32::<Endian>()?;
    let output = reader.read_i32::<Endian>()?;
    let finished = match reader.read_u8()? {
        0 => false,
        1 => true,
        _ => return Err(invalid_data("malformed finished flag")),
    };

    let record_count = reader.read_u32::<Endian>()? as usize;
    if record_count > MAX_RECORDS {
        return Err(invalid_data("record count out of range"));
    }

    let mut records = Vec::with_capacity(record_count);
    for _ in 0..record_count {
        records.push(read_record(reader)?);
    }

    Ok(Image {
        registers,
        ram,
        pc,
        input,
        output,
        finished,
        records,
    })
}

pub fn write<W: Write>(writer: &mut W, image: &Image) -> std::io::Result<()> {
    writer.write_u32::<Endian>(image.registers.len() as u32)?;
    for value in &image.registers {
        writer.write_i32::<Endian>(*value)?;
    }

    writer.write_u32::<Endian>(image.ram.len() as u32)?;
    for value in &image.ram {
        writer.write_i32::<Endian>(*value)?;
    }

    writer.write_u32::<Endian>(image.pc)?;
    writer.write_i32::<Endian>(image.input)?;
    writer.write_i32::<Endian>(image.output)?;
    writer.write_u8(image.finished as u8)?;

    writer.write_u32::<Endian>(image.records.len() as u32)?;
    for record in &image.records {
        write_record(writer, record)?;
    }

    Ok(())
}

pub trait ReadImageExt: Read + Sized {
    fn read_image(&mut self) -> std::io::Result<Image> {
        read(self)
    }
}

impl<R: Read + Sized> ReadImageExt for R {}

pub trait WriteImageExt: Write + Sized {
    fn write_image(&mut self, image: &Image) -> std::io::Result<()> {
        write(self, image)
    }
}

impl<W: Write + Sized> WriteImageExt for W {}

pub fn read_file<P: AsRef<Path>>(path: P) -> std::io::Result<Image> {
    BufReader::new(File::open(path)?).read_image()
}

pub fn write_file<P: AsRef<Path>>(path: P, image: &Image) -> std::io::Result<()> {
    BufWriter::new(File::create(path)?).write_image(image)
}
