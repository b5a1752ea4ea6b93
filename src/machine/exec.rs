use super::{Fault, State};
use crate::instr::{register_index, AluFunct, Cond, Instr, Operand, Reg};
use crate::Word;
use std::num::Wrapping;

fn read(state: &State, operand: &Operand) -> Result<Word, Fault> {
    match operand {
        Operand::Imm(value) => Ok(*value),
        Operand::Reg(index) => Ok(state.registers[*index as usize]),
        Operand::Mem(inner) => {
            let address = read(state, inner)?;
            state
                .ram
                .read(address)
                .map_err(|_| Fault::BadMemoryAccess(address))
        }
        Operand::Port(_) => Ok(state.input),
    }
}

fn write(state: &mut State, operand: &Operand, value: Word) -> Result<(), Fault> {
    match operand {
        Operand::Imm(_) => Err(Fault::StoreToImmediate),
        Operand::Reg(index) => {
            state.registers[*index as usize] = value;
            Ok(())
        }
        Operand::Mem(inner) => {
            let address = read(state, inner)?;
            state
                .ram
                .write(address, value)
                .map_err(|_| Fault::BadMemoryAccess(address))
        }
        Operand::Port(_) => {
            state.output = value;
            Ok(())
        }
    }
}

fn set_if(condition: bool) -> Word {
    if condition {
        1
    } else {
        0
    }
}

fn alu(funct: AluFunct, a: Word, b: Word) -> Word {
    match funct {
        AluFunct::ADD => a.wrapping_add(b),
        AluFunct::SUB => a.wrapping_sub(b),
        AluFunct::AND => a & b,
        AluFunct::OR => a | b,
        AluFunct::XOR => a ^ b,
        AluFunct::SLL => a.wrapping_shl(b as u32),
        AluFunct::SRA => a.wrapping_shr(b as u32),
        AluFunct::SRL => ((a as u32).wrapping_shr(b as u32)) as Word,
        AluFunct::SEQ => set_if(a == b),
        AluFunct::SNE => set_if(a != b),
        AluFunct::SLT => set_if(a < b),
        AluFunct::SGE => set_if(a >= b),
    }
}

fn compare(cond: Cond, a: Word, b: Word) -> bool {
    match cond {
        Cond::EQ => a == b,
        Cond::NE => a != b,
        Cond::LT => a < b,
        Cond::GE => a >= b,
    }
}

/// `ram[sp] = value; sp -= 1`. The stack grows downward; pushing with
/// `sp` already below RAM is an overflow.
fn push(state: &mut State, value: Word) -> Result<(), Fault> {
    let sp = state.registers[register_index(Reg::SP)];
    if sp < 0 {
        return Err(Fault::StackOverflow);
    }

    state
        .ram
        .write(sp, value)
        .map_err(|_| Fault::BadMemoryAccess(sp))?;
    state.registers[register_index(Reg::SP)] = sp.wrapping_sub(1);
    Ok(())
}

/// `sp += 1; value = ram[sp]`.
fn pop(state: &mut State) -> Result<Word, Fault> {
    let sp = state.registers[register_index(Reg::SP)].wrapping_add(1);
    if sp as usize >= crate::constants::RAM_WORDS {
        return Err(Fault::StackUnderflow);
    }

    let value = state.ram.read(sp).map_err(|_| Fault::BadMemoryAccess(sp))?;
    state.registers[register_index(Reg::SP)] = sp;
    Ok(value)
}

/// Indirect jump: the register value is the target index, checked against
/// the instruction array before `pc` is rewritten.
fn jump_indirect(state: &mut State, target: Word, rom_len: usize) -> Result<(), Fault> {
    if target < 0 || target as usize >= rom_len {
        return Err(Fault::BadJump(target));
    }

    state.pc = Wrapping((target as usize).wrapping_sub(1));
    Ok(())
}

/// Dispatches a single record against the machine state.
///
/// Branch targets are already stored as `label - 1`; the caller increments
/// `pc` unconditionally afterwards.
pub(super) fn exec(state: &mut State, record: &Instr, rom_len: usize) -> Result<(), Fault> {
    match record {
        Instr::Alu {
            funct,
            dst,
            lhs,
            rhs,
        } => {
            let a = read(state, lhs)?;
            let b = read(state, rhs)?;
            write(state, dst, alu(*funct, a, b))?;
        }

        Instr::AddRegRegImm { rd, rs, imm } => {
            state.registers[*rd as usize] = state.registers[*rs as usize].wrapping_add(*imm);
        }

        Instr::Mv { dst, src } => {
            let value = read(state, src)?;
            write(state, dst, value)?;
        }

        Instr::MvRegImm { rd, imm } => {
            state.registers[*rd as usize] = *imm;
        }

        Instr::Push { srcs } => {
            for src in srcs {
                let value = read(state, src)?;
                push(state, value)?;
            }
        }

        Instr::Pop { dsts } => {
            for dst in dsts {
                let value = pop(state)?;
                write(state, dst, value)?;
            }
        }

        Instr::Branch {
            cond,
            lhs,
            rhs,
            target,
        } => {
            let a = read(state, lhs)?;
            let b = read(state, rhs)?;
            if compare(*cond, a, b) {
                state.pc = Wrapping(*target);
            }
        }

        Instr::BranchRegReg {
            cond,
            rs1,
            rs2,
            target,
        } => {
            let a = state.registers[*rs1 as usize];
            let b = state.registers[*rs2 as usize];
            if compare(*cond, a, b) {
                state.pc = Wrapping(*target);
            }
        }

        Instr::BranchRegImm {
            cond,
            rs,
            imm,
            target,
        } => {
            if compare(*cond, state.registers[*rs as usize], *imm) {
                state.pc = Wrapping(*target);
            }
        }

        Instr::BranchImmReg {
            cond,
            imm,
            rs,
            target,
        } => {
            if compare(*cond, *imm, state.registers[*rs as usize]) {
                state.pc = Wrapping(*target);
            }
        }

        Instr::Jmp { target } => {
            state.pc = Wrapping(*target);
        }

        Instr::JmpReg { rs } => {
            let target = state.registers[*rs as usize];
            jump_indirect(state, target, rom_len)?;
        }

        Instr::Apc { dst, offset } => {
            let value = (state.pc.0 as Word).wrapping_add(*offset);
            write(state, dst, value)?;
        }

        Instr::In { dst, port, shift } => {
            let current = read(state, dst)?;
            let incoming = read(state, port)?;
            write(state, dst, current | incoming.wrapping_shl(*shift))?;
        }

        Instr::Out { port, src, shift } => {
            let value = read(state, src)?;
            write(state, port, value.wrapping_shr(*shift))?;
        }

        Instr::Sync => {
            state.sync = true;
        }

        Instr::Halt => {
            state.finished = true;
        }

        Instr::Nop => {}
    }

    Ok(())
}
