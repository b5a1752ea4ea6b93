use crate::test::*;
use crate::*;

fn binary(funct: AluFunct, a: Word, b: Word) -> Word {
    let machine = run_records(vec![
        Instr::MvRegImm { rd: S0, imm: a },
        Instr::MvRegImm { rd: S1, imm: b },
        Instr::Alu {
            funct,
            dst: reg(S2),
            lhs: reg(S0),
            rhs: reg(S1),
        },
    ]);
    machine.register(Reg::S2)
}

#[test]
fn add() {
    assert_eq!(binary(AluFunct::ADD, 42, 64), 106);
}

#[test]
fn add_wraps() {
    assert_eq!(binary(AluFunct::ADD, Word::max_value(), 1), Word::min_value());
}

#[test]
fn sub() {
    assert_eq!(binary(AluFunct::SUB, 16, 20), -4);
}

#[test]
fn bitwise() {
    assert_eq!(binary(AluFunct::AND, 0b1100, 0b1010), 0b1000);
    assert_eq!(binary(AluFunct::OR, 0b1100, 0b1010), 0b1110);
    assert_eq!(binary(AluFunct::XOR, 0b1100, 0b1010), 0b0110);
}

#[test]
fn shift_left() {
    assert_eq!(binary(AluFunct::SLL, 1, 4), 16);
}

#[test]
fn shift_right_arithmetic_keeps_sign() {
    assert_eq!(binary(AluFunct::SRA, -8, 1), -4);
}

#[test]
fn shift_right_logical_inserts_zeros() {
    assert_eq!(binary(AluFunct::SRL, -8, 1), 0x7FFF_FFFCu32 as Word);
}

#[test]
fn comparisons_set_zero_or_one() {
    assert_eq!(binary(AluFunct::SEQ, 3, 3), 1);
    assert_eq!(binary(AluFunct::SEQ, 3, 4), 0);
    assert_eq!(binary(AluFunct::SNE, 3, 4), 1);
    assert_eq!(binary(AluFunct::SLT, -1, 0), 1);
    assert_eq!(binary(AluFunct::SLT, 0, -1), 0);
    assert_eq!(binary(AluFunct::SGE, 5, 5), 1);
    assert_eq!(binary(AluFunct::SGE, 4, 5), 0);
}

#[test]
fn add_reg_reg_imm_specialization() {
    let machine = run_records(vec![
        Instr::MvRegImm { rd: S0, imm: 16 },
        Instr::AddRegRegImm {
            rd: S1,
            rs: S0,
            imm: -4,
        },
    ]);
    assert_eq!(machine.register(Reg::S1), 12);
}

#[test]
fn alu_through_memory_operands() {
    let machine = run_records(vec![
        Instr::Mv {
            dst: mem(imm(5)),
            src: imm(20),
        },
        Instr::Alu {
            funct: AluFunct::ADD,
            dst: mem(imm(6)),
            lhs: mem(imm(5)),
            rhs: imm(3),
        },
    ]);
    assert_eq!(machine.ram().read(6), Ok(23));
}
