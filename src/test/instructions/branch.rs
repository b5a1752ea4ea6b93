use crate::test::*;
use crate::*;

#[test]
fn reg_imm_taken() {
    // mv s0 5; b< s0 10 L; mv s0 0; L:
    let machine = run_records(vec![
        Instr::MvRegImm { rd: S0, imm: 5 },
        Instr::BranchRegImm {
            cond: Cond::LT,
            rs: S0,
            imm: 10,
            target: target(3),
        },
        Instr::MvRegImm { rd: S0, imm: 0 },
    ]);
    assert_eq!(machine.register(Reg::S0), 5);
}

#[test]
fn reg_imm_not_taken() {
    let machine = run_records(vec![
        Instr::MvRegImm { rd: S0, imm: 20 },
        Instr::BranchRegImm {
            cond: Cond::LT,
            rs: S0,
            imm: 10,
            target: target(3),
        },
        Instr::MvRegImm { rd: S0, imm: 0 },
    ]);
    assert_eq!(machine.register(Reg::S0), 0);
}

#[test]
fn reg_reg_shapes() {
    let machine = run_records(vec![
        Instr::MvRegImm { rd: S0, imm: 3 },
        Instr::MvRegImm { rd: S1, imm: 3 },
        Instr::BranchRegReg {
            cond: Cond::EQ,
            rs1: S0,
            rs2: S1,
            target: target(4),
        },
        Instr::MvRegImm { rd: S2, imm: 1 },
    ]);
    assert_eq!(machine.register(Reg::S2), 0);
}

#[test]
fn imm_reg_shape() {
    // b> s0 4 L assembles as LT with the immediate first: 4 < s0.
    let machine = run_records(vec![
        Instr::MvRegImm { rd: S0, imm: 5 },
        Instr::BranchImmReg {
            cond: Cond::LT,
            imm: 4,
            rs: S0,
            target: target(3),
        },
        Instr::MvRegImm { rd: S0, imm: 0 },
    ]);
    assert_eq!(machine.register(Reg::S0), 5);
}

#[test]
fn generic_operands() {
    let machine = run_records(vec![
        Instr::Mv {
            dst: mem(imm(0)),
            src: imm(1),
        },
        Instr::Branch {
            cond: Cond::NE,
            lhs: mem(imm(0)),
            rhs: imm(0),
            target: target(3),
        },
        Instr::Mv {
            dst: mem(imm(1)),
            src: imm(9),
        },
    ]);
    assert_eq!(machine.ram().read(1), Ok(0));
}

#[test]
fn backward_branch_to_first_instruction() {
    // The stored target wraps to usize::MAX; the unconditional increment
    // brings the counter back to 0.
    let machine = run_records(vec![
        Instr::AddRegRegImm {
            rd: S0,
            rs: S0,
            imm: 1,
        },
        Instr::BranchRegImm {
            cond: Cond::LT,
            rs: S0,
            imm: 3,
            target: target(0),
        },
    ]);
    assert_eq!(machine.register(Reg::S0), 3);
}
