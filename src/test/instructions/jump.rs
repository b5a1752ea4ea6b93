use crate::test::*;
use crate::*;

#[test]
fn jmp_skips_over_code() {
    let machine = run_records(vec![
        Instr::MvRegImm { rd: S0, imm: 1 },
        Instr::Jmp { target: target(3) },
        Instr::MvRegImm { rd: S0, imm: 0 },
    ]);
    assert_eq!(machine.register(Reg::S0), 1);
}

#[test]
fn apc_yields_own_index() {
    let machine = run_records(vec![
        Instr::Nop,
        Instr::Apc {
            dst: reg(S0),
            offset: 0,
        },
        Instr::Apc {
            dst: reg(S1),
            offset: 10,
        },
    ]);
    assert_eq!(machine.register(Reg::S0), 1);
    assert_eq!(machine.register(Reg::S1), 12);
}

#[test]
fn call_and_return_through_ra() {
    // apc ra 2; j fn; <resume>; j end; fn: mv s0 7; j ra
    let machine = run_records(vec![
        Instr::Apc {
            dst: reg(RA),
            offset: 2,
        },
        Instr::Jmp { target: target(4) },
        Instr::MvRegImm { rd: S1, imm: 9 },
        Instr::Jmp { target: target(6) },
        Instr::MvRegImm { rd: S0, imm: 7 },
        Instr::JmpReg { rs: RA },
    ]);

    assert_eq!(machine.register(Reg::S0), 7);
    assert_eq!(machine.register(Reg::S1), 9);
    assert!(machine.finished());
}

#[test]
fn indirect_jump_is_bounds_checked() {
    let mut machine = machine_with(vec![
        Instr::MvRegImm { rd: S0, imm: -1 },
        Instr::JmpReg { rs: S0 },
    ]);
    assert_eq!(machine.run(), Err(ExecError::new(1, Fault::BadJump(-1))));

    let mut machine = machine_with(vec![
        Instr::MvRegImm { rd: S0, imm: 1000 },
        Instr::JmpReg { rs: S0 },
    ]);
    assert_eq!(machine.run(), Err(ExecError::new(1, Fault::BadJump(1000))));
}

#[test]
fn indirect_jump_to_zero() {
    let mut machine = machine_with(vec![
        Instr::AddRegRegImm {
            rd: S0,
            rs: S0,
            imm: 1,
        },
        Instr::BranchRegImm {
            cond: Cond::GE,
            rs: S0,
            imm: 2,
            target: target(4),
        },
        Instr::MvRegImm { rd: S1, imm: 0 },
        Instr::JmpReg { rs: S1 },
    ]);
    machine.run().unwrap();
    assert_eq!(machine.register(Reg::S0), 2);
}
