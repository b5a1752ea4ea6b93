use crate::test::*;
use crate::*;

#[test]
fn push_pop_round_trip() {
    // mv s0 1; mv s1 2; mv s2 3; push s0 s1 s2; clear; pop s0 s1 s2
    // The pop operand list is stored reversed, as the assembler writes it.
    let machine = run_records(vec![
        Instr::MvRegImm { rd: S0, imm: 1 },
        Instr::MvRegImm { rd: S1, imm: 2 },
        Instr::MvRegImm { rd: S2, imm: 3 },
        Instr::Push {
            srcs: vec![reg(S0), reg(S1), reg(S2)],
        },
        Instr::MvRegImm { rd: S0, imm: 0 },
        Instr::MvRegImm { rd: S1, imm: 0 },
        Instr::MvRegImm { rd: S2, imm: 0 },
        Instr::Pop {
            dsts: vec![reg(S2), reg(S1), reg(S0)],
        },
    ]);

    assert_eq!(machine.register(Reg::S0), 1);
    assert_eq!(machine.register(Reg::S1), 2);
    assert_eq!(machine.register(Reg::S2), 3);
    assert_eq!(machine.register(Reg::SP), constants::STACK_TOP);
}

#[test]
fn push_grows_downward() {
    let machine = run_records(vec![
        Instr::MvRegImm { rd: S0, imm: 1 },
        Instr::MvRegImm { rd: S1, imm: 2 },
        Instr::Push {
            srcs: vec![reg(S0), reg(S1), imm(3)],
        },
    ]);

    assert_eq!(machine.register(Reg::SP), 252);
    assert_eq!(machine.ram().read(255), Ok(1));
    assert_eq!(machine.ram().read(254), Ok(2));
    assert_eq!(machine.ram().read(253), Ok(3));
}

#[test]
fn full_stack_is_legal_one_more_push_is_not() {
    // 256 pushes bring sp to -1, which is still well-formed.
    let mut machine = machine_with(vec![
        Instr::Push {
            srcs: vec![imm(7); constants::RAM_WORDS],
        },
        Instr::Push { srcs: vec![imm(8)] },
    ]);

    let result = machine.run();

    assert_eq!(result, Err(ExecError::new(1, Fault::StackOverflow)));
    assert_eq!(machine.register(Reg::SP), -1);
}

#[test]
fn pop_on_empty_stack_underflows() {
    let mut machine = machine_with(vec![Instr::Pop {
        dsts: vec![reg(S0)],
    }]);

    assert_eq!(machine.run(), Err(ExecError::new(0, Fault::StackUnderflow)));
}

#[test]
fn pop_restores_matching_push_order() {
    let machine = run_records(vec![
        Instr::Push {
            srcs: vec![imm(10), imm(20)],
        },
        Instr::Pop {
            dsts: vec![reg(S1), reg(S0)],
        },
    ]);

    assert_eq!(machine.register(Reg::S0), 10);
    assert_eq!(machine.register(Reg::S1), 20);
}
