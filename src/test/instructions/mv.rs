use crate::test::*;
use crate::*;

#[test]
fn mv_reg_imm_specialization() {
    let machine = run_records(vec![Instr::MvRegImm { rd: S0, imm: -123 }]);
    assert_eq!(machine.register(Reg::S0), -123);
}

#[test]
fn mv_between_memory_and_registers() {
    let machine = run_records(vec![
        Instr::Mv {
            dst: mem(imm(10)),
            src: imm(77),
        },
        Instr::Mv {
            dst: reg(S0),
            src: mem(imm(10)),
        },
    ]);
    assert_eq!(machine.register(Reg::S0), 77);
    assert_eq!(machine.ram().read(10), Ok(77));
}

#[test]
fn nested_memory_operand() {
    // ram[0] holds the address 5; [[0]] reads ram[5].
    let machine = run_records(vec![
        Instr::Mv {
            dst: mem(imm(0)),
            src: imm(5),
        },
        Instr::Mv {
            dst: mem(imm(5)),
            src: imm(99),
        },
        Instr::Mv {
            dst: reg(S0),
            src: mem(mem(imm(0))),
        },
    ]);
    assert_eq!(machine.register(Reg::S0), 99);
}

#[test]
fn write_within_range_succeeds_and_sticks() {
    let machine = run_records(vec![
        Instr::Mv {
            dst: mem(imm(255)),
            src: imm(31),
        },
        Instr::Mv {
            dst: mem(imm(0)),
            src: imm(32),
        },
    ]);
    assert_eq!(machine.ram().read(255), Ok(31));
    assert_eq!(machine.ram().read(0), Ok(32));
}

#[test]
fn read_out_of_range_faults() {
    let mut machine = machine_with(vec![Instr::Mv {
        dst: reg(S0),
        src: mem(imm(256)),
    }]);
    assert_eq!(
        machine.run(),
        Err(ExecError::new(0, Fault::BadMemoryAccess(256)))
    );
}

#[test]
fn write_out_of_range_faults() {
    let mut machine = machine_with(vec![Instr::Mv {
        dst: mem(imm(-1)),
        src: imm(1),
    }]);
    assert_eq!(
        machine.run(),
        Err(ExecError::new(0, Fault::BadMemoryAccess(-1)))
    );
}

#[test]
fn immediate_destination_faults() {
    let mut machine = machine_with(vec![Instr::Mv {
        dst: imm(1),
        src: imm(2),
    }]);
    assert_eq!(
        machine.run(),
        Err(ExecError::new(0, Fault::StoreToImmediate))
    );
}
