use crate::test::*;
use crate::*;
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn in_ors_shifted_input_into_destination() {
    let mut machine = machine_with(vec![
        Instr::In {
            dst: reg(S0),
            port: port(0),
            shift: 0,
        },
        Instr::In {
            dst: reg(S0),
            port: port(1),
            shift: 4,
        },
    ]);
    machine.set_input(0x5);
    machine.run().unwrap();

    assert_eq!(machine.register(Reg::S0), 0x55);
}

#[test]
fn in_requires_a_zeroed_destination() {
    let mut machine = machine_with(vec![
        Instr::MvRegImm { rd: S0, imm: 0x0F },
        Instr::In {
            dst: reg(S0),
            port: port(0),
            shift: 0,
        },
    ]);
    machine.set_input(0x30);
    machine.run().unwrap();

    assert_eq!(machine.register(Reg::S0), 0x3F);
}

#[test]
fn out_writes_shifted_source_to_output() {
    let machine = run_records(vec![
        Instr::MvRegImm { rd: S0, imm: 0x44 },
        Instr::Out {
            port: port(0),
            src: reg(S0),
            shift: 2,
        },
    ]);
    assert_eq!(machine.output(), 0x11);
}

#[test]
fn sync_exits_the_step_loop_and_calls_the_handler() {
    // loop: c+ s0 s0 1; sync; j loop
    let mut machine = machine_with(vec![
        Instr::AddRegRegImm {
            rd: S0,
            rs: S0,
            imm: 1,
        },
        Instr::Sync,
        Instr::Jmp { target: target(0) },
    ]);

    let syncs = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&syncs);
    machine.set_io_handler(move |input: &mut Word, output: Word| {
        assert_eq!(output, 0);
        *input = 42;
        counter.set(counter.get() + 1);
    });

    for _ in 0..10 {
        assert_eq!(machine.steps(1000), Ok(true));
    }

    assert_eq!(machine.register(Reg::S0), 10);
    assert_eq!(syncs.get(), 10);
    // The guest never executes `out`, and it ignores the fed input.
    assert_eq!(machine.output(), 0);
    assert_eq!(machine.input(), 42);
}

#[test]
fn handler_input_is_visible_to_the_guest() {
    let mut machine = machine_with(vec![
        Instr::Sync,
        Instr::In {
            dst: reg(S0),
            port: port(0),
            shift: 0,
        },
    ]);
    machine.set_io_handler(|input: &mut Word, _output: Word| {
        *input = 13;
    });

    // First grant stops right after the sync.
    assert_eq!(machine.steps(100), Ok(true));
    assert_eq!(machine.pc(), 1);

    machine.run().unwrap();
    assert_eq!(machine.register(Reg::S0), 13);
}

#[test]
fn sync_without_handler_still_yields() {
    let mut machine = machine_with(vec![Instr::Sync, Instr::MvRegImm { rd: S0, imm: 1 }]);

    assert_eq!(machine.steps(100), Ok(true));
    assert_eq!(machine.register(Reg::S0), 0);
    machine.run().unwrap();
    assert_eq!(machine.register(Reg::S0), 1);
}
