use crate::int_util::process_int;
use crate::labels::{define_label, LabelMap};
use crate::parser::Rule;
use crate::{new_parser_error, Result, SourceMap};
use matches::debug_assert_matches;
use pcpu::{constants, register_index, AluFunct, Cond, Instr, Operand, Reg, Word};
use pest::iterators::Pair;
use pest::Span;
use std::collections::HashMap;
use std::str::FromStr;

/// Recognized opcode, with the operand swap already decided: `c>`, `c<=`,
/// `b>` and `b<=` carry no function of their own and assemble as their
/// mirrored counterpart with swapped value operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mnemonic {
    Compute(AluFunct, bool),
    Branch(Cond, bool),
    Mv,
    Push,
    Pop,
    Jump,
    Apc,
    In,
    Out,
    Sync,
}

fn mnemonic_from_str(text: &str) -> Mnemonic {
    match text {
        "c+" => Mnemonic::Compute(AluFunct::ADD, false),
        "c-" => Mnemonic::Compute(AluFunct::SUB, false),
        "c&" => Mnemonic::Compute(AluFunct::AND, false),
        "c|" => Mnemonic::Compute(AluFunct::OR, false),
        "c^" => Mnemonic::Compute(AluFunct::XOR, false),
        "c<<" => Mnemonic::Compute(AluFunct::SLL, false),
        "c>>" => Mnemonic::Compute(AluFunct::SRA, false),
        "c>>>" => Mnemonic::Compute(AluFunct::SRL, false),
        "c==" => Mnemonic::Compute(AluFunct::SEQ, false),
        "c!=" => Mnemonic::Compute(AluFunct::SNE, false),
        "c<" => Mnemonic::Compute(AluFunct::SLT, false),
        "c>=" => Mnemonic::Compute(AluFunct::SGE, false),
        "c>" => Mnemonic::Compute(AluFunct::SLT, true),
        "c<=" => Mnemonic::Compute(AluFunct::SGE, true),
        "b==" => Mnemonic::Branch(Cond::EQ, false),
        "b!=" => Mnemonic::Branch(Cond::NE, false),
        "b<" => Mnemonic::Branch(Cond::LT, false),
        "b>=" => Mnemonic::Branch(Cond::GE, false),
        "b>" => Mnemonic::Branch(Cond::LT, true),
        "b<=" => Mnemonic::Branch(Cond::GE, true),
        "mv" => Mnemonic::Mv,
        "push" => Mnemonic::Push,
        "pop" => Mnemonic::Pop,
        "j" => Mnemonic::Jump,
        "apc" => Mnemonic::Apc,
        "in" => Mnemonic::In,
        "out" => Mnemonic::Out,
        "sync" => Mnemonic::Sync,
        _ => unreachable!(),
    }
}

#[derive(Debug, PartialEq)]
pub struct ParsedOperand<'i> {
    span: Span<'i>,
    kind: OperandKind<'i>,
}

#[derive(Debug, PartialEq)]
pub enum OperandKind<'i> {
    Imm(Word),
    Reg(u8),
    Mem(Box<ParsedOperand<'i>>),
    Label(Span<'i>),
}

#[derive(Debug, PartialEq)]
pub struct ParsedInstruction<'i> {
    span: Span<'i>,
    mnemonic: Mnemonic,
    operands: Vec<ParsedOperand<'i>>,
}

fn process_register(pair: &Pair<Rule>) -> Result<u8> {
    let lowered = pair.as_str().to_lowercase();

    let index = if let Some(digit) = lowered.strip_prefix('x') {
        digit.parse::<usize>().unwrap()
    } else {
        let reg = Reg::from_str(&lowered)
            .map_err(|err| new_parser_error(pair.as_span(), format!("{}", err)))?;
        register_index(reg)
    };

    Ok(index as u8)
}

fn process_operand(pair: Pair<Rule>) -> Result<ParsedOperand> {
    debug_assert_matches!(pair.as_rule(), Rule::operand);
    process_operand_inner(pair.into_inner().next().unwrap())
}

fn process_operand_inner(pair: Pair<Rule>) -> Result<ParsedOperand> {
    let span = pair.as_span();
    let kind = match pair.as_rule() {
        Rule::int => OperandKind::Imm(process_int(&pair)?),
        Rule::register => OperandKind::Reg(process_register(&pair)?),
        Rule::mem => OperandKind::Mem(Box::new(process_operand_inner(
            pair.into_inner().next().unwrap(),
        )?)),
        Rule::identifier => OperandKind::Label(span.clone()),
        _ => unreachable!(),
    };

    Ok(ParsedOperand { span, kind })
}

/// Walks the parsed program, collecting instructions, the label table and
/// the source map in a single pass.
pub fn process_lines(
    pair: Pair<Rule>,
) -> Result<(Vec<ParsedInstruction>, LabelMap, SourceMap)> {
    debug_assert_matches!(pair.as_rule(), Rule::program);

    let mut instructions = Vec::new();
    let mut labels = HashMap::new();
    let mut source_map = Vec::new();

    for line in pair.into_inner() {
        match line.as_rule() {
            Rule::label => define_label(&mut labels, &line, instructions.len())?,
            Rule::instruction => {
                let span = line.as_span();
                if instructions.len() == constants::ROM_CAPACITY {
                    return Err(new_parser_error(
                        span,
                        format!(
                            "Program exceeds the maximum of {} instructions",
                            constants::ROM_CAPACITY
                        ),
                    ));
                }
                source_map.push(span.start_pos().line_col().0 as u32);

                let mut pairs = line.into_inner();
                let mnemonic = mnemonic_from_str(&pairs.next().unwrap().as_str().to_lowercase());
                let operands = pairs.map(process_operand).collect::<Result<Vec<_>>>()?;

                instructions.push(ParsedInstruction {
                    span,
                    mnemonic,
                    operands,
                });
            }
            Rule::EOI => {}
            _ => unreachable!(),
        }
    }

    Ok((instructions, labels, source_map))
}

fn to_operand(parsed: &ParsedOperand) -> Result<Operand> {
    match &parsed.kind {
        OperandKind::Imm(value) => Ok(Operand::Imm(*value)),
        OperandKind::Reg(index) => Ok(Operand::Reg(*index)),
        OperandKind::Mem(inner) => Ok(Operand::mem(to_operand(inner)?)),
        OperandKind::Label(_) => Err(new_parser_error(
            parsed.span.clone(),
            "Label is not a valid operand here".to_string(),
        )),
    }
}

fn to_destination(parsed: &ParsedOperand) -> Result<Operand> {
    let operand = to_operand(parsed)?;
    if !operand.is_writable() {
        return Err(new_parser_error(
            parsed.span.clone(),
            "Immediate operand cannot be a destination".to_string(),
        ));
    }
    Ok(operand)
}

fn to_immediate(parsed: &ParsedOperand) -> Result<Word> {
    match parsed.kind {
        OperandKind::Imm(value) => Ok(value),
        _ => Err(new_parser_error(
            parsed.span.clone(),
            "Expected an integer literal".to_string(),
        )),
    }
}

fn to_port(parsed: &ParsedOperand) -> Result<Operand> {
    let id = to_immediate(parsed)?;
    if id < 0 || id > Word::from(u8::max_value()) {
        return Err(new_parser_error(
            parsed.span.clone(),
            "Port id out of range".to_string(),
        ));
    }
    Ok(Operand::Port(id as u8))
}

fn to_shift(parsed: Option<&ParsedOperand>) -> Result<u32> {
    match parsed {
        None => Ok(0),
        Some(parsed) => {
            let shift = to_immediate(parsed)?;
            if shift < 0 || shift > 31 {
                return Err(new_parser_error(
                    parsed.span.clone(),
                    "Shift amount must be between 0 and 31".to_string(),
                ));
            }
            Ok(shift as u32)
        }
    }
}

fn resolve_target(labels: &LabelMap, parsed: &ParsedOperand) -> Result<usize> {
    match &parsed.kind {
        OperandKind::Label(span) => {
            let index = labels
                .get(span.as_str())
                .ok_or_else(|| new_parser_error(span.clone(), "Label not found".to_string()))?;
            // Compensates the dispatch loop's unconditional increment.
            Ok(index.wrapping_sub(1))
        }
        _ => Err(new_parser_error(
            parsed.span.clone(),
            "Expected a label".to_string(),
        )),
    }
}

fn check_operand_count(instr: &ParsedInstruction, min: usize, max: usize) -> Result<()> {
    let count = instr.operands.len();
    if count >= min && count <= max {
        return Ok(());
    }

    let expected = if min == max {
        format!("{}", min)
    } else if max == usize::max_value() {
        format!("at least {}", min)
    } else {
        format!("{} to {}", min, max)
    };

    Err(new_parser_error(
        instr.span.clone(),
        format!(
            "Wrong number of operands: expected {}, found {}",
            expected, count
        ),
    ))
}

/// Turns one parsed instruction into its executable record, resolving
/// labels and picking the specialized record for the hot operand shapes.
fn finalize_instruction(instr: &ParsedInstruction, labels: &LabelMap) -> Result<Instr> {
    let ops = &instr.operands;

    Ok(match instr.mnemonic {
        Mnemonic::Compute(funct, swap) => {
            check_operand_count(instr, 3, 3)?;
            let dst = to_destination(&ops[0])?;
            let (a, b) = if swap { (2, 1) } else { (1, 2) };
            let lhs = to_operand(&ops[a])?;
            let rhs = to_operand(&ops[b])?;

            match (funct, dst, lhs, rhs) {
                (AluFunct::ADD, Operand::Reg(rd), Operand::Reg(rs), Operand::Imm(imm))
                | (AluFunct::ADD, Operand::Reg(rd), Operand::Imm(imm), Operand::Reg(rs)) => {
                    Instr::AddRegRegImm { rd, rs, imm }
                }
                (funct, dst, lhs, rhs) => Instr::Alu {
                    funct,
                    dst,
                    lhs,
                    rhs,
                },
            }
        }

        Mnemonic::Branch(cond, swap) => {
            check_operand_count(instr, 3, 3)?;
            let target = resolve_target(labels, &ops[2])?;
            let (a, b) = if swap { (1, 0) } else { (0, 1) };
            let lhs = to_operand(&ops[a])?;
            let rhs = to_operand(&ops[b])?;

            match (lhs, rhs) {
                (Operand::Reg(rs1), Operand::Reg(rs2)) => Instr::BranchRegReg {
                    cond,
                    rs1,
                    rs2,
                    target,
                },
                (Operand::Reg(rs), Operand::Imm(imm)) => Instr::BranchRegImm {
                    cond,
                    rs,
                    imm,
                    target,
                },
                (Operand::Imm(imm), Operand::Reg(rs)) => Instr::BranchImmReg {
                    cond,
                    imm,
                    rs,
                    target,
                },
                (lhs, rhs) => Instr::Branch {
                    cond,
                    lhs,
                    rhs,
                    target,
                },
            }
        }

        Mnemonic::Mv => {
            check_operand_count(instr, 2, 2)?;
            let dst = to_destination(&ops[0])?;
            let src = to_operand(&ops[1])?;

            match (dst, src) {
                (Operand::Reg(rd), Operand::Imm(imm)) => Instr::MvRegImm { rd, imm },
                (dst, src) => Instr::Mv { dst, src },
            }
        }

        Mnemonic::Push => {
            check_operand_count(instr, 1, usize::max_value())?;
            Instr::Push {
                srcs: ops.iter().map(to_operand).collect::<Result<_>>()?,
            }
        }

        Mnemonic::Pop => {
            check_operand_count(instr, 1, usize::max_value())?;
            // Reversed here so execution can iterate forward and still
            // restore the values written by a matching push.
            let mut dsts = ops.iter().map(to_destination).collect::<Result<Vec<_>>>()?;
            dsts.reverse();
            Instr::Pop { dsts }
        }

        Mnemonic::Jump => {
            check_operand_count(instr, 1, 1)?;
            match &ops[0].kind {
                OperandKind::Label(_) => Instr::Jmp {
                    target: resolve_target(labels, &ops[0])?,
                },
                OperandKind::Reg(rs) => Instr::JmpReg { rs: *rs },
                _ => {
                    return Err(new_parser_error(
                        ops[0].span.clone(),
                        "Jump target must be a label or a register".to_string(),
                    ));
                }
            }
        }

        Mnemonic::Apc => {
            check_operand_count(instr, 2, 2)?;
            Instr::Apc {
                dst: to_destination(&ops[0])?,
                offset: to_immediate(&ops[1])?,
            }
        }

        Mnemonic::In => {
            check_operand_count(instr, 2, 3)?;
            Instr::In {
                dst: to_destination(&ops[0])?,
                port: to_port(&ops[1])?,
                shift: to_shift(ops.get(2))?,
            }
        }

        Mnemonic::Out => {
            check_operand_count(instr, 2, 3)?;
            Instr::Out {
                port: to_port(&ops[0])?,
                src: to_operand(&ops[1])?,
                shift: to_shift(ops.get(2))?,
            }
        }

        Mnemonic::Sync => {
            check_operand_count(instr, 0, 0)?;
            Instr::Sync
        }
    })
}

pub fn finalize_instructions(
    parsed: &[ParsedInstruction],
    labels: &LabelMap,
) -> Result<Vec<Instr>> {
    parsed
        .iter()
        .map(|instr| finalize_instruction(instr, labels))
        .collect()
}
