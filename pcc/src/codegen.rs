use crate::ast::{Expr, ExprKind, Stmt};
use crate::error::{Error, Result};
use pcpu::Word;
use std::collections::HashMap;
use std::fmt;

/// Variable name to memory slot, as assigned during lowering.
pub type VarMap = HashMap<String, u32>;

/// Location of an evaluated sub-expression, formatted straight into the
/// emitted assembly: a literal, or a `[slot]` memory operand.
#[derive(Clone, Copy)]
enum Value {
    Imm(Word),
    Slot(u32),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Value::Imm(value) => write!(f, "{}", value),
            Value::Slot(slot) => write!(f, "[{}]", slot),
        }
    }
}

/// Tree-walking code generator.
///
/// Variables and temporaries share one slot namespace: `var_count` is the
/// next slot for a new variable, `temp_count` the next transient slot.
/// The temp counter falls back to `var_count` after every statement so
/// transient slots are reused.
pub struct CodeGen {
    vars: VarMap,
    var_count: u32,
    temp_count: u32,
    label_count: u32,
    lines: Vec<String>,
}

impl CodeGen {
    pub fn new() -> CodeGen {
        CodeGen {
            vars: HashMap::new(),
            var_count: 0,
            temp_count: 0,
            label_count: 0,
            lines: Vec::new(),
        }
    }

    pub fn lower(mut self, program: &Stmt) -> Result<(String, VarMap)> {
        self.stmt(program)?;

        let mut assembly = self.lines.join("\n");
        assembly.push('\n');
        Ok((assembly, self.vars))
    }

    fn emit(&mut self, line: String) {
        self.lines.push(line);
    }

    fn alloc_temp(&mut self) -> u32 {
        let slot = self.temp_count;
        self.temp_count += 1;
        slot
    }

    fn alloc_label(&mut self) -> u32 {
        let label = self.label_count;
        self.label_count += 1;
        label
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Seq(stmts) => {
                for stmt in stmts {
                    self.stmt(stmt)?;
                }
                return Ok(());
            }

            Stmt::Assign { name, value, .. } => {
                let value = self.expr(value)?;
                let slot = match self.vars.get(name) {
                    Some(slot) => *slot,
                    None => {
                        let slot = self.var_count;
                        self.var_count += 1;
                        self.vars.insert(name.clone(), slot);
                        slot
                    }
                };
                self.emit(format!("mv [{}] {}", slot, value));
            }

            Stmt::If { cond, body } => {
                let cond = self.expr(cond)?;
                let label = self.alloc_label();
                self.emit(format!("b== {} 0 l{}_ifend", cond, label));
                self.stmt(body)?;
                self.emit(format!("l{}_ifend:", label));
            }

            Stmt::While { cond, body } => {
                let label = self.alloc_label();
                self.emit(format!("j l{}_condi", label));
                self.emit(format!("l{}_loop:", label));
                self.stmt(body)?;
                self.emit(format!("l{}_condi:", label));
                let cond = self.expr(cond)?;
                self.emit(format!("b!= {} 0 l{}_loop", cond, label));
            }
        }

        self.temp_count = self.var_count;
        Ok(())
    }

    fn expr(&mut self, expr: &Expr) -> Result<Value> {
        match &expr.kind {
            ExprKind::Number(value) => Ok(Value::Imm(*value)),

            ExprKind::Field(name) => match self.vars.get(name) {
                Some(slot) => Ok(Value::Slot(*slot)),
                None => Err(Error::new(
                    expr.row,
                    expr.col,
                    format!("undefined variable \"{}\"", name),
                )),
            },

            ExprKind::Binary { op, lhs, rhs } => {
                let left = self.expr(lhs)?;
                let right = self.expr(rhs)?;
                let slot = self.alloc_temp();
                self.emit(format!("{} [{}] {} {}", op.mnemonic(), slot, left, right));
                Ok(Value::Slot(slot))
            }

            ExprKind::Call { name, args } => {
                if name != "read" {
                    return Err(Error::new(
                        expr.row,
                        expr.col,
                        format!("unknown function \"{}\"", name),
                    ));
                }
                if args.len() != 1 {
                    return Err(Error::new(
                        expr.row,
                        expr.col,
                        "read takes exactly one argument".to_string(),
                    ));
                }
                let port = match args[0].kind {
                    ExprKind::Number(port) if port >= 0 && port <= Word::from(u8::max_value()) => {
                        port
                    }
                    ExprKind::Number(_) => {
                        return Err(Error::new(
                            args[0].row,
                            args[0].col,
                            "port id out of range".to_string(),
                        ));
                    }
                    _ => {
                        return Err(Error::new(
                            args[0].row,
                            args[0].col,
                            "read argument must be an integer literal".to_string(),
                        ));
                    }
                };

                // `in` ORs into its destination, so the slot is cleared first.
                let slot = self.alloc_temp();
                self.emit(format!("mv [{}] 0", slot));
                self.emit(format!("in [{}] {}", slot, port));
                Ok(Value::Slot(slot))
            }
        }
    }
}

impl Default for CodeGen {
    fn default() -> CodeGen {
        CodeGen::new()
    }
}
