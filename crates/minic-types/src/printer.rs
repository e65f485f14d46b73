//! Pretty printer for MiniC programs.
//!
//! `Display` implementations render C-like source. A child binary
//! expression is parenthesized when its precedence is not higher than its
//! parent's, so `(a + b) + c` prints with parentheses and `a + b * c` without.

use std::fmt::{self, Display};

use crate::ast::*;
use crate::program::{Program, PRINT};
use crate::stack::ensure_sufficient_stack;

const INDENT: &str = "  ";

struct Printer {
    buffer: String,
    indent_level: usize,
}

impl Printer {
    fn new() -> Self {
        Self {
            buffer: String::new(),
            indent_level: 0,
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent_level {
            self.buffer.push_str(INDENT);
        }
        self.buffer.push_str(text);
        self.buffer.push('\n');
    }

    fn function(&mut self, function: &Function) {
        let params: Vec<String> = function.params.iter().map(|p| format!("int {p}")).collect();
        self.line(&format!(
            "{} {}({}) {{",
            function.returns.keyword(),
            function.name,
            params.join(", ")
        ));
        self.body(&function.body);
        self.line("}");
    }

    fn body(&mut self, block: &Block) {
        ensure_sufficient_stack(|| {
            self.indent_level += 1;
            for stmt in &block.stmts {
                self.stmt(stmt);
            }
            self.indent_level -= 1;
        });
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Declare { name } => self.line(&format!("int {name};")),
            Stmt::Assign { name, value } => self.line(&format!("{name} = {value};")),
            Stmt::If {
                condition,
                then_block,
                else_block,
            } => {
                self.line(&format!("if ({condition}) {{"));
                self.body(then_block);
                if let Some(else_block) = else_block {
                    self.line("} else {");
                    self.body(else_block);
                }
                self.line("}");
            }
            Stmt::While { condition, body } => {
                self.line(&format!("while ({condition}) {{"));
                self.body(body);
                self.line("}");
            }
            Stmt::Return { value: Some(value) } => self.line(&format!("return {value};")),
            Stmt::Return { value: None } => self.line("return;"),
            Stmt::Print { value } => self.line(&format!("{PRINT}({value});")),
            Stmt::Call(call) => self.line(&format!("{call};")),
        }
    }

    fn finish(self) -> String {
        self.buffer
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut printer = Printer::new();
        for (i, function) in self.functions().iter().enumerate() {
            if i > 0 {
                printer.buffer.push('\n');
            }
            printer.function(function);
        }
        f.write_str(&printer.finish())
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut printer = Printer::new();
        printer.function(self);
        f.write_str(&printer.finish())
    }
}

impl Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.callee)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

impl Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Int { value } => write!(f, "{value}"),
            Expr::Var { name } => f.write_str(name),
            Expr::Binary { op, left, right } => ensure_sufficient_stack(|| {
                write_operand(f, *op, left)?;
                write!(f, " {op} ")?;
                write_operand(f, *op, right)
            }),
            Expr::Call(call) => write!(f, "{call}"),
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, parent: BinOp, child: &Expr) -> fmt::Result {
    match child {
        Expr::Binary { op, .. } if parent.precedence() >= op.precedence() => {
            write!(f, "({child})")
        }
        _ => write!(f, "{child}"),
    }
}
