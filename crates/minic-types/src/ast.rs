//! AST node types for MiniC programs.
//!
//! The front end produces these nodes; the evaluator consumes them. Nodes
//! carry no source locations. Every node is (de)serializable so a front end
//! written in any language can hand a program over as JSON.
//!
//! Enums are internally tagged with a `kind` field:
//!
//! ```text
//! { "kind": "binary", "op": "+", "left": { "kind": "var", "name": "n" },
//!   "right": { "kind": "int", "value": 1 } }
//! ```

use serde::{Deserialize, Serialize};

// ══════════════════════════════════════════════════════════════════════════════
// Functions
// ══════════════════════════════════════════════════════════════════════════════

/// Declared result of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnType {
    Int,
    Void,
}

impl ReturnType {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Void => "void",
        }
    }
}

/// `int name(int a, int b) { body }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    /// Parameter names, in call order. Every parameter is an `int`.
    #[serde(default)]
    pub params: Vec<String>,
    pub returns: ReturnType,
    pub body: Block,
}

impl Function {
    pub fn new(
        name: impl Into<String>,
        params: &[&str],
        returns: ReturnType,
        body: impl Into<Block>,
    ) -> Self {
        Self {
            name: name.into(),
            params: params.iter().map(|p| (*p).to_string()).collect(),
            returns,
            body: body.into(),
        }
    }

    /// An `int`-returning function.
    pub fn int(name: impl Into<String>, params: &[&str], body: impl Into<Block>) -> Self {
        Self::new(name, params, ReturnType::Int, body)
    }

    /// A `void` function.
    pub fn void(name: impl Into<String>, params: &[&str], body: impl Into<Block>) -> Self {
        Self::new(name, params, ReturnType::Void, body)
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// `{ statements... }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }
}

impl From<Vec<Stmt>> for Block {
    fn from(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }
}

/// Nested blocks are drained onto a worklist, so dropping deeply nested
/// statements does not recurse.
impl Drop for Block {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.stmts);
        while let Some(stmt) = pending.pop() {
            match stmt {
                Stmt::If {
                    mut then_block,
                    else_block,
                    ..
                } => {
                    pending.append(&mut then_block.stmts);
                    if let Some(mut else_block) = else_block {
                        pending.append(&mut else_block.stmts);
                    }
                }
                Stmt::While { mut body, .. } => pending.append(&mut body.stmts),
                _ => {}
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

/// A statement inside a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stmt {
    /// `int name;` introduces an unassigned binding in the current block.
    Declare { name: String },
    /// `name = value;`
    Assign { name: String, value: Expr },
    /// `if (condition) { .. } else { .. }`
    If {
        condition: Expr,
        then_block: Block,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        else_block: Option<Block>,
    },
    /// `while (condition) { .. }`
    While { condition: Expr, body: Block },
    /// `return value;` or `return;`
    Return {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Expr>,
    },
    /// `print(value);`, the observation primitive.
    Print { value: Expr },
    /// `f(args);`. The result of an `int` callee is discarded.
    Call(Call),
}

impl Stmt {
    pub fn declare(name: impl Into<String>) -> Self {
        Self::Declare { name: name.into() }
    }

    pub fn assign(name: impl Into<String>, value: Expr) -> Self {
        Self::Assign {
            name: name.into(),
            value,
        }
    }

    pub fn if_then(condition: Expr, then_block: impl Into<Block>) -> Self {
        Self::If {
            condition,
            then_block: then_block.into(),
            else_block: None,
        }
    }

    pub fn if_else(
        condition: Expr,
        then_block: impl Into<Block>,
        else_block: impl Into<Block>,
    ) -> Self {
        Self::If {
            condition,
            then_block: then_block.into(),
            else_block: Some(else_block.into()),
        }
    }

    pub fn while_loop(condition: Expr, body: impl Into<Block>) -> Self {
        Self::While {
            condition,
            body: body.into(),
        }
    }

    pub fn ret(value: Expr) -> Self {
        Self::Return { value: Some(value) }
    }

    pub fn ret_void() -> Self {
        Self::Return { value: None }
    }

    pub fn print(value: Expr) -> Self {
        Self::Print { value }
    }

    pub fn call(callee: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::Call(Call::new(callee, args))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

/// `callee(args...)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub callee: String,
    #[serde(default)]
    pub args: Vec<Expr>,
}

impl Call {
    pub fn new(callee: impl Into<String>, args: Vec<Expr>) -> Self {
        Self {
            callee: callee.into(),
            args,
        }
    }
}

/// An expression. Every expression evaluates to an integer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    /// Integer literal. Narrowed into the configured width at runtime.
    Int { value: i64 },
    /// Variable reference.
    Var { name: String },
    /// `left op right`
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Call of an `int` function used as a value.
    Call(Call),
}

impl Expr {
    pub fn int(value: i64) -> Self {
        Self::Int { value }
    }

    pub fn var(name: impl Into<String>) -> Self {
        Self::Var { name: name.into() }
    }

    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn call(callee: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::Call(Call::new(callee, args))
    }
}

/// Binary operators, serialized as their source symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    #[serde(rename = "||")]
    Or,
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = "<=")]
    LessEq,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = ">=")]
    GreaterEq,
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Rem,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Or => "||",
            Self::And => "&&",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Less => "<",
            Self::LessEq => "<=",
            Self::Greater => ">",
            Self::GreaterEq => ">=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
        }
    }

    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Eq
            | Self::NotEq
            | Self::Less
            | Self::LessEq
            | Self::Greater
            | Self::GreaterEq => 3,
            Self::Add | Self::Sub => 4,
            Self::Mul | Self::Div | Self::Rem => 5,
        }
    }

    /// `&&` and `||` evaluate their right operand only when needed.
    pub fn is_short_circuit(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}
