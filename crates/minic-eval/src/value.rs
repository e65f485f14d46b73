//! Runtime values and fixed-width integer arithmetic.
//!
//! All arithmetic is carried out in `i128` and then narrowed into the
//! configured [`IntWidth`] under the configured [`OverflowPolicy`]. Since
//! both operands are at most 64 bits wide the intermediate never overflows.

use std::fmt;

use minic_types::ast::BinOp;
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, EvalResult};

/// A MiniC runtime value: a signed integer within the run's configured width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Value(i64);

impl Value {
    pub const FALSE: Value = Value(0);
    pub const TRUE: Value = Value(1);

    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    pub fn from_bool(b: bool) -> Self {
        if b {
            Self::TRUE
        } else {
            Self::FALSE
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Value> for i64 {
    fn from(value: Value) -> Self {
        value.0
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Width & overflow policy
// ══════════════════════════════════════════════════════════════════════════════

/// Bit width of the signed integer domain, between 2 and 64 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct IntWidth(u32);

impl IntWidth {
    pub const I8: IntWidth = IntWidth(8);
    pub const I16: IntWidth = IntWidth(16);
    pub const I32: IntWidth = IntWidth(32);
    pub const I64: IntWidth = IntWidth(64);

    pub fn new(bits: u32) -> Option<Self> {
        (2..=64).contains(&bits).then_some(Self(bits))
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn min(self) -> i64 {
        (-(1i128 << (self.0 - 1))) as i64
    }

    pub fn max(self) -> i64 {
        ((1i128 << (self.0 - 1)) - 1) as i64
    }

    pub fn contains(self, raw: i128) -> bool {
        (i128::from(self.min())..=i128::from(self.max())).contains(&raw)
    }

    /// Two's-complement wraparound of `raw` into this width.
    pub fn wrap(self, raw: i128) -> i64 {
        let modulus = 1i128 << self.0;
        let r = raw.rem_euclid(modulus);
        let signed = if r > i128::from(self.max()) { r - modulus } else { r };
        signed as i64
    }
}

impl Default for IntWidth {
    fn default() -> Self {
        Self::I64
    }
}

impl TryFrom<u32> for IntWidth {
    type Error = String;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        Self::new(bits).ok_or_else(|| format!("integer width must be 2..=64 bits, got {bits}"))
    }
}

impl From<IntWidth> for u32 {
    fn from(width: IntWidth) -> Self {
        width.0
    }
}

/// What happens when a result does not fit the configured width.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Two's-complement wraparound.
    #[default]
    Wrap,
    /// Abort the run with an integer overflow error.
    Trap,
}

// ══════════════════════════════════════════════════════════════════════════════
// Arithmetic
// ══════════════════════════════════════════════════════════════════════════════

/// Integer arithmetic for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arithmetic {
    width: IntWidth,
    policy: OverflowPolicy,
}

impl Arithmetic {
    pub fn new(width: IntWidth, policy: OverflowPolicy) -> Self {
        Self { width, policy }
    }

    pub fn width(&self) -> IntWidth {
        self.width
    }

    /// Narrow an exact intermediate result into the configured width.
    pub fn normalize(&self, raw: i128) -> EvalResult<Value> {
        match self.policy {
            OverflowPolicy::Wrap => Ok(Value(self.width.wrap(raw))),
            OverflowPolicy::Trap if self.width.contains(raw) => Ok(Value(raw as i64)),
            OverflowPolicy::Trap => Err(EvalError::IntegerOverflow {
                bits: self.width.bits(),
            }),
        }
    }

    /// Literal from the program, narrowed like any other result.
    pub fn literal(&self, value: i64) -> EvalResult<Value> {
        self.normalize(i128::from(value))
    }

    /// Apply a binary operator to already evaluated operands.
    ///
    /// Division and remainder truncate toward zero. Comparisons and the
    /// logical operators yield `1` or `0`; `&&`/`||` here are the strict
    /// forms, short-circuiting is the evaluator's job.
    pub fn apply(&self, op: BinOp, lhs: Value, rhs: Value) -> EvalResult<Value> {
        let a = i128::from(lhs.0);
        let b = i128::from(rhs.0);
        let raw = match op {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div | BinOp::Rem if b == 0 => return Err(EvalError::DivisionByZero),
            BinOp::Div => a / b,
            BinOp::Rem => a % b,
            BinOp::Eq => return Ok(Value::from_bool(a == b)),
            BinOp::NotEq => return Ok(Value::from_bool(a != b)),
            BinOp::Less => return Ok(Value::from_bool(a < b)),
            BinOp::LessEq => return Ok(Value::from_bool(a <= b)),
            BinOp::Greater => return Ok(Value::from_bool(a > b)),
            BinOp::GreaterEq => return Ok(Value::from_bool(a >= b)),
            BinOp::And => return Ok(Value::from_bool(a != 0 && b != 0)),
            BinOp::Or => return Ok(Value::from_bool(a != 0 || b != 0)),
        };
        self.normalize(raw)
    }
}

impl Default for Arithmetic {
    fn default() -> Self {
        Self::new(IntWidth::default(), OverflowPolicy::default())
    }
}
