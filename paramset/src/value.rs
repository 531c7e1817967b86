//! Raw and resolved field values.
//!
//! A registry field holds one [`Value`]. Text values may be expressions with
//! `${...}` placeholders; everything else is terminal and copies through
//! resolution unchanged. Arithmetic follows the usual numeric tower:
//! integers promote to floats on demand, division always yields a float, and
//! scalars broadcast over arrays elementwise.

use std::fmt;

use crate::array::{fmt_f64, NdArray};
use crate::error::Error;

/// A parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    /// Ordered, possibly nested sequence.
    Seq(Vec<Value>),
    /// N-dimensional numeric array.
    Array(NdArray),
    /// Declared but not given a value (`None` in flat files).
    Undefined,
}

/// Binary operators understood by the expression sandbox.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Rem,
    Pow,
    /// Matrix multiply; only defined for two `Array` operands.
    MatMul,
}

impl Default for Value {
    fn default() -> Self {
        Value::Undefined
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Float(_) => "real",
            Value::Text(_) => "text",
            Value::Seq(_) => "sequence",
            Value::Array(_) => "array",
            Value::Undefined => "undefined",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view, promoting `Int` to `f64` where needed.
    fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    /// Compact one-line form for display tables: arrays shrink to their
    /// Matlab-style summary, everything else uses `Display`.
    pub fn brief(&self) -> String {
        match self {
            Value::Array(a) => a.format_brief(),
            other => other.to_string(),
        }
    }

    /// Numeric array view. Arrays pass through; flat numeric sequences and
    /// uniformly nested ones convert, so list literals work where an array
    /// is required.
    pub fn to_array(&self) -> Option<NdArray> {
        match self {
            Value::Array(a) => Some(a.clone()),
            Value::Seq(items) => seq_to_array(items),
            _ => None,
        }
    }

    pub fn neg(&self) -> Result<Value, Error> {
        match self {
            Value::Int(n) => Ok(Value::Int(-n)),
            Value::Float(x) => Ok(Value::Float(-x)),
            Value::Array(a) => Ok(Value::Array(a.map(|x| -x))),
            other => Err(Error::Evaluation(format!(
                "cannot negate {}",
                other.type_name()
            ))),
        }
    }

    /// Apply a binary operator with numeric-tower promotion and
    /// scalar/array broadcast.
    pub fn binary(op: ArithOp, lhs: &Value, rhs: &Value) -> Result<Value, Error> {
        use Value::*;

        // Matrix multiply is only defined between arrays (or sequences
        // convertible to one); scalars never broadcast through it.
        if op == ArithOp::MatMul {
            return match (lhs.to_array(), rhs.to_array()) {
                (Some(a), Some(b)) => Ok(Array(a.matmul(&b)?)),
                _ => Err(Error::Evaluation(format!(
                    "matrix multiply requires two arrays, got {} and {}",
                    lhs.type_name(),
                    rhs.type_name()
                ))),
            };
        }

        match (lhs, rhs) {
            // Array with array: elementwise on matching shapes.
            (Array(a), Array(b)) => {
                check_zero_divisor_array(op, b.data())?;
                Ok(Array(a.zip_with(b, |x, y| float_op(op, x, y))?))
            }
            // Scalar broadcast, either side.
            (Array(a), s) if s.as_float().is_some() => {
                let y = s.as_float().unwrap();
                check_zero_divisor(op, y)?;
                Ok(Array(a.map(|x| float_op(op, x, y))))
            }
            (s, Array(b)) if s.as_float().is_some() => {
                let x = s.as_float().unwrap();
                check_zero_divisor_array(op, b.data())?;
                Ok(Array(b.map(|y| float_op(op, x, y))))
            }

            // Sequence and text structural operators.
            (Seq(a), Seq(b)) if op == ArithOp::Add => {
                let mut out = a.clone();
                out.extend(b.iter().cloned());
                Ok(Seq(out))
            }
            (Seq(a), Int(n)) if op == ArithOp::Mul => Ok(Seq(repeat_seq(a, *n))),
            (Int(n), Seq(b)) if op == ArithOp::Mul => Ok(Seq(repeat_seq(b, *n))),
            (Text(a), Text(b)) if op == ArithOp::Add => Ok(Text(format!("{a}{b}"))),
            (Text(a), Int(n)) if op == ArithOp::Mul => {
                Ok(Text(a.repeat((*n).max(0) as usize)))
            }

            // Plain numbers.
            _ => {
                let (x, y) = match (lhs.as_float(), rhs.as_float()) {
                    (Some(x), Some(y)) => (x, y),
                    _ => {
                        return Err(Error::Evaluation(format!(
                            "unsupported operand types: {} {} {}",
                            lhs.type_name(),
                            op_symbol(op),
                            rhs.type_name()
                        )))
                    }
                };
                check_zero_divisor(op, y)?;
                let float_result = lhs.is_float() || rhs.is_float();
                numeric(op, x, y, float_result, lhs, rhs)
            }
        }
    }
}

/// Scalar result with int/float selection matching the usual rules:
/// division is always float, the other operators stay integral when both
/// operands are integers.
fn numeric(
    op: ArithOp,
    x: f64,
    y: f64,
    float_result: bool,
    lhs: &Value,
    rhs: &Value,
) -> Result<Value, Error> {
    match op {
        ArithOp::Div => Ok(Value::Float(x / y)),
        ArithOp::Pow => {
            if let (Value::Int(a), Value::Int(b)) = (lhs, rhs) {
                if *b >= 0 {
                    if let Ok(e) = u32::try_from(*b) {
                        if let Some(v) = a.checked_pow(e) {
                            return Ok(Value::Int(v));
                        }
                    }
                }
            }
            Ok(Value::Float(x.powf(y)))
        }
        _ => {
            let r = float_op(op, x, y);
            if float_result {
                Ok(Value::Float(r))
            } else {
                Ok(Value::Int(r as i64))
            }
        }
    }
}

fn float_op(op: ArithOp, x: f64, y: f64) -> f64 {
    match op {
        ArithOp::Add => x + y,
        ArithOp::Sub => x - y,
        ArithOp::Mul => x * y,
        ArithOp::Div => x / y,
        ArithOp::FloorDiv => (x / y).floor(),
        // Remainder takes the sign of the divisor, as in `-7 % 3 == 2`.
        ArithOp::Rem => x - y * (x / y).floor(),
        ArithOp::Pow => x.powf(y),
        ArithOp::MatMul => unreachable!("matmul handled before broadcast"),
    }
}

fn divides(op: ArithOp) -> bool {
    matches!(op, ArithOp::Div | ArithOp::FloorDiv | ArithOp::Rem)
}

fn check_zero_divisor(op: ArithOp, y: f64) -> Result<(), Error> {
    if divides(op) && y == 0.0 {
        Err(Error::Evaluation("division by zero".into()))
    } else {
        Ok(())
    }
}

fn check_zero_divisor_array(op: ArithOp, data: &[f64]) -> Result<(), Error> {
    if divides(op) && data.iter().any(|&y| y == 0.0) {
        Err(Error::Evaluation("division by zero".into()))
    } else {
        Ok(())
    }
}

fn seq_to_array(items: &[Value]) -> Option<NdArray> {
    if items.is_empty() {
        return None;
    }
    if items.iter().all(|v| matches!(v, Value::Int(_) | Value::Float(_))) {
        let data = items.iter().filter_map(|v| v.as_float()).collect();
        return Some(NdArray::from_vec(data));
    }
    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Seq(inner)
                if inner
                    .iter()
                    .all(|v| matches!(v, Value::Int(_) | Value::Float(_))) =>
            {
                rows.push(inner.iter().filter_map(|v| v.as_float()).collect());
            }
            _ => return None,
        }
    }
    NdArray::from_rows(rows).ok()
}

fn repeat_seq(items: &[Value], n: i64) -> Vec<Value> {
    let n = n.max(0) as usize;
    let mut out = Vec::with_capacity(items.len() * n);
    for _ in 0..n {
        out.extend(items.iter().cloned());
    }
    out
}

fn op_symbol(op: ArithOp) -> &'static str {
    match op {
        ArithOp::Add => "+",
        ArithOp::Sub => "-",
        ArithOp::Mul => "*",
        ArithOp::Div => "/",
        ArithOp::FloorDiv => "//",
        ArithOp::Rem => "%",
        ArithOp::Pow => "**",
        ArithOp::MatMul => "@",
    }
}

/// Substitution-ready text form: what a `${name}` span expands to. Sequences
/// and arrays serialize as nested lists re-parseable by the expression
/// grammar; `Undefined` prints as `None`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{}", fmt_f64(*x)),
            Value::Text(s) => write!(f, "{s}"),
            Value::Seq(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match v {
                        Value::Text(s) => {
                            write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))?
                        }
                        other => write!(f, "{other}")?,
                    }
                }
                write!(f, "]")
            }
            Value::Array(a) => write!(f, "{a}"),
            Value::Undefined => write!(f, "None"),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Seq(items)
    }
}

impl From<NdArray> for Value {
    fn from(a: NdArray) -> Self {
        Value::Array(a)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn bin(op: ArithOp, a: impl Into<Value>, b: impl Into<Value>) -> Result<Value, Error> {
        Value::binary(op, &a.into(), &b.into())
    }

    #[test]
    fn integer_arithmetic() {
        assert_eq!(bin(ArithOp::Add, 2, 3).unwrap(), Value::Int(5));
        assert_eq!(bin(ArithOp::Sub, 10, 4).unwrap(), Value::Int(6));
        assert_eq!(bin(ArithOp::Mul, 3, 4).unwrap(), Value::Int(12));
        assert_eq!(bin(ArithOp::FloorDiv, 10, 3).unwrap(), Value::Int(3));
        assert_eq!(bin(ArithOp::Rem, 10, 3).unwrap(), Value::Int(1));
        assert_eq!(bin(ArithOp::Pow, 2, 10).unwrap(), Value::Int(1024));
    }

    #[test]
    fn division_promotes_to_float() {
        assert_eq!(bin(ArithOp::Div, 10, 4).unwrap(), Value::Float(2.5));
        assert_eq!(bin(ArithOp::Div, 10, 2).unwrap(), Value::Float(5.0));
    }

    #[test]
    fn division_by_zero() {
        assert!(bin(ArithOp::Div, 1, 0).is_err());
        assert!(bin(ArithOp::Rem, 1, 0).is_err());
        assert!(bin(ArithOp::FloorDiv, 1.0, 0.0).is_err());
    }

    #[test]
    fn remainder_sign_follows_divisor() {
        assert_eq!(bin(ArithOp::Rem, -7, 3).unwrap(), Value::Int(2));
        assert_eq!(bin(ArithOp::Rem, 7, -3).unwrap(), Value::Int(-2));
    }

    #[test]
    fn negative_exponent_is_float() {
        assert_eq!(bin(ArithOp::Pow, 2, -1).unwrap(), Value::Float(0.5));
    }

    #[test]
    fn scalar_broadcast() {
        let a = Value::Array(NdArray::from_vec(vec![1.0, 2.0]));
        let r = Value::binary(ArithOp::Mul, &a, &Value::Int(3)).unwrap();
        match r {
            Value::Array(arr) => assert_eq!(arr.data(), &[3.0, 6.0]),
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn matmul_requires_arrays() {
        assert!(bin(ArithOp::MatMul, 2, 3).is_err());
        let row = NdArray::from_rows(vec![vec![1.0, 2.0]]).unwrap();
        let col = row.transpose();
        let r = Value::binary(
            ArithOp::MatMul,
            &Value::Array(col),
            &Value::Array(row),
        )
        .unwrap();
        match r {
            Value::Array(a) => assert_eq!(a.shape(), &[2, 2]),
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn seq_concat_and_repeat() {
        let a = Value::Seq(vec![Value::Int(1)]);
        let b = Value::Seq(vec![Value::Int(2)]);
        assert_eq!(
            Value::binary(ArithOp::Add, &a, &b).unwrap(),
            Value::Seq(vec![Value::Int(1), Value::Int(2)])
        );
        assert_eq!(
            Value::binary(ArithOp::Mul, &a, &Value::Int(2)).unwrap(),
            Value::Seq(vec![Value::Int(1), Value::Int(1)])
        );
    }

    #[test]
    fn text_ops() {
        assert_eq!(bin(ArithOp::Add, "ab", "cd").unwrap(), Value::Text("abcd".into()));
        assert!(bin(ArithOp::Add, "ab", 1).is_err());
    }

    #[test]
    fn display_forms() {
        assert_eq!(Value::Int(3).to_string(), "3");
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::Undefined.to_string(), "None");
        let seq = Value::Seq(vec![Value::Int(1), Value::Text("test".into())]);
        assert_eq!(seq.to_string(), "[1, \"test\"]");
    }

    #[test]
    fn neg_variants() {
        assert_eq!(Value::Int(5).neg().unwrap(), Value::Int(-5));
        assert_eq!(Value::Float(1.5).neg().unwrap(), Value::Float(-1.5));
        assert!(Value::Text("x".into()).neg().is_err());
    }
}
