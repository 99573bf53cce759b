//! Operator semantics on par values.
//!
//! Operands arrive already coerced by the typer, so mixed `int`/`float`
//! pairs only show up for hand-built expressions; they are widened.

use mzn_ir::ast::{BinOpKind, UnOpKind};
use mzn_ir::Span;

use super::value::{ArrayValue, IntSet, Value};
use super::{EvalError, EvalErrorKind};

type EvalResult = Result<Value, EvalError>;

fn mismatch(op: BinOpKind, lhs: &Value, rhs: &Value, span: Span) -> EvalError {
    EvalError::new(
        EvalErrorKind::Unsupported,
        span,
        format!(
            "cannot evaluate `{}' on `{}' and `{}'",
            op.symbol(),
            lhs.kind_name(),
            rhs.kind_name()
        ),
    )
}

fn overflow(op: BinOpKind, span: Span) -> EvalError {
    EvalError::new(
        EvalErrorKind::Overflow,
        span,
        format!("integer overflow in `{}'", op.symbol()),
    )
}

pub(super) fn eval_binary(op: BinOpKind, lhs: Value, rhs: Value, span: Span) -> EvalResult {
    match (&lhs, &rhs) {
        (Value::Int(a), Value::Int(b)) => int_binary(op, *a, *b, span),
        (Value::Float(a), Value::Float(b)) => float_binary(op, *a, *b, span),
        (Value::Int(a), Value::Float(b)) => float_binary(op, widen(*a), *b, span),
        (Value::Float(a), Value::Int(b)) => float_binary(op, *a, widen(*b), span),
        (Value::Bool(a), Value::Bool(b)) => bool_binary(op, *a, *b)
            .ok_or_else(|| mismatch(op, &lhs, &rhs, span)),
        (Value::Str(a), Value::Str(b)) => match op {
            BinOpKind::PlusPlus => Ok(Value::Str(format!("{a}{b}"))),
            _ => compare(op, a.cmp(b)).ok_or_else(|| mismatch(op, &lhs, &rhs, span)),
        },
        (Value::Int(a), Value::Set(s)) if op == BinOpKind::In => Ok(Value::Bool(s.contains(*a))),
        (Value::Set(a), Value::Set(b)) => set_binary(op, a, b).ok_or_else(|| mismatch(op, &lhs, &rhs, span)),
        (Value::Array(a), Value::Array(b)) => array_binary(op, a, b).ok_or_else(|| mismatch(op, &lhs, &rhs, span)),
        (Value::Absent, _) | (_, Value::Absent) => match op {
            BinOpKind::Eq => Ok(Value::Bool(lhs == rhs)),
            BinOpKind::Nq => Ok(Value::Bool(lhs != rhs)),
            // absent values vanish in arithmetic
            BinOpKind::Plus | BinOpKind::Minus => Ok(if lhs == Value::Absent { rhs } else { lhs }),
            _ => Err(mismatch(op, &lhs, &rhs, span)),
        },
        _ => Err(mismatch(op, &lhs, &rhs, span)),
    }
}

#[expect(clippy::cast_precision_loss, reason = "int to float widening")]
pub(super) fn widen(i: i64) -> f64 {
    i as f64
}

fn compare(op: BinOpKind, ord: std::cmp::Ordering) -> Option<Value> {
    use std::cmp::Ordering::{Equal, Greater, Less};
    let b = match op {
        BinOpKind::Le => ord == Less,
        BinOpKind::Lq => ord != Greater,
        BinOpKind::Gr => ord == Greater,
        BinOpKind::Gq => ord != Less,
        BinOpKind::Eq => ord == Equal,
        BinOpKind::Nq => ord != Equal,
        _ => return None,
    };
    Some(Value::Bool(b))
}

fn int_binary(op: BinOpKind, a: i64, b: i64, span: Span) -> EvalResult {
    let checked = |r: Option<i64>| r.map(Value::Int).ok_or_else(|| overflow(op, span));
    match op {
        BinOpKind::Plus => checked(a.checked_add(b)),
        BinOpKind::Minus => checked(a.checked_sub(b)),
        BinOpKind::Mult => checked(a.checked_mul(b)),
        BinOpKind::IDiv | BinOpKind::Mod if b == 0 => Err(EvalError::new(
            EvalErrorKind::DivisionByZero,
            span,
            "division by zero",
        )),
        // truncating division, remainder takes the sign of the dividend
        BinOpKind::IDiv => checked(a.checked_div(b)),
        BinOpKind::Mod => checked(a.checked_rem(b)),
        BinOpKind::Pow => {
            if b < 0 {
                return match a {
                    1 => Ok(Value::Int(1)),
                    -1 => Ok(Value::Int(if b % 2 == 0 { 1 } else { -1 })),
                    _ => Err(EvalError::new(
                        EvalErrorKind::DivisionByZero,
                        span,
                        "negative power of an integer other than 1 or -1",
                    )),
                };
            }
            let exp = u32::try_from(b).map_err(|_| overflow(op, span))?;
            checked(a.checked_pow(exp))
        }
        BinOpKind::DotDot => Ok(Value::Set(IntSet::range(a, b))),
        BinOpKind::Div => float_binary(op, widen(a), widen(b), span),
        _ => compare(op, a.cmp(&b)).ok_or_else(|| mismatch(op, &Value::Int(a), &Value::Int(b), span)),
    }
}

fn float_binary(op: BinOpKind, a: f64, b: f64, span: Span) -> EvalResult {
    let v = match op {
        BinOpKind::Plus => a + b,
        BinOpKind::Minus => a - b,
        BinOpKind::Mult => a * b,
        BinOpKind::Div if b == 0.0 => {
            return Err(EvalError::new(
                EvalErrorKind::DivisionByZero,
                span,
                "division by zero",
            ))
        }
        BinOpKind::Div => a / b,
        BinOpKind::Pow => a.powf(b),
        _ => {
            return a
                .partial_cmp(&b)
                .and_then(|ord| compare(op, ord))
                .ok_or_else(|| mismatch(op, &Value::Float(a), &Value::Float(b), span))
        }
    };
    Ok(Value::Float(v))
}

fn bool_binary(op: BinOpKind, a: bool, b: bool) -> Option<Value> {
    let v = match op {
        BinOpKind::And => a && b,
        BinOpKind::Or => a || b,
        BinOpKind::Impl => !a || b,
        BinOpKind::RImpl => a || !b,
        BinOpKind::Equiv => a == b,
        BinOpKind::Xor => a != b,
        _ => return compare(op, a.cmp(&b)),
    };
    Some(Value::Bool(v))
}

fn set_binary(op: BinOpKind, a: &IntSet, b: &IntSet) -> Option<Value> {
    let v = match op {
        BinOpKind::Union => Value::Set(a.union(b)),
        BinOpKind::Intersect => Value::Set(a.intersect(b)),
        BinOpKind::Diff => Value::Set(a.diff(b)),
        BinOpKind::SymDiff => Value::Set(a.symdiff(b)),
        BinOpKind::Subset => Value::Bool(a.is_subset(b)),
        BinOpKind::Superset => Value::Bool(b.is_subset(a)),
        BinOpKind::Eq => Value::Bool(a == b),
        BinOpKind::Nq => Value::Bool(a != b),
        _ => return None,
    };
    Some(v)
}

fn array_binary(op: BinOpKind, a: &ArrayValue, b: &ArrayValue) -> Option<Value> {
    match op {
        BinOpKind::PlusPlus => {
            let mut elems = a.elems.clone();
            elems.extend_from_slice(&b.elems);
            Some(Value::Array(ArrayValue::from_vec(elems)))
        }
        BinOpKind::Eq => Some(Value::Bool(a.elems == b.elems)),
        BinOpKind::Nq => Some(Value::Bool(a.elems != b.elems)),
        _ => None,
    }
}

pub(super) fn eval_unary(op: UnOpKind, v: Value, span: Span) -> EvalResult {
    match (op, v) {
        (UnOpKind::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnOpKind::Plus, v @ (Value::Int(_) | Value::Float(_))) => Ok(v),
        (UnOpKind::Minus, Value::Int(i)) => i.checked_neg().map(Value::Int).ok_or_else(|| {
            EvalError::new(EvalErrorKind::Overflow, span, "integer overflow in `-'")
        }),
        (UnOpKind::Minus, Value::Float(x)) => Ok(Value::Float(-x)),
        (_, v) => Err(EvalError::new(
            EvalErrorKind::Unsupported,
            span,
            format!("cannot evaluate unary operator on `{}'", v.kind_name()),
        )),
    }
}
