//! Body-less builtins, dispatched by name.

use mzn_ir::ExprId;

use super::operators::widen;
use super::value::{ArrayValue, IntSet, Value};
use super::{EvalErrorKind, EvalResult, Evaluator};

/// Whether `s` can be printed as a bare identifier.
fn is_plain_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `index_set_<i>of<n>` as `(i, n)`.
fn index_set_position(name: &str) -> Option<(usize, usize)> {
    let rest = name.strip_prefix("index_set_")?;
    let (i, n) = rest.split_once("of")?;
    Some((i.parse().ok()?, n.parse().ok()?))
}

impl Evaluator<'_> {
    fn unsupported(&self, e: ExprId, name: &str, args: &[Value]) -> super::EvalError {
        let kinds: Vec<&str> = args.iter().map(Value::kind_name).collect();
        self.fail(
            EvalErrorKind::Unsupported,
            e,
            format!("cannot evaluate `{name}({})'", kinds.join(", ")),
        )
    }

    pub(super) fn builtin(&mut self, e: ExprId, name: &str, args: Vec<Value>) -> EvalResult {
        if let Some((i, n)) = index_set_position(name) {
            return match args.as_slice() {
                [Value::Array(a)] if a.dims.len() == n && i >= 1 => {
                    let (lo, hi) = a.dims[i - 1];
                    Ok(Value::Set(IntSet::range(lo, hi)))
                }
                _ => Err(self.unsupported(e, name, &args)),
            };
        }
        let result = match (name, args.as_slice()) {
            // conversions
            ("bool2int", [Value::Bool(b)]) => Value::Int(i64::from(*b)),
            ("bool2float", [Value::Bool(b)]) => Value::Float(if *b { 1.0 } else { 0.0 }),
            ("int2float", [Value::Int(i)]) => Value::Float(widen(*i)),
            ("bool2int" | "bool2float" | "int2float", [Value::Array(a)]) => {
                let mut elems = Vec::with_capacity(a.elems.len());
                for v in &a.elems {
                    elems.push(self.builtin(e, name, vec![v.clone()])?);
                }
                Value::Array(ArrayValue {
                    dims: a.dims.clone(),
                    elems,
                })
            }
            (_, [Value::Absent]) if matches!(name, "bool2int" | "bool2float" | "int2float") => {
                Value::Absent
            }
            ("set2array", [Value::Set(s)]) => {
                Value::Array(ArrayValue::from_vec(s.values().map(Value::Int).collect()))
            }
            ("array1d", [Value::Array(a)]) => Value::Array(ArrayValue::from_vec(a.elems.clone())),
            ("array1d", [Value::Set(s), Value::Array(a)]) => match (s.min(), s.max()) {
                (Some(lo), Some(hi)) if s.card() == i64::try_from(a.elems.len()).unwrap_or(-1) => {
                    Value::Array(ArrayValue {
                        dims: vec![(lo, hi)],
                        elems: a.elems.clone(),
                    })
                }
                _ => {
                    return Err(self.fail(
                        EvalErrorKind::IndexOutOfBounds,
                        e,
                        "index set does not match the number of array elements",
                    ))
                }
            },
            ("index_set", [Value::Array(a)]) if a.dims.len() == 1 => {
                Value::Set(IntSet::range(a.dims[0].0, a.dims[0].1))
            }
            ("length", [Value::Array(a)]) => Value::Int(i64::try_from(a.elems.len()).unwrap_or(i64::MAX)),

            // sets
            ("card", [Value::Set(s)]) => Value::Int(s.card()),
            ("min" | "max", [Value::Set(s)]) => {
                let v = if name == "min" { s.min() } else { s.max() };
                Value::Int(v.ok_or_else(|| {
                    self.fail(EvalErrorKind::Failed, e, format!("`{name}' of an empty set"))
                })?)
            }
            ("min", [Value::Int(a), Value::Int(b)]) => Value::Int(*a.min(b)),
            ("max", [Value::Int(a), Value::Int(b)]) => Value::Int(*a.max(b)),
            ("min", [Value::Float(a), Value::Float(b)]) => Value::Float(a.min(*b)),
            ("max", [Value::Float(a), Value::Float(b)]) => Value::Float(a.max(*b)),
            ("min" | "max", [Value::Array(a)]) => {
                let mut iter = a.elems.iter().cloned();
                let Some(first) = iter.next() else {
                    return Err(self.fail(
                        EvalErrorKind::Failed,
                        e,
                        format!("`{name}' of an empty array"),
                    ));
                };
                let mut acc = first;
                for v in iter {
                    acc = self.builtin(e, name, vec![acc, v])?;
                }
                acc
            }
            ("enum_of_internal", [Value::Set(s)]) => Value::Set(s.clone()),
            ("anon_enum", [Value::Int(n)]) => Value::Set(IntSet::range(1, *n)),
            ("anon_enum_set", [Value::Set(s)]) => Value::Set(IntSet::range(1, s.card())),
            ("to_enum", [Value::Set(s), v]) => self.to_enum(e, s, v.clone())?,

            // aggregates
            ("sum", [Value::Array(a)]) => {
                let mut acc = Value::Int(0);
                for v in &a.elems {
                    acc = match (acc, v) {
                        (acc, Value::Absent) => acc,
                        (Value::Int(x), Value::Int(y)) => Value::Int(x.checked_add(*y).ok_or_else(|| {
                            self.fail(EvalErrorKind::Overflow, e, "integer overflow in `sum'")
                        })?),
                        (Value::Int(x), Value::Float(y)) => Value::Float(widen(x) + y),
                        (Value::Float(x), Value::Float(y)) => Value::Float(x + y),
                        _ => return Err(self.unsupported(e, name, &args)),
                    };
                }
                acc
            }
            ("count", [Value::Array(a)]) => {
                Value::Int(a.elems.iter().filter(|v| **v == Value::Bool(true)).count().try_into().unwrap_or(i64::MAX))
            }
            ("count", [Value::Array(a), v]) => {
                Value::Int(a.elems.iter().filter(|x| *x == v).count().try_into().unwrap_or(i64::MAX))
            }
            ("forall", [Value::Array(a)]) => Value::Bool(a.elems.iter().all(|v| *v == Value::Bool(true))),
            ("exists", [Value::Array(a)]) => Value::Bool(a.elems.iter().any(|v| *v == Value::Bool(true))),

            // option types
            ("occurs", [v]) => Value::Bool(*v != Value::Absent),
            ("absent", [v]) => Value::Bool(*v == Value::Absent),
            ("deopt", [Value::Absent]) => {
                return Err(self.fail(EvalErrorKind::Failed, e, "deopt of an absent value"))
            }
            ("deopt", [v]) => v.clone(),

            // strings
            ("show" | "showDzn" | "showJSON" | "format", [v]) => Value::Str(v.show()),
            // positive widths right-align, negative ones left-align
            ("format", [Value::Int(w), v]) => {
                let s = v.show();
                let width = usize::try_from(w.unsigned_abs()).unwrap_or(0);
                Value::Str(if *w >= 0 {
                    format!("{s:>width$}")
                } else {
                    format!("{s:<width$}")
                })
            }
            ("showDznId", [Value::Str(s)]) => Value::Str(if is_plain_identifier(s) {
                s.clone()
            } else {
                format!("'{s}'")
            }),
            ("concat", [Value::Array(a)]) => Value::Str(self.strings(e, name, &a.elems)?.concat()),
            ("join", [Value::Str(sep), Value::Array(a)]) => {
                Value::Str(self.strings(e, name, &a.elems)?.join(sep))
            }

            // checks
            ("assert", [Value::Bool(b), Value::Str(msg), rest @ ..]) if rest.len() <= 1 => {
                if !*b {
                    return Err(self.fail(EvalErrorKind::AssertionFailed, e, msg.clone()));
                }
                rest.first().cloned().unwrap_or(Value::Bool(true))
            }
            _ => return Err(self.unsupported(e, name, &args)),
        };
        Ok(result)
    }

    fn strings(&self, e: ExprId, name: &str, values: &[Value]) -> Result<Vec<String>, super::EvalError> {
        values
            .iter()
            .map(|v| match v {
                Value::Str(s) => Ok(s.clone()),
                _ => Err(self.unsupported(e, name, values)),
            })
            .collect()
    }

    /// `to_enum(S, v)`: `v` unchanged if it lies in `S`.
    fn to_enum(&mut self, e: ExprId, set: &IntSet, v: Value) -> EvalResult {
        match v {
            Value::Int(i) if set.contains(i) => Ok(Value::Int(i)),
            Value::Int(i) => Err(self.fail(
                EvalErrorKind::IndexOutOfBounds,
                e,
                format!("value {i} outside the range of the enum"),
            )),
            Value::Absent => Ok(Value::Absent),
            Value::Set(s) if s.is_subset(set) => Ok(Value::Set(s)),
            Value::Array(a) => {
                let mut elems = Vec::with_capacity(a.elems.len());
                for v in a.elems {
                    elems.push(self.to_enum(e, set, v)?);
                }
                Ok(Value::Array(ArrayValue { dims: a.dims, elems }))
            }
            v => Err(self.unsupported(e, "to_enum", &[Value::Set(set.clone()), v])),
        }
    }
}
