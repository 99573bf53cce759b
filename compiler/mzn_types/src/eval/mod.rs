//! Constant evaluation of par expressions.
//!
//! The type checker needs a handful of values at compile time: the name of
//! an output section, the argument position of an annotated expression,
//! and the outcome of the contiguity assertions generated for enum
//! constructors. This evaluator covers the par fragment those use.
//!
//! Identifiers evaluate through their declaration's initializer; globals
//! are memoized, locals (generator, `let` and parameter bindings) are
//! bound for the extent of their scope. Calls to functions with a body are
//! evaluated by binding the parameters; body-less builtins are looked up
//! by name in `builtins`.

mod builtins;
mod error;
mod operators;
mod value;

pub use error::{EvalError, EvalErrorKind};
pub use value::{ArrayValue, IntSet, Value};

use rustc_hash::{FxHashMap, FxHashSet};

use mzn_ir::ast::{BinOpKind, ExprKind, Generator, IntSetVal};
use mzn_ir::{ExprId, FnId, Model, Name, Span};
use mzn_stack::ensure_sufficient_stack;

use operators::{eval_binary, eval_unary};

type EvalResult = Result<Value, EvalError>;

/// Nesting limit for calls to functions with a body.
const MAX_CALL_DEPTH: usize = 10_000;

/// Evaluate the par expression `e`.
pub fn eval_par(model: &Model, e: ExprId) -> EvalResult {
    Evaluator::new(model).eval(e)
}

pub fn eval_int(model: &Model, e: ExprId) -> Result<i64, EvalError> {
    match eval_par(model, e)? {
        Value::Int(i) => Ok(i),
        v => Err(expected("int", &v, model.arena.span(e))),
    }
}

pub fn eval_bool(model: &Model, e: ExprId) -> Result<bool, EvalError> {
    match eval_par(model, e)? {
        Value::Bool(b) => Ok(b),
        v => Err(expected("bool", &v, model.arena.span(e))),
    }
}

pub fn eval_string(model: &Model, e: ExprId) -> Result<String, EvalError> {
    match eval_par(model, e)? {
        Value::Str(s) => Ok(s),
        v => Err(expected("string", &v, model.arena.span(e))),
    }
}

fn expected(what: &str, got: &Value, span: Span) -> EvalError {
    EvalError::new(
        EvalErrorKind::Unsupported,
        span,
        format!("expected {what} value, got `{}'", got.kind_name()),
    )
}

/// One binding step of a comprehension.
enum Step {
    Iterate {
        decl: ExprId,
        source: ExprId,
        /// Filter checked once this and all earlier steps are bound.
        filter: Option<ExprId>,
    },
    Assign {
        decl: ExprId,
        value: ExprId,
    },
}

fn steps(generators: &[Generator]) -> Vec<Step> {
    let mut out = Vec::new();
    for g in generators {
        match g.source {
            Some(source) => {
                let last = g.decls.len().saturating_sub(1);
                out.extend(g.decls.iter().enumerate().map(|(i, &decl)| Step::Iterate {
                    decl,
                    source,
                    filter: if i == last { g.where_clause } else { None },
                }));
            }
            None => {
                if let Some(value) = g.where_clause {
                    out.extend(g.decls.iter().map(|&decl| Step::Assign { decl, value }));
                }
            }
        }
    }
    out
}

/// Evaluation state for one top-level request.
pub struct Evaluator<'m> {
    model: &'m Model,
    locals: FxHashMap<ExprId, Value>,
    globals: FxHashMap<ExprId, Value>,
    /// Globals under evaluation, to report cyclic definitions.
    pending: FxHashSet<ExprId>,
    depth: usize,
}

impl<'m> Evaluator<'m> {
    pub fn new(model: &'m Model) -> Self {
        Evaluator {
            model,
            locals: FxHashMap::default(),
            globals: FxHashMap::default(),
            pending: FxHashSet::default(),
            depth: 0,
        }
    }

    fn span(&self, e: ExprId) -> Span {
        self.model.arena.span(e)
    }

    fn fail(&self, kind: EvalErrorKind, e: ExprId, message: impl Into<String>) -> EvalError {
        EvalError::new(kind, self.span(e), message)
    }

    pub fn eval(&mut self, e: ExprId) -> EvalResult {
        ensure_sufficient_stack(|| self.eval_inner(e))
    }

    fn eval_inner(&mut self, e: ExprId) -> EvalResult {
        let ty = self.model.arena.ty(e);
        if ty.is_var() && !matches!(self.model.arena.kind(e), ExprKind::VarDecl(_)) {
            return Err(self.fail(EvalErrorKind::NotPar, e, "cannot evaluate a var expression"));
        }
        match self.model.arena.kind(e).clone() {
            ExprKind::IntLit(v) => v
                .as_finite()
                .map(Value::Int)
                .ok_or_else(|| self.fail(EvalErrorKind::Unsupported, e, "infinite integer")),
            ExprKind::FloatLit(x) => Ok(Value::Float(x)),
            ExprKind::BoolLit(b) => Ok(Value::Bool(b)),
            ExprKind::StringLit(s) => Ok(Value::Str(self.model.name_str(s).to_owned())),
            ExprKind::Absent => Ok(Value::Absent),
            ExprKind::SetLit { elems, isv } => self.eval_set(e, &elems, isv.as_ref()),
            ExprKind::ArrayLit { elems, dims, tuple } => {
                if tuple {
                    return Err(self.fail(EvalErrorKind::Unsupported, e, "cannot evaluate a tuple"));
                }
                let elems = elems
                    .iter()
                    .map(|&el| self.eval(el))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(ArrayValue { dims, elems }))
            }
            ExprKind::ArrayAccess { base, indices } => self.eval_access(e, base, &indices),
            ExprKind::Comprehension {
                body,
                generators,
                set,
            } => self.eval_comprehension(e, body, &generators, set),
            ExprKind::Ite {
                branches,
                else_branch,
            } => {
                for (c, t) in branches {
                    if self.eval_condition(c)? {
                        return self.eval(t);
                    }
                }
                match else_branch {
                    Some(el) => self.eval(el),
                    None => Err(self.fail(
                        EvalErrorKind::Unsupported,
                        e,
                        "conditional without else branch",
                    )),
                }
            }
            ExprKind::BinOp { op, lhs, rhs, .. } => {
                let l = self.eval(lhs)?;
                // short-circuit the connectives
                match (op, &l) {
                    (BinOpKind::And, Value::Bool(false)) => return Ok(l),
                    (BinOpKind::Or, Value::Bool(true)) => return Ok(l),
                    (BinOpKind::Impl, Value::Bool(false)) => return Ok(Value::Bool(true)),
                    _ => {}
                }
                let r = self.eval(rhs)?;
                eval_binary(op, l, r, self.span(e))
            }
            ExprKind::UnOp { op, operand, .. } => {
                let v = self.eval(operand)?;
                eval_unary(op, v, self.span(e))
            }
            ExprKind::Call { name, args, decl } => self.eval_call(e, name, &args, decl),
            ExprKind::Let { bindings, body } => self.eval_let(&bindings, body),
            ExprKind::VarDecl(vd) => match vd.init {
                Some(init) => self.eval(init),
                None => Err(self.undefined(e)),
            },
            ExprKind::Id(ident) => match ident.decl {
                Some(decl) => self.lookup(decl),
                None => Err(self.fail(
                    EvalErrorKind::Undefined,
                    e,
                    format!("undefined identifier `{}'", self.model.symbol_str(ident.sym)),
                )),
            },
            ExprKind::Anon | ExprKind::TypeInst(_) | ExprKind::TiId { .. } => Err(self.fail(
                EvalErrorKind::Unsupported,
                e,
                "expression has no value",
            )),
        }
    }

    fn undefined(&self, decl: ExprId) -> EvalError {
        self.fail(
            EvalErrorKind::Undefined,
            decl,
            format!("`{}' has no value", self.model.decl_name(decl)),
        )
    }

    fn eval_condition(&mut self, c: ExprId) -> Result<bool, EvalError> {
        match self.eval(c)? {
            Value::Bool(b) => Ok(b),
            v => Err(expected("bool", &v, self.span(c))),
        }
    }

    fn lookup(&mut self, decl: ExprId) -> EvalResult {
        if let Some(v) = self.locals.get(&decl) {
            return Ok(v.clone());
        }
        if let Some(v) = self.globals.get(&decl) {
            return Ok(v.clone());
        }
        let init = match self.model.var_decl(decl) {
            Some(vd) => vd.init,
            None => return Err(self.undefined(decl)),
        };
        let Some(init) = init else {
            return Err(self.undefined(decl));
        };
        if !self.pending.insert(decl) {
            return Err(self.fail(
                EvalErrorKind::Unsupported,
                decl,
                format!("cyclic definition of `{}'", self.model.decl_name(decl)),
            ));
        }
        let value = self.eval(init);
        self.pending.remove(&decl);
        let value = value?;
        self.globals.insert(decl, value.clone());
        Ok(value)
    }

    /// Run `f` with `decl` bound to `value`, restoring any shadowed binding.
    fn with_binding<T>(
        &mut self,
        decl: ExprId,
        value: Value,
        f: impl FnOnce(&mut Self) -> Result<T, EvalError>,
    ) -> Result<T, EvalError> {
        let previous = self.locals.insert(decl, value);
        let result = f(self);
        match previous {
            Some(v) => self.locals.insert(decl, v),
            None => self.locals.remove(&decl),
        };
        result
    }

    fn eval_set(
        &mut self,
        e: ExprId,
        elems: &[ExprId],
        isv: Option<&IntSetVal>,
    ) -> EvalResult {
        if let Some(isv) = isv {
            let ranges = isv
                .ranges
                .iter()
                .map(|&(lo, hi)| Some((lo.as_finite()?, hi.as_finite()?)))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| self.fail(EvalErrorKind::Unsupported, e, "unbounded set"))?;
            return Ok(Value::Set(IntSet::from_ranges(ranges)));
        }
        let mut values = Vec::with_capacity(elems.len());
        for &el in elems {
            match self.eval(el)? {
                Value::Int(i) => values.push(i),
                Value::Bool(b) => values.push(i64::from(b)),
                v => return Err(expected("int", &v, self.span(el))),
            }
        }
        Ok(Value::Set(IntSet::from_values(values)))
    }

    fn eval_access(&mut self, e: ExprId, base: ExprId, indices: &[ExprId]) -> EvalResult {
        let Value::Array(array) = self.eval(base)? else {
            return Err(self.fail(EvalErrorKind::Unsupported, base, "array access on a non-array"));
        };
        let mut index = Vec::with_capacity(indices.len());
        for &i in indices {
            match self.eval(i)? {
                Value::Int(v) => index.push(v),
                Value::Absent => return Ok(Value::Absent),
                v => return Err(expected("int", &v, self.span(i))),
            }
        }
        let value = array
            .offset(&index)
            .and_then(|off| array.elems.get(off))
            .cloned();
        value.ok_or_else(|| {
            let shown: Vec<String> = index.iter().map(ToString::to_string).collect();
            self.fail(
                EvalErrorKind::IndexOutOfBounds,
                e,
                format!("array index [{}] out of bounds", shown.join(",")),
            )
        })
    }

    fn eval_comprehension(
        &mut self,
        e: ExprId,
        body: ExprId,
        generators: &[Generator],
        set: bool,
    ) -> EvalResult {
        if matches!(self.model.arena.kind(body), ExprKind::ArrayLit { tuple: true, .. }) && !set {
            return Err(self.fail(
                EvalErrorKind::Unsupported,
                e,
                "cannot evaluate an indexed comprehension",
            ));
        }
        let steps = steps(generators);
        let mut out = Vec::new();
        self.generate(&steps, body, &mut out)?;
        if !set {
            return Ok(Value::Array(ArrayValue::from_vec(out)));
        }
        let mut values = Vec::with_capacity(out.len());
        for v in out {
            match v {
                Value::Int(i) => values.push(i),
                v => return Err(expected("int", &v, self.span(body))),
            }
        }
        Ok(Value::Set(IntSet::from_values(values)))
    }

    fn generate(&mut self, steps: &[Step], body: ExprId, out: &mut Vec<Value>) -> Result<(), EvalError> {
        let Some((step, rest)) = steps.split_first() else {
            out.push(self.eval(body)?);
            return Ok(());
        };
        match *step {
            Step::Assign { decl, value } => {
                let v = self.eval(value)?;
                self.with_binding(decl, v, |ev| ev.generate(rest, body, out))
            }
            Step::Iterate {
                decl,
                source,
                filter,
            } => {
                let values: Vec<Value> = match self.eval(source)? {
                    Value::Set(s) => s.values().map(Value::Int).collect(),
                    Value::Array(a) => a.elems,
                    v => return Err(expected("set or array", &v, self.span(source))),
                };
                for v in values {
                    self.with_binding(decl, v, |ev| {
                        if let Some(f) = filter {
                            if !ev.eval_condition(f)? {
                                return Ok(());
                            }
                        }
                        ev.generate(rest, body, out)
                    })?;
                }
                Ok(())
            }
        }
    }

    fn eval_let(&mut self, bindings: &[ExprId], body: ExprId) -> EvalResult {
        let Some((&first, rest)) = bindings.split_first() else {
            return self.eval(body);
        };
        let init = match self.model.arena.kind(first) {
            ExprKind::VarDecl(vd) => Some(vd.init),
            _ => None,
        };
        match init {
            Some(Some(init)) => {
                let v = self.eval(init)?;
                self.with_binding(first, v, |ev| ev.eval_let(rest, body))
            }
            Some(None) => Err(self.fail(
                EvalErrorKind::NotPar,
                first,
                format!("let variable `{}' has no value", self.model.decl_name(first)),
            )),
            None => {
                if !self.eval_condition(first)? {
                    return Err(self.fail(
                        EvalErrorKind::Failed,
                        first,
                        "let constraint evaluated to false",
                    ));
                }
                self.eval_let(rest, body)
            }
        }
    }

    fn eval_call(
        &mut self,
        e: ExprId,
        name: Name,
        args: &[ExprId],
        decl: Option<FnId>,
    ) -> EvalResult {
        let user = decl
            .filter(|&fid| self.model.fun(fid).body.is_some())
            .or_else(|| {
                if decl.is_some() {
                    return None;
                }
                // untyped call: any function of that name and arity with a body
                self.model
                    .functions
                    .iter()
                    .position(|f| f.name == name && f.params.len() == args.len() && f.body.is_some())
                    .and_then(|i| u32::try_from(i).ok())
                    .map(FnId::new)
            });
        let mut values = Vec::with_capacity(args.len());
        for &a in args {
            values.push(self.eval(a)?);
        }
        match user {
            Some(fid) => self.apply(e, fid, values),
            None => self.builtin(e, self.model.name_str(name), values),
        }
    }

    fn apply(&mut self, e: ExprId, fid: FnId, values: Vec<Value>) -> EvalResult {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(self.fail(EvalErrorKind::Unsupported, e, "evaluation nested too deeply"));
        }
        let f = self.model.fun(fid);
        let (params, body) = (f.params.clone(), f.body);
        let Some(body) = body else {
            return Err(self.fail(EvalErrorKind::Unsupported, e, "function has no body"));
        };
        let saved: Vec<(ExprId, Option<Value>)> = params
            .iter()
            .zip(values)
            .map(|(&p, v)| (p, self.locals.insert(p, v)))
            .collect();
        self.depth += 1;
        let result = self.eval(body);
        self.depth -= 1;
        for (p, previous) in saved.into_iter().rev() {
            match previous {
                Some(v) => self.locals.insert(p, v),
                None => self.locals.remove(&p),
            };
        }
        result
    }
}

#[cfg(test)]
mod tests;
