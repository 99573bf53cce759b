//! Global function table and overload resolution.
//!
//! Every function, predicate, annotation constructor and operator (under
//! its quoted builtin name such as `'+'`) is registered by name. Overloads
//! are kept most-specific first, so resolution is simply the first entry
//! whose parameter types accept the argument types.
//!
//! Parameter types are read from the parameter type-insts; [`FunctionTable::fix`]
//! refreshes them once the first typing pass has resolved domains.

mod signature;

use rustc_hash::FxHashMap;

use mzn_ir::ast::ExprKind;
use mzn_ir::{ExprId, FnId, Model, Name, Span, Type};

use crate::{EnumRegistry, TypeCheckError, TypeErrorKind};

pub use signature::{argtype, rtype};
pub(crate) use signature::mentions_ti_var;

/// One registered overload.
#[derive(Clone, Debug, PartialEq)]
pub struct FnEntry {
    pub id: FnId,
    pub params: Vec<Type>,
    /// Has a type-inst variable (`$T`, `$$E`, `array[$X]`) among its parameters.
    pub polymorphic: bool,
}

/// Name → overloads, most specific first.
#[derive(Debug, Default)]
pub struct FunctionTable {
    map: FxHashMap<Name, Vec<FnEntry>>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `fid`.
    ///
    /// An overload with identical parameter types is not added twice: a
    /// definition with a body replaces a body-less declaration, and two
    /// bodies are a duplicate definition if `error_on_duplicate` is set.
    /// Returns whether the table now refers to `fid`.
    pub fn register(
        &mut self,
        model: &Model,
        fid: FnId,
        error_on_duplicate: bool,
    ) -> Result<bool, TypeCheckError> {
        let entry = make_entry(model, fid);
        let decl = model.fun(fid);
        let entries = self.map.entry(decl.name).or_default();
        if let Some(existing) = entries
            .iter_mut()
            .find(|e| e.params == entry.params && !has_unknown(&e.params))
        {
            if existing.id == fid {
                return Ok(true);
            }
            let old = model.fun(existing.id);
            if old.body.is_none() && decl.body.is_some() {
                existing.id = fid;
                return Ok(true);
            }
            if old.body.is_some() && decl.body.is_some() && error_on_duplicate {
                return Err(duplicate_fn(decl.span, old.span));
            }
            return Ok(false);
        }
        insert_sorted(entries, entry);
        Ok(true)
    }

    /// Recompute parameter types after domains were resolved, merge
    /// overloads that turned out identical and restore the ordering.
    pub fn fix(&mut self, model: &Model) -> Vec<TypeCheckError> {
        let mut errors = Vec::new();
        let mut names: Vec<Name> = self.map.keys().copied().collect();
        names.sort_unstable();
        for name in names {
            let Some(old) = self.map.remove(&name) else {
                continue;
            };
            let mut fresh: Vec<FnEntry> = Vec::with_capacity(old.len());
            for e in old {
                let e = make_entry(model, e.id);
                if let Some(same) = fresh.iter_mut().find(|f| f.params == e.params) {
                    let (a, b) = (model.fun(same.id), model.fun(e.id));
                    match (a.body.is_some(), b.body.is_some()) {
                        (false, true) => same.id = e.id,
                        (true, true) if !a.from_stdlib || !b.from_stdlib => {
                            errors.push(duplicate_fn(b.span, a.span));
                        }
                        _ => {}
                    }
                    continue;
                }
                insert_sorted(&mut fresh, e);
            }
            self.map.insert(name, fresh);
        }
        errors
    }

    pub fn overloads(&self, name: Name) -> &[FnEntry] {
        self.map.get(&name).map_or(&[], Vec::as_slice)
    }

    pub fn contains(&self, name: Name) -> bool {
        !self.overloads(name).is_empty()
    }

    /// Every registered overload, in a stable order.
    pub fn all(&self) -> Vec<FnId> {
        let mut ids: Vec<FnId> = self.map.values().flatten().map(|e| e.id).collect();
        ids.sort_unstable();
        ids
    }

    /// First overload of `name` accepting `args`.
    pub fn match_types(
        &self,
        enums: &EnumRegistry,
        name: Name,
        args: &[Type],
        strict_enums: bool,
    ) -> Option<FnId> {
        self.overloads(name)
            .iter()
            .find(|e| accepts(enums, &e.params, args, strict_enums))
            .map(|e| e.id)
    }

    /// Resolve a call, reporting a resolution failure at `span`.
    pub fn resolve(
        &self,
        model: &Model,
        enums: &EnumRegistry,
        name: Name,
        args: &[Type],
        strict_enums: bool,
        span: Span,
    ) -> Result<FnId, TypeCheckError> {
        if let Some(fid) = self.match_types(enums, name, args, strict_enums) {
            tracing::trace!(name = model.name_str(name), ?fid, "resolved overload");
            return Ok(fid);
        }
        let fname = model.name_str(name);
        let overloads = self.overloads(name);
        if overloads.is_empty() {
            return Err(TypeCheckError::new(
                TypeErrorKind::OverloadResolution,
                span,
                format!("no function or predicate with name `{fname}' found"),
            ));
        }
        let mut message = format!(
            "no function or predicate with this signature found: `{}'",
            signature_str(model, enums, fname, args)
        );
        message.push_str("\nCannot use the following functions or predicates with the same identifier:");
        for e in overloads {
            message.push('\n');
            message.push_str(&signature_str(model, enums, fname, &e.params));
        }
        Err(TypeCheckError::new(
            TypeErrorKind::OverloadResolution,
            span,
            message,
        ))
    }

    /// Whether `f` and `g` have corresponding applicable overloads for
    /// arguments of types `args`: same count, same parameter types in order.
    pub fn same_overloading(&self, enums: &EnumRegistry, args: &[Type], f: Name, g: Name) -> bool {
        let applicable = |name: Name| -> Vec<&Vec<Type>> {
            self.overloads(name)
                .iter()
                .filter(|e| accepts(enums, &e.params, args, true))
                .map(|e| &e.params)
                .collect()
        };
        applicable(f) == applicable(g)
    }

    /// Report overloads that differ only in enum identities, which
    /// resolution cannot tell apart.
    pub fn check_overloading(&self, model: &Model) -> Vec<TypeCheckError> {
        let mut errors = Vec::new();
        let mut groups: Vec<&Vec<FnEntry>> = self.map.values().collect();
        groups.sort_by_key(|g| g.first().map(|e| e.id));
        for entries in groups {
            for (i, cur) in entries.iter().enumerate() {
                for cmp in &entries[i + 1..] {
                    if cur.params.len() != cmp.params.len() {
                        continue;
                    }
                    let all_equal = cur
                        .params
                        .iter()
                        .zip(&cmp.params)
                        .all(|(a, b)| a.same_kind(b) && a.flags == b.flags);
                    if all_equal {
                        errors.push(TypeCheckError::new(
                            TypeErrorKind::AmbiguousOverload,
                            model.fun(cur.id).span,
                            format!(
                                "unsupported type of overloading. \nFunction/predicate with equivalent signature defined in {}",
                                model.fun(cmp.id).span
                            ),
                        ));
                    }
                }
            }
        }
        errors
    }
}

/// Parameter types of `fid`, read from the parameter type-insts.
pub fn param_types(model: &Model, fid: FnId) -> Vec<Type> {
    model
        .fun(fid)
        .params
        .iter()
        .map(|&p| param_ti(model, p).map_or_else(|| model.arena.ty(p), |ti| model.arena.ty(ti)))
        .collect()
}

/// Type-inst expression of a parameter declaration.
pub(crate) fn param_ti(model: &Model, param: ExprId) -> Option<ExprId> {
    model.var_decl(param).map(|vd| vd.ti)
}

/// The `$T` or `$$E` name in the domain of a type-inst, if any.
pub(crate) fn ti_var(model: &Model, ti: ExprId) -> Option<(Name, bool)> {
    let domain = model.type_inst(ti)?.domain?;
    match model.arena.kind(domain) {
        ExprKind::TiId { name, is_enum } => Some((*name, *is_enum)),
        _ => None,
    }
}

fn is_polymorphic(model: &Model, fid: FnId) -> bool {
    model
        .fun(fid)
        .params
        .iter()
        .any(|&p| param_ti(model, p).is_some_and(|ti| mentions_ti_var(model, ti)))
}

fn make_entry(model: &Model, fid: FnId) -> FnEntry {
    FnEntry {
        id: fid,
        params: param_types(model, fid),
        polymorphic: is_polymorphic(model, fid),
    }
}

fn has_unknown(params: &[Type]) -> bool {
    params.iter().any(Type::is_unknown)
}

fn accepts(enums: &EnumRegistry, params: &[Type], args: &[Type], strict_enums: bool) -> bool {
    params.len() == args.len()
        && args
            .iter()
            .zip(params)
            .all(|(&a, &p)| enums.is_subtype(a, p, strict_enums))
}

fn type_key(t: &Type) -> impl Ord {
    (t.inst, t.base, t.set, t.opt, t.dim, t.enum_id)
}

/// `a` should be tried before `b`.
fn precedes(a: &FnEntry, b: &FnEntry) -> bool {
    if a.params.len() != b.params.len() {
        return a.params.len() < b.params.len();
    }
    for (x, y) in a.params.iter().zip(&b.params) {
        if x == y {
            continue;
        }
        if x.is_subtype_of(y, true) {
            return true;
        }
        if y.is_subtype_of(x, true) {
            return false;
        }
        return type_key(x) < type_key(y);
    }
    !a.polymorphic && b.polymorphic
}

fn insert_sorted(entries: &mut Vec<FnEntry>, entry: FnEntry) {
    let pos = entries
        .iter()
        .position(|e| precedes(&entry, e))
        .unwrap_or(entries.len());
    entries.insert(pos, entry);
}

fn duplicate_fn(span: Span, previous: Span) -> TypeCheckError {
    TypeCheckError::new(
        TypeErrorKind::DuplicateDefinition,
        span,
        format!("function with the same type already defined in line {previous}"),
    )
}

/// `name(t1, t2)` with enum names.
pub fn signature_str(model: &Model, enums: &EnumRegistry, name: &str, types: &[Type]) -> String {
    let args: Vec<String> = types.iter().map(|t| enums.show(model, *t)).collect();
    format!("{name}({})", args.join(", "))
}
