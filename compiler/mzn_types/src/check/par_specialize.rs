//! Par versions of functions.
//!
//! A function with `var` parameters whose body would be par if all its
//! arguments were par gets a par copy, so calls with par arguments can be
//! evaluated instead of flattened. A body only qualifies if every call in
//! it has a usable par target: a par builtin, a par user function, the
//! function itself, or another function that qualifies. Candidates
//! depending on a function that does not qualify are dropped until
//! nothing changes.

use std::collections::{BTreeMap, BTreeSet};

use mzn_ir::ast::{ExprKind, Item, ItemKind};
use mzn_ir::visit::{postorder, preorder};
use mzn_ir::{CopyMap, ExprId, FnId, Model, Name, Type};

use super::ModelChecker;
use crate::fns::{param_ti, param_types, rtype};
use crate::{CheckEnv, TypeCheckError};

impl ModelChecker<'_> {
    #[tracing::instrument(level = "debug", skip_all)]
    pub(super) fn specialize_par_functions(&mut self) -> Result<(), TypeCheckError> {
        let mut candidates: BTreeMap<FnId, BTreeSet<FnId>> = BTreeMap::new();
        for fid in self.live_functions() {
            if !is_candidate(self.model, self.env, fid) {
                continue;
            }
            if let Some(deps) = par_dependencies(self.model, self.env, fid) {
                candidates.insert(fid, deps);
            }
        }
        prune(&mut candidates);

        let mut copies = Vec::with_capacity(candidates.len());
        for &fid in candidates.keys() {
            let copy = self.par_copy(fid);
            if self.env.fns.register(self.model, copy, false)? {
                let span = self.model.fun(copy).span;
                self.push_item(Item::new(ItemKind::Function(copy), span), None);
                copies.push(copy);
            }
        }
        for &copy in &copies {
            retype_body(self.model, self.env, copy);
        }
        tracing::debug!(count = copies.len(), "specialized par functions");
        Ok(())
    }

    /// Copy `fid` with every parameter and the return type made par.
    fn par_copy(&mut self, fid: FnId) -> FnId {
        let decl = self.model.fun(fid).clone();
        let mut map = CopyMap::new();
        let copy = self.model.copy_function(&mut map, &decl);
        for &p in &copy.params {
            if let Some(ti) = param_ti(self.model, p) {
                let ty = self.model.arena.ty(ti);
                self.model.arena.set_ty(ti, ty.to_par());
            }
            let ty = self.model.arena.ty(p);
            self.model.arena.set_ty(p, ty.to_par());
        }
        let rt = self.model.arena.ty(copy.ti);
        self.model.arena.set_ty(copy.ti, rt.to_par());
        self.model.push_function(copy)
    }
}

fn par_types(types: &[Type]) -> Vec<Type> {
    types.iter().map(|t| t.to_par()).collect()
}

/// Has a body, returns a value, takes some `var` argument, and its par
/// signature would resolve to itself.
fn is_candidate(model: &Model, env: &CheckEnv, fid: FnId) -> bool {
    let f = model.fun(fid);
    if f.body.is_none() || model.arena.ty(f.ti).is_ann() {
        return false;
    }
    let polymorphic = env
        .fns
        .overloads(f.name)
        .iter()
        .find(|e| e.id == fid)
        .map_or(true, |e| e.polymorphic);
    if polymorphic {
        return false;
    }
    let params = param_types(model, fid);
    if !params.iter().any(|t| t.is_var() && !t.is_any()) {
        return false;
    }
    env.fns
        .match_types(&env.enums, f.name, &par_types(&params), false)
        == Some(fid)
}

/// A function that can be called with par arguments as is.
fn usable_as_par(model: &Model, fid: FnId) -> bool {
    let f = model.fun(fid);
    model.arena.ty(f.ti).is_par()
        && ((f.body.is_none() && f.from_stdlib)
            || param_types(model, fid).iter().all(Type::is_par))
}

/// Name and argument list of a resolved call or operator.
fn call_target(model: &Model, e: ExprId) -> Option<(Name, Vec<ExprId>)> {
    match model.arena.kind(e) {
        ExprKind::Call {
            name,
            args,
            decl: Some(_),
        } => Some((*name, args.clone())),
        ExprKind::BinOp {
            op,
            lhs,
            rhs,
            decl: Some(_),
        } => Some((model.intern(op.builtin_name()), vec![*lhs, *rhs])),
        ExprKind::UnOp {
            op,
            operand,
            decl: Some(_),
        } => Some((model.intern(op.builtin_name()), vec![*operand])),
        _ => None,
    }
}

/// Functions the par version of `fid` would call that still need a par
/// version of their own. `None` if the body cannot be made par.
fn par_dependencies(model: &Model, env: &CheckEnv, fid: FnId) -> Option<BTreeSet<FnId>> {
    let body = model.fun(fid).body?;
    let arena = &model.arena;
    let mut deps = BTreeSet::new();
    let mut par = true;
    preorder(arena, body, false, |e| {
        if !par {
            return false;
        }
        match arena.kind(e) {
            ExprKind::Id(ident) => {
                let global_var = ident.decl.is_some_and(|d| {
                    model.var_decl(d).is_some_and(|vd| vd.toplevel) && arena.ty(d).is_var()
                });
                par = !global_var;
            }
            ExprKind::Let { bindings, .. } => {
                par = !bindings.iter().any(|&b| {
                    model.var_decl(b).is_some_and(|vd| vd.init.is_none())
                });
            }
            _ => {
                if arena.ty(e).is_ann() {
                    return par;
                }
                let Some((name, args)) = call_target(model, e) else {
                    return par;
                };
                let types: Vec<Type> = args.iter().map(|&a| arena.ty(a).to_par()).collect();
                match env.fns.match_types(&env.enums, name, &types, false) {
                    None => par = false,
                    Some(g) if g == fid || usable_as_par(model, g) => {}
                    Some(g) => {
                        deps.insert(g);
                    }
                }
            }
        }
        par
    });
    par.then_some(deps)
}

/// Drop candidates depending on functions that are not candidates, until
/// every remaining dependency is itself a candidate.
fn prune(candidates: &mut BTreeMap<FnId, BTreeSet<FnId>>) {
    let mut rdeps: BTreeMap<FnId, Vec<FnId>> = BTreeMap::new();
    for (&f, deps) in candidates.iter() {
        for &d in deps {
            rdeps.entry(d).or_default().push(f);
        }
    }
    let mut work: Vec<FnId> = candidates
        .iter()
        .filter(|(_, deps)| deps.iter().any(|d| !candidates.contains_key(d)))
        .map(|(&f, _)| f)
        .collect();
    while let Some(f) = work.pop() {
        if candidates.remove(&f).is_none() {
            continue;
        }
        if let Some(users) = rdeps.get(&f) {
            work.extend(users.iter().copied().filter(|u| candidates.contains_key(u)));
        }
    }
}

/// Make every node of the copied body par and point its calls at the par
/// overloads.
fn retype_body(model: &mut Model, env: &mut CheckEnv, fid: FnId) {
    let Some(body) = model.fun(fid).body else {
        return;
    };
    for e in postorder(&model.arena, body, false) {
        let ty = model.arena.ty(e);
        model.arena.set_ty(e, ty.to_par().with_cv(false));
        if ty.is_ann() {
            continue;
        }
        let Some((name, args)) = call_target(model, e) else {
            continue;
        };
        let types: Vec<Type> = args.iter().map(|&a| model.arena.ty(a)).collect();
        let Some(g) = env.fns.match_types(&env.enums, name, &types, false) else {
            continue;
        };
        let has_body = model.fun(g).body.is_some();
        let rt = rtype(model, &mut env.enums, g, &types);
        match &mut model.arena.get_mut(e).kind {
            ExprKind::Call { decl, .. } => *decl = Some(g),
            ExprKind::BinOp { decl, .. } | ExprKind::UnOp { decl, .. } => {
                *decl = has_body.then_some(g);
            }
            _ => {}
        }
        model.arena.set_ty(e, rt);
    }
}
