//! Conditionals and let expressions.

use mzn_ir::ast::ExprKind;
use mzn_ir::{BaseType, ExprId, Type};

use super::Typer;
use crate::fns::mentions_ti_var;
use crate::{TypeCheckError, TypeErrorKind};

/// Join of two branch types, if they are compatible.
fn join_branch(acc: Type, t: Type) -> Option<Type> {
    if acc.is_bot() || acc.is_unknown() {
        return Some(t.with_inst(acc.inst).with_opt(acc.opt || t.opt));
    }
    if t.is_bot() || t.is_unknown() {
        return Some(acc.with_opt(acc.opt || t.opt));
    }
    if acc.dim != t.dim || acc.set != t.set {
        return None;
    }
    let base = if Type::bt_subtype(&t, &acc, false) {
        acc.base
    } else if Type::bt_subtype(&acc, &t, false) {
        t.base
    } else {
        return None;
    };
    let enum_id = if acc.enum_id == t.enum_id { acc.enum_id } else { 0 };
    Some(acc.with_base(base).with_enum(enum_id))
}

pub(crate) fn infer_ite(typer: &mut Typer<'_>, e: ExprId) -> Result<Type, TypeCheckError> {
    let ExprKind::Ite {
        branches,
        else_branch,
    } = typer.kind(e).clone()
    else {
        return Err(TypeCheckError::internal(typer.span(e), "expected a conditional"));
    };
    let mut tret = else_branch.map_or_else(Type::bot, |el| typer.ty(el));
    if let Some(el) = else_branch {
        if tret.is_unknown() && !typer.kind(el).is_anon() {
            return Err(TypeCheckError::mismatch(
                typer.span(el),
                "cannot infer type of expression in `else' branch of conditional",
            ));
        }
    }
    let mut anons: Vec<ExprId> = else_branch
        .filter(|&el| typer.kind(el).is_anon())
        .into_iter()
        .collect();
    let (mut allpar, mut varcond, mut opt, mut cv) = (tret.is_par(), false, tret.is_opt(), tret.cv());

    for &(c, t) in &branches {
        let ct = typer.ty(c);
        let is_bool = ct.dim == 0 && !ct.is_set() && !ct.is_opt() && ct.is_bool();
        if !is_bool {
            return Err(TypeCheckError::mismatch(
                typer.span(c),
                format!(
                    "expected bool conditional expression, got `{}'",
                    typer.show(ct)
                ),
            ));
        }
        varcond |= ct.is_var();
        cv |= ct.cv();
        if typer.kind(t).is_anon() {
            anons.push(t);
            continue;
        }
        let tt = typer.ty(t);
        if tt.is_unknown() {
            return Err(TypeCheckError::mismatch(
                typer.span(t),
                "cannot infer type of expression in `then' branch of conditional",
            ));
        }
        allpar &= tt.is_par();
        opt |= tt.is_opt();
        cv |= tt.cv();
        tret = join_branch(tret, tt).ok_or_else(|| {
            TypeCheckError::mismatch(
                typer.span(t),
                format!(
                    "type mismatch in branches of conditional. `then' branch has type `{}', but `else' branch has type `{}'",
                    typer.show(tt),
                    typer.show(tret)
                ),
            )
        })?;
    }

    let span = typer.span(e);
    let else_branch = match else_branch {
        Some(el) => el,
        None => {
            if tret.is_bool() && tret.dim == 0 && !tret.is_set() {
                typer.model.arena.alloc_typed(ExprKind::BoolLit(true), span, Type::par_bool())
            } else if tret.is_string() && tret.dim == 0 {
                let empty = typer.model.intern("");
                typer
                    .model
                    .arena
                    .alloc_typed(ExprKind::StringLit(empty), span, Type::par_string())
            } else if tret.is_ann() && tret.dim == 0 {
                let name = typer.env.names.empty_annotation;
                typer.env.ann_ref(typer.model, name, span)
            } else if tret.dim > 0 {
                let dims = vec![(1, 0); tret.dim.unsigned_abs() as usize];
                typer.model.arena.alloc_typed(
                    ExprKind::ArrayLit {
                        elems: Vec::new(),
                        dims,
                        tuple: false,
                    },
                    span,
                    tret.to_par(),
                )
            } else {
                return Err(TypeCheckError::mismatch(
                    span,
                    format!(
                        "conditional without `else' branch must have bool, string, ann, or array type, but `then' branch has type `{}'",
                        typer.show(tret)
                    ),
                ));
            }
        }
    };

    let var = varcond || !allpar;
    let target = if var { tret.to_var() } else { tret };
    for &anon in &anons {
        typer.set_ty(anon, tret.to_var());
    }
    let mut coerced = Vec::with_capacity(branches.len());
    for (c, t) in branches {
        let t = if typer.kind(t).is_anon() {
            t
        } else {
            typer.coerce(t, target)?
        };
        coerced.push((c, t));
    }
    let else_branch = if typer.kind(else_branch).is_anon() {
        else_branch
    } else {
        typer.coerce(else_branch, target)?
    };

    if varcond {
        let forbidden = if tret.dim != 0 {
            Some("array")
        } else if tret.is_string() {
            Some("string")
        } else if tret.is_ann() {
            Some("ann")
        } else if tret.is_set() && !tret.is_int() && !tret.is_bot() {
            Some("non-int set")
        } else {
            None
        };
        if let Some(what) = forbidden {
            return Err(TypeCheckError::mismatch(
                span,
                format!("conditional with var condition cannot have {what} type"),
            ));
        }
    }

    if let ExprKind::Ite {
        branches: b,
        else_branch: el,
    } = &mut typer.model.arena.get_mut(e).kind
    {
        *b = coerced;
        *el = Some(else_branch);
    }
    let mut ty = target.with_opt(opt).with_cv(cv);
    if ty.is_unknown() {
        ty.base = BaseType::Bot;
    }
    Ok(ty)
}

pub(crate) fn infer_let(typer: &mut Typer<'_>, e: ExprId) -> Result<Type, TypeCheckError> {
    let ExprKind::Let { bindings, body } = typer.kind(e).clone() else {
        return Err(TypeCheckError::internal(typer.span(e), "expected a let expression"));
    };
    let mut cv = false;
    let mut any_var = false;
    for &b in &bindings {
        let bt = typer.ty(b);
        cv |= bt.cv();
        let Some(vd) = typer.model.var_decl(b).cloned() else {
            any_var |= bt.is_var();
            if !bt.is_subtype_of(&Type::var_bool(), false) {
                let message = format!(
                    "invalid type of constraint, expected `var bool', actual `{}'",
                    typer.show(bt)
                );
                typer
                    .errors
                    .push(TypeCheckError::mismatch(typer.span(b), message));
            }
            continue;
        };
        any_var |= bt.is_var();
        let name = typer.model.symbol_str(vd.id);
        if bt.is_var() && bt.is_set() && vd.init.is_none() {
            let has_domain = typer.model.type_inst(vd.ti).is_some_and(|ti| ti.domain.is_some());
            if !has_domain {
                typer.errors.push(TypeCheckError::invalid_type_inst(
                    typer.span(b),
                    format!("set element type for `{name}' is not finite"),
                ));
            }
        }
        if bt.is_par() && vd.init.is_none() {
            return Err(TypeCheckError::new(
                TypeErrorKind::TypeMismatch,
                typer.span(b),
                format!("let variable `{name}' must be initialised"),
            ));
        }
        if mentions_ti_var(typer.model, vd.ti) {
            typer.errors.push(TypeCheckError::invalid_type_inst(
                typer.span(b),
                format!("type-inst variables not allowed in type-inst for let variable `{name}'"),
            ));
        }
    }
    let bt = typer.ty(body);
    let body = typer.coerce(body, bt)?;
    if let ExprKind::Let { body: b, .. } = &mut typer.model.arena.get_mut(e).kind {
        *b = body;
    }
    let mut ty = typer.ty(body).with_cv(cv || bt.cv());
    if any_var && ty.dim == 0 && !ty.is_set() && ty.is_bool() {
        ty = ty.to_var();
    }
    Ok(ty)
}
