//! Typing passes over the sorted items.
//!
//! Pass 1 settles declared types only; between the passes the function
//! table is refreshed and anonymous enum arguments are checked. Pass 2
//! types initializers, constraints, the solve item, output items and
//! function bodies, coercing each to the type its context requires.

use mzn_ir::ast::{ExprKind, FunctionDecl, ItemKind, SolveGoal, SolveItem};
use mzn_ir::{ExprId, FnId, Name, Type};

use super::ModelChecker;
use crate::coerce::resolved_call;
use crate::enum_gen::PartKind;
use crate::fns::{mentions_ti_var, ti_var};
use crate::{TypeCheckError, TypeErrorKind, Typer};

impl ModelChecker<'_> {
    /// Functions of all items still in the model.
    pub(super) fn live_functions(&self) -> Vec<FnId> {
        self.items
            .iter()
            .filter(|it| !it.removed)
            .filter_map(|it| match it.kind {
                ItemKind::Function(fid) => Some(fid),
                _ => None,
            })
            .collect()
    }

    /// Pass 1: declared types of top-level declarations and of function
    /// signatures.
    #[tracing::instrument(level = "debug", skip_all)]
    pub(super) fn declare_types(&mut self) -> Result<(), TypeCheckError> {
        let decls: Vec<ExprId> = self
            .topo
            .decls
            .iter()
            .copied()
            .filter(|&d| self.model.var_decl(d).is_some_and(|vd| vd.toplevel))
            .collect();
        let fids = self.live_functions();
        let mut typer = Typer::new(self.model, self.env, &mut self.errors, false);
        for decl in decls {
            typer.declare(decl)?;
        }
        for fid in fids {
            let f = typer.model.fun(fid).clone();
            typer.run(f.ti)?;
            for &p in f.params.iter().chain(f.captured_anns.iter()) {
                typer.run(p)?;
            }
        }
        Ok(())
    }

    /// `anon_enum(n)` needs an `int`, `anon_enum_set(s)` a `set of int`.
    pub(super) fn check_enum_parts(&mut self) -> Result<(), TypeCheckError> {
        let parts = self.topo.enum_book.part_args.clone();
        let mut typer = Typer::new(self.model, self.env, &mut self.errors, true);
        for (kind, arg) in parts {
            typer.run(arg)?;
            let ty = typer.ty(arg);
            let expected = match kind {
                PartKind::Anon if !ty.same_kind(&Type::par_int()) => "int",
                PartKind::AnonSet if !ty.is_subtype_of(&Type::par_set_int(), false) => "set of int",
                _ => continue,
            };
            return Err(TypeCheckError::mismatch(
                typer.span(arg),
                format!(
                    "anonymous enum initializer must be of type `{expected}', but is `{}'",
                    typer.show(ty)
                ),
            ));
        }
        Ok(())
    }

    /// Pass 2: type every item, checking initializers and bodies.
    #[tracing::instrument(level = "debug", skip_all)]
    pub(super) fn check_items(&mut self) -> Result<(), TypeCheckError> {
        {
            let mut typer = Typer::new(self.model, self.env, &mut self.errors, true);
            for item in &mut self.items {
                if item.removed {
                    continue;
                }
                match &mut item.kind {
                    ItemKind::VarDecl(decl) => check_var_decl(&mut typer, *decl)?,
                    ItemKind::Constraint(e) => *e = check_constraint(&mut typer, *e)?,
                    ItemKind::Solve(si) => check_solve(&mut typer, si)?,
                    ItemKind::Output { expr, anns } => check_output(&mut typer, *expr, anns)?,
                    ItemKind::Function(fid) => check_function(&mut typer, *fid)?,
                    ItemKind::Assign { .. } | ItemKind::Include { .. } => {}
                }
            }
        }
        tracing::debug!(errors = self.errors.len(), "typed all items");
        Ok(())
    }
}

fn check_var_decl(typer: &mut Typer<'_>, decl: ExprId) -> Result<(), TypeCheckError> {
    typer.run(decl)?;
    let Some(vd) = typer.model.var_decl(decl).cloned() else {
        return Ok(());
    };
    let ty = typer.ty(decl);
    let span = typer.span(decl);
    let name = typer.model.symbol_str(vd.id);

    let has_domain = typer
        .model
        .type_inst(vd.ti)
        .is_some_and(|t| t.domain.is_some());
    if ty.is_var() && ty.is_set() && vd.init.is_none() && !has_domain {
        typer.errors.push(TypeCheckError::invalid_type_inst(
            span,
            format!("set element type for `{name}' is not finite"),
        ));
    }

    let output_only = typer.env.names.output_only;
    let is_output_only = typer.model.arena.get(decl).anns.iter().any(|&a| {
        matches!(typer.kind(a), ExprKind::Id(ident) if ident.sym.name == output_only)
    });
    if is_output_only {
        match vd.init {
            None => typer.errors.push(TypeCheckError::invalid_type_inst(
                span,
                "variables annotated with ::output_only must have a right hand side",
            )),
            Some(init) if typer.ty(init).is_var() => {
                typer.errors.push(TypeCheckError::invalid_type_inst(
                    span,
                    "variables annotated with ::output_only must be par",
                ));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn check_constraint(typer: &mut Typer<'_>, e: ExprId) -> Result<ExprId, TypeCheckError> {
    typer.run(e)?;
    let target = Type::var_bool();
    let e = typer.coerce(e, target)?;
    let ty = typer.ty(e);
    if !typer.env.enums.is_subtype(ty, target, true) {
        typer.errors.push(TypeCheckError::mismatch(
            typer.span(e),
            format!(
                "invalid type of constraint, expected `{}', actual `{}'",
                typer.show(target),
                typer.show(ty)
            ),
        ));
    }
    Ok(e)
}

/// Item-level annotations must be of type `ann`.
fn check_annotations(typer: &mut Typer<'_>, anns: &[ExprId]) -> Result<(), TypeCheckError> {
    for &a in anns {
        typer.run(a)?;
        let ty = typer.ty(a);
        if !ty.is_ann() {
            typer.errors.push(TypeCheckError::new(
                TypeErrorKind::AnnotationTypeMismatch,
                typer.span(a),
                format!("expected annotation, got `{}'", typer.show(ty)),
            ));
        }
    }
    Ok(())
}

/// Objectives are `int` or `float`: `bool` is counted as `int`, optional
/// values go through `objective_deopt_`.
fn check_solve(typer: &mut Typer<'_>, si: &mut SolveItem) -> Result<(), TypeCheckError> {
    check_annotations(typer, &si.anns)?;
    let Some(mut obj) = si.objective else {
        return Ok(());
    };
    typer.run(obj)?;
    let span = typer.span(obj);
    let mut et = typer.ty(obj);
    let scalar = |t: Type| t.dim == 0 && !t.is_set();

    if scalar(et) && et.is_bool() {
        obj = typer.coerce(obj, Type::var_int().with_opt(et.is_opt()))?;
        et = typer.ty(obj);
    }
    if scalar(et) && et.is_opt() && (et.is_int() || et.is_float()) {
        let is_max = typer.model.bool_lit(si.goal == SolveGoal::Maximize);
        let deopt = typer.env.names.objective_deopt;
        obj = resolved_call(typer.model, typer.env, deopt, vec![obj, is_max], span, false)?;
        et = typer.ty(obj);
    }
    if !(scalar(et) && (et.is_int() || et.is_float())) {
        typer.errors.push(TypeCheckError::new(
            TypeErrorKind::ObjectiveTypeMismatch,
            span,
            format!(
                "objective has invalid type, expected int or float, actual `{}'",
                typer.show(et)
            ),
        ));
    }
    si.objective = Some(obj);
    Ok(())
}

fn check_output(typer: &mut Typer<'_>, expr: ExprId, anns: &[ExprId]) -> Result<(), TypeCheckError> {
    check_annotations(typer, anns)?;
    typer.run(expr)?;
    let ty = typer.ty(expr);
    let strings = Type::par_string().with_dim(1);
    if !(ty.same_kind(&strings) || ty.same_kind(&Type::bot().with_dim(1))) {
        typer.errors.push(TypeCheckError::mismatch(
            typer.span(expr),
            format!(
                "invalid type in output item, expected `{}', actual `{}'",
                typer.show(strings),
                typer.show(ty)
            ),
        ));
    }
    Ok(())
}

fn check_function(typer: &mut Typer<'_>, fid: FnId) -> Result<(), TypeCheckError> {
    let f = typer.model.fun(fid).clone();
    check_annotations(typer, &f.anns)?;
    typer.run(f.ti)?;
    check_ti_vars(typer, &f);
    let Some(body) = f.body else {
        return Ok(());
    };
    typer.run(body)?;
    if mentions_ti_var(typer.model, f.ti) {
        return Ok(());
    }

    let mut rt = typer.ty(f.ti);
    let bt = typer.ty(body);
    if !typer.env.enums.is_subtype(bt, rt, true) {
        typer.errors.push(TypeCheckError::mismatch(
            typer.span(body),
            format!(
                "return type of function does not match body, declared type is `{}', body type is `{}'",
                typer.show(rt),
                typer.show(bt)
            ),
        ));
        return Ok(());
    }
    let all_par = f.params.iter().all(|&p| typer.ty(p).is_par());
    if bt.is_par() && !bt.cv() && rt.is_var() && all_par {
        rt = rt.to_par();
        typer.set_ty(f.ti, rt);
    }
    let body = typer.coerce(body, rt)?;
    typer.model.fun_mut(fid).body = Some(body);
    Ok(())
}

fn show_ti_var(typer: &Typer<'_>, name: Name, is_enum: bool) -> String {
    let dollars = if is_enum { "$$" } else { "$" };
    format!("{dollars}{}", typer.model.name_str(name))
}

/// A type-inst variable is either always an array or never one, and the
/// return type only uses variables bound by the parameters.
fn check_ti_vars(typer: &mut Typer<'_>, f: &FunctionDecl) {
    let mut seen: Vec<(Name, bool)> = Vec::new();
    let mut defined: Vec<Name> = Vec::new();
    for &p in &f.params {
        let Some(ti) = typer.model.var_decl(p).map(|vd| vd.ti) else {
            continue;
        };
        let ranges = typer
            .model
            .type_inst(ti)
            .map(|t| t.ranges.clone())
            .unwrap_or_default();
        defined.extend(ranges.iter().filter_map(|&r| ti_var(typer.model, r)).map(|(n, _)| n));
        let Some((name, is_enum)) = ti_var(typer.model, ti) else {
            continue;
        };
        defined.push(name);
        let is_array = !ranges.is_empty();
        match seen.iter().find(|(n, _)| *n == name) {
            Some(&(_, was_array)) if was_array != is_array => {
                let message = format!(
                    "type-inst variable {} used in both array and non-array position",
                    show_ti_var(typer, name, is_enum)
                );
                typer
                    .errors
                    .push(TypeCheckError::invalid_type_inst(typer.span(p), message));
            }
            Some(_) => {}
            None => seen.push((name, is_array)),
        }
    }
    if let Some((name, is_enum)) = ti_var(typer.model, f.ti) {
        if !defined.contains(&name) {
            let message = format!(
                "type-inst variable {} used in return type but not defined in argument list",
                show_ti_var(typer, name, is_enum)
            );
            typer
                .errors
                .push(TypeCheckError::invalid_type_inst(typer.span(f.ti), message));
        }
    }
}
