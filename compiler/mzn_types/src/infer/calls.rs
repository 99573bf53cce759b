//! Calls and operators.
//!
//! Operators resolve like calls to their quoted builtin names. After
//! resolution a call may be rewritten in place:
//!
//! - comparisons against `count`/`sum` of a var expression become
//!   `count_eq`, `count_leq` and so on;
//! - `symmetry_breaking_constraint`, `redundant_constraint` and
//!   `implied_constraint` become their `mzn_` builtins;
//! - a call to a function whose body only forwards its parameters to
//!   another function is redirected to that function;
//! - `show` and friends on enum values go through `_toString_<E>`;
//! - `enum_of(x)` on an enum value becomes `enum_of_internal(E)`;
//! - calls to deprecated functions are wrapped in `mzn_deprecate`.

use mzn_ir::ast::{BinOpKind, ExprKind, UnOpKind};
use mzn_ir::{CopyMap, ExprId, FnId, Name, Span, Type};

use super::{type_expr, Typer};
use crate::coerce::resolved_call;
use crate::enum_gen::to_string_name;
use crate::fns::{argtype, param_types, rtype};
use crate::{TypeCheckError, TypeCheckWarning, TypeErrorKind};

impl Typer<'_> {
    fn resolve(
        &self,
        name: Name,
        types: &[Type],
        strict: bool,
        span: Span,
    ) -> Result<FnId, TypeCheckError> {
        self.env
            .fns
            .resolve(self.model, &self.env.enums, name, types, strict, span)
    }

    fn rtype(&mut self, fid: FnId, types: &[Type]) -> Type {
        rtype(self.model, &mut self.env.enums, fid, types)
    }

    /// Replace the node `e` by a call, keeping its id.
    fn morph_into_call(&mut self, e: ExprId, name: Name, args: Vec<ExprId>, fid: FnId) {
        self.model.arena.get_mut(e).kind = ExprKind::Call {
            name,
            args,
            decl: Some(fid),
        };
    }
}

pub(crate) fn infer_binary(typer: &mut Typer<'_>, e: ExprId) -> Result<Type, TypeCheckError> {
    let ExprKind::BinOp { op, lhs, rhs, .. } = typer.kind(e).clone() else {
        return Err(TypeCheckError::internal(typer.span(e), "expected a binary operator"));
    };
    let name = typer.model.intern(op.builtin_name());
    let args = [typer.ty(lhs), typer.ty(rhs)];
    let Some(fid) = typer
        .env
        .fns
        .match_types(&typer.env.enums, name, &args, true)
    else {
        return Err(typer.error(
            TypeErrorKind::OverloadResolution,
            e,
            format!(
                "type error in operator application for `{}'. No matching operator found with left-hand side type `{}' and right-hand side type `{}'",
                op.symbol(),
                typer.show(args[0]),
                typer.show(args[1])
            ),
        ));
    };
    tracing::trace!(op = op.symbol(), ?fid, "resolved operator");
    let lhs = typer.coerce(lhs, argtype(typer.model, fid, &args, 0))?;
    let rhs = typer.coerce(rhs, argtype(typer.model, fid, &args, 1))?;
    let coerced = [typer.ty(lhs), typer.ty(rhs)];
    let rt = typer.rtype(fid, &coerced);
    let ty = rt.with_cv(rt.cv() || coerced.iter().any(Type::cv));
    let decl = typer.model.fun(fid).body.is_some().then_some(fid);
    typer.model.arena.get_mut(e).kind = ExprKind::BinOp { op, lhs, rhs, decl };

    if op.is_int_comparison() {
        rewrite_counting(typer, e, op, lhs, rhs);
    }
    Ok(ty)
}

pub(crate) fn infer_unary(typer: &mut Typer<'_>, e: ExprId) -> Result<Type, TypeCheckError> {
    let ExprKind::UnOp { op, operand, .. } = typer.kind(e).clone() else {
        return Err(TypeCheckError::internal(typer.span(e), "expected a unary operator"));
    };
    let name = typer.model.intern(op.builtin_name());
    let args = [typer.ty(operand)];
    let Some(fid) = typer
        .env
        .fns
        .match_types(&typer.env.enums, name, &args, true)
    else {
        let symbol = match op {
            UnOpKind::Not => "not",
            UnOpKind::Plus => "+",
            UnOpKind::Minus => "-",
        };
        return Err(typer.error(
            TypeErrorKind::OverloadResolution,
            e,
            format!(
                "type error in operator application for `{symbol}'. No matching operator found with type `{}'",
                typer.show(args[0])
            ),
        ));
    };
    let operand = typer.coerce(operand, argtype(typer.model, fid, &args, 0))?;
    let coerced = [typer.ty(operand)];
    let rt = typer.rtype(fid, &coerced);
    let decl = typer.model.fun(fid).body.is_some().then_some(fid);
    typer.model.arena.get_mut(e).kind = ExprKind::UnOp { op, operand, decl };
    Ok(rt.with_cv(rt.cv() || coerced[0].cv()))
}

/// `count(...) op y` and `sum(...) op y` over var arguments become the
/// dedicated counting builtins. Leaves `e` alone if none applies.
fn rewrite_counting(typer: &mut Typer<'_>, e: ExprId, op: BinOpKind, lhs: ExprId, rhs: ExprId) {
    let (lt, rt) = (typer.ty(lhs), typer.ty(rhs));
    if !lt.is_int_scalar() || !rt.is_int_scalar() {
        return;
    }
    let names = &typer.env.names;
    let is_counting = |x: ExprId| {
        typer.ty(x).is_var()
            && matches!(typer.kind(x), ExprKind::Call { name, .. } if *name == names.count || *name == names.sum)
    };
    let (call, other, op) = if is_counting(lhs) {
        (lhs, rhs, op)
    } else if is_counting(rhs) {
        (rhs, lhs, op.flipped())
    } else {
        return;
    };
    let target = match op {
        BinOpKind::Eq => "count_eq",
        BinOpKind::Nq => "count_neq",
        BinOpKind::Gq => "count_leq",
        BinOpKind::Gr => "count_lt",
        BinOpKind::Lq => "count_geq",
        BinOpKind::Le => "count_gt",
        _ => return,
    };
    let ExprKind::Call { name, args, .. } = typer.kind(call).clone() else {
        return;
    };
    let count = typer.env.names.count;

    // (array argument, new comprehension body if any, compared value)
    let (array, new_body, compared) = match args.as_slice() {
        [comp] => {
            let Some((generated, compared)) = counted_equality(typer, *comp) else {
                return;
            };
            (*comp, Some(generated), compared)
        }
        [arr, v] if name == count && typer.ty(*arr).is_int() && typer.ty(*arr).dim > 0 => {
            (*arr, None, *v)
        }
        _ => return,
    };
    let mut array_ty = typer.ty(array);
    if let Some(generated) = new_body {
        array_ty.base = typer.ty(generated).base;
    }
    let target = typer.model.intern(target);
    let types = [array_ty, typer.ty(compared), typer.ty(other)];
    let Some(fid) = typer
        .env
        .fns
        .match_types(&typer.env.enums, target, &types, true)
    else {
        return;
    };
    if let Some(generated) = new_body {
        if let ExprKind::Comprehension { body, .. } = &mut typer.model.arena.get_mut(array).kind {
            *body = generated;
        }
        typer.set_ty(array, array_ty);
    }
    tracing::trace!(target = typer.model.name_str(target), "counting rewrite");
    typer.morph_into_call(e, target, vec![array, compared, other], fid);
}

/// For a comprehension whose body is `a = b`, the side that mentions a
/// generator variable (generated) and the one that does not (compared).
fn counted_equality(typer: &Typer<'_>, comp: ExprId) -> Option<(ExprId, ExprId)> {
    let ExprKind::Comprehension {
        body, generators, ..
    } = typer.kind(comp)
    else {
        return None;
    };
    let mut eq = *body;
    if let ExprKind::Call { name, args, .. } = typer.kind(eq) {
        if *name == typer.env.names.bool2int && args.len() == 1 {
            eq = args[0];
        }
    }
    let ExprKind::BinOp {
        op: BinOpKind::Eq,
        lhs,
        rhs,
        ..
    } = typer.kind(eq)
    else {
        return None;
    };
    let bound: Vec<ExprId> = generators.iter().flat_map(|g| g.decls.iter().copied()).collect();
    let mentions_bound = |x: ExprId| {
        mzn_ir::visit::any_node(&typer.model.arena, x, |id| {
            typer
                .kind(id)
                .as_ident()
                .and_then(|ident| ident.decl)
                .is_some_and(|d| bound.contains(&d))
        })
    };
    let (generated, compared) = (*lhs, *rhs);
    if mentions_bound(compared) {
        if mentions_bound(generated) {
            return None;
        }
        return Some((compared, generated));
    }
    Some((generated, compared))
}

pub(crate) fn infer_call(typer: &mut Typer<'_>, e: ExprId) -> Result<Type, TypeCheckError> {
    let ExprKind::Call { mut name, mut args, .. } = typer.kind(e).clone() else {
        return Err(TypeCheckError::internal(typer.span(e), "expected a call"));
    };
    let span = typer.span(e);
    let mut types: Vec<Type> = args.iter().map(|&a| typer.ty(a)).collect();
    let mut fid = typer.resolve(name, &types, true, span)?;

    let names = &typer.env.names;
    let wrapper = if name == names.symmetry_breaking_constraint
        && param_types(typer.model, fid)
            .first()
            .is_some_and(|t| t.is_bool() && t.dim == 0)
        && args.len() == 1
    {
        Some(names.mzn_symmetry_breaking_constraint)
    } else if name == names.redundant_constraint || name == names.implied_constraint {
        Some(names.mzn_redundant_constraint)
    } else {
        None
    };
    if let Some(wrapper) = wrapper {
        name = wrapper;
        fid = typer.resolve(name, &types, true, span)?;
    }

    if let Some((inner, inner_anns)) = forwarded_call(typer, name, fid, &args, &types) {
        name = inner;
        fid = typer.resolve(name, &types, true, span)?;
        typer.model.arena.get_mut(e).anns.extend(inner_anns);
    }

    let mut cv = false;
    for i in 0..args.len() {
        let at = argtype(typer.model, fid, &types, i);
        let arg = args[i];
        if matches!(typer.kind(arg), ExprKind::Comprehension { .. }) {
            coerce_comprehension_body(typer, arg, at)?;
        } else {
            args[i] = typer.coerce(arg, at)?;
        }
        types[i] = typer.ty(args[i]);
        cv |= types[i].cv();
    }

    if let Some(ty) = rewrite_show(typer, e, name, &args)? {
        return Ok(ty.with_cv(cv));
    }

    if name == typer.env.names.enum_of && args.len() == 1 {
        let elem = typer.env.enums.element_enum(types[0]);
        if let Some(decl) = typer.env.enums.enum_decl(elem) {
            let enum_set = typer.model.id_of(decl);
            name = typer.env.names.enum_of_internal;
            args = vec![enum_set];
            types = vec![typer.ty(enum_set)];
            fid = typer.resolve(name, &types, false, span)?;
        }
    }

    let ty = typer.rtype(fid, &types).with_cv(cv);
    typer.morph_into_call(e, name, args.clone(), fid);

    let deprecated = typer.model.fun(fid).anns.iter().find_map(|&ann| match typer.kind(ann) {
        ExprKind::Call { name: a, args, .. }
            if *a == typer.env.names.mzn_deprecated && args.len() == 2 =>
        {
            Some((args[0], args[1]))
        }
        _ => None,
    });
    let Some((version, url)) = deprecated else {
        return Ok(ty);
    };
    wrap_deprecated(typer, e, name, args, fid, ty, version, url)
}

/// The target of a call to `fid` if its body merely forwards the
/// parameters, in order, to another function with the same overloading,
/// and no reified variant of `name` exists. Returns the inner name and the
/// annotations on the forwarding call.
fn forwarded_call(
    typer: &Typer<'_>,
    name: Name,
    fid: FnId,
    args: &[ExprId],
    types: &[Type],
) -> Option<(Name, Vec<ExprId>)> {
    let f = typer.model.fun(fid);
    let body = f.body?;
    let ExprKind::Call {
        name: inner,
        args: inner_args,
        decl: Some(_),
    } = typer.kind(body)
    else {
        return None;
    };
    let forwards = inner_args.len() == args.len()
        && inner_args.len() == f.params.len()
        && inner_args.iter().zip(&f.params).all(|(&a, &p)| {
            typer
                .kind(a)
                .as_ident()
                .and_then(|ident| ident.decl)
                .is_some_and(|d| d == p)
        });
    let inner = *inner;
    if !forwards
        || inner == name
        || !typer
            .env
            .fns
            .same_overloading(&typer.env.enums, types, name, inner)
    {
        return None;
    }
    let reif = typer
        .model
        .intern(&format!("{}_reif", typer.model.name_str(name)));
    let mut reif_types = types.to_vec();
    reif_types.push(Type::var_bool());
    if typer
        .env
        .fns
        .match_types(&typer.env.enums, reif, &reif_types, false)
        .is_some()
    {
        return None;
    }
    tracing::trace!(
        from = typer.model.name_str(name),
        to = typer.model.name_str(inner),
        "redirecting forwarding call"
    );
    Some((inner, typer.model.arena.get(body).anns.clone()))
}

/// Coerce the generated value of a comprehension argument to the element
/// type of `target`.
fn coerce_comprehension_body(
    typer: &mut Typer<'_>,
    comp: ExprId,
    target: Type,
) -> Result<(), TypeCheckError> {
    let ExprKind::Comprehension { body, .. } = typer.kind(comp).clone() else {
        return Ok(());
    };
    let tuple_value = match typer.kind(body) {
        ExprKind::ArrayLit {
            elems, tuple: true, ..
        } => elems.last().copied(),
        _ => None,
    };
    let value = tuple_value.unwrap_or(body);
    let elem = target.with_dim(0).with_enum(0);
    let coerced = typer.coerce(value, elem)?;
    if coerced == value {
        return Ok(());
    }
    let base = typer.ty(coerced).base;
    if tuple_value.is_some() {
        if let ExprKind::ArrayLit { elems, .. } = &mut typer.model.arena.get_mut(body).kind {
            if let Some(last) = elems.last_mut() {
                *last = coerced;
            }
        }
    } else if let ExprKind::Comprehension { body, .. } = &mut typer.model.arena.get_mut(comp).kind {
        *body = coerced;
    }
    let ct = typer.ty(comp);
    typer.set_ty(comp, ct.with_base(base));
    Ok(())
}

/// `show(x)` for a par enum value `x` of enum `E` becomes
/// `_toString_E(x, false, false)`; `format` gets the conversion as its
/// last argument instead.
fn rewrite_show(
    typer: &mut Typer<'_>,
    e: ExprId,
    name: Name,
    args: &[ExprId],
) -> Result<Option<Type>, TypeCheckError> {
    let names = &typer.env.names;
    if !names.is_show_like(name) {
        return Ok(None);
    }
    let (show_dzn, show_json, format) = (
        name == names.show_dzn,
        name == names.show_json,
        name == names.format,
    );
    let Some(&last) = args.last() else {
        return Ok(None);
    };
    let lt = typer.ty(last);
    if !lt.is_par() {
        return Ok(None);
    }
    let elem = typer.env.enums.element_enum(lt);
    let has_value = typer
        .env
        .enums
        .enum_decl(elem)
        .and_then(|d| typer.model.var_decl(d))
        .is_some_and(|vd| vd.init.is_some());
    if elem == 0 || !has_value {
        return Ok(None);
    }
    let span = typer.span(e);
    let value = if lt.dim > 1 {
        let array1d = typer.env.names.array1d;
        resolved_call(typer.model, typer.env, array1d, vec![last], span, false)?
    } else {
        last
    };
    let enum_name = typer.env.enums.enum_name(typer.model, elem);
    let conversion = typer
        .model
        .intern(&to_string_name("_toString_", &enum_name));
    let dzn = typer
        .model
        .arena
        .alloc_typed(ExprKind::BoolLit(show_dzn), span, Type::par_bool());
    let json = typer
        .model
        .arena
        .alloc_typed(ExprKind::BoolLit(show_json), span, Type::par_bool());
    let conv_args = vec![value, dzn, json];
    if !format {
        let types: Vec<Type> = conv_args.iter().map(|&a| typer.ty(a)).collect();
        let fid = typer.resolve(conversion, &types, false, span)?;
        let ty = typer.rtype(fid, &types);
        typer.morph_into_call(e, conversion, conv_args, fid);
        return Ok(Some(ty));
    }
    let shown = resolved_call(typer.model, typer.env, conversion, conv_args, span, false)?;
    let mut new_args = args.to_vec();
    if let Some(slot) = new_args.last_mut() {
        *slot = shown;
    }
    let types: Vec<Type> = new_args.iter().map(|&a| typer.ty(a)).collect();
    let fid = typer.resolve(name, &types, false, span)?;
    let ty = typer.rtype(fid, &types);
    typer.morph_into_call(e, name, new_args, fid);
    Ok(Some(ty))
}

/// Turn the resolved call `e` into
/// `mzn_deprecate("name", version, url, <the call>)` and record a warning.
#[allow(clippy::too_many_arguments)]
fn wrap_deprecated(
    typer: &mut Typer<'_>,
    e: ExprId,
    name: Name,
    args: Vec<ExprId>,
    fid: FnId,
    ty: Type,
    version: ExprId,
    url: ExprId,
) -> Result<Type, TypeCheckError> {
    let span = typer.span(e);
    let mut map = CopyMap::new();
    let version = typer.model.copy_expr(&mut map, version);
    let url = typer.model.copy_expr(&mut map, url);
    type_expr(typer, version)?;
    type_expr(typer, url)?;

    let original = typer.model.arena.alloc_typed(
        ExprKind::Call {
            name,
            args,
            decl: Some(fid),
        },
        span,
        ty,
    );
    let fname = typer.model.name_str(name);
    let fname_lit = typer.model.intern(fname);
    let fname_lit = typer
        .model
        .arena
        .alloc_typed(ExprKind::StringLit(fname_lit), span, Type::par_string());
    let wrapper_args = vec![fname_lit, version, url, original];
    let types: Vec<Type> = wrapper_args.iter().map(|&a| typer.ty(a)).collect();
    let deprecate = typer.env.names.mzn_deprecate;
    let wrapper = typer.resolve(deprecate, &types, false, span)?;
    let wrapped_ty = typer.rtype(wrapper, &types).with_cv(ty.cv());
    typer.morph_into_call(e, deprecate, wrapper_args, wrapper);

    let since = match typer.kind(version) {
        ExprKind::StringLit(v) => typer.model.name_str(*v),
        _ => "",
    };
    tracing::debug!(name = fname, since, "call to deprecated function");
    typer
        .env
        .warnings
        .push(TypeCheckWarning::deprecated_call(span, fname, since));
    Ok(wrapped_ty)
}
