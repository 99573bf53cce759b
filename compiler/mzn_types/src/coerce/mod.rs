//! Implicit conversions.
//!
//! [`coerce`] makes an already typed expression fit a required type by
//! wrapping it in a conversion call, and returns the id the parent must
//! point at from now on. In order:
//!
//! 1. an array access that still has array type is a slice and becomes a
//!    `slice_<n>d` call (see [`slice`]);
//! 2. same dimensions and compatible base types need nothing;
//! 3. a par set used as an array goes through `set2array`;
//! 4. a `top` target or `bot` source needs nothing further;
//! 5. otherwise `bool2int`, `bool2float` or `int2float`, or an error.
//!
//! Coercing an expression to its own type is a no-op.

mod slice;

use mzn_ir::ast::ExprKind;
use mzn_ir::{BaseType, ExprId, Model, Name, Span, Type};

use crate::fns::rtype;
use crate::{CheckEnv, TypeCheckError, TypeErrorKind};

/// Coerce `e` to `target`, returning the expression to use in its place.
pub fn coerce(
    model: &mut Model,
    env: &mut CheckEnv,
    e: ExprId,
    target: Type,
) -> Result<ExprId, TypeCheckError> {
    let mut e = e;
    let ty = model.arena.ty(e);
    if ty.dim > 0 && matches!(model.arena.kind(e), ExprKind::ArrayAccess { .. }) {
        e = slice::rewrite_slice(model, env, e)?;
    }
    let ty = model.arena.ty(e);
    if ty.dim == target.dim
        && (target.is_bot() || target.is_top() || ty.base == target.base || ty.is_bot())
    {
        return Ok(e);
    }
    if ty.dim == 0 && target.dim != 0 {
        let span = model.arena.span(e);
        if ty.is_var() {
            return Err(invalid(span, "cannot coerce var set into array"));
        }
        if ty.is_opt() {
            return Err(invalid(span, "cannot coerce opt set into array"));
        }
        e = resolved_call(model, env, env.names.set2array, vec![e], span, false)?;
    }
    let ty = model.arena.ty(e);
    if target.is_top() || ty.base == target.base || ty.is_bot() {
        return Ok(e);
    }
    let conversion = match (ty.base, target.base) {
        (BaseType::Bool, BaseType::Int) => Some(env.names.bool2int),
        (BaseType::Bool, BaseType::Float) => Some(env.names.bool2float),
        (BaseType::Int, BaseType::Float) => Some(env.names.int2float),
        _ => None,
    };
    let span = model.arena.span(e);
    let fid = conversion.and_then(|name| env.fns.match_types(&env.enums, name, &[ty], false));
    let (Some(name), Some(fid)) = (conversion, fid) else {
        return Err(invalid(
            span,
            format!(
                "cannot determine coercion from type {} to type {}",
                env.show(model, ty),
                env.show(model, target)
            ),
        ));
    };
    let rt = rtype(model, &mut env.enums, fid, &[ty]);
    let rt = rt.with_cv(ty.cv() || rt.cv());
    tracing::trace!(from = %ty, to = %target, conversion = model.name_str(name), "coercion");
    Ok(model.arena.alloc_typed(
        ExprKind::Call {
            name,
            args: vec![e],
            decl: Some(fid),
        },
        span,
        rt,
    ))
}

/// A call to `name` over already typed `args`, resolved and typed.
pub(crate) fn resolved_call(
    model: &mut Model,
    env: &mut CheckEnv,
    name: Name,
    args: Vec<ExprId>,
    span: Span,
    strict_enums: bool,
) -> Result<ExprId, TypeCheckError> {
    let types: Vec<Type> = args.iter().map(|&a| model.arena.ty(a)).collect();
    let fid = env
        .fns
        .resolve(model, &env.enums, name, &types, strict_enums, span)?;
    let ty = rtype(model, &mut env.enums, fid, &types);
    Ok(model.arena.alloc_typed(
        ExprKind::Call {
            name,
            args,
            decl: Some(fid),
        },
        span,
        ty,
    ))
}

fn invalid(span: Span, message: impl Into<String>) -> TypeCheckError {
    TypeCheckError::new(TypeErrorKind::InvalidCoercion, span, message)
}
