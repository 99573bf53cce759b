//! Array access and slicing.

use mzn_ir::ast::{BinOpKind, ExprKind};
use mzn_ir::{ExprId, Type};

use super::Typer;
use crate::{TypeCheckError, TypeErrorKind};

/// An index that stands for "the whole dimension" or an open-ended part of
/// it, and so takes on the dimension's enum: `..`, `a..`, `..b`, `..<` and
/// friends.
fn inherits_dimension_enum(typer: &Typer<'_>, idx: ExprId) -> bool {
    match typer.kind(idx) {
        ExprKind::SetLit { isv: Some(isv), .. } => {
            isv.min().is_some_and(|v| !v.is_finite()) || isv.max().is_some_and(|v| !v.is_finite())
        }
        ExprKind::BinOp {
            op: BinOpKind::DotDot,
            lhs,
            rhs,
            ..
        } => [*lhs, *rhs]
            .iter()
            .any(|&side| matches!(typer.kind(side), ExprKind::IntLit(v) if !v.is_finite())),
        ExprKind::Call { name, args, .. } => args.is_empty() && typer.env.names.is_open_marker(*name),
        _ => false,
    }
}

pub(crate) fn infer_array_access(
    typer: &mut Typer<'_>,
    e: ExprId,
) -> Result<Type, TypeCheckError> {
    let ExprKind::ArrayAccess { mut base, mut indices } = typer.kind(e).clone() else {
        return Err(TypeCheckError::internal(typer.span(e), "expected an array access"));
    };
    let mut bt = typer.ty(base);
    if bt.dim == 0 {
        if !bt.is_set() {
            return Err(TypeCheckError::mismatch(
                typer.span(base),
                format!(
                    "array access attempted on expression of type `{}'",
                    typer.show(bt)
                ),
            ));
        }
        base = typer.coerce(base, bt.with_set(false).with_dim(1))?;
        bt = typer.ty(base);
    } else if matches!(typer.kind(base), ExprKind::ArrayAccess { .. }) {
        base = typer.coerce(base, bt)?;
        bt = typer.ty(base);
    }
    if bt.dim > 0 && indices.len() != bt.dim.unsigned_abs() as usize {
        let n = indices.len();
        return Err(typer.error(
            TypeErrorKind::ArityMismatch,
            e,
            format!(
                "{}-dimensional array accessed with {n} expression{}",
                bt.dim,
                if n == 1 { "" } else { "s" }
            ),
        ));
    }

    let components = typer.env.enums.array_components(bt);
    let elem_enum = components.last().copied().unwrap_or(0);
    let mut result_enums = Vec::new();
    let (mut var_index, mut slice, mut opt, mut cv) = (false, false, false, bt.cv());
    let multi = indices.len() > 1;
    for (i, idx) in indices.iter_mut().enumerate() {
        if typer.kind(*idx).is_anon() {
            typer.set_ty(*idx, Type::var_int());
        }
        let mut it = typer.ty(*idx);
        let dim_enum = components.get(i).copied().unwrap_or(0);
        if dim_enum != 0 && it.enum_id != dim_enum {
            if it.enum_id == 0 && inherits_dimension_enum(typer, *idx) {
                it = it.with_enum(dim_enum);
                typer.set_ty(*idx, it);
            } else {
                let position = if multi {
                    format!("{} ", i + 1)
                } else {
                    String::new()
                };
                return Err(TypeCheckError::mismatch(
                    typer.span(*idx),
                    format!(
                        "array index {position}must be `{}', but is `{}'",
                        typer.env.enums.enum_name(typer.model, dim_enum),
                        typer.show(it)
                    ),
                ));
            }
        }
        if it.dim != 0 || !(it.is_int() || it.is_bool() || it.is_bot()) {
            return Err(TypeCheckError::mismatch(
                typer.span(*idx),
                format!(
                    "array index must be `int' or `set of int', but is `{}'",
                    typer.show(it)
                ),
            ));
        }
        cv |= it.cv();
        if it.is_set() {
            if it.is_var() {
                var_index = true;
            }
            slice = true;
            result_enums.push(it.enum_id);
            *idx = typer.coerce(*idx, Type::var_set_int())?;
        } else {
            opt |= it.is_opt();
            var_index |= it.is_var();
            *idx = typer.coerce(*idx, Type::var_int())?;
        }
    }
    if slice && var_index {
        return Err(TypeCheckError::mismatch(
            typer.span(e),
            "array slicing with variable range or index not supported",
        ));
    }

    let mut tt = bt.element();
    if var_index {
        tt = tt.to_var();
        if tt.is_ann() || tt.is_string() {
            return Err(TypeCheckError::mismatch(
                typer.span(e),
                format!(
                    "array access using a variable not supported for array of {}",
                    tt.base.as_str()
                ),
            ));
        }
    }
    if opt {
        tt = tt.with_opt(true);
    }
    let n_dims = result_enums.len();
    tt = tt.with_dim(i8::try_from(n_dims).unwrap_or(i8::MAX));
    tt.enum_id = if n_dims == 0 {
        elem_enum
    } else if elem_enum == 0 && result_enums.iter().all(|&id| id == 0) {
        0
    } else {
        result_enums.push(elem_enum);
        typer.env.enums.register_array_enum(result_enums)
    };

    if let ExprKind::ArrayAccess {
        base: b,
        indices: ix,
    } = &mut typer.model.arena.get_mut(e).kind
    {
        *b = base;
        *ix = indices;
    }
    Ok(tt.with_cv(cv))
}
