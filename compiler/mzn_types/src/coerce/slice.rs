//! Array slicing.
//!
//! `a[1, ..]` over a two-dimensional `a` becomes
//!
//! ```text
//! slice_1d(a, [1..1, ..], index_set_2of2(a))
//! ```
//!
//! The second argument lists one set per source dimension; the rest list
//! the index sets of the result, one per set-valued index.

use mzn_ir::ast::{BinOpKind, ExprKind, Ident, VarDecl};
use mzn_ir::{ExprId, Model, Span, Type};

use super::resolved_call;
use crate::{CheckEnv, TypeCheckError};

/// Rewrite the slice `access` into a `slice_<n>d` call.
pub(super) fn rewrite_slice(
    model: &mut Model,
    env: &mut CheckEnv,
    access: ExprId,
) -> Result<ExprId, TypeCheckError> {
    let span = model.arena.span(access);
    let ExprKind::ArrayAccess { base, indices } = model.arena.kind(access).clone() else {
        return Err(TypeCheckError::internal(span, "expected an array slice"));
    };
    let n_dims = indices.len();
    let mut slice = Vec::with_capacity(n_dims);
    let mut args = vec![base];
    for (i, &idx) in indices.iter().enumerate() {
        if !model.arena.ty(idx).is_set() {
            let range = point_range(model, env, idx);
            slice.push(range);
            continue;
        }
        let marker = match model.arena.kind(idx) {
            ExprKind::Call { name, args, .. } if args.is_empty() && env.names.is_open_marker(*name) => {
                Some(*name)
            }
            _ => None,
        };
        if let Some(marker) = marker {
            let index_set = index_set_of(model, env, base, i, n_dims, span)?;
            let bounded = resolved_call(model, env, marker, vec![index_set], span, false)?;
            slice.push(bounded);
            args.push(bounded);
            continue;
        }
        let isv = match model.arena.kind(idx) {
            ExprKind::SetLit { isv, .. } => isv.clone(),
            _ => None,
        };
        match isv {
            Some(isv) if isv.single_finite_range().is_some() => args.push(idx),
            Some(isv) if isv.is_unbounded() => {
                let index_set = index_set_of(model, env, base, i, n_dims, span)?;
                args.push(index_set);
            }
            _ => {
                let index_set = index_set_of(model, env, base, i, n_dims, span)?;
                let clipped = model.arena.alloc_typed(
                    ExprKind::BinOp {
                        op: BinOpKind::Intersect,
                        lhs: idx,
                        rhs: index_set,
                        decl: None,
                    },
                    span,
                    Type::par_set_int(),
                );
                args.push(clipped);
            }
        }
        slice.push(idx);
    }
    let n = args.len() - 1;
    let slice = model.arena.alloc_typed(
        ExprKind::ArrayLit {
            elems: slice,
            dims: vec![(1, i64::try_from(n_dims).unwrap_or(i64::MAX))],
            tuple: false,
        },
        span,
        Type::par_set_int().with_dim(1),
    );
    args.insert(1, slice);
    let name = model.intern(&format!("slice_{n}d"));
    resolved_call(model, env, name, args, span, false)
        .map_err(|_| TypeCheckError::internal(span, format!("missing builtin slice_{n}d")))
}

/// `idx..idx` for a scalar index, binding the index first unless it is
/// an identifier or literal.
fn point_range(model: &mut Model, env: &mut CheckEnv, idx: ExprId) -> ExprId {
    let span = model.arena.span(idx);
    let range = |model: &mut Model, lo: ExprId, hi: ExprId| {
        model.arena.alloc_typed(
            ExprKind::BinOp {
                op: BinOpKind::DotDot,
                lhs: lo,
                rhs: hi,
                decl: None,
            },
            span,
            Type::par_set_int(),
        )
    };
    if matches!(model.arena.kind(idx), ExprKind::Id(_) | ExprKind::IntLit(_)) {
        return range(model, idx, idx);
    }
    let sym = env.gen_symbol();
    let ti = model.ti(Type::par_int());
    let decl = model.arena.alloc_typed(
        ExprKind::VarDecl(VarDecl {
            id: sym,
            ti,
            init: Some(idx),
            toplevel: false,
            introduced: true,
            topo_pos: None,
        }),
        span,
        Type::par_int(),
    );
    let reference = |model: &mut Model| {
        model.arena.alloc_typed(
            ExprKind::Id(Ident {
                sym,
                decl: Some(decl),
            }),
            span,
            Type::par_int(),
        )
    };
    let lo = reference(model);
    let hi = reference(model);
    let body = range(model, lo, hi);
    model.arena.alloc_typed(
        ExprKind::Let {
            bindings: vec![decl],
            body,
        },
        span,
        Type::par_set_int(),
    )
}

/// `index_set(a)` or `index_set_<i>of<n>(a)` for dimension `i`.
fn index_set_of(
    model: &mut Model,
    env: &mut CheckEnv,
    base: ExprId,
    i: usize,
    n_dims: usize,
    span: Span,
) -> Result<ExprId, TypeCheckError> {
    let name = if n_dims == 1 {
        env.names.index_set
    } else {
        model.intern(&format!("index_set_{}of{n_dims}", i + 1))
    };
    resolved_call(model, env, name, vec![base], span, false)
}

