//! Comprehensions and their generators.
//!
//! Filters are pushed as far forward as their variables allow:
//!
//! ```text
//! [ e | i in S, j in T where p(i) /\ q(i, j) ]
//!   ==> [ e | i in S where p(i), j in T where q(i, j) ]
//! ```

use rustc_hash::FxHashSet;

use mzn_ir::ast::{BinOpKind, ExprKind, Generator};
use mzn_ir::visit::preorder;
use mzn_ir::{CopyMap, ExprId, Type};

use super::{type_expr, type_opt, Typer};
use crate::TypeCheckError;

/// Type the generators in order, then the body.
pub(crate) fn type_generators(typer: &mut Typer<'_>, e: ExprId) -> Result<(), TypeCheckError> {
    let ExprKind::Comprehension {
        body, generators, ..
    } = typer.kind(e).clone()
    else {
        return Err(TypeCheckError::internal(typer.span(e), "expected a comprehension"));
    };
    for g in &generators {
        if g.source.is_some() {
            type_opt(typer, g.source)?;
            type_generator(typer, g)?;
            for &d in &g.decls {
                type_expr(typer, d)?;
            }
            type_opt(typer, g.where_clause)?;
        } else {
            type_opt(typer, g.where_clause)?;
            type_generator(typer, g)?;
            for &d in &g.decls {
                type_expr(typer, d)?;
            }
        }
    }
    type_expr(typer, body)
}

/// Give the generator's declarations their type from the source (or, for
/// an assignment generator, from its value).
fn type_generator(typer: &mut Typer<'_>, g: &Generator) -> Result<(), TypeCheckError> {
    let ty = match (g.source, g.where_clause) {
        (Some(src), _) => {
            let st = typer.ty(src);
            if st.dim == 0 && st.is_set() && (st.is_int() || st.is_bot()) && !st.is_opt() {
                Type::par_int().with_enum(st.enum_id)
            } else if st.dim > 0 {
                st.element().with_enum(typer.env.enums.element_enum(st))
            } else {
                return Err(TypeCheckError::mismatch(
                    typer.span(src),
                    format!(
                        "generator expression must be (par or var) set of int or array, but is `{}'",
                        typer.show(st)
                    ),
                ));
            }
        }
        (None, Some(value)) => typer.ty(value),
        (None, None) => {
            return Err(TypeCheckError::internal(
                g.decls.first().map_or(mzn_ir::Span::DUMMY, |&d| typer.span(d)),
                "generator without source or value",
            ))
        }
    };
    for &d in &g.decls {
        typer.set_ty(d, ty);
        if let Some(ti) = typer.model.var_decl(d).map(|vd| vd.ti) {
            typer.set_ty(ti, ty);
        }
    }
    Ok(())
}

pub(crate) fn infer_comprehension(
    typer: &mut Typer<'_>,
    e: ExprId,
) -> Result<Type, TypeCheckError> {
    let ExprKind::Comprehension {
        mut body,
        generators,
        set,
    } = typer.kind(e).clone()
    else {
        return Err(TypeCheckError::internal(typer.span(e), "expected a comprehension"));
    };
    let (value, indices) = match typer.kind(body) {
        ExprKind::ArrayLit {
            elems, tuple: true, ..
        } if !set && !elems.is_empty() => {
            let (last, init) = elems.split_at(elems.len() - 1);
            (last[0], init.to_vec())
        }
        _ => (body, Vec::new()),
    };
    let mut tt = typer.ty(value);
    let (mut var, mut opt, mut cv) = (false, false, tt.cv());

    for g in &generators {
        if let Some(src) = g.source {
            let st = typer.ty(src);
            cv |= st.cv();
            if st.with_cv(false).with_enum(0) == Type::var_set_int() {
                var = true;
                cv = true;
                opt |= !set;
            }
            if let Some(w) = g.where_clause {
                let wt = typer.ty(w);
                let scalar_bool = wt.dim == 0 && !wt.is_set() && wt.is_bool() && !wt.is_opt();
                if scalar_bool && wt.is_var() {
                    if !set {
                        if typer.ty(value).is_set() {
                            return Err(TypeCheckError::mismatch(
                                typer.span(w),
                                "variable where clause not allowed in set-valued comprehension",
                            ));
                        }
                        opt = true;
                    }
                    var = true;
                    cv = true;
                } else if !scalar_bool {
                    return Err(TypeCheckError::mismatch(
                        typer.span(w),
                        format!("where clause must be bool, but is `{}'", typer.show(wt)),
                    ));
                }
                cv |= wt.cv();
            }
        }
    }

    let mut generators = push_filters_forward(typer, generators);
    for g in &mut generators {
        if let Some(src) = g.source {
            let st = typer.ty(src);
            g.source = Some(typer.coerce(src, st)?);
        }
    }

    if set {
        if tt.dim != 0 || tt.is_set() {
            return Err(TypeCheckError::mismatch(
                typer.span(body),
                format!(
                    "set comprehension expression must be scalar, but is `{}'",
                    typer.show(tt)
                ),
            ));
        }
        tt = tt.with_set(true);
        if var || tt.is_var() {
            body = typer.coerce(body, Type::var_int())?;
            tt = tt.with_base(mzn_ir::BaseType::Int);
        }
    } else {
        if tt.dim != 0 {
            return Err(TypeCheckError::mismatch(
                typer.span(body),
                "array comprehension expression cannot be an array",
            ));
        }
        let elem_enum = tt.enum_id;
        if indices.is_empty() {
            tt = tt.with_dim(1);
            tt.enum_id = typer.env.enums.register_array_enum(vec![0, elem_enum]);
        } else {
            let mut ids = Vec::with_capacity(indices.len() + 1);
            for &idx in &indices {
                let it = typer.ty(idx);
                if !it.is_par() {
                    return Err(TypeCheckError::mismatch(typer.span(idx), "index is not par"));
                }
                if !it.is_int() || it.dim != 0 || it.is_set() {
                    return Err(TypeCheckError::mismatch(
                        typer.span(idx),
                        "index is not int or enumerated type",
                    ));
                }
                ids.push(it.enum_id);
            }
            ids.push(elem_enum);
            tt = tt.with_dim(i8::try_from(indices.len()).unwrap_or(i8::MAX));
            tt.enum_id = typer.env.enums.register_array_enum(ids);
        }
    }
    if var {
        tt = tt.to_var();
    }
    if opt {
        tt = tt.with_opt(true);
    }
    if tt.is_var() && (tt.is_ann() || tt.is_string() || (tt.is_set() && !tt.is_int())) {
        return Err(TypeCheckError::mismatch(
            typer.span(e),
            format!("invalid type for comprehension: `{}'", typer.show(tt)),
        ));
    }

    if let ExprKind::Comprehension {
        body: b,
        generators: gs,
        ..
    } = &mut typer.model.arena.get_mut(e).kind
    {
        *b = body;
        *gs = generators;
    }
    Ok(tt.with_cv(cv))
}

/// Split each filter at its top-level conjunctions and attach every
/// conjunct to the latest generator declaration it mentions.
fn push_filters_forward(
    typer: &mut Typer<'_>,
    generators: Vec<Generator>,
) -> Vec<Generator> {
    // (generator index, declaration) in binding order
    let decls: Vec<(usize, ExprId)> = generators
        .iter()
        .enumerate()
        .flat_map(|(gi, g)| g.decls.iter().map(move |&d| (gi, d)))
        .collect();
    if decls.is_empty() {
        return generators;
    }
    let mut parts: Vec<Vec<ExprId>> = vec![Vec::new(); decls.len()];
    for (gi, g) in generators.iter().enumerate() {
        let (Some(_), Some(w)) = (g.source, g.where_clause) else {
            continue;
        };
        let limit = decls.iter().rposition(|&(i, _)| i == gi).unwrap_or(0);
        for conjunct in conjuncts(typer, w) {
            let used = referenced_decls(typer, conjunct);
            let mut target = decls[..=limit]
                .iter()
                .rposition(|(_, d)| used.contains(d))
                .unwrap_or(0);
            // filters cannot sit on an assignment generator
            while target < limit && generators[decls[target].0].source.is_none() {
                target += 1;
            }
            parts[target].push(conjunct);
        }
    }

    let mut out = Vec::with_capacity(generators.len());
    let mut k = 0;
    for g in generators {
        let Some(source) = g.source else {
            k += g.decls.len();
            out.push(g);
            continue;
        };
        let n = g.decls.len();
        let mut run = Vec::new();
        let mut first_run = true;
        for (j, d) in g.decls.into_iter().enumerate() {
            run.push(d);
            let attached = std::mem::take(&mut parts[k + j]);
            if attached.is_empty() && j + 1 < n {
                continue;
            }
            let src = if first_run {
                source
            } else {
                typer.model.copy_expr(&mut CopyMap::new(), source)
            };
            first_run = false;
            let where_clause = conjoin(typer, attached);
            out.push(Generator {
                decls: std::mem::take(&mut run),
                source: Some(src),
                where_clause,
            });
        }
        k += n;
    }
    out
}

fn conjuncts(typer: &Typer<'_>, w: ExprId) -> Vec<ExprId> {
    let mut out = Vec::new();
    let mut stack = vec![w];
    while let Some(c) = stack.pop() {
        match typer.kind(c) {
            ExprKind::BinOp {
                op: BinOpKind::And,
                lhs,
                rhs,
                ..
            } => {
                stack.push(*rhs);
                stack.push(*lhs);
            }
            _ => out.push(c),
        }
    }
    out
}

fn referenced_decls(typer: &Typer<'_>, e: ExprId) -> FxHashSet<ExprId> {
    let mut used = FxHashSet::default();
    preorder(&typer.model.arena, e, false, |id| {
        if let Some(decl) = typer.kind(id).as_ident().and_then(|ident| ident.decl) {
            used.insert(decl);
        }
        true
    });
    used
}

/// `a /\ b /\ ...`, typed from the parts.
fn conjoin(typer: &mut Typer<'_>, parts: Vec<ExprId>) -> Option<ExprId> {
    let mut iter = parts.into_iter();
    let first = iter.next()?;
    Some(iter.fold(first, |acc, part| {
        let (lt, rt) = (typer.ty(acc), typer.ty(part));
        let ty = if lt.is_var() || rt.is_var() {
            Type::var_bool()
        } else {
            Type::par_bool()
        };
        let span = typer.span(acc).merge(typer.span(part));
        typer.model.arena.alloc_typed(
            ExprKind::BinOp {
                op: BinOpKind::And,
                lhs: acc,
                rhs: part,
                decl: None,
            },
            span,
            ty.with_cv(lt.cv() || rt.cv()),
        )
    }))
}
