//! Variable declarations.

use mzn_ir::ast::{BinOpKind, ExprKind, Ident};
use mzn_ir::{ExprId, Type};

use super::Typer;
use crate::eval::eval_int;
use crate::fns::{mentions_ti_var, rtype};
use crate::TypeCheckError;

pub(crate) fn infer_var_decl(typer: &mut Typer<'_>, e: ExprId) -> Result<Type, TypeCheckError> {
    let Some(vd) = typer.model.var_decl(e).cloned() else {
        return Err(TypeCheckError::internal(typer.span(e), "expected a declaration"));
    };
    let mut vdt = typer.ty(vd.ti);
    if !typer.check_init() {
        return Ok(vdt);
    }
    let name = typer.model.symbol_str(vd.id);
    if vd.toplevel && mentions_ti_var(typer.model, vd.ti) {
        typer.errors.push(TypeCheckError::invalid_type_inst(
            typer.span(e),
            format!("type-inst variables not allowed in type-inst for `{name}'"),
        ));
    }
    if let Some(init) = vd.init {
        vdt = check_initializer(typer, e, &name, vdt, init)?;
        typer.set_ty(vd.ti, vdt);
    }
    add_annotated_expressions(typer, e, vdt)?;
    Ok(vdt)
}

/// Check `init` against the declared type and coerce it. Returns the
/// declared type, refined where it was left open (`any`, `_` index sets).
fn check_initializer(
    typer: &mut Typer<'_>,
    e: ExprId,
    name: &str,
    mut vdt: Type,
    init: ExprId,
) -> Result<Type, TypeCheckError> {
    let ti = typer.model.var_decl(e).map(|vd| vd.ti);
    let is_enum_ti = ti
        .and_then(|ti| typer.model.type_inst(ti))
        .is_some_and(|t| t.is_enum);
    let mut vet = typer.ty(init);

    // literal index sets adopt the declared enums
    let literal = matches!(
        typer.kind(init),
        ExprKind::ArrayLit { .. }
            | ExprKind::Comprehension { .. }
            | ExprKind::BinOp {
                op: BinOpKind::PlusPlus,
                ..
            }
    );
    if vdt.dim > 0 && !vdt.is_any() && vdt.enum_id != 0 && vet.dim == vdt.dim && literal {
        let declared = typer.env.enums.array_components(vdt);
        let mut ids = declared[..declared.len() - 1].to_vec();
        ids.push(typer.env.enums.element_enum(vet));
        vet.enum_id = typer.env.enums.register_array_enum(ids);
        typer.set_ty(init, vet);
    }
    if is_enum_ti
        && matches!(typer.kind(init), ExprKind::Call { name, .. } if *name == typer.env.names.anon_enum)
    {
        vet = vet.with_enum(vdt.enum_id);
        typer.set_ty(init, vet);
    }

    let mut init = init;
    if vdt.is_any() || vdt.is_unknown() {
        vdt = vet.with_any(false);
        if let Some(ti) = ti {
            let ranges = typer
                .model
                .type_inst(ti)
                .map(|t| t.ranges.clone())
                .unwrap_or_default();
            for r in ranges {
                typer.set_ty(r, Type::par_int());
            }
        }
    } else if !typer.env.enums.is_subtype(vet, vdt, true) {
        let empty_literal = matches!(typer.kind(init), ExprKind::ArrayLit { elems, .. } if elems.is_empty());
        if vet.is_bot() && vet.dim == 1 && vdt.dim > 0 && empty_literal {
            let dims = vec![(1, 0); vdt.dim.unsigned_abs() as usize];
            init = typer.model.arena.alloc_typed(
                ExprKind::ArrayLit {
                    elems: Vec::new(),
                    dims,
                    tuple: false,
                },
                typer.span(init),
                vdt,
            );
        } else if !(is_enum_ti && vet.is_par_set_of_int()) {
            let message = format!(
                "initialisation value for `{name}' has invalid type-inst: expected `{}', actual `{}'",
                typer.show(vdt),
                typer.show(vet)
            );
            typer
                .errors
                .push(TypeCheckError::mismatch(typer.span(init), message));
            return Ok(vdt);
        }
    } else {
        init = typer.coerce(init, vdt)?;
    }
    if let Some(vd) = typer.model.var_decl_mut(e) {
        vd.init = Some(init);
    }

    if let Some(ti) = ti {
        vdt = adopt_anonymous_index_sets(typer, ti, vdt, typer.ty(init));
    }
    Ok(vdt)
}

/// Index sets declared as `_` take the enum of the initializer's
/// corresponding dimension and lose their placeholder domain.
fn adopt_anonymous_index_sets(typer: &mut Typer<'_>, ti: ExprId, vdt: Type, vet: Type) -> Type {
    let ranges = typer
        .model
        .type_inst(ti)
        .map(|t| t.ranges.clone())
        .unwrap_or_default();
    let anon: Vec<(usize, ExprId)> = ranges
        .iter()
        .enumerate()
        .filter(|&(_, &r)| {
            typer
                .model
                .type_inst(r)
                .and_then(|t| t.domain)
                .is_some_and(|d| typer.kind(d).is_anon())
        })
        .map(|(i, &r)| (i, r))
        .collect();
    if anon.is_empty() {
        return vdt;
    }
    let from = typer.env.enums.array_components(vet);
    let mut ids = typer.env.enums.array_components(vdt);
    for (i, r) in anon {
        let id = from.get(i).copied().unwrap_or(0);
        if let Some(slot) = ids.get_mut(i) {
            *slot = id;
        }
        typer.set_ty(r, Type::par_int().with_enum(id));
        if let ExprKind::TypeInst(t) = &mut typer.model.arena.get_mut(r).kind {
            t.domain = None;
        }
    }
    let mut vdt = vdt;
    vdt.enum_id = typer.env.enums.register_array_enum(ids);
    vdt
}

/// Annotations whose function takes the annotated declaration as an
/// argument (`mzn_add_annotated_expression(i)`) are re-resolved with a
/// reference to the declaration inserted at position `i`.
fn add_annotated_expressions(
    typer: &mut Typer<'_>,
    e: ExprId,
    vdt: Type,
) -> Result<(), TypeCheckError> {
    let anns = typer.model.arena.get(e).anns.clone();
    if anns.is_empty() {
        return Ok(());
    }
    let marker = typer.env.names.mzn_add_annotated_expression;
    let index_of = |typer: &Typer<'_>, tags: &[ExprId]| {
        tags.iter().find_map(|&t| match typer.kind(t) {
            ExprKind::Call { name, args, .. } if *name == marker && args.len() == 1 => Some(args[0]),
            _ => None,
        })
    };
    let mut rewritten = anns.clone();
    for (slot, &ann) in rewritten.iter_mut().zip(&anns) {
        let (name, args, idx) = match typer.kind(ann).clone() {
            ExprKind::Id(Ident {
                sym,
                decl: Some(atom),
            }) => {
                let tags = typer.model.arena.get(atom).anns.clone();
                match index_of(typer, &tags) {
                    Some(idx) => (sym.name, Vec::new(), idx),
                    None => continue,
                }
            }
            ExprKind::Call {
                name,
                args,
                decl: Some(fid),
            } => {
                let tags = typer.model.fun(fid).anns.clone();
                match index_of(typer, &tags) {
                    Some(idx) => (name, args, idx),
                    None => continue,
                }
            }
            _ => continue,
        };
        let span = typer.span(ann);
        let at = usize::try_from(eval_int(typer.model, idx)?).unwrap_or(0).min(args.len());
        let reference = typer.model.arena.alloc_typed(
            ExprKind::Id(Ident {
                sym: typer.model.var_decl(e).map(|vd| vd.id).unwrap_or_default(),
                decl: Some(e),
            }),
            typer.span(e),
            vdt,
        );
        let mut args = args;
        args.insert(at, reference);
        let types: Vec<Type> = args.iter().map(|&a| typer.ty(a)).collect();
        let fid = typer
            .env
            .fns
            .resolve(typer.model, &typer.env.enums, name, &types, true, span)?;
        let ty = rtype(typer.model, &mut typer.env.enums, fid, &types);
        *slot = typer.model.arena.alloc_typed(
            ExprKind::Call {
                name,
                args,
                decl: Some(fid),
            },
            span,
            ty,
        );
    }
    typer.model.arena.get_mut(e).anns = rewritten;
    Ok(())
}
