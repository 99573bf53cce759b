//! Type-insts: index sets, domains and their enums.

use mzn_ir::ast::ExprKind;
use mzn_ir::{BaseType, ExprId, Type};

use super::Typer;
use crate::TypeCheckError;

pub(crate) fn infer_type_inst(typer: &mut Typer<'_>, e: ExprId) -> Result<Type, TypeCheckError> {
    let Some(ti) = typer.model.type_inst(e).cloned() else {
        return Err(TypeCheckError::internal(typer.span(e), "expected a type-inst"));
    };
    let mut tt = typer.ty(e);

    let mut range_enums = Vec::with_capacity(ti.ranges.len());
    let mut found_enum = false;
    for &r in &ti.ranges {
        let rt = typer.ty(r);
        if rt.is_top() {
            tt = tt.with_dim(-1);
            range_enums.push(0);
            continue;
        }
        if !(rt.is_int() && rt.dim == 0 && !rt.is_set()) {
            let domain = typer.model.type_inst(r).and_then(|t| t.domain);
            let message = match domain {
                Some(d) => format!(
                    "array index set expression has invalid type, expected `set of int', actual `{}'",
                    typer.show(typer.ty(d))
                ),
                None => format!(
                    "cannot use `{}' as array index set (did you mean `int'?)",
                    typer.show(rt)
                ),
            };
            return Err(TypeCheckError::invalid_type_inst(typer.span(r), message));
        }
        found_enum |= rt.enum_id != 0;
        range_enums.push(rt.enum_id);
    }

    let mut elem_enum = None;
    if let Some(d) = ti.domain {
        let dt = match typer.kind(d) {
            ExprKind::TiId { is_enum: false, .. } => None,
            ExprKind::TiId { is_enum: true, .. } | ExprKind::Anon => Some(Type::par_set_int()),
            _ => {
                let dt = typer.ty(d);
                if !dt.is_par() || !(dt.is_set() || dt.is_bot()) {
                    return Err(TypeCheckError::invalid_type_inst(
                        typer.span(d),
                        format!("type-inst must be par set but is `{}'", typer.show(dt)),
                    ));
                }
                if dt.dim != 0 {
                    return Err(TypeCheckError::invalid_type_inst(
                        typer.span(d),
                        "type-inst cannot be an array",
                    ));
                }
                Some(dt)
            }
        };
        if let Some(dt) = dt {
            if tt.is_unknown() {
                tt.base = match dt.base {
                    BaseType::Int | BaseType::Float => dt.base,
                    BaseType::Bot => BaseType::Int,
                    _ => {
                        return Err(TypeCheckError::invalid_type_inst(
                            typer.span(d),
                            "type-inst must be int or float",
                        ))
                    }
                };
            }
            elem_enum = Some(dt.enum_id);
        }
    }
    let elem_enum = elem_enum.unwrap_or_else(|| {
        if tt.dim > 0 {
            typer.env.enums.element_enum(tt)
        } else {
            tt.enum_id
        }
    });

    if tt.dim > 0 && (found_enum || elem_enum != 0) {
        range_enums.push(elem_enum);
        tt.enum_id = typer.env.enums.register_array_enum(range_enums);
    } else if tt.dim == 0 {
        tt.enum_id = elem_enum;
    }

    if tt.is_var() && tt.is_set() && !(tt.is_int() || tt.is_top()) {
        return Err(TypeCheckError::invalid_type_inst(
            typer.span(e),
            "var set element types other than `int' not allowed",
        ));
    }
    if tt.is_var() && (tt.is_ann() || tt.is_string()) {
        return Err(TypeCheckError::invalid_type_inst(
            typer.span(e),
            format!("invalid type of variable declaration: `{}'", typer.show(tt)),
        ));
    }
    Ok(tt)
}
