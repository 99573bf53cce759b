//! Set and array literals, identifiers.

use mzn_ir::ast::ExprKind;
use mzn_ir::{BaseType, ExprId, Inst, Type};

use super::Typer;
use crate::TypeCheckError;

/// Running join of element base types for a literal.
///
/// `Unknown` means no element has been seen yet; `bot` elements never
/// change the result.
fn join_base(acc: Type, et: Type) -> Option<BaseType> {
    if acc.is_unknown() || acc.is_bot() {
        return Some(et.base);
    }
    if et.is_bot() || Type::bt_subtype(&et, &acc, false) {
        return Some(acc.base);
    }
    if Type::bt_subtype(&acc, &et, false) {
        return Some(et.base);
    }
    None
}

/// Tracks whether every element agrees on an enum.
#[derive(Default)]
struct EnumVote(Option<u32>);

impl EnumVote {
    fn add(&mut self, id: u32) {
        self.0 = match self.0 {
            None => Some(id),
            Some(prev) if prev == id => Some(prev),
            Some(_) => Some(0),
        };
    }

    fn result(&self) -> u32 {
        self.0.unwrap_or(0)
    }
}

pub(crate) fn infer_set_lit(typer: &mut Typer<'_>, e: ExprId) -> Result<Type, TypeCheckError> {
    let ExprKind::SetLit { elems, isv } = typer.kind(e).clone() else {
        return Err(TypeCheckError::internal(typer.span(e), "expected a set literal"));
    };
    if isv.is_some() {
        return Ok(Type::par_set_int().with_enum(typer.ty(e).enum_id));
    }
    let mut ty = Type::unknown();
    let mut enums = EnumVote::default();
    let (mut var, mut cv) = (false, false);
    for &el in &elems {
        if matches!(typer.kind(el), ExprKind::Absent) {
            continue;
        }
        let et = typer.ty(el).with_opt(false);
        if et.dim != 0 {
            return Err(TypeCheckError::non_uniform(
                typer.span(el),
                "set literals cannot contain arrays",
            ));
        }
        if et.is_set() {
            return Err(TypeCheckError::non_uniform(
                typer.span(el),
                "set literals cannot contain sets",
            ));
        }
        var |= et.is_var();
        cv |= et.cv();
        enums.add(et.enum_id);
        match join_base(ty, et) {
            Some(base) => ty.base = base,
            None => {
                return Err(TypeCheckError::non_uniform(
                    typer.span(el),
                    "non-uniform set literal",
                ))
            }
        }
    }
    if ty.is_unknown() {
        ty.base = BaseType::Bot;
    }
    let mut ty = ty
        .with_set(true)
        .with_enum(enums.result())
        .with_inst(if var { Inst::Var } else { Inst::Par });
    if var && !ty.is_int() && !ty.is_bot() {
        if !ty.is_bool() {
            return Err(TypeCheckError::mismatch(
                typer.span(e),
                "cannot coerce set literal element to var int",
            ));
        }
        ty.base = BaseType::Int;
    }

    let target = ty.with_set(false);
    let mut coerced = Vec::with_capacity(elems.len());
    for el in elems {
        if matches!(typer.kind(el), ExprKind::Absent) {
            coerced.push(el);
        } else {
            coerced.push(typer.coerce(el, target)?);
        }
    }
    if let ExprKind::SetLit { elems, .. } = &mut typer.model.arena.get_mut(e).kind {
        *elems = coerced;
    }
    Ok(ty.with_cv(cv))
}

pub(crate) fn infer_array_lit(typer: &mut Typer<'_>, e: ExprId) -> Result<Type, TypeCheckError> {
    let ExprKind::ArrayLit { elems, dims, tuple } = typer.kind(e).clone() else {
        return Err(TypeCheckError::internal(typer.span(e), "expected an array literal"));
    };
    if tuple {
        let var = elems.iter().any(|&el| typer.ty(el).is_var());
        let inst = if var { Inst::Var } else { Inst::Par };
        return Ok(Type::par(BaseType::Tuple).with_inst(inst));
    }
    let dim = i8::try_from(dims.len()).unwrap_or(i8::MAX);

    let mut ty = Type::unknown();
    let mut anons = Vec::new();
    let mut enums = EnumVote::default();
    let mut set: Option<bool> = None;
    let (mut var, mut cv, mut opt, mut absents) = (false, false, false, false);
    for &el in &elems {
        let et = typer.ty(el);
        if et.dim != 0 {
            return Err(TypeCheckError::non_uniform(
                typer.span(el),
                "arrays cannot be elements of arrays",
            ));
        }
        if typer.kind(el).is_anon() {
            anons.push(el);
            continue;
        }
        var |= et.is_var();
        cv |= et.cv();
        opt |= et.is_opt();
        if et.is_bot() && et.is_opt() && !et.is_set() {
            absents = true;
            continue;
        }
        match set {
            None => set = Some(et.is_set()),
            Some(s) if s != et.is_set() => {
                return Err(TypeCheckError::non_uniform(
                    typer.span(el),
                    "non-uniform array literal",
                ));
            }
            Some(_) => {}
        }
        enums.add(et.enum_id);
        match join_base(ty, et) {
            Some(base) => ty.base = base,
            None => {
                return Err(TypeCheckError::non_uniform(
                    typer.span(el),
                    "non-uniform array literal",
                ))
            }
        }
    }
    if ty.is_unknown() {
        if !anons.is_empty() {
            return Err(TypeCheckError::mismatch(
                typer.span(e),
                "array literal must contain at least one non-anonymous variable",
            ));
        }
        if absents {
            return Err(TypeCheckError::mismatch(
                typer.span(e),
                "array literal must contain at least one non-absent value",
            ));
        }
        ty.base = BaseType::Bot;
    }
    var |= !anons.is_empty();
    let set = set.unwrap_or(false);
    let mut elem = ty
        .with_set(set)
        .with_opt(opt)
        .with_inst(if var { Inst::Var } else { Inst::Par });
    if var && set && !elem.is_int() && !elem.is_bot() {
        if !elem.is_bool() {
            return Err(TypeCheckError::mismatch(
                typer.span(e),
                "cannot coerce array element to var set of int",
            ));
        }
        elem.base = BaseType::Int;
    }
    for &anon in &anons {
        typer.set_ty(anon, elem.with_opt(false));
    }

    let mut coerced = Vec::with_capacity(elems.len());
    for el in elems {
        if typer.kind(el).is_anon() || matches!(typer.kind(el), ExprKind::Absent) {
            coerced.push(el);
        } else {
            coerced.push(typer.coerce(el, elem)?);
        }
    }
    if let ExprKind::ArrayLit { elems, .. } = &mut typer.model.arena.get_mut(e).kind {
        *elems = coerced;
    }

    let elem_enum = enums.result();
    let enum_id = if elem_enum == 0 {
        0
    } else {
        let mut ids = vec![0; dims.len()];
        ids.push(elem_enum);
        typer.env.enums.register_array_enum(ids)
    };
    Ok(elem.with_dim(dim).with_enum(enum_id).with_cv(cv))
}

pub(crate) fn infer_id(typer: &mut Typer<'_>, e: ExprId) -> Result<Type, TypeCheckError> {
    let decl = typer.kind(e).as_ident().and_then(|ident| ident.decl);
    let Some(decl) = decl else {
        let ty = typer.ty(e);
        if ty.is_unknown() {
            let name = typer
                .kind(e)
                .as_ident()
                .map(|ident| typer.model.symbol_str(ident.sym))
                .unwrap_or_default();
            return Err(TypeCheckError::internal(
                typer.span(e),
                format!("identifier `{name}' is not bound to a declaration"),
            ));
        }
        return Ok(ty);
    };
    let mut ty = typer.ty(decl);
    if ty.is_unknown() {
        if let Some(ti) = typer.model.var_decl(decl).map(|vd| vd.ti) {
            ty = typer.ty(ti);
            typer.set_ty(decl, ty);
        }
    }
    Ok(ty)
}
