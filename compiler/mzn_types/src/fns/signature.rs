//! Return and argument types of a resolved overload.
//!
//! Builtin signatures use type-inst variables: `$T` binds a base type,
//! `$$E` binds an enum, `array[$X]` binds index sets (and, alone, any
//! number of dimensions), and `any` lets the instantiation follow the
//! arguments. Binding is a join over every argument sharing the variable.

use mzn_ir::{BaseType, ExprId, FnId, Inst, Model, Name, Type};

use super::{param_ti, ti_var};
use crate::EnumRegistry;

/// One array index position of a type-inst bound to an index variable.
fn index_vars(model: &Model, ti: ExprId) -> Vec<Option<Name>> {
    model.type_inst(ti).map_or_else(Vec::new, |t| {
        t.ranges
            .iter()
            .map(|&r| ti_var(model, r).map(|(n, _)| n))
            .collect()
    })
}

/// Element type of an argument, keeping the element enum.
fn element_of(enums: &EnumRegistry, t: Type) -> Type {
    if t.dim == 0 {
        return t;
    }
    t.with_dim(0).with_enum(enums.element_enum(t))
}

fn join(a: Type, b: Type) -> Type {
    let base = if a.base == b.base || Type::bt_subtype(&b, &a.with_enum(0), false) {
        a.base
    } else if Type::bt_subtype(&a, &b.with_enum(0), false) {
        b.base
    } else {
        a.base
    };
    let inst = if a.is_var() || b.is_var() {
        Inst::Var
    } else {
        Inst::Par
    };
    Type {
        base,
        inst,
        opt: a.opt || b.opt,
        set: a.set || b.set,
        enum_id: if a.enum_id == b.enum_id { a.enum_id } else { 0 },
        ..a
    }
}

/// Return type of `fid` applied to arguments of types `args`.
pub fn rtype(model: &Model, enums: &mut EnumRegistry, fid: FnId, args: &[Type]) -> Type {
    let f = model.fun(fid);
    let ret_ti = f.ti;
    let declared = model.arena.ty(ret_ti);
    let mut rt = declared.with_any(false);
    if declared.is_any() {
        rt.inst = Inst::Par;
        rt.opt = false;
    }
    let params: Vec<ExprId> = f.params.iter().filter_map(|&p| param_ti(model, p)).collect();

    let mut elem_enum = if declared.dim > 0 {
        enums.element_enum(declared)
    } else {
        declared.enum_id
    };

    if let Some((tv, is_enum)) = ti_var(model, ret_ti) {
        let mut bound: Option<Type> = None;
        for (i, &pti) in params.iter().enumerate() {
            let Some(&at) = args.get(i) else { break };
            if is_enum && at.dim > 0 {
                let pidx = index_vars(model, pti);
                if let Some(pos) = pidx.iter().position(|v| *v == Some(tv)) {
                    let comps = enums.array_components(at);
                    let e = comps.get(pos).copied().unwrap_or(0);
                    let elem = Type::par_int().with_enum(e);
                    bound = Some(bound.map_or(elem, |b| join(b, elem)));
                    continue;
                }
            }
            if ti_var(model, pti).map(|(n, _)| n) != Some(tv) {
                continue;
            }
            let mut elem = element_of(enums, at);
            let pty = model.arena.ty(pti);
            if pty.set {
                elem.set = false;
            }
            if pty.opt {
                elem.opt = false;
            }
            if elem.is_bot() {
                continue;
            }
            bound = Some(bound.map_or(elem, |b| join(b, elem)));
        }
        match bound {
            Some(b) if is_enum => elem_enum = b.enum_id,
            Some(b) => {
                rt.base = b.base;
                rt.set = rt.set || b.set;
                rt.opt = rt.opt || b.opt;
                elem_enum = b.enum_id;
                if declared.is_any() && b.is_var() {
                    rt.inst = Inst::Var;
                }
            }
            None if !is_enum => rt.base = BaseType::Bot,
            None => {}
        }
    } else if declared.is_any() && args.iter().any(Type::is_var) {
        rt.inst = Inst::Var;
    }

    let ret_idx = index_vars(model, ret_ti);
    let mut dim_enums: Vec<u32> = if declared.dim > 0 {
        let comps = enums.array_components(declared);
        comps[..comps.len() - 1].to_vec()
    } else {
        Vec::new()
    };
    for (k, var) in ret_idx.iter().enumerate() {
        let Some(var) = var else { continue };
        let mut found = false;
        for (i, &pti) in params.iter().enumerate() {
            let Some(&at) = args.get(i) else { break };
            let pidx = index_vars(model, pti);
            let Some(pos) = pidx.iter().position(|v| v.as_ref() == Some(var)) else {
                continue;
            };
            found = true;
            let comps = enums.array_components(at);
            let arg_dims = &comps[..comps.len() - 1];
            if declared.dim == -1 {
                rt.dim = if at.dim > 0 { at.dim } else { 1 };
                dim_enums = if at.dim > 0 {
                    arg_dims.to_vec()
                } else {
                    vec![0]
                };
            } else if let Some(slot) = dim_enums.get_mut(k) {
                let from = if model.arena.ty(pti).dim == -1 { k } else { pos };
                *slot = arg_dims.get(from).copied().unwrap_or(0);
            }
            break;
        }
        if found {
            continue;
        }
        // `set of $$E` parameter naming the index set
        let from_set = params.iter().zip(args).find_map(|(&pti, at)| {
            (ti_var(model, pti).map(|(n, _)| n) == Some(*var) && at.dim == 0).then_some(at.enum_id)
        });
        if let (Some(e), Some(slot)) = (from_set, dim_enums.get_mut(k)) {
            *slot = e;
        }
    }

    if rt.dim > 0 {
        let mut comps = dim_enums;
        comps.resize(usize::try_from(rt.dim).unwrap_or(0), 0);
        comps.push(elem_enum);
        rt.enum_id = enums.register_array_enum(comps);
    } else {
        rt.enum_id = elem_enum;
    }
    rt
}

/// Type an argument is coerced to when passed as parameter `n` of `fid`.
///
/// For a type-inst variable parameter this is the argument's own type,
/// widened to the join of every argument sharing the variable; otherwise
/// it is the declared parameter type.
pub fn argtype(model: &Model, fid: FnId, args: &[Type], n: usize) -> Type {
    let f = model.fun(fid);
    let Some(pti) = f.params.get(n).and_then(|&p| param_ti(model, p)) else {
        return Type::top();
    };
    let pt = model.arena.ty(pti);
    let arg = args.get(n).copied().unwrap_or_else(Type::bot);
    let Some((tv, _)) = ti_var(model, pti) else {
        let mut t = pt.with_any(false);
        if pt.dim == -1 && arg.dim > 0 {
            t.dim = arg.dim;
        }
        if pt.is_any() {
            t.inst = arg.inst;
        }
        return t;
    };
    let mut ty = arg.with_set(pt.set);
    if pt.dim != -1 {
        ty.dim = pt.dim;
    }
    for (j, &p) in f.params.iter().enumerate() {
        let Some(other) = param_ti(model, p) else { continue };
        if ti_var(model, other).map(|(n, _)| n) != Some(tv) {
            continue;
        }
        let Some(&check) = args.get(j) else { continue };
        if check.base != ty.base
            && !check.is_bot()
            && Type::bt_subtype(&ty.with_enum(0), &check.with_enum(0), false)
        {
            ty.base = check.base;
            ty.enum_id = 0;
        }
    }
    ty
}

/// Whether `ti` is written with a type-inst variable anywhere.
pub(crate) fn mentions_ti_var(model: &Model, ti: ExprId) -> bool {
    ti_var(model, ti).is_some()
        || model
            .type_inst(ti)
            .is_some_and(|t| t.ranges.iter().any(|&r| ti_var(model, r).is_some()))
}
