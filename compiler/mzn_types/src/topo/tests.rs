#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use mzn_ir::ast::{BinOpKind, ItemKind};
use mzn_ir::Type;
use pretty_assertions::assert_eq;

use crate::TypecheckOptions;

// Test Helpers

fn env(model: &Model) -> CheckEnv {
    CheckEnv::new(model, TypecheckOptions::default())
}

fn int_decl(model: &mut Model, name: &str, init: Option<ExprId>) -> ExprId {
    let ti = model.ti(Type::par_int());
    model.add_var_decl(name, ti, init)
}

/// Register every top-level declaration, then order them in item order.
fn sort_all(model: &mut Model, env: &mut CheckEnv) -> Result<TopoSorter, TypeCheckError> {
    let mut ts = TopoSorter::new();
    let decls: Vec<ExprId> = model
        .items
        .iter()
        .filter_map(|it| match it.kind {
            ItemKind::VarDecl(vd) => Some(vd),
            _ => None,
        })
        .collect();
    for &d in &decls {
        ts.add(model, env, d, None)?;
    }
    for d in decls {
        ts.run(model, env, d)?;
    }
    Ok(ts)
}

// Ordering

#[test]
fn test_dependency_ordered_first() {
    let mut m = Model::new("topo.mzn");
    let y_ref = m.id("y");
    let x = int_decl(&mut m, "x", Some(y_ref));
    let three = m.int(3);
    let y = int_decl(&mut m, "y", Some(three));
    let mut env = env(&m);
    let ts = sort_all(&mut m, &mut env).unwrap();
    assert_eq!(ts.decls, vec![y, x]);
    assert_eq!(ts.position(y), Some(0));
    assert_eq!(m.var_decl(x).unwrap().topo_pos, Some(1));
}

#[test]
fn test_identifier_is_bound() {
    let mut m = Model::new("topo.mzn");
    let n = int_decl(&mut m, "n", None);
    let n_ref = m.id("n");
    let one = m.int(1);
    let sum = m.binop(BinOpKind::Plus, n_ref, one);
    int_decl(&mut m, "k", Some(sum));
    let mut env = env(&m);
    sort_all(&mut m, &mut env).unwrap();
    assert_eq!(m.arena.kind(n_ref).as_ident().unwrap().decl, Some(n));
}

#[test]
fn test_circular_definition() {
    let mut m = Model::new("topo.mzn");
    let b_ref = m.id("b");
    int_decl(&mut m, "a", Some(b_ref));
    let a_ref = m.id("a");
    int_decl(&mut m, "b", Some(a_ref));
    let mut env = env(&m);
    let err = sort_all(&mut m, &mut env).err().unwrap();
    assert_eq!(err.kind, TypeErrorKind::CircularDefinition);
    assert_eq!(err.message, "circular definition of `a'");
}

#[test]
fn test_undefined_suggests_similar() {
    let mut m = Model::new("topo.mzn");
    int_decl(&mut m, "count", None);
    let typo = m.id("cuont");
    int_decl(&mut m, "z", Some(typo));
    let mut env = env(&m);
    let err = sort_all(&mut m, &mut env).err().unwrap();
    assert_eq!(err.kind, TypeErrorKind::UndefinedIdentifier);
    assert_eq!(err.suggestions, vec!["count".to_owned()]);
}

#[test]
fn test_get_global() {
    let mut m = Model::new("topo.mzn");
    let n = int_decl(&mut m, "n", None);
    let mut env = env(&m);
    let ts = sort_all(&mut m, &mut env).unwrap();
    assert_eq!(ts.get(&m, "n", Span::DUMMY).unwrap(), n);
    let err = ts.get(&m, "m", Span::DUMMY).err().unwrap();
    assert_eq!(err.kind, TypeErrorKind::UndefinedIdentifier);
}

// Local scopes

#[test]
fn test_generator_scope_ends_with_comprehension() {
    let mut m = Model::new("topo.mzn");
    let lo = m.int(1);
    let hi = m.int(3);
    let range = m.binop(BinOpKind::DotDot, lo, hi);
    let gen = m.generator(&["i"], range, None);
    let i_ref = m.id("i");
    let comp = m.comprehension(i_ref, vec![gen], false);
    let ti = m.ti(Type::par_int().with_dim(1));
    m.add_var_decl("xs", ti, Some(comp));
    let leak = m.id("i");
    int_decl(&mut m, "bad", Some(leak));
    let mut env = env(&m);
    let err = sort_all(&mut m, &mut env).err().unwrap();
    assert!(err.message.starts_with("undefined identifier `i'"));
    assert!(m.arena.kind(i_ref).as_ident().unwrap().decl.is_some());
}

#[test]
fn test_let_declarations_sorted_before_constraints() {
    let mut m = Model::new("topo.mzn");
    let t = m.bool_lit(true);
    let b_ref = m.id("b");
    let ti_a = m.ti(Type::par_int());
    let a = m.mk_var_decl("a", ti_a, Some(b_ref));
    let ti_b = m.ti(Type::par_int());
    let two = m.int(2);
    let b = m.mk_var_decl("b", ti_b, Some(two));
    let a_ref = m.id("a");
    let body = m.let_in(vec![t, a, b], a_ref);
    int_decl(&mut m, "r", Some(body));
    let mut env = env(&m);
    // `a` refers to the later `b`, which is not yet in scope
    let err = sort_all(&mut m, &mut env).err().unwrap();
    assert_eq!(err.kind, TypeErrorKind::UndefinedIdentifier);

    let mut m = Model::new("topo.mzn");
    let t = m.bool_lit(true);
    let ti_b = m.ti(Type::par_int());
    let two = m.int(2);
    let b = m.mk_var_decl("b", ti_b, Some(two));
    let b_ref = m.id("b");
    let ti_a = m.ti(Type::par_int());
    let a = m.mk_var_decl("a", ti_a, Some(b_ref));
    let a_ref = m.id("a");
    let body = m.let_in(vec![t, b, a], a_ref);
    int_decl(&mut m, "r", Some(body));
    let mut env = self::env(&m);
    sort_all(&mut m, &mut env).unwrap();
    let ExprKind::Let { bindings, .. } = m.arena.kind(body) else {
        panic!("expected let");
    };
    assert_eq!(bindings, &vec![b, a, t]);
}

// Annotations

#[test]
fn test_unknown_annotation_dropped_when_ignoring_ids() {
    let mut m = Model::new("topo.mzn");
    let one = m.int(1);
    let x = int_decl(&mut m, "x", Some(one));
    let ann = m.id("no_such_ann");
    m.annotate(x, ann);
    let mut env = CheckEnv::new(&m, TypecheckOptions::new().with_ignore_unknown_ids(true));
    sort_all(&mut m, &mut env).unwrap();
    assert!(m.arena.get(x).anns.is_empty());

    let mut m = Model::new("topo.mzn");
    let one = m.int(1);
    let x = int_decl(&mut m, "x", Some(one));
    let ann = m.id("no_such_ann");
    m.annotate(x, ann);
    let mut env = self::env(&m);
    let err = sort_all(&mut m, &mut env).err().unwrap();
    assert_eq!(err.kind, TypeErrorKind::UndefinedIdentifier);
}

// Enums

#[test]
fn test_add_enum_registers_and_synthesizes() {
    let mut m = Model::new("topo.mzn");
    let a = m.id("A");
    let b = m.id("B");
    let init = m.set_lit(vec![a, b]);
    let e = m.add_enum("E", Some(init));
    let mut env = env(&m);
    let mut ts = TopoSorter::new();
    let mut items = Vec::new();
    ts.add(&mut m, &mut env, e, Some(&mut items)).unwrap();
    assert_eq!(env.enums.enum_count(), 1);
    assert_eq!(m.arena.ty(e).enum_id, 1);
    assert!(!items.is_empty());
    assert_eq!(ts.get(&m, "E", Span::DUMMY).unwrap(), e);
}

#[test]
fn test_duplicate_global() {
    let mut m = Model::new("topo.mzn");
    int_decl(&mut m, "x", None);
    int_decl(&mut m, "x", None);
    let mut env = env(&m);
    let err = sort_all(&mut m, &mut env).err().unwrap();
    assert_eq!(err.kind, TypeErrorKind::DuplicateDefinition);
}
