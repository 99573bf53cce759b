#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use mzn_ir::ast::{BinOpKind, IntVal, ItemKind};
use mzn_ir::Inst;
use pretty_assertions::assert_eq;

use crate::{install_prelude, TypecheckOptions};

// Test Helpers

fn setup() -> (Model, CheckEnv) {
    let mut model = Model::new("infer.mzn");
    install_prelude(&mut model).unwrap();
    let mut env = CheckEnv::new(&model, TypecheckOptions::default());
    let ItemKind::Include { items, .. } = &model.items[0].kind else {
        panic!("expected the prelude include");
    };
    for it in items {
        if let ItemKind::Function(fid) = it.kind {
            env.fns.register(&model, fid, false).unwrap();
        }
    }
    (model, env)
}

/// Type `e` with initializer checks on, returning its type and any
/// accumulated errors.
fn check(
    m: &mut Model,
    env: &mut CheckEnv,
    e: ExprId,
) -> (Result<Type, TypeCheckError>, Vec<TypeCheckError>) {
    let mut errors = Vec::new();
    let result = Typer::new(m, env, &mut errors, true).run(e);
    (result.map(|()| m.arena.ty(e)), errors)
}

fn ok_type(m: &mut Model, env: &mut CheckEnv, e: ExprId) -> Type {
    let (ty, errors) = check(m, env, e);
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    ty.unwrap()
}

fn err(m: &mut Model, env: &mut CheckEnv, e: ExprId) -> TypeCheckError {
    check(m, env, e).0.err().expect("expected a type error")
}

/// A top-level declaration with its declared type settled.
fn declare(m: &mut Model, env: &mut CheckEnv, name: &str, ti: ExprId) -> ExprId {
    let d = m.add_var_decl(name, ti, None);
    let mut errors = Vec::new();
    Typer::new(m, env, &mut errors, false).run(d).unwrap();
    assert!(errors.is_empty());
    d
}

fn int_range(m: &mut Model, lo: i64, hi: i64) -> ExprId {
    m.range_set(IntVal::Int(lo), IntVal::Int(hi))
}

fn call_name(m: &Model, e: ExprId) -> &'static str {
    m.name_str(m.arena.kind(e).call_name().expect("expected a call"))
}

// Literals

#[test]
fn test_set_literal() {
    let (mut m, mut env) = setup();
    let (a, b) = (m.int(1), m.int(2));
    let s = m.set_lit(vec![a, b]);
    assert_eq!(ok_type(&mut m, &mut env, s), Type::par_set_int());
}

#[test]
fn test_array_literal_of_mixed_numbers_is_float() {
    let (mut m, mut env) = setup();
    let (a, b) = (m.int(1), m.float(2.5));
    let arr = m.array_lit(vec![a, b]);
    let ty = ok_type(&mut m, &mut env, arr);
    assert!(ty.is_float());
    assert_eq!(ty.dim, 1);
    let ExprKind::ArrayLit { elems, .. } = m.arena.kind(arr) else {
        panic!("expected an array literal");
    };
    assert_eq!(call_name(&m, elems[0]), "int2float");
}

#[test]
fn test_array_literal_mixing_sets_and_scalars() {
    let (mut m, mut env) = setup();
    let one = m.int(1);
    let set = int_range(&mut m, 2, 3);
    let arr = m.array_lit(vec![one, set]);
    let e = err(&mut m, &mut env, arr);
    assert_eq!(e.kind, TypeErrorKind::NonUniformLiteral);
    assert_eq!(e.message, "non-uniform array literal");
}

#[test]
fn test_unbound_identifier_is_internal() {
    let (mut m, mut env) = setup();
    let x = m.id("x");
    let e = err(&mut m, &mut env, x);
    assert_eq!(e.kind, TypeErrorKind::InternalInvariant);
    assert_eq!(e.message, "identifier `x' is not bound to a declaration");
}

#[test]
fn test_annotation_must_have_ann_type() {
    let (mut m, mut env) = setup();
    let x = m.int(1);
    let not_ann = m.int(2);
    m.annotate(x, not_ann);
    let e = err(&mut m, &mut env, x);
    assert_eq!(e.kind, TypeErrorKind::AnnotationTypeMismatch);
    assert_eq!(e.message, "expected annotation, got `int'");
}

// Operators and calls

#[test]
fn test_par_arithmetic() {
    let (mut m, mut env) = setup();
    let (a, b) = (m.int(1), m.int(2));
    let sum = m.binop(BinOpKind::Plus, a, b);
    assert_eq!(ok_type(&mut m, &mut env, sum), Type::par_int());
    assert!(matches!(
        m.arena.kind(sum),
        ExprKind::BinOp { decl: None, .. }
    ));
}

#[test]
fn test_bool_operand_is_coerced() {
    let (mut m, mut env) = setup();
    let (a, b) = (m.bool_lit(true), m.int(2));
    let sum = m.binop(BinOpKind::Plus, a, b);
    assert_eq!(ok_type(&mut m, &mut env, sum), Type::par_int());
    let ExprKind::BinOp { lhs, .. } = m.arena.kind(sum) else {
        panic!("expected a binary operator");
    };
    assert_eq!(call_name(&m, *lhs), "bool2int");
}

#[test]
fn test_var_operand_makes_var_result() {
    let (mut m, mut env) = setup();
    let ti = m.ti(Type::var_int());
    let x = declare(&mut m, &mut env, "x", ti);
    let (xr, one) = (m.id_of(x), m.int(1));
    let sum = m.binop(BinOpKind::Plus, xr, one);
    let ty = ok_type(&mut m, &mut env, sum);
    assert!(ty.is_var() && ty.is_int());
}

#[test]
fn test_operator_without_overload() {
    let (mut m, mut env) = setup();
    let (a, b) = (m.string("a"), m.int(2));
    let sum = m.binop(BinOpKind::Plus, a, b);
    let e = err(&mut m, &mut env, sum);
    assert_eq!(e.kind, TypeErrorKind::OverloadResolution);
    assert_eq!(
        e.message,
        "type error in operator application for `+'. No matching operator found with left-hand side type `string' and right-hand side type `int'"
    );
}

#[test]
fn test_unknown_function() {
    let (mut m, mut env) = setup();
    let c = m.call("nope", vec![]);
    let e = err(&mut m, &mut env, c);
    assert_eq!(e.kind, TypeErrorKind::OverloadResolution);
    assert_eq!(e.message, "no function or predicate with name `nope' found");
}

#[test]
fn test_count_comparison_becomes_count_eq() {
    let (mut m, mut env) = setup();
    let range = int_range(&mut m, 1, 3);
    let index = m.ti_index(range);
    let ti = m.ti_array(vec![index], Type::var_int(), None);
    let xs = declare(&mut m, &mut env, "xs", ti);
    let (xr, two) = (m.id_of(xs), m.int(2));
    let count = m.call("count", vec![xr, two]);
    let one = m.int(1);
    let eq = m.binop(BinOpKind::Eq, count, one);
    let ty = ok_type(&mut m, &mut env, eq);
    assert!(ty.is_var() && ty.is_bool());
    assert_eq!(call_name(&m, eq), "count_eq");
    let ExprKind::Call { args, .. } = m.arena.kind(eq) else {
        panic!("expected a call");
    };
    assert_eq!(args.len(), 3);
    assert_eq!(args[0], xr);
}

#[test]
fn test_par_count_is_not_rewritten() {
    let (mut m, mut env) = setup();
    let (a, b) = (m.int(1), m.int(2));
    let arr = m.array_lit(vec![a, b]);
    let two = m.int(2);
    let count = m.call("count", vec![arr, two]);
    let one = m.int(1);
    let eq = m.binop(BinOpKind::Eq, count, one);
    assert_eq!(ok_type(&mut m, &mut env, eq), Type::par_bool());
    assert!(matches!(m.arena.kind(eq), ExprKind::BinOp { .. }));
}

#[test]
fn test_redundant_constraint_is_renamed() {
    let (mut m, mut env) = setup();
    let ti = m.ti(Type::var_bool());
    let b = declare(&mut m, &mut env, "b", ti);
    let br = m.id_of(b);
    let c = m.call("implied_constraint", vec![br]);
    ok_type(&mut m, &mut env, c);
    assert_eq!(call_name(&m, c), "mzn_redundant_constraint");
}

// Conditionals

#[test]
fn test_ite_joins_branch_types() {
    let (mut m, mut env) = setup();
    let (c, t, el) = (m.bool_lit(true), m.int(1), m.float(2.0));
    let ite = m.ite(vec![(c, t)], Some(el));
    assert_eq!(ok_type(&mut m, &mut env, ite), Type::par_float());
    let ExprKind::Ite { branches, .. } = m.arena.kind(ite) else {
        panic!("expected a conditional");
    };
    assert_eq!(call_name(&m, branches[0].1), "int2float");
}

#[test]
fn test_ite_without_else_defaults_to_empty_string() {
    let (mut m, mut env) = setup();
    let (c, t) = (m.bool_lit(true), m.string("a"));
    let ite = m.ite(vec![(c, t)], None);
    assert_eq!(ok_type(&mut m, &mut env, ite), Type::par_string());
    let ExprKind::Ite {
        else_branch: Some(el),
        ..
    } = m.arena.kind(ite)
    else {
        panic!("expected an else branch");
    };
    let ExprKind::StringLit(s) = m.arena.kind(*el) else {
        panic!("expected a string literal");
    };
    assert_eq!(m.name_str(*s), "");
}

#[test]
fn test_ite_without_else_needs_defaultable_type() {
    let (mut m, mut env) = setup();
    let (c, t) = (m.bool_lit(true), m.int(1));
    let ite = m.ite(vec![(c, t)], None);
    let e = err(&mut m, &mut env, ite);
    assert!(e
        .message
        .starts_with("conditional without `else' branch must have bool, string, ann, or array type"));
}

#[test]
fn test_var_condition_rejects_string_result() {
    let (mut m, mut env) = setup();
    let ti = m.ti(Type::var_bool());
    let b = declare(&mut m, &mut env, "b", ti);
    let (c, t, el) = (m.id_of(b), m.string("a"), m.string("b"));
    let ite = m.ite(vec![(c, t)], Some(el));
    let e = err(&mut m, &mut env, ite);
    assert_eq!(e.message, "conditional with var condition cannot have string type");
}

#[test]
fn test_var_condition_makes_result_var() {
    let (mut m, mut env) = setup();
    let ti = m.ti(Type::var_bool());
    let b = declare(&mut m, &mut env, "b", ti);
    let (c, t, el) = (m.id_of(b), m.int(1), m.int(2));
    let ite = m.ite(vec![(c, t)], Some(el));
    assert_eq!(ok_type(&mut m, &mut env, ite), Type::var_int());
}

#[test]
fn test_condition_must_be_bool() {
    let (mut m, mut env) = setup();
    let (c, t, el) = (m.int(1), m.int(1), m.int(2));
    let ite = m.ite(vec![(c, t)], Some(el));
    let e = err(&mut m, &mut env, ite);
    assert_eq!(e.message, "expected bool conditional expression, got `int'");
}

// Let

#[test]
fn test_let_par_variable_needs_initializer() {
    let (mut m, mut env) = setup();
    let ti = m.ti(Type::par_int());
    let x = m.mk_var_decl("x", ti, None);
    let body = m.id_of(x);
    let l = m.let_in(vec![x], body);
    let e = err(&mut m, &mut env, l);
    assert_eq!(e.message, "let variable `x' must be initialised");
}

#[test]
fn test_let_with_var_binding_makes_bool_body_var() {
    let (mut m, mut env) = setup();
    let ti = m.ti(Type::var_int());
    let x = m.mk_var_decl("x", ti, None);
    let body = m.bool_lit(true);
    let l = m.let_in(vec![x], body);
    assert_eq!(ok_type(&mut m, &mut env, l), Type::var_bool());
}

#[test]
fn test_let_constraint_must_be_bool() {
    let (mut m, mut env) = setup();
    let constraint = m.int(3);
    let body = m.bool_lit(true);
    let l = m.let_in(vec![constraint], body);
    let (ty, errors) = check(&mut m, &mut env, l);
    assert!(ty.is_ok());
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].message,
        "invalid type of constraint, expected `var bool', actual `int'"
    );
}

// Comprehensions

#[test]
fn test_filters_move_to_their_generator() {
    let (mut m, mut env) = setup();
    let (s1, s2) = (int_range(&mut m, 1, 3), int_range(&mut m, 1, 3));
    let gi = m.generator(&["i"], s1, None);
    let mut gj = m.generator(&["j"], s2, None);
    let (i, j) = (gi.decls[0], gj.decls[0]);

    let (ir, two) = (m.id_of(i), m.int(2));
    let p = m.binop(BinOpKind::Le, ir, two);
    let (jr, two) = (m.id_of(j), m.int(2));
    let q = m.binop(BinOpKind::Le, jr, two);
    gj.where_clause = Some(m.binop(BinOpKind::And, p, q));

    let (ir, jr) = (m.id_of(i), m.id_of(j));
    let body = m.binop(BinOpKind::Plus, ir, jr);
    let comp = m.comprehension(body, vec![gi, gj], false);
    let ty = ok_type(&mut m, &mut env, comp);
    assert_eq!(ty, Type::par_int().with_dim(1));

    let ExprKind::Comprehension { generators, .. } = m.arena.kind(comp) else {
        panic!("expected a comprehension");
    };
    assert_eq!(generators.len(), 2);
    assert_eq!(generators[0].where_clause, Some(p));
    assert_eq!(generators[1].where_clause, Some(q));
}

#[test]
fn test_var_where_clause_makes_optional_elements() {
    let (mut m, mut env) = setup();
    let ti = m.ti(Type::var_bool());
    let b = declare(&mut m, &mut env, "b", ti);
    let s = int_range(&mut m, 1, 3);
    let mut g = m.generator(&["i"], s, None);
    g.where_clause = Some(m.id_of(b));
    let body = m.id_of(g.decls[0]);
    let comp = m.comprehension(body, vec![g], false);
    let ty = ok_type(&mut m, &mut env, comp);
    assert!(ty.is_var() && ty.is_opt() && ty.is_int());
}

#[test]
fn test_var_where_clause_in_set_comprehension() {
    let (mut m, mut env) = setup();
    let ti = m.ti(Type::var_bool());
    let b = declare(&mut m, &mut env, "b", ti);
    let s = int_range(&mut m, 1, 3);
    let mut g = m.generator(&["i"], s, None);
    g.where_clause = Some(m.id_of(b));
    let body = m.id_of(g.decls[0]);
    let comp = m.comprehension(body, vec![g], true);
    let ty = ok_type(&mut m, &mut env, comp);
    assert!(ty.is_var() && ty.is_set() && ty.is_int());
    assert!(!ty.is_opt());
}

#[test]
fn test_var_where_clause_in_array_of_sets_comprehension() {
    let (mut m, mut env) = setup();
    let ti = m.ti(Type::var_bool());
    let b = declare(&mut m, &mut env, "b", ti);
    let s = int_range(&mut m, 1, 3);
    let mut g = m.generator(&["i"], s, None);
    g.where_clause = Some(m.id_of(b));
    let i = m.id_of(g.decls[0]);
    let body = m.set_lit(vec![i]);
    let comp = m.comprehension(body, vec![g], false);
    let e = err(&mut m, &mut env, comp);
    assert_eq!(e.message, "variable where clause not allowed in set-valued comprehension");
}

#[test]
fn test_var_set_generator_makes_optional_elements() {
    let (mut m, mut env) = setup();
    let ti = m.ti(Type::var_set_int());
    let vs = declare(&mut m, &mut env, "vs", ti);
    let src = m.id_of(vs);
    let g = m.generator(&["i"], src, None);
    let body = m.id_of(g.decls[0]);
    let comp = m.comprehension(body, vec![g], false);
    let ty = ok_type(&mut m, &mut env, comp);
    assert!(ty.is_var() && ty.is_opt() && ty.is_int());
    assert_eq!(ty.dim, 1);
}

#[test]
fn test_generator_source_must_be_set_or_array() {
    let (mut m, mut env) = setup();
    let s = m.int(3);
    let g = m.generator(&["i"], s, None);
    let body = m.id_of(g.decls[0]);
    let comp = m.comprehension(body, vec![g], false);
    let e = err(&mut m, &mut env, comp);
    assert_eq!(
        e.message,
        "generator expression must be (par or var) set of int or array, but is `int'"
    );
}

// Array access

#[test]
fn test_access_with_wrong_arity() {
    let (mut m, mut env) = setup();
    let range = int_range(&mut m, 1, 3);
    let index = m.ti_index(range);
    let ti = m.ti_array(vec![index], Type::par_int(), None);
    let a = declare(&mut m, &mut env, "a", ti);
    let (ar, i, j) = (m.id_of(a), m.int(1), m.int(2));
    let acc = m.access(ar, vec![i, j]);
    let e = err(&mut m, &mut env, acc);
    assert_eq!(e.kind, TypeErrorKind::ArityMismatch);
    assert_eq!(e.message, "1-dimensional array accessed with 2 expressions");
}

#[test]
fn test_access_with_var_index() {
    let (mut m, mut env) = setup();
    let range = int_range(&mut m, 1, 3);
    let index = m.ti_index(range);
    let ti = m.ti_array(vec![index], Type::par_int(), None);
    let a = declare(&mut m, &mut env, "a", ti);
    let ti = m.ti(Type::var_int());
    let x = declare(&mut m, &mut env, "x", ti);
    let (ar, xr) = (m.id_of(a), m.id_of(x));
    let acc = m.access(ar, vec![xr]);
    assert_eq!(ok_type(&mut m, &mut env, acc), Type::var_int());
}

#[test]
fn test_access_needs_enum_index() {
    let (mut m, mut env) = setup();
    let e_decl = m.add_enum("E", None);
    let eid = env.enums.register_enum(e_decl);
    m.arena.set_ty(e_decl, Type::par_set_int().with_enum(eid));
    let e_ref = m.id_of(e_decl);
    let index = m.ti_index(e_ref);
    let ti = m.ti_array(vec![index], Type::par_int(), None);
    let a = declare(&mut m, &mut env, "a", ti);

    let (ar, one) = (m.id_of(a), m.int(1));
    let acc = m.access(ar, vec![one]);
    let e = err(&mut m, &mut env, acc);
    assert_eq!(e.message, "array index must be `E', but is `int'");
}

// Declarations and type-insts

#[test]
fn test_initializer_mismatch_is_accumulated() {
    let (mut m, mut env) = setup();
    let ti = m.ti(Type::par_int());
    let init = m.float(1.5);
    let n = m.add_var_decl("n", ti, Some(init));
    let (ty, errors) = check(&mut m, &mut env, n);
    assert_eq!(ty.unwrap(), Type::par_int());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, TypeErrorKind::TypeMismatch);
    assert_eq!(
        errors[0].message,
        "initialisation value for `n' has invalid type-inst: expected `int', actual `float'"
    );
    // the initializer is left as it was
    assert_eq!(m.var_decl(n).unwrap().init, Some(init));
}

#[test]
fn test_initializer_is_coerced() {
    let (mut m, mut env) = setup();
    let ti = m.ti(Type::par_float());
    let init = m.int(1);
    let x = m.add_var_decl("x", ti, Some(init));
    assert_eq!(ok_type(&mut m, &mut env, x), Type::par_float());
    let coerced = m.var_decl(x).unwrap().init.unwrap();
    assert_eq!(call_name(&m, coerced), "int2float");
}

#[test]
fn test_any_takes_initializer_type() {
    let (mut m, mut env) = setup();
    let ti = m.ti(Type::unknown().with_any(true));
    let init = m.string("s");
    let x = m.add_var_decl("x", ti, Some(init));
    assert_eq!(ok_type(&mut m, &mut env, x), Type::par_string());
}

#[test]
fn test_empty_literal_for_two_dimensional_array() {
    let (mut m, mut env) = setup();
    let (r1, r2) = (m.ti_index_int(), m.ti_index_int());
    let ti = m.ti_array(vec![r1, r2], Type::par_int(), None);
    let init = m.array_lit(vec![]);
    let x = m.add_var_decl("x", ti, Some(init));
    ok_type(&mut m, &mut env, x);
    let replaced = m.var_decl(x).unwrap().init.unwrap();
    assert_ne!(replaced, init);
    let ExprKind::ArrayLit { dims, .. } = m.arena.kind(replaced) else {
        panic!("expected an array literal");
    };
    assert_eq!(dims, &vec![(1, 0), (1, 0)]);
}

#[test]
fn test_float_index_set() {
    let (mut m, mut env) = setup();
    let range = m.ti(Type::par_float());
    let ti = m.ti_array(vec![range], Type::par_int(), None);
    let e = err(&mut m, &mut env, ti);
    assert_eq!(e.kind, TypeErrorKind::InvalidTypeInst);
    assert_eq!(e.message, "cannot use `float' as array index set (did you mean `int'?)");
}

#[test]
fn test_domain_gives_base_type() {
    let (mut m, mut env) = setup();
    let range = int_range(&mut m, 1, 3);
    let ti = m.ti_domain(Inst::Var, false, range);
    assert_eq!(ok_type(&mut m, &mut env, ti), Type::var_int());
}

#[test]
fn test_domain_must_be_a_set() {
    let (mut m, mut env) = setup();
    let three = m.int(3);
    let ti = m.ti_domain(Inst::Var, false, three);
    let e = err(&mut m, &mut env, ti);
    assert_eq!(e.message, "type-inst must be par set but is `int'");
}

#[test]
fn test_var_set_of_float_rejected() {
    let (mut m, mut env) = setup();
    let ti = m.ti(Type::var_float().with_set(true));
    let e = err(&mut m, &mut env, ti);
    assert_eq!(e.message, "var set element types other than `int' not allowed");
}

#[test]
fn test_var_string_rejected() {
    let (mut m, mut env) = setup();
    let ti = m.ti(Type::par_string().to_var());
    let e = err(&mut m, &mut env, ti);
    assert_eq!(e.message, "invalid type of variable declaration: `var string'");
}
