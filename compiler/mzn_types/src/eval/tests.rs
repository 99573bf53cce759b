#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use mzn_ir::ast::{BinOpKind, IntVal, UnOpKind};
use mzn_ir::Type;
use pretty_assertions::assert_eq;

use crate::{TypeCheckError, TypeErrorKind};

// Test Helpers

fn model() -> Model {
    Model::new("eval.mzn")
}

fn range(m: &mut Model, lo: i64, hi: i64) -> ExprId {
    m.range_set(IntVal::Int(lo), IntVal::Int(hi))
}

fn ints(values: &[i64]) -> Value {
    Value::Array(ArrayValue::from_vec(values.iter().map(|&v| Value::Int(v)).collect()))
}

// Scalars and operators

#[test]
fn test_arithmetic() {
    let mut m = model();
    let (a, b, c) = (m.int(7), m.int(2), m.int(3));
    let div = m.binop(BinOpKind::IDiv, a, b);
    let e = m.binop(BinOpKind::Mult, div, c);
    assert_eq!(eval_int(&m, e).unwrap(), 9);
}

#[test]
fn test_integer_division_truncates() {
    let mut m = model();
    let (a, b) = (m.int(-7), m.int(2));
    let div = m.binop(BinOpKind::IDiv, a, b);
    let (a, b) = (m.int(-7), m.int(2));
    let rem = m.binop(BinOpKind::Mod, a, b);
    assert_eq!(eval_int(&m, div).unwrap(), -3);
    assert_eq!(eval_int(&m, rem).unwrap(), -1);
}

#[test]
fn test_division_by_zero() {
    let mut m = model();
    let (a, b) = (m.int(1), m.int(0));
    let e = m.binop(BinOpKind::IDiv, a, b);
    assert_eq!(eval_par(&m, e).unwrap_err().kind, EvalErrorKind::DivisionByZero);
}

#[test]
fn test_overflow() {
    let mut m = model();
    let (a, b) = (m.int(i64::MAX), m.int(1));
    let e = m.binop(BinOpKind::Plus, a, b);
    assert_eq!(eval_par(&m, e).unwrap_err().kind, EvalErrorKind::Overflow);
}

#[test]
fn test_comparison_and_logic() {
    let mut m = model();
    let (a, b) = (m.int(1), m.int(2));
    let lt = m.binop(BinOpKind::Le, a, b);
    let f = m.bool_lit(false);
    let not_f = m.unop(UnOpKind::Not, f);
    let both = m.binop(BinOpKind::And, lt, not_f);
    assert!(eval_bool(&m, both).unwrap());
}

#[test]
fn test_conjunction_short_circuits() {
    let mut m = model();
    let f = m.bool_lit(false);
    let (a, b) = (m.int(1), m.int(0));
    let boom = m.binop(BinOpKind::IDiv, a, b);
    let zero = m.int(0);
    let cmp = m.binop(BinOpKind::Eq, boom, zero);
    let e = m.binop(BinOpKind::And, f, cmp);
    assert!(!eval_bool(&m, e).unwrap());
}

#[test]
fn test_string_concatenation() {
    let mut m = model();
    let (a, b) = (m.string("ab"), m.string("cd"));
    let e = m.binop(BinOpKind::PlusPlus, a, b);
    assert_eq!(eval_string(&m, e).unwrap(), "abcd");
}

#[test]
fn test_var_expression_is_rejected() {
    let mut m = model();
    let x = m.int(1);
    m.arena.set_ty(x, Type::var_int());
    assert_eq!(eval_par(&m, x).unwrap_err().kind, EvalErrorKind::NotPar);
}

// Sets

#[test]
fn test_set_operations() {
    let mut m = model();
    let (a, b) = (range(&mut m, 1, 5), range(&mut m, 4, 8));
    let e = m.binop(BinOpKind::Diff, a, b);
    assert_eq!(eval_par(&m, e).unwrap(), Value::Set(IntSet::range(1, 3)));

    let (a, b) = (range(&mut m, 1, 5), range(&mut m, 4, 8));
    let e = m.binop(BinOpKind::SymDiff, a, b);
    assert_eq!(
        eval_par(&m, e).unwrap(),
        Value::Set(IntSet::from_ranges(vec![(1, 3), (6, 8)]))
    );
}

#[test]
fn test_dotdot_and_membership() {
    let mut m = model();
    let (lo, hi) = (m.int(2), m.int(4));
    let r = m.binop(BinOpKind::DotDot, lo, hi);
    let three = m.int(3);
    let e = m.binop(BinOpKind::In, three, r);
    assert!(eval_bool(&m, e).unwrap());
}

#[test]
fn test_set_literal_merges_values() {
    let mut m = model();
    let elems = vec![m.int(3), m.int(1), m.int(2), m.int(7)];
    let s = m.set_lit(elems);
    let Value::Set(set) = eval_par(&m, s).unwrap() else {
        panic!("expected a set");
    };
    assert_eq!(set.ranges(), &[(1, 3), (7, 7)]);
    assert_eq!(set.card(), 4);
    assert_eq!(set.to_string(), "{1,2,3,7}");
}

#[test]
fn test_set_display() {
    assert_eq!(IntSet::range(1, 3).to_string(), "1..3");
    assert_eq!(IntSet::empty().to_string(), "{}");
    assert_eq!(IntSet::from_values([4]).to_string(), "{4}");
}

// Compound expressions

#[test]
fn test_comprehension_with_filter() {
    let mut m = model();
    let s = range(&mut m, 1, 6);
    let mut g = m.generator(&["i"], s, None);
    let i = g.decls[0];
    let (ir, two) = (m.id_of(i), m.int(2));
    let rem = m.binop(BinOpKind::Mod, ir, two);
    let zero = m.int(0);
    g.where_clause = Some(m.binop(BinOpKind::Eq, rem, zero));
    let (ir, ten) = (m.id_of(i), m.int(10));
    let body = m.binop(BinOpKind::Mult, ir, ten);
    let comp = m.comprehension(body, vec![g], false);
    assert_eq!(eval_par(&m, comp).unwrap(), ints(&[20, 40, 60]));
}

#[test]
fn test_nested_generators_and_set_result() {
    let mut m = model();
    let (s1, s2) = (range(&mut m, 1, 2), range(&mut m, 1, 2));
    let gi = m.generator(&["i"], s1, None);
    let gj = m.generator(&["j"], s2, None);
    let (ir, jr) = (m.id_of(gi.decls[0]), m.id_of(gj.decls[0]));
    let body = m.binop(BinOpKind::Plus, ir, jr);
    let comp = m.comprehension(body, vec![gi, gj], true);
    assert_eq!(eval_par(&m, comp).unwrap(), Value::Set(IntSet::range(2, 4)));
}

#[test]
fn test_let_and_conditional() {
    let mut m = model();
    let ti = m.ti(Type::par_int());
    let five = m.int(5);
    let x = m.mk_var_decl("x", ti, Some(five));
    let (xr, three) = (m.id_of(x), m.int(3));
    let cond = m.binop(BinOpKind::Gr, xr, three);
    let (yes, no) = (m.string("big"), m.string("small"));
    let ite = m.ite(vec![(cond, yes)], Some(no));
    let l = m.let_in(vec![x], ite);
    assert_eq!(eval_string(&m, l).unwrap(), "big");
}

#[test]
fn test_false_let_constraint() {
    let mut m = model();
    let f = m.bool_lit(false);
    let body = m.int(1);
    let l = m.let_in(vec![f], body);
    assert_eq!(eval_par(&m, l).unwrap_err().kind, EvalErrorKind::Failed);
}

#[test]
fn test_array_access() {
    let mut m = model();
    let elems = vec![m.int(10), m.int(20), m.int(30)];
    let arr = m.array_lit(elems);
    let two = m.int(2);
    let acc = m.access(arr, vec![two]);
    assert_eq!(eval_int(&m, acc).unwrap(), 20);

    let elems = vec![m.int(10)];
    let arr = m.array_lit(elems);
    let four = m.int(4);
    let acc = m.access(arr, vec![four]);
    let err = eval_par(&m, acc).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::IndexOutOfBounds);
    assert_eq!(err.message, "array index [4] out of bounds");
}

#[test]
fn test_global_identifier_uses_initializer() {
    let mut m = model();
    let ti = m.ti(Type::par_int());
    let init = m.int(4);
    let n = m.add_var_decl("n", ti, Some(init));
    let (nr, one) = (m.id_of(n), m.int(1));
    let e = m.binop(BinOpKind::Plus, nr, one);
    assert_eq!(eval_int(&m, e).unwrap(), 5);
}

#[test]
fn test_identifier_without_value() {
    let mut m = model();
    let ti = m.ti(Type::par_int());
    let n = m.add_var_decl("n", ti, None);
    let nr = m.id_of(n);
    let err = eval_par(&m, nr).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::Undefined);
    assert!(err.is_undetermined());
    assert_eq!(err.message, "`n' has no value");
}

#[test]
fn test_user_function() {
    let mut m = model();
    let (pti, rti) = (m.ti(Type::par_int()), m.ti(Type::par_int()));
    let x = m.mk_var_decl("x", pti, None);
    let (xr, xr2) = (m.id_of(x), m.id_of(x));
    let body = m.binop(BinOpKind::Mult, xr, xr2);
    let name = m.intern("square");
    let fid = m.push_function(mzn_ir::ast::FunctionDecl::new(name, vec![x], rti, Some(body)));
    let seven = m.int(7);
    let call = m.call("square", vec![seven]);
    if let ExprKind::Call { decl, .. } = &mut m.arena.get_mut(call).kind {
        *decl = Some(fid);
    }
    assert_eq!(eval_int(&m, call).unwrap(), 49);
}

// Builtins

#[test]
fn test_cardinality_and_bounds() {
    let mut m = model();
    let s = range(&mut m, 3, 9);
    let card = m.call("card", vec![s]);
    let s = range(&mut m, 3, 9);
    let min = m.call("min", vec![s]);
    assert_eq!(eval_int(&m, card).unwrap(), 7);
    assert_eq!(eval_int(&m, min).unwrap(), 3);
}

#[test]
fn test_min_of_empty_set_fails() {
    let mut m = model();
    let s = m.set_lit(vec![]);
    let min = m.call("min", vec![s]);
    assert_eq!(eval_par(&m, min).unwrap_err().kind, EvalErrorKind::Failed);
}

#[test]
fn test_show_and_join() {
    let mut m = model();
    let elems = vec![m.int(1), m.int(2)];
    let arr = m.array_lit(elems);
    let show = m.call("show", vec![arr]);
    assert_eq!(eval_string(&m, show).unwrap(), "[1, 2]");

    let elems = vec![m.string("a"), m.string("b")];
    let arr = m.array_lit(elems);
    let sep = m.string(", ");
    let join = m.call("join", vec![sep, arr]);
    assert_eq!(eval_string(&m, join).unwrap(), "a, b");
}

#[test]
fn test_show_dzn_id_quotes_non_identifiers() {
    let mut m = model();
    let plain = m.string("Red");
    let plain = m.call("showDznId", vec![plain]);
    let odd = m.string("dark red");
    let odd = m.call("showDznId", vec![odd]);
    assert_eq!(eval_string(&m, plain).unwrap(), "Red");
    assert_eq!(eval_string(&m, odd).unwrap(), "'dark red'");
}

#[test]
fn test_option_builtins() {
    let mut m = model();
    let a = m.absent();
    let occurs = m.call("occurs", vec![a]);
    let three = m.int(3);
    let deopt = m.call("deopt", vec![three]);
    let a = m.absent();
    let bad = m.call("deopt", vec![a]);
    assert!(!eval_bool(&m, occurs).unwrap());
    assert_eq!(eval_int(&m, deopt).unwrap(), 3);
    assert_eq!(eval_par(&m, bad).unwrap_err().kind, EvalErrorKind::Failed);
}

#[test]
fn test_to_enum_checks_range() {
    let mut m = model();
    let (s, two) = (range(&mut m, 1, 3), m.int(2));
    let ok = m.call("to_enum", vec![s, two]);
    let (s, five) = (range(&mut m, 1, 3), m.int(5));
    let bad = m.call("to_enum", vec![s, five]);
    assert_eq!(eval_int(&m, ok).unwrap(), 2);
    assert_eq!(
        eval_par(&m, bad).unwrap_err().message,
        "value 5 outside the range of the enum"
    );
}

#[test]
fn test_index_sets_and_array1d() {
    let mut m = model();
    let elems = vec![m.int(1), m.int(2), m.int(3), m.int(4)];
    let arr = m.array_lit_dims(elems, vec![(1, 2), (0, 1)]);
    let second = m.call("index_set_2of2", vec![arr]);
    let flat = m.call("array1d", vec![arr]);
    assert_eq!(eval_par(&m, second).unwrap(), Value::Set(IntSet::range(0, 1)));
    assert_eq!(eval_par(&m, flat).unwrap(), ints(&[1, 2, 3, 4]));
}

#[test]
fn test_failed_assertion() {
    let mut m = model();
    let f = m.bool_lit(false);
    let msg = m.string("argument for enum constructor `C' is not a contiguous set");
    let assertion = m.call("assert", vec![f, msg]);
    let err = eval_par(&m, assertion).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::AssertionFailed);
    assert!(!err.is_undetermined());

    let err = TypeCheckError::from(err);
    assert_eq!(err.kind, TypeErrorKind::EnumContiguityViolation);
    assert_eq!(err.message, "argument for enum constructor `C' is not a contiguous set");
}

#[test]
fn test_contiguity_check_on_gapped_set() {
    // max(A) - min(A) + 1 = card(A) over A = {1,2,4}
    let mut m = model();
    let set = |m: &mut Model| {
        let elems = vec![m.int(1), m.int(2), m.int(4)];
        m.set_lit(elems)
    };
    let a = set(&mut m);
    let max = m.call("max", vec![a]);
    let a = set(&mut m);
    let min = m.call("min", vec![a]);
    let width = m.binop(BinOpKind::Minus, max, min);
    let one = m.int(1);
    let width = m.binop(BinOpKind::Plus, width, one);
    let a = set(&mut m);
    let card = m.call("card", vec![a]);
    let contiguous = m.binop(BinOpKind::Eq, width, card);
    assert!(!eval_bool(&m, contiguous).unwrap());
}
