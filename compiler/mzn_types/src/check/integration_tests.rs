#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use mzn_ir::ast::{BinOpKind, ExprKind, SolveGoal};
use mzn_ir::{Inst, Type};
use pretty_assertions::assert_eq;

use crate::fns::param_types;
use crate::{install_prelude, TypeCheckWarningKind, TypeErrorKind, TypecheckOptions};

// Test Helpers

fn new_model() -> Model {
    let mut m = Model::new("model.mzn");
    install_prelude(&mut m).unwrap();
    m
}

fn run(
    m: &mut Model,
    opts: TypecheckOptions,
) -> (Result<TypecheckOutcome, TypecheckFailure>, CheckEnv) {
    let mut env = CheckEnv::new(m, opts);
    let result = typecheck(m, &mut env);
    (result, env)
}

fn check_ok(m: &mut Model) -> (TypecheckOutcome, CheckEnv) {
    check_ok_with(m, TypecheckOptions::default())
}

fn check_ok_with(m: &mut Model, opts: TypecheckOptions) -> (TypecheckOutcome, CheckEnv) {
    match run(m, opts) {
        (Ok(outcome), env) => (outcome, env),
        (Err(failure), _) => panic!("unexpected failure: {failure:?}"),
    }
}

fn check_errors(m: &mut Model) -> Vec<TypeCheckError> {
    check_errors_with(m, TypecheckOptions::default())
}

fn check_errors_with(m: &mut Model, opts: TypecheckOptions) -> Vec<TypeCheckError> {
    match run(m, opts).0 {
        Ok(_) => panic!("expected type checking to fail"),
        Err(TypecheckFailure::Errors(errors)) => errors,
        Err(TypecheckFailure::Fatal(err)) => vec![err],
    }
}

fn int_decl(m: &mut Model, name: &str, init: Option<ExprId>) -> ExprId {
    let ti = m.ti(Type::par_int());
    m.add_var_decl(name, ti, init)
}

fn var_int_decl(m: &mut Model, name: &str) -> ExprId {
    let ti = m.ti(Type::var_int());
    m.add_var_decl(name, ti, None)
}

fn find_decl(m: &Model, name: &str) -> Option<ExprId> {
    m.items.iter().find_map(|it| match it.kind {
        ItemKind::VarDecl(d) if m.decl_name(d) == name => Some(d),
        _ => None,
    })
}

fn solve_objective(m: &Model) -> ExprId {
    m.items
        .iter()
        .find_map(|it| match &it.kind {
            ItemKind::Solve(si) => si.objective,
            _ => None,
        })
        .expect("expected an objective")
}

/// `function <ret>: name(<param>: x) = body(x)`
fn unary_fn(
    m: &mut Model,
    name: &str,
    param: Type,
    ret: Type,
    body: impl FnOnce(&mut Model) -> ExprId,
) -> FnId {
    let pti = m.ti(param);
    let rti = m.ti(ret);
    let body = body(m);
    m.add_function(name, &[("x", pti)], rti, Some(body))
}

// Declarations

#[test]
fn test_let_expression_initializer() {
    let mut m = new_model();
    let kti = m.ti(Type::par_int());
    let three = m.int(3);
    let k = m.mk_var_decl("k", kti, Some(three));
    let k_ref = m.id("k");
    let one = m.int(1);
    let body = m.binop(BinOpKind::Plus, k_ref, one);
    let l = m.let_in(vec![k], body);
    let n = int_decl(&mut m, "n", Some(l));
    check_ok(&mut m);
    assert_eq!(m.arena.ty(n), Type::par_int());
    assert_eq!(m.arena.ty(l), Type::par_int());
}

#[test]
fn test_var_initializer_for_par_declaration() {
    let mut m = new_model();
    var_int_decl(&mut m, "x");
    let x_ref = m.id("x");
    int_decl(&mut m, "n", Some(x_ref));
    let errors = check_errors(&mut m);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, TypeErrorKind::TypeMismatch);
    assert_eq!(
        errors[0].message,
        "initialisation value for `n' has invalid type-inst: expected `int', actual `var int'"
    );
}

#[test]
fn test_circular_definition_is_fatal() {
    let mut m = new_model();
    let b_ref = m.id("b");
    int_decl(&mut m, "a", Some(b_ref));
    let a_ref = m.id("a");
    int_decl(&mut m, "b", Some(a_ref));
    let errors = check_errors(&mut m);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, TypeErrorKind::CircularDefinition);
}

#[test]
fn test_missing_parameter_data() {
    let mut m = new_model();
    int_decl(&mut m, "n", None);
    let errors = check_errors(&mut m);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, TypeErrorKind::MissingParameterData);
    assert_eq!(
        errors[0].message,
        "symbol error: variable `n' must be defined (did you forget to specify a data file?)"
    );
}

#[test]
fn test_undefined_parameters_can_be_ignored() {
    let mut m = new_model();
    int_decl(&mut m, "n", None);
    check_ok_with(
        &mut m,
        TypecheckOptions::new().with_ignore_undefined_parameters(true),
    );
}

#[test]
fn test_optional_parameter_defaults_to_absent() {
    let mut m = new_model();
    let ti = m.ti(Type::par_int().with_opt(true));
    let o = m.add_var_decl("o", ti, None);
    check_ok(&mut m);
    let init = m.var_decl(o).unwrap().init.unwrap();
    assert!(matches!(m.arena.kind(init), ExprKind::Absent));
    assert_eq!(m.arena.get(o).anns.len(), 1);
}

// Assignments

#[test]
fn test_assignment_sets_initializer() {
    let mut m = new_model();
    let n = int_decl(&mut m, "n", None);
    let five = m.int(5);
    m.add_assign("n", five);
    check_ok(&mut m);
    assert_eq!(m.var_decl(n).unwrap().init, Some(five));
    assert!(!m.items.iter().any(|it| matches!(it.kind, ItemKind::Assign { .. })));
}

#[test]
fn test_multiple_assignment() {
    let mut m = new_model();
    int_decl(&mut m, "n", None);
    let one = m.int(1);
    m.add_assign("n", one);
    let two = m.int(2);
    m.add_assign("n", two);
    let errors = check_errors(&mut m);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, TypeErrorKind::DuplicateDefinition);
    assert_eq!(errors[0].message, "multiple assignment to the same variable");
}

#[test]
fn test_multiple_assignment_allowed_becomes_constraint() {
    let mut m = new_model();
    var_int_decl(&mut m, "x");
    let one = m.int(1);
    m.add_assign("x", one);
    let two = m.int(2);
    m.add_assign("x", two);
    check_ok_with(&mut m, TypecheckOptions::new().with_allow_multi_assignment(true));
    let constraints = m
        .items
        .iter()
        .filter(|it| matches!(it.kind, ItemKind::Constraint(_)))
        .count();
    assert_eq!(constraints, 1);
}

#[test]
fn test_late_assignment() {
    let mut m = new_model();
    let n = int_decl(&mut m, "n", None);
    let opts = TypecheckOptions::new().with_ignore_undefined_parameters(true);
    let mut env = CheckEnv::new(&m, opts);
    let mut outcome = typecheck(&mut m, &mut env).unwrap();

    let seven = m.int(7);
    typecheck_assignment(&mut m, &mut env, &mut outcome, "n", seven).unwrap();
    assert_eq!(m.var_decl(n).unwrap().init, Some(seven));

    let text = m.string("seven");
    let failure = typecheck_assignment(&mut m, &mut env, &mut outcome, "n", text).unwrap_err();
    let TypecheckFailure::Fatal(err) = failure else {
        panic!("expected a fatal error");
    };
    assert_eq!(
        err.message,
        "assignment value for `n' has invalid type-inst: expected `int', actual `string'"
    );
}

// Constraints and solve

#[test]
fn test_constraint_must_be_bool() {
    let mut m = new_model();
    let three = m.int(3);
    m.add_constraint(three);
    let (result, _) = run(&mut m, TypecheckOptions::default());
    let Err(TypecheckFailure::Fatal(err)) = result else {
        panic!("expected a fatal coercion error");
    };
    assert_eq!(err.message, "cannot determine coercion from type int to type var bool");
}

#[test]
fn test_optional_bool_constraint_is_reported() {
    let mut m = new_model();
    let ti = m.ti(Type::var_bool().with_opt(true));
    m.add_var_decl("b", ti, None);
    let b = m.id("b");
    m.add_constraint(b);
    let errors = check_errors(&mut m);
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].message,
        "invalid type of constraint, expected `var bool', actual `var opt bool'"
    );
}

#[test]
fn test_only_one_solve_item() {
    let mut m = new_model();
    m.add_solve(SolveGoal::Satisfy, None);
    m.add_solve(SolveGoal::Satisfy, None);
    let errors = check_errors(&mut m);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, TypeErrorKind::DuplicateDefinition);
    assert_eq!(errors[0].message, "Only one solve item allowed");
}

#[test]
fn test_objective_is_lifted() {
    let mut m = new_model();
    let lo = m.int(1);
    let hi = m.int(3);
    let dom = m.binop(BinOpKind::DotDot, lo, hi);
    let ti = m.ti_domain(Inst::Var, false, dom);
    m.add_var_decl("x", ti, None);
    let x_ref = m.id("x");
    m.add_solve(SolveGoal::Maximize, Some(x_ref));
    check_ok(&mut m);

    let lifted = find_decl(&m, "_objective").expect("expected `_objective'");
    assert_eq!(m.var_decl(lifted).unwrap().init, Some(x_ref));
    let obj = solve_objective(&m);
    let ExprKind::Id(ident) = m.arena.kind(obj) else {
        panic!("expected a reference to the objective");
    };
    assert_eq!(ident.decl, Some(lifted));
    assert!(m.arena.ty(obj).is_var() && m.arena.ty(obj).is_int());
}

#[test]
fn test_checker_objective_name() {
    let mut m = new_model();
    var_int_decl(&mut m, "x");
    let x_ref = m.id("x");
    m.add_solve(SolveGoal::Minimize, Some(x_ref));
    check_ok_with(&mut m, TypecheckOptions::new().with_checker(true));
    assert!(find_decl(&m, "_checker_objective").is_some());
    assert!(find_decl(&m, "_objective").is_none());
}

#[test]
fn test_bool_objective_counts_as_int() {
    let mut m = new_model();
    let ti = m.ti(Type::var_bool());
    m.add_var_decl("b", ti, None);
    let b_ref = m.id("b");
    m.add_solve(SolveGoal::Maximize, Some(b_ref));
    check_ok(&mut m);
    let ty = m.arena.ty(solve_objective(&m));
    assert!(ty.is_var() && ty.is_int(), "objective typed {ty:?}");
}

#[test]
fn test_string_objective_rejected() {
    let mut m = new_model();
    let s = m.string("best");
    m.add_solve(SolveGoal::Maximize, Some(s));
    let errors = check_errors(&mut m);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, TypeErrorKind::ObjectiveTypeMismatch);
}

// Output

#[test]
fn test_output_sections() {
    let mut m = new_model();
    let a = m.string("a");
    let first = m.array_lit(vec![a]);
    m.add_output(first);
    let b = m.string("b");
    let second = m.array_lit(vec![b]);
    m.add_output(second);
    let c = m.string("c");
    let third = m.array_lit(vec![c]);
    let section = m.string("stats");
    let ann = m.call("mzn_output_section", vec![section]);
    m.push_item(
        ItemKind::Output {
            expr: third,
            anns: vec![ann],
        },
        mzn_ir::Span::DUMMY,
    );

    let (outcome, _) = check_ok(&mut m);
    assert_eq!(
        outcome.output_sections,
        vec![
            OutputSection {
                name: "default".to_owned(),
                exprs: vec![first, second],
            },
            OutputSection {
                name: "stats".to_owned(),
                exprs: vec![third],
            },
        ]
    );
    assert!(!m.items.iter().any(|it| matches!(it.kind, ItemKind::Output { .. })));
}

#[test]
fn test_output_must_be_string_array() {
    let mut m = new_model();
    let one = m.int(1);
    let arr = m.array_lit(vec![one]);
    m.add_output(arr);
    let errors = check_errors(&mut m);
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].message,
        "invalid type in output item, expected `array[int] of string', actual `array[int] of int'"
    );
}

// Enums

#[test]
fn test_enum_show_uses_generated_function() {
    let mut m = new_model();
    let names = ["A", "B", "C"].map(|n| m.id(n)).to_vec();
    let init = m.set_lit(names);
    m.add_enum("E", Some(init));
    let b_ref = m.id("B");
    let shown = m.call("show", vec![b_ref]);
    let ti = m.ti(Type::par_string());
    let s = m.add_var_decl("s", ti, Some(shown));
    check_ok(&mut m);

    let init = m.var_decl(s).unwrap().init.unwrap();
    let name = m.arena.kind(init).call_name().expect("expected a call");
    assert_eq!(m.name_str(name), "_toString_E");
    assert!(find_decl(&m, "B").is_some());
}

#[test]
fn test_enum_constructor_over_range() {
    let mut m = new_model();
    let lo = m.int(1);
    let hi = m.int(3);
    let range = m.binop(BinOpKind::DotDot, lo, hi);
    let init = m.call("C", vec![range]);
    let f = m.add_enum("F", Some(init));
    check_ok(&mut m);

    assert!(m.arena.ty(f).is_par_set_of_int());
    let constructors = m
        .items
        .iter()
        .filter(|it| matches!(it.kind, ItemKind::Function(fid) if m.name_str(m.fun(fid).name) == "C"))
        .count();
    assert!(constructors > 0);
}

// Functions

#[test]
fn test_let_shadowing_parameter_warns() {
    let mut m = new_model();
    unary_fn(&mut m, "f", Type::par_int(), Type::par_int(), |m| {
        let ti = m.ti(Type::par_int());
        let two = m.int(2);
        let x = m.mk_var_decl("x", ti, Some(two));
        let body = m.id("x");
        m.let_in(vec![x], body)
    });
    let (_, env) = check_ok(&mut m);
    assert_eq!(env.warnings.len(), 1);
    assert!(matches!(
        &env.warnings[0].kind,
        TypeCheckWarningKind::Shadowing { name, .. } if name == "x"
    ));
}

#[test]
fn test_return_type_mismatch() {
    let mut m = new_model();
    unary_fn(&mut m, "f", Type::par_int(), Type::par_bool(), |m| m.id("x"));
    let errors = check_errors(&mut m);
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].message,
        "return type of function does not match body, declared type is `bool', body type is `int'"
    );
}

#[test]
fn test_par_overload_chosen_for_par_argument() {
    let mut m = new_model();
    let inc = |m: &mut Model| {
        let x = m.id("x");
        let one = m.int(1);
        m.binop(BinOpKind::Plus, x, one)
    };
    let f_par = unary_fn(&mut m, "f", Type::par_int(), Type::par_int(), inc);
    let f_var = unary_fn(&mut m, "f", Type::var_int(), Type::var_int(), inc);
    let three = m.int(3);
    let par_call = m.call("f", vec![three]);
    let r = int_decl(&mut m, "r", Some(par_call));
    var_int_decl(&mut m, "v");
    let v_ref = m.id("v");
    let var_call = m.call("f", vec![v_ref]);
    let ti = m.ti(Type::var_int());
    m.add_var_decl("w", ti, Some(var_call));
    let (_, env) = check_ok(&mut m);

    assert_eq!(m.arena.ty(r), Type::par_int());
    assert!(matches!(m.arena.kind(par_call), ExprKind::Call { decl: Some(d), .. } if *d == f_par));
    assert!(matches!(m.arena.kind(var_call), ExprKind::Call { decl: Some(d), .. } if *d == f_var));
    assert_eq!(env.fns.overloads(m.intern("f")).len(), 2);
}

#[test]
fn test_par_versions_follow_dependencies() {
    let mut m = new_model();
    unary_fn(&mut m, "g", Type::var_int(), Type::var_int(), |m| {
        let x = m.id("x");
        let two = m.int(2);
        m.binop(BinOpKind::Mult, x, two)
    });
    unary_fn(&mut m, "h", Type::var_int(), Type::var_int(), |m| {
        let x = m.id("x");
        let call = m.call("g", vec![x]);
        let one = m.int(1);
        m.binop(BinOpKind::Plus, call, one)
    });
    var_int_decl(&mut m, "v");
    unary_fn(&mut m, "k", Type::var_int(), Type::var_int(), |m| {
        let x = m.id("x");
        let v = m.id("v");
        m.binop(BinOpKind::Plus, x, v)
    });
    // Only reaches a var result through `k`, which has no par version.
    unary_fn(&mut m, "p", Type::var_int(), Type::var_int(), |m| {
        let x = m.id("x");
        m.call("k", vec![x])
    });
    let (_, env) = check_ok(&mut m);

    let overloads = |name: &str| env.fns.overloads(m.intern(name)).to_vec();
    assert_eq!(overloads("g").len(), 2);
    assert_eq!(overloads("h").len(), 2);
    assert_eq!(overloads("k").len(), 1);
    assert_eq!(overloads("p").len(), 1);

    let par_version = |name: &str| {
        overloads(name)
            .into_iter()
            .find(|e| e.params.iter().all(Type::is_par))
            .map(|e| e.id)
            .expect("expected a par version")
    };
    let g_par = par_version("g");
    let h_par = par_version("h");
    assert!(param_types(&m, h_par).iter().all(Type::is_par));
    assert!(m.arena.ty(m.fun(h_par).ti).is_par());

    let body = m.fun(h_par).body.unwrap();
    let ExprKind::BinOp { lhs, .. } = m.arena.kind(body) else {
        panic!("expected the copied body");
    };
    assert!(matches!(m.arena.kind(*lhs), ExprKind::Call { decl: Some(d), .. } if *d == g_par));
    assert!(m.arena.ty(body).is_par());
}

#[test]
fn test_flatzinc_skips_par_versions_and_sections() {
    let mut m = new_model();
    unary_fn(&mut m, "g", Type::var_int(), Type::var_int(), |m| m.id("x"));
    let a = m.string("a");
    let out = m.array_lit(vec![a]);
    m.add_output(out);
    let (outcome, env) = check_ok_with(&mut m, TypecheckOptions::new().with_flatzinc(true));
    assert_eq!(env.fns.overloads(m.intern("g")).len(), 1);
    assert!(outcome.output_sections.is_empty());
    assert!(m
        .items
        .iter()
        .any(|it| matches!(it.kind, ItemKind::Include { .. })));
}
