#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use mzn_ir::Type;
use pretty_assertions::assert_eq;

// Test Helpers

fn decl(model: &mut Model, name: &str, line: u32) -> ExprId {
    let ti = model.ti(Type::par_int());
    let d = model.mk_var_decl(name, ti, None);
    let span = model.span(line, 1);
    model.at(d, span)
}

fn sym(model: &Model, name: &str) -> Symbol {
    Symbol::named(model.intern(name))
}

// Binding and lookup

#[test]
fn test_find_innermost_first() {
    let mut m = Model::default();
    let outer = decl(&mut m, "x", 1);
    let inner = decl(&mut m, "x", 2);
    let mut s = Scopes::new();
    s.add(&m, outer).unwrap();
    s.push();
    s.add(&m, inner).unwrap();
    assert_eq!(s.find(sym(&m, "x")), Some(inner));
    s.pop();
    assert_eq!(s.find(sym(&m, "x")), Some(outer));
}

#[test]
fn test_toplevel_frame_jumps_to_globals() {
    let mut m = Model::default();
    let global = decl(&mut m, "g", 1);
    let param = decl(&mut m, "p", 2);
    let mut s = Scopes::new();
    s.add(&m, global).unwrap();
    s.push_function();
    s.add(&m, param).unwrap();
    assert_eq!(s.find(sym(&m, "p")), Some(param));
    // re-entering a global declaration hides the function's parameters
    s.push_toplevel();
    assert_eq!(s.find(sym(&m, "p")), None);
    assert_eq!(s.find(sym(&m, "g")), Some(global));
    s.pop();
    s.pop();
    assert_eq!(s.depth(), 1);
    s.pop();
    assert_eq!(s.depth(), 1);
}

#[test]
fn test_duplicate_in_same_frame() {
    let mut m = Model::default();
    let a = decl(&mut m, "a", 1);
    let b = decl(&mut m, "a", 2);
    let mut s = Scopes::new();
    s.add(&m, a).unwrap();
    let err = s.add(&m, b).unwrap_err();
    assert_eq!(err.kind, crate::TypeErrorKind::DuplicateDefinition);
    assert_eq!(err.message, "identifier `a' already defined");
}

#[test]
fn test_anonymous_not_registered() {
    let mut m = Model::default();
    let ti = m.ti(Type::par_int());
    let anon = m.decl_node(Symbol::default(), ti, None, false);
    let mut s = Scopes::new();
    s.add(&m, anon).unwrap();
    s.add(&m, anon).unwrap();
    assert_eq!(s.find(Symbol::default()), None);
}

#[test]
fn test_local_enum_rejected() {
    let mut m = Model::default();
    let ti = m.ti_enum();
    let init = m.set_lit(Vec::new());
    let e = m.mk_var_decl("E", ti, Some(init));
    let mut s = Scopes::new();
    let err = s.add(&m, e).unwrap_err();
    assert_eq!(err.message, "enums are only allowed at top level");
}

// Shadowing

#[test]
fn test_inner_shadows_function_param() {
    let mut m = Model::default();
    let param = decl(&mut m, "a", 1);
    let local = decl(&mut m, "a", 2);
    let mut s = Scopes::new();
    s.push_function();
    s.add(&m, param).unwrap();
    s.push();
    s.add(&m, local).unwrap();
    let warnings = s.take_warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        warnings[0].message(),
        "variable `a` shadows variable with the same name in line 1.1"
    );
    assert!(s.take_warnings().is_empty());
}

#[test]
fn test_shadow_walk_crosses_nested_inner_frames() {
    let mut m = Model::default();
    let param = decl(&mut m, "a", 1);
    let local = decl(&mut m, "a", 5);
    let mut s = Scopes::new();
    s.push_function();
    s.add(&m, param).unwrap();
    s.push();
    s.push();
    s.add(&m, local).unwrap();
    assert_eq!(s.take_warnings().len(), 1);
}

#[test]
fn test_shadow_walk_stops_at_function_frame() {
    // A global hidden by a local inside a function body is not reported:
    // the walk ends at the nearest function frame.
    let mut m = Model::default();
    let global = decl(&mut m, "a", 1);
    let local = decl(&mut m, "a", 3);
    let mut s = Scopes::new();
    s.add(&m, global).unwrap();
    s.push_function();
    s.push();
    s.add(&m, local).unwrap();
    assert!(s.take_warnings().is_empty());
}

#[test]
fn test_no_shadow_warning_outside_inner_frames() {
    let mut m = Model::default();
    let global = decl(&mut m, "a", 1);
    let param = decl(&mut m, "a", 2);
    let mut s = Scopes::new();
    s.add(&m, global).unwrap();
    s.push_function();
    s.add(&m, param).unwrap();
    assert!(s.take_warnings().is_empty());
}

// Suggestions

#[test]
fn test_find_similar() {
    let mut m = Model::default();
    let length = decl(&mut m, "length", 1);
    let width = decl(&mut m, "width", 2);
    let mut s = Scopes::new();
    s.add(&m, length).unwrap();
    s.add(&m, width).unwrap();
    assert_eq!(s.find_similar(&m, sym(&m, "lenght")), Some("length".to_owned()));
    assert_eq!(s.find_similar(&m, sym(&m, "widht")), Some("width".to_owned()));
    assert_eq!(s.find_similar(&m, sym(&m, "zzzzzzzz")), None);
}

#[test]
fn test_edit_distance() {
    assert_eq!(edit_distance("", "abc"), 3);
    assert_eq!(edit_distance("abc", ""), 3);
    assert_eq!(edit_distance("kitten", "sitting"), 3);
    assert_eq!(edit_distance("same", "same"), 0);
}
