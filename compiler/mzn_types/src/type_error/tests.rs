use super::*;
use mzn_ir::Name;
use pretty_assertions::assert_eq;

#[test]
fn test_undefined_with_suggestion() {
    let err = TypeCheckError::undefined(Span::DUMMY, "lenght", Some("length".to_owned()));
    assert_eq!(
        err.to_string(),
        "undefined identifier `lenght', did you mean `length'?"
    );
    assert_eq!(err.code(), ErrorCode::E2001);
    let diag = err.to_diagnostic();
    assert_eq!(diag.suggestions.len(), 1);
    assert_eq!(diag.suggestions[0].snippet, "length");
}

#[test]
fn test_undefined_without_suggestion() {
    let err = TypeCheckError::undefined(Span::DUMMY, "q", None);
    assert_eq!(err.message, "undefined identifier `q'");
    assert!(err.suggestions.is_empty());
}

#[test]
fn test_kind_codes() {
    assert_eq!(TypeErrorKind::CircularDefinition.code(), ErrorCode::E2002);
    assert_eq!(TypeErrorKind::EnumContiguityViolation.code(), ErrorCode::E2013);
    assert_eq!(TypeErrorKind::InternalInvariant.code(), ErrorCode::E9001);
}

#[test]
fn test_failure_errors_view() {
    let fatal = TypecheckFailure::from(TypeCheckError::circular(Span::DUMMY, "a"));
    assert!(fatal.is_fatal());
    assert_eq!(fatal.errors().len(), 1);

    let many = TypecheckFailure::Errors(vec![
        TypeCheckError::mismatch(Span::DUMMY, "one"),
        TypeCheckError::mismatch(Span::DUMMY, "two"),
    ]);
    assert!(!many.is_fatal());
    assert_eq!(many.to_string(), "2 type error(s)");
    assert_eq!(many.to_diagnostics().len(), 2);
}

#[test]
fn test_shadowing_warning() {
    let prev = Span::point(Name::EMPTY, 3, 14);
    let w = TypeCheckWarning::shadowing(Span::DUMMY, "a", prev);
    assert_eq!(w.code(), ErrorCode::W2001);
    assert_eq!(
        w.message(),
        "variable `a` shadows variable with the same name in line 3.14"
    );
    assert_eq!(w.to_diagnostic().labels.len(), 2);
}

#[test]
fn test_deprecated_warning() {
    let w = TypeCheckWarning::deprecated_call(Span::DUMMY, "old_fn", "2.5.0");
    assert_eq!(w.code(), ErrorCode::W2002);
    assert_eq!(w.message(), "`old_fn` is deprecated since version 2.5.0");
}
