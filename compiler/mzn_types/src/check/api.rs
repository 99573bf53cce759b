//! Public API for model-level type checking.
//!
//! [`typecheck`] runs the whole phase over a model with a fresh
//! [`CheckEnv`]; [`typecheck_assignment`] checks one late assignment
//! against a model that was already checked with that same environment.
//!
//! Warnings go to `env.warnings` whether or not the run succeeds.

use mzn_ir::{ExprId, Model};

use super::{ModelChecker, TypecheckOutcome};
use crate::{CheckEnv, TypeCheckError, TypecheckFailure, Typer};

/// Type check `model` in place.
///
/// # Example
///
/// ```ignore
/// install_prelude(&mut model)?;
/// let mut env = CheckEnv::new(&model, TypecheckOptions::for_model(&model));
/// match typecheck(&mut model, &mut env) {
///     Ok(outcome) => flatten(&model, outcome.decls()),
///     Err(failure) => report(failure.to_diagnostics()),
/// }
/// ```
#[tracing::instrument(level = "debug", skip_all, fields(
    file = model.name_str(model.filename),
    items = model.items.len(),
))]
pub fn typecheck(
    model: &mut Model,
    env: &mut CheckEnv,
) -> Result<TypecheckOutcome, TypecheckFailure> {
    let mut checker = ModelChecker::new(model, env);
    let result = checker.run();
    checker.finish(result)
}

/// Check `name = expr` against the declaration of `name` in an already
/// checked model, setting `expr` as its initializer.
#[tracing::instrument(level = "debug", skip_all, fields(name = name))]
pub fn typecheck_assignment(
    model: &mut Model,
    env: &mut CheckEnv,
    outcome: &mut TypecheckOutcome,
    name: &str,
    expr: ExprId,
) -> Result<(), TypecheckFailure> {
    let result = check_assignment(model, env, outcome, name, expr);
    let warnings = outcome.sorter.scopes.take_warnings();
    env.warnings.extend(warnings);
    result
}

fn check_assignment(
    model: &mut Model,
    env: &mut CheckEnv,
    outcome: &mut TypecheckOutcome,
    name: &str,
    expr: ExprId,
) -> Result<(), TypecheckFailure> {
    let span = model.arena.span(expr);
    let decl = outcome.sorter.get(model, name, span)?;
    outcome.sorter.run(model, env, expr)?;

    let mut errors = Vec::new();
    Typer::new(model, env, &mut errors, true).run(expr)?;
    if !errors.is_empty() {
        return Err(TypecheckFailure::Errors(errors));
    }

    let expected = model.arena.ty(decl);
    let actual = model.arena.ty(expr);
    if !env.enums.is_subtype(actual, expected, true) {
        return Err(TypecheckFailure::Fatal(TypeCheckError::mismatch(
            span,
            format!(
                "assignment value for `{name}' has invalid type-inst: expected `{}', actual `{}'",
                env.show(model, expected),
                env.show(model, actual)
            ),
        )));
    }
    let expr = crate::coerce(model, env, expr, expected)?;
    if let Some(vd) = model.var_decl_mut(decl) {
        vd.init = Some(expr);
    }
    Ok(())
}
