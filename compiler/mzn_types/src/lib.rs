//! Type checking for MiniZinc models.
//!
//! Given a parsed [`Model`](mzn_ir::Model), [`typecheck`] resolves every
//! identifier, orders declarations by dependency, synthesizes the helper
//! functions of enum declarations, assigns a [`Type`](mzn_ir::Type) to
//! every expression and inserts the implicit conversions the model relies
//! on. The model is rewritten in place; the returned [`TypecheckOutcome`]
//! carries the ordered declarations and the output sections.
//!
//! # Components
//!
//! - [`Scopes`]: lexical scope stack and name lookup
//! - [`TopoSorter`]: identifier binding and dependency ordering
//! - [`FunctionTable`]: overloads and their resolution
//! - [`EnumRegistry`]: enum and array-enum identities, enum-aware subtyping
//! - [`Typer`]: bottom-up expression typing
//! - [`coerce()`]: implicit conversions
//! - [`eval`]: a small evaluator for par expressions
//!
//! Set `MZN_LOG` (or `RUST_LOG`) and call [`init_tracing`] to see the
//! passes, e.g. `MZN_LOG=mzn_types=debug`.

pub mod check;
pub mod coerce;
pub mod enum_gen;
mod enums;
mod env;
pub mod eval;
pub mod fns;
mod infer;
mod options;
mod prelude;
mod scope;
mod topo;
mod type_error;

use std::sync::Once;

pub use check::{typecheck, typecheck_assignment, OutputSection, TypecheckOutcome};
pub use coerce::coerce;
pub use enums::{EnumRegistry, TypeDisplay};
pub use env::{CheckEnv, CheckVar};
pub use eval::{eval_bool, eval_int, eval_par, eval_string, EvalError, EvalErrorKind, Value};
pub use fns::FunctionTable;
pub use infer::{type_expr, Typer};
pub use options::TypecheckOptions;
pub use prelude::{install_prelude, PRELUDE_PATH};
pub use scope::{edit_distance, ScopeKind, Scopes};
pub use topo::TopoSorter;
pub use type_error::{
    TypeCheckError, TypeCheckWarning, TypeCheckWarningKind, TypeErrorKind, TypecheckFailure,
};

static TRACING_INIT: Once = Once::new();

/// Install a tracing subscriber filtered by `MZN_LOG`, or `RUST_LOG` if
/// that is unset. Does nothing when neither is set.
///
/// Safe to call more than once; only the first call has an effect.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let directives = std::env::var("MZN_LOG").or_else(|_| std::env::var("RUST_LOG"));
        if let Ok(directives) = directives {
            let filter = EnvFilter::new(directives);
            // A subscriber installed by the embedding program wins.
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init();
        }
    });
}
