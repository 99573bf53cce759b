//! Diagnostics for the MiniZinc type checker.
//!
//! - [`ErrorCode`]s for searchability
//! - [`Diagnostic`]s with a message, labeled spans, notes and suggestions
//! - a plain-text [`emitter`]
//!
//! The checker produces its own error types and converts them into
//! [`Diagnostic`]s at the boundary, so front ends render every phase the
//! same way.

mod diagnostic;
pub mod emitter;
mod error_code;

pub use diagnostic::{Diagnostic, Label, Severity, Suggestion};
pub use error_code::{ErrorCode, UnknownErrorCode};
