//! Model representation for the MiniZinc type checker.
//!
//! - [`Span`] source locations and interned [`Name`]s
//! - the compact [`Type`] descriptor
//! - the arena-indexed AST ([`ast`]), items and [`Model`]
//! - construction helpers, structural traversal ([`visit`]) and deep copy
//!
//! # Design
//!
//! - **Flat**: expressions refer to each other by [`ExprId`]; declarations are
//!   expressions, so identifier resolution stores an `ExprId`.
//! - **Typed in place**: every [`ast::Expr`] carries a [`Type`] that the
//!   checker fills in; rewrites allocate new nodes and re-point parents.
//! - **Append-only**: nothing is ever freed from the arena during checking.

mod arena;
pub mod ast;
mod builder;
mod copy;
mod interner;
mod model;
mod name;
mod span;
mod ty;
pub mod visit;

pub use arena::ExprArena;
pub use ast::{ExprId, FnId};
pub use copy::CopyMap;
pub use interner::StringInterner;
pub use model::Model;
pub use name::Name;
pub use span::Span;
pub use ty::{BaseType, Inst, Type, TypeFlags};
