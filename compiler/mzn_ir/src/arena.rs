//! Expression storage.
//!
//! The arena is append-only. Rewrites (coercions, slices, generated enum
//! code) allocate new nodes and re-point the parent's child id; a node is
//! never freed, so an `ExprId` stays valid for the lifetime of the model.

use std::ops::{Index, IndexMut};

use crate::ast::{Expr, ExprKind};
use crate::{ExprId, Span, Type};

/// Contiguous storage for every expression of a model.
#[derive(Clone, Debug, Default)]
pub struct ExprArena {
    exprs: Vec<Expr>,
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an expression, returning its id.
    ///
    /// # Panics
    /// Panics if the arena outgrows `u32` indices.
    #[inline]
    pub fn alloc(&mut self, expr: Expr) -> ExprId {
        let index = u32::try_from(self.exprs.len())
            .unwrap_or_else(|_| panic!("expression arena exceeded u32::MAX nodes"));
        self.exprs.push(expr);
        ExprId::new(index)
    }

    /// Allocate an untyped expression.
    #[inline]
    pub fn alloc_kind(&mut self, kind: ExprKind, span: Span) -> ExprId {
        self.alloc(Expr::new(kind, span))
    }

    /// Allocate an expression with a known type.
    #[inline]
    pub fn alloc_typed(&mut self, kind: ExprKind, span: Span, ty: Type) -> ExprId {
        self.alloc(Expr::typed(kind, span, ty))
    }

    /// # Panics
    /// Panics if `id` did not come from this arena.
    #[inline]
    #[track_caller]
    pub fn get(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    /// # Panics
    /// Panics if `id` did not come from this arena.
    #[inline]
    #[track_caller]
    pub fn get_mut(&mut self, id: ExprId) -> &mut Expr {
        &mut self.exprs[id.index()]
    }

    #[inline]
    pub fn kind(&self, id: ExprId) -> &ExprKind {
        &self.get(id).kind
    }

    #[inline]
    pub fn ty(&self, id: ExprId) -> Type {
        self.get(id).ty
    }

    #[inline]
    pub fn set_ty(&mut self, id: ExprId, ty: Type) {
        self.get_mut(id).ty = ty;
    }

    #[inline]
    pub fn span(&self, id: ExprId) -> Span {
        self.get(id).span
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }
}

impl Index<ExprId> for ExprArena {
    type Output = Expr;

    #[inline]
    fn index(&self, id: ExprId) -> &Expr {
        self.get(id)
    }
}

impl IndexMut<ExprId> for ExprArena {
    #[inline]
    fn index_mut(&mut self, id: ExprId) -> &mut Expr {
        self.get_mut(id)
    }
}
