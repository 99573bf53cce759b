//! Bottom-up typing of expressions.
//!
//! [`Typer::run`] types a whole subtree: children first, then the
//! annotations, then the node itself, then a check that every annotation
//! is of type `ann`. Node rules live in one submodule per family:
//!
//! - literals and identifiers -> `literals`
//! - array access -> `access`
//! - comprehensions and generators -> `comprehension`
//! - if-then-else and let -> `control_flow`
//! - calls and operators -> `calls`
//! - declarations -> `decls`
//! - type-insts -> `type_inst`
//!
//! A rule that inserts a coercion re-points the child in place; the
//! typed node itself keeps its id (except where a rule turns an operator
//! into a call, which reuses the id too).
//!
//! The same typer runs twice over a model. With `check_init` unset it
//! only settles declared types; with it set, initializers are checked
//! against them and coerced.

mod access;
mod calls;
mod comprehension;
mod control_flow;
mod decls;
mod literals;
mod type_inst;

pub(super) use access::*;
pub(super) use calls::*;
pub(super) use comprehension::*;
pub(super) use control_flow::*;
pub(super) use decls::*;
pub(super) use literals::*;
pub(super) use type_inst::*;

use mzn_ir::ast::ExprKind;
use mzn_ir::visit::children;
use mzn_ir::{ExprId, Model, Span, Type};
use mzn_stack::ensure_sufficient_stack;

use crate::coerce::coerce;
use crate::{CheckEnv, TypeCheckError, TypeErrorKind};

/// Typing context for one pass.
pub struct Typer<'a> {
    pub(crate) model: &'a mut Model,
    pub(crate) env: &'a mut CheckEnv,
    /// Accumulated item-level errors.
    pub(crate) errors: &'a mut Vec<TypeCheckError>,
    check_init: bool,
}

impl<'a> Typer<'a> {
    pub fn new(
        model: &'a mut Model,
        env: &'a mut CheckEnv,
        errors: &'a mut Vec<TypeCheckError>,
        check_init: bool,
    ) -> Self {
        Typer {
            model,
            env,
            errors,
            check_init,
        }
    }

    /// Type the subtree rooted at `e`.
    pub fn run(&mut self, e: ExprId) -> Result<(), TypeCheckError> {
        type_expr(self, e)
    }

    /// Settle the declared type of `decl` from its type-inst alone,
    /// leaving the initializer untouched.
    pub fn declare(&mut self, decl: ExprId) -> Result<(), TypeCheckError> {
        let Some(ti) = self.model.var_decl(decl).map(|vd| vd.ti) else {
            return Err(TypeCheckError::internal(self.span(decl), "expected a declaration"));
        };
        type_expr(self, ti)?;
        let ty = infer_var_decl(self, decl)?;
        self.set_ty(decl, ty);
        Ok(())
    }

    pub(crate) fn check_init(&self) -> bool {
        self.check_init
    }

    #[inline]
    pub(crate) fn ty(&self, e: ExprId) -> Type {
        self.model.arena.ty(e)
    }

    #[inline]
    pub(crate) fn set_ty(&mut self, e: ExprId, ty: Type) {
        self.model.arena.set_ty(e, ty);
    }

    #[inline]
    pub(crate) fn span(&self, e: ExprId) -> Span {
        self.model.arena.span(e)
    }

    #[inline]
    pub(crate) fn kind(&self, e: ExprId) -> &ExprKind {
        self.model.arena.kind(e)
    }

    /// `ty` with enum names.
    pub(crate) fn show(&self, ty: Type) -> String {
        self.env.show(self.model, ty)
    }

    pub(crate) fn coerce(&mut self, e: ExprId, target: Type) -> Result<ExprId, TypeCheckError> {
        coerce(self.model, self.env, e, target)
    }

    /// Fail-fast error at `e`.
    pub(crate) fn error(&self, kind: TypeErrorKind, e: ExprId, message: String) -> TypeCheckError {
        TypeCheckError::new(kind, self.span(e), message)
    }
}

/// Type `e` and everything under it.
pub fn type_expr(typer: &mut Typer<'_>, e: ExprId) -> Result<(), TypeCheckError> {
    ensure_sufficient_stack(|| type_expr_inner(typer, e))
}

fn type_opt(typer: &mut Typer<'_>, e: Option<ExprId>) -> Result<(), TypeCheckError> {
    match e {
        Some(e) => type_expr(typer, e),
        None => Ok(()),
    }
}

fn type_expr_inner(typer: &mut Typer<'_>, e: ExprId) -> Result<(), TypeCheckError> {
    let kind = typer.kind(e).clone();
    if let ExprKind::Comprehension { .. } = kind {
        type_generators(typer, e)?;
    } else {
        for child in children(&kind) {
            type_expr(typer, child)?;
        }
    }
    let anns = typer.model.arena.get(e).anns.clone();
    for &ann in &anns {
        type_expr(typer, ann)?;
    }

    let ty = match kind {
        ExprKind::IntLit(_) => Type::par_int(),
        ExprKind::FloatLit(_) => Type::par_float(),
        ExprKind::BoolLit(_) => Type::par_bool(),
        ExprKind::StringLit(_) => Type::par_string(),
        ExprKind::Absent => Type::bot().with_opt(true),
        ExprKind::Anon | ExprKind::TiId { .. } => typer.ty(e),
        ExprKind::SetLit { .. } => infer_set_lit(typer, e)?,
        ExprKind::ArrayLit { .. } => infer_array_lit(typer, e)?,
        ExprKind::Id(_) => infer_id(typer, e)?,
        ExprKind::ArrayAccess { .. } => infer_array_access(typer, e)?,
        ExprKind::Comprehension { .. } => infer_comprehension(typer, e)?,
        ExprKind::Ite { .. } => infer_ite(typer, e)?,
        ExprKind::BinOp { .. } => infer_binary(typer, e)?,
        ExprKind::UnOp { .. } => infer_unary(typer, e)?,
        ExprKind::Call { .. } => infer_call(typer, e)?,
        ExprKind::Let { .. } => infer_let(typer, e)?,
        ExprKind::VarDecl(_) => infer_var_decl(typer, e)?,
        ExprKind::TypeInst(_) => infer_type_inst(typer, e)?,
    };
    typer.set_ty(e, ty);

    for ann in anns {
        let t = typer.ty(ann);
        if !t.is_ann() {
            return Err(typer.error(
                TypeErrorKind::AnnotationTypeMismatch,
                ann,
                format!("expected annotation, got `{}'", typer.show(t)),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
