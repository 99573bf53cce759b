//! Dependency ordering of declarations.
//!
//! The sorter binds every identifier to its declaration and assigns each
//! declaration a position in dependency order. A reference to a global that
//! has not been visited yet is resolved on the spot: the sorter enters a
//! fresh top-level frame, orders that declaration's type-inst and
//! initializer, and only then continues. Meeting a declaration that is
//! still being ordered is a circular definition.
//!
//! ```text
//! state[decl]:  absent ──visit──▶ None (in progress) ──done──▶ Some(pos)
//!                                     │
//!                                     └── referenced again ──▶ circular
//! ```

use rustc_hash::FxHashMap;

use mzn_ir::ast::{ExprKind, Item, Symbol};
use mzn_ir::{ExprId, Model, Span};
use mzn_stack::ensure_sufficient_stack;

use crate::enum_gen::{create_enum_mapper, EnumBookkeeping};
use crate::{CheckEnv, Scopes, TypeCheckError, TypeErrorKind};

/// Orders declarations and resolves identifiers.
#[derive(Debug, Default)]
pub struct TopoSorter {
    pub(crate) scopes: Scopes,
    /// `None` while a declaration is being ordered, its position once done.
    state: FxHashMap<ExprId, Option<u32>>,
    /// Declarations in dependency order.
    pub decls: Vec<ExprId>,
    pub(crate) enum_book: EnumBookkeeping,
}

impl TopoSorter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position of an ordered declaration.
    pub fn position(&self, decl: ExprId) -> Option<u32> {
        self.state.get(&decl).copied().flatten()
    }

    /// Register a top-level declaration in the global frame.
    ///
    /// With `enum_items`, an enum declaration is given its enum id and the
    /// generated support items are appended there.
    pub fn add(
        &mut self,
        model: &mut Model,
        env: &mut CheckEnv,
        decl: ExprId,
        enum_items: Option<&mut Vec<Item>>,
    ) -> Result<(), TypeCheckError> {
        if let Some(items) = enum_items {
            let ti = model.var_decl(decl).map(|vd| vd.ti);
            let is_enum = ti.and_then(|ti| model.type_inst(ti)).is_some_and(|t| t.is_enum);
            if let (true, Some(ti)) = (is_enum, ti) {
                let enum_id = env.enums.register_enum(decl);
                let ty = model.arena.ty(ti).with_enum(enum_id);
                model.arena.set_ty(ti, ty);
                model.arena.set_ty(decl, ty);
                tracing::trace!(name = %model.decl_name(decl), enum_id, "registered enum");
                create_enum_mapper(model, env, enum_id, decl, items, &mut self.enum_book)?;
            }
        }
        self.scopes.add(model, decl)
    }

    /// Global declaration named `name`.
    pub fn get(&self, model: &Model, name: &str, span: Span) -> Result<ExprId, TypeCheckError> {
        let sym = Symbol::named(model.intern(name));
        self.scopes.find(sym).ok_or_else(|| {
            TypeCheckError::undefined(span, name, self.scopes.find_similar(model, sym))
        })
    }

    /// Resolve an identifier, ordering its declaration first if needed.
    fn check_id(
        &mut self,
        model: &mut Model,
        env: &mut CheckEnv,
        id: ExprId,
    ) -> Result<ExprId, TypeCheckError> {
        let span = model.arena.span(id);
        let Some(ident) = model.arena.kind(id).as_ident().cloned() else {
            return Err(TypeCheckError::internal(span, "expected an identifier"));
        };
        let decl = match (self.scopes.find(ident.sym), ident.decl) {
            (Some(decl), _) | (None, Some(decl)) => decl,
            (None, None) => {
                let name = model.symbol_str(ident.sym);
                let similar = self.scopes.find_similar(model, ident.sym);
                return Err(TypeCheckError::undefined(span, &name, similar));
            }
        };
        match self.state.get(&decl) {
            None => {
                self.scopes.push_toplevel();
                let result = self.run(model, env, decl);
                self.scopes.pop();
                result?;
            }
            Some(None) => {
                return Err(TypeCheckError::circular(span, &model.symbol_str(ident.sym)));
            }
            Some(Some(_)) => {}
        }
        Ok(decl)
    }

    /// Order everything reachable from `e`.
    pub fn run(
        &mut self,
        model: &mut Model,
        env: &mut CheckEnv,
        e: ExprId,
    ) -> Result<(), TypeCheckError> {
        ensure_sufficient_stack(|| self.run_inner(model, env, e))
    }

    fn run_opt(
        &mut self,
        model: &mut Model,
        env: &mut CheckEnv,
        e: Option<ExprId>,
    ) -> Result<(), TypeCheckError> {
        match e {
            Some(e) => self.run(model, env, e),
            None => Ok(()),
        }
    }

    fn run_all(
        &mut self,
        model: &mut Model,
        env: &mut CheckEnv,
        es: &[ExprId],
    ) -> Result<(), TypeCheckError> {
        for &e in es {
            self.run(model, env, e)?;
        }
        Ok(())
    }

    fn run_inner(
        &mut self,
        model: &mut Model,
        env: &mut CheckEnv,
        e: ExprId,
    ) -> Result<(), TypeCheckError> {
        let kind = model.arena.kind(e).clone();
        match kind {
            ExprKind::IntLit(_)
            | ExprKind::FloatLit(_)
            | ExprKind::BoolLit(_)
            | ExprKind::StringLit(_)
            | ExprKind::Absent
            | ExprKind::Anon
            | ExprKind::TiId { .. } => {}
            ExprKind::SetLit { elems, isv } => {
                if isv.is_none() {
                    self.run_all(model, env, &elems)?;
                }
            }
            ExprKind::Id(_) => {
                let decl = self.check_id(model, env, e)?;
                if let ExprKind::Id(ident) = &mut model.arena.get_mut(e).kind {
                    ident.decl = Some(decl);
                }
            }
            ExprKind::ArrayLit { elems, .. } => self.run_all(model, env, &elems)?,
            ExprKind::ArrayAccess { base, indices } => {
                self.run(model, env, base)?;
                self.run_all(model, env, &indices)?;
            }
            ExprKind::Comprehension {
                body, generators, ..
            } => {
                self.scopes.push();
                let result = (|| {
                    for g in &generators {
                        self.run_opt(model, env, g.source)?;
                        for &d in &g.decls {
                            self.run(model, env, d)?;
                            self.scopes.add(model, d)?;
                        }
                        self.run_opt(model, env, g.where_clause)?;
                    }
                    self.run(model, env, body)
                })();
                self.scopes.pop();
                result?;
            }
            ExprKind::Ite {
                branches,
                else_branch,
            } => {
                for (c, t) in branches {
                    self.run(model, env, c)?;
                    self.run(model, env, t)?;
                }
                self.run_opt(model, env, else_branch)?;
            }
            ExprKind::BinOp { lhs, rhs, .. } => {
                self.run(model, env, lhs)?;
                self.run(model, env, rhs)?;
            }
            ExprKind::UnOp { operand, .. } => self.run(model, env, operand)?,
            ExprKind::Call { args, .. } => self.run_all(model, env, &args)?,
            ExprKind::VarDecl(vd) => {
                if self.state.contains_key(&e) {
                    // only a declaration still in progress can be revisited here
                    return Ok(());
                }
                self.state.insert(e, None);
                self.run(model, env, vd.ti)?;
                self.run_opt(model, env, vd.init)?;
                let pos = u32::try_from(self.decls.len()).unwrap_or(u32::MAX);
                self.decls.push(e);
                self.state.insert(e, Some(pos));
                if let Some(vd) = model.var_decl_mut(e) {
                    vd.topo_pos = Some(pos);
                }
            }
            ExprKind::TypeInst(ti) => {
                self.run_all(model, env, &ti.ranges)?;
                self.run_opt(model, env, ti.domain)?;
            }
            ExprKind::Let { bindings, body } => {
                self.scopes.push();
                let result = self.run_let(model, env, e, &bindings, body);
                self.scopes.pop();
                result?;
            }
        }
        self.run_annotations(model, env, e)
    }

    fn run_let(
        &mut self,
        model: &mut Model,
        env: &mut CheckEnv,
        e: ExprId,
        bindings: &[ExprId],
        body: ExprId,
    ) -> Result<(), TypeCheckError> {
        for &b in bindings {
            self.run(model, env, b)?;
            if model.var_decl(b).is_some() {
                self.scopes.add(model, b)?;
            }
        }
        self.run(model, env, body)?;
        // declarations by position first, constraints after in source order
        let mut sorted = bindings.to_vec();
        sorted.sort_by_key(|&b| match model.var_decl(b) {
            Some(_) => (0, self.position(b).unwrap_or(u32::MAX)),
            None => (1, 0),
        });
        if let ExprKind::Let { bindings, .. } = &mut model.arena.get_mut(e).kind {
            *bindings = sorted;
        }
        Ok(())
    }

    fn run_annotations(
        &mut self,
        model: &mut Model,
        env: &mut CheckEnv,
        e: ExprId,
    ) -> Result<(), TypeCheckError> {
        let anns = model.arena.get(e).anns.clone();
        if anns.is_empty() {
            return Ok(());
        }
        if !env.options.ignore_unknown_ids {
            return self.run_all(model, env, &anns);
        }
        let mut kept = Vec::with_capacity(anns.len());
        for ann in anns {
            match self.run(model, env, ann) {
                Ok(()) => kept.push(ann),
                Err(err) if err.kind == TypeErrorKind::UndefinedIdentifier => {
                    tracing::debug!(%err, "dropping unresolvable annotation");
                }
                Err(err) => return Err(err),
            }
        }
        model.arena.get_mut(e).anns = kept;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
