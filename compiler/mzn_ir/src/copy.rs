//! Deep copy of expressions and functions.
//!
//! Declarations copied as part of a subtree are recorded in a [`CopyMap`];
//! identifiers bound to them are re-pointed at the copies. Identifiers bound
//! to declarations outside the copied subtree (globals) keep their binding.

use rustc_hash::FxHashMap;

use mzn_stack::ensure_sufficient_stack;

use crate::ast::{Expr, ExprKind, FunctionDecl, Generator, Ident, TypeInst, VarDecl};
use crate::{ExprId, Model};

/// Old declaration → copied declaration.
#[derive(Debug, Default)]
pub struct CopyMap {
    decls: FxHashMap<ExprId, ExprId>,
}

impl CopyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, decl: ExprId) -> Option<ExprId> {
        self.decls.get(&decl).copied()
    }

    pub fn insert(&mut self, from: ExprId, to: ExprId) {
        self.decls.insert(from, to);
    }
}

impl Model {
    /// Deep-copy the subtree rooted at `id`, including annotations.
    pub fn copy_expr(&mut self, map: &mut CopyMap, id: ExprId) -> ExprId {
        ensure_sufficient_stack(|| self.copy_expr_inner(map, id))
    }

    fn copy_opt(&mut self, map: &mut CopyMap, id: Option<ExprId>) -> Option<ExprId> {
        id.map(|e| self.copy_expr(map, e))
    }

    fn copy_vec(&mut self, map: &mut CopyMap, ids: &[ExprId]) -> Vec<ExprId> {
        ids.iter().map(|&e| self.copy_expr(map, e)).collect()
    }

    fn copy_expr_inner(&mut self, map: &mut CopyMap, id: ExprId) -> ExprId {
        let Expr {
            kind,
            span,
            ty,
            anns,
        } = self.arena.get(id).clone();
        let kind = match kind {
            ExprKind::IntLit(_)
            | ExprKind::FloatLit(_)
            | ExprKind::BoolLit(_)
            | ExprKind::StringLit(_)
            | ExprKind::Absent
            | ExprKind::Anon
            | ExprKind::TiId { .. } => kind,
            ExprKind::Id(Ident { sym, decl }) => ExprKind::Id(Ident {
                sym,
                decl: decl.map(|d| map.get(d).unwrap_or(d)),
            }),
            ExprKind::SetLit { elems, isv } => ExprKind::SetLit {
                elems: self.copy_vec(map, &elems),
                isv,
            },
            ExprKind::ArrayLit { elems, dims, tuple } => ExprKind::ArrayLit {
                elems: self.copy_vec(map, &elems),
                dims,
                tuple,
            },
            ExprKind::ArrayAccess { base, indices } => ExprKind::ArrayAccess {
                base: self.copy_expr(map, base),
                indices: self.copy_vec(map, &indices),
            },
            ExprKind::Comprehension {
                body,
                generators,
                set,
            } => {
                let mut new_gens = Vec::with_capacity(generators.len());
                for g in generators {
                    let source = self.copy_opt(map, g.source);
                    let decls = self.copy_vec(map, &g.decls);
                    let where_clause = self.copy_opt(map, g.where_clause);
                    new_gens.push(Generator {
                        decls,
                        source,
                        where_clause,
                    });
                }
                ExprKind::Comprehension {
                    body: self.copy_expr(map, body),
                    generators: new_gens,
                    set,
                }
            }
            ExprKind::Ite {
                branches,
                else_branch,
            } => {
                let branches = branches
                    .into_iter()
                    .map(|(c, t)| (self.copy_expr(map, c), self.copy_expr(map, t)))
                    .collect();
                ExprKind::Ite {
                    branches,
                    else_branch: self.copy_opt(map, else_branch),
                }
            }
            ExprKind::BinOp { op, lhs, rhs, decl } => ExprKind::BinOp {
                op,
                lhs: self.copy_expr(map, lhs),
                rhs: self.copy_expr(map, rhs),
                decl,
            },
            ExprKind::UnOp { op, operand, decl } => ExprKind::UnOp {
                op,
                operand: self.copy_expr(map, operand),
                decl,
            },
            ExprKind::Call { name, args, decl } => ExprKind::Call {
                name,
                args: self.copy_vec(map, &args),
                decl,
            },
            ExprKind::Let { bindings, body } => {
                let bindings = self.copy_vec(map, &bindings);
                ExprKind::Let {
                    bindings,
                    body: self.copy_expr(map, body),
                }
            }
            ExprKind::VarDecl(vd) => {
                let ti = self.copy_expr(map, vd.ti);
                let init = self.copy_opt(map, vd.init);
                let anns = self.copy_vec(map, &anns);
                let new_id = self.arena.alloc(Expr {
                    kind: ExprKind::VarDecl(VarDecl { ti, init, ..vd }),
                    span,
                    ty,
                    anns,
                });
                map.insert(id, new_id);
                return new_id;
            }
            ExprKind::TypeInst(ti) => ExprKind::TypeInst(TypeInst {
                ranges: self.copy_vec(map, &ti.ranges),
                domain: self.copy_opt(map, ti.domain),
                is_enum: ti.is_enum,
            }),
        };
        let anns = self.copy_vec(map, &anns);
        self.arena.alloc(Expr {
            kind,
            span,
            ty,
            anns,
        })
    }

    /// Copy a function declaration: parameters first, then return type-inst,
    /// body and annotations. The copy is not added to the model.
    pub fn copy_function(&mut self, map: &mut CopyMap, decl: &FunctionDecl) -> FunctionDecl {
        let params = self.copy_vec(map, &decl.params);
        let captured_anns = self.copy_opt(map, decl.captured_anns);
        let ti = self.copy_expr(map, decl.ti);
        let body = self.copy_opt(map, decl.body);
        let anns = self.copy_vec(map, &decl.anns);
        FunctionDecl {
            name: decl.name,
            params,
            ti,
            body,
            anns,
            span: decl.span,
            from_stdlib: decl.from_stdlib,
            captured_anns,
        }
    }
}
