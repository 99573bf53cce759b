//! Structural traversal.
//!
//! [`children`] lists the direct sub-expressions of a node in evaluation
//! order. The walkers built on it are iterative, so they are safe on
//! arbitrarily deep expressions.

use smallvec::SmallVec;

use crate::ast::ExprKind;
use crate::{ExprArena, ExprId};

/// Child list; most nodes have at most four children.
pub type Children = SmallVec<[ExprId; 4]>;

/// Direct sub-expressions in evaluation order (annotations excluded).
///
/// Comprehension generators contribute source, declarations and where
/// clause in turn, before the body. Declarations contribute their
/// type-inst before their initializer.
pub fn children(kind: &ExprKind) -> Children {
    let mut out = Children::new();
    match kind {
        ExprKind::IntLit(_)
        | ExprKind::FloatLit(_)
        | ExprKind::BoolLit(_)
        | ExprKind::StringLit(_)
        | ExprKind::Absent
        | ExprKind::Anon
        | ExprKind::TiId { .. }
        | ExprKind::Id(_) => {}
        ExprKind::SetLit { elems, .. } | ExprKind::ArrayLit { elems, .. } => {
            out.extend(elems.iter().copied());
        }
        ExprKind::ArrayAccess { base, indices } => {
            out.push(*base);
            out.extend(indices.iter().copied());
        }
        ExprKind::Comprehension {
            body, generators, ..
        } => {
            for g in generators {
                out.extend(g.source);
                out.extend(g.decls.iter().copied());
                out.extend(g.where_clause);
            }
            out.push(*body);
        }
        ExprKind::Ite {
            branches,
            else_branch,
        } => {
            for (c, t) in branches {
                out.push(*c);
                out.push(*t);
            }
            out.extend(*else_branch);
        }
        ExprKind::BinOp { lhs, rhs, .. } => {
            out.push(*lhs);
            out.push(*rhs);
        }
        ExprKind::UnOp { operand, .. } => out.push(*operand),
        ExprKind::Call { args, .. } => out.extend(args.iter().copied()),
        ExprKind::Let { bindings, body } => {
            out.extend(bindings.iter().copied());
            out.push(*body);
        }
        ExprKind::VarDecl(vd) => {
            out.push(vd.ti);
            out.extend(vd.init);
        }
        ExprKind::TypeInst(ti) => {
            out.extend(ti.ranges.iter().copied());
            out.extend(ti.domain);
        }
    }
    out
}

/// Pre-order walk from `root`. Returning `false` from `f` skips the
/// children of that node.
pub fn preorder(
    arena: &ExprArena,
    root: ExprId,
    include_anns: bool,
    mut f: impl FnMut(ExprId) -> bool,
) {
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if !f(id) {
            continue;
        }
        let expr = arena.get(id);
        if include_anns {
            stack.extend(expr.anns.iter().rev().copied());
        }
        stack.extend(children(&expr.kind).into_iter().rev());
    }
}

/// All nodes under `root`, children before parents.
pub fn postorder(arena: &ExprArena, root: ExprId, include_anns: bool) -> Vec<ExprId> {
    let mut out = Vec::new();
    let mut stack = vec![(root, false)];
    while let Some((id, expanded)) = stack.pop() {
        if expanded {
            out.push(id);
            continue;
        }
        stack.push((id, true));
        let expr = arena.get(id);
        let kids = children(&expr.kind);
        for &c in kids.iter().rev() {
            stack.push((c, false));
        }
        if include_anns {
            for &a in expr.anns.iter().rev() {
                stack.push((a, false));
            }
        }
    }
    out
}

/// True if any node under `root` satisfies `pred`.
pub fn any_node(arena: &ExprArena, root: ExprId, mut pred: impl FnMut(ExprId) -> bool) -> bool {
    let mut found = false;
    preorder(arena, root, false, |id| {
        if found {
            return false;
        }
        if pred(id) {
            found = true;
            return false;
        }
        true
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinOpKind;
    use crate::{Model, Type};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_children_of_binop() {
        let mut m = Model::default();
        let a = m.int(1);
        let b = m.int(2);
        let op = m.binop(BinOpKind::Plus, a, b);
        assert_eq!(children(m.arena.kind(op)).to_vec(), vec![a, b]);
    }

    #[test]
    fn test_comprehension_child_order() {
        let mut m = Model::default();
        let src = m.id("S");
        let cond = m.bool_lit(true);
        let g = m.generator(&["i"], src, Some(cond));
        let decl = g.decls[0];
        let body = m.id("i");
        let c = m.comprehension(body, vec![g], false);
        assert_eq!(children(m.arena.kind(c)).to_vec(), vec![src, decl, cond, body]);
    }

    #[test]
    fn test_postorder_children_first() {
        let mut m = Model::default();
        let a = m.int(1);
        let b = m.int(2);
        let inner = m.binop(BinOpKind::Plus, a, b);
        let c = m.int(3);
        let outer = m.binop(BinOpKind::Mult, inner, c);
        assert_eq!(postorder(&m.arena, outer, false), vec![a, b, inner, c, outer]);
    }

    #[test]
    fn test_preorder_includes_annotations_when_asked() {
        let mut m = Model::default();
        let ann = m.id("output_only");
        let ti = m.ti(Type::par_int());
        let vd = m.mk_var_decl("x", ti, None);
        m.annotate(vd, ann);
        let mut seen = Vec::new();
        preorder(&m.arena, vd, true, |id| {
            seen.push(id);
            true
        });
        assert_eq!(seen, vec![vd, ti, ann]);
        assert!(any_node(&m.arena, vd, |id| id == ti));
        assert!(!any_node(&m.arena, vd, |id| id == ann));
    }
}
