//! Lexical scope stack.
//!
//! Frames are pushed for the global model, for each function body and for
//! every comprehension or `let` (inner frames). Lookup walks outward through
//! inner and function frames, and from any top-level frame jumps straight to
//! the bottom (global) frame, so a declaration re-entered during ordering
//! never sees the locals of the function that referenced it.

mod suggest;

use rustc_hash::FxHashMap;

use mzn_ir::ast::Symbol;
use mzn_ir::{ExprId, Model};

use crate::{TypeCheckError, TypeCheckWarning};

pub use suggest::edit_distance;

/// Kind of a scope frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    Toplevel,
    Function,
    Inner,
}

#[derive(Debug)]
struct Frame {
    kind: ScopeKind,
    names: FxHashMap<Symbol, ExprId>,
}

impl Frame {
    fn new(kind: ScopeKind) -> Self {
        Frame {
            kind,
            names: FxHashMap::default(),
        }
    }
}

/// Stack of symbol tables. Starts with one top-level (global) frame.
#[derive(Debug)]
pub struct Scopes {
    frames: Vec<Frame>,
    warnings: Vec<TypeCheckWarning>,
}

impl Default for Scopes {
    fn default() -> Self {
        Self::new()
    }
}

impl Scopes {
    pub fn new() -> Self {
        Scopes {
            frames: vec![Frame::new(ScopeKind::Toplevel)],
            warnings: Vec::new(),
        }
    }

    pub fn push(&mut self) {
        self.frames.push(Frame::new(ScopeKind::Inner));
    }

    pub fn push_function(&mut self) {
        self.frames.push(Frame::new(ScopeKind::Function));
    }

    pub fn push_toplevel(&mut self) {
        self.frames.push(Frame::new(ScopeKind::Toplevel));
    }

    /// Pop the innermost frame. The global frame is never popped.
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Bind the declaration `decl` in the innermost frame.
    ///
    /// Anonymous declarations are skipped. Inside an inner frame, hiding a
    /// binding of an enclosing inner frame, or of the nearest function or
    /// top-level frame, records a shadowing warning. Rebinding a name in the
    /// same frame is an error.
    pub fn add(&mut self, model: &Model, decl: ExprId) -> Result<(), TypeCheckError> {
        let Some(vd) = model.var_decl(decl) else {
            return Err(TypeCheckError::internal(
                model.arena.span(decl),
                "only declarations can be added to a scope",
            ));
        };
        let span = model.arena.span(decl);
        let is_enum = model.type_inst(vd.ti).is_some_and(|ti| ti.is_enum);
        if !vd.toplevel && is_enum && vd.init.is_some() {
            return Err(TypeCheckError::invalid_type_inst(
                span,
                "enums are only allowed at top level",
            ));
        }
        let sym = vd.id;
        if sym.is_anonymous() {
            return Ok(());
        }
        let top = self.frames.len() - 1;
        if self.frames[top].kind == ScopeKind::Inner {
            for frame in self.frames[..top].iter().rev() {
                if let Some(&prev) = frame.names.get(&sym) {
                    self.warnings.push(TypeCheckWarning::shadowing(
                        span,
                        model.symbol_str(sym),
                        model.arena.span(prev),
                    ));
                    break;
                }
                if frame.kind != ScopeKind::Inner {
                    break;
                }
            }
        }
        let frame = &mut self.frames[top];
        if frame.names.contains_key(&sym) {
            return Err(TypeCheckError::duplicate(span, &model.symbol_str(sym)));
        }
        frame.names.insert(sym, decl);
        Ok(())
    }

    /// Frame indices visited by a lookup, innermost first.
    fn lookup_path(&self) -> impl Iterator<Item = usize> + '_ {
        let mut cur = Some(self.frames.len() - 1);
        std::iter::from_fn(move || {
            let i = cur?;
            cur = match self.frames[i].kind {
                ScopeKind::Toplevel if i > 0 => Some(0),
                _ => i.checked_sub(1),
            };
            Some(i)
        })
    }

    pub fn find(&self, sym: Symbol) -> Option<ExprId> {
        self.lookup_path()
            .find_map(|i| self.frames[i].names.get(&sym).copied())
    }

    /// Closest visible name to `sym` (edit distance below 3, length within 3).
    pub fn find_similar(&self, model: &Model, sym: Symbol) -> Option<String> {
        let wanted = model.symbol_str(sym);
        let mut best: Option<(usize, String)> = None;
        for i in self.lookup_path() {
            for cand in self.frames[i].names.keys() {
                let name = model.symbol_str(*cand);
                if name.len().abs_diff(wanted.len()) > 3 {
                    continue;
                }
                let d = edit_distance(&wanted, &name);
                let limit = best.as_ref().map_or(3, |(bd, _)| *bd);
                let better = d < limit
                    || best
                        .as_ref()
                        .is_some_and(|(bd, bn)| d == *bd && name < *bn);
                if better {
                    best = Some((d, name));
                }
            }
        }
        best.map(|(_, name)| name)
    }

    /// Warnings recorded since the last call.
    pub fn take_warnings(&mut self) -> Vec<TypeCheckWarning> {
        std::mem::take(&mut self.warnings)
    }
}

#[cfg(test)]
mod tests;
