//! The model: expression arena, function table, items and interner.

use crate::ast::{FunctionDecl, Item, ItemKind, Symbol, TypeInst, VarDecl};
use crate::{ExprArena, ExprId, FnId, Name, Span, StringInterner};

/// A parsed model, typed in place by the checker.
///
/// Included files are nested as [`ItemKind::Include`] items; their
/// expressions and functions share this model's arena and function list.
pub struct Model {
    pub arena: ExprArena,
    pub functions: Vec<FunctionDecl>,
    pub items: Vec<Item>,
    pub interner: StringInterner,
    pub filename: Name,
}

impl Model {
    pub fn new(filename: &str) -> Self {
        let interner = StringInterner::new();
        let filename = interner.intern(filename);
        Model {
            arena: ExprArena::new(),
            functions: Vec::new(),
            items: Vec::new(),
            interner,
            filename,
        }
    }

    #[inline]
    pub fn intern(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    #[inline]
    pub fn name_str(&self, name: Name) -> &'static str {
        self.interner.lookup(name)
    }

    /// Printable form of a symbol; introduced identifiers print as `X_INTRODUCED_<n>_`.
    pub fn symbol_str(&self, sym: Symbol) -> String {
        match sym.idn {
            Some(idn) if sym.name.is_empty() => format!("X_INTRODUCED_{idn}_"),
            _ => self.name_str(sym.name).to_owned(),
        }
    }

    #[inline]
    #[track_caller]
    pub fn fun(&self, id: FnId) -> &FunctionDecl {
        &self.functions[id.index()]
    }

    #[inline]
    #[track_caller]
    pub fn fun_mut(&mut self, id: FnId) -> &mut FunctionDecl {
        &mut self.functions[id.index()]
    }

    /// Store a function declaration without adding an item for it.
    pub fn push_function(&mut self, decl: FunctionDecl) -> FnId {
        let index = u32::try_from(self.functions.len())
            .unwrap_or_else(|_| panic!("function table exceeded u32::MAX entries"));
        self.functions.push(decl);
        FnId::new(index)
    }

    pub fn var_decl(&self, id: ExprId) -> Option<&VarDecl> {
        self.arena.kind(id).as_var_decl()
    }

    pub fn var_decl_mut(&mut self, id: ExprId) -> Option<&mut VarDecl> {
        self.arena.get_mut(id).kind.as_var_decl_mut()
    }

    pub fn type_inst(&self, id: ExprId) -> Option<&TypeInst> {
        self.arena.kind(id).as_type_inst()
    }

    /// Printable name of a declaration (empty for non-declarations).
    pub fn decl_name(&self, decl: ExprId) -> String {
        self.var_decl(decl)
            .map(|vd| self.symbol_str(vd.id))
            .unwrap_or_default()
    }

    pub fn push_item(&mut self, kind: ItemKind, span: Span) {
        self.items.push(Item::new(kind, span));
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::new("")
    }
}
