//! Support code for enumerated types.
//!
//! An enum is encoded as the integers `1..N`. Its initializer is split into
//! parts, each reserving a contiguous block of ordinals after the previous
//! part:
//!
//! ```text
//! enum E = {A, B} ++ C(1..3) ++ anon_enum(2);
//!          ├────┘    ├─────┘    └─ 2 ordinals, shown as to_enum(E,k)
//!          │         └─ card(1..3) ordinals, C(x) = to_enum(E, offset + x)
//!          └─ A = to_enum(E, 1), B = to_enum(E, 2)
//! ```
//!
//! For every enum this module generates the literal declarations, the
//! constructor functions and their inverses, and the `_toString_E`
//! family used by `show`. Nothing is evaluated: cardinalities stay
//! expressions, so an enum whose value only arrives later through an
//! assignment can still be declared (it gets a body-less `_toString_E`).

use mzn_ir::ast::{BinOpKind, ExprKind, FunctionDecl, Generator, Item, ItemKind, Symbol};
use mzn_ir::{CopyMap, ExprId, Inst, Model, Span, Type};

use crate::{CheckEnv, TypeCheckError};

/// Which kind of enum part an argument recorded for checking belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PartKind {
    /// `anon_enum(n)`; the argument must be `int`.
    Anon,
    /// `anon_enum_set(s)`; the argument must be a `set of int`.
    AnonSet,
    /// `C(s)`.
    Constructor,
}

/// State shared between the synthesis of all enums of a model.
#[derive(Debug, Default)]
pub struct EnumBookkeeping {
    /// `_toString_` functions referenced by constructor parts. Those not
    /// generated by the end of synthesis belong to plain integer sets.
    pub need_to_string: Vec<String>,
    /// Arguments of anonymous and constructor parts, typed between the
    /// two typing passes.
    pub part_args: Vec<(PartKind, ExprId)>,
    /// Contiguity assertions on constructor arguments, checked by
    /// evaluation once the model is typed.
    pub assertions: Vec<ExprId>,
}

impl EnumBookkeeping {
    fn need(&mut self, name: String) {
        if !self.need_to_string.contains(&name) {
            self.need_to_string.push(name);
        }
    }
}

/// Name of the string conversion for `name`, e.g. `_toString_E`.
pub fn to_string_name(prefix: &str, name: &str) -> String {
    format!("{prefix}{name}")
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out
}

/// Generate the support items for enum `enum_id` declared by `decl`,
/// appending them to `items`. The declaration's initializer is replaced
/// by `1..N`.
pub fn create_enum_mapper(
    model: &mut Model,
    env: &mut CheckEnv,
    enum_id: u32,
    decl: ExprId,
    items: &mut Vec<Item>,
    book: &mut EnumBookkeeping,
) -> Result<(), TypeCheckError> {
    let Some(init) = model.var_decl(decl).map(|vd| vd.init) else {
        return Err(TypeCheckError::internal(
            model.arena.span(decl),
            "enum mapper requires a declaration",
        ));
    };
    let name = model.decl_name(decl);
    let mut synth = Synth {
        model,
        enum_id,
        decl,
        name,
        items,
        book,
    };
    match init {
        None => {
            synth.stub();
            Ok(())
        }
        Some(init) => {
            let parts = synth.parts(env, init)?;
            synth.generate(env, &parts)?;
            tracing::debug!(name = %synth.name, parts = parts.len(), "synthesized enum");
            Ok(())
        }
    }
}

enum Part {
    /// Literal names.
    Names(Vec<ExprId>),
    /// Any other call: anonymous part or constructor.
    Call(ExprId),
}

struct Synth<'a> {
    model: &'a mut Model,
    enum_id: u32,
    decl: ExprId,
    name: String,
    items: &'a mut Vec<Item>,
    book: &'a mut EnumBookkeeping,
}

impl Synth<'_> {
    fn invalid_init(&self, span: Span) -> TypeCheckError {
        TypeCheckError::invalid_type_inst(
            span,
            format!("invalid initialisation for enum `{}'", self.name),
        )
    }

    fn parts(&mut self, env: &CheckEnv, init: ExprId) -> Result<Vec<Part>, TypeCheckError> {
        let span = self.model.arena.span(init);
        let names = &env.names;
        match self.model.arena.kind(init).clone() {
            ExprKind::SetLit { elems, .. } => Ok(vec![Part::Names(elems)]),
            ExprKind::ArrayLit { elems, .. } => Ok(vec![Part::Names(elems)]),
            ExprKind::Call { name, args, .. } if name == names.anon_enum => {
                if let [arg] = args.as_slice() {
                    if let ExprKind::ArrayLit { elems, .. } = self.model.arena.kind(*arg) {
                        return Ok(vec![Part::Names(elems.clone())]);
                    }
                }
                Ok(vec![Part::Call(init)])
            }
            ExprKind::Call { name, args, .. } if name == names.enum_from_constructors => {
                let elems = match args.as_slice() {
                    [arg] => match self.model.arena.kind(*arg) {
                        ExprKind::ArrayLit { elems, .. } => Some(elems.clone()),
                        _ => None,
                    },
                    _ => None,
                };
                let Some(elems) = elems else {
                    return Err(TypeCheckError::invalid_type_inst(
                        span,
                        "enumFromConstructors used with incorrect argument type (only supports array literals)",
                    ));
                };
                elems
                    .into_iter()
                    .map(|e| match self.model.arena.kind(e) {
                        ExprKind::SetLit { elems, .. } => Ok(Part::Names(elems.clone())),
                        ExprKind::Call { .. } => Ok(Part::Call(e)),
                        _ => Err(self.invalid_init(self.model.arena.span(e))),
                    })
                    .collect()
            }
            ExprKind::Call { .. } => Ok(vec![Part::Call(init)]),
            _ => Err(self.invalid_init(span)),
        }
    }

    fn generate(&mut self, env: &CheckEnv, parts: &[Part]) -> Result<(), TypeCheckError> {
        let multi = parts.len() > 1;
        // cumulative cardinality after each part
        let mut cards: Vec<ExprId> = Vec::with_capacity(parts.len());
        for (p, part) in parts.iter().enumerate() {
            let prefix = if multi {
                format!("_toString_{p}_")
            } else {
                "_toString_".to_owned()
            };
            let prev = cards.last().copied();
            let card = match part {
                Part::Names(elems) => self.names_part(p, elems, prev, &prefix)?,
                Part::Call(call) => {
                    let ExprKind::Call { name, args, .. } = self.model.arena.kind(*call).clone()
                    else {
                        return Err(self.invalid_init(self.model.arena.span(*call)));
                    };
                    if name == env.names.anon_enum || name == env.names.anon_enum_set {
                        let kind = if name == env.names.anon_enum {
                            PartKind::Anon
                        } else {
                            PartKind::AnonSet
                        };
                        Some(self.anon_part(kind, &args, prev, &prefix)?)
                    } else {
                        Some(self.constructor_part(p, *call, prev, &prefix)?)
                    }
                }
            };
            if let Some(card) = card {
                cards.push(card);
            }
        }

        let one = self.model.int(1);
        let upper = match cards.last() {
            Some(&c) => self.dup(c),
            None => self.model.int(0),
        };
        let span = self.model.arena.span(self.decl);
        let range = self.model.binop(BinOpKind::DotDot, one, upper);
        let range = self.model.at(range, span);
        if let Some(vd) = self.model.var_decl_mut(self.decl) {
            vd.init = Some(range);
        }

        if multi {
            self.dispatcher(parts.len(), &cards);
        }
        self.array_to_string(false);
        self.set_to_string();
        self.array_to_string(true);
        Ok(())
    }

    // Small builders

    fn enum_ref(&mut self) -> ExprId {
        self.model.id_of(self.decl)
    }

    fn dup(&mut self, e: ExprId) -> ExprId {
        self.model.copy_expr(&mut CopyMap::new(), e)
    }

    fn call(&mut self, name: &str, args: Vec<ExprId>) -> ExprId {
        self.model.call(name, args)
    }

    fn call1(&mut self, name: &str, decl: ExprId) -> ExprId {
        let arg = self.model.id_of(decl);
        self.model.call(name, vec![arg])
    }

    /// `a ++ b ++ ...`
    fn concat(&mut self, parts: Vec<ExprId>) -> ExprId {
        let mut iter = parts.into_iter();
        let Some(first) = iter.next() else {
            return self.model.string("");
        };
        iter.fold(first, |acc, e| self.model.binop(BinOpKind::PlusPlus, acc, e))
    }

    fn local(&mut self, name: &str, ty: Type, domain: Option<ExprId>) -> ExprId {
        let ti = self.model.type_inst_node(Vec::new(), ty, domain, false);
        self.model.mk_var_decl(name, ti, None)
    }

    /// `bool: b, bool: json`
    fn flags(&mut self) -> (ExprId, ExprId) {
        let b = self.local("b", Type::par_bool(), None);
        let json = self.local("json", Type::par_bool(), None);
        (b, json)
    }

    /// `if json then "null" else "<>" endif`
    fn absent_text(&mut self, json: ExprId) -> ExprId {
        let cond = self.model.id_of(json);
        let null = self.model.string("null");
        let dzn = self.model.string("<>");
        self.model.ite(vec![(cond, null)], Some(dzn))
    }

    /// `opt E: x` with the enum as domain.
    fn enum_param(&mut self, name: &str, ty: Type) -> ExprId {
        let domain = self.enum_ref();
        self.local(name, ty.with_enum(self.enum_id), Some(domain))
    }

    fn toplevel_decl(&mut self, sym: Symbol, ti: ExprId, init: ExprId, span: Span) -> ExprId {
        let vd = self.model.decl_node(sym, ti, Some(init), true);
        self.model.at(vd, span);
        self.items.push(Item::new(ItemKind::VarDecl(vd), span));
        vd
    }

    fn function(&mut self, name: &str, params: Vec<ExprId>, ret: ExprId, body: Option<ExprId>) {
        let name = self.model.intern(name);
        let fid = self
            .model
            .push_function(FunctionDecl::new(name, params, ret, body));
        self.items.push(Item::new(ItemKind::Function(fid), Span::DUMMY));
    }

    fn string_fn(&mut self, name: &str, x: ExprId, b: ExprId, json: ExprId, body: Option<ExprId>) {
        let ret = self.model.ti(Type::par_string());
        self.function(name, vec![x, b, json], ret, body);
    }

    /// `{ f(s) | s in x }` over a parameter `x`.
    fn set_map(&mut self, f: &str, x: ExprId, elem: Type) -> ExprId {
        let s = self.local("s", elem, None);
        let s_ref = self.model.id_of(s);
        let body = self.model.call(f, vec![s_ref]);
        let source = self.model.id_of(x);
        let gen = Generator {
            decls: vec![s],
            source: Some(source),
            where_clause: None,
        };
        self.model.comprehension(body, vec![gen], true)
    }

    // Enums without a value

    fn stub(&mut self) {
        let x = self.local("x", Type::par_int().with_opt(true), None);
        let (b, json) = self.flags();
        let name = to_string_name("_toString_", &self.name);
        self.string_fn(&name, x, b, json, None);
    }

    // Parts

    fn names_part(
        &mut self,
        p: usize,
        elems: &[ExprId],
        prev: Option<ExprId>,
        prefix: &str,
    ) -> Result<Option<ExprId>, TypeCheckError> {
        let mut last_ord = None;
        let mut labels = Vec::with_capacity(elems.len());
        for (i, &elem) in elems.iter().enumerate() {
            let span = self.model.arena.span(elem);
            let Some(ident) = self.model.arena.kind(elem).as_ident().cloned() else {
                return Err(self.invalid_init(span));
            };
            let ti = self.model.ti(Type::par_int().with_enum(self.enum_id));
            let k = self.model.int(i64::try_from(i + 1).unwrap_or(i64::MAX));
            let ord = match prev {
                None => k,
                Some(pc) => {
                    let pc = self.dup(pc);
                    self.model.binop(BinOpKind::Plus, pc, k)
                }
            };
            let e = self.enum_ref();
            let to_enum = self.call("to_enum", vec![e, ord]);
            let to_enum = self.model.at(to_enum, span);
            self.toplevel_decl(ident.sym, ti, to_enum, span);
            let text = self.model.symbol_str(ident.sym);
            labels.push(self.model.string(&text));
            last_ord = Some(ord);
        }
        let card = last_ord.map(|ord| self.dup(ord));

        let arr_name = to_string_name(&format!("_enum_to_string_{p}_"), &self.name);
        let index = self.model.ti_index_int();
        let arr_ti = self.model.ti_array(vec![index], Type::par_string(), None);
        let labels = self.model.array_lit(labels);
        let arr = self.model.decl_node(
            Symbol::named(self.model.intern(&arr_name)),
            arr_ti,
            Some(labels),
            true,
        );
        self.items.push(Item::new(ItemKind::VarDecl(arr), Span::DUMMY));

        let x = self.local("x", Type::par_int().with_opt(true), None);
        let (b, json) = self.flags();
        let label = |s: &mut Self| {
            let deopt = s.call1("deopt", x);
            let idx = match prev {
                None => deopt,
                Some(pc) => {
                    let pc = s.dup(pc);
                    s.model.binop(BinOpKind::Minus, deopt, pc)
                }
            };
            let arr_ref = s.model.id_of(arr);
            s.model.access(arr_ref, vec![idx])
        };
        let dzn_label = label(self);
        let dzn = self.call("showDznId", vec![dzn_label]);
        let open = self.model.string("{\"e\":");
        let json_label = label(self);
        let shown = self.call("show", vec![json_label]);
        let close = self.model.string("}");
        let as_json = self.concat(vec![open, shown, close]);
        let plain = label(self);
        let b_ref = self.model.id_of(b);
        let json_ref = self.model.id_of(json);
        let present = self
            .model
            .ite(vec![(b_ref, dzn), (json_ref, as_json)], Some(plain));
        let occurs = self.call1("occurs", x);
        let absent = self.absent_text(json);
        let body = self.model.ite(vec![(occurs, present)], Some(absent));
        let name = to_string_name(prefix, &self.name);
        self.string_fn(&name, x, b, json, Some(body));
        Ok(card)
    }

    fn anon_part(
        &mut self,
        kind: PartKind,
        args: &[ExprId],
        prev: Option<ExprId>,
        prefix: &str,
    ) -> Result<ExprId, TypeCheckError> {
        let [arg] = args else {
            let span = self.model.arena.span(self.decl);
            return Err(self.invalid_init(span));
        };
        let checked = self.dup(*arg);
        self.book.part_args.push((kind, checked));

        let x = self.local("x", Type::par_int().with_opt(true), None);
        let (b, json) = self.flags();
        // `to_enum(E,k)` takes the ordinal over the whole enum
        let show_k = |s: &mut Self| {
            let deopt = s.call1("deopt", x);
            s.call("show", vec![deopt])
        };
        let head = format!("to_enum({},", self.name);
        let dzn_open = self.model.string(&head);
        let dzn_k = show_k(self);
        let dzn_close = self.model.string(")");
        let dzn = self.concat(vec![dzn_open, dzn_k, dzn_close]);
        let json_open = self
            .model
            .string(&format!("{{\"e\":\"{}\", \"i\":", escape(&self.name)));
        let json_k = show_k(self);
        let json_close = self.model.string("}");
        let as_json = self.concat(vec![json_open, json_k, json_close]);
        let plain_open = self.model.string(&head);
        let plain_k = show_k(self);
        let plain_close = self.model.string(")");
        let plain = self.concat(vec![plain_open, plain_k, plain_close]);

        let is_absent = self.call1("absent", x);
        let absent = self.absent_text(json);
        let b_ref = self.model.id_of(b);
        let json_ref = self.model.id_of(json);
        let body = self.model.ite(
            vec![(is_absent, absent), (b_ref, dzn), (json_ref, as_json)],
            Some(plain),
        );
        let name = to_string_name(prefix, &self.name);
        self.string_fn(&name, x, b, json, Some(body));

        let count = match kind {
            PartKind::Anon => self.dup(*arg),
            _ => {
                let a = self.dup(*arg);
                self.call("card", vec![a])
            }
        };
        Ok(match prev {
            None => count,
            Some(pc) => {
                let pc = self.dup(pc);
                self.model.binop(BinOpKind::Plus, pc, count)
            }
        })
    }

    fn constructor_part(
        &mut self,
        p: usize,
        call: ExprId,
        prev: Option<ExprId>,
        prefix: &str,
    ) -> Result<ExprId, TypeCheckError> {
        let span = self.model.arena.span(call);
        let ExprKind::Call { name, args, .. } = self.model.arena.kind(call).clone() else {
            return Err(self.invalid_init(span));
        };
        let [arg] = args.as_slice() else {
            return Err(TypeCheckError::invalid_type_inst(
                span,
                "enum constructors must have a single argument",
            ));
        };
        let cname = self.model.name_str(name);
        let inv_name = format!("{cname}⁻¹");
        let checked = self.dup(*arg);
        self.book
            .part_args
            .push((PartKind::Constructor, checked));

        // the argument set, named
        let (arg_decl, arg_name) = match self.model.arena.kind(*arg).as_ident().cloned() {
            Some(ident) => (None, self.model.symbol_str(ident.sym)),
            None => {
                let n = to_string_name(&format!("_constrId_{p}_"), &self.name);
                let ti = self.model.ti(Type::par_set_int());
                let sym = Symbol::named(self.model.intern(&n));
                let vd = self.toplevel_decl(sym, ti, *arg, Span::DUMMY);
                (Some(vd), n)
            }
        };
        let arg_ref = |s: &mut Self| match arg_decl {
            Some(vd) => s.model.id_of(vd),
            None => s.dup(*arg),
        };

        // contiguity: max(A) - min(A) + 1 = card(A)
        let a = arg_ref(self);
        let max = self.call("max", vec![a]);
        let a = arg_ref(self);
        let min = self.call("min", vec![a]);
        let width = self.model.binop(BinOpKind::Minus, max, min);
        let one = self.model.int(1);
        let width = self.model.binop(BinOpKind::Plus, width, one);
        let a = arg_ref(self);
        let card = self.call("card", vec![a]);
        let contiguous = self.model.binop(BinOpKind::Eq, width, card);
        let msg = self.model.string(&format!(
            "argument for enum constructor `{cname}' is not a contiguous set"
        ));
        let assertion = self.call("assert", vec![contiguous, msg]);
        let assertion = self.model.at(assertion, span);
        self.book.assertions.push(assertion);
        self.items
            .push(Item::new(ItemKind::Constraint(assertion), span));

        // offset = prev - (min(A) - 1)
        let prev_card = match prev {
            Some(pc) => self.dup(pc),
            None => self.model.int(0),
        };
        let a = arg_ref(self);
        let min = self.call("min", vec![a]);
        let one = self.model.int(1);
        let min_minus_one = self.model.binop(BinOpKind::Minus, min, one);
        let offset_init = self.model.binop(BinOpKind::Minus, prev_card, min_minus_one);
        let offset_name = to_string_name(&format!("_constrMin_{p}_"), &self.name);
        let offset_ti = self.model.ti(Type::par_int());
        let offset_sym = Symbol::named(self.model.intern(&offset_name));
        let offset = self.toplevel_decl(offset_sym, offset_ti, offset_init, Span::DUMMY);

        self.forward_fns(cname, offset, &arg_ref);
        self.inverse_fns(&inv_name, offset, &arg_ref);

        // string conversion through the inverse
        let x = self.enum_param("x", Type::par_int().with_opt(true));
        let (b, json) = self.flags();
        let inv = self.call1(&inv_name, x);
        let b_ref = self.model.id_of(b);
        let json_ref = self.model.id_of(json);
        let inner_name = to_string_name("_toString_", &arg_name);
        self.book.need(inner_name.clone());
        let inner = self.call(&inner_name, vec![inv, b_ref, json_ref]);
        let json_ref = self.model.id_of(json);
        let open_json = self.model.string(&format!(
            "{{ \"c\" : \"{}\", \"e\" : ",
            escape(cname)
        ));
        let b_ref = self.model.id_of(b);
        let quoted = self.model.string(cname);
        let quoted = self.call("showDznId", vec![quoted]);
        let plain = self.model.string(cname);
        let ident = self.model.ite(vec![(b_ref, quoted)], Some(plain));
        let paren = self.model.string("(");
        let open_other = self.concat(vec![ident, paren]);
        let open = self.model.ite(vec![(json_ref, open_json)], Some(open_other));
        let json_ref = self.model.id_of(json);
        let close_json = self.model.string("}");
        let close_other = self.model.string(")");
        let close = self.model.ite(vec![(json_ref, close_json)], Some(close_other));
        let text = self.concat(vec![open, inner, close]);
        let is_absent = self.call1("absent", x);
        let absent = self.absent_text(json);
        let body = self.model.ite(vec![(is_absent, absent)], Some(text));
        let name = to_string_name(prefix, &self.name);
        self.string_fn(&name, x, b, json, Some(body));

        let a = arg_ref(self);
        let count = self.call("card", vec![a]);
        Ok(match prev {
            None => count,
            Some(pc) => {
                let pc = self.dup(pc);
                self.model.binop(BinOpKind::Plus, pc, count)
            }
        })
    }

    /// `C(x)` from the argument set into the enum, in all six variants.
    fn forward_fns(&mut self, cname: &str, offset: ExprId, arg_ref: &dyn Fn(&mut Self) -> ExprId) {
        let enum_ty = Type::par_int().with_enum(self.enum_id);
        for inst in [Inst::Par, Inst::Var] {
            let a = arg_ref(self);
            let x = self.local("x", Type::unknown().with_inst(inst), Some(a));
            let off = self.model.id_of(offset);
            let x_ref = self.model.id_of(x);
            let ord = self.model.binop(BinOpKind::Plus, off, x_ref);
            let e = self.enum_ref();
            let body = self.call("to_enum", vec![e, ord]);
            let ret = self.model.ti(enum_ty.with_inst(inst));
            self.function(cname, vec![x], ret, Some(body));
        }
        for inst in [Inst::Par, Inst::Var] {
            let a = arg_ref(self);
            let x = self.local("x", Type::unknown().with_inst(inst).with_opt(true), Some(a));
            let occurs = self.call1("occurs", x);
            let deopt = self.call1("deopt", x);
            let inner = self.call(cname, vec![deopt]);
            let e = self.enum_ref();
            let absent = self.model.absent();
            let none = self.call("to_enum", vec![e, absent]);
            let body = self.model.ite(vec![(occurs, inner)], Some(none));
            let ret = self.model.ti(enum_ty.with_inst(inst).with_opt(true));
            self.function(cname, vec![x], ret, Some(body));
        }
        for inst in [Inst::Par, Inst::Var] {
            let a = arg_ref(self);
            let x = self.local("x", Type::unknown().with_inst(inst).with_set(true), Some(a));
            let body = self.set_map(cname, x, Type::par_int().with_inst(inst));
            let ret = self.model.ti(enum_ty.with_inst(inst).with_set(true));
            self.function(cname, vec![x], ret, Some(body));
        }
    }

    /// `C⁻¹(x)` from the enum back into the argument set.
    fn inverse_fns(&mut self, inv: &str, offset: ExprId, arg_ref: &dyn Fn(&mut Self) -> ExprId) {
        for inst in [Inst::Par, Inst::Var] {
            let x = self.enum_param("x", Type::par_int().with_inst(inst));
            let x_ref = self.model.id_of(x);
            let off = self.model.id_of(offset);
            let ord = self.model.binop(BinOpKind::Minus, x_ref, off);
            let a = arg_ref(self);
            let body = self.call("to_enum", vec![a, ord]);
            let a = arg_ref(self);
            let ret = self.model.ti_domain(inst, false, a);
            self.function(inv, vec![x], ret, Some(body));
        }
        for inst in [Inst::Par, Inst::Var] {
            let x = self.enum_param("x", Type::par_int().with_inst(inst).with_opt(true));
            let occurs = self.call1("occurs", x);
            let deopt = self.call1("deopt", x);
            let inner = self.call(inv, vec![deopt]);
            let a = arg_ref(self);
            let absent = self.model.absent();
            let none = self.call("to_enum", vec![a, absent]);
            let body = self.model.ite(vec![(occurs, inner)], Some(none));
            let a = arg_ref(self);
            let ret_ty = Type::unknown().with_inst(inst).with_opt(true);
            let ret = self.model.type_inst_node(Vec::new(), ret_ty, Some(a), false);
            self.function(inv, vec![x], ret, Some(body));
        }
        for inst in [Inst::Par, Inst::Var] {
            let x = self.enum_param("x", Type::par_int().with_inst(inst).with_set(true));
            let body = self.set_map(inv, x, Type::par_int().with_inst(inst));
            let a = arg_ref(self);
            let ret = self.model.ti_domain(inst, true, a);
            self.function(inv, vec![x], ret, Some(body));
        }
    }

    // String conversion of the whole enum

    /// `_toString_E` choosing the part by cumulative cardinality.
    fn dispatcher(&mut self, n_parts: usize, cards: &[ExprId]) {
        let x = self.enum_param("x", Type::par_int().with_opt(true));
        let (b, json) = self.flags();
        let mut branches = Vec::new();
        let mut last = None;
        for i in 0..n_parts {
            let args = vec![
                self.model.id_of(x),
                self.model.id_of(b),
                self.model.id_of(json),
            ];
            let name = to_string_name(&format!("_toString_{i}_"), &self.name);
            let part = self.call(&name, args);
            match cards.get(i) {
                Some(&card) if i + 1 < n_parts => {
                    let deopt = self.call1("deopt", x);
                    let bound = self.dup(card);
                    let cond = self.model.binop(BinOpKind::Lq, deopt, bound);
                    branches.push((cond, part));
                }
                _ => last = Some(part),
            }
        }
        let cases = if branches.is_empty() {
            last
        } else {
            Some(self.model.ite(branches, last))
        };
        let is_absent = self.call1("absent", x);
        let absent = self.absent_text(json);
        let body = match cases {
            Some(cases) => self.model.ite(vec![(is_absent, absent)], Some(cases)),
            None => absent,
        };
        let name = to_string_name("_toString_", &self.name);
        self.string_fn(&name, x, b, json, Some(body));
    }

    /// `_toString_E` for `array[$U] of opt E` (or `array[$U] of set of E`).
    fn array_to_string(&mut self, of_sets: bool) {
        let elem = if of_sets {
            Type::par_set_int()
        } else {
            Type::par_int().with_opt(true)
        };
        let u = self.model.ti_index_var("U");
        let domain = self.enum_ref();
        let x_ti = self
            .model
            .type_inst_node(vec![u], elem.with_dim(-1), Some(domain), false);
        let x = self.model.mk_var_decl("x", x_ti, None);
        let (b, json) = self.flags();

        let index = self.model.ti_index_int();
        let domain = self.enum_ref();
        let xx_ti = self
            .model
            .type_inst_node(vec![index], elem.with_dim(1), Some(domain), false);
        let flat = self.call1("array1d", x);
        let xx = self.model.mk_var_decl("xx", xx_ti, Some(flat));

        let i = self.local("i", Type::par_int(), None);
        let xx_ref = self.model.id_of(xx);
        let i_ref = self.model.id_of(i);
        let elem_at = self.model.access(xx_ref, vec![i_ref]);
        let b_ref = self.model.id_of(b);
        let json_ref = self.model.id_of(json);
        let name = to_string_name("_toString_", &self.name);
        let shown = self.call(&name, vec![elem_at, b_ref, json_ref]);
        let indices = self.call1("index_set", xx);
        let gen = Generator {
            decls: vec![i],
            source: Some(indices),
            where_clause: None,
        };
        let comp = self.model.comprehension(shown, vec![gen], false);
        let sep = self.model.string(", ");
        let joined = self.call("join", vec![sep, comp]);
        let open = self.model.string("[");
        let close = self.model.string("]");
        let text = self.concat(vec![open, joined, close]);
        let body = self.model.let_in(vec![xx], text);
        self.string_fn(&name, x, b, json, Some(body));
    }

    /// `_toString_E` for `set of E`.
    fn set_to_string(&mut self) {
        let x = self.enum_param("x", Type::par_set_int());
        let (b, json) = self.flags();
        let i = self.local("i", Type::par_int(), None);
        let i_ref = self.model.id_of(i);
        let b_ref = self.model.id_of(b);
        let json_ref = self.model.id_of(json);
        let name = to_string_name("_toString_", &self.name);
        let shown = self.call(&name, vec![i_ref, b_ref, json_ref]);
        let source = self.model.id_of(x);
        let gen = Generator {
            decls: vec![i],
            source: Some(source),
            where_clause: None,
        };
        let comp = self.model.comprehension(shown, vec![gen], false);
        let sep = self.model.string(", ");
        let joined = self.call("join", vec![sep, comp]);

        let json_ref = self.model.id_of(json);
        let set_open = self.model.string("\"set\":[");
        let empty = self.model.string("");
        let json_open = self.model.ite(vec![(json_ref, set_open)], Some(empty));
        let json_ref = self.model.id_of(json);
        let set_close = self.model.string("]");
        let empty = self.model.string("");
        let json_close = self.model.ite(vec![(json_ref, set_close)], Some(empty));
        let open = self.model.string("{");
        let close = self.model.string("}");
        let body = self.concat(vec![open, json_open, joined, json_close, close]);
        self.string_fn(&name, x, b, json, Some(body));
    }
}
