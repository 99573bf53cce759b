//! Compact type descriptor.
//!
//! A [`Type`] is the type-inst of an expression: instantiation (par or var),
//! base type, set-ness, optionality, array dimensionality and an enum
//! identity. It is `Copy` and stored inline on every expression.
//!
//! Enum identities are plain numbers here. For scalars the number is the
//! id of an enum declaration; for arrays it is the id of a composite entry
//! (one id per dimension plus the element id) kept by the type checker's
//! enum registry. Id `0` always means "not enumerated".

use std::fmt;

use bitflags::bitflags;

/// Parameter (known at compile time) or decision variable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Inst {
    #[default]
    Par,
    Var,
}

/// Base type of a scalar, set element or array element.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum BaseType {
    /// Type of `<>` and `[]`; a subtype of everything.
    Bot,
    /// Accepts any base type (used in builtin signatures).
    Top,
    /// Not yet inferred.
    #[default]
    Unknown,
    Bool,
    Int,
    Float,
    String,
    Ann,
    Tuple,
}

impl BaseType {
    pub const fn as_str(self) -> &'static str {
        match self {
            BaseType::Bot => "bot",
            BaseType::Top => "top",
            BaseType::Unknown => "???",
            BaseType::Bool => "bool",
            BaseType::Int => "int",
            BaseType::Float => "float",
            BaseType::String => "string",
            BaseType::Ann => "ann",
            BaseType::Tuple => "tuple",
        }
    }
}

bitflags! {
    /// Extra type bits.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct TypeFlags: u8 {
        /// Par value computed in a var context (var condition, var where).
        const CONTAINS_VAR = 1 << 0;
        /// `any` type-inst in a declaration; resolved from the initializer.
        const ANY = 1 << 1;
    }
}

/// Type-inst descriptor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Type {
    pub inst: Inst,
    pub base: BaseType,
    pub set: bool,
    pub opt: bool,
    pub flags: TypeFlags,
    /// Number of array dimensions; `-1` for an unresolved `array[$_]`.
    pub dim: i8,
    /// Enum identity; `0` if not enumerated.
    pub enum_id: u32,
}

impl Type {
    pub const fn new(inst: Inst, base: BaseType, set: bool, opt: bool, dim: i8) -> Self {
        Type {
            inst,
            base,
            set,
            opt,
            flags: TypeFlags::empty(),
            dim,
            enum_id: 0,
        }
    }

    pub const fn par(base: BaseType) -> Self {
        Type::new(Inst::Par, base, false, false, 0)
    }

    pub const fn var(base: BaseType) -> Self {
        Type::new(Inst::Var, base, false, false, 0)
    }

    pub const fn par_int() -> Self {
        Type::par(BaseType::Int)
    }
    pub const fn var_int() -> Self {
        Type::var(BaseType::Int)
    }
    pub const fn par_bool() -> Self {
        Type::par(BaseType::Bool)
    }
    pub const fn var_bool() -> Self {
        Type::var(BaseType::Bool)
    }
    pub const fn par_float() -> Self {
        Type::par(BaseType::Float)
    }
    pub const fn var_float() -> Self {
        Type::var(BaseType::Float)
    }
    pub const fn par_string() -> Self {
        Type::par(BaseType::String)
    }
    pub const fn ann() -> Self {
        Type::par(BaseType::Ann)
    }
    pub const fn par_set_int() -> Self {
        Type::new(Inst::Par, BaseType::Int, true, false, 0)
    }
    pub const fn var_set_int() -> Self {
        Type::new(Inst::Var, BaseType::Int, true, false, 0)
    }
    pub const fn bot() -> Self {
        Type::par(BaseType::Bot)
    }
    pub const fn top() -> Self {
        Type::par(BaseType::Top)
    }
    pub const fn unknown() -> Self {
        Type::par(BaseType::Unknown)
    }

    // Predicates

    #[inline]
    pub const fn is_par(&self) -> bool {
        matches!(self.inst, Inst::Par)
    }
    #[inline]
    pub const fn is_var(&self) -> bool {
        matches!(self.inst, Inst::Var)
    }
    #[inline]
    pub const fn is_opt(&self) -> bool {
        self.opt
    }
    #[inline]
    pub const fn is_present(&self) -> bool {
        !self.opt
    }
    #[inline]
    pub const fn is_set(&self) -> bool {
        self.set
    }
    #[inline]
    pub fn cv(&self) -> bool {
        self.flags.contains(TypeFlags::CONTAINS_VAR)
    }
    #[inline]
    pub fn is_any(&self) -> bool {
        self.flags.contains(TypeFlags::ANY)
    }
    #[inline]
    pub const fn is_array(&self) -> bool {
        self.dim != 0
    }
    #[inline]
    pub const fn is_bot(&self) -> bool {
        matches!(self.base, BaseType::Bot)
    }
    #[inline]
    pub const fn is_top(&self) -> bool {
        matches!(self.base, BaseType::Top)
    }
    #[inline]
    pub const fn is_unknown(&self) -> bool {
        matches!(self.base, BaseType::Unknown)
    }
    #[inline]
    pub const fn is_int(&self) -> bool {
        matches!(self.base, BaseType::Int)
    }
    #[inline]
    pub const fn is_bool(&self) -> bool {
        matches!(self.base, BaseType::Bool)
    }
    #[inline]
    pub const fn is_float(&self) -> bool {
        matches!(self.base, BaseType::Float)
    }
    #[inline]
    pub const fn is_string(&self) -> bool {
        matches!(self.base, BaseType::String)
    }
    #[inline]
    pub const fn is_ann(&self) -> bool {
        matches!(self.base, BaseType::Ann)
    }

    /// A plain `int` value (par or var, opt or not), not a set or array.
    #[inline]
    pub const fn is_int_scalar(&self) -> bool {
        self.dim == 0 && !self.set && self.is_int()
    }

    /// Exactly `par set of int` (ignoring enum and cv).
    #[inline]
    pub const fn is_par_set_of_int(&self) -> bool {
        self.dim == 0 && self.set && self.is_par() && !self.opt && self.is_int()
    }

    /// Same type-inst ignoring enum identity and flags.
    #[inline]
    pub fn same_kind(&self, other: &Type) -> bool {
        self.inst == other.inst
            && self.base == other.base
            && self.set == other.set
            && self.opt == other.opt
            && self.dim == other.dim
    }

    // Builders

    #[must_use]
    pub const fn with_inst(mut self, inst: Inst) -> Self {
        self.inst = inst;
        self
    }
    #[must_use]
    pub const fn with_base(mut self, base: BaseType) -> Self {
        self.base = base;
        self
    }
    #[must_use]
    pub const fn with_set(mut self, set: bool) -> Self {
        self.set = set;
        self
    }
    #[must_use]
    pub const fn with_opt(mut self, opt: bool) -> Self {
        self.opt = opt;
        self
    }
    #[must_use]
    pub const fn with_dim(mut self, dim: i8) -> Self {
        self.dim = dim;
        self
    }
    #[must_use]
    pub const fn with_enum(mut self, enum_id: u32) -> Self {
        self.enum_id = enum_id;
        self
    }
    #[must_use]
    pub fn with_cv(mut self, cv: bool) -> Self {
        self.flags.set(TypeFlags::CONTAINS_VAR, cv);
        self
    }
    #[must_use]
    pub fn with_any(mut self, any: bool) -> Self {
        self.flags.set(TypeFlags::ANY, any);
        self
    }
    #[must_use]
    pub const fn to_var(self) -> Self {
        self.with_inst(Inst::Var)
    }
    #[must_use]
    pub const fn to_par(self) -> Self {
        self.with_inst(Inst::Par)
    }

    /// The scalar (or set) type of one array element, dropping the enum.
    #[must_use]
    pub const fn element(self) -> Self {
        self.with_dim(0).with_enum(0)
    }

    // Subtyping

    /// Base-type compatibility: equal bases (with matching scalar enum when
    /// `strict_enums`), or the numeric widenings `bool <: int <: float`.
    pub fn bt_subtype(t0: &Type, t1: &Type, strict_enums: bool) -> bool {
        if t0.base == t1.base
            && (!strict_enums || t0.dim != 0 || t0.enum_id == t1.enum_id || t1.enum_id == 0)
        {
            return true;
        }
        match t0.base {
            BaseType::Bool => matches!(t1.base, BaseType::Int | BaseType::Float),
            BaseType::Int => matches!(t1.base, BaseType::Float),
            _ => false,
        }
    }

    /// Structural subtyping, ignoring composite array enums.
    ///
    /// Composite enum checks for arrays need the enum registry and live in the
    /// type checker.
    pub fn is_subtype_of(&self, t: &Type, strict_enums: bool) -> bool {
        // A par set may be used where an array of its elements is expected.
        if self.dim == 0
            && t.dim != 0
            && self.set
            && !t.set
            && !self.is_float()
            && (self.is_bot() || Type::bt_subtype(self, t, false) || t.is_top())
            && self.is_par()
            && (!self.opt || self.opt == t.opt)
        {
            return true;
        }
        if self.dim != t.dim && (self.dim == 0 || t.dim != -1) {
            return false;
        }
        let opt_ok = !self.opt || self.opt == t.opt;
        if self.inst == t.inst && Type::bt_subtype(self, t, strict_enums) && self.set == t.set {
            return opt_ok;
        }
        if self.is_par() && Type::bt_subtype(self, t, strict_enums) && self.set == t.set {
            return opt_ok;
        }
        if self.is_par() && t.is_bot() {
            return true;
        }
        if (self.inst == t.inst || self.is_par())
            && self.is_bot()
            && (self.set == t.set || !self.set)
        {
            return opt_ok;
        }
        if t.is_top() && opt_ok && (!t.set || self.set == t.set) && (self.is_par() || t.is_var()) {
            return true;
        }
        false
    }
}

impl fmt::Display for Type {
    /// Renders the type-inst without enum names, e.g. `array[int,int] of var opt int`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dim == -1 {
            f.write_str("array[$_] of ")?;
        } else if self.dim > 0 {
            f.write_str("array[")?;
            for i in 0..self.dim {
                if i > 0 {
                    f.write_str(",")?;
                }
                f.write_str("int")?;
            }
            f.write_str("] of ")?;
        }
        if self.is_any() {
            f.write_str("any ")?;
        }
        if self.is_var() {
            f.write_str("var ")?;
        }
        if self.opt {
            f.write_str("opt ")?;
        }
        if self.set {
            f.write_str("set of ")?;
        }
        f.write_str(self.base.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_display() {
        assert_eq!(Type::par_int().to_string(), "int");
        assert_eq!(Type::var_int().with_opt(true).to_string(), "var opt int");
        assert_eq!(Type::var_set_int().to_string(), "var set of int");
        assert_eq!(
            Type::par_float().with_dim(2).to_string(),
            "array[int,int] of float"
        );
        assert_eq!(Type::par_int().with_dim(-1).to_string(), "array[$_] of int");
        assert_eq!(Type::bot().to_string(), "bot");
    }

    #[test]
    fn test_numeric_widening() {
        assert!(Type::par_bool().is_subtype_of(&Type::par_int(), false));
        assert!(Type::par_int().is_subtype_of(&Type::par_float(), false));
        assert!(Type::par_bool().is_subtype_of(&Type::var_float(), false));
        assert!(!Type::par_float().is_subtype_of(&Type::par_int(), false));
        assert!(!Type::par_string().is_subtype_of(&Type::par_int(), false));
    }

    #[test]
    fn test_par_var_and_opt() {
        assert!(Type::par_int().is_subtype_of(&Type::var_int(), false));
        assert!(!Type::var_int().is_subtype_of(&Type::par_int(), false));
        let opt = Type::var_int().with_opt(true);
        assert!(Type::var_int().is_subtype_of(&opt, false));
        assert!(!opt.is_subtype_of(&Type::var_int(), false));
    }

    #[test]
    fn test_set_to_array() {
        let arr = Type::par_int().with_dim(1);
        assert!(Type::par_set_int().is_subtype_of(&arr, false));
        assert!(!Type::var_set_int().is_subtype_of(&arr, false));
    }

    #[test]
    fn test_dimensions() {
        let a1 = Type::par_int().with_dim(1);
        let a2 = Type::par_int().with_dim(2);
        let generic = Type::par_int().with_dim(-1);
        assert!(!a1.is_subtype_of(&a2, false));
        assert!(a2.is_subtype_of(&generic, false));
        assert!(!Type::par_int().is_subtype_of(&generic, false));
    }

    #[test]
    fn test_bot_and_top() {
        assert!(Type::bot().is_subtype_of(&Type::var_int(), false));
        assert!(Type::bot().with_opt(true).is_subtype_of(&Type::par_int().with_opt(true), false));
        assert!(Type::par_string().is_subtype_of(&Type::top(), false));
        assert!(!Type::var_int().is_subtype_of(&Type::top(), false));
        assert!(Type::var_int().is_subtype_of(&Type::top().to_var(), false));
    }

    #[test]
    fn test_same_kind_ignores_enum_and_flags() {
        let e = Type::par_int().with_enum(3).with_cv(true);
        assert!(e.same_kind(&Type::par_int()));
        assert!(!e.same_kind(&Type::var_int()));
    }

    #[test]
    fn test_strict_enums_on_scalars() {
        let e1 = Type::par_int().with_enum(1);
        let e2 = Type::par_int().with_enum(2);
        assert!(e1.is_subtype_of(&Type::par_int(), true));
        assert!(!Type::par_int().is_subtype_of(&e1, true));
        assert!(!e1.is_subtype_of(&e2, true));
        assert!(e1.is_subtype_of(&e2, false));
    }
}
