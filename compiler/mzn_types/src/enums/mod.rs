//! Enum registry: enum identities and enum-aware subtyping.
//!
//! Scalar enum ids name an enum declaration. Array enum ids name a
//! composite entry: one id per dimension (the index set's enum, or `0`)
//! followed by the element's enum. Both id spaces start at `1`; `0` is
//! "not enumerated". The array dimension of a [`Type`] decides which space
//! its `enum_id` lives in.

use std::fmt;

use rustc_hash::FxHashMap;

use mzn_ir::{ExprId, Model, Type};

/// Enum declarations and composite array-enum signatures.
#[derive(Debug, Default)]
pub struct EnumRegistry {
    /// Enum declarations; id `n` is at index `n - 1`.
    decls: Vec<ExprId>,
    decl_ids: FxHashMap<ExprId, u32>,
    /// Composite array enums; id `n` is at index `n - 1`.
    arrays: Vec<Vec<u32>>,
    array_ids: FxHashMap<Vec<u32>, u32>,
}

impl EnumRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for the enum declared by `decl`, registering it on first use.
    pub fn register_enum(&mut self, decl: ExprId) -> u32 {
        if let Some(&id) = self.decl_ids.get(&decl) {
            return id;
        }
        self.decls.push(decl);
        let id = to_id(self.decls.len());
        self.decl_ids.insert(decl, id);
        id
    }

    /// Declaration of enum `id`.
    pub fn enum_decl(&self, id: u32) -> Option<ExprId> {
        let index = (id as usize).checked_sub(1)?;
        self.decls.get(index).copied()
    }

    pub fn enum_count(&self) -> usize {
        self.decls.len()
    }

    /// Id of the composite `[dim enums..., element enum]`, registering it on
    /// first use. All-zero signatures are not registered and yield `0`.
    pub fn register_array_enum(&mut self, ids: Vec<u32>) -> u32 {
        if ids.iter().all(|&e| e == 0) {
            return 0;
        }
        if let Some(&id) = self.array_ids.get(&ids) {
            return id;
        }
        self.arrays.push(ids.clone());
        let id = to_id(self.arrays.len());
        self.array_ids.insert(ids, id);
        id
    }

    /// Components of composite `id`.
    pub fn array_enum(&self, id: u32) -> Option<&[u32]> {
        let index = (id as usize).checked_sub(1)?;
        self.arrays.get(index).map(Vec::as_slice)
    }

    /// Components of an array type's enum, all zeros if it has none.
    pub fn array_components(&self, ty: Type) -> Vec<u32> {
        let len = usize::try_from(ty.dim.max(0)).unwrap_or(0) + 1;
        match self.array_enum(ty.enum_id) {
            Some(ids) => ids.to_vec(),
            None => vec![0; len],
        }
    }

    /// Enum of one array element (`0` if none or not an array).
    pub fn element_enum(&self, ty: Type) -> u32 {
        if ty.dim == 0 {
            return ty.enum_id;
        }
        self.array_enum(ty.enum_id)
            .and_then(|ids| ids.last().copied())
            .unwrap_or(0)
    }

    /// Subtyping including composite array enums.
    ///
    /// With `strict_enums`, an enumerated index set or element type only
    /// accepts the same enum (or `bot`), and an array without enum
    /// information does not match an enumerated array.
    pub fn is_subtype(&self, t1: Type, t2: Type, strict_enums: bool) -> bool {
        if !t1.is_subtype_of(&t2, strict_enums) {
            return false;
        }
        if !strict_enums {
            return true;
        }
        if t1.dim == 0 && t2.dim != 0 && t2.enum_id != 0 {
            // set used as an array
            let elem = self.element_enum(t2);
            if elem != 0 && t1.enum_id != elem {
                return false;
            }
        }
        if t1.dim > 0 && t1.enum_id != t2.enum_id {
            if t1.enum_id == 0 {
                return t1.is_bot();
            }
            if t2.enum_id != 0 {
                let (Some(a), Some(b)) = (self.array_enum(t1.enum_id), self.array_enum(t2.enum_id))
                else {
                    return false;
                };
                if a.len() == b.len() {
                    let n = a.len() - 1;
                    if a[..n].iter().zip(&b[..n]).any(|(&x, &y)| y != 0 && x != y) {
                        return false;
                    }
                }
                let (ea, eb) = (a.last().copied(), b.last().copied());
                if !t1.is_bot() && eb != Some(0) && ea != eb {
                    return false;
                }
            }
        }
        true
    }

    /// Name of enum `id`, or `int` if it is unknown.
    pub fn enum_name(&self, model: &Model, id: u32) -> String {
        match self.enum_decl(id) {
            Some(decl) => model.decl_name(decl),
            None => "int".to_owned(),
        }
    }

    /// Display adapter printing enum names in place of `int`.
    pub fn display<'a>(&'a self, model: &'a Model, ty: Type) -> TypeDisplay<'a> {
        TypeDisplay {
            ty,
            enums: self,
            model,
        }
    }

    /// Shorthand for `display(...).to_string()`.
    pub fn show(&self, model: &Model, ty: Type) -> String {
        self.display(model, ty).to_string()
    }
}

fn to_id(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// A [`Type`] rendered with enum names, e.g. `array[E,int] of var opt F`.
pub struct TypeDisplay<'a> {
    ty: Type,
    enums: &'a EnumRegistry,
    model: &'a Model,
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ty = self.ty;
        if ty.enum_id == 0 || ty.dim < 0 {
            return write!(f, "{ty}");
        }
        let (dims, elem) = if ty.dim > 0 {
            let ids = self.enums.array_components(ty);
            let (last, dims) = ids.split_last().map_or((0, &[][..]), |(l, d)| (*l, d));
            (dims.to_vec(), last)
        } else {
            (Vec::new(), ty.enum_id)
        };
        if ty.dim > 0 {
            f.write_str("array[")?;
            for (i, &d) in dims.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                f.write_str(&self.enums.enum_name(self.model, d))?;
            }
            f.write_str("] of ")?;
        }
        let scalar = ty.with_dim(0).with_enum(0);
        if elem == 0 || !ty.is_int() {
            return write!(f, "{scalar}");
        }
        let text = scalar.to_string();
        let head = text.strip_suffix("int").unwrap_or(&text);
        write!(f, "{head}{}", self.enums.enum_name(self.model, elem))
    }
}

#[cfg(test)]
mod tests;
