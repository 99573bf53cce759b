use super::*;
use pretty_assertions::assert_eq;

// Test Helpers

fn model_with_enums(names: &[&str]) -> (Model, EnumRegistry, Vec<u32>) {
    let mut model = Model::default();
    let mut reg = EnumRegistry::new();
    let mut ids = Vec::new();
    for name in names {
        let decl = model.add_enum(name, None);
        ids.push(reg.register_enum(decl));
    }
    (model, reg, ids)
}

// Registration

#[test]
fn test_register_enum_is_idempotent() {
    let mut model = Model::default();
    let mut reg = EnumRegistry::new();
    let e = model.add_enum("E", None);
    let id = reg.register_enum(e);
    assert_eq!(id, 1);
    assert_eq!(reg.register_enum(e), 1);
    assert_eq!(reg.enum_decl(1), Some(e));
    assert_eq!(reg.enum_decl(0), None);
    assert_eq!(reg.enum_count(), 1);
}

#[test]
fn test_array_enums_deduplicate() {
    let mut reg = EnumRegistry::new();
    let a = reg.register_array_enum(vec![1, 0]);
    let b = reg.register_array_enum(vec![1, 0]);
    let c = reg.register_array_enum(vec![0, 1]);
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(reg.register_array_enum(vec![0, 0]), 0);
    assert_eq!(reg.array_enum(c), Some(&[0, 1][..]));
}

#[test]
fn test_element_enum() {
    let mut reg = EnumRegistry::new();
    let arr = reg.register_array_enum(vec![0, 2]);
    assert_eq!(reg.element_enum(Type::par_int().with_dim(1).with_enum(arr)), 2);
    assert_eq!(reg.element_enum(Type::par_int().with_enum(5)), 5);
    assert_eq!(reg.element_enum(Type::par_int().with_dim(1)), 0);
}

// Subtyping

#[test]
fn test_strict_array_index_enums() {
    let (_, mut reg, ids) = model_with_enums(&["E", "F"]);
    let by_e = reg.register_array_enum(vec![ids[0], 0]);
    let by_f = reg.register_array_enum(vec![ids[1], 0]);
    let arr_e = Type::par_int().with_dim(1).with_enum(by_e);
    let arr_f = Type::par_int().with_dim(1).with_enum(by_f);
    let plain = Type::par_int().with_dim(1);
    assert!(reg.is_subtype(arr_e, arr_e, true));
    assert!(!reg.is_subtype(arr_e, arr_f, true));
    assert!(reg.is_subtype(arr_e, arr_f, false));
    assert!(reg.is_subtype(arr_e, plain, true));
    assert!(!reg.is_subtype(plain, arr_e, true));
    assert!(reg.is_subtype(Type::bot().with_dim(1), arr_e, true));
}

#[test]
fn test_strict_array_element_enums() {
    let (_, mut reg, ids) = model_with_enums(&["E", "F"]);
    let of_e = reg.register_array_enum(vec![0, ids[0]]);
    let of_f = reg.register_array_enum(vec![0, ids[1]]);
    let a = Type::par_int().with_dim(1).with_enum(of_e);
    let b = Type::par_int().with_dim(1).with_enum(of_f);
    assert!(!reg.is_subtype(a, b, true));
}

#[test]
fn test_set_of_enum_as_array() {
    let (_, mut reg, ids) = model_with_enums(&["E", "F"]);
    let of_e = reg.register_array_enum(vec![0, ids[0]]);
    let target = Type::par_int().with_dim(1).with_enum(of_e);
    let set_e = Type::par_set_int().with_enum(ids[0]);
    let set_f = Type::par_set_int().with_enum(ids[1]);
    assert!(reg.is_subtype(set_e, target, true));
    assert!(!reg.is_subtype(set_f, target, true));
}

// Display

#[test]
fn test_display_with_enum_names() {
    let (model, mut reg, ids) = model_with_enums(&["Colour", "Day"]);
    let scalar = Type::var_int().with_opt(true).with_enum(ids[0]);
    assert_eq!(reg.show(&model, scalar), "var opt Colour");

    let comp = reg.register_array_enum(vec![ids[1], 0, ids[0]]);
    let arr = Type::var_int().with_dim(2).with_enum(comp);
    assert_eq!(reg.show(&model, arr), "array[Day,int] of var Colour");

    let set = Type::par_set_int().with_enum(ids[1]);
    assert_eq!(reg.show(&model, set), "set of Day");
    assert_eq!(reg.show(&model, Type::par_float()), "float");
}
