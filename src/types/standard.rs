//! The shared instances of the commonly used grammar types
//!
//! The variant types are built from the leaf types, so the registry is set up
//! in two phases: [`build_leaf_types`] and then [`build_variant_types`].

use once_cell::sync::Lazy;

use super::{
    Array, Bool, Builder, ComplexNumber, Date, Flag, Integer, Real, RealWithUnits, Separator, StringType,
    TypeRef, Unsigned, Variant,
};

/// The types that do not depend on other shared types
#[derive(Debug, Clone)]
pub struct LeafTypes {
    pub integer: TypeRef,
    pub unsigned: TypeRef,
    pub real: TypeRef,
    pub boolean: TypeRef,
    pub flag: TypeRef,
    pub date: TypeRef,
    pub string: TypeRef,
    pub qstring: TypeRef,
    pub line_string: TypeRef,
    pub energy: TypeRef,
    pub complex_number: TypeRef,
    pub set_of_integers: TypeRef,
    pub set_of_reals: TypeRef,
    pub separator: TypeRef,
}

#[derive(Debug, Clone)]
pub struct VariantTypes {
    pub mixed: TypeRef,
    pub pot_mixed: TypeRef,
}

pub fn build_leaf_types() -> LeafTypes {
    let integer = Integer::new().shared();
    let real = Real::new().shared();
    LeafTypes {
        unsigned: Unsigned::new().shared(),
        boolean: Bool::new().shared(),
        flag: Flag::new().shared(),
        date: Date::new().shared(),
        string: StringType::word().shared(),
        qstring: StringType::quoted().shared(),
        line_string: StringType::line().shared(),
        energy: RealWithUnits::energy().shared(),
        complex_number: ComplexNumber::new(real.clone()).shared(),
        set_of_integers: Array::set_of(integer.clone()).shared(),
        set_of_reals: Array::set_of(real.clone()).shared(),
        separator: Separator::new().shared(),
        integer,
        real,
    }
}

pub fn build_variant_types(leaf: &LeafTypes) -> VariantTypes {
    VariantTypes {
        mixed: Variant::mixed(leaf).shared(),
        pot_mixed: Variant::pot_mixed(leaf).shared(),
    }
}

struct StandardTypes {
    leaf: LeafTypes,
    variant: VariantTypes,
}

static STANDARD: Lazy<StandardTypes> = Lazy::new(|| {
    log::debug!("Building the standard grammar types");
    let leaf = build_leaf_types();
    let variant = build_variant_types(&leaf);
    StandardTypes { leaf, variant }
});

macro_rules! standard_types {
    ($($group:ident . $name:ident),* $(,)?) => {
        $(
            pub fn $name() -> TypeRef {
                STANDARD.$group.$name.clone()
            }
        )*

        /// The names the standard types are known by
        pub fn names() -> &'static [&'static str] {
            &[$(stringify!($name)),*]
        }

        /// A standard type by its name
        pub fn by_name(name: &str) -> Option<TypeRef> {
            match name {
                $(stringify!($name) => Some($name()),)*
                _ => None,
            }
        }
    };
}

standard_types!(
    leaf.integer,
    leaf.unsigned,
    leaf.real,
    leaf.boolean,
    leaf.flag,
    leaf.date,
    leaf.string,
    leaf.qstring,
    leaf.line_string,
    leaf.energy,
    leaf.complex_number,
    leaf.set_of_integers,
    leaf.set_of_reals,
    leaf.separator,
    variant.mixed,
    variant.pot_mixed,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GrammarType;
    use std::sync::Arc;

    #[test]
    fn test_instances_are_shared() {
        assert!(Arc::ptr_eq(&integer(), &integer()));
        assert!(Arc::ptr_eq(&by_name("real").unwrap(), &real()));
        assert!(by_name("nothing").is_none());
    }

    #[test]
    fn test_every_name_resolves() {
        for name in names() {
            assert!(by_name(name).is_some(), "{} is not resolved", name);
        }
    }

    #[test]
    fn test_two_phase_build() {
        let leaf = build_leaf_types();
        let variant = build_variant_types(&leaf);
        assert_eq!(variant.mixed.type_name(), "Mixed");
        assert_eq!(variant.pot_mixed.type_name(), "PotMixed");
    }
}
