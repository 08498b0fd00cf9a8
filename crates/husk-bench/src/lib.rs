//! Benchmark profiles for the husk allocator.
//!
//! - [`wide_class`]: a class with many inline and reference fields
//! - [`generic_chain`]: nested instantiations `Box<Box<...<i32>>>`

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use husk_core::{well_known, RegistryError, TypeKey};
use husk_types::{FieldType, TypeDef, TypeRegistry};

/// Define `Wide{fields}`: `fields` fields cycling through the primitives,
/// with every fourth field a string reference.
pub fn wide_class(registry: &TypeRegistry, fields: usize) -> Result<TypeKey, RegistryError> {
    let def = (0..fields).fold(TypeDef::class(format!("Wide{fields}")), |def, i| {
        let ty = if i % 4 == 3 {
            well_known::STRING
        } else {
            well_known::PRIMITIVES[i % well_known::PRIMITIVES.len()]
        };
        def.with_field(format!("f{i}"), FieldType::Of(ty))
    });
    registry.define(def)
}

/// Define a one-field generic `Cell<T>` and instantiate it `depth` times
/// around `i32`. Returns the outermost instantiation.
pub fn generic_chain(registry: &TypeRegistry, depth: usize) -> Result<TypeKey, RegistryError> {
    let cell = match registry.lookup("Cell") {
        Some(cell) => cell,
        None => registry.define(
            TypeDef::class("Cell")
                .with_type_params(&["T"])
                .with_field("value", FieldType::Param(0)),
        )?,
    };
    (0..depth).try_fold(well_known::I32, |inner, _| {
        registry.instantiate(cell, &[inner])
    })
}
