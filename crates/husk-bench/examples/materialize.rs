//! Materialize objects the way a deserializer would: allocate without
//! running constructors, then fill fields from decoded data.
//!
//! Run with `RUST_LOG=husk_factory=debug` to see factory creation.

use std::sync::Arc;

use husk_core::{well_known, TypeMetadataOracle};
use husk_factory::{RawObject, UninitializedFactories};
use husk_test_utils::{ClassWithoutParameterlessCtor, Fixtures};
use husk_types::{FieldType, TypeDef};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let fx = Fixtures::new();
    let record = fx.registry.define(
        TypeDef::class("Record")
            .with_field("id", FieldType::Of(well_known::U32))
            .with_field("score", FieldType::Of(well_known::F64)),
    )?;
    let factories = UninitializedFactories::new(Arc::clone(&fx.registry));

    // Erased path: fill raw fields at their registered offsets.
    let factory = factories.create_factory(Some(record))?;
    let mut instance = factory.create_instance();
    let id = fx.registry.field(record, "id").ok_or("no field id")?;
    let score = fx.registry.field(record, "score").ok_or("no field score")?;
    if let Some(bytes) = instance.as_raw_mut().and_then(|raw| raw.as_bytes_mut()) {
        bytes[id.range()].copy_from_slice(&7u32.to_ne_bytes());
        bytes[score.range()].copy_from_slice(&0.5f64.to_ne_bytes());
    }
    println!(
        "{}: {:?}",
        fx.registry.type_name(record).unwrap_or_default(),
        instance.as_raw().and_then(RawObject::as_bytes)
    );

    // Typed path: the constructor requiring an argument never runs.
    let typed = factories.create_typed_factory::<ClassWithoutParameterlessCtor>()?;
    let mut object = typed.create_instance();
    object.value = 42;
    println!("ClassWithoutParameterlessCtor {{ value: {} }}", object.value);

    // Ineligible types are rejected up front.
    if let Err(err) = factories.create_factory(Some(well_known::STRING)) {
        println!("rejected: {err}");
    }
    Ok(())
}
