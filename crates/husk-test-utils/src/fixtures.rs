//! Shared sample types.
//!
//! [`Fixtures::new`] builds a [`TypeRegistry`] holding one type for every
//! case the allocator distinguishes: concrete, abstract and derived
//! classes, an interface, a generic definition with its parameter, closed,
//! open and shared instantiations, arrays, pointers, by-refs, spans and
//! the nullable wrapper.

#![allow(unsafe_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use husk_core::{well_known, ByReference, ByValue, IneligibleReason, Managed, TypeKey};
use husk_types::{FieldType, TypeDef, TypeRegistry};

/// Number of times [`SampleClass::new`] has run in this process.
pub static SAMPLE_CTOR_CALLS: AtomicUsize = AtomicUsize::new(0);

/// Reference type with a constructor that records that it ran.
#[derive(Debug)]
pub struct SampleClass {
    pub has_instance_ctor_run: bool,
    pub id: u64,
    pub next: Option<Box<SampleClass>>,
}

impl SampleClass {
    pub fn new() -> Self {
        SAMPLE_CTOR_CALLS.fetch_add(1, Ordering::SeqCst);
        Self {
            has_instance_ctor_run: true,
            id: 1,
            next: None,
        }
    }
}

impl Default for SampleClass {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: zeroed bool, u64 and Option<Box<_>> are false, 0 and None.
unsafe impl Managed for SampleClass {
    type Storage = ByReference;
}

/// Reference type whose only constructor takes an argument.
#[derive(Debug)]
pub struct ClassWithoutParameterlessCtor {
    pub value: i32,
}

impl ClassWithoutParameterlessCtor {
    pub fn new(value: i32) -> Self {
        Self { value }
    }
}

// SAFETY: a zeroed i32 is 0.
unsafe impl Managed for ClassWithoutParameterlessCtor {
    type Storage = ByReference;
}

/// Plain value type.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

// SAFETY: zeroed f32 fields are 0.0.
unsafe impl Managed for Vector2 {
    type Storage = ByValue;
}

/// A registry pre-populated with sample types, and their keys.
#[derive(Debug)]
pub struct Fixtures {
    pub registry: Arc<TypeRegistry>,
    pub abstract_base: TypeKey,
    pub derived: TypeKey,
    pub plain_class: TypeKey,
    pub linked_node: TypeKey,
    pub sample_class: TypeKey,
    pub no_default_ctor: TypeKey,
    pub vector2: TypeKey,
    pub interface: TypeKey,
    pub list: TypeKey,
    pub list_param: TypeKey,
    pub list_of_i32: TypeKey,
    pub list_of_param: TypeKey,
    pub list_of_canon: TypeKey,
    pub list_of_list_of_canon: TypeKey,
    pub int_array: TypeKey,
    pub pointer: TypeKey,
    pub by_ref: TypeKey,
    pub span_of_u8: TypeKey,
    pub nullable_i32: TypeKey,
}

impl Fixtures {
    pub fn new() -> Self {
        let r = TypeRegistry::new();

        let abstract_base = r
            .define(TypeDef::abstract_class("AbstractBase").with_field("id", FieldType::Of(well_known::U32)))
            .expect("AbstractBase");
        let derived = r
            .define(
                TypeDef::class("Derived")
                    .with_base(abstract_base)
                    .with_field("score", FieldType::Of(well_known::F64)),
            )
            .expect("Derived");
        let plain_class = r
            .define(
                TypeDef::class("PlainClass")
                    .with_field("count", FieldType::Of(well_known::I32))
                    .with_field("enabled", FieldType::Of(well_known::BOOL))
                    .with_field("label", FieldType::Of(well_known::STRING)),
            )
            .expect("PlainClass");
        let linked_node = r
            .define(
                TypeDef::class("LinkedNode")
                    .with_field("value", FieldType::Of(well_known::I64))
                    .with_field("next", FieldType::SelfReference),
            )
            .expect("LinkedNode");
        let sample_class = r
            .register::<SampleClass>(TypeDef::class("SampleClass"))
            .expect("SampleClass");
        let no_default_ctor = r
            .register::<ClassWithoutParameterlessCtor>(TypeDef::class(
                "ClassWithoutParameterlessCtor",
            ))
            .expect("ClassWithoutParameterlessCtor");
        let vector2 = r
            .register::<Vector2>(TypeDef::value("Vector2"))
            .expect("Vector2");
        let interface = r
            .define(TypeDef::interface("IInterface"))
            .expect("IInterface");

        let list = r
            .define(
                TypeDef::class("List")
                    .with_type_params(&["T"])
                    .with_field("first", FieldType::Param(0))
                    .with_field("count", FieldType::Of(well_known::I32)),
            )
            .expect("List");
        let list_param = r.type_parameters(list).expect("List<T> parameters")[0];
        let list_of_i32 = r.instantiate(list, &[well_known::I32]).expect("List<i32>");
        let list_of_param = r.instantiate(list, &[list_param]).expect("List<T>");
        let list_of_canon = r
            .instantiate(list, &[well_known::CANON])
            .expect("List<__Canon>");
        let list_of_list_of_canon = r
            .instantiate(list, &[list_of_canon])
            .expect("List<List<__Canon>>");

        let int_array = r.array_of(well_known::I32, 1).expect("i32[]");
        let pointer = r.pointer_to(well_known::I32).expect("i32*");
        let by_ref = r.by_ref(well_known::I32).expect("i32&");
        let span_of_u8 = r
            .instantiate(well_known::READ_ONLY_SPAN, &[well_known::U8])
            .expect("ReadOnlySpan<u8>");
        let nullable_i32 = r.key_of::<Option<i32>>().expect("Nullable<i32>");

        Self {
            registry: Arc::new(r),
            abstract_base,
            derived,
            plain_class,
            linked_node,
            sample_class,
            no_default_ctor,
            vector2,
            interface,
            list,
            list_param,
            list_of_i32,
            list_of_param,
            list_of_canon,
            list_of_list_of_canon,
            int_array,
            pointer,
            by_ref,
            span_of_u8,
            nullable_i32,
        }
    }

    /// Every type that must be rejected, with its name and expected reason.
    pub fn rejected(&self) -> Vec<(&'static str, Option<TypeKey>, IneligibleReason)> {
        use IneligibleReason::*;
        vec![
            ("<none>", None, NullType),
            ("<unknown>", Some(TypeKey(u32::MAX)), NullType),
            ("AbstractBase", Some(self.abstract_base), Abstract),
            ("IInterface", Some(self.interface), Interface),
            ("i32*", Some(self.pointer), NotAHeapType),
            ("i32&", Some(self.by_ref), NotAHeapType),
            ("i32[]", Some(self.int_array), VariableLengthLayout),
            ("Array", Some(well_known::ARRAY), VariableLengthLayout),
            ("string", Some(well_known::STRING), IntrinsicLayout),
            ("ReadOnlySpan<u8>", Some(self.span_of_u8), IntrinsicLayout),
            ("ReadOnlySpan<T>", Some(well_known::READ_ONLY_SPAN), IntrinsicLayout),
            ("List<T> definition", Some(self.list), OpenGeneric),
            ("List<T> instantiation", Some(self.list_of_param), OpenGeneric),
            ("T", Some(self.list_param), TypeParameter),
            ("__Canon", Some(well_known::CANON), SharedGenericLayout),
            ("List<__Canon>", Some(self.list_of_canon), SharedGenericLayout),
            (
                "List<List<__Canon>>",
                Some(self.list_of_list_of_canon),
                SharedGenericLayout,
            ),
        ]
    }

    /// Every type that must be accepted, with its name.
    pub fn accepted(&self) -> Vec<(&'static str, TypeKey)> {
        vec![
            ("object", well_known::OBJECT),
            ("i32", well_known::I32),
            ("Nullable<i32>", self.nullable_i32),
            ("Derived", self.derived),
            ("PlainClass", self.plain_class),
            ("LinkedNode", self.linked_node),
            ("SampleClass", self.sample_class),
            ("ClassWithoutParameterlessCtor", self.no_default_ctor),
            ("Vector2", self.vector2),
            ("List<i32>", self.list_of_i32),
        ]
    }
}

impl Default for Fixtures {
    fn default() -> Self {
        Self::new()
    }
}
