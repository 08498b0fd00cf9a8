//! Test utilities and mock types for husk development.
//!
//! Provides a [`MockOracle`] whose answers are set directly, a
//! [`CountingAllocator`] for allocation accounting, and
//! [`Fixtures`]: a registry pre-populated with the sample types the
//! integration tests and benches share.

#![deny(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod alloc;
pub mod fixtures;

pub use alloc::CountingAllocator;
pub use fixtures::{
    ClassWithoutParameterlessCtor, Fixtures, SampleClass, Vector2, SAMPLE_CTOR_CALLS,
};

use std::alloc::Layout;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use husk_core::{Managed, RustBinding, TypeKey, TypeMetadataOracle};

/// Answers for one type in a [`MockOracle`].
///
/// Every predicate defaults to `false`; set the ones under test with
/// struct update syntax.
#[derive(Clone, Debug, Default)]
pub struct MockType {
    pub name: String,
    pub layout: Option<Layout>,
    pub is_abstract: bool,
    pub is_interface: bool,
    pub is_array: bool,
    pub is_pointer_or_byref: bool,
    pub is_open_generic_definition: bool,
    pub is_type_parameter: bool,
    pub is_shared_generic_instantiation: bool,
    pub is_intrinsic_layout: bool,
    pub is_nullable_wrapper_shape: bool,
    pub is_value_type: bool,
    pub binding: Option<RustBinding>,
}

impl MockType {
    /// A plain reference type.
    pub fn class(name: &str, layout: Layout) -> Self {
        Self {
            name: name.to_string(),
            layout: Some(layout),
            ..Self::default()
        }
    }

    /// A plain value type.
    pub fn value(name: &str, layout: Layout) -> Self {
        Self {
            is_value_type: true,
            ..Self::class(name, layout)
        }
    }
}

/// Mock implementation of [`TypeMetadataOracle`].
///
/// Backed by a `HashMap<TypeKey, MockType>`. Counts `contains` calls so
/// tests can tell whether classification ran.
#[derive(Debug, Default)]
pub struct MockOracle {
    types: HashMap<TypeKey, MockType>,
    rust: HashMap<TypeId, TypeKey>,
    lookups: AtomicUsize,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Describe `key`.
    pub fn insert(&mut self, key: TypeKey, ty: MockType) {
        self.types.insert(key, ty);
    }

    /// Bind the Rust type `T` to `key`, which must already be inserted.
    pub fn bind<T: Managed>(&mut self, key: TypeKey) {
        let binding = RustBinding::of::<T>();
        if let Some(ty) = self.types.get_mut(&key) {
            ty.binding = Some(binding);
            self.rust.insert(binding.type_id(), key);
        }
    }

    /// Number of `contains` calls so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    fn test(&self, ty: TypeKey, f: impl FnOnce(&MockType) -> bool) -> bool {
        self.types.get(&ty).is_some_and(f)
    }
}

impl TypeMetadataOracle for MockOracle {
    fn contains(&self, ty: TypeKey) -> bool {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.types.contains_key(&ty)
    }

    fn type_name(&self, ty: TypeKey) -> Option<String> {
        self.types.get(&ty).map(|t| t.name.clone())
    }

    fn resolve_layout(&self, ty: TypeKey) -> Option<Layout> {
        self.types.get(&ty).and_then(|t| t.layout)
    }

    fn is_abstract(&self, ty: TypeKey) -> bool {
        self.test(ty, |t| t.is_abstract)
    }

    fn is_interface(&self, ty: TypeKey) -> bool {
        self.test(ty, |t| t.is_interface)
    }

    fn is_array(&self, ty: TypeKey) -> bool {
        self.test(ty, |t| t.is_array)
    }

    fn is_pointer_or_byref(&self, ty: TypeKey) -> bool {
        self.test(ty, |t| t.is_pointer_or_byref)
    }

    fn is_open_generic_definition(&self, ty: TypeKey) -> bool {
        self.test(ty, |t| t.is_open_generic_definition)
    }

    fn is_type_parameter(&self, ty: TypeKey) -> bool {
        self.test(ty, |t| t.is_type_parameter)
    }

    fn is_shared_generic_instantiation(&self, ty: TypeKey) -> bool {
        self.test(ty, |t| t.is_shared_generic_instantiation)
    }

    fn is_intrinsic_layout(&self, ty: TypeKey) -> bool {
        self.test(ty, |t| t.is_intrinsic_layout)
    }

    fn is_nullable_wrapper_shape(&self, ty: TypeKey) -> bool {
        self.test(ty, |t| t.is_nullable_wrapper_shape)
    }

    fn is_value_type(&self, ty: TypeKey) -> bool {
        self.test(ty, |t| t.is_value_type)
    }

    fn rust_binding(&self, ty: TypeKey) -> Option<RustBinding> {
        self.types.get(&ty).and_then(|t| t.binding)
    }

    fn lookup_rust(&self, type_id: TypeId) -> Option<TypeKey> {
        self.rust.get(&type_id).copied()
    }
}
