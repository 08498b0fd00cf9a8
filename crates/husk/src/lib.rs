//! Husk: allocate instances of registered types without running their
//! constructors.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all husk sub-crates. Serializers, deep-cloners and remoting layers use
//! it to materialize objects whose constructors have side effects, need
//! arguments, or must not run, and then fill in the fields themselves.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use husk::prelude::*;
//!
//! let registry = Arc::new(TypeRegistry::new());
//! let account = registry
//!     .define(
//!         TypeDef::class("Account")
//!             .with_field("balance", FieldType::Of(well_known::I64))
//!             .with_field("owner", FieldType::Of(well_known::STRING)),
//!     )
//!     .unwrap();
//!
//! let factories = UninitializedFactories::new(Arc::clone(&registry));
//! let factory = factories.create_factory(Some(account)).unwrap();
//! let instance = factory.create_instance();
//! assert_eq!(instance.runtime_type(), Some(account));
//! assert!(instance.as_raw().unwrap().is_zeroed());
//!
//! // Nullable wrappers come out absent, value types as zero.
//! let maybe = factories.create_typed_factory::<Option<i32>>().unwrap();
//! assert_eq!(maybe.create_instance(), None);
//! assert_eq!(factories.create_typed_factory::<u64>().unwrap().create_instance(), 0);
//!
//! // Types without a fixed field layout are rejected up front.
//! let err = factories.create_factory(Some(well_known::STRING)).unwrap_err();
//! assert_eq!(err.reason(), Some(IneligibleReason::IntrinsicLayout));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`base`] | `husk-core` | Type keys, the oracle trait, `Managed`, errors |
//! | [`types`] | `husk-types` | `TypeRegistry`, the default oracle |
//! | [`eligibility`] | `husk-eligibility` | `classify` and `EligibilityVerdict` |
//! | [`factory`] | `husk-factory` | Factories, instances, allocators, cache |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Type keys, the oracle trait, Rust bindings and errors (`husk-core`).
pub use husk_core as base;

/// The default in-process oracle (`husk-types`).
///
/// [`types::TypeRegistry`] defines classes, structs, interfaces, generics,
/// arrays, pointers and by-refs, and binds Rust types to them.
pub use husk_types as types;

/// Eligibility classification (`husk-eligibility`).
pub use husk_eligibility as eligibility;

/// Factories and instances (`husk-factory`).
///
/// [`factory::UninitializedFactories`] is the entry point.
pub use husk_factory as factory;

/// Common imports for typical husk usage.
///
/// ```rust
/// use husk::prelude::*;
/// ```
pub mod prelude {
    // Core
    pub use husk_core::{
        well_known, FactoryError, IneligibleReason, Managed, RegistryError, TypeKey,
        TypeMetadataOracle,
    };
    pub use husk_core::{AsNullable, ByReference, ByValue};

    // Registry
    pub use husk_types::{FieldType, TypeDef, TypeRegistry};

    // Classification
    pub use husk_eligibility::{classify, EligibilityVerdict};

    // Factories
    pub use husk_factory::{
        AllocStrategy, FactoryConfig, Handle, Instance, InstanceFactory, TypedFactory,
        UninitializedFactories,
    };
}
