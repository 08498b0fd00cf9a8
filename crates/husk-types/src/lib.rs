//! In-process type registry for the husk allocator.
//!
//! [`TypeRegistry`] is the default [`TypeMetadataOracle`](husk_core::TypeMetadataOracle):
//! it stores type definitions, computes field layouts, interns generic
//! instantiations and derived types, and records which Rust types stand
//! for which registered types.
//!
//! ```
//! use husk_core::{well_known, TypeMetadataOracle};
//! use husk_types::{FieldType, TypeDef, TypeRegistry};
//!
//! let registry = TypeRegistry::new();
//! let point = registry
//!     .define(
//!         TypeDef::class("Point")
//!             .with_field("x", FieldType::Of(well_known::F64))
//!             .with_field("y", FieldType::Of(well_known::F64)),
//!     )
//!     .unwrap();
//! assert_eq!(registry.resolve_layout(point).unwrap().size(), 16);
//! assert_eq!(registry.field(point, "y").unwrap().offset, 8);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod def;
pub mod descriptor;
mod layout;
pub mod registry;

pub use def::{FieldDef, FieldType, TypeDef, TypeDefKind};
pub use descriptor::{FieldInfo, FieldSlot, GenericInfo, TypeDescriptor, TypeFlags, TypeKind};
pub use registry::TypeRegistry;
