//! Core types and traits for the husk uninitialized-instance allocator.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the abstractions shared by every other husk crate: type keys, the
//! [`TypeMetadataOracle`] capability trait that the allocator queries,
//! the [`Managed`] marker that ties Rust types to registered types, and
//! the error taxonomy.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod binding;
pub mod error;
pub mod id;
pub mod oracle;

pub use binding::{
    AsNullable, ByReference, ByValue, DropGlue, HostObject, Managed, RustBinding, StorageClass,
    StorageKind,
};
pub use error::{FactoryError, IneligibleReason, RegistryError};
pub use id::{well_known, GenericArgs, TypeKey};
pub use oracle::TypeMetadataOracle;
