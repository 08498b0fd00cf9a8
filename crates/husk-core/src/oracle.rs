//! The type-metadata capability the allocator consumes.

use std::alloc::Layout;
use std::any::TypeId;

use crate::binding::RustBinding;
use crate::id::TypeKey;

/// Read-only view of a host type system.
///
/// Every query is pure: the answer for a given key never changes once the
/// key exists. Queries for keys the oracle does not know return `false`
/// or `None`; [`contains`](TypeMetadataOracle::contains) distinguishes
/// "unknown" from "known but not matching".
///
/// The allocator never inspects descriptors directly. Implementations may
/// be backed by a registry, by generated tables, or by a foreign runtime.
pub trait TypeMetadataOracle: Send + Sync {
    /// Whether `ty` names a type this oracle knows about.
    fn contains(&self, ty: TypeKey) -> bool;

    /// Human-readable name, for diagnostics.
    fn type_name(&self, ty: TypeKey) -> Option<String>;

    /// Storage layout of one instance's fields.
    ///
    /// `None` when the type has no fixed layout (open generics, type
    /// parameters, variable-length types).
    fn resolve_layout(&self, ty: TypeKey) -> Option<Layout>;

    /// Declared abstract; no instance of exactly this type can exist.
    fn is_abstract(&self, ty: TypeKey) -> bool;

    /// An interface: no concrete storage.
    fn is_interface(&self, ty: TypeKey) -> bool;

    /// The array base type or any array type.
    fn is_array(&self, ty: TypeKey) -> bool;

    /// A pointer or by-reference type.
    fn is_pointer_or_byref(&self, ty: TypeKey) -> bool;

    /// A generic definition, or an instantiation that still mentions
    /// generic parameters.
    fn is_open_generic_definition(&self, ty: TypeKey) -> bool;

    /// A generic type parameter.
    fn is_type_parameter(&self, ty: TypeKey) -> bool;

    /// The canonical placeholder, or an instantiation built from it at
    /// any depth.
    fn is_shared_generic_instantiation(&self, ty: TypeKey) -> bool;

    /// Storage managed by the runtime itself (strings, stack-only views).
    fn is_intrinsic_layout(&self, ty: TypeKey) -> bool;

    /// A value type whose default state means "no value".
    fn is_nullable_wrapper_shape(&self, ty: TypeKey) -> bool;

    /// A value type (stored inline, boxed when type-erased).
    fn is_value_type(&self, ty: TypeKey) -> bool;

    /// The Rust type bound to `ty`, if any.
    fn rust_binding(&self, ty: TypeKey) -> Option<RustBinding>;

    /// The key bound to a Rust type, if any.
    fn lookup_rust(&self, type_id: TypeId) -> Option<TypeKey>;
}
