//! Registered type metadata.
//!
//! A [`TypeDescriptor`] is created once by the registry and never mutated
//! afterwards; the registry hands out `Arc<TypeDescriptor>` so readers can
//! hold on to it without holding any lock.

use std::alloc::Layout;

use bitflags::bitflags;
use husk_core::{GenericArgs, TypeKey};
use indexmap::IndexMap;

use crate::def::FieldDef;

bitflags! {
    /// Shape attributes that do not follow from [`TypeKind`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u16 {
        /// Declared abstract.
        const ABSTRACT = 1 << 0;
        /// The base type of all arrays.
        const ARRAY_BASE = 1 << 1;
        /// Layout managed by the runtime (strings, stack-only views).
        const INTRINSIC_LAYOUT = 1 << 2;
        /// The canonical placeholder for shared generic code.
        const CANONICAL = 1 << 3;
        /// Optional wrapper whose default is "absent".
        const NULLABLE_WRAPPER = 1 << 4;
        /// Instantiated over the canonical placeholder, at any depth.
        const SHARED_INSTANTIATION = 1 << 5;
        /// Instantiated over a generic parameter, at any depth.
        const CONTAINS_GENERIC_PARAMETERS = 1 << 6;
    }
}

/// Structural category of a registered type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A reference type.
    Class,
    /// A value type.
    Struct,
    /// An interface.
    Interface,
    /// An array of `element` with `rank` dimensions.
    Array {
        /// Element type.
        element: TypeKey,
        /// Number of dimensions, at least 1.
        rank: u8,
    },
    /// An unmanaged pointer.
    Pointer {
        /// Pointed-to type.
        pointee: TypeKey,
    },
    /// A managed by-reference.
    ByRef {
        /// Referenced type.
        referent: TypeKey,
    },
    /// A generic parameter of `owner`.
    TypeParameter {
        /// The generic definition declaring this parameter.
        owner: TypeKey,
        /// Zero-based position in the owner's parameter list.
        position: u16,
    },
}

/// Generic status of a registered type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenericInfo {
    /// Not generic.
    NonGeneric,
    /// An open generic definition.
    Definition {
        /// Keys of the declared parameters, in order.
        parameters: GenericArgs,
    },
    /// A definition bound to arguments.
    Instantiation {
        /// The generic definition.
        definition: TypeKey,
        /// The bound arguments, in order.
        arguments: GenericArgs,
    },
}

/// How a field is stored within its owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldSlot {
    /// A pointer-sized slot; zeroed means null.
    Reference,
    /// The field's value type stored inline.
    Inline,
}

/// A laid-out field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldInfo {
    /// Field name.
    pub name: String,
    /// The field's type.
    pub ty: TypeKey,
    /// Byte offset from the start of the owner's storage.
    pub offset: usize,
    /// Size and alignment of the slot.
    pub layout: Layout,
    /// Reference slot or inline value.
    pub slot: FieldSlot,
}

impl FieldInfo {
    /// Byte range of this field within its owner's storage.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.layout.size()
    }
}

/// Everything the registry knows about one type.
#[derive(Clone, Debug)]
pub struct TypeDescriptor {
    pub(crate) key: TypeKey,
    pub(crate) name: String,
    pub(crate) kind: TypeKind,
    pub(crate) flags: TypeFlags,
    pub(crate) layout: Option<Layout>,
    pub(crate) base: Option<TypeKey>,
    pub(crate) generic: GenericInfo,
    pub(crate) fields: IndexMap<String, FieldInfo>,
    /// Unsubstituted field declarations of a generic definition.
    pub(crate) templates: Vec<FieldDef>,
}

impl TypeDescriptor {
    /// The type's key.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Display name, including generic arguments (`List<i32>`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Structural category.
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Shape flags.
    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    /// Instance storage layout, `None` when the type has no fixed layout.
    pub fn layout(&self) -> Option<Layout> {
        self.layout
    }

    /// Base class, if any.
    pub fn base(&self) -> Option<TypeKey> {
        self.base
    }

    /// Generic status.
    pub fn generic(&self) -> &GenericInfo {
        &self.generic
    }

    /// Laid-out fields including inherited ones, base fields first.
    pub fn fields(&self) -> impl Iterator<Item = &FieldInfo> {
        self.fields.values()
    }

    /// Look up a laid-out field by name.
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.get(name)
    }

    /// Stored inline and boxed when erased.
    pub fn is_value_type(&self) -> bool {
        self.kind == TypeKind::Struct
    }

    /// An open generic definition, or an instantiation over parameters.
    pub fn is_open(&self) -> bool {
        matches!(self.generic, GenericInfo::Definition { .. })
            || self.flags.contains(TypeFlags::CONTAINS_GENERIC_PARAMETERS)
    }

    /// The canonical placeholder or anything instantiated over it.
    pub fn is_shared(&self) -> bool {
        self.flags
            .intersects(TypeFlags::CANONICAL | TypeFlags::SHARED_INSTANTIATION)
    }

    /// A type parameter, or anything that mentions one.
    pub(crate) fn mentions_parameters(&self) -> bool {
        matches!(self.kind, TypeKind::TypeParameter { .. }) || self.is_open()
    }
}
