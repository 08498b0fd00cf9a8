//! Allocation strategy selection.

use std::fmt;

use husk_core::{StorageKind, TypeKey, TypeMetadataOracle};

/// How a factory materializes instances of its type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AllocStrategy {
    /// Fresh zeroed heap object with the type's layout.
    Reference,
    /// Zeroed payload, boxed on the erased path.
    Value,
    /// Optional wrapper; every instance is "absent".
    NullableWrapper,
}

impl AllocStrategy {
    /// Pick the strategy for an accepted type: the nullable shape first,
    /// then value types, else reference.
    pub fn select<O: TypeMetadataOracle + ?Sized>(oracle: &O, ty: TypeKey) -> Self {
        if oracle.is_nullable_wrapper_shape(ty) {
            Self::NullableWrapper
        } else if oracle.is_value_type(ty) {
            Self::Value
        } else {
            Self::Reference
        }
    }

    /// The storage kind this strategy produces.
    pub fn storage(self) -> StorageKind {
        match self {
            Self::Reference => StorageKind::Reference,
            Self::Value => StorageKind::Value,
            Self::NullableWrapper => StorageKind::Nullable,
        }
    }
}

impl fmt::Display for AllocStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference => write!(f, "reference"),
            Self::Value => write!(f, "value"),
            Self::NullableWrapper => write!(f, "nullable-wrapper"),
        }
    }
}
