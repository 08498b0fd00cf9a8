//! Error types for the husk allocator.
//!
//! Organized by subsystem: eligibility reasons (why a type cannot be
//! allocated uninitialized), factory creation, and registry definition.

use std::error::Error;
use std::fmt;

use crate::binding::StorageKind;
use crate::id::TypeKey;

/// Why a type is not eligible for uninitialized allocation.
///
/// Closed set; every rejection maps to exactly one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IneligibleReason {
    /// No type was supplied, or the key is unknown to the oracle.
    NullType,
    /// The type is declared abstract.
    Abstract,
    /// The type is an interface.
    Interface,
    /// Pointer and by-reference types are not heap objects.
    NotAHeapType,
    /// The array base type or an array type: size depends on length.
    VariableLengthLayout,
    /// Strings and stack-only views have runtime-managed layouts.
    IntrinsicLayout,
    /// A generic definition, or an instantiation still containing parameters.
    OpenGeneric,
    /// A generic type parameter.
    TypeParameter,
    /// The canonical placeholder or an instantiation built from it.
    SharedGenericLayout,
}

impl fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NullType => write!(f, "no type supplied"),
            Self::Abstract => write!(f, "type is abstract"),
            Self::Interface => write!(f, "type is an interface"),
            Self::NotAHeapType => write!(f, "pointer and by-ref types are not heap types"),
            Self::VariableLengthLayout => write!(f, "array types have variable-length layout"),
            Self::IntrinsicLayout => write!(f, "type has a runtime-managed layout"),
            Self::OpenGeneric => write!(f, "type is an open generic definition"),
            Self::TypeParameter => write!(f, "type is a generic type parameter"),
            Self::SharedGenericLayout => {
                write!(f, "shared generic instantiations have no known layout")
            }
        }
    }
}

impl Error for IneligibleReason {}

/// Errors from factory creation.
///
/// Allocation through an existing factory never fails; every failure is
/// reported here, when the factory is requested.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FactoryError {
    /// The requested type cannot be allocated uninitialized.
    Ineligible {
        /// The requested key, `None` if no type was supplied.
        ty: Option<TypeKey>,
        /// Why the type was rejected.
        reason: IneligibleReason,
    },
    /// The typed entry point was used for a Rust type with no binding.
    Unbound {
        /// `std::any::type_name` of the requested Rust type.
        type_name: &'static str,
    },
    /// The oracle's storage shape disagrees with the Rust type's declared
    /// storage class.
    StorageMismatch {
        /// The bound key.
        ty: TypeKey,
        /// Storage class declared by the Rust type.
        expected: StorageKind,
        /// Storage shape reported by the oracle.
        found: StorageKind,
    },
}

impl FactoryError {
    /// The eligibility reason, if this is a rejection.
    pub fn reason(&self) -> Option<IneligibleReason> {
        match self {
            Self::Ineligible { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

impl fmt::Display for FactoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ineligible { ty: Some(ty), reason } => {
                write!(f, "type {ty} is not eligible for uninitialized allocation: {reason}")
            }
            Self::Ineligible { ty: None, reason } => {
                write!(f, "cannot create factory: {reason}")
            }
            Self::Unbound { type_name } => {
                write!(f, "rust type {type_name} is not bound to any registered type")
            }
            Self::StorageMismatch {
                ty,
                expected,
                found,
            } => {
                write!(
                    f,
                    "type {ty}: rust binding declares {expected} storage, oracle reports {found}"
                )
            }
        }
    }
}

impl Error for FactoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Ineligible { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// Errors from defining types in a registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// A referenced key is not registered.
    UnknownType {
        /// The unknown key.
        ty: TypeKey,
    },
    /// A type with this name is already registered.
    DuplicateName {
        /// The conflicting name.
        name: String,
    },
    /// Instantiation was requested on a type that is not a generic definition.
    NotGenericDefinition {
        /// The non-generic key.
        ty: TypeKey,
    },
    /// Wrong number of type arguments.
    ArityMismatch {
        /// The generic definition.
        definition: TypeKey,
        /// Declared parameter count.
        expected: usize,
        /// Supplied argument count.
        found: usize,
    },
    /// A field refers to a generic parameter index the type does not declare.
    ParameterOutOfRange {
        /// Name of the offending field.
        field: String,
        /// The out-of-range index.
        index: usize,
    },
    /// A type argument the generic definition cannot accept, such as a
    /// reference type or another nullable wrapper given to `Nullable<T>`.
    InvalidTypeArgument {
        /// The generic definition.
        definition: TypeKey,
        /// The rejected argument.
        argument: TypeKey,
    },
    /// The base type is not a class.
    InvalidBase {
        /// The rejected base key.
        base: TypeKey,
    },
    /// A Rust-bound definition declared fields; its layout comes from Rust.
    BoundTypeWithFields {
        /// Name of the definition.
        name: String,
    },
    /// A Rust type's storage class disagrees with the definition kind.
    StorageMismatch {
        /// Name of the definition.
        name: String,
        /// Storage class declared by the Rust type.
        rust: StorageKind,
        /// Storage implied by the definition kind.
        definition: StorageKind,
    },
    /// The computed layout overflows `isize`.
    LayoutOverflow {
        /// Name of the definition.
        name: String,
    },
    /// The Rust type is already bound to another key.
    AlreadyBound {
        /// `std::any::type_name` of the Rust type.
        type_name: &'static str,
        /// The existing key.
        existing: TypeKey,
    },
    /// The Rust type has no binding.
    NotBound {
        /// `std::any::type_name` of the Rust type.
        type_name: &'static str,
    },
    /// Two fields of one type (including inherited fields) share a name.
    DuplicateField {
        /// The repeated name.
        field: String,
    },
    /// A field's type has no fixed size and cannot be stored inline.
    UnsizedField {
        /// Name of the offending field.
        field: String,
        /// The field's type.
        ty: TypeKey,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownType { ty } => write!(f, "unknown type {ty}"),
            Self::DuplicateName { name } => write!(f, "type '{name}' is already registered"),
            Self::NotGenericDefinition { ty } => {
                write!(f, "type {ty} is not a generic definition")
            }
            Self::ArityMismatch {
                definition,
                expected,
                found,
            } => {
                write!(
                    f,
                    "generic definition {definition} takes {expected} type arguments, got {found}"
                )
            }
            Self::ParameterOutOfRange { field, index } => {
                write!(f, "field '{field}' refers to undeclared type parameter {index}")
            }
            Self::InvalidTypeArgument {
                definition,
                argument,
            } => {
                write!(f, "type {argument} is not a valid argument for {definition}")
            }
            Self::InvalidBase { base } => write!(f, "base type {base} is not a class"),
            Self::BoundTypeWithFields { name } => {
                write!(f, "rust-bound type '{name}' cannot declare fields")
            }
            Self::StorageMismatch {
                name,
                rust,
                definition,
            } => {
                write!(
                    f,
                    "type '{name}': rust type declares {rust} storage, definition implies {definition}"
                )
            }
            Self::LayoutOverflow { name } => write!(f, "layout of type '{name}' overflows"),
            Self::AlreadyBound {
                type_name,
                existing,
            } => {
                write!(f, "rust type {type_name} is already bound to {existing}")
            }
            Self::NotBound { type_name } => write!(f, "rust type {type_name} is not bound"),
            Self::DuplicateField { field } => write!(f, "field '{field}' is declared twice"),
            Self::UnsizedField { field, ty } => {
                write!(f, "field '{field}' has unsized type {ty}")
            }
        }
    }
}

impl Error for RegistryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ineligible_display_includes_key_and_reason() {
        let err = FactoryError::Ineligible {
            ty: Some(TypeKey(9)),
            reason: IneligibleReason::Abstract,
        };
        assert_eq!(
            err.to_string(),
            "type #9 is not eligible for uninitialized allocation: type is abstract"
        );
        assert_eq!(err.reason(), Some(IneligibleReason::Abstract));
    }

    #[test]
    fn null_type_display_has_no_key() {
        let err = FactoryError::Ineligible {
            ty: None,
            reason: IneligibleReason::NullType,
        };
        assert_eq!(err.to_string(), "cannot create factory: no type supplied");
    }

    #[test]
    fn ineligible_source_is_reason() {
        let err = FactoryError::Ineligible {
            ty: Some(TypeKey(1)),
            reason: IneligibleReason::IntrinsicLayout,
        };
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("type has a runtime-managed layout"));
    }

    #[test]
    fn unbound_has_no_reason() {
        let err = FactoryError::Unbound { type_name: "Foo" };
        assert_eq!(err.reason(), None);
        assert!(err.source().is_none());
    }

    #[test]
    fn registry_error_display() {
        let err = RegistryError::ArityMismatch {
            definition: TypeKey(17),
            expected: 1,
            found: 2,
        };
        assert_eq!(
            err.to_string(),
            "generic definition #17 takes 1 type arguments, got 2"
        );
    }
}
