//! Type definitions: the input to [`TypeRegistry::define`](crate::TypeRegistry::define).

use husk_core::{StorageKind, TypeKey};

use crate::descriptor::TypeFlags;

/// The declared category of a defined type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeDefKind {
    /// A reference type.
    Class,
    /// A value type.
    Struct,
    /// An interface. Never has storage of its own.
    Interface,
}

/// What a field holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldType {
    /// A field of a registered type.
    Of(TypeKey),
    /// A field typed by the n-th generic parameter of the enclosing definition.
    Param(usize),
    /// A reference back to the enclosing type (linked nodes, trees).
    SelfReference,
}

/// A declared field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDef {
    /// Field name, unique within the type including its bases.
    pub name: String,
    /// What the field holds.
    pub ty: FieldType,
}

/// Definition of a type to register.
///
/// Built with the constructor for its kind and the `with_*` methods:
///
/// ```
/// use husk_types::{FieldType, TypeDef};
/// use husk_core::well_known;
///
/// let def = TypeDef::class("Account")
///     .with_field("balance", FieldType::Of(well_known::I64))
///     .with_field("owner", FieldType::Of(well_known::STRING));
/// assert_eq!(def.fields().len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDef {
    pub(crate) name: String,
    pub(crate) kind: TypeDefKind,
    pub(crate) flags: TypeFlags,
    pub(crate) base: Option<TypeKey>,
    pub(crate) type_params: Vec<String>,
    pub(crate) fields: Vec<FieldDef>,
}

impl TypeDef {
    fn new(name: impl Into<String>, kind: TypeDefKind) -> Self {
        Self {
            name: name.into(),
            kind,
            flags: TypeFlags::empty(),
            base: None,
            type_params: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// A concrete reference type.
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, TypeDefKind::Class)
    }

    /// An abstract reference type.
    pub fn abstract_class(name: impl Into<String>) -> Self {
        Self::new(name, TypeDefKind::Class).with_flags(TypeFlags::ABSTRACT)
    }

    /// A value type.
    pub fn value(name: impl Into<String>) -> Self {
        Self::new(name, TypeDefKind::Struct)
    }

    /// An interface.
    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, TypeDefKind::Interface)
    }

    /// Set the base class. Base fields are laid out first.
    pub fn with_base(mut self, base: TypeKey) -> Self {
        self.base = Some(base);
        self
    }

    /// Append a field.
    pub fn with_field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            ty,
        });
        self
    }

    /// Declare generic parameters, making this a generic definition.
    pub fn with_type_params<S: AsRef<str>>(mut self, params: &[S]) -> Self {
        self.type_params = params.iter().map(|p| p.as_ref().to_string()).collect();
        self
    }

    /// Add shape flags (e.g. [`TypeFlags::INTRINSIC_LAYOUT`]).
    pub fn with_flags(mut self, flags: TypeFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared kind.
    pub fn kind(&self) -> TypeDefKind {
        self.kind
    }

    /// Declared fields, excluding inherited ones.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Whether this definition declares generic parameters.
    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    /// Storage implied by the definition kind and flags.
    pub fn storage(&self) -> StorageKind {
        match self.kind {
            TypeDefKind::Struct if self.flags.contains(TypeFlags::NULLABLE_WRAPPER) => {
                StorageKind::Nullable
            }
            TypeDefKind::Struct => StorageKind::Value,
            TypeDefKind::Class | TypeDefKind::Interface => StorageKind::Reference,
        }
    }
}
