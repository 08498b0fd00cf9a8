//! The type registry: the default [`TypeMetadataOracle`].
//!
//! Holds every registered [`TypeDescriptor`] keyed by [`TypeKey`], interns
//! generic instantiations and derived types (arrays, pointers, by-refs) so
//! that asking for the same type twice yields the same key, and records
//! which Rust types are bound to which keys.

use std::alloc::Layout;
use std::any::{type_name, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use husk_core::{
    well_known, ByValue, GenericArgs, HostObject, Managed, RegistryError, RustBinding,
    StorageKind, TypeKey, TypeMetadataOracle,
};
use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::def::{FieldDef, FieldType, TypeDef, TypeDefKind};
use crate::descriptor::{
    FieldInfo, FieldSlot, GenericInfo, TypeDescriptor, TypeFlags, TypeKind,
};
use crate::layout::{reference_slot, slot_for, FieldLayout};

/// Interning key for types derived from another type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Derived {
    Array { element: TypeKey, rank: u8 },
    Pointer(TypeKey),
    ByRef(TypeKey),
}

/// Thread-safe registry of type metadata.
///
/// Uses `DashMap` throughout so definitions can be added while other
/// threads query the registry or allocate through factories built on it.
/// Descriptors are immutable once published; Rust bindings live in a
/// separate table so a key can be bound after it was first handed out.
///
/// A new registry already contains the [`well_known`] types at their fixed
/// keys, with every primitive bound to its Rust type and `Option<prim>`
/// bound to `Nullable<prim>`.
pub struct TypeRegistry {
    types: DashMap<TypeKey, Arc<TypeDescriptor>>,
    names: DashMap<String, TypeKey>,
    rust: DashMap<TypeId, TypeKey>,
    bindings: DashMap<TypeKey, RustBinding>,
    instantiations: DashMap<(TypeKey, GenericArgs), TypeKey>,
    derived: DashMap<Derived, TypeKey>,
    next_key: AtomicU32,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.types.len())
            .field("bound", &self.rust.len())
            .finish()
    }
}

impl TypeRegistry {
    /// Create a registry containing the well-known types.
    pub fn new() -> Self {
        let registry = Self {
            types: DashMap::new(),
            names: DashMap::new(),
            rust: DashMap::new(),
            bindings: DashMap::new(),
            instantiations: DashMap::new(),
            derived: DashMap::new(),
            next_key: AtomicU32::new(0),
        };
        registry.bootstrap();
        registry
    }

    fn bootstrap(&self) {
        const VALID: &str = "well-known definitions are valid";

        let object = self
            .register::<HostObject>(TypeDef::class("object"))
            .expect(VALID);
        let string = self
            .define(TypeDef::class("string").with_flags(TypeFlags::INTRINSIC_LAYOUT))
            .expect(VALID);
        let array = self
            .define(TypeDef::class("Array").with_flags(TypeFlags::ARRAY_BASE))
            .expect(VALID);
        let canon = self
            .define(TypeDef::class("__Canon").with_flags(TypeFlags::CANONICAL))
            .expect(VALID);
        debug_assert_eq!(
            [object, string, array, canon],
            [
                well_known::OBJECT,
                well_known::STRING,
                well_known::ARRAY,
                well_known::CANON
            ]
        );

        macro_rules! primitives {
            ($($t:ty => $key:expr),* $(,)?) => {
                $(
                    let key = self
                        .register::<$t>(TypeDef::value(stringify!($t)))
                        .expect(VALID);
                    debug_assert_eq!(key, $key);
                )*
            };
        }
        primitives!(
            bool => well_known::BOOL,
            u8 => well_known::U8,
            i8 => well_known::I8,
            u16 => well_known::U16,
            i16 => well_known::I16,
            u32 => well_known::U32,
            i32 => well_known::I32,
            u64 => well_known::U64,
            i64 => well_known::I64,
            usize => well_known::USIZE,
            isize => well_known::ISIZE,
            f32 => well_known::F32,
            f64 => well_known::F64,
        );

        let nullable = self
            .define(
                TypeDef::value("Nullable")
                    .with_type_params(&["T"])
                    .with_flags(TypeFlags::NULLABLE_WRAPPER)
                    .with_field("has_value", FieldType::Of(well_known::BOOL))
                    .with_field("value", FieldType::Param(0)),
            )
            .expect(VALID);
        let span = self
            .define(
                TypeDef::value("ReadOnlySpan")
                    .with_type_params(&["T"])
                    .with_flags(TypeFlags::INTRINSIC_LAYOUT)
                    .with_field("pointer", FieldType::Of(well_known::USIZE))
                    .with_field("length", FieldType::Of(well_known::USIZE)),
            )
            .expect(VALID);
        debug_assert_eq!(
            [nullable, span],
            [well_known::NULLABLE, well_known::READ_ONLY_SPAN]
        );
        debug_assert_eq!(self.next_key.load(Ordering::SeqCst), well_known::COUNT);

        macro_rules! nullables {
            ($($t:ty),* $(,)?) => {
                $( self.bind_nullable::<$t>().expect(VALID); )*
            };
        }
        nullables!(bool, u8, i8, u16, i16, u32, i32, u64, i64, usize, isize, f32, f64);
    }

    fn allocate(&self) -> TypeKey {
        TypeKey(self.next_key.fetch_add(1, Ordering::SeqCst))
    }

    fn publish(&self, desc: TypeDescriptor) -> TypeKey {
        let key = desc.key;
        trace!(key = %key, name = %desc.name, kind = ?desc.kind, "TypeRegistry::publish");
        self.types.insert(key, Arc::new(desc));
        key
    }

    fn require(&self, ty: TypeKey) -> Result<Arc<TypeDescriptor>, RegistryError> {
        self.get(ty).ok_or(RegistryError::UnknownType { ty })
    }

    /// Register a type defined purely in terms of other registered types.
    pub fn define(&self, def: TypeDef) -> Result<TypeKey, RegistryError> {
        self.define_with(def, None)
    }

    /// Register a type backed by the Rust type `T`.
    ///
    /// The layout is `Layout::new::<T>()`, so the definition may not
    /// declare fields or generic parameters, and its kind must agree with
    /// `T`'s storage class.
    pub fn register<T: Managed>(&self, def: TypeDef) -> Result<TypeKey, RegistryError> {
        let binding = RustBinding::of::<T>();
        // Held until the definition is published, so concurrent registrations
        // of one Rust type cannot both succeed.
        let slot = match self.rust.entry(binding.type_id()) {
            Entry::Occupied(existing) => {
                return Err(RegistryError::AlreadyBound {
                    type_name: type_name::<T>(),
                    existing: *existing.get(),
                })
            }
            Entry::Vacant(slot) => slot,
        };
        let key = self.define_with(def, Some(binding))?;
        slot.insert(key);
        debug!(key = %key, rust = binding.type_name(), "bound rust type");
        Ok(key)
    }

    fn define_with(
        &self,
        def: TypeDef,
        binding: Option<RustBinding>,
    ) -> Result<TypeKey, RegistryError> {
        if let Some(binding) = binding {
            if !def.fields.is_empty() || def.is_generic() {
                return Err(RegistryError::BoundTypeWithFields { name: def.name });
            }
            let definition = def.storage();
            if binding.storage() != definition {
                return Err(RegistryError::StorageMismatch {
                    name: def.name,
                    rust: binding.storage(),
                    definition,
                });
            }
        }
        let base = match def.base {
            Some(base) => Some(self.checked_base(&def, base)?),
            None => None,
        };

        let slot = match self.names.entry(def.name.clone()) {
            Entry::Occupied(_) => return Err(RegistryError::DuplicateName { name: def.name }),
            Entry::Vacant(slot) => slot,
        };

        let kind = match def.kind {
            TypeDefKind::Class => TypeKind::Class,
            TypeDefKind::Struct => TypeKind::Struct,
            TypeDefKind::Interface => TypeKind::Interface,
        };

        if def.is_generic() {
            self.check_templates(&def)?;
            let key = self.allocate();
            let parameters: GenericArgs = def
                .type_params
                .iter()
                .enumerate()
                .map(|(position, name)| {
                    let param = self.allocate();
                    self.publish(TypeDescriptor {
                        key: param,
                        name: name.clone(),
                        kind: TypeKind::TypeParameter {
                            owner: key,
                            position: position as u16,
                        },
                        flags: TypeFlags::empty(),
                        layout: None,
                        base: None,
                        generic: GenericInfo::NonGeneric,
                        fields: IndexMap::new(),
                        templates: Vec::new(),
                    })
                })
                .collect();
            let name = format!("{}<{}>", def.name, def.type_params.join(", "));
            slot.insert(key);
            // Parameters take the keys after their owner; publish the owner
            // under the key reserved first.
            return Ok(self.publish(TypeDescriptor {
                key,
                name,
                kind,
                flags: def.flags,
                layout: None,
                base: base.map(|b| b.key),
                generic: GenericInfo::Definition { parameters },
                fields: IndexMap::new(),
                templates: def.fields,
            }));
        }

        let key = self.allocate();
        let (layout, fields) = if let Some(binding) = binding {
            (Some(binding.layout()), IndexMap::new())
        } else if kind == TypeKind::Interface || has_no_fixed_layout(kind, def.flags) {
            (None, IndexMap::new())
        } else {
            let mut layout = match &base {
                Some(base) => FieldLayout::inherit(&def.name, &**base),
                None => FieldLayout::new(&def.name),
            };
            for field in &def.fields {
                let (ty, slot, field_layout) = match field.ty {
                    FieldType::Of(ty) => {
                        let desc = self.require(ty)?;
                        let (slot, field_layout) = slot_for(&field.name, &desc)?;
                        (ty, slot, field_layout)
                    }
                    FieldType::SelfReference => (key, FieldSlot::Reference, reference_slot()),
                    FieldType::Param(index) => {
                        return Err(RegistryError::ParameterOutOfRange {
                            field: field.name.clone(),
                            index,
                        })
                    }
                };
                layout.push(&field.name, ty, slot, field_layout)?;
            }
            let (layout, fields) = layout.finish();
            (Some(layout), fields)
        };

        if let Some(binding) = binding {
            self.bindings.insert(key, binding);
        }
        slot.insert(key);
        Ok(self.publish(TypeDescriptor {
            key,
            name: def.name,
            kind,
            flags: def.flags,
            layout,
            base: base.map(|b| b.key),
            generic: GenericInfo::NonGeneric,
            fields,
            templates: Vec::new(),
        }))
    }

    fn checked_base(
        &self,
        def: &TypeDef,
        base: TypeKey,
    ) -> Result<Arc<TypeDescriptor>, RegistryError> {
        let desc = self.require(base)?;
        let special = TypeFlags::INTRINSIC_LAYOUT | TypeFlags::ARRAY_BASE | TypeFlags::CANONICAL;
        if def.kind != TypeDefKind::Class
            || desc.kind != TypeKind::Class
            || desc.flags.intersects(special)
            || desc.is_open()
        {
            return Err(RegistryError::InvalidBase { base });
        }
        Ok(desc)
    }

    fn check_templates(&self, def: &TypeDef) -> Result<(), RegistryError> {
        for field in &def.fields {
            match field.ty {
                FieldType::Of(ty) => {
                    self.require(ty)?;
                }
                FieldType::Param(index) if index >= def.type_params.len() => {
                    return Err(RegistryError::ParameterOutOfRange {
                        field: field.name.clone(),
                        index,
                    });
                }
                FieldType::Param(_) | FieldType::SelfReference => {}
            }
        }
        Ok(())
    }

    /// Bind a generic definition to concrete arguments.
    ///
    /// Interned: the same definition and arguments always yield the same
    /// key. Instantiations over the canonical placeholder are flagged
    /// shared; instantiations over type parameters are flagged open and
    /// get no layout.
    pub fn instantiate(
        &self,
        definition: TypeKey,
        args: &[TypeKey],
    ) -> Result<TypeKey, RegistryError> {
        let def = self.require(definition)?;
        let GenericInfo::Definition { parameters } = &def.generic else {
            return Err(RegistryError::NotGenericDefinition { ty: definition });
        };
        if parameters.len() != args.len() {
            return Err(RegistryError::ArityMismatch {
                definition,
                expected: parameters.len(),
                found: args.len(),
            });
        }
        let arg_descs = args
            .iter()
            .map(|&arg| self.require(arg))
            .collect::<Result<Vec<_>, _>>()?;
        if def.flags.contains(TypeFlags::NULLABLE_WRAPPER) {
            // Only non-nullable value types can be wrapped.
            let invalid = arg_descs.iter().find(|a| {
                !a.mentions_parameters()
                    && (!a.is_value_type() || storage_of(a) == StorageKind::Nullable)
            });
            if let Some(arg) = invalid {
                return Err(RegistryError::InvalidTypeArgument {
                    definition,
                    argument: arg.key,
                });
            }
        }

        let slot = match self
            .instantiations
            .entry((definition, GenericArgs::from_slice(args)))
        {
            Entry::Occupied(existing) => return Ok(*existing.get()),
            Entry::Vacant(slot) => slot,
        };

        let mut flags = def.flags;
        if arg_descs.iter().any(|a| a.is_shared()) {
            flags |= TypeFlags::SHARED_INSTANTIATION;
        }
        let open = arg_descs.iter().any(|a| a.mentions_parameters());
        if open {
            flags |= TypeFlags::CONTAINS_GENERIC_PARAMETERS;
        }

        let bare = def.name.split('<').next().unwrap_or(&def.name);
        let arg_names: Vec<&str> = arg_descs.iter().map(|a| a.name()).collect();
        let name = format!("{bare}<{}>", arg_names.join(", "));

        let key = self.allocate();
        let (layout, fields) = if open {
            (None, IndexMap::new())
        } else {
            let (layout, fields) = self.lay_out_instantiation(key, &def, &name, &arg_descs)?;
            (Some(layout), fields)
        };

        slot.insert(key);
        self.names.entry(name.clone()).or_insert(key);
        Ok(self.publish(TypeDescriptor {
            key,
            name,
            kind: def.kind,
            flags,
            layout,
            base: def.base,
            generic: GenericInfo::Instantiation {
                definition,
                arguments: GenericArgs::from_slice(args),
            },
            fields,
            templates: Vec::new(),
        }))
    }

    fn lay_out_instantiation(
        &self,
        key: TypeKey,
        def: &TypeDescriptor,
        name: &str,
        args: &[Arc<TypeDescriptor>],
    ) -> Result<(Layout, IndexMap<String, FieldInfo>), RegistryError> {
        let mut layout = match def.base {
            Some(base) => FieldLayout::inherit(name, &*self.require(base)?),
            None => FieldLayout::new(name),
        };
        for FieldDef { name: field, ty } in &def.templates {
            let (ty, slot, field_layout) = match *ty {
                FieldType::Param(index) => {
                    let arg = &args[index];
                    let (slot, field_layout) = slot_for(field, arg)?;
                    (arg.key, slot, field_layout)
                }
                FieldType::Of(ty) => {
                    let (slot, field_layout) = slot_for(field, &*self.require(ty)?)?;
                    (ty, slot, field_layout)
                }
                FieldType::SelfReference => (key, FieldSlot::Reference, reference_slot()),
            };
            layout.push(field, ty, slot, field_layout)?;
        }
        Ok(layout.finish())
    }

    fn derive(
        &self,
        derived: Derived,
        build: impl FnOnce(&TypeDescriptor) -> (String, TypeKind, Option<Layout>, Option<TypeKey>),
    ) -> Result<TypeKey, RegistryError> {
        let source = match derived {
            Derived::Array { element, .. } => element,
            Derived::Pointer(ty) | Derived::ByRef(ty) => ty,
        };
        let source = self.require(source)?;
        let slot = match self.derived.entry(derived) {
            Entry::Occupied(existing) => return Ok(*existing.get()),
            Entry::Vacant(slot) => slot,
        };
        let (name, kind, layout, base) = build(&source);
        let mut flags = source.flags
            & (TypeFlags::SHARED_INSTANTIATION | TypeFlags::CONTAINS_GENERIC_PARAMETERS);
        if source.flags.contains(TypeFlags::CANONICAL) {
            flags |= TypeFlags::SHARED_INSTANTIATION;
        }
        if source.mentions_parameters() {
            flags |= TypeFlags::CONTAINS_GENERIC_PARAMETERS;
        }
        let key = self.allocate();
        slot.insert(key);
        self.names.entry(name.clone()).or_insert(key);
        Ok(self.publish(TypeDescriptor {
            key,
            name,
            kind,
            flags,
            layout,
            base,
            generic: GenericInfo::NonGeneric,
            fields: IndexMap::new(),
            templates: Vec::new(),
        }))
    }

    /// The array type of `element` with `rank` dimensions (at least 1).
    pub fn array_of(&self, element: TypeKey, rank: u8) -> Result<TypeKey, RegistryError> {
        let rank = rank.max(1);
        self.derive(Derived::Array { element, rank }, |source| {
            let commas = ",".repeat(usize::from(rank) - 1);
            (
                format!("{}[{commas}]", source.name()),
                TypeKind::Array { element, rank },
                None,
                Some(well_known::ARRAY),
            )
        })
    }

    /// The unmanaged pointer type to `ty`.
    pub fn pointer_to(&self, ty: TypeKey) -> Result<TypeKey, RegistryError> {
        self.derive(Derived::Pointer(ty), |source| {
            (
                format!("{}*", source.name()),
                TypeKind::Pointer { pointee: ty },
                Some(reference_slot()),
                None,
            )
        })
    }

    /// The by-reference type to `ty`.
    pub fn by_ref(&self, ty: TypeKey) -> Result<TypeKey, RegistryError> {
        self.derive(Derived::ByRef(ty), |source| {
            (
                format!("{}&", source.name()),
                TypeKind::ByRef { referent: ty },
                Some(reference_slot()),
                None,
            )
        })
    }

    /// Instantiate `Nullable<U>` and bind it to `Option<U>`.
    ///
    /// Idempotent.
    pub fn bind_nullable<U: Managed<Storage = ByValue>>(&self) -> Result<TypeKey, RegistryError> {
        let inner = self
            .lookup_rust(TypeId::of::<U>())
            .ok_or(RegistryError::NotBound {
                type_name: type_name::<U>(),
            })?;
        let key = self.instantiate(well_known::NULLABLE, &[inner])?;
        self.bind(key, RustBinding::of::<Option<U>>())
    }

    fn bind(&self, key: TypeKey, binding: RustBinding) -> Result<TypeKey, RegistryError> {
        let desc = self.require(key)?;
        let storage = storage_of(&desc);
        if binding.storage() != storage {
            return Err(RegistryError::StorageMismatch {
                name: desc.name.clone(),
                rust: binding.storage(),
                definition: storage,
            });
        }
        match self.rust.entry(binding.type_id()) {
            Entry::Occupied(existing) if *existing.get() == key => Ok(key),
            Entry::Occupied(existing) => Err(RegistryError::AlreadyBound {
                type_name: binding.type_name(),
                existing: *existing.get(),
            }),
            Entry::Vacant(slot) => {
                self.bindings.insert(key, binding);
                slot.insert(key);
                debug!(key = %key, rust = binding.type_name(), "bound rust type");
                Ok(key)
            }
        }
    }

    /// Descriptor for `ty`.
    pub fn get(&self, ty: TypeKey) -> Option<Arc<TypeDescriptor>> {
        self.types.get(&ty).map(|r| Arc::clone(r.value()))
    }

    /// Key registered under `name`.
    ///
    /// Generic definitions are found by their bare name (`"Nullable"`),
    /// instantiations and derived types by their display name
    /// (`"Nullable<i32>"`, `"i32[]"`).
    pub fn lookup(&self, name: &str) -> Option<TypeKey> {
        self.names.get(name).map(|r| *r.value())
    }

    /// Key bound to the Rust type `T`.
    pub fn key_of<T: 'static>(&self) -> Option<TypeKey> {
        self.lookup_rust(TypeId::of::<T>())
    }

    /// Laid-out field `name` of `ty`.
    pub fn field(&self, ty: TypeKey, name: &str) -> Option<FieldInfo> {
        self.get(ty).and_then(|d| d.field(name).cloned())
    }

    /// Parameter keys of a generic definition.
    pub fn type_parameters(&self, ty: TypeKey) -> Option<GenericArgs> {
        match self.get(ty)?.generic() {
            GenericInfo::Definition { parameters } => Some(parameters.clone()),
            _ => None,
        }
    }

    /// Number of registered types, including parameters and derived types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no types are registered. Never true for a registry built with
    /// [`TypeRegistry::new`].
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn with<R>(&self, ty: TypeKey, f: impl FnOnce(&TypeDescriptor) -> R) -> Option<R> {
        self.types.get(&ty).map(|r| f(r.value()))
    }

    fn test(&self, ty: TypeKey, f: impl FnOnce(&TypeDescriptor) -> bool) -> bool {
        self.with(ty, f).unwrap_or(false)
    }
}

/// Classes whose instance size is decided by the runtime, not by fields.
fn has_no_fixed_layout(kind: TypeKind, flags: TypeFlags) -> bool {
    kind == TypeKind::Class
        && flags.intersects(TypeFlags::INTRINSIC_LAYOUT | TypeFlags::ARRAY_BASE)
}

fn storage_of(desc: &TypeDescriptor) -> StorageKind {
    match desc.kind {
        TypeKind::Struct if desc.flags.contains(TypeFlags::NULLABLE_WRAPPER) => {
            StorageKind::Nullable
        }
        TypeKind::Struct => StorageKind::Value,
        _ => StorageKind::Reference,
    }
}

impl TypeMetadataOracle for TypeRegistry {
    fn contains(&self, ty: TypeKey) -> bool {
        self.types.contains_key(&ty)
    }

    fn type_name(&self, ty: TypeKey) -> Option<String> {
        self.with(ty, |d| d.name.clone())
    }

    fn resolve_layout(&self, ty: TypeKey) -> Option<Layout> {
        self.with(ty, |d| d.layout).flatten()
    }

    fn is_abstract(&self, ty: TypeKey) -> bool {
        self.test(ty, |d| d.flags.contains(TypeFlags::ABSTRACT))
    }

    fn is_interface(&self, ty: TypeKey) -> bool {
        self.test(ty, |d| d.kind == TypeKind::Interface)
    }

    fn is_array(&self, ty: TypeKey) -> bool {
        self.test(ty, |d| {
            matches!(d.kind, TypeKind::Array { .. }) || d.flags.contains(TypeFlags::ARRAY_BASE)
        })
    }

    fn is_pointer_or_byref(&self, ty: TypeKey) -> bool {
        self.test(ty, |d| {
            matches!(d.kind, TypeKind::Pointer { .. } | TypeKind::ByRef { .. })
        })
    }

    fn is_open_generic_definition(&self, ty: TypeKey) -> bool {
        self.test(ty, TypeDescriptor::is_open)
    }

    fn is_type_parameter(&self, ty: TypeKey) -> bool {
        self.test(ty, |d| matches!(d.kind, TypeKind::TypeParameter { .. }))
    }

    fn is_shared_generic_instantiation(&self, ty: TypeKey) -> bool {
        self.test(ty, TypeDescriptor::is_shared)
    }

    fn is_intrinsic_layout(&self, ty: TypeKey) -> bool {
        self.test(ty, |d| d.flags.contains(TypeFlags::INTRINSIC_LAYOUT))
    }

    fn is_nullable_wrapper_shape(&self, ty: TypeKey) -> bool {
        self.test(ty, |d| storage_of(d) == StorageKind::Nullable)
    }

    fn is_value_type(&self, ty: TypeKey) -> bool {
        self.test(ty, TypeDescriptor::is_value_type)
    }

    fn rust_binding(&self, ty: TypeKey) -> Option<RustBinding> {
        self.bindings.get(&ty).map(|r| *r.value())
    }

    fn lookup_rust(&self, type_id: TypeId) -> Option<TypeKey> {
        self.rust.get(&type_id).map(|r| *r.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(registry: &TypeRegistry) -> TypeKey {
        registry
            .define(
                TypeDef::class("List")
                    .with_type_params(&["T"])
                    .with_field("items", FieldType::Param(0))
                    .with_field("count", FieldType::Of(well_known::I32)),
            )
            .unwrap()
    }

    #[test]
    fn well_known_keys_match_registration_order() {
        let r = TypeRegistry::new();
        assert_eq!(r.lookup("object"), Some(well_known::OBJECT));
        assert_eq!(r.lookup("string"), Some(well_known::STRING));
        assert_eq!(r.lookup("Array"), Some(well_known::ARRAY));
        assert_eq!(r.lookup("__Canon"), Some(well_known::CANON));
        assert_eq!(r.lookup("i32"), Some(well_known::I32));
        assert_eq!(r.lookup("f64"), Some(well_known::F64));
        assert_eq!(r.lookup("Nullable"), Some(well_known::NULLABLE));
        assert_eq!(r.lookup("ReadOnlySpan"), Some(well_known::READ_ONLY_SPAN));
        assert_eq!(
            r.type_parameters(well_known::NULLABLE).unwrap().as_slice(),
            &[well_known::NULLABLE_T]
        );
    }

    #[test]
    fn primitives_are_bound_to_rust_types() {
        let r = TypeRegistry::new();
        assert_eq!(r.key_of::<i32>(), Some(well_known::I32));
        assert_eq!(r.key_of::<bool>(), Some(well_known::BOOL));
        assert_eq!(r.key_of::<HostObject>(), Some(well_known::OBJECT));
        assert_eq!(r.resolve_layout(well_known::U64), Some(Layout::new::<u64>()));
        assert!(r.is_value_type(well_known::F32));
    }

    #[test]
    fn option_of_primitive_is_bound_to_nullable() {
        let r = TypeRegistry::new();
        let key = r.key_of::<Option<i32>>().unwrap();
        assert_eq!(r.lookup("Nullable<i32>"), Some(key));
        assert!(r.is_nullable_wrapper_shape(key));
        assert!(r.is_value_type(key));
        assert!(!r.is_open_generic_definition(key));
    }

    #[test]
    fn bind_nullable_is_idempotent() {
        let r = TypeRegistry::new();
        let first = r.bind_nullable::<u8>().unwrap();
        let second = r.bind_nullable::<u8>().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn class_layout_includes_base_fields() {
        let r = TypeRegistry::new();
        let base = r
            .define(TypeDef::abstract_class("Base").with_field("id", FieldType::Of(well_known::U32)))
            .unwrap();
        let derived = r
            .define(
                TypeDef::class("Derived")
                    .with_base(base)
                    .with_field("weight", FieldType::Of(well_known::F64))
                    .with_field("next", FieldType::SelfReference),
            )
            .unwrap();
        let desc = r.get(derived).unwrap();
        assert_eq!(desc.field("id").unwrap().offset, 0);
        assert_eq!(desc.field("weight").unwrap().offset, 8);
        let next = desc.field("next").unwrap();
        assert_eq!(next.slot, FieldSlot::Reference);
        assert_eq!(next.ty, derived);
        assert_eq!(desc.layout().unwrap().size(), 24);
        assert!(r.is_abstract(base));
        assert!(!r.is_abstract(derived));
    }

    #[test]
    fn duplicate_names_rejected() {
        let r = TypeRegistry::new();
        r.define(TypeDef::class("Thing")).unwrap();
        assert_eq!(
            r.define(TypeDef::class("Thing")),
            Err(RegistryError::DuplicateName {
                name: "Thing".into()
            })
        );
    }

    #[test]
    fn failed_definition_does_not_reserve_name() {
        let r = TypeRegistry::new();
        let err = r.define(TypeDef::class("Broken").with_field("x", FieldType::Of(TypeKey(9999))));
        assert_eq!(err, Err(RegistryError::UnknownType { ty: TypeKey(9999) }));
        assert!(r.define(TypeDef::class("Broken")).is_ok());
    }

    #[test]
    fn interface_and_value_types_cannot_be_bases() {
        let r = TypeRegistry::new();
        let iface = r.define(TypeDef::interface("IThing")).unwrap();
        assert_eq!(
            r.define(TypeDef::class("Impl").with_base(iface)),
            Err(RegistryError::InvalidBase { base: iface })
        );
        assert_eq!(
            r.define(TypeDef::class("Text").with_base(well_known::STRING)),
            Err(RegistryError::InvalidBase {
                base: well_known::STRING
            })
        );
        assert_eq!(
            r.define(TypeDef::class("Wide").with_base(well_known::I64)),
            Err(RegistryError::InvalidBase {
                base: well_known::I64
            })
        );
    }

    #[test]
    fn instantiation_is_interned_and_laid_out() {
        let r = TypeRegistry::new();
        let list = list(&r);
        let a = r.instantiate(list, &[well_known::I64]).unwrap();
        let b = r.instantiate(list, &[well_known::I64]).unwrap();
        assert_eq!(a, b);
        let desc = r.get(a).unwrap();
        assert_eq!(desc.name(), "List<i64>");
        assert_eq!(desc.field("items").unwrap().slot, FieldSlot::Inline);
        assert_eq!(desc.field("count").unwrap().offset, 8);
        assert!(!r.is_open_generic_definition(a));
    }

    #[test]
    fn instantiation_lays_out_base_fields_first() {
        let r = TypeRegistry::new();
        let node = r
            .define(TypeDef::class("Node").with_field("id", FieldType::Of(well_known::U32)))
            .unwrap();
        let tagged = r
            .define(
                TypeDef::class("Tagged")
                    .with_base(node)
                    .with_type_params(&["T"])
                    .with_field("value", FieldType::Param(0))
                    .with_field("tag", FieldType::Of(well_known::U8)),
            )
            .unwrap();
        let of_u64 = r.instantiate(tagged, &[well_known::U64]).unwrap();
        let desc = r.get(of_u64).unwrap();
        let offsets: Vec<_> = desc.fields().map(|f| (f.name.as_str(), f.offset)).collect();
        assert_eq!(offsets, [("id", 0), ("value", 8), ("tag", 16)]);
        assert_eq!(desc.layout().unwrap().size(), 24);
        assert_eq!(desc.base(), Some(node));
    }

    #[test]
    fn reference_argument_takes_pointer_slot() {
        let r = TypeRegistry::new();
        let list = list(&r);
        let of_string = r.instantiate(list, &[well_known::STRING]).unwrap();
        let items = r.field(of_string, "items").unwrap();
        assert_eq!(items.slot, FieldSlot::Reference);
        assert_eq!(items.layout, reference_slot());
    }

    #[test]
    fn canonical_argument_marks_shared_at_any_depth() {
        let r = TypeRegistry::new();
        let list = list(&r);
        let shared = r.instantiate(list, &[well_known::CANON]).unwrap();
        let nested = r.instantiate(list, &[shared]).unwrap();
        assert!(r.is_shared_generic_instantiation(well_known::CANON));
        assert!(r.is_shared_generic_instantiation(shared));
        assert!(r.is_shared_generic_instantiation(nested));
        assert!(r.resolve_layout(shared).is_some());
    }

    #[test]
    fn parameter_argument_leaves_instantiation_open() {
        let r = TypeRegistry::new();
        let list = list(&r);
        let t = r.type_parameters(list).unwrap()[0];
        let open = r.instantiate(list, &[t]).unwrap();
        assert!(r.is_open_generic_definition(list));
        assert!(r.is_open_generic_definition(open));
        assert!(r.is_type_parameter(t));
        assert!(!r.is_open_generic_definition(t));
        assert!(r.resolve_layout(open).is_none());
    }

    #[test]
    fn instantiate_checks_arity_and_definition() {
        let r = TypeRegistry::new();
        let list = list(&r);
        assert_eq!(
            r.instantiate(list, &[]),
            Err(RegistryError::ArityMismatch {
                definition: list,
                expected: 1,
                found: 0
            })
        );
        assert_eq!(
            r.instantiate(well_known::I32, &[well_known::I32]),
            Err(RegistryError::NotGenericDefinition {
                ty: well_known::I32
            })
        );
    }

    #[test]
    fn template_parameter_index_is_checked() {
        let r = TypeRegistry::new();
        let err = r.define(
            TypeDef::class("Bad")
                .with_type_params(&["T"])
                .with_field("x", FieldType::Param(1)),
        );
        assert_eq!(
            err,
            Err(RegistryError::ParameterOutOfRange {
                field: "x".into(),
                index: 1
            })
        );
    }

    #[test]
    fn derived_types_are_interned() {
        let r = TypeRegistry::new();
        let arr = r.array_of(well_known::U8, 1).unwrap();
        assert_eq!(r.array_of(well_known::U8, 1).unwrap(), arr);
        assert_eq!(r.get(arr).unwrap().name(), "u8[]");
        let grid = r.array_of(well_known::U8, 2).unwrap();
        assert_eq!(r.get(grid).unwrap().name(), "u8[,]");
        let ptr = r.pointer_to(well_known::I32).unwrap();
        let by_ref = r.by_ref(well_known::I32).unwrap();
        assert_eq!(r.lookup("i32*"), Some(ptr));
        assert_eq!(r.lookup("i32&"), Some(by_ref));
        assert!(r.is_array(arr));
        assert!(r.is_array(well_known::ARRAY));
        assert!(r.is_pointer_or_byref(ptr));
        assert!(r.is_pointer_or_byref(by_ref));
    }

    #[test]
    fn span_instantiations_are_intrinsic() {
        let r = TypeRegistry::new();
        let span = r.instantiate(well_known::READ_ONLY_SPAN, &[well_known::U8]).unwrap();
        assert!(r.is_intrinsic_layout(span));
        assert!(r.is_value_type(span));
        assert!(r.is_intrinsic_layout(well_known::STRING));
        assert!(r.resolve_layout(well_known::STRING).is_none());
    }

    #[test]
    fn unknown_keys_answer_false() {
        let r = TypeRegistry::new();
        let missing = TypeKey(u32::MAX);
        assert!(!r.contains(missing));
        assert!(!r.is_abstract(missing));
        assert!(r.type_name(missing).is_none());
        assert!(r.resolve_layout(missing).is_none());
    }
}
