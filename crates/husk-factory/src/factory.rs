//! Factories: bound allocation routines.

use std::alloc::Layout;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use husk_core::{AsNullable, ByReference, ByValue, Managed, RustBinding, StorageClass, TypeKey};

use crate::instance::Instance;
use crate::raw::{zeroed_value, Handle, RawAllocator, RawObject};
use crate::strategy::AllocStrategy;

struct FactoryRecord {
    ty: TypeKey,
    strategy: AllocStrategy,
    layout: Layout,
    binding: Option<RustBinding>,
    allocator: &'static dyn RawAllocator,
}

/// Allocation routine bound to one accepted type.
///
/// Cheap to clone; clones share one immutable record, and two factories
/// for the same type are interchangeable.
#[derive(Clone)]
pub struct InstanceFactory {
    record: Arc<FactoryRecord>,
}

impl InstanceFactory {
    pub(crate) fn new(
        ty: TypeKey,
        strategy: AllocStrategy,
        layout: Layout,
        binding: Option<RustBinding>,
        allocator: &'static dyn RawAllocator,
    ) -> Self {
        Self {
            record: Arc::new(FactoryRecord {
                ty,
                strategy,
                layout,
                binding,
                allocator,
            }),
        }
    }

    /// The type this factory instantiates.
    pub fn target_type(&self) -> TypeKey {
        self.record.ty
    }

    /// The selected allocation strategy.
    pub fn strategy(&self) -> AllocStrategy {
        self.record.strategy
    }

    /// Storage layout of each instance.
    ///
    /// Meaningless for [`AllocStrategy::NullableWrapper`], which never
    /// allocates.
    pub fn layout(&self) -> Layout {
        self.record.layout
    }

    /// The Rust type bound to the target, if any.
    pub fn binding(&self) -> Option<RustBinding> {
        self.record.binding
    }

    /// Whether both handles share one record.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.record, &other.record)
    }

    /// Produce a fresh instance.
    ///
    /// Never runs a constructor and never fails; out-of-memory aborts
    /// through the allocator. Every call returns independent storage.
    pub fn create_instance(&self) -> Instance {
        match self.record.strategy {
            AllocStrategy::Reference => Instance::Object(self.allocate()),
            AllocStrategy::Value => Instance::Boxed(self.allocate()),
            AllocStrategy::NullableWrapper => Instance::Absent,
        }
    }

    fn allocate(&self) -> RawObject {
        let r = &*self.record;
        RawObject::allocate(r.ty, r.layout, r.binding, r.allocator)
    }
}

impl fmt::Debug for InstanceFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceFactory")
            .field("ty", &self.record.ty)
            .field("strategy", &self.record.strategy)
            .field("size", &self.record.layout.size())
            .field("rust", &self.record.binding.map(|b| b.type_name()))
            .finish()
    }
}

/// Maps a storage class to what the typed path hands out.
pub trait StorageAdapter<T: Managed>: StorageClass {
    /// The produced value.
    type Output;

    /// Produce one instance through `factory`.
    fn create(factory: &InstanceFactory) -> Self::Output;
}

impl<T: Managed<Storage = ByReference>> StorageAdapter<T> for ByReference {
    type Output = Handle<T>;

    fn create(factory: &InstanceFactory) -> Handle<T> {
        factory
            .allocate()
            .into_handle()
            .expect("typed factory binding verified at creation")
    }
}

impl<T: Managed<Storage = ByValue>> StorageAdapter<T> for ByValue {
    type Output = T;

    fn create(_factory: &InstanceFactory) -> T {
        zeroed_value()
    }
}

impl<T: Managed<Storage = AsNullable> + Default> StorageAdapter<T> for AsNullable {
    type Output = T;

    fn create(_factory: &InstanceFactory) -> T {
        T::default()
    }
}

/// Typed view of an [`InstanceFactory`] for a Rust-bound type.
///
/// Reference types come out as [`Handle<T>`], value types as a zeroed
/// `T`, nullable wrappers as `T::default()` (`None` for `Option<U>`).
pub struct TypedFactory<T: Managed> {
    erased: InstanceFactory,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Managed> TypedFactory<T> {
    pub(crate) fn new(erased: InstanceFactory) -> Self {
        Self {
            erased,
            _marker: PhantomData,
        }
    }

    /// The type this factory instantiates.
    pub fn target_type(&self) -> TypeKey {
        self.erased.target_type()
    }

    /// The selected allocation strategy.
    pub fn strategy(&self) -> AllocStrategy {
        self.erased.strategy()
    }

    /// The underlying erased factory.
    pub fn erased(&self) -> &InstanceFactory {
        &self.erased
    }
}

impl<T: Managed> TypedFactory<T>
where
    T::Storage: StorageAdapter<T>,
{
    /// Produce a fresh instance without running any constructor.
    pub fn create_instance(&self) -> <T::Storage as StorageAdapter<T>>::Output {
        <T::Storage as StorageAdapter<T>>::create(&self.erased)
    }
}

impl<T: Managed> Clone for TypedFactory<T> {
    fn clone(&self) -> Self {
        Self::new(self.erased.clone())
    }
}

impl<T: Managed> fmt::Debug for TypedFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedFactory").field(&self.erased).finish()
    }
}
