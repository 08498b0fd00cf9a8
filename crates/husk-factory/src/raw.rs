//! Raw zeroed storage.
//!
//! Every `unsafe` block of the factory lives here. Instances own a block
//! obtained from a [`RawAllocator`] and release it through the same
//! allocator on drop, after running the bound Rust type's drop glue.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};
use std::slice;

use husk_core::{ByValue, Managed, RustBinding, StorageClass, StorageKind, TypeKey};

/// Source of zeroed storage for instances.
///
/// # Safety
///
/// `allocate_zeroed` must return a pointer to `layout.size()` bytes, all
/// zero, aligned to `layout.align()`, valid until passed to `deallocate`.
/// Allocation failure must not return: report it through
/// [`std::alloc::handle_alloc_error`] or abort.
pub unsafe trait RawAllocator: Send + Sync {
    /// Allocate zeroed storage.
    ///
    /// # Safety
    ///
    /// `layout.size()` must be non-zero.
    unsafe fn allocate_zeroed(&self, layout: Layout) -> NonNull<u8>;

    /// Release storage.
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate_zeroed` on this allocator with the
    /// same `layout`, and must not be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

/// [`RawAllocator`] backed by the global allocator.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemAllocator;

/// The shared [`SystemAllocator`] instance.
pub static SYSTEM: SystemAllocator = SystemAllocator;

// SAFETY: `alloc_zeroed` returns zeroed, aligned storage or null, and null
// is routed to `handle_alloc_error`, which does not return.
unsafe impl RawAllocator for SystemAllocator {
    unsafe fn allocate_zeroed(&self, layout: Layout) -> NonNull<u8> {
        // SAFETY: the caller guarantees a non-zero size.
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        NonNull::new(ptr).unwrap_or_else(|| alloc::handle_alloc_error(layout))
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: the caller guarantees `ptr` came from `alloc_zeroed` with `layout`.
        unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

/// A well-aligned, non-null address for zero-sized storage.
fn dangling(layout: Layout) -> NonNull<u8> {
    NonNull::new(ptr::without_provenance_mut(layout.align())).unwrap_or(NonNull::dangling())
}

/// Zeroed heap storage tagged with the registered type it holds.
///
/// Produced by [`InstanceFactory::create_instance`](crate::InstanceFactory::create_instance)
/// for reference types and for boxed value types. Owns its storage.
pub struct RawObject {
    ty: TypeKey,
    ptr: NonNull<u8>,
    layout: Layout,
    binding: Option<RustBinding>,
    allocator: &'static dyn RawAllocator,
}

// SAFETY: a `RawObject` exclusively owns its storage. The bytes are plain
// data unless a Rust type is bound, and bound types are `Managed`, which
// requires `Send + Sync`.
unsafe impl Send for RawObject {}
// SAFETY: shared access only hands out `&[u8]` or `&T` for a `Sync` `T`.
unsafe impl Sync for RawObject {}

impl RawObject {
    /// Allocate zeroed storage for one instance of `ty`.
    ///
    /// `binding`, when present, must describe a Rust type whose layout is
    /// `layout`; its drop glue runs when the object is dropped.
    pub(crate) fn allocate(
        ty: TypeKey,
        layout: Layout,
        binding: Option<RustBinding>,
        allocator: &'static dyn RawAllocator,
    ) -> Self {
        debug_assert!(binding.is_none_or(|b| b.layout() == layout));
        let ptr = if layout.size() == 0 {
            dangling(layout)
        } else {
            // SAFETY: size is non-zero.
            unsafe { allocator.allocate_zeroed(layout) }
        };
        Self {
            ty,
            ptr,
            layout,
            binding,
            allocator,
        }
    }

    /// The registered type this storage was allocated for.
    pub fn runtime_type(&self) -> TypeKey {
        self.ty
    }

    /// Size and alignment of the storage.
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// The bound Rust type, if any.
    pub fn binding(&self) -> Option<RustBinding> {
        self.binding
    }

    /// The instance's bytes.
    ///
    /// Only available when no Rust type is bound: once a bound value has
    /// been written through [`downcast_mut`](Self::downcast_mut) or a
    /// [`Handle`], its padding bytes are uninitialized.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        if self.binding.is_some() {
            return None;
        }
        // SAFETY: unbound storage is only written through `as_bytes_mut`,
        // so all `layout.size()` bytes owned by `self` are initialized. A
        // zero size uses an aligned dangling pointer.
        Some(unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) })
    }

    /// The instance's bytes, mutably.
    ///
    /// Only available when no Rust type is bound; writing arbitrary bytes
    /// could break a bound type's invariants. Use
    /// [`downcast_mut`](Self::downcast_mut) for bound types.
    pub fn as_bytes_mut(&mut self) -> Option<&mut [u8]> {
        if self.binding.is_some() {
            return None;
        }
        // SAFETY: as in `as_bytes`; `&mut self` guarantees exclusivity.
        Some(unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) })
    }

    /// Whether the storage is unbound and every byte is still zero.
    ///
    /// Always `false` for Rust-bound storage, whose bytes cannot be read.
    pub fn is_zeroed(&self) -> bool {
        self.as_bytes().is_some_and(|bytes| bytes.iter().all(|&b| b == 0))
    }

    /// Address of the storage. Distinct live objects of non-zero size
    /// never share an address.
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// Whether the storage holds the Rust type `T`.
    pub fn is<T: Managed>(&self) -> bool {
        <T::Storage as StorageClass>::KIND != StorageKind::Nullable
            && self
                .binding
                .is_some_and(|b| b.type_id() == TypeId::of::<T>() && b.layout() == self.layout)
    }

    /// View the storage as the bound Rust type.
    pub fn downcast_ref<T: Managed>(&self) -> Option<&T> {
        if !self.is::<T>() {
            return None;
        }
        // SAFETY: the storage was allocated with `Layout::new::<T>()`,
        // zeroed (valid for non-nullable `Managed` types) and only mutated
        // through `&mut T`.
        Some(unsafe { &*self.ptr.as_ptr().cast::<T>() })
    }

    /// View the storage as the bound Rust type, mutably.
    pub fn downcast_mut<T: Managed>(&mut self) -> Option<&mut T> {
        if !self.is::<T>() {
            return None;
        }
        // SAFETY: as in `downcast_ref`; `&mut self` guarantees exclusivity.
        Some(unsafe { &mut *self.ptr.as_ptr().cast::<T>() })
    }

    /// Convert into a typed handle, or give the object back if it does
    /// not hold a `T`.
    pub fn into_handle<T: Managed>(self) -> Result<Handle<T>, RawObject> {
        if self.is::<T>() {
            Ok(Handle {
                object: self,
                _marker: PhantomData,
            })
        } else {
            Err(self)
        }
    }
}

impl Drop for RawObject {
    fn drop(&mut self) {
        if let Some(glue) = self.binding.and_then(|b| b.drop_glue()) {
            // SAFETY: the binding's type lives at `ptr` (checked at
            // allocation) and is never used after this.
            unsafe { glue(self.ptr.as_ptr()) }
        }
        if self.layout.size() != 0 {
            // SAFETY: `ptr` came from this allocator with this layout.
            unsafe { self.allocator.deallocate(self.ptr, self.layout) }
        }
    }
}

impl fmt::Debug for RawObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawObject")
            .field("ty", &self.ty)
            .field("size", &self.layout.size())
            .field("align", &self.layout.align())
            .field("rust", &self.binding.map(|b| b.type_name()))
            .finish()
    }
}

/// Owning handle to a constructor-free instance of a Rust-bound
/// reference type.
///
/// Dereferences to `T`. Dropping the handle runs `T`'s destructor and
/// releases the storage.
pub struct Handle<T: Managed> {
    object: RawObject,
    _marker: PhantomData<T>,
}

impl<T: Managed> Handle<T> {
    /// The registered type of the instance.
    pub fn runtime_type(&self) -> TypeKey {
        self.object.runtime_type()
    }

    /// The underlying erased storage.
    pub fn as_raw(&self) -> &RawObject {
        &self.object
    }

    /// Give up the static type.
    pub fn into_raw(self) -> RawObject {
        self.object
    }
}

impl<T: Managed> Deref for Handle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: `into_handle` verified the object holds a `T`.
        unsafe { &*self.object.ptr.as_ptr().cast::<T>() }
    }
}

impl<T: Managed> DerefMut for Handle<T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: as in `deref`; `&mut self` guarantees exclusivity.
        unsafe { &mut *self.object.ptr.as_ptr().cast::<T>() }
    }
}

impl<T: Managed + fmt::Debug> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&**self).finish()
    }
}

/// A `T` with every byte zero, produced without any constructor.
pub(crate) fn zeroed_value<T: Managed<Storage = ByValue>>() -> T {
    // SAFETY: `Managed` with by-value storage promises zero is a valid `T`.
    unsafe { mem::zeroed() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Node {
        weight: f64,
        next: Option<Box<Node>>,
    }

    // SAFETY: zeroed f64 is 0.0 and zeroed Option<Box<_>> is None.
    unsafe impl Managed for Node {
        type Storage = husk_core::ByReference;
    }

    fn node() -> RawObject {
        let binding = RustBinding::of::<Node>();
        RawObject::allocate(TypeKey(100), binding.layout(), Some(binding), &SYSTEM)
    }

    #[test]
    fn storage_is_zeroed() {
        let obj = RawObject::allocate(TypeKey(7), Layout::new::<[u64; 4]>(), None, &SYSTEM);
        assert_eq!(obj.as_bytes().map(<[u8]>::len), Some(32));
        assert!(obj.is_zeroed());
        assert_eq!(obj.runtime_type(), TypeKey(7));
    }

    #[test]
    fn zero_sized_storage_is_aligned() {
        let layout = Layout::from_size_align(0, 16).unwrap();
        let obj = RawObject::allocate(TypeKey(1), layout, None, &SYSTEM);
        assert_eq!(obj.as_bytes(), Some(&[][..]));
        assert_eq!(obj.as_ptr() as usize % 16, 0);
    }

    #[test]
    fn erased_bytes_are_writable() {
        let mut obj = RawObject::allocate(TypeKey(7), Layout::new::<u32>(), None, &SYSTEM);
        obj.as_bytes_mut().unwrap()[0] = 1;
        assert!(!obj.is_zeroed());
    }

    #[test]
    fn bound_bytes_are_not_accessible() {
        let mut obj = node();
        assert!(obj.as_bytes_mut().is_none());
        assert!(obj.as_bytes().is_none());
        assert!(!obj.is_zeroed());
    }

    #[test]
    fn bound_bytes_stay_hidden_after_whole_value_write() {
        let mut handle = node().into_handle::<Node>().unwrap();
        *handle = Node {
            weight: 4.0,
            next: None,
        };
        assert!(handle.as_raw().as_bytes().is_none());
        assert!(!handle.as_raw().is_zeroed());
        assert_eq!(handle.as_raw().downcast_ref::<Node>().unwrap().weight, 4.0);
    }

    #[test]
    fn downcast_checks_rust_type() {
        let mut obj = node();
        assert!(obj.downcast_ref::<u64>().is_none());
        let node = obj.downcast_mut::<Node>().unwrap();
        assert_eq!(node.weight, 0.0);
        assert!(node.next.is_none());
        node.next = Some(Box::new(Node {
            weight: 1.5,
            next: None,
        }));
        assert_eq!(obj.downcast_ref::<Node>().unwrap().next.as_ref().unwrap().weight, 1.5);
    }

    #[test]
    fn handle_derefs_and_runs_drop_glue() {
        let mut handle = node().into_handle::<Node>().unwrap();
        handle.weight = 2.0;
        handle.next = Some(Box::new(Node {
            weight: 3.0,
            next: None,
        }));
        assert_eq!(handle.weight, 2.0);
        assert_eq!(handle.runtime_type(), TypeKey(100));
        drop(handle);
    }

    #[test]
    fn into_handle_rejects_other_types() {
        let obj = RawObject::allocate(TypeKey(7), Layout::new::<u64>(), None, &SYSTEM);
        let obj = obj.into_handle::<Node>().unwrap_err();
        assert_eq!(obj.runtime_type(), TypeKey(7));
    }

    #[test]
    fn zeroed_primitives() {
        assert_eq!(zeroed_value::<i32>(), 0);
        assert!(!zeroed_value::<bool>());
        assert_eq!(zeroed_value::<f64>(), 0.0);
    }
}
