//! Binding Rust types to registered types.
//!
//! A [`Managed`] type promises that the all-zero bit pattern is a valid
//! value of the type, which is what makes constructor-free allocation of
//! it sound. [`RustBinding`] is the erased record of that promise that a
//! registry stores next to the type's metadata.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::any::{type_name, TypeId};
use std::fmt;
use std::mem;
use std::ptr;

/// How instances of a type are stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// Heap object with identity; the erased path hands out the object.
    Reference,
    /// Inline value; the erased path boxes it.
    Value,
    /// Optional wrapper over a value type; its default is "absent".
    Nullable,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference => write!(f, "reference"),
            Self::Value => write!(f, "value"),
            Self::Nullable => write!(f, "nullable"),
        }
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::ByReference {}
    impl Sealed for super::ByValue {}
    impl Sealed for super::AsNullable {}
}

/// Type-level [`StorageKind`].
pub trait StorageClass: sealed::Sealed + 'static {
    /// The runtime storage kind this marker stands for.
    const KIND: StorageKind;
}

/// Marker for [`StorageKind::Reference`].
#[derive(Clone, Copy, Debug)]
pub struct ByReference;

/// Marker for [`StorageKind::Value`].
#[derive(Clone, Copy, Debug)]
pub struct ByValue;

/// Marker for [`StorageKind::Nullable`].
#[derive(Clone, Copy, Debug)]
pub struct AsNullable;

impl StorageClass for ByReference {
    const KIND: StorageKind = StorageKind::Reference;
}

impl StorageClass for ByValue {
    const KIND: StorageKind = StorageKind::Value;
}

impl StorageClass for AsNullable {
    const KIND: StorageKind = StorageKind::Nullable;
}

/// A Rust type that may be materialized without running any constructor.
///
/// # Safety
///
/// For [`ByReference`] and [`ByValue`] storage, the all-zero bit pattern
/// must be a valid value of `Self`: integers, floats, `bool`, `Option` of
/// references or boxes, and structs made only of such fields qualify;
/// `String`, `Vec`, references and most enums do not.
///
/// [`AsNullable`] storage is never read from zeroed memory; the allocator
/// produces `Self::default()` instead, so the zero rule does not apply.
pub unsafe trait Managed: Sized + Send + Sync + 'static {
    /// How the type is stored.
    type Storage: StorageClass;
}

macro_rules! managed_primitives {
    ($($t:ty),* $(,)?) => {
        $(
            // SAFETY: zero is a valid value of every primitive numeric type and of `bool`.
            unsafe impl Managed for $t {
                type Storage = ByValue;
            }
        )*
    };
}

managed_primitives!(bool, u8, i8, u16, i16, u32, i32, u64, i64, usize, isize, f32, f64);

// SAFETY: nullable storage is produced through `Default`, never from zeroed bytes.
unsafe impl<U: Managed<Storage = ByValue>> Managed for Option<U> {
    type Storage = AsNullable;
}

/// Rust stand-in for the root reference type.
///
/// Zero-sized; the typed path for the root type hands out handles to it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct HostObject;

// SAFETY: zero-sized, so every bit pattern (there are none) is valid.
unsafe impl Managed for HostObject {
    type Storage = ByReference;
}

/// Erased destructor: drops a `T` in place at the given address.
pub type DropGlue = unsafe fn(*mut u8);

unsafe fn drop_erased<T>(ptr: *mut u8) {
    // SAFETY: the caller passes a pointer to a live, properly aligned `T`
    // that will not be used again.
    unsafe { ptr::drop_in_place(ptr.cast::<T>()) }
}

/// Erased record of a [`Managed`] type, stored by registries.
#[derive(Clone, Copy)]
pub struct RustBinding {
    type_id: TypeId,
    type_name: &'static str,
    layout: Layout,
    storage: StorageKind,
    drop_glue: Option<DropGlue>,
}

impl RustBinding {
    /// Capture the binding record for `T`.
    pub fn of<T: Managed>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            layout: Layout::new::<T>(),
            storage: <T::Storage as StorageClass>::KIND,
            drop_glue: if mem::needs_drop::<T>() {
                Some(drop_erased::<T> as DropGlue)
            } else {
                None
            },
        }
    }

    /// `TypeId` of the bound Rust type.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// `std::any::type_name` of the bound Rust type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// `Layout::new::<T>()` of the bound Rust type.
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Declared storage class.
    pub fn storage(&self) -> StorageKind {
        self.storage
    }

    /// Destructor to run before releasing storage, if `T` needs one.
    pub fn drop_glue(&self) -> Option<DropGlue> {
        self.drop_glue
    }

    /// Whether this binding records `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl fmt::Debug for RustBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RustBinding")
            .field("type_name", &self.type_name)
            .field("layout", &self.layout)
            .field("storage", &self.storage)
            .field("drop_glue", &self.drop_glue.is_some())
            .finish()
    }
}

impl PartialEq for RustBinding {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for RustBinding {}
