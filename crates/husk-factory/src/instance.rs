//! Erased instances.

use husk_core::{Managed, TypeKey};

use crate::raw::RawObject;

/// One constructor-free instance, as produced by the erased path.
#[derive(Debug)]
pub enum Instance {
    /// A reference-type object.
    Object(RawObject),
    /// A value-type payload on the heap.
    Boxed(RawObject),
    /// The absent value of a nullable wrapper.
    Absent,
}

impl Instance {
    /// The registered type of the instance; `None` when absent.
    pub fn runtime_type(&self) -> Option<TypeKey> {
        self.as_raw().map(RawObject::runtime_type)
    }

    /// Whether this is [`Instance::Absent`].
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Whether this is a boxed value.
    pub fn is_boxed(&self) -> bool {
        matches!(self, Self::Boxed(_))
    }

    /// The underlying storage, for objects and boxed values.
    pub fn as_raw(&self) -> Option<&RawObject> {
        match self {
            Self::Object(raw) | Self::Boxed(raw) => Some(raw),
            Self::Absent => None,
        }
    }

    /// The underlying storage, mutably.
    pub fn as_raw_mut(&mut self) -> Option<&mut RawObject> {
        match self {
            Self::Object(raw) | Self::Boxed(raw) => Some(raw),
            Self::Absent => None,
        }
    }

    /// Take the underlying storage.
    pub fn into_raw(self) -> Option<RawObject> {
        match self {
            Self::Object(raw) | Self::Boxed(raw) => Some(raw),
            Self::Absent => None,
        }
    }

    /// View the instance as the bound Rust type.
    pub fn downcast_ref<T: Managed>(&self) -> Option<&T> {
        self.as_raw()?.downcast_ref()
    }

    /// View the instance as the bound Rust type, mutably.
    pub fn downcast_mut<T: Managed>(&mut self) -> Option<&mut T> {
        self.as_raw_mut()?.downcast_mut()
    }
}
