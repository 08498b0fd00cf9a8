//! Sequential field layout.
//!
//! Fields are placed in declaration order after the base type's fields,
//! each at the next offset satisfying its alignment. The total size is
//! rounded up to the largest alignment seen, as with `#[repr(C)]`.

use std::alloc::Layout;

use husk_core::{RegistryError, TypeKey};
use indexmap::IndexMap;

use crate::descriptor::{FieldInfo, FieldSlot, TypeDescriptor, TypeKind};

/// Layout of a reference slot: one pointer.
pub(crate) fn reference_slot() -> Layout {
    Layout::new::<*const u8>()
}

/// How a field of type `ty` is stored.
///
/// Value types are stored inline and must have a fixed layout. Everything
/// else (classes, interfaces, arrays, pointers, parameters) is a pointer.
pub(crate) fn slot_for(
    field: &str,
    ty: &TypeDescriptor,
) -> Result<(FieldSlot, Layout), RegistryError> {
    match ty.kind() {
        TypeKind::Struct => match ty.layout() {
            Some(layout) => Ok((FieldSlot::Inline, layout)),
            None => Err(RegistryError::UnsizedField {
                field: field.to_string(),
                ty: ty.key(),
            }),
        },
        _ => Ok((FieldSlot::Reference, reference_slot())),
    }
}

/// Accumulates fields into a layout.
pub(crate) struct FieldLayout {
    owner: String,
    layout: Layout,
    fields: IndexMap<String, FieldInfo>,
}

impl FieldLayout {
    /// Start an empty layout for the type named `owner`.
    pub(crate) fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            layout: Layout::new::<()>(),
            fields: IndexMap::new(),
        }
    }

    /// Start after the fields of `base`.
    pub(crate) fn inherit(owner: &str, base: &TypeDescriptor) -> Self {
        Self {
            owner: owner.to_string(),
            layout: base.layout().unwrap_or_else(Layout::new::<()>),
            fields: base.fields.clone(),
        }
    }

    /// Append a field.
    pub(crate) fn push(
        &mut self,
        name: &str,
        ty: TypeKey,
        slot: FieldSlot,
        layout: Layout,
    ) -> Result<(), RegistryError> {
        if self.fields.contains_key(name) {
            return Err(RegistryError::DuplicateField {
                field: name.to_string(),
            });
        }
        let (next, offset) = self
            .layout
            .extend(layout)
            .map_err(|_| RegistryError::LayoutOverflow {
                name: self.owner.clone(),
            })?;
        self.layout = next;
        self.fields.insert(
            name.to_string(),
            FieldInfo {
                name: name.to_string(),
                ty,
                offset,
                layout,
                slot,
            },
        );
        Ok(())
    }

    /// Pad to alignment and return the layout and fields.
    pub(crate) fn finish(self) -> (Layout, IndexMap<String, FieldInfo>) {
        (self.layout.pad_to_align(), self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    #[test]
    fn empty_layout_is_zero_sized() {
        let (layout, fields) = FieldLayout::new("Empty").finish();
        assert_eq!(layout.size(), 0);
        assert_eq!(layout.align(), 1);
        assert!(fields.is_empty());
    }

    #[test]
    fn fields_are_aligned_and_padded() {
        let mut l = FieldLayout::new("Mixed");
        l.push("flag", TypeKey(4), FieldSlot::Inline, Layout::new::<bool>())
            .unwrap();
        l.push("count", TypeKey(12), FieldSlot::Inline, Layout::new::<i64>())
            .unwrap();
        l.push("tag", TypeKey(5), FieldSlot::Inline, Layout::new::<u8>())
            .unwrap();
        let (layout, fields) = l.finish();
        assert_eq!(fields["flag"].offset, 0);
        assert_eq!(fields["count"].offset, 8);
        assert_eq!(fields["tag"].offset, 16);
        assert_eq!(layout.size(), 24);
        assert_eq!(layout.align(), 8);
    }

    #[test]
    fn duplicate_field_rejected() {
        let mut l = FieldLayout::new("Dup");
        l.push("x", TypeKey(10), FieldSlot::Inline, Layout::new::<i32>())
            .unwrap();
        let err = l
            .push("x", TypeKey(10), FieldSlot::Inline, Layout::new::<i32>())
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateField {
                field: "x".to_string()
            }
        );
    }

    #[test]
    fn reference_slot_is_pointer_sized() {
        assert_eq!(reference_slot().size(), mem::size_of::<usize>());
        assert_eq!(reference_slot().align(), mem::align_of::<usize>());
    }
}
