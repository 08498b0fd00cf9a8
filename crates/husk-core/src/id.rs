//! Strongly-typed type identifiers and the [`GenericArgs`] alias.

use smallvec::SmallVec;
use std::fmt;

/// Identifies a type known to a [`TypeMetadataOracle`](crate::TypeMetadataOracle).
///
/// Keys are assigned sequentially by the registry that owns the type and
/// are never reused within a process. Two lookups of the same type always
/// produce the same key, so key equality is type identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(pub u32);

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for TypeKey {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Type arguments of a generic instantiation, or the parameters of a
/// generic definition.
///
/// Uses `SmallVec<[TypeKey; 4]>` to avoid heap allocation for the common
/// case of one or two arguments.
pub type GenericArgs = SmallVec<[TypeKey; 4]>;

/// Keys of the types every registry pre-registers, in registration order.
///
/// The default registry asserts this order at construction so these
/// constants can be used without a lookup.
pub mod well_known {
    use super::TypeKey;

    /// The root reference type. Zero-sized payload.
    pub const OBJECT: TypeKey = TypeKey(0);
    /// The intrinsic string type.
    pub const STRING: TypeKey = TypeKey(1);
    /// The base type of every array type.
    pub const ARRAY: TypeKey = TypeKey(2);
    /// The canonical placeholder used for shared generic code.
    pub const CANON: TypeKey = TypeKey(3);
    /// `bool`.
    pub const BOOL: TypeKey = TypeKey(4);
    /// `u8`.
    pub const U8: TypeKey = TypeKey(5);
    /// `i8`.
    pub const I8: TypeKey = TypeKey(6);
    /// `u16`.
    pub const U16: TypeKey = TypeKey(7);
    /// `i16`.
    pub const I16: TypeKey = TypeKey(8);
    /// `u32`.
    pub const U32: TypeKey = TypeKey(9);
    /// `i32`.
    pub const I32: TypeKey = TypeKey(10);
    /// `u64`.
    pub const U64: TypeKey = TypeKey(11);
    /// `i64`.
    pub const I64: TypeKey = TypeKey(12);
    /// `usize`.
    pub const USIZE: TypeKey = TypeKey(13);
    /// `isize`.
    pub const ISIZE: TypeKey = TypeKey(14);
    /// `f32`.
    pub const F32: TypeKey = TypeKey(15);
    /// `f64`.
    pub const F64: TypeKey = TypeKey(16);
    /// The open `Nullable<T>` definition (the nullable-wrapper shape).
    pub const NULLABLE: TypeKey = TypeKey(17);
    /// The `T` parameter of [`NULLABLE`].
    pub const NULLABLE_T: TypeKey = TypeKey(18);
    /// The open `ReadOnlySpan<T>` definition (a stack-only view).
    pub const READ_ONLY_SPAN: TypeKey = TypeKey(19);
    /// The `T` parameter of [`READ_ONLY_SPAN`].
    pub const READ_ONLY_SPAN_T: TypeKey = TypeKey(20);

    /// Number of keys reserved by the well-known set.
    pub const COUNT: u32 = 21;

    /// The primitive value types, in key order.
    pub const PRIMITIVES: [TypeKey; 13] = [
        BOOL, U8, I8, U16, I16, U32, I32, U64, I64, USIZE, ISIZE, F32, F64,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_hash() {
        assert_eq!(TypeKey(42).to_string(), "#42");
    }

    #[test]
    fn from_u32_round_trips() {
        let key: TypeKey = 7u32.into();
        assert_eq!(key, TypeKey(7));
    }

    #[test]
    fn well_known_keys_are_dense() {
        let mut all = vec![
            well_known::OBJECT,
            well_known::STRING,
            well_known::ARRAY,
            well_known::CANON,
        ];
        all.extend_from_slice(&well_known::PRIMITIVES);
        all.extend_from_slice(&[
            well_known::NULLABLE,
            well_known::NULLABLE_T,
            well_known::READ_ONLY_SPAN,
            well_known::READ_ONLY_SPAN_T,
        ]);
        for (i, key) in all.iter().enumerate() {
            assert_eq!(key.0, i as u32);
        }
        assert_eq!(all.len() as u32, well_known::COUNT);
    }
}
