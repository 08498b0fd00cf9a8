//! The classification rules.

use husk_core::{IneligibleReason, TypeKey, TypeMetadataOracle};
use tracing::trace;

use crate::verdict::EligibilityVerdict;

/// Ordered rejection rules; the first predicate that holds decides.
#[allow(clippy::type_complexity)]
fn rules<O: TypeMetadataOracle + ?Sized>() -> [(fn(&O, TypeKey) -> bool, IneligibleReason); 8] {
    [
        (|o, t| o.is_abstract(t), IneligibleReason::Abstract),
        (|o, t| o.is_interface(t), IneligibleReason::Interface),
        (|o, t| o.is_pointer_or_byref(t), IneligibleReason::NotAHeapType),
        (|o, t| o.is_array(t), IneligibleReason::VariableLengthLayout),
        (|o, t| o.is_intrinsic_layout(t), IneligibleReason::IntrinsicLayout),
        (
            |o, t| o.is_open_generic_definition(t),
            IneligibleReason::OpenGeneric,
        ),
        (|o, t| o.is_type_parameter(t), IneligibleReason::TypeParameter),
        (
            |o, t| o.is_shared_generic_instantiation(t),
            IneligibleReason::SharedGenericLayout,
        ),
    ]
}

/// Decide whether `ty` may be allocated without running a constructor.
///
/// Pure and deterministic for a given oracle state. `None` and keys the
/// oracle does not know are rejected as [`IneligibleReason::NullType`].
/// The remaining rules are checked in a fixed order and the first one that
/// applies names the rejection, so a type that is both abstract and
/// generic reports [`IneligibleReason::Abstract`].
///
/// ```
/// use husk_core::{well_known, IneligibleReason};
/// use husk_eligibility::{classify, EligibilityVerdict};
/// use husk_types::TypeRegistry;
///
/// let registry = TypeRegistry::new();
/// assert_eq!(classify(&registry, Some(well_known::I32)), EligibilityVerdict::Accepted);
/// assert_eq!(
///     classify(&registry, Some(well_known::STRING)),
///     EligibilityVerdict::Rejected(IneligibleReason::IntrinsicLayout),
/// );
/// ```
pub fn classify<O>(oracle: &O, ty: Option<TypeKey>) -> EligibilityVerdict
where
    O: TypeMetadataOracle + ?Sized,
{
    let Some(ty) = ty.filter(|&t| oracle.contains(t)) else {
        trace!(?ty, "classify: no such type");
        return EligibilityVerdict::Rejected(IneligibleReason::NullType);
    };
    let verdict = rules::<O>()
        .into_iter()
        .find(|(applies, _)| applies(oracle, ty))
        .map_or(EligibilityVerdict::Accepted, |(_, reason)| {
            EligibilityVerdict::Rejected(reason)
        });
    trace!(ty = %ty, %verdict, "classify");
    verdict
}
