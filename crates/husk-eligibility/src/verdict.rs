//! The outcome of classification.

use std::fmt;

use husk_core::{FactoryError, IneligibleReason, TypeKey};

/// Whether a type may be allocated uninitialized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EligibilityVerdict {
    /// The type has a fixed, field-level layout.
    Accepted,
    /// The type cannot be allocated uninitialized.
    Rejected(IneligibleReason),
}

impl EligibilityVerdict {
    /// Whether the verdict is [`Accepted`](Self::Accepted).
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// The rejection reason, if any.
    pub fn reason(&self) -> Option<IneligibleReason> {
        match self {
            Self::Accepted => None,
            Self::Rejected(reason) => Some(*reason),
        }
    }

    /// Convert to a factory result for the requested key.
    pub fn into_result(self, ty: Option<TypeKey>) -> Result<(), FactoryError> {
        match self {
            Self::Accepted => Ok(()),
            Self::Rejected(reason) => Err(FactoryError::Ineligible { ty, reason }),
        }
    }
}

impl fmt::Display for EligibilityVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => write!(f, "accepted"),
            Self::Rejected(reason) => write!(f, "rejected: {reason}"),
        }
    }
}
