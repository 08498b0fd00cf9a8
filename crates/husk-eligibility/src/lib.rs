//! Eligibility classification for the husk allocator.
//!
//! [`classify`] decides whether a type may be materialized without running
//! any constructor. It is a pure function of what the
//! [`TypeMetadataOracle`](husk_core::TypeMetadataOracle) reports; the
//! factory crate runs it before binding an allocation routine.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod classify;
pub mod verdict;

pub use classify::classify;
pub use verdict::EligibilityVerdict;
