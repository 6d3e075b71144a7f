//! Rigid-body superposition of one structure onto another.
//!
//! Atoms taking part in a fit are chosen with an [`AtomSelection`](selection::AtomSelection)
//! and paired positionally, in file order, between the mobile and reference structures.
//! The optimal rotation and translation are found with the Kabsch algorithm and then
//! applied to every atom of the mobile structure.

pub mod kabsch;
pub mod selection;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AlignmentError {
    #[error(
        "Selection '{selection}' matched {mobile} atom(s) in the mobile structure but {reference} in the reference"
    )]
    AtomCountMismatch {
        selection: String,
        mobile: usize,
        reference: usize,
    },

    #[error("Superposition needs at least {required} atoms, but selection '{selection}' matched {found}")]
    InsufficientAtoms {
        selection: String,
        required: usize,
        found: usize,
    },

    #[error("Singular value decomposition failed to converge")]
    Degenerate,
}
