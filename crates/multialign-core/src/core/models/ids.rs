//! Stable arena keys for the entities owned by a [`Structure`](super::structure::Structure).
//!
//! Keys are only meaningful for the structure that issued them; two structures
//! loaded from the same file hand out unrelated keys.

use slotmap::new_key_type;

new_key_type! {
    /// Key of an [`Atom`](super::atom::Atom) inside its owning structure.
    pub struct AtomId;
    /// Key of a [`Residue`](super::residue::Residue) inside its owning structure.
    pub struct ResidueId;
    /// Key of a [`Chain`](super::chain::Chain) inside its owning structure.
    pub struct ChainId;
}
