use super::atom::Atom;
use super::chain::Chain;
use super::ids::{AtomId, ChainId, ResidueId};
use super::residue::Residue;
use slotmap::SlotMap;
use std::collections::HashMap;

/// A complete molecular model: chains, residues, and atoms with coordinates.
///
/// Entities live in slot-map arenas and are addressed by stable keys. The file
/// order of atoms is recorded separately, so iteration always follows the order
/// in which the structure was built, which is the order the alignment uses to
/// pair atoms between two structures.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    /// Primary storage for atoms.
    atoms: SlotMap<AtomId, Atom>,
    /// Primary storage for residues.
    residues: SlotMap<ResidueId, Residue>,
    /// Primary storage for chains.
    chains: SlotMap<ChainId, Chain>,
    /// Atom keys in file order.
    atom_order: Vec<AtomId>,
    /// Lookup for residues by chain, residue number, and insertion code.
    residue_id_map: HashMap<(ChainId, isize, Option<char>), ResidueId>,
    /// Lookup for chains by their single-character identifier.
    chain_id_map: HashMap<char, ChainId>,
}

impl Structure {
    /// Creates a new, empty structure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an iterator over all atoms in file order.
    ///
    /// # Return
    ///
    /// An iterator yielding `(AtomId, &Atom)` pairs.
    pub fn atoms_iter(&self) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.atom_order.iter().map(|&id| (id, &self.atoms[id]))
    }

    /// Returns mutable references to every atom, in no particular order.
    ///
    /// Intended for whole-structure coordinate updates where ordering is irrelevant.
    pub fn atoms_mut(&mut self) -> impl Iterator<Item = &mut Atom> {
        self.atoms.values_mut()
    }

    /// Returns the number of atoms in the structure.
    pub fn atom_count(&self) -> usize {
        self.atom_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atom_order.is_empty()
    }

    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(id)
    }

    /// Adds a new chain to the structure or returns the existing one.
    ///
    /// This method is idempotent; a second call with the same identifier
    /// returns the chain created by the first.
    pub fn add_chain(&mut self, id: char) -> ChainId {
        if let Some(&existing) = self.chain_id_map.get(&id) {
            return existing;
        }
        let chain_id = self.chains.insert(Chain::new(id));
        self.chain_id_map.insert(id, chain_id);
        chain_id
    }

    /// Adds a new residue to a chain or returns the existing one.
    ///
    /// # Arguments
    ///
    /// * `chain_id` - The chain to add the residue to.
    /// * `number` - The residue sequence number.
    /// * `insertion_code` - The PDB insertion code, if any.
    /// * `name` - The residue name.
    ///
    /// # Return
    ///
    /// `None` if the chain does not exist.
    pub fn add_residue(
        &mut self,
        chain_id: ChainId,
        number: isize,
        insertion_code: Option<char>,
        name: &str,
    ) -> Option<ResidueId> {
        if !self.chains.contains_key(chain_id) {
            return None;
        }
        let key = (chain_id, number, insertion_code);
        if let Some(&existing) = self.residue_id_map.get(&key) {
            return Some(existing);
        }

        let residue_id = self
            .residues
            .insert(Residue::new(number, insertion_code, name, chain_id));
        self.residue_id_map.insert(key, residue_id);
        Some(residue_id)
    }

    /// Adds an atom to a residue and appends it to the file order.
    ///
    /// The atom's `residue_id` is overwritten with `residue_id`.
    ///
    /// # Return
    ///
    /// `None` if the residue does not exist.
    pub fn add_atom_to_residue(&mut self, residue_id: ResidueId, mut atom: Atom) -> Option<AtomId> {
        if !self.residues.contains_key(residue_id) {
            return None;
        }
        atom.residue_id = residue_id;
        let atom_id = self.atoms.insert(atom);
        self.atom_order.push(atom_id);
        Some(atom_id)
    }
}
