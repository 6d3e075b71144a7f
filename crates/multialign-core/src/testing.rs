//! Fixtures shared by the engine and workflow tests.

use crate::core::io::pdb::PdbFile;
use crate::core::io::traits::MolecularFile;
use crate::core::models::atom::Atom;
use crate::core::models::structure::Structure;
use nalgebra::{Point3, Rotation3, Vector3};
use std::path::{Path, PathBuf};

const BACKBONE: [&str; 4] = ["N", "CA", "C", "O"];
const RESIDUES: [&str; 5] = ["ALA", "GLY", "SER", "LEU", "VAL"];

/// A five-residue chain with an irregular backbone and a CB on every residue.
pub fn peptide() -> Structure {
    let mut structure = Structure::new();
    let chain = structure.add_chain('A');
    let mut serial = 1;
    for (i, name) in RESIDUES.iter().enumerate() {
        let residue = structure
            .add_residue(chain, i as isize + 1, None, name)
            .unwrap();
        let base = i as f64 * 3.8;
        let wobble = (i as f64 * 1.3).sin();
        let atoms = BACKBONE
            .iter()
            .enumerate()
            .map(|(j, atom_name)| {
                let j = j as f64;
                (
                    *atom_name,
                    Point3::new(base + j * 0.9, wobble + j * 0.4, (i as f64 * 0.7).cos() - j * 0.3),
                )
            })
            .chain(std::iter::once((
                "CB",
                Point3::new(base + 1.1, wobble - 1.4, 0.8 + i as f64 * 0.2),
            )));
        for (atom_name, position) in atoms {
            structure
                .add_atom_to_residue(residue, Atom::new(serial, atom_name, residue, position))
                .unwrap();
            serial += 1;
        }
    }
    structure
}

/// A copy of `structure` moved by a rotation about `axis` and a translation.
pub fn moved(structure: &Structure, axis: Vector3<f64>, angle: f64, shift: Vector3<f64>) -> Structure {
    let rotation = Rotation3::new(axis.normalize() * angle);
    let mut copy = structure.clone();
    for atom in copy.atoms_mut() {
        atom.position = rotation * atom.position + shift;
    }
    copy
}

pub fn write_pdb(dir: &Path, name: &str, structure: &Structure) -> PathBuf {
    let path = dir.join(name);
    PdbFile::write_structure_to_path(structure, &path).unwrap();
    path
}
