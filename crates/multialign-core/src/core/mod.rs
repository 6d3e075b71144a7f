//! # Core Module
//!
//! Fundamental building blocks for structure superposition: the molecular
//! representation, file I/O, geometric primitives, and the alignment kernel.
//!
//! - **Molecular Representation** ([`models`]) - Atoms, residues, chains, and the owning `Structure`
//! - **File I/O** ([`io`]) - Reading and writing PDB files with verbatim record preservation
//! - **Geometry** ([`utils`]) - Centroids and RMSD over coordinate sets
//! - **Superposition** ([`alignment`]) - Atom selections and the Kabsch least-squares fit

pub mod alignment;
pub mod io;
pub mod models;
pub mod utils;
