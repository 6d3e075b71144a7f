//! Provides input/output functionality for molecular file formats.
//!
//! Formats implement the [`traits::MolecularFile`] trait. Readers return the parsed
//! [`Structure`](crate::core::models::structure::Structure) together with
//! format-specific metadata that lets the writer reproduce every record the model
//! itself does not carry.

pub mod pdb;
pub mod traits;
