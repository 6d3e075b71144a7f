//! # multialign Core Library
//!
//! Batch rigid-body superposition of molecular structures onto a common reference,
//! with per-structure work fanned out across a fixed pool of worker threads.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Structure`), PDB file I/O,
//!   geometric utilities such as RMSD, atom selections, and the Kabsch superposition.
//!
//! - **[`engine`]: The Logic Core.** Run configuration, the immutable work list, the
//!   worker-count policy, static partitioning of targets, and the per-target
//!   alignment task with its error taxonomy and progress reporting.
//!
//! - **[`workflows`]: The Public API.** Ties `engine` and `core` together into the
//!   complete batch-alignment procedure. This is the entry point for end-users.

pub mod core;
pub mod engine;
pub mod workflows;

#[cfg(test)]
mod testing;
