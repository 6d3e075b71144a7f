//! # Workflows Module
//!
//! High-level entry points that run a complete procedure from input files to
//! written results.
//!
//! - **Batch alignment** ([`batch_align`]) - Copies the reference into the output
//!   directory, then aligns every target onto it across a fixed pool of workers,
//!   collecting one outcome per target.

pub mod batch_align;
