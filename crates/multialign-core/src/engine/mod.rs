//! # Engine Module
//!
//! The stateful layer between the stateless `core` and the public `workflows`.
//!
//! - [`config`] - Run configuration and its builder
//! - [`context`] - Shared, read-only state borrowed by every worker
//! - [`work_list`] - The immutable, shared list of input paths
//! - [`workers`] - Worker-count policy and static partitioning of targets
//! - [`tasks`] - The per-target alignment task
//! - [`progress`] - Callback-based progress reporting
//! - [`error`] - Fatal and per-task error types

pub mod config;
pub mod context;
pub mod error;
pub mod progress;
pub mod tasks;
pub mod work_list;
pub mod workers;
