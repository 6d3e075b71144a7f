//! Units of work executed by the workflows.

pub mod align_target;
