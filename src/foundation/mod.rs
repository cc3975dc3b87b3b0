//! Shared value types, errors, and integer math helpers.

/// Canvas, frame index, container, and output configuration types.
pub mod core;
/// Error taxonomy.
pub mod error;
pub(crate) mod math;
