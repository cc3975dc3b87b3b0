//! End-to-end compile API.

/// Story video compiler and its options.
pub mod compile;
/// Progress reporting and compile phases.
pub mod progress;
