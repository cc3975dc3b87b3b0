//! Time remapping curves.

/// Easing functions.
pub mod ease;
