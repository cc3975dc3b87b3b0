//! Per-clip geometry: cover placement, Ken Burns motion, and the particle field.
//!
//! Everything here is a pure function of its inputs (and of the RNG handed in), so any frame can
//! be recomputed independently.

/// Ken Burns paths and camera motion.
pub mod motion;
/// Ambient dust particles.
pub mod particles;
/// Aspect-preserving cover placement.
pub mod placement;
