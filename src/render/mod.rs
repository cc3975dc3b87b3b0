//! CPU frame rendering.

/// Scene setup and the frame renderer.
pub mod frame;
/// Rendered frame buffers.
pub mod surface;
