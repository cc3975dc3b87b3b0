//! PCM buffers, sample-rate conversion, and mixing.

/// Mixing narration with looping background music.
pub mod mix;
/// Decoded planar PCM.
pub mod pcm;
/// Linear sample-rate conversion.
pub mod resample;
