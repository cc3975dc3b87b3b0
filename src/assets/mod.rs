//! Fetching and decoding the cover image and audio tracks.

/// Image and audio decoding.
pub mod decode;
/// URL-based asset loading with timeouts.
pub mod loader;
