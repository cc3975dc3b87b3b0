//! Codec negotiation, frame sinks, and the encoding loop.
//!
//! Sinks consume rendered frames in timeline order, then the mixed audio as one unit, and finally
//! produce the finished container bytes.

/// Encoder backends (probe plus sink factory).
pub mod backend;
/// Codecs, containers, and capability negotiation.
pub mod codec;
/// `ffmpeg`-based sink.
pub mod ffmpeg;
/// The render-and-encode loop.
pub mod pipeline;
/// Frame sink trait and built-in sinks.
pub mod sink;
