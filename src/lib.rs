//! storyreel turns a still cover image and a narration track into a finished story video.
//!
//! The pipeline loads the assets, mixes narration with optional looping background music,
//! renders every frame on the CPU (slow Ken Burns pan/zoom plus drifting dust particles), and
//! encodes and muxes the result through the system `ffmpeg`:
//!
//! - Describe the assets with a [`StoryVideoRequest`]
//! - Configure the output with [`CompileOptions`]
//! - Call [`compile_story_video`] (or reuse a [`StoryVideoCompiler`]) to get an [`EncodedVideo`]
//!
//! Failures are reported as one of the five [`StoryVideoError`] kinds.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Time remapping curves.
pub mod animation;
/// Asset fetching and decoding.
pub mod assets;
/// PCM audio processing.
pub mod audio;
/// Encoding backends and sinks.
pub mod encode;
mod foundation;
/// Frame rendering.
pub mod render;
/// Per-clip geometry and motion.
pub mod scene;
/// Compile API.
pub mod session;

pub use crate::foundation::core::{
    Affine, Canvas, ContainerFormat, FrameIndex, Point, Rect, Vec2, VideoConfig,
};
pub use crate::foundation::error::{StoryVideoError, StoryVideoResult};

pub use crate::animation::ease::Ease;
pub use crate::assets::decode::CoverImage;
pub use crate::assets::loader::{AssetLoader, LoaderConfig};
pub use crate::audio::mix::{MixGains, mix, mix_with_gains};
pub use crate::audio::pcm::DecodedAudio;
pub use crate::audio::resample::resample;
pub use crate::encode::backend::{EncoderBackend, FfmpegBackend};
pub use crate::encode::codec::{
    AudioCodec, CodecProbe, FfmpegCodecProbe, NegotiatedCodecs, StaticCodecProbe, VideoCodec,
    negotiate_codecs,
};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sink::{
    AudioTrackConfig, EncodedVideo, FrameSink, FrameTiming, InMemorySink, SinkConfig,
};
pub use crate::render::frame::{FrameRenderer, RenderOptions, StoryScene};
pub use crate::render::surface::{FrameFingerprint, FrameRGBA};
pub use crate::scene::motion::{CameraMotion, KenBurnsPath};
pub use crate::scene::particles::Particle;
pub use crate::scene::placement::CoverPlacement;
pub use crate::session::compile::{
    CompileOptions, MusicFailurePolicy, StoryVideoCompiler, StoryVideoRequest,
    compile_story_video,
};
pub use crate::session::progress::{CompilePhase, ProgressCallback, ProgressReporter};
