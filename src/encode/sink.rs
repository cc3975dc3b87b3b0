use crate::audio::pcm::DecodedAudio;
use crate::encode::codec::{AudioCodec, VideoCodec};
use crate::foundation::core::{ContainerFormat, FrameIndex};
use crate::foundation::error::{StoryVideoError, StoryVideoResult};
use crate::render::surface::FrameRGBA;

/// Position of one frame on the output timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameTiming {
    /// Frame index.
    pub index: FrameIndex,
    /// Presentation timestamp in microseconds.
    pub timestamp_us: u64,
    /// Frame duration in microseconds.
    pub duration_us: u64,
}

/// Audio track parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioTrackConfig {
    /// Negotiated codec.
    pub codec: AudioCodec,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Target bitrate in bits per second.
    pub bitrate: u32,
}

/// Configuration provided to a [`FrameSink`] before any frame is pushed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Integer frames per second.
    pub fps: u32,
    /// Output container.
    pub container: ContainerFormat,
    /// Negotiated video codec.
    pub video_codec: VideoCodec,
    /// Target video bitrate in bits per second.
    pub video_bitrate: u32,
    /// Maximum distance between keyframes, in frames.
    pub keyframe_interval: u32,
    /// Audio track, if one was negotiated.
    pub audio: Option<AudioTrackConfig>,
}

/// A finalized video file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedVideo {
    /// Container bytes.
    pub bytes: Vec<u8>,
    /// Container the bytes are in.
    pub container: ContainerFormat,
    /// Video codec used.
    pub video_codec: VideoCodec,
    /// Audio codec used, `None` for a video-only file.
    pub audio_codec: Option<AudioCodec>,
}

impl EncodedVideo {
    /// MIME type of [`EncodedVideo::bytes`].
    pub fn mime_type(&self) -> &'static str {
        self.container.mime_type()
    }
}

/// Consumer of rendered frames and the mixed audio track.
///
/// Call order: `begin`, then `push_frame` with strictly increasing timestamps, then `close_video`,
/// then at most one `push_audio`, then `finish`.
pub trait FrameSink: Send {
    /// Open the tracks.
    fn begin(&mut self, cfg: SinkConfig) -> StoryVideoResult<()>;
    /// Submit one frame.
    fn push_frame(&mut self, timing: FrameTiming, frame: &FrameRGBA) -> StoryVideoResult<()>;
    /// No more frames will follow.
    fn close_video(&mut self) -> StoryVideoResult<()>;
    /// Submit the complete audio track as one unit.
    fn push_audio(&mut self, audio: &DecodedAudio) -> StoryVideoResult<()>;
    /// Finalize the container and return its bytes.
    fn finish(&mut self) -> StoryVideoResult<EncodedVideo>;
}

/// Checks the call-order contract shared by every sink.
#[derive(Debug, Default)]
pub(crate) struct SinkState {
    last_timestamp_us: Option<u64>,
    video_closed: bool,
    audio_pushed: bool,
}

impl SinkState {
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn on_frame(&mut self, timing: FrameTiming) -> StoryVideoResult<()> {
        if self.video_closed {
            return Err(StoryVideoError::compilation(
                "frame submitted after the video track was closed",
            ));
        }
        if let Some(last) = self.last_timestamp_us
            && timing.timestamp_us <= last
        {
            return Err(StoryVideoError::compilation(format!(
                "out-of-order frame timestamp {}us (previous {}us)",
                timing.timestamp_us, last
            )));
        }
        self.last_timestamp_us = Some(timing.timestamp_us);
        Ok(())
    }

    pub(crate) fn on_close_video(&mut self) {
        self.video_closed = true;
    }

    pub(crate) fn on_audio(&mut self) -> StoryVideoResult<()> {
        if !self.video_closed {
            return Err(StoryVideoError::compilation(
                "audio submitted before the video track was closed",
            ));
        }
        if self.audio_pushed {
            return Err(StoryVideoError::compilation("audio track already submitted"));
        }
        self.audio_pushed = true;
        Ok(())
    }

    pub(crate) fn video_closed(&self) -> bool {
        self.video_closed
    }
}

/// Sink that keeps everything in memory, for tests and debugging.
///
/// [`FrameSink::finish`] returns the concatenated raw frames, not a playable file.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    state: SinkState,
    frames: Vec<(FrameTiming, FrameRGBA)>,
    audio: Option<DecodedAudio>,
}

impl InMemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    /// Frames in submission order.
    pub fn frames(&self) -> &[(FrameTiming, FrameRGBA)] {
        &self.frames
    }

    /// The submitted audio track, if any.
    pub fn audio(&self) -> Option<&DecodedAudio> {
        self.audio.as_ref()
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> StoryVideoResult<()> {
        self.cfg = Some(cfg);
        self.state.reset();
        self.frames.clear();
        self.audio = None;
        Ok(())
    }

    fn push_frame(&mut self, timing: FrameTiming, frame: &FrameRGBA) -> StoryVideoResult<()> {
        if self.cfg.is_none() {
            return Err(StoryVideoError::compilation("sink not started"));
        }
        self.state.on_frame(timing)?;
        self.frames.push((timing, frame.clone()));
        Ok(())
    }

    fn close_video(&mut self) -> StoryVideoResult<()> {
        self.state.on_close_video();
        Ok(())
    }

    fn push_audio(&mut self, audio: &DecodedAudio) -> StoryVideoResult<()> {
        self.state.on_audio()?;
        self.audio = Some(audio.clone());
        Ok(())
    }

    fn finish(&mut self) -> StoryVideoResult<EncodedVideo> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| StoryVideoError::compilation("sink not started"))?;
        let bytes = self
            .frames
            .iter()
            .flat_map(|(_, f)| f.data.iter().copied())
            .collect();
        Ok(EncodedVideo {
            bytes,
            container: cfg.container,
            video_codec: cfg.video_codec,
            audio_codec: self.audio.as_ref().and(cfg.audio.as_ref()).map(|a| a.codec),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
