use std::sync::atomic::{AtomicBool, Ordering};

use crate::audio::pcm::DecodedAudio;
use crate::audio::resample::resample;
use crate::encode::backend::EncoderBackend;
use crate::encode::codec::negotiate_codecs;
use crate::encode::sink::{AudioTrackConfig, EncodedVideo, FrameTiming, SinkConfig};
use crate::foundation::core::{FrameIndex, VideoConfig};
use crate::foundation::error::{StoryVideoError, StoryVideoResult};
use crate::render::frame::FrameRenderer;

/// Progress share reserved for rendering when an audio track follows.
const RENDER_SPAN_WITH_AUDIO: f64 = 0.8;
/// Progress share reserved for rendering in a video-only output.
const RENDER_SPAN_VIDEO_ONLY: f64 = 0.9;
/// Reported right before the container is finalized.
const FINALIZE_PROGRESS: f64 = 0.95;
const LOG_EVERY_FRAMES: u64 = 50;

/// Which part of encoding a progress value belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodeStage {
    /// Frames are being rendered and submitted.
    Rendering,
    /// Audio flush and container finalization.
    Finalizing,
}

/// `ceil(duration * fps)` for the given track.
pub fn total_frames(audio: &DecodedAudio, config: &VideoConfig) -> u64 {
    config.frames_for_samples(audio.len() as u64, audio.sample_rate())
}

/// Render every frame of the clip and encode it together with `audio`.
///
/// Codec negotiation runs first, so an [`StoryVideoError::UnsupportedPlatform`] is returned before
/// `progress` is ever called. Any later failure is a [`StoryVideoError::VideoCompilation`].
#[tracing::instrument(skip_all, fields(width = config.width, height = config.height, fps = config.fps))]
pub fn encode_story(
    renderer: &mut FrameRenderer,
    audio: &DecodedAudio,
    config: &VideoConfig,
    backend: &dyn EncoderBackend,
    cancel: Option<&AtomicBool>,
    progress: &mut dyn FnMut(EncodeStage, f64),
) -> StoryVideoResult<EncodedVideo> {
    encode_story_inner(renderer, audio, config, backend, cancel, progress)
        .map_err(StoryVideoError::into_compilation)
}

fn encode_story_inner(
    renderer: &mut FrameRenderer,
    audio: &DecodedAudio,
    config: &VideoConfig,
    backend: &dyn EncoderBackend,
    cancel: Option<&AtomicBool>,
    progress: &mut dyn FnMut(EncodeStage, f64),
) -> StoryVideoResult<EncodedVideo> {
    if audio.is_empty() {
        return Err(StoryVideoError::compilation("audio track is empty"));
    }
    let channels = u16::try_from(audio.number_of_channels())
        .map_err(|_| StoryVideoError::compilation("too many audio channels"))?;
    // The mixed track may carry fewer channels than configured (mono narration stays mono).
    let track_config = VideoConfig {
        audio_channels: channels.min(config.audio_channels),
        ..config.clone()
    };

    let codecs = negotiate_codecs(backend.probe(), &track_config)?;
    let total = total_frames(audio, &track_config);
    tracing::info!(
        total_frames = total,
        duration_secs = audio.duration_secs(),
        "encoding story"
    );

    let audio_track = codecs.audio.map(|codec| AudioTrackConfig {
        codec,
        sample_rate: track_config.audio_sample_rate,
        channels: track_config.audio_channels,
        bitrate: track_config.audio_bitrate,
    });
    let render_span = if audio_track.is_some() {
        RENDER_SPAN_WITH_AUDIO
    } else {
        RENDER_SPAN_VIDEO_ONLY
    };

    let mut sink = backend.create_sink(&codecs, &track_config)?;
    sink.begin(SinkConfig {
        width: track_config.width,
        height: track_config.height,
        fps: track_config.fps,
        container: codecs.container,
        video_codec: codecs.video,
        video_bitrate: track_config.video_bitrate,
        keyframe_interval: track_config.keyframe_interval,
        audio: audio_track.clone(),
    })?;

    let duration_us = track_config.frame_duration_us();
    for i in 0..total {
        if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
            tracing::info!(frame = i, "compile cancelled");
            return Err(StoryVideoError::compilation("cancelled"));
        }
        let idx = FrameIndex(i);
        let frame = renderer.render_frame(idx, total, track_config.frame_time_secs(idx))?;
        sink.push_frame(
            FrameTiming {
                index: idx,
                timestamp_us: track_config.frame_timestamp_us(idx),
                duration_us,
            },
            frame,
        )?;
        progress(
            EncodeStage::Rendering,
            render_span * (i as f64) / (total as f64),
        );
        if (i + 1) % LOG_EVERY_FRAMES == 0 {
            tracing::debug!(frame = i + 1, total_frames = total, "frames submitted");
        }
    }
    sink.close_video()?;

    if let Some(track) = &audio_track {
        let track_audio = keep_channels(resample(audio, track.sample_rate)?, track.channels)?;
        sink.push_audio(&track_audio)?;
    }

    progress(EncodeStage::Finalizing, FINALIZE_PROGRESS);
    let encoded = sink.finish()?;
    if encoded.bytes.is_empty() {
        return Err(StoryVideoError::compilation("finalized container is empty"));
    }
    if !encoded.container.matches_signature(&encoded.bytes) {
        tracing::warn!(
            container = encoded.container.extension(),
            "finalized output does not start with the expected container signature"
        );
    }
    progress(EncodeStage::Finalizing, 1.0);
    tracing::info!(
        bytes = encoded.bytes.len(),
        mime = encoded.mime_type(),
        "finalized video"
    );
    Ok(encoded)
}

/// Drop channels beyond `channels`.
fn keep_channels(audio: DecodedAudio, channels: u16) -> StoryVideoResult<DecodedAudio> {
    let keep = usize::from(channels);
    if audio.number_of_channels() <= keep {
        return Ok(audio);
    }
    DecodedAudio::from_planes(audio.sample_rate(), audio.planes()[..keep].to_vec())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/pipeline.rs"]
mod tests;
