use std::collections::{BTreeSet, HashMap};
use std::process::{Command, Stdio};
use std::sync::{Mutex, OnceLock};

use crate::foundation::core::{ContainerFormat, VideoConfig};
use crate::foundation::error::{StoryVideoError, StoryVideoResult};

/// Video codecs the pipeline knows how to request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VideoCodec {
    /// H.264 / AVC.
    H264,
    /// H.265 / HEVC.
    Hevc,
    /// VP8.
    Vp8,
    /// VP9.
    Vp9,
    /// AV1.
    Av1,
}

/// Audio codecs the pipeline knows how to request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AudioCodec {
    /// AAC-LC.
    Aac,
    /// Opus.
    Opus,
    /// Vorbis.
    Vorbis,
}

impl VideoCodec {
    /// ffmpeg encoders that produce this codec, most preferred first.
    pub fn ffmpeg_encoders(self) -> &'static [&'static str] {
        match self {
            Self::H264 => &["libx264", "libopenh264"],
            Self::Hevc => &["libx265"],
            Self::Vp8 => &["libvpx"],
            Self::Vp9 => &["libvpx-vp9"],
            Self::Av1 => &["libsvtav1", "libaom-av1", "librav1e"],
        }
    }
}

impl AudioCodec {
    /// ffmpeg encoders that produce this codec, most preferred first.
    pub fn ffmpeg_encoders(self) -> &'static [&'static str] {
        match self {
            Self::Aac => &["aac", "libfdk_aac"],
            Self::Opus => &["libopus", "opus"],
            Self::Vorbis => &["libvorbis", "vorbis"],
        }
    }
}

impl ContainerFormat {
    /// Video codecs this container accepts, in negotiation order.
    pub fn video_codecs(self) -> &'static [VideoCodec] {
        match self {
            Self::Mp4 => &[
                VideoCodec::H264,
                VideoCodec::Hevc,
                VideoCodec::Vp9,
                VideoCodec::Av1,
            ],
            Self::WebM => &[VideoCodec::Vp9, VideoCodec::Av1, VideoCodec::Vp8],
        }
    }

    /// Audio codecs this container accepts, in negotiation order.
    pub fn audio_codecs(self) -> &'static [AudioCodec] {
        match self {
            Self::Mp4 => &[AudioCodec::Aac, AudioCodec::Opus],
            Self::WebM => &[AudioCodec::Opus, AudioCodec::Vorbis],
        }
    }
}

/// Answers whether the host can encode a given codec configuration.
pub trait CodecProbe: Send + Sync {
    /// Whether `codec` can encode `width x height` frames.
    fn can_encode_video(&self, codec: VideoCodec, width: u32, height: u32) -> bool;
    /// Whether `codec` can encode `channels` channels at `sample_rate`.
    fn can_encode_audio(&self, codec: AudioCodec, channels: u16, sample_rate: u32) -> bool;
}

/// Probe with a fixed answer set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StaticCodecProbe {
    /// Encodable video codecs.
    pub video: BTreeSet<VideoCodec>,
    /// Encodable audio codecs.
    pub audio: BTreeSet<AudioCodec>,
}

impl StaticCodecProbe {
    /// A probe that accepts exactly the listed codecs.
    pub fn new(
        video: impl IntoIterator<Item = VideoCodec>,
        audio: impl IntoIterator<Item = AudioCodec>,
    ) -> Self {
        Self {
            video: video.into_iter().collect(),
            audio: audio.into_iter().collect(),
        }
    }
}

impl CodecProbe for StaticCodecProbe {
    fn can_encode_video(&self, codec: VideoCodec, _width: u32, _height: u32) -> bool {
        self.video.contains(&codec)
    }

    fn can_encode_audio(&self, codec: AudioCodec, _channels: u16, _sample_rate: u32) -> bool {
        self.audio.contains(&codec)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum TrialKey {
    Video(VideoCodec, u32, u32),
    Audio(AudioCodec, u16, u32),
}

/// Probe backed by the system `ffmpeg`.
///
/// The encoder list (`ffmpeg -encoders`) is read once. A codec counts as available only when one of
/// its encoders is listed and a short trial encode with the requested parameters succeeds; trial
/// results are cached per parameter set.
#[derive(Debug, Default)]
pub struct FfmpegCodecProbe {
    encoders: OnceLock<BTreeSet<String>>,
    trials: Mutex<HashMap<TrialKey, Option<&'static str>>>,
}

impl FfmpegCodecProbe {
    /// Create a probe; nothing is run until the first query.
    pub fn new() -> Self {
        Self::default()
    }

    fn listed_encoders(&self) -> &BTreeSet<String> {
        self.encoders.get_or_init(|| {
            let listed = list_ffmpeg_encoders();
            tracing::debug!(count = listed.len(), "listed ffmpeg encoders");
            listed
        })
    }

    fn cached_trial(
        &self,
        key: TrialKey,
        candidates: &'static [&'static str],
        trial: impl Fn(&str) -> bool,
    ) -> Option<&'static str> {
        if let Ok(cache) = self.trials.lock()
            && let Some(hit) = cache.get(&key)
        {
            return *hit;
        }
        let listed = self.listed_encoders();
        let found = candidates
            .iter()
            .copied()
            .filter(|name| listed.contains(*name))
            .find(|name| trial(name));
        if let Ok(mut cache) = self.trials.lock() {
            cache.insert(key, found);
        }
        found
    }

    /// The ffmpeg encoder that passed the trial for this video configuration.
    pub fn video_encoder(&self, codec: VideoCodec, width: u32, height: u32) -> Option<&'static str> {
        self.cached_trial(
            TrialKey::Video(codec, width, height),
            codec.ffmpeg_encoders(),
            |name| trial_encode_video(name, width, height),
        )
    }

    /// The ffmpeg encoder that passed the trial for this audio configuration.
    pub fn audio_encoder(
        &self,
        codec: AudioCodec,
        channels: u16,
        sample_rate: u32,
    ) -> Option<&'static str> {
        self.cached_trial(
            TrialKey::Audio(codec, channels, sample_rate),
            codec.ffmpeg_encoders(),
            |name| trial_encode_audio(name, channels, sample_rate),
        )
    }
}

impl CodecProbe for FfmpegCodecProbe {
    fn can_encode_video(&self, codec: VideoCodec, width: u32, height: u32) -> bool {
        self.video_encoder(codec, width, height).is_some()
    }

    fn can_encode_audio(&self, codec: AudioCodec, channels: u16, sample_rate: u32) -> bool {
        self.audio_encoder(codec, channels, sample_rate).is_some()
    }
}

fn list_ffmpeg_encoders() -> BTreeSet<String> {
    let out = Command::new("ffmpeg")
        .args(["-hide_banner", "-nostdin", "-encoders"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output();
    match out {
        Ok(out) if out.status.success() => parse_encoder_list(&String::from_utf8_lossy(&out.stdout)),
        Ok(out) => {
            tracing::warn!(status = %out.status, "ffmpeg -encoders failed");
            BTreeSet::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, "ffmpeg is not available");
            BTreeSet::new()
        }
    }
}

/// Encoder names from `ffmpeg -encoders` output (the table after the `------` separator).
pub(crate) fn parse_encoder_list(stdout: &str) -> BTreeSet<String> {
    stdout
        .lines()
        .skip_while(|line| !line.trim_start().starts_with("------"))
        .skip(1)
        .filter_map(|line| line.split_whitespace().nth(1))
        .map(str::to_owned)
        .collect()
}

fn run_trial(args: &[&str]) -> bool {
    Command::new("ffmpeg")
        .args(["-hide_banner", "-nostdin", "-v", "error"])
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn trial_encode_video(encoder: &str, width: u32, height: u32) -> bool {
    let source = format!("color=c=black:s={width}x{height}:r=1");
    run_trial(&[
        "-f", "lavfi", "-i", &source, "-frames:v", "1", "-c:v", encoder, "-pix_fmt", "yuv420p",
        "-f", "null", "-",
    ])
}

fn trial_encode_audio(encoder: &str, channels: u16, sample_rate: u32) -> bool {
    let source = format!("anullsrc=r={sample_rate}");
    let channels = channels.to_string();
    let rate = sample_rate.to_string();
    run_trial(&[
        "-f", "lavfi", "-i", &source, "-t", "0.1", "-ac", &channels, "-ar", &rate, "-c:a",
        encoder, "-f", "null", "-",
    ])
}

/// Codecs chosen for one compile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NegotiatedCodecs {
    /// Output container.
    pub container: ContainerFormat,
    /// Video codec (always present).
    pub video: VideoCodec,
    /// Audio codec, or `None` for a video-only output.
    pub audio: Option<AudioCodec>,
}

/// Pick the first encodable video and audio codec in the container's order.
///
/// No video codec is fatal ([`StoryVideoError::UnsupportedPlatform`]). No audio codec degrades to
/// a video-only output with a warning.
pub fn negotiate_codecs(
    probe: &dyn CodecProbe,
    config: &VideoConfig,
) -> StoryVideoResult<NegotiatedCodecs> {
    let container = config.container;
    let video = container
        .video_codecs()
        .iter()
        .copied()
        .find(|&c| probe.can_encode_video(c, config.width, config.height))
        .ok_or_else(|| {
            StoryVideoError::unsupported_platform(format!(
                "no encodable video codec for {} output (tried {:?}); \
                 install ffmpeg 4.4 or newer built with libx264 or libvpx",
                container.extension(),
                container.video_codecs()
            ))
        })?;

    let audio = container
        .audio_codecs()
        .iter()
        .copied()
        .find(|&c| probe.can_encode_audio(c, config.audio_channels, config.audio_sample_rate));
    if audio.is_none() {
        tracing::warn!(
            container = container.extension(),
            tried = ?container.audio_codecs(),
            "no encodable audio codec; output will be video-only"
        );
    }

    tracing::info!(?video, ?audio, container = container.extension(), "negotiated codecs");
    Ok(NegotiatedCodecs {
        container,
        video,
        audio,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/encode/codec.rs"]
mod tests;
