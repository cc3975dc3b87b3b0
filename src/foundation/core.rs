use crate::foundation::error::{StoryVideoError, StoryVideoResult};
use crate::foundation::math::{mul_div_ceil, mul_div_round};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Zero-based index of a rendered frame.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Output raster size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Width over height.
    pub fn aspect(self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    /// `width * height`.
    pub fn area(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Output container family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    /// ISO BMFF / MP4.
    #[default]
    Mp4,
    /// Matroska-based WebM.
    WebM,
}

impl ContainerFormat {
    /// MIME type attached to finalized output.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::WebM => "video/webm",
        }
    }

    /// File extension (without the dot).
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::WebM => "webm",
        }
    }

    /// Container for a file extension (`mp4`, `m4v`, or `webm`, any case).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mp4" | "m4v" => Some(Self::Mp4),
            "webm" => Some(Self::WebM),
            _ => None,
        }
    }

    /// Whether `bytes` start with this container's signature.
    pub fn matches_signature(self, bytes: &[u8]) -> bool {
        match self {
            Self::Mp4 => bytes.len() >= 8 && &bytes[4..8] == b"ftyp",
            Self::WebM => bytes.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]),
        }
    }
}

/// Per-compile output settings.
///
/// Defaults match a 720p, 24 fps story video with stereo 48 kHz audio.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Output width in pixels (even).
    pub width: u32,
    /// Output height in pixels (even).
    pub height: u32,
    /// Integer frames per second.
    pub fps: u32,
    /// Target video bitrate in bits per second.
    pub video_bitrate: u32,
    /// Target audio bitrate in bits per second.
    pub audio_bitrate: u32,
    /// Audio track sample rate in Hz.
    pub audio_sample_rate: u32,
    /// Audio track channel count.
    pub audio_channels: u16,
    /// Maximum distance between keyframes, in frames.
    pub keyframe_interval: u32,
    /// Output container.
    pub container: ContainerFormat,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 24,
            video_bitrate: 8_000_000,
            audio_bitrate: 128_000,
            audio_sample_rate: 48_000,
            audio_channels: 2,
            keyframe_interval: 150,
            container: ContainerFormat::Mp4,
        }
    }
}

impl VideoConfig {
    /// Reject values the renderer or the encoder cannot work with.
    pub fn validate(&self) -> StoryVideoResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(StoryVideoError::invalid_config(
                "width/height must be non-zero",
            ));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(StoryVideoError::invalid_config(
                "width/height must be even (required for yuv420p output)",
            ));
        }
        if self.width > u32::from(u16::MAX) || self.height > u32::from(u16::MAX) {
            return Err(StoryVideoError::invalid_config(format!(
                "width/height must be <= {}",
                u16::MAX
            )));
        }
        if self.fps == 0 {
            return Err(StoryVideoError::invalid_config("fps must be non-zero"));
        }
        if self.video_bitrate == 0 || self.audio_bitrate == 0 {
            return Err(StoryVideoError::invalid_config(
                "bitrates must be non-zero",
            ));
        }
        if self.audio_sample_rate == 0 {
            return Err(StoryVideoError::invalid_config(
                "audio_sample_rate must be non-zero",
            ));
        }
        if self.audio_channels == 0 {
            return Err(StoryVideoError::invalid_config(
                "audio_channels must be non-zero",
            ));
        }
        if self.keyframe_interval == 0 {
            return Err(StoryVideoError::invalid_config(
                "keyframe_interval must be non-zero",
            ));
        }
        Ok(())
    }

    /// Output raster size.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Frame duration in microseconds, rounded to the nearest microsecond.
    pub fn frame_duration_us(&self) -> u64 {
        mul_div_round(1, 1_000_000, u64::from(self.fps))
    }

    /// Presentation timestamp of `frame` in microseconds.
    pub fn frame_timestamp_us(&self, frame: FrameIndex) -> u64 {
        mul_div_round(frame.0, 1_000_000, u64::from(self.fps))
    }

    /// Presentation time of `frame` in seconds.
    pub fn frame_time_secs(&self, frame: FrameIndex) -> f64 {
        (frame.0 as f64) / f64::from(self.fps)
    }

    /// Number of frames covering `sample_frames` audio frames at `sample_rate`:
    /// `ceil(duration * fps)`.
    pub fn frames_for_samples(&self, sample_frames: u64, sample_rate: u32) -> u64 {
        mul_div_ceil(sample_frames, u64::from(self.fps), u64::from(sample_rate))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
