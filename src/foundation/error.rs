/// Convenience result type used across storyreel.
pub type StoryVideoResult<T> = Result<T, StoryVideoError>;

/// User-facing error taxonomy.
///
/// Every internal failure is mapped onto exactly one of these kinds before it leaves the crate.
/// The message is meant to be shown to a user as-is.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoryVideoError {
    /// The cover image could not be fetched, timed out, or failed to decode.
    #[error("failed to load image: {0}")]
    ImageLoad(String),

    /// An audio track could not be fetched (network error, timeout, or non-2xx status).
    #[error("failed to fetch audio: {0}")]
    AudioFetch(String),

    /// An audio track was fetched but its container or codec is unsupported or corrupt.
    #[error("failed to decode audio: {0}")]
    AudioDecode(String),

    /// The host cannot encode any video codec the target container accepts.
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// Any failure while rendering, encoding, or finalizing the output.
    #[error("video compilation failed: {0}")]
    VideoCompilation(String),
}

impl StoryVideoError {
    /// Build a [`StoryVideoError::ImageLoad`] value.
    pub fn image_load(msg: impl Into<String>) -> Self {
        Self::ImageLoad(msg.into())
    }

    /// Build a [`StoryVideoError::AudioFetch`] value.
    pub fn audio_fetch(msg: impl Into<String>) -> Self {
        Self::AudioFetch(msg.into())
    }

    /// Build a [`StoryVideoError::AudioDecode`] value.
    pub fn audio_decode(msg: impl Into<String>) -> Self {
        Self::AudioDecode(msg.into())
    }

    /// Build a [`StoryVideoError::UnsupportedPlatform`] value.
    pub fn unsupported_platform(msg: impl Into<String>) -> Self {
        Self::UnsupportedPlatform(msg.into())
    }

    /// Build a [`StoryVideoError::VideoCompilation`] value.
    pub fn compilation(msg: impl Into<String>) -> Self {
        Self::VideoCompilation(msg.into())
    }

    /// Build a [`StoryVideoError::VideoCompilation`] value for rejected configuration.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::VideoCompilation(format!("invalid config: {}", msg.into()))
    }

    /// Re-wrap into [`StoryVideoError::VideoCompilation`], keeping the original diagnostic.
    ///
    /// Errors that already are `VideoCompilation` or `UnsupportedPlatform` pass through unchanged.
    pub fn into_compilation(self) -> Self {
        match self {
            Self::VideoCompilation(_) | Self::UnsupportedPlatform(_) => self,
            other => Self::VideoCompilation(other.to_string()),
        }
    }

    /// The bare message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::ImageLoad(m)
            | Self::AudioFetch(m)
            | Self::AudioDecode(m)
            | Self::UnsupportedPlatform(m)
            | Self::VideoCompilation(m) => m,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
