use crate::encode::codec::{CodecProbe, FfmpegCodecProbe, NegotiatedCodecs};
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::encode::sink::FrameSink;
use crate::foundation::core::VideoConfig;
use crate::foundation::error::{StoryVideoError, StoryVideoResult};

/// Encoding backend: answers codec queries and builds sinks for the negotiated codecs.
pub trait EncoderBackend: Send + Sync {
    /// Capability probe used for negotiation.
    fn probe(&self) -> &dyn CodecProbe;

    /// A fresh sink for one compile.
    fn create_sink(
        &self,
        codecs: &NegotiatedCodecs,
        config: &VideoConfig,
    ) -> StoryVideoResult<Box<dyn FrameSink>>;
}

/// Backend driving the system `ffmpeg`.
#[derive(Debug, Default)]
pub struct FfmpegBackend {
    probe: FfmpegCodecProbe,
}

impl FfmpegBackend {
    /// Create a backend; ffmpeg is first queried during negotiation.
    pub fn new() -> Self {
        Self::default()
    }
}

impl EncoderBackend for FfmpegBackend {
    fn probe(&self) -> &dyn CodecProbe {
        &self.probe
    }

    fn create_sink(
        &self,
        codecs: &NegotiatedCodecs,
        config: &VideoConfig,
    ) -> StoryVideoResult<Box<dyn FrameSink>> {
        let video = self
            .probe
            .video_encoder(codecs.video, config.width, config.height)
            .ok_or_else(|| {
                StoryVideoError::compilation(format!(
                    "no ffmpeg encoder available for {:?}",
                    codecs.video
                ))
            })?;
        let audio = match codecs.audio {
            Some(codec) => Some(
                self.probe
                    .audio_encoder(codec, config.audio_channels, config.audio_sample_rate)
                    .ok_or_else(|| {
                        StoryVideoError::compilation(format!(
                            "no ffmpeg encoder available for {codec:?}"
                        ))
                    })?
                    .to_owned(),
            ),
            None => None,
        };
        tracing::debug!(video, audio = ?audio, "resolved ffmpeg encoders");
        Ok(Box::new(FfmpegSink::new(FfmpegSinkOpts::new(video, audio))))
    }
}
