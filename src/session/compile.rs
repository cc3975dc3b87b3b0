use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::assets::decode::CoverImage;
use crate::assets::loader::{AssetLoader, LoaderConfig};
use crate::audio::mix::mix;
use crate::audio::pcm::DecodedAudio;
use crate::encode::backend::{EncoderBackend, FfmpegBackend};
use crate::encode::pipeline::{EncodeStage, encode_story};
use crate::encode::sink::EncodedVideo;
use crate::foundation::core::VideoConfig;
use crate::foundation::error::{StoryVideoError, StoryVideoResult};
use crate::render::frame::{FrameRenderer, RenderOptions, StoryScene};
use crate::session::progress::{CompilePhase, ProgressCallback, ProgressReporter};

/// What happens when the optional background music cannot be fetched or decoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MusicFailurePolicy {
    /// Fail the whole compile with the music error.
    #[default]
    Abort,
    /// Log a warning and compile with narration only.
    Skip,
}

/// Everything that configures one compile.
#[derive(Clone, Debug, Default)]
pub struct CompileOptions {
    /// Output settings.
    pub video: VideoConfig,
    /// Visual toggles.
    pub render: RenderOptions,
    /// Fetch timeouts and HTTP settings.
    pub loader: LoaderConfig,
    /// Background music failure handling.
    pub music_failure: MusicFailurePolicy,
    /// Set to `true` to stop the compile before the next frame.
    pub cancel: Option<Arc<AtomicBool>>,
}

/// Asset locations for one story video.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoryVideoRequest {
    /// Cover image URL.
    pub cover_image_url: String,
    /// Narration audio URL; its duration sets the video length.
    pub narration_url: String,
    /// Optional background music URL.
    pub music_url: Option<String>,
}

impl StoryVideoRequest {
    /// Request without background music.
    pub fn new(cover_image_url: impl Into<String>, narration_url: impl Into<String>) -> Self {
        Self {
            cover_image_url: cover_image_url.into(),
            narration_url: narration_url.into(),
            music_url: None,
        }
    }

    /// Add background music.
    pub fn with_music(mut self, music_url: impl Into<String>) -> Self {
        self.music_url = Some(music_url.into());
        self
    }
}

/// Compiles story videos. Each [`StoryVideoCompiler::compile`] call owns its own surface and
/// encoder, so independent calls may run concurrently.
pub struct StoryVideoCompiler {
    options: CompileOptions,
    loader: AssetLoader,
    backend: Arc<dyn EncoderBackend>,
}

impl StoryVideoCompiler {
    /// Compiler encoding through the system `ffmpeg`.
    pub fn new(options: CompileOptions) -> StoryVideoResult<Self> {
        Self::with_backend(options, Arc::new(FfmpegBackend::new()))
    }

    /// Compiler encoding through `backend`.
    pub fn with_backend(
        options: CompileOptions,
        backend: Arc<dyn EncoderBackend>,
    ) -> StoryVideoResult<Self> {
        options.video.validate()?;
        let loader = AssetLoader::new(options.loader.clone())?;
        Ok(Self {
            options,
            loader,
            backend,
        })
    }

    /// Active options.
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Load the assets, mix the audio, render, and encode.
    ///
    /// `progress` receives non-decreasing values in `[0, 1]`, ending at exactly `1.0` on success.
    /// Nothing is reported after a failure, and an unsupported platform fails before the first
    /// report.
    #[tracing::instrument(skip_all, fields(cover = %request.cover_image_url, narration = %request.narration_url))]
    pub async fn compile(
        &self,
        request: &StoryVideoRequest,
        progress: Option<ProgressCallback>,
    ) -> StoryVideoResult<EncodedVideo> {
        let mut reporter = ProgressReporter::new(progress);
        reporter.enter(CompilePhase::LoadingAssets);

        let loaded = self.load_assets(request).await;
        let (cover, narration, music) = match loaded {
            Ok(assets) => assets,
            Err(e) => {
                reporter.fail();
                return Err(e);
            }
        };
        if self.is_cancelled() {
            reporter.fail();
            return Err(StoryVideoError::compilation("cancelled"));
        }

        let job = RenderJob {
            cover,
            narration,
            music,
            video: self.options.video.clone(),
            render: self.options.render.clone(),
            backend: Arc::clone(&self.backend),
            cancel: self.options.cancel.clone(),
        };
        let joined = tokio::task::spawn_blocking(move || {
            let result = job.run(&mut reporter);
            match &result {
                Ok(_) => reporter.complete(),
                Err(_) => reporter.fail(),
            }
            result
        })
        .await;

        match joined {
            Ok(result) => result,
            Err(e) => Err(StoryVideoError::compilation(format!(
                "render task failed: {e}"
            ))),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.options
            .cancel
            .as_ref()
            .is_some_and(|c| c.load(Ordering::Relaxed))
    }

    async fn load_assets(
        &self,
        request: &StoryVideoRequest,
    ) -> StoryVideoResult<(CoverImage, DecodedAudio, Option<DecodedAudio>)> {
        let rate = self.options.video.audio_sample_rate;
        let music = async {
            let Some(url) = request.music_url.as_deref() else {
                return Ok(None);
            };
            match self.loader.load_and_decode_audio(url, rate).await {
                Ok(audio) => Ok(Some(audio)),
                Err(e) if self.options.music_failure == MusicFailurePolicy::Skip => {
                    tracing::warn!(error = %e, "skipping background music");
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        };
        tokio::try_join!(
            self.loader.load_image(&request.cover_image_url),
            self.loader.load_and_decode_audio(&request.narration_url, rate),
            music,
        )
    }
}

/// The CPU-bound half of a compile, run off the async runtime.
struct RenderJob {
    cover: CoverImage,
    narration: DecodedAudio,
    music: Option<DecodedAudio>,
    video: VideoConfig,
    render: RenderOptions,
    backend: Arc<dyn EncoderBackend>,
    cancel: Option<Arc<AtomicBool>>,
}

impl RenderJob {
    fn run(self, reporter: &mut ProgressReporter) -> StoryVideoResult<EncodedVideo> {
        reporter.enter(CompilePhase::Mixing);
        let mixed = mix(
            &self.narration,
            self.music.as_ref(),
            self.video.audio_sample_rate,
            self.video.audio_channels,
        )
        .map_err(StoryVideoError::into_compilation)?;

        reporter.enter(CompilePhase::Rendering);
        let scene = StoryScene::new(
            self.cover.width,
            self.cover.height,
            self.video.canvas(),
            self.render,
        );
        tracing::info!(
            path = ?scene.path,
            particles = scene.particles.len(),
            "scene prepared"
        );
        let mut renderer =
            FrameRenderer::new(&self.cover, scene).map_err(StoryVideoError::into_compilation)?;

        encode_story(
            &mut renderer,
            &mixed,
            &self.video,
            self.backend.as_ref(),
            self.cancel.as_deref(),
            &mut |stage, value| {
                if stage == EncodeStage::Finalizing {
                    reporter.enter(CompilePhase::Finalizing);
                }
                reporter.report(value);
            },
        )
    }
}

/// Compile a story video with `options`, encoding through the system `ffmpeg`.
pub async fn compile_story_video(
    request: &StoryVideoRequest,
    progress: Option<ProgressCallback>,
    options: CompileOptions,
) -> StoryVideoResult<EncodedVideo> {
    StoryVideoCompiler::new(options)?
        .compile(request, progress)
        .await
}

#[cfg(test)]
#[path = "../../tests/unit/session/compile.rs"]
mod tests;
