use std::time::Duration;

use crate::assets::decode::{CoverImage, decode_audio_until, decode_image};
use crate::audio::pcm::DecodedAudio;
use crate::audio::resample::resample;
use crate::foundation::error::{StoryVideoError, StoryVideoResult};

/// Network and timeout settings for asset loading.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Upper bound for fetching and decoding the cover image.
    pub image_timeout: Duration,
    /// Upper bound for fetching and decoding one audio track.
    pub audio_timeout: Duration,
    /// `User-Agent` sent with HTTP requests.
    pub user_agent: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            image_timeout: Duration::from_secs(15),
            audio_timeout: Duration::from_secs(60),
            user_agent: concat!("storyreel/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Fetches and decodes cover images and audio tracks from `http(s)://` or `file://` URLs.
///
/// Requests carry no cookies or credentials.
#[derive(Clone, Debug)]
pub struct AssetLoader {
    client: reqwest::Client,
    config: LoaderConfig,
}

impl AssetLoader {
    /// Build a loader with its own HTTP client.
    pub fn new(config: LoaderConfig) -> StoryVideoResult<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| StoryVideoError::compilation(format!("failed to build http client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Active settings.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Fetch and decode the cover image at `url`.
    ///
    /// Any failure, including exceeding [`LoaderConfig::image_timeout`], is an
    /// [`StoryVideoError::ImageLoad`].
    #[tracing::instrument(skip(self))]
    pub async fn load_image(&self, url: &str) -> StoryVideoResult<CoverImage> {
        let limit = self.config.image_timeout;
        let work = async {
            let bytes = self
                .fetch_bytes(url)
                .await
                .map_err(StoryVideoError::image_load)?;
            tokio::task::spawn_blocking(move || decode_image(&bytes))
                .await
                .map_err(|e| StoryVideoError::image_load(format!("decode task failed: {e}")))?
        };
        let image = tokio::time::timeout(limit, work).await.map_err(|_| {
            StoryVideoError::image_load(format!("'{url}' timed out after {limit:?}"))
        })??;
        tracing::info!(width = image.width, height = image.height, "loaded cover image");
        Ok(image)
    }

    /// Fetch and decode the audio track at `url`, resampled to `target_sample_rate`.
    ///
    /// Transport failures, non-2xx responses, and exceeding [`LoaderConfig::audio_timeout`] are
    /// [`StoryVideoError::AudioFetch`]; undecodable payloads are [`StoryVideoError::AudioDecode`].
    #[tracing::instrument(skip(self))]
    pub async fn load_and_decode_audio(
        &self,
        url: &str,
        target_sample_rate: u32,
    ) -> StoryVideoResult<DecodedAudio> {
        let limit = self.config.audio_timeout;
        let deadline = std::time::Instant::now().checked_add(limit);
        let work = async {
            let bytes = self
                .fetch_bytes(url)
                .await
                .map_err(StoryVideoError::audio_fetch)?;
            tokio::task::spawn_blocking(move || {
                let audio = decode_audio_until(&bytes, deadline)?;
                resample(&audio, target_sample_rate)
            })
            .await
            .map_err(|e| StoryVideoError::audio_decode(format!("decode task failed: {e}")))?
        };
        let audio = tokio::time::timeout(limit, work).await.map_err(|_| {
            StoryVideoError::audio_fetch(format!("'{url}' timed out after {limit:?}"))
        })??;
        tracing::info!(
            sample_rate = audio.sample_rate(),
            channels = audio.number_of_channels(),
            duration_secs = audio.duration_secs(),
            "loaded audio track"
        );
        Ok(audio)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, String> {
        let parsed = reqwest::Url::parse(url).map_err(|e| format!("invalid url '{url}': {e}"))?;
        match parsed.scheme() {
            "http" | "https" => {
                let response = self
                    .client
                    .get(parsed)
                    .send()
                    .await
                    .map_err(|e| format!("request to '{url}' failed: {e}"))?;
                if !response.status().is_success() {
                    return Err(format!("'{url}' returned HTTP status {}", response.status()));
                }
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| format!("reading body of '{url}' failed: {e}"))?;
                Ok(body.to_vec())
            }
            "file" => {
                let path = parsed
                    .to_file_path()
                    .map_err(|_| format!("'{url}' is not a local file path"))?;
                tokio::fs::read(&path)
                    .await
                    .map_err(|e| format!("failed to read '{}': {e}", path.display()))
            }
            other => Err(format!("unsupported url scheme '{other}' in '{url}'")),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/loader.rs"]
mod tests;
