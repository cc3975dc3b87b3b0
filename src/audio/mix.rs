use rayon::prelude::*;

use crate::audio::pcm::DecodedAudio;
use crate::audio::resample::resample;
use crate::foundation::error::StoryVideoResult;

/// Narration gain used by [`mix`].
pub const NARRATION_GAIN: f32 = 1.0;
/// Background music gain used by [`mix`].
pub const MUSIC_GAIN: f32 = 0.3;

/// Per-source gains for [`mix_with_gains`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MixGains {
    /// Multiplier applied to narration samples.
    pub narration: f32,
    /// Multiplier applied to background music samples.
    pub music: f32,
}

impl Default for MixGains {
    fn default() -> Self {
        Self {
            narration: NARRATION_GAIN,
            music: MUSIC_GAIN,
        }
    }
}

/// Combine narration and optional background music into one buffer at `target_rate`.
///
/// Narration length is authoritative: the output has exactly as many frames as the resampled
/// narration. Music loops when shorter and is truncated when longer. Without music the narration
/// is only resampled.
pub fn mix(
    narration: &DecodedAudio,
    music: Option<&DecodedAudio>,
    target_rate: u32,
    max_channels: u16,
) -> StoryVideoResult<DecodedAudio> {
    mix_with_gains(
        narration,
        music,
        target_rate,
        max_channels,
        MixGains::default(),
    )
}

/// [`mix`] with explicit gains.
#[tracing::instrument(skip(narration, music), fields(has_music = music.is_some()))]
pub fn mix_with_gains(
    narration: &DecodedAudio,
    music: Option<&DecodedAudio>,
    target_rate: u32,
    max_channels: u16,
    gains: MixGains,
) -> StoryVideoResult<DecodedAudio> {
    let narration = resample(narration, target_rate)?;
    let Some(music) = music else {
        return Ok(narration);
    };
    let music = resample(music, target_rate)?;

    let out_len = narration.len();
    let music_len = music.len();
    let narration_channels = narration.number_of_channels();
    let music_channels = music.number_of_channels();
    let out_channels = usize::from(max_channels)
        .min(narration_channels.max(music_channels))
        .max(1);

    let planes: Vec<Vec<f32>> = (0..out_channels)
        .into_par_iter()
        .map(|c| {
            let voice = narration.channel(c % narration_channels);
            let bed = music.channel(c % music_channels);
            (0..out_len)
                .map(|i| {
                    let v = voice[i] * gains.narration;
                    let m = if music_len == 0 {
                        0.0
                    } else {
                        bed[i % music_len] * gains.music
                    };
                    (v + m).clamp(-1.0, 1.0)
                })
                .collect()
        })
        .collect();

    let loops = if music_len == 0 {
        0.0
    } else {
        out_len as f64 / music_len as f64
    };
    tracing::debug!(
        out_len,
        out_channels,
        music_len,
        loops,
        "mixed narration with background music"
    );
    DecodedAudio::from_planes(target_rate, planes)
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
