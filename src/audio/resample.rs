use rayon::prelude::*;

use crate::audio::pcm::DecodedAudio;
use crate::foundation::error::{StoryVideoError, StoryVideoResult};
use crate::foundation::math::mul_div_ceil;

/// Convert `audio` to `target_rate`.
///
/// Returns the input (sharing its storage) when the rates already match. Otherwise produces a new
/// buffer of `ceil(duration * target_rate)` frames with the same channel count, linearly
/// interpolating between neighbouring source samples.
#[tracing::instrument(skip(audio), fields(source_rate = audio.sample_rate(), frames = audio.len()))]
pub fn resample(audio: &DecodedAudio, target_rate: u32) -> StoryVideoResult<DecodedAudio> {
    if target_rate == 0 {
        return Err(StoryVideoError::invalid_config(
            "resample target rate must be non-zero",
        ));
    }
    let source_rate = audio.sample_rate();
    if source_rate == target_rate {
        return Ok(audio.clone());
    }

    let src_len = audio.len();
    let out_len = mul_div_ceil(src_len as u64, u64::from(target_rate), u64::from(source_rate));
    let out_len = usize::try_from(out_len)
        .map_err(|_| StoryVideoError::compilation("resampled audio is too long"))?;
    let step = f64::from(source_rate) / f64::from(target_rate);

    let planes: Vec<Vec<f32>> = audio
        .planes()
        .par_iter()
        .map(|src| resample_plane(src, out_len, step))
        .collect();

    tracing::debug!(target_rate, out_len, "resampled audio");
    DecodedAudio::from_planes(target_rate, planes)
}

fn resample_plane(src: &[f32], out_len: usize, step: f64) -> Vec<f32> {
    if src.is_empty() {
        return vec![0.0; out_len];
    }
    let last = src.len() - 1;
    (0..out_len)
        .map(|j| {
            let pos = (j as f64) * step;
            let i0 = (pos.floor() as usize).min(last);
            let i1 = (i0 + 1).min(last);
            let frac = (pos - i0 as f64).clamp(0.0, 1.0) as f32;
            let v0 = src[i0];
            let v1 = src[i1];
            v0 + (v1 - v0) * frac
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/audio/resample.rs"]
mod tests;
