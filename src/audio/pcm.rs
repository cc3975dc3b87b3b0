use std::path::Path;
use std::sync::Arc;

use crate::foundation::error::{StoryVideoError, StoryVideoResult};

/// Decoded, planar PCM audio.
///
/// Sample data is shared behind an [`Arc`] and never mutated after construction; operations that
/// change the audio (resampling, mixing) return a new value.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedAudio {
    sample_rate: u32,
    channels: Arc<Vec<Vec<f32>>>,
}

impl DecodedAudio {
    /// Build from per-channel sample planes. All planes must have the same length.
    pub fn from_planes(sample_rate: u32, planes: Vec<Vec<f32>>) -> StoryVideoResult<Self> {
        if sample_rate == 0 {
            return Err(StoryVideoError::audio_decode("sample rate must be non-zero"));
        }
        let Some(first) = planes.first() else {
            return Err(StoryVideoError::audio_decode(
                "audio must have at least one channel",
            ));
        };
        let len = first.len();
        if planes.iter().any(|p| p.len() != len) {
            return Err(StoryVideoError::audio_decode(
                "audio channel planes have different lengths",
            ));
        }
        Ok(Self {
            sample_rate,
            channels: Arc::new(planes),
        })
    }

    /// Build from interleaved samples (`frame0_ch0, frame0_ch1, ...`).
    pub fn from_interleaved(
        sample_rate: u32,
        channels: u16,
        interleaved: &[f32],
    ) -> StoryVideoResult<Self> {
        let ch = usize::from(channels);
        if ch == 0 {
            return Err(StoryVideoError::audio_decode(
                "audio must have at least one channel",
            ));
        }
        if !interleaved.len().is_multiple_of(ch) {
            return Err(StoryVideoError::audio_decode(
                "interleaved sample count is not a multiple of the channel count",
            ));
        }
        let frames = interleaved.len() / ch;
        let mut planes = vec![Vec::with_capacity(frames); ch];
        for frame in interleaved.chunks_exact(ch) {
            for (plane, &s) in planes.iter_mut().zip(frame) {
                plane.push(s);
            }
        }
        Self::from_planes(sample_rate, planes)
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels.
    pub fn number_of_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of sample frames (samples per channel).
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// `true` when there are no sample frames.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        (self.len() as f64) / f64::from(self.sample_rate)
    }

    /// Borrow one channel plane.
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    /// Borrow all channel planes.
    pub fn planes(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Interleave the planes into a single `frame0_ch0, frame0_ch1, ...` buffer.
    pub fn interleaved(&self) -> Vec<f32> {
        let ch = self.number_of_channels();
        let mut out = Vec::with_capacity(self.len() * ch);
        for i in 0..self.len() {
            for plane in self.channels.iter() {
                out.push(plane[i]);
            }
        }
        out
    }

    /// `true` when both values share the same sample storage.
    pub fn shares_storage_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.channels, &other.channels)
    }
}

/// Write interleaved samples as raw little-endian `f32` (the muxer's audio input format).
pub fn write_f32le_file(audio: &DecodedAudio, out_path: &Path) -> StoryVideoResult<()> {
    let interleaved = audio.interleaved();
    let mut bytes = Vec::<u8>::with_capacity(interleaved.len() * 4);
    for sample in interleaved {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        StoryVideoError::compilation(format!(
            "failed to write audio stream '{}': {e}",
            out_path.display()
        ))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/audio/pcm.rs"]
mod tests;
