use std::io::Cursor;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;

use crate::audio::pcm::DecodedAudio;
use crate::foundation::error::{StoryVideoError, StoryVideoResult};

/// Largest cover edge kept after decoding; bigger images are downscaled to fit.
pub const MAX_COVER_DIMENSION: u32 = 4096;

/// A decoded cover image ready to upload as a paint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoverImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8 pixels, row-major.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Decode encoded image bytes (PNG, JPEG, WebP, ...) into a premultiplied [`CoverImage`].
pub fn decode_image(bytes: &[u8]) -> StoryVideoResult<CoverImage> {
    decode_image_inner(bytes).map_err(|e| StoryVideoError::image_load(format!("{e:#}")))
}

fn decode_image_inner(bytes: &[u8]) -> anyhow::Result<CoverImage> {
    let mut dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    if dyn_img.width() == 0 || dyn_img.height() == 0 {
        anyhow::bail!("image has zero width or height");
    }
    if dyn_img.width() > MAX_COVER_DIMENSION || dyn_img.height() > MAX_COVER_DIMENSION {
        dyn_img = dyn_img.resize(
            MAX_COVER_DIMENSION,
            MAX_COVER_DIMENSION,
            image::imageops::FilterType::Triangle,
        );
    }
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(CoverImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[..3].fill(0);
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * a + 127) / 255) as u8;
        }
    }
}

/// `true` for RIFF/WAVE bytes.
pub fn is_wav(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

/// Decode an encoded audio file into PCM at its native sample rate.
///
/// WAV is decoded in-process. Other containers are handed to the system `ffmpeg`, which converts
/// them into a float WAV inside a temporary directory that is removed when decoding returns.
pub fn decode_audio(bytes: &[u8]) -> StoryVideoResult<DecodedAudio> {
    decode_audio_until(bytes, None)
}

/// Like [`decode_audio`], but an `ffmpeg` conversion still running at `deadline` is killed and
/// reported as [`StoryVideoError::AudioFetch`], the same kind the loader uses for its timeout.
#[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
pub fn decode_audio_until(
    bytes: &[u8],
    deadline: Option<Instant>,
) -> StoryVideoResult<DecodedAudio> {
    if bytes.is_empty() {
        return Err(StoryVideoError::audio_decode("audio payload is empty"));
    }
    let audio = if is_wav(bytes) {
        decode_wav(bytes)?
    } else {
        decode_with_ffmpeg(bytes, deadline)?
    };
    if audio.is_empty() {
        return Err(StoryVideoError::audio_decode("audio contains no samples"));
    }
    tracing::debug!(
        sample_rate = audio.sample_rate(),
        channels = audio.number_of_channels(),
        frames = audio.len(),
        "decoded audio"
    );
    Ok(audio)
}

/// Decode RIFF/WAVE bytes (8/16/24/32-bit integer or 32-bit float PCM).
pub fn decode_wav(bytes: &[u8]) -> StoryVideoResult<DecodedAudio> {
    let reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| StoryVideoError::audio_decode(format!("invalid wav: {e}")))?;
    read_wav(reader)
}

fn read_wav<R: std::io::Read>(reader: hound::WavReader<R>) -> StoryVideoResult<DecodedAudio> {
    let spec = reader.spec();
    let samples: Result<Vec<f32>, hound::Error> = match (spec.sample_format, spec.bits_per_sample)
    {
        (hound::SampleFormat::Float, 32) => reader.into_samples::<f32>().collect(),
        (hound::SampleFormat::Int, bits @ 1..=32) => {
            let scale = 1.0 / (1u64 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect()
        }
        (format, bits) => {
            return Err(StoryVideoError::audio_decode(format!(
                "unsupported wav sample format {format:?} at {bits} bits"
            )));
        }
    };
    let samples =
        samples.map_err(|e| StoryVideoError::audio_decode(format!("corrupt wav data: {e}")))?;
    DecodedAudio::from_interleaved(spec.sample_rate, spec.channels, &samples)
}

fn decode_with_ffmpeg(bytes: &[u8], deadline: Option<Instant>) -> StoryVideoResult<DecodedAudio> {
    let dir = tempfile::Builder::new()
        .prefix("storyreel-decode-")
        .tempdir()
        .map_err(|e| StoryVideoError::audio_decode(format!("failed to create temp dir: {e}")))?;
    let input = dir.path().join("input.bin");
    let output = dir.path().join("decoded.wav");
    let log = dir.path().join("ffmpeg.log");
    std::fs::write(&input, bytes)
        .map_err(|e| StoryVideoError::audio_decode(format!("failed to stage audio: {e}")))?;

    transcode_to_float_wav(&input, &output, &log, deadline)?;

    let reader = hound::WavReader::open(&output)
        .map_err(|e| StoryVideoError::audio_decode(format!("invalid decoded wav: {e}")))?;
    read_wav(reader)
}

const TRANSCODE_POLL: Duration = Duration::from_millis(10);

fn transcode_to_float_wav(
    input: &Path,
    output: &Path,
    log: &Path,
    deadline: Option<Instant>,
) -> StoryVideoResult<()> {
    let stderr = std::fs::File::create(log)
        .map_err(|e| StoryVideoError::audio_decode(format!("failed to create ffmpeg log: {e}")))?;
    let mut child = Command::new("ffmpeg")
        .args(["-hide_banner", "-v", "error", "-nostdin", "-y", "-i"])
        .arg(input)
        .args(["-vn", "-f", "wav", "-acodec", "pcm_f32le"])
        .arg(output)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(stderr)
        .spawn()
        .map_err(|e| {
            StoryVideoError::audio_decode(format!(
                "unsupported audio container (no wav header and ffmpeg unavailable: {e})"
            ))
        })?;

    let status = loop {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            let _ = child.kill();
            let _ = child.wait();
            tracing::warn!("killed ffmpeg audio decode past its deadline");
            return Err(StoryVideoError::audio_fetch(
                "audio decode timed out; ffmpeg was stopped",
            ));
        }
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => std::thread::sleep(TRANSCODE_POLL),
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(StoryVideoError::audio_decode(format!(
                    "failed to wait for ffmpeg: {e}"
                )));
            }
        }
    };
    if !status.success() {
        let stderr = std::fs::read_to_string(log).unwrap_or_default();
        return Err(StoryVideoError::audio_decode(format!(
            "ffmpeg could not decode audio: {}",
            stderr.trim()
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
