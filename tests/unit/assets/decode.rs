use std::io::Cursor;

use super::*;

fn png_bytes(img: image::RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn wav_bytes(spec: hound::WavSpec, write: impl FnOnce(&mut hound::WavWriter<&mut Cursor<Vec<u8>>>)) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut w = hound::WavWriter::new(&mut cursor, spec).unwrap();
        write(&mut w);
        w.finalize().unwrap();
    }
    cursor.into_inner()
}

#[test]
fn decode_image_png_dimensions_and_premul() {
    let img = image::RgbaImage::from_raw(1, 1, vec![100u8, 50, 200, 128]).unwrap();
    let cover = decode_image(&png_bytes(img)).unwrap();
    assert_eq!((cover.width, cover.height), (1, 1));
    assert_eq!(
        cover.rgba8_premul.as_slice(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn decode_image_rejects_garbage_as_image_load() {
    let err = decode_image(b"definitely not an image").unwrap_err();
    assert!(matches!(err, StoryVideoError::ImageLoad(_)));
}

#[test]
fn oversized_cover_is_downscaled_preserving_aspect() {
    let img = image::RgbaImage::from_pixel(MAX_COVER_DIMENSION * 2, 16, image::Rgba([1, 2, 3, 255]));
    let cover = decode_image(&png_bytes(img)).unwrap();
    assert_eq!(cover.width, MAX_COVER_DIMENSION);
    assert_eq!(cover.height, 8);
}

#[test]
fn decode_wav_i16_stereo_normalizes() {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 8_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let bytes = wav_bytes(spec, |w| {
        for s in [16384i16, -16384, i16::MIN, 0] {
            w.write_sample(s).unwrap();
        }
    });
    assert!(is_wav(&bytes));
    let audio = decode_audio(&bytes).unwrap();
    assert_eq!(audio.sample_rate(), 8_000);
    assert_eq!(audio.number_of_channels(), 2);
    assert_eq!(audio.channel(0), &[0.5, -1.0]);
    assert_eq!(audio.channel(1), &[-0.5, 0.0]);
}

#[test]
fn decode_wav_f32_mono() {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 22_050,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let bytes = wav_bytes(spec, |w| {
        for s in [0.25f32, -0.75, 1.0] {
            w.write_sample(s).unwrap();
        }
    });
    let audio = decode_audio(&bytes).unwrap();
    assert_eq!(audio.channel(0), &[0.25, -0.75, 1.0]);
}

#[test]
fn empty_wav_is_a_decode_error() {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let bytes = wav_bytes(spec, |_| {});
    assert!(matches!(
        decode_audio(&bytes).unwrap_err(),
        StoryVideoError::AudioDecode(_)
    ));
}

#[test]
fn empty_payload_is_a_decode_error() {
    assert!(matches!(
        decode_audio(&[]).unwrap_err(),
        StoryVideoError::AudioDecode(_)
    ));
}

#[test]
fn truncated_wav_is_a_decode_error() {
    let err = decode_wav(b"RIFF\x10\x00\x00\x00WAVEfmt ").unwrap_err();
    assert!(matches!(err, StoryVideoError::AudioDecode(_)));
}

#[test]
fn ffmpeg_decode_past_deadline_is_stopped() {
    if !crate::encode::ffmpeg::is_ffmpeg_on_path() {
        return;
    }
    let started = Instant::now();
    let err = decode_audio_until(b"not a wav file", Some(started)).unwrap_err();
    match err {
        StoryVideoError::AudioFetch(msg) => assert!(msg.contains("timed out"), "{msg}"),
        other => panic!("unexpected {other:?}"),
    }
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn no_deadline_keeps_ffmpeg_errors_as_decode_errors() {
    if !crate::encode::ffmpeg::is_ffmpeg_on_path() {
        return;
    }
    let err = decode_audio_until(b"not a wav file", None).unwrap_err();
    assert!(matches!(err, StoryVideoError::AudioDecode(_)), "{err:?}");
}
