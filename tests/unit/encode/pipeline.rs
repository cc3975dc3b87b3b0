use std::sync::{Arc, Mutex};

use super::*;
use crate::assets::decode::CoverImage;
use crate::encode::codec::{AudioCodec, CodecProbe, NegotiatedCodecs, StaticCodecProbe, VideoCodec};
use crate::encode::sink::{FrameSink, InMemorySink};
use crate::render::frame::{RenderOptions, StoryScene};
use crate::render::surface::FrameRGBA;

struct SharedSink(Arc<Mutex<InMemorySink>>);

impl FrameSink for SharedSink {
    fn begin(&mut self, cfg: SinkConfig) -> StoryVideoResult<()> {
        self.0.lock().unwrap().begin(cfg)
    }
    fn push_frame(&mut self, timing: FrameTiming, frame: &FrameRGBA) -> StoryVideoResult<()> {
        self.0.lock().unwrap().push_frame(timing, frame)
    }
    fn close_video(&mut self) -> StoryVideoResult<()> {
        self.0.lock().unwrap().close_video()
    }
    fn push_audio(&mut self, audio: &DecodedAudio) -> StoryVideoResult<()> {
        self.0.lock().unwrap().push_audio(audio)
    }
    fn finish(&mut self) -> StoryVideoResult<EncodedVideo> {
        self.0.lock().unwrap().finish()
    }
}

struct MemoryBackend {
    probe: StaticCodecProbe,
    sink: Arc<Mutex<InMemorySink>>,
}

impl MemoryBackend {
    fn new(probe: StaticCodecProbe) -> Self {
        Self {
            probe,
            sink: Arc::new(Mutex::new(InMemorySink::new())),
        }
    }
}

impl EncoderBackend for MemoryBackend {
    fn probe(&self) -> &dyn CodecProbe {
        &self.probe
    }
    fn create_sink(
        &self,
        _codecs: &NegotiatedCodecs,
        _config: &VideoConfig,
    ) -> StoryVideoResult<Box<dyn FrameSink>> {
        Ok(Box::new(SharedSink(self.sink.clone())))
    }
}

fn small_config() -> VideoConfig {
    VideoConfig {
        width: 16,
        height: 8,
        fps: 24,
        audio_sample_rate: 8_000,
        ..VideoConfig::default()
    }
}

fn renderer(config: &VideoConfig) -> FrameRenderer {
    let cover = CoverImage {
        width: 4,
        height: 4,
        rgba8_premul: Arc::new(vec![128; 64]),
    };
    let scene = StoryScene::new(
        4,
        4,
        config.canvas(),
        RenderOptions {
            seed: Some(1),
            ..RenderOptions::default()
        },
    );
    FrameRenderer::new(&cover, scene).unwrap()
}

fn tone(secs: f64, rate: u32, channels: usize) -> DecodedAudio {
    let n = (secs * f64::from(rate)).round() as usize;
    DecodedAudio::from_planes(rate, vec![vec![0.25; n]; channels]).unwrap()
}

fn full_probe() -> StaticCodecProbe {
    StaticCodecProbe::new([VideoCodec::H264], [AudioCodec::Aac])
}

#[test]
fn five_seconds_at_24fps_is_120_frames() {
    let config = small_config();
    let audio = tone(5.0, 8_000, 2);
    assert_eq!(total_frames(&audio, &config), 120);

    let backend = MemoryBackend::new(full_probe());
    let mut r = renderer(&config);
    let mut seen = Vec::new();
    let out = encode_story(&mut r, &audio, &config, &backend, None, &mut |stage, p| {
        seen.push((stage, p))
    })
    .unwrap();

    let sink = backend.sink.lock().unwrap();
    assert_eq!(sink.frames().len(), 120);
    assert_eq!(sink.frames()[1].0.timestamp_us, 41_667);
    assert_eq!(sink.frames()[119].0.index, FrameIndex(119));
    assert_eq!(sink.audio().unwrap(), &audio);
    assert_eq!(out.audio_codec, Some(AudioCodec::Aac));

    let values: Vec<f64> = seen.iter().map(|(_, p)| *p).collect();
    assert!(values.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(values[0], 0.0);
    assert!((values[119] - 0.8 * 119.0 / 120.0).abs() < 1e-12);
    assert_eq!(seen[120], (EncodeStage::Finalizing, 0.95));
    assert_eq!(*values.last().unwrap(), 1.0);
}

#[test]
fn render_progress_starts_at_zero_and_stays_inside_its_span() {
    let config = small_config();
    // 1.01 s at 24 fps -> 25 frames, with an audio track.
    let audio = tone(1.01, 8_000, 2);
    let total = total_frames(&audio, &config);
    let backend = MemoryBackend::new(full_probe());
    let mut r = renderer(&config);
    let mut rendering = Vec::new();
    encode_story(&mut r, &audio, &config, &backend, None, &mut |stage, p| {
        if stage == EncodeStage::Rendering {
            rendering.push(p);
        }
    })
    .unwrap();

    assert_eq!(rendering.len() as u64, total);
    assert_eq!(rendering[0], 0.0);
    assert!((rendering[1] - 0.8 / total as f64).abs() < 1e-12);
    let last = *rendering.last().unwrap();
    assert!((last - 0.8 * (total - 1) as f64 / total as f64).abs() < 1e-12);
    assert!(rendering.iter().all(|p| (0.0..=0.8).contains(p)));
}

#[test]
fn partial_last_frame_rounds_up() {
    let config = small_config();
    // 1.01 s at 24 fps -> 24.24 frames -> 25.
    assert_eq!(total_frames(&tone(1.01, 8_000, 1), &config), 25);
}

#[test]
fn unsupported_platform_reports_no_progress() {
    let config = small_config();
    let backend = MemoryBackend::new(StaticCodecProbe::new([VideoCodec::Vp8], [AudioCodec::Aac]));
    let mut r = renderer(&config);
    let mut calls = 0;
    let err = encode_story(
        &mut r,
        &tone(1.0, 8_000, 2),
        &config,
        &backend,
        None,
        &mut |_, _| calls += 1,
    )
    .unwrap_err();
    assert!(matches!(err, StoryVideoError::UnsupportedPlatform(_)));
    assert_eq!(calls, 0);
    assert!(backend.sink.lock().unwrap().config().is_none());
}

#[test]
fn missing_audio_codec_produces_video_only_output() {
    let config = small_config();
    let backend = MemoryBackend::new(StaticCodecProbe::new([VideoCodec::H264], Vec::<AudioCodec>::new()));
    let mut r = renderer(&config);
    let mut last = 0.0;
    let mut rendering_max = 0.0f64;
    let out = encode_story(
        &mut r,
        &tone(1.0, 8_000, 2),
        &config,
        &backend,
        None,
        &mut |stage, p| {
            if stage == EncodeStage::Rendering {
                rendering_max = rendering_max.max(p);
            }
            last = p;
        },
    )
    .unwrap();
    assert_eq!(out.audio_codec, None);
    assert!(backend.sink.lock().unwrap().audio().is_none());
    assert!((rendering_max - 0.9 * 23.0 / 24.0).abs() < 1e-12);
    assert_eq!(last, 1.0);
}

#[test]
fn mono_track_opens_mono_audio() {
    let config = small_config();
    let backend = MemoryBackend::new(full_probe());
    let mut r = renderer(&config);
    encode_story(&mut r, &tone(0.5, 8_000, 1), &config, &backend, None, &mut |_, _| {}).unwrap();
    let sink = backend.sink.lock().unwrap();
    assert_eq!(sink.config().unwrap().audio.as_ref().unwrap().channels, 1);
}

#[test]
fn cancellation_stops_before_next_frame() {
    let config = small_config();
    let backend = MemoryBackend::new(full_probe());
    let mut r = renderer(&config);
    let cancel = AtomicBool::new(false);
    let err = encode_story(
        &mut r,
        &tone(2.0, 8_000, 2),
        &config,
        &backend,
        Some(&cancel),
        &mut |_, p| {
            if p >= 0.4 {
                cancel.store(true, Ordering::Relaxed);
            }
        },
    )
    .unwrap_err();
    assert_eq!(err, StoryVideoError::compilation("cancelled"));
    let frames = backend.sink.lock().unwrap().frames().len();
    assert!(frames > 0 && frames < 48, "{frames}");
}

#[test]
fn surplus_channels_are_dropped_from_the_track() {
    let config = small_config();
    let backend = MemoryBackend::new(full_probe());
    let mut r = renderer(&config);
    encode_story(&mut r, &tone(0.25, 8_000, 6), &config, &backend, None, &mut |_, _| {}).unwrap();
    let sink = backend.sink.lock().unwrap();
    assert_eq!(sink.audio().unwrap().number_of_channels(), 2);
}
