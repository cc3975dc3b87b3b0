use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::audio::pcm::{DecodedAudio, write_f32le_file};
use crate::encode::codec::VideoCodec;
use crate::encode::sink::{EncodedVideo, FrameSink, FrameTiming, SinkConfig, SinkState};
use crate::foundation::core::ContainerFormat;
use crate::foundation::error::{StoryVideoError, StoryVideoResult};
use crate::render::surface::{FrameRGBA, flatten_premul_over_bg};

/// Encoder names resolved for one [`FfmpegSink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FfmpegSinkOpts {
    /// ffmpeg video encoder (`libx264`, `libvpx-vp9`, ...).
    pub video_encoder: String,
    /// ffmpeg audio encoder, required when the sink config carries an audio track.
    pub audio_encoder: Option<String>,
    /// Background used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
}

impl FfmpegSinkOpts {
    /// Options for the given encoders over a black background.
    pub fn new(video_encoder: impl Into<String>, audio_encoder: Option<String>) -> Self {
        Self {
            video_encoder: video_encoder.into(),
            audio_encoder,
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

/// Sink that streams frames into the system `ffmpeg`.
///
/// Frames go to a video-only intermediate inside a private temp directory. The audio track is
/// written there as raw `f32le`, and `finish` muxes both into the final container and reads the
/// bytes back. The directory and any running ffmpeg process are released on drop.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    workdir: Option<tempfile::TempDir>,
    video_path: PathBuf,
    audio_path: Option<PathBuf>,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    state: SinkState,
}

impl FfmpegSink {
    /// Create a sink; ffmpeg is spawned in `begin`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            workdir: None,
            video_path: PathBuf::new(),
            audio_path: None,
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            state: SinkState::default(),
        }
    }

    fn workdir(&self) -> StoryVideoResult<&Path> {
        self.workdir
            .as_ref()
            .map(tempfile::TempDir::path)
            .ok_or_else(|| StoryVideoError::compilation("ffmpeg sink not started"))
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> StoryVideoResult<()> {
        if cfg.fps == 0 {
            return Err(StoryVideoError::invalid_config("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(StoryVideoError::invalid_config(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(StoryVideoError::invalid_config(
                "ffmpeg sink width/height must be even (required for yuv420p output)",
            ));
        }
        if cfg.audio.is_some() && self.opts.audio_encoder.is_none() {
            return Err(StoryVideoError::compilation(
                "audio track configured without an audio encoder",
            ));
        }
        if !is_ffmpeg_on_path() {
            return Err(StoryVideoError::compilation(
                "ffmpeg is required for encoding, but was not found on PATH",
            ));
        }

        let workdir = tempfile::Builder::new()
            .prefix("storyreel-encode-")
            .tempdir()
            .map_err(|e| StoryVideoError::compilation(format!("failed to create temp dir: {e}")))?;
        let video_path = workdir
            .path()
            .join(format!("video.{}", cfg.container.extension()));

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        // Input: raw RGBA8 frames, flattened to opaque in push_frame.
        cmd.args([
            "-hide_banner",
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            &self.opts.video_encoder,
            "-pix_fmt",
            "yuv420p",
            "-b:v",
            &cfg.video_bitrate.to_string(),
            "-g",
            &cfg.keyframe_interval.to_string(),
        ]);
        cmd.args(video_codec_args(cfg.video_codec, cfg.container));
        cmd.arg(&video_path);

        tracing::debug!(?cmd, "spawning ffmpeg video encoder");
        let mut child = cmd.spawn().map_err(|e| {
            StoryVideoError::compilation(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            StoryVideoError::compilation("failed to open ffmpeg stdin (unexpected)")
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| {
            StoryVideoError::compilation("failed to open ffmpeg stderr (unexpected)")
        })?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.scratch = vec![0u8; (cfg.width as usize) * (cfg.height as usize) * 4];
        self.workdir = Some(workdir);
        self.video_path = video_path;
        self.audio_path = None;
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.state.reset();
        Ok(())
    }

    fn push_frame(&mut self, timing: FrameTiming, frame: &FrameRGBA) -> StoryVideoResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| StoryVideoError::compilation("ffmpeg sink not started"))?;
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(StoryVideoError::compilation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        self.state.on_frame(timing)?;

        flatten_premul_over_bg(&mut self.scratch, &frame.data, self.opts.bg_rgba)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(StoryVideoError::compilation(
                "ffmpeg video track is already closed",
            ));
        };
        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            StoryVideoError::compilation(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn close_video(&mut self) -> StoryVideoResult<()> {
        if self.state.video_closed() {
            return Ok(());
        }
        self.state.on_close_video();
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| StoryVideoError::compilation("ffmpeg sink not started"))?;

        let status = child.wait().map_err(|e| {
            StoryVideoError::compilation(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| StoryVideoError::compilation("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| {
                    StoryVideoError::compilation(format!("ffmpeg stderr read failed: {e}"))
                })?,
            None => Vec::new(),
        };

        if !status.success() {
            return Err(StoryVideoError::compilation(format!(
                "ffmpeg video encode exited with status {status}: {}",
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }
        Ok(())
    }

    fn push_audio(&mut self, audio: &DecodedAudio) -> StoryVideoResult<()> {
        let track = self
            .cfg
            .as_ref()
            .and_then(|c| c.audio.as_ref())
            .ok_or_else(|| StoryVideoError::compilation("no audio track was opened"))?;
        if audio.sample_rate() != track.sample_rate {
            return Err(StoryVideoError::compilation(format!(
                "audio sample rate {} does not match the track rate {}",
                audio.sample_rate(),
                track.sample_rate
            )));
        }
        if audio.number_of_channels() != usize::from(track.channels) {
            return Err(StoryVideoError::compilation(format!(
                "audio has {} channels, the track expects {}",
                audio.number_of_channels(),
                track.channels
            )));
        }
        self.state.on_audio()?;
        let path = self.workdir()?.join("audio.f32le");
        write_f32le_file(audio, &path)?;
        self.audio_path = Some(path);
        Ok(())
    }

    fn finish(&mut self) -> StoryVideoResult<EncodedVideo> {
        self.close_video()?;
        let cfg = self
            .cfg
            .clone()
            .ok_or_else(|| StoryVideoError::compilation("ffmpeg sink not started"))?;
        let out_path = self
            .workdir()?
            .join(format!("story.{}", cfg.container.extension()));

        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-hide_banner", "-nostdin", "-y", "-loglevel", "error", "-i"])
            .arg(&self.video_path);

        let audio = match (&self.audio_path, &cfg.audio, &self.opts.audio_encoder) {
            (Some(path), Some(track), Some(encoder)) => {
                cmd.args([
                    "-f",
                    "f32le",
                    "-ar",
                    &track.sample_rate.to_string(),
                    "-ac",
                    &track.channels.to_string(),
                    "-i",
                ])
                .arg(path);
                Some((track.clone(), encoder.clone()))
            }
            _ => None,
        };

        cmd.args(["-map", "0:v:0", "-c:v", "copy"]);
        match &audio {
            Some((track, encoder)) => {
                cmd.args([
                    "-map",
                    "1:a:0",
                    "-c:a",
                    encoder,
                    "-b:a",
                    &track.bitrate.to_string(),
                ]);
            }
            None => {
                cmd.arg("-an");
            }
        }
        if cfg.container == ContainerFormat::Mp4 {
            cmd.args(["-movflags", "+faststart"]);
        }
        cmd.arg(&out_path);

        tracing::debug!(?cmd, "muxing final container");
        let out = cmd
            .stdin(Stdio::null())
            .output()
            .map_err(|e| StoryVideoError::compilation(format!("failed to run ffmpeg mux: {e}")))?;
        if !out.status.success() {
            return Err(StoryVideoError::compilation(format!(
                "ffmpeg mux exited with status {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        let bytes = std::fs::read(&out_path).map_err(|e| {
            StoryVideoError::compilation(format!(
                "failed to read muxed output '{}': {e}",
                out_path.display()
            ))
        })?;
        self.cfg = None;
        self.workdir = None;
        Ok(EncodedVideo {
            bytes,
            container: cfg.container,
            video_codec: cfg.video_codec,
            audio_codec: audio.map(|(track, _)| track.codec),
        })
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn video_codec_args(codec: VideoCodec, container: ContainerFormat) -> &'static [&'static str] {
    match (codec, container) {
        (VideoCodec::Hevc, ContainerFormat::Mp4) => &["-tag:v", "hvc1"],
        (VideoCodec::Vp9, _) => &["-row-mt", "1"],
        _ => &[],
    }
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
