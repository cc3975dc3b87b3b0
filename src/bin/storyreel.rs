use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "storyreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a story video (requires `ffmpeg` on PATH).
    Compile(CompileArgs),
}

#[derive(Parser, Debug)]
struct CompileArgs {
    /// Cover image URL or local path.
    #[arg(long)]
    image: String,

    /// Narration audio URL or local path.
    #[arg(long)]
    narration: String,

    /// Background music URL or local path.
    #[arg(long)]
    music: Option<String>,

    /// Output video path. A `.mp4` or `.webm` extension selects the container; any other
    /// extension keeps the one from `--config`.
    #[arg(long)]
    out: PathBuf,

    /// `VideoConfig` JSON file; missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Disable the Ken Burns pan/zoom.
    #[arg(long, default_value_t = false)]
    no_ken_burns: bool,

    /// Disable the particle overlay.
    #[arg(long, default_value_t = false)]
    no_particles: bool,

    /// Seed for the motion path and particle field.
    #[arg(long)]
    seed: Option<u64>,

    /// Compile narration only when the music track fails to load.
    #[arg(long, default_value_t = false)]
    skip_broken_music: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Compile(args) => cmd_compile(args),
    }
}

fn cmd_compile(args: CompileArgs) -> anyhow::Result<()> {
    let mut video = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read config '{}'", path.display()))?;
            serde_json::from_str::<storyreel::VideoConfig>(&text)
                .with_context(|| format!("parse config '{}'", path.display()))?
        }
        None => storyreel::VideoConfig::default(),
    };
    if let Some(container) = args
        .out
        .extension()
        .and_then(|e| e.to_str())
        .and_then(storyreel::ContainerFormat::from_extension)
    {
        if container != video.container {
            tracing::info!(
                container = container.extension(),
                "container taken from the output file extension"
            );
        }
        video.container = container;
    }

    let options = storyreel::CompileOptions {
        video,
        render: storyreel::RenderOptions {
            enable_ken_burns: !args.no_ken_burns,
            enable_particles: !args.no_particles,
            seed: args.seed,
            ..storyreel::RenderOptions::default()
        },
        music_failure: if args.skip_broken_music {
            storyreel::MusicFailurePolicy::Skip
        } else {
            storyreel::MusicFailurePolicy::Abort
        },
        ..storyreel::CompileOptions::default()
    };

    let mut request =
        storyreel::StoryVideoRequest::new(to_url(&args.image)?, to_url(&args.narration)?);
    if let Some(music) = &args.music {
        request = request.with_music(to_url(music)?);
    }

    let mut last_tenth = 0u32;
    let progress: storyreel::ProgressCallback = Box::new(move |p| {
        let tenth = (p * 10.0).floor() as u32;
        if tenth > last_tenth {
            last_tenth = tenth;
            tracing::info!("progress {:.0}%", p * 100.0);
        }
    });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;
    let video = runtime.block_on(storyreel::compile_story_video(
        &request,
        Some(progress),
        options,
    ))?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, &video.bytes)
        .with_context(|| format!("write video '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({} bytes, {})",
        args.out.display(),
        video.bytes.len(),
        video.mime_type()
    );
    Ok(())
}

/// URLs pass through; anything without a scheme is treated as a local path.
fn to_url(input: &str) -> anyhow::Result<String> {
    if input.contains("://") {
        return Ok(input.to_string());
    }
    let path = Path::new(input);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("resolve current directory")?
            .join(path)
    };
    let url = reqwest::Url::from_file_path(&absolute)
        .map_err(|_| anyhow::anyhow!("'{}' is not a valid file path", absolute.display()))?;
    Ok(url.to_string())
}
