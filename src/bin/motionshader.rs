use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "motionshader", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one playback window as a PNG.
    Frame(FrameArgs),
    /// Render the whole playback as GIF and/or MP4 (MP4 requires `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Render configuration JSON.
    #[arg(long)]
    config: PathBuf,

    /// Points CSV.
    #[arg(long)]
    points: PathBuf,

    /// Window index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Render configuration JSON.
    #[arg(long)]
    config: PathBuf,

    /// Points CSV.
    #[arg(long)]
    points: PathBuf,

    /// Output base name; `.gif` / `.mp4` is appended.
    #[arg(long)]
    out: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Gif)]
    format: Format,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Gif,
    Mp4,
    Both,
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
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

struct Loaded {
    viewport: motionshader::ViewportSpec,
    playback: motionshader::PlaybackSpec,
    options: motionshader::RenderOptions,
    video: motionshader::MotionVideo,
}

fn load(config: &Path, points: &Path) -> anyhow::Result<Loaded> {
    let cfg = motionshader::RenderConfig::from_path(config)?;
    let motionshader::RenderPlan {
        viewport,
        playback,
        basemap,
        options,
    } = cfg.build()?;
    let dataset = motionshader::PointDataset::from_csv_path(points, &cfg.columns, cfg.partitions)
        .with_context(|| format!("load points '{}'", points.display()))?;
    tracing::info!(
        points = dataset.len(),
        partitions = dataset.partition_count(),
        "loaded points"
    );

    Ok(Loaded {
        viewport,
        playback,
        options,
        video: motionshader::MotionVideo::new(Arc::new(dataset), basemap),
    })
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let l = load(&args.config, &args.points)?;
    let frame = l
        .video
        .render_frame(&l.viewport, &l.playback, args.frame, &l.options)?;

    motionshader::save_png(&frame, &args.out)
        .with_context(|| format!("write png '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut l = load(&args.config, &args.points)?;

    if matches!(args.format, Format::Gif | Format::Both) {
        let report = l
            .video
            .to_gif(&l.viewport, &l.playback, &args.out, &l.options)?;
        eprintln!("wrote {} ({} frames)", report.output.display(), report.frames);
    }
    if matches!(args.format, Format::Mp4 | Format::Both) {
        let report = l
            .video
            .to_video(&l.viewport, &l.playback, &args.out, &l.options)?;
        eprintln!("wrote {} ({} frames)", report.output.display(), report.frames);
    }
    Ok(())
}
