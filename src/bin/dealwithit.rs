use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use dealwithit::{
    CoordinatorEvent, EditingSession, LoopMode, RenderConfiguration, SessionOpts, StaticDetector,
    StyleCatalog, SvgCatalog, WorkerOpts, WorkflowState,
};

#[derive(Parser, Debug)]
#[command(name = "dealwithit", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the animated GIF.
    Render(RenderArgs),
    /// Render a single composed frame as a PNG.
    Frame(FrameArgs),
    /// List the built-in overlay styles.
    Styles,
}

#[derive(Parser, Debug)]
struct InputArgs {
    /// Source image (PNG or JPEG).
    #[arg(long)]
    image: PathBuf,

    /// Face keypoints JSON: `[[{"x":..,"y":..}, ...], ...]`, eye, eye, nose first.
    #[arg(long)]
    faces: Option<PathBuf>,

    /// Render configuration JSON; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of frames.
    #[arg(long)]
    frames: Option<u32>,

    /// Delay between frames in milliseconds.
    #[arg(long)]
    delay: Option<u32>,

    /// Delay of the last frame in milliseconds.
    #[arg(long, conflicts_with = "no_final_delay")]
    final_delay: Option<u32>,

    /// Give the last frame the regular delay.
    #[arg(long)]
    no_final_delay: bool,

    /// Loop mode.
    #[arg(long = "loop", value_enum)]
    loop_mode: Option<LoopArg>,

    /// Total plays when `--loop finite`.
    #[arg(long)]
    loops: Option<u32>,

    /// Larger side of the output in pixels.
    #[arg(long)]
    size: Option<u32>,

    /// Mirror the source image left/right.
    #[arg(long)]
    flip_horizontal: bool,

    /// Mirror the source image top/bottom.
    #[arg(long)]
    flip_vertical: bool,

    /// Seed for the styles of second and later faces.
    #[arg(long)]
    seed: Option<u64>,

    /// Override rayon worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Frames composed per chunk.
    #[arg(long, default_value_t = 8)]
    chunk_size: usize,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output GIF path. Defaults to `<image stem>-dealwithit.gif` next to the image.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Also write the `data:image/gif;base64,...` preview URL to this file.
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Give up after this many seconds.
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LoopArg {
    Infinite,
    Off,
    Finite,
}

impl From<LoopArg> for LoopMode {
    fn from(v: LoopArg) -> Self {
        match v {
            LoopArg::Infinite => LoopMode::Infinite,
            LoopArg::Off => LoopMode::Off,
            LoopArg::Finite => LoopMode::Finite,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Styles => cmd_styles(),
    }
}

fn read_config(args: &InputArgs) -> anyhow::Result<RenderConfiguration> {
    let mut cfg = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read config '{}'", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parse config '{}'", path.display()))?
        }
        None => RenderConfiguration::default(),
    };

    if let Some(v) = args.frames {
        cfg.frame_count = v;
    }
    if let Some(v) = args.delay {
        cfg.frame_delay_ms = v;
    }
    if let Some(v) = args.final_delay {
        cfg.final_frame_delay.enabled = true;
        cfg.final_frame_delay.value_ms = v;
    }
    if args.no_final_delay {
        cfg.final_frame_delay.enabled = false;
    }
    if let Some(v) = args.loop_mode {
        cfg.looping.mode = v.into();
    }
    if let Some(v) = args.loops {
        cfg.looping.count = v;
    }
    if let Some(v) = args.size {
        cfg.output_max_dimension = v;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn read_detector(path: Option<&Path>) -> anyhow::Result<StaticDetector> {
    let Some(path) = path else {
        return Ok(StaticDetector::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read faces '{}'", path.display()))?;
    Ok(StaticDetector::from_json(&text)?)
}

/// Session in READY with the image loaded and image flips applied.
fn open_session(args: &InputArgs) -> anyhow::Result<EditingSession> {
    let config = read_config(args)?;
    let detector = read_detector(args.faces.as_deref())?;
    let catalog: Arc<dyn StyleCatalog> = Arc::new(SvgCatalog::builtin()?);
    let mut session = EditingSession::new(
        catalog,
        Box::new(detector),
        SessionOpts {
            seed: args.seed,
            worker: WorkerOpts {
                chunk_size: args.chunk_size,
                threads: args.threads,
            },
            config,
        },
    )?;

    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("read image '{}'", args.image.display()))?;
    let name = args.image.file_name().and_then(|n| n.to_str());
    session
        .load_image(name, bytes, None)
        .with_context(|| format!("load image '{}'", args.image.display()))?;

    if args.flip_horizontal {
        session.toggle_image_flip(dealwithit::FlipAxis::Horizontal);
    }
    if args.flip_vertical {
        session.toggle_image_flip(dealwithit::FlipAxis::Vertical);
    }
    Ok(session)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut session = open_session(&args.input)?;
    eprintln!("placed {} overlay(s)", session.overlays().len());

    session
        .generate()
        .context("render was not dispatched (no overlays or invalid configuration)")?;

    let deadline = std::time::Instant::now() + Duration::from_secs(args.timeout_secs);
    while session.state() == WorkflowState::Generating {
        if std::time::Instant::now() >= deadline {
            session.cancel();
            anyhow::bail!("render timed out after {}s", args.timeout_secs);
        }
        for event in session.poll() {
            match event {
                CoordinatorEvent::Progress(p) => eprintln!("progress {p}%"),
                CoordinatorEvent::Finished => {}
                CoordinatorEvent::Failed(message) => anyhow::bail!("render failed: {message}"),
            }
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    let (default_name, bytes) = session
        .download()
        .context("render finished without a result")?;
    let out = args.out.unwrap_or_else(|| {
        args.input
            .image
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&default_name)
    });
    write_file(&out, bytes)?;

    if let Some(preview) = &args.preview {
        let url = session
            .result()
            .map(|r| r.preview_data_url.as_str())
            .unwrap_or_default();
        write_file(preview, url.as_bytes())?;
    }

    if let Some(message) = session.success_message() {
        eprintln!("{message}");
    }
    eprintln!("wrote {}", out.display());
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let session = open_session(&args.input)?;
    let frame = session.preview_frame(args.frame)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight_rgba(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_styles() -> anyhow::Result<()> {
    let catalog = SvgCatalog::builtin()?;
    let default_style = catalog.default_style();
    for style in catalog.styles() {
        let Some(m) = catalog.metrics(&style) else {
            continue;
        };
        let marker = if style == default_style { " (default)" } else { "" };
        println!(
            "{style}{marker}: reference {}x{}, eyes {}, anchor ({}, {})",
            m.reference_size.width,
            m.reference_size.height,
            m.reference_eyes_distance,
            m.reference_anchor_offset.x,
            m.reference_anchor_offset.y
        );
    }
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))
}
