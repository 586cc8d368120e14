use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use meshmorph::{
    BlendMode, Canvas, Composition, Ease, EngineSettings, FinalTouch, FsRasterProvider,
    PngSequence, Project, Sampling,
};

#[derive(Parser, Debug)]
#[command(name = "meshmorph", version)]
struct Cli {
    /// Log engine activity to stderr.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one weight vector as a PNG.
    Frame(FrameArgs),
    /// Render a tween between two weight vectors as a numbered PNG sequence.
    Animate(AnimateArgs),
    /// Validate a project and print a summary.
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
struct RenderOpts {
    /// Input project JSON. Image paths resolve relative to its directory.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Canvas width in pixels.
    #[arg(long, default_value_t = 512)]
    width: u32,

    /// Canvas height in pixels.
    #[arg(long, default_value_t = 512)]
    height: u32,

    #[arg(long, value_enum, default_value_t = BlendChoice::Additive)]
    blend: BlendChoice,

    #[arg(long, value_enum, default_value_t = SamplingChoice::Bilinear)]
    sampling: SamplingChoice,

    /// Snap alpha to 0 or 1 around this threshold after blending.
    #[arg(long)]
    alpha_threshold: Option<f32>,

    /// Warp images in parallel.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    render: RenderOpts,

    /// Comma-separated weights, one per image.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    weights: Vec<f64>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct AnimateArgs {
    #[command(flatten)]
    render: RenderOpts,

    /// Starting weights.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    from: Vec<f64>,

    /// Target weights.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    to: Vec<f64>,

    /// Tweened frames after the starting frame.
    #[arg(long, default_value_t = 30)]
    frames: u32,

    /// Tween duration in milliseconds.
    #[arg(long, default_value_t = 1000)]
    duration_ms: u64,

    /// Easing preset name or `cubic-bezier(x1,y1,x2,y2)`.
    #[arg(long, default_value = "linear")]
    ease: String,

    /// Directory receiving `frame_00000.png`, `frame_00001.png`, ...
    #[arg(long)]
    out_dir: PathBuf,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BlendChoice {
    Additive,
    Multiply,
    Screen,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SamplingChoice {
    Bilinear,
    Nearest,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Animate(args) => cmd_animate(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn open(opts: &RenderOpts) -> anyhow::Result<Composition> {
    let project = Project::read(&opts.in_path)?;
    let assets_root = opts.in_path.parent().unwrap_or_else(|| Path::new("."));

    let settings = EngineSettings {
        clear_rgba: None,
        sampling: match opts.sampling {
            SamplingChoice::Bilinear => Sampling::Bilinear,
            SamplingChoice::Nearest => Sampling::Nearest,
        },
        parallel: opts.parallel,
        threads: opts.threads,
    };
    let canvas = Canvas::new(opts.width, opts.height)?;
    let mut comp = Composition::from_project(
        canvas,
        settings,
        FsRasterProvider::new(assets_root),
        &project,
    )
    .with_context(|| format!("load project '{}'", opts.in_path.display()))?;

    comp.set_blend_mode(match opts.blend {
        BlendChoice::Additive => BlendMode::Additive,
        BlendChoice::Multiply => BlendMode::Multiply,
        BlendChoice::Screen => BlendMode::Screen,
    });
    comp.set_final_touch(opts.alpha_threshold.map(FinalTouch::alpha_threshold));

    let missing: Vec<String> = comp
        .images()
        .iter()
        .filter(|img| !img.is_loaded())
        .filter_map(|img| img.source().map(|s| s.describe()))
        .collect();
    if !missing.is_empty() {
        eprintln!("warning: unresolved images: {}", missing.join(", "));
    }
    Ok(comp)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut comp = open(&args.render)?;
    comp.set(&args.weights).context("apply weights")?;
    let frame = comp
        .last_frame()
        .context("no frame was rendered")?;
    frame.save_png(&args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_animate(args: AnimateArgs) -> anyhow::Result<()> {
    if args.frames == 0 {
        anyhow::bail!("--frames must be at least 1");
    }
    let ease = Ease::parse(&args.ease)?;
    let mut comp = open(&args.render)?;
    comp.attach(PngSequence::new(&args.out_dir, "frame_"));

    comp.set(&args.from).context("apply starting weights")?;

    let duration = Duration::from_millis(args.duration_ms);
    let t0 = Instant::now();
    comp.animate_at(&args.to, duration, Some(ease.into()), t0)
        .context("start tween")?;
    for i in 1..=args.frames {
        let now = t0 + duration.mul_f64(f64::from(i) / f64::from(args.frames));
        comp.tick_at(now)?;
    }

    eprintln!(
        "wrote {} frames to {}",
        args.frames + 1,
        args.out_dir.display()
    );
    Ok(())
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let project = Project::read(&args.in_path)?;
    project.validate()?;
    let points = project.images.first().map_or(0, |img| img.points.len());
    println!(
        "{}: {} images, {} points, {} triangles",
        args.in_path.display(),
        project.images.len(),
        points,
        project.triangles.len()
    );
    Ok(())
}
