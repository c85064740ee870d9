use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use lyric_clip::{
    ClipConfig, LineRange, LyricResult, Pipeline, TimedLine, parse_line_range, read_timeline,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lyric-clip", version, about)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the clip (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Print the numbered lyric timeline.
    Lines(SourceArgs),
    /// Print the compiled audio and overlay filter graphs without rendering.
    Graph(GraphArgs),
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// JSON config file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// LRC lyric file.
    #[arg(long)]
    lyrics: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ClipArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Original (vocal) track.
    #[arg(long)]
    original: Option<PathBuf>,

    /// Backing (instrumental) track.
    #[arg(long)]
    backing: Option<PathBuf>,

    /// Font file used for every text draw.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Output MP4 path.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Directory for intermediate files.
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Line range, 1-based and inclusive, e.g. "5-12" or "5 12".
    #[arg(long)]
    lines: Option<String>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    clip: ClipArgs,
}

#[derive(Args, Debug)]
struct GraphArgs {
    #[command(flatten)]
    clip: ClipArgs,

    /// Also print the full ffmpeg invocations.
    #[arg(long)]
    commands: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Lines(args) => cmd_lines(args),
        Command::Graph(args) => cmd_graph(args),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

impl SourceArgs {
    fn load(&self) -> anyhow::Result<ClipConfig> {
        let mut config = match &self.config {
            Some(path) => ClipConfig::load(path)
                .with_context(|| format!("load config '{}'", path.display()))?,
            None => ClipConfig::default(),
        };
        if let Some(p) = &self.lyrics {
            config.lyrics = p.clone();
        }
        Ok(config)
    }
}

impl ClipArgs {
    fn load(&self) -> anyhow::Result<ClipConfig> {
        let mut config = self.source.load()?;
        let overrides = [
            (&self.original, &mut config.original_audio),
            (&self.backing, &mut config.backing_audio),
            (&self.font, &mut config.font),
            (&self.output, &mut config.output),
            (&self.work_dir, &mut config.work_dir),
        ];
        for (flag, field) in overrides {
            if let Some(p) = flag {
                *field = p.clone();
            }
        }
        Ok(config)
    }

    /// Range from `--lines`, or asked for interactively after listing the timeline.
    fn select(&self, timeline: &[TimedLine]) -> LyricResult<LineRange> {
        if let Some(raw) = &self.lines {
            return parse_line_range(raw);
        }
        print_timeline(timeline);
        let raw = dialoguer::Input::<String>::new()
            .with_prompt(format!(
                "Lines to include (start end, 1-{})",
                timeline.len()
            ))
            .interact_text()
            .map_err(anyhow::Error::from)?;
        parse_line_range(&raw)
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let config = args.clip.load()?;
    let mut pipeline = Pipeline::system(config)?;
    let report = pipeline.run(|timeline| args.clip.select(timeline))?;
    eprintln!(
        "wrote {} (lines {}-{}, {:.3}s from {:.3}s)",
        report.output.display(),
        report.first_line,
        report.first_line + report.line_count - 1,
        report.duration,
        report.offset,
    );
    Ok(())
}

fn cmd_lines(args: SourceArgs) -> anyhow::Result<()> {
    let config = args.load()?;
    let timeline = read_timeline(&config.lyrics)?;
    print_timeline(&timeline);
    Ok(())
}

fn cmd_graph(args: GraphArgs) -> anyhow::Result<()> {
    let config = args.clip.load()?;
    let pipeline = Pipeline::system(config)?;
    let plan = pipeline.plan(|timeline| args.clip.select(timeline))?;

    println!("# audio");
    println!("{}", plan.audio);
    println!("# overlay");
    println!("{}", plan.overlay);
    if args.commands {
        println!("# commands");
        for cmd in pipeline.commands(&plan) {
            println!("ffmpeg {}", cmd.arg_strings().join(" "));
        }
    }
    Ok(())
}

fn print_timeline(timeline: &[TimedLine]) {
    for (i, line) in timeline.iter().enumerate() {
        println!(
            "{:>3}  {:>8.3} -> {:>8.3}  {}",
            i + 1,
            line.start,
            line.end,
            line.text
        );
    }
}
