use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use celsheet_core::{AtlasResult, InputFrame, PackControl, PackingSettings, Progress, pack_with};
use clap::{ArgAction, Parser, Subcommand};
use globset::{Glob, GlobSet, GlobSetBuilder};
use indicatif::{ProgressBar, ProgressIterator, ProgressStyle};
use serde::Deserialize;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "celsheet",
    about = "Lay out animation frames on a single sprite sheet",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute the sheet layout for a set of frames
    Pack(PackArgs),
    /// Simple timing bench (packs once, prints time + occupancy)
    Bench(BenchArgs),
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    // Input/Output
    /// Input file or directory (frames are taken in file name order)
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// YAML config file path (values override the flags below)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,
    /// Fail instead of skipping frames that cannot be decoded
    #[arg(long, default_value_t = false, help_heading = "Input/Output")]
    strict: bool,
    /// Write the layout (JSON) to this file instead of stdout
    #[arg(short, long, help_heading = "Input/Output")]
    output: Option<PathBuf>,

    // Layout
    /// Horizontal padding around and between frames
    #[arg(long, default_value_t = 0, help_heading = "Layout")]
    x_padding: u32,
    /// Vertical padding around and between frames
    #[arg(long, default_value_t = 0, help_heading = "Layout")]
    y_padding: u32,
    /// Resize sheet dims to power of two
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    pow2: bool,
    /// Pack frames largest first instead of in input order
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    unordered: bool,
    /// Give every frame a cell as big as the largest frame
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    uniform_grid: bool,

    // Frame Processing
    /// Trim transparent borders
    #[arg(long, default_value_t = false, help_heading = "Frame Processing")]
    trim: bool,
    /// Trim alpha threshold (0..=255)
    #[arg(long, default_value_t = 0, help_heading = "Frame Processing")]
    trim_threshold: u8,
    /// Share one sheet area between pixel-identical frames
    #[arg(long, default_value_t = true, action=ArgAction::Set, help_heading = "Frame Processing")]
    reuse_identical: bool,

    // Width search
    /// Try every row width instead of stepping by half the narrowest frame
    #[arg(long, default_value_t = false, help_heading = "Width Search")]
    high_precision: bool,
    /// Prefer a square sheet over a small one
    #[arg(long, default_value_t = false, help_heading = "Width Search")]
    favor_ratio: bool,
    /// Upper bound for candidate row widths
    #[arg(long, default_value_t = celsheet_core::DEFAULT_MAX_SEARCH_WIDTH, help_heading = "Width Search")]
    max_search_width: u32,
    /// Time budget for the width search (ms)
    #[arg(long, help_heading = "Width Search")]
    time_budget: Option<u64>,
    /// Run trial packs in parallel (requires core feature `parallel`)
    #[arg(long, default_value_t = false, help_heading = "Width Search")]
    parallel: bool,

    // Export
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Export packing stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Dry run: compute layout and stats but do not write anything
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct BenchArgs {
    /// Input directory
    input: PathBuf,
    /// Try every row width
    #[arg(long, default_value_t = false)]
    high_precision: bool,
    /// Prefer a square sheet over a small one
    #[arg(long, default_value_t = false)]
    favor_ratio: bool,
    /// Time budget for the width search (ms)
    #[arg(long)]
    time_budget: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    match &cli.command {
        Commands::Pack(args) => run_pack(args, cli.progress && !cli.quiet),
        Commands::Bench(b) => run_bench(b),
    }
}

fn run_pack(cli: &PackArgs, show_progress: bool) -> anyhow::Result<()> {
    let mut settings = settings_from_args(cli);
    if let Some(path) = &cli.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        settings = y.into_settings(settings);
    }
    settings.validate()?;

    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&settings)?),
            _ => println!("{}", serde_json::to_string_pretty(&settings)?),
        }
        return Ok(());
    }

    let paths = gather_paths(&cli.input, &cli.include, &cli.exclude)?;
    let frames = load_frames(&paths, show_progress, cli.strict)?;
    info!(count = frames.len(), "loaded frames");

    let out = pack_with_progress(&frames, &settings, show_progress)?;
    let stats = out.stats();
    info!(
        row_width = out.chosen_row_width,
        occupancy = format!("{:.2}%", stats.occupancy * 100.0),
        "{}",
        stats.summary()
    );

    let layout = layout_json(&frames, &out);
    let json = serde_json::to_string_pretty(&layout)?;
    match (&cli.output, cli.dry_run) {
        (_, true) => debug!("dry run: layout not written"),
        (Some(path), false) => {
            fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
            info!(?path, "layout written");
        }
        (None, false) => println!("{}", json),
    }

    if let Some(stats_path) = &cli.export_stats {
        if cli.dry_run {
            println!("{}", stats.summary());
        } else {
            fs::write(stats_path, serde_json::to_string_pretty(&stats)?)
                .with_context(|| format!("write {}", stats_path.display()))?;
            info!(?stats_path, "stats exported");
        }
    }
    Ok(())
}

fn run_bench(b: &BenchArgs) -> anyhow::Result<()> {
    let paths = gather_paths(&b.input, &[], &[])?;
    let frames = load_frames(&paths, false, true)?;
    let settings = PackingSettings::builder()
        .high_precision(b.high_precision)
        .favor_ratio(b.favor_ratio)
        .time_budget_ms(b.time_budget)
        .build();

    let start = Instant::now();
    let out = celsheet_core::pack(&frames, &settings)?;
    let dur = start.elapsed();
    let stats = out.stats();
    println!(
        "frames={} sheet={}x{} occupancy={:.2}% time={}",
        stats.num_frames,
        out.sheet_width,
        out.sheet_height,
        stats.occupancy * 100.0,
        fmt_dur(dur)
    );
    Ok(())
}

fn settings_from_args(cli: &PackArgs) -> PackingSettings {
    PackingSettings::builder()
        .padding(cli.x_padding, cli.y_padding)
        .pow2(cli.pow2)
        .allow_unordered(cli.unordered)
        .uniform_grid(cli.uniform_grid)
        .trim(cli.trim)
        .trim_threshold(cli.trim_threshold)
        .reuse_identical(cli.reuse_identical)
        .high_precision(cli.high_precision)
        .favor_ratio(cli.favor_ratio)
        .max_search_width(cli.max_search_width)
        .time_budget_ms(cli.time_budget)
        .parallel(cli.parallel)
        .build()
}

fn pack_with_progress(
    frames: &[InputFrame],
    settings: &PackingSettings,
    show_progress: bool,
) -> anyhow::Result<AtlasResult> {
    if !show_progress {
        return Ok(celsheet_core::pack(frames, settings)?);
    }
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} {wide_msg} [{bar:30}] {pos}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    let sink = |p: &Progress| {
        bar.set_position(p.total_progress as u64);
        bar.set_message(p.label.clone());
    };
    let control = PackControl::default().with_progress(&sink);
    let out = pack_with(frames, settings, &control);
    bar.finish_and_clear();
    Ok(out?)
}

fn layout_json(frames: &[InputFrame], out: &AtlasResult) -> serde_json::Value {
    let entries: Vec<serde_json::Value> = frames
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let p = out.placements[i];
            let o = out.origins[i];
            serde_json::json!({
                "key": f.key,
                "frame": {"x": p.x, "y": p.y, "w": p.w, "h": p.h},
                "source": {"x": o.x, "y": o.y, "w": o.w, "h": o.h},
                "source_size": {"w": f.image.width(), "h": f.image.height()},
                "reuses": out.reuses[i].map(|j| frames[j].key.clone()),
                "reuse_count": out.reuse_count[i],
            })
        })
        .collect();
    serde_json::json!({
        "sheet": {"w": out.sheet_width, "h": out.sheet_height},
        "row_width": out.chosen_row_width,
        "reused": out.reused_origin_count,
        "frames": entries,
    })
}

fn fmt_dur(d: Duration) -> String {
    let ms = d.as_secs_f64() * 1000.0;
    if ms >= 1.0 {
        format!("{:.1}ms", ms)
    } else {
        format!("{}us", d.as_micros())
    }
}

fn build_glob_set(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat).with_context(|| format!("bad glob {}", pat))?);
    }
    Ok(Some(b.build()?))
}

fn gather_paths(
    path: &Path,
    include: &[String],
    exclude: &[String],
) -> anyhow::Result<Vec<PathBuf>> {
    let inc_set = build_glob_set(include)?;
    let exc_set = build_glob_set(exclude)?;

    let mut list: Vec<PathBuf> = Vec::new();
    if path.is_file() {
        if !should_skip(path, inc_set.as_ref(), exc_set.as_ref()) && is_image(path) {
            list.push(path.to_path_buf());
        }
    } else {
        // animation frames: file name order is frame order
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let p = entry.path();
            if p.is_file() && !should_skip(p, inc_set.as_ref(), exc_set.as_ref()) && is_image(p) {
                list.push(p.to_path_buf());
            }
        }
    }
    Ok(list)
}

fn should_skip(p: &Path, include: Option<&GlobSet>, exclude: Option<&GlobSet>) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if exclude.is_some_and(|ex| ex.is_match(&s)) {
        return true;
    }
    if include.is_some_and(|inc| !inc.is_match(&s)) {
        return true;
    }
    false
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "png" | "jpg" | "jpeg")
    )
}

/// Decodes every path in order. Unreadable files are skipped with an error log unless
/// `strict` is set, since a missing cel shifts every later frame index.
fn load_frames(paths: &[PathBuf], progress: bool, strict: bool) -> anyhow::Result<Vec<InputFrame>> {
    let bar = if progress {
        ProgressBar::new(paths.len() as u64).with_style(
            ProgressStyle::with_template("{spinner:.green} decoding cel {pos}/{len} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        )
    } else {
        ProgressBar::hidden()
    };

    let mut frames = Vec::with_capacity(paths.len());
    let mut skipped = 0usize;
    for p in paths.iter().progress_with(bar.clone()) {
        bar.set_message(p.display().to_string());
        match InputFrame::open(p) {
            Ok(frame) => frames.push(frame),
            Err(e) if strict => {
                return Err(e).with_context(|| format!("decode frame {}", p.display()));
            }
            Err(e) => {
                skipped += 1;
                error!(path = %p.display(), error = %e, "frame skipped");
            }
        }
    }
    bar.finish_and_clear();
    if skipped > 0 {
        warn!(skipped, "some frames could not be decoded; later frame indices have shifted");
    }
    Ok(frames)
}

/// Default filter directive for the `-q`/`-v` flags.
fn log_filter(quiet: bool, verbose: u8) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    }
}

/// Logs go to stderr so the layout JSON on stdout stays clean. `RUST_LOG` wins over the flags.
fn init_tracing(quiet: bool, verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_filter(quiet, verbose)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Packing settings as they may appear in a YAML file; every key is optional.
#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    x_padding: Option<u32>,
    y_padding: Option<u32>,
    power_of_two: Option<bool>,
    trim: Option<bool>,
    trim_threshold: Option<u8>,
    reuse_identical: Option<bool>,
    unordered: Option<bool>,
    uniform_grid: Option<bool>,
    high_precision: Option<bool>,
    favor_ratio: Option<bool>,
    max_search_width: Option<u32>,
    time_budget_ms: Option<u64>,
    parallel: Option<bool>,
}

impl YamlConfig {
    fn into_settings(self, mut s: PackingSettings) -> PackingSettings {
        if let Some(v) = self.x_padding {
            s.x_padding = v;
        }
        if let Some(v) = self.y_padding {
            s.y_padding = v;
        }
        if let Some(v) = self.power_of_two {
            s.force_power_of_two = v;
        }
        if let Some(v) = self.trim {
            s.force_minimum_dimensions = v;
        }
        if let Some(v) = self.trim_threshold {
            s.trim_threshold = v;
        }
        if let Some(v) = self.reuse_identical {
            s.reuse_identical_frames_area = v;
        }
        if let Some(v) = self.unordered {
            s.allow_unordered_frames = v;
        }
        if let Some(v) = self.uniform_grid {
            s.use_uniform_grid = v;
        }
        if let Some(v) = self.high_precision {
            s.high_precision_width_search = v;
        }
        if let Some(v) = self.favor_ratio {
            s.favor_ratio_over_area = v;
        }
        if let Some(v) = self.max_search_width {
            s.max_search_width = v;
        }
        if let Some(v) = self.time_budget_ms {
            s.search_time_budget_ms = Some(v);
        }
        if let Some(v) = self.parallel {
            s.parallel = v;
        }
        s
    }
}
