use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use shotdetect::{
    ColorHistogram, DEFAULT_BINS_PER_CHANNEL, DEFAULT_THRESHOLD, DetectionOptions, DistanceMethod,
    Frame, FrameSaver, ProgressCallback, ProgressInfo, ReportFormat, ReportWriter, ShotDetector,
    VideoSource, format_timestamp,
};

const CLI_AFTER_HELP: &str = "Examples:\n  shotdetect detect input.mp4\n  shotdetect detect input.mp4 --out shots --format json --threshold 0.6 --progress\n  shotdetect detect input.mp4 --width 320 --save-frames frames --sample-every 250\n  shotdetect compare a.png b.png --method all\n  shotdetect completions zsh > _shotdetect";

#[derive(Debug, Parser)]
#[command(
    name = "shotdetect",
    version,
    about = "Detect shot boundaries in video using color histograms",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar during detection.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting an existing report file and saved frame images.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Detect shots in a video and write a report.
    #[command(
        about = "Detect shot boundaries",
        after_help = "Examples:\n  shotdetect detect input.mp4 --out result --format xml\n  shotdetect detect input.mp4 --threshold 0.3 --max-duration 00:05:00"
    )]
    Detect {
        /// Input video path.
        input: PathBuf,
        /// Report path without extension (the format's extension is appended).
        #[arg(long, default_value = "result")]
        out: PathBuf,
        /// Report format (xml, text, json).
        #[arg(long, default_value = "xml")]
        format: String,
        /// Chi-square distance above which consecutive frames form a boundary.
        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f64,
        /// Also record every Nth frame (0 disables sampling).
        #[arg(long, default_value_t = 0)]
        sample_every: u64,
        /// Histogram bins per color channel (1-256).
        #[arg(long, default_value_t = DEFAULT_BINS_PER_CHANNEL)]
        bins: usize,
        /// Save the frame of every boundary and sample into this directory.
        #[arg(long)]
        save_frames: Option<PathBuf>,
        /// Image extension for saved frames (png, jpg, jpeg, bmp, tiff).
        #[arg(long, default_value = "png")]
        image_ext: String,
        /// Analysis width in pixels; height follows the aspect ratio.
        #[arg(long)]
        width: Option<u32>,
        /// Stop after this many frames.
        #[arg(long)]
        max_frames: Option<u64>,
        /// Stop once this timestamp is reached (seconds, MM:SS, or HH:MM:SS).
        #[arg(long)]
        max_duration: Option<String>,
    },

    /// Print histogram distances between two images.
    #[command(
        about = "Compare two still images",
        after_help = "Examples:\n  shotdetect compare a.png b.png\n  shotdetect compare a.png b.png --method all --bins 16"
    )]
    Compare {
        /// First image.
        first: PathBuf,
        /// Second image.
        second: PathBuf,
        /// Distance method (chi-square, correlation, intersection, bhattacharyya, all).
        #[arg(long, default_value = "chi-square")]
        method: String,
        /// Histogram bins per color channel (1-256).
        #[arg(long, default_value_t = DEFAULT_BINS_PER_CHANNEL)]
        bins: usize,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_report_format(value: &str) -> Option<ReportFormat> {
    match value.to_ascii_lowercase().as_str() {
        "xml" => Some(ReportFormat::Xml),
        "text" | "txt" => Some(ReportFormat::Text),
        "json" | "jsonl" => Some(ReportFormat::Json),
        _ => None,
    }
}

fn parse_distance_methods(value: &str) -> Option<Vec<DistanceMethod>> {
    match value.to_ascii_lowercase().as_str() {
        "all" => Some(DistanceMethod::ALL.to_vec()),
        "chi-square" | "chisquare" | "chi2" => Some(vec![DistanceMethod::ChiSquare]),
        "correlation" | "correl" => Some(vec![DistanceMethod::Correlation]),
        "intersection" => Some(vec![DistanceMethod::Intersection]),
        "bhattacharyya" | "hellinger" => Some(vec![DistanceMethod::Bhattacharyya]),
        _ => None,
    }
}

fn parse_log_level(value: &str) -> Option<log::LevelFilter> {
    match value.to_ascii_lowercase().as_str() {
        "quiet" | "off" => Some(log::LevelFilter::Off),
        "panic" | "fatal" | "error" => Some(log::LevelFilter::Error),
        "warning" | "warn" => Some(log::LevelFilter::Warn),
        "info" => Some(log::LevelFilter::Info),
        "verbose" | "debug" => Some(log::LevelFilter::Debug),
        "trace" => Some(log::LevelFilter::Trace),
        _ => None,
    }
}

fn parse_timecode(value: &str) -> Result<Duration, Box<dyn std::error::Error>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("time value cannot be empty".into());
    }

    if let Ok(seconds) = trimmed.parse::<f64>() {
        return seconds_to_duration(seconds, trimmed);
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err(format!("invalid time format: {trimmed}").into());
    }

    let (hours, minutes, seconds_str) = if parts.len() == 3 {
        (parts[0].parse::<u64>()?, parts[1].parse::<u64>()?, parts[2])
    } else {
        (0_u64, parts[0].parse::<u64>()?, parts[1])
    };

    let seconds = seconds_str.parse::<f64>()?;
    let total_seconds = (hours as f64 * 3600.0) + (minutes as f64 * 60.0) + seconds;
    seconds_to_duration(total_seconds, trimmed)
}

fn seconds_to_duration(seconds: f64, value: &str) -> Result<Duration, Box<dyn std::error::Error>> {
    if !seconds.is_finite() {
        return Err(format!("time value must be finite: {value}").into());
    }
    Duration::try_from_secs_f64(seconds.max(0.0))
        .map_err(|error| format!("time value out of range: {value} ({error})").into())
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn load_frame(path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
    let image = image::open(path)
        .map_err(|error| format!("failed to open image {}: {error}", path.display()))?;
    Ok(Frame::from(image.to_rgb8()))
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let default_filter = if global.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Some(level) = &global.log_level {
        let parsed = parse_log_level(level).ok_or(format!("unsupported --log-level: {level}"))?;
        shotdetect::set_ffmpeg_log_level(parsed);
    }

    Ok(())
}

/// Drives an `indicatif` bar from detection progress.
struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} frames ({eta}) {msg}",
        )?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
        self.bar.set_message(format!("{} shot(s)", info.shots_detected));
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Detect {
            input,
            out,
            format,
            threshold,
            sample_every,
            bins,
            save_frames,
            image_ext,
            width,
            max_frames,
            max_duration,
        } => {
            let format = parse_report_format(&format)
                .ok_or(format!("unsupported --format: {format}"))?;

            let report_path = format.path_for(&out);
            ensure_writable_path(&report_path, cli.global.overwrite)?;

            let mut options = DetectionOptions::new()
                .with_threshold(threshold)
                .with_sample_period(sample_every)
                .with_bins_per_channel(bins);
            if let Some(frames) = max_frames {
                options = options.with_max_frames(frames);
            }
            if let Some(limit) = &max_duration {
                options = options.with_max_duration(parse_timecode(limit)?);
            }

            let progress = if cli.global.progress {
                let progress = Arc::new(TerminalProgress::new()?);
                options = options
                    .with_progress(progress.clone())
                    .with_batch_size(25);
                Some(progress)
            } else {
                None
            };
            options.validate()?;

            let mut source = VideoSource::open_with_resolution(&input, width, None)?;
            let info = source.video_info().clone();
            if cli.global.verbose {
                let (analysis_width, analysis_height) = source.output_dimensions();
                eprintln!(
                    "video: {}x{} @ {:.2} fps, ~{} frames, analysing at {}x{}",
                    info.width,
                    info.height,
                    info.frames_per_second,
                    info.frame_count,
                    analysis_width,
                    analysis_height,
                );
            }

            let mut report = ReportWriter::create(&out, format)?;
            report.write_header(&info)?;

            let saver = save_frames
                .as_deref()
                .map(|directory| {
                    FrameSaver::new(directory, &image_ext)
                        .map(|saver| saver.with_overwrite(cli.global.overwrite))
                })
                .transpose()?;

            let started = std::time::Instant::now();
            let mut sinks = (&mut report, saver);
            let result = ShotDetector::new(options).run(&mut source, &mut sinks);
            let (_, saver) = sinks;
            report.finish()?;
            let summary = result?;

            if let Some(progress) = progress {
                progress.bar.finish_with_message("done");
            }

            if cli.global.verbose {
                for (index, shot) in summary.shots.iter().enumerate() {
                    eprintln!(
                        "shot {:>4}: frames {:>7} - {:<7} {} - {}{}",
                        index + 1,
                        shot.begin.frame,
                        shot.end.frame,
                        format_timestamp(shot.begin.timestamp),
                        format_timestamp(shot.end.timestamp),
                        if shot.aborted { " (aborted)" } else { "" },
                    );
                }
            }

            if summary.aborted {
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!(
                        "stopped early after {} frame(s)",
                        summary.frames_processed
                    )
                    .yellow()
                );
            }

            println!(
                "{} {}",
                "success:".green().bold(),
                format!(
                    "Detected {} shot(s) in {} frame(s) ({:.2?}) -> {}",
                    summary.shots.len(),
                    summary.frames_processed,
                    started.elapsed(),
                    report_path.display()
                )
                .green()
            );
            if summary.samples > 0 {
                println!("Samples: {}", summary.samples);
            }
            if let Some(saver) = saver {
                println!(
                    "Saved {} frame(s) to {}",
                    saver.saved_count(),
                    saver.directory().display()
                );
            }
        }
        Commands::Compare {
            first,
            second,
            method,
            bins,
        } => {
            let methods = parse_distance_methods(&method)
                .ok_or(format!("unsupported --method: {method}"))?;

            let first_histogram = ColorHistogram::extract(&load_frame(&first)?, bins)?;
            let second_histogram = ColorHistogram::extract(&load_frame(&second)?, bins)?;

            for method in methods {
                let value = first_histogram.distance(&second_histogram, method)?;
                println!("{:<14} {}", format!("{method}:").cyan().bold(), format!("{value:.6}"));
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "shotdetect", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_distance_methods, parse_log_level, parse_report_format, parse_timecode};
    use shotdetect::{DistanceMethod, ReportFormat};

    #[test]
    fn parse_report_format_aliases() {
        assert_eq!(parse_report_format("xml"), Some(ReportFormat::Xml));
        assert_eq!(parse_report_format("TXT"), Some(ReportFormat::Text));
        assert_eq!(parse_report_format("text"), Some(ReportFormat::Text));
        assert_eq!(parse_report_format("jsonl"), Some(ReportFormat::Json));
        assert!(parse_report_format("yaml").is_none());
    }

    #[test]
    fn parse_distance_method_aliases() {
        assert_eq!(
            parse_distance_methods("chi-square"),
            Some(vec![DistanceMethod::ChiSquare])
        );
        assert_eq!(
            parse_distance_methods("Bhattacharyya"),
            Some(vec![DistanceMethod::Bhattacharyya])
        );
        assert_eq!(parse_distance_methods("all").map(|all| all.len()), Some(4));
        assert!(parse_distance_methods("emd").is_none());
    }

    #[test]
    fn parse_log_level_aliases() {
        assert_eq!(parse_log_level("quiet"), Some(log::LevelFilter::Off));
        assert_eq!(parse_log_level("warning"), Some(log::LevelFilter::Warn));
        assert_eq!(parse_log_level("verbose"), Some(log::LevelFilter::Debug));
        assert!(parse_log_level("loud").is_none());
    }

    #[test]
    fn parse_timecode_formats() {
        let seconds = parse_timecode("75").unwrap();
        assert_eq!(seconds.as_secs(), 75);

        let mm_ss = parse_timecode("01:15").unwrap();
        assert_eq!(mm_ss.as_secs(), 75);

        let hh_mm_ss = parse_timecode("00:01:15.5").unwrap();
        assert_eq!(hh_mm_ss.as_secs(), 75);

        assert!(parse_timecode("").is_err());
        assert!(parse_timecode("1:2:3:4").is_err());
        assert!(parse_timecode("inf").is_err());
        assert!(parse_timecode("NaN").is_err());
        assert!(parse_timecode("1e30").is_err());
        assert!(parse_timecode("99999999999999999:00:00").is_err());
    }
}
