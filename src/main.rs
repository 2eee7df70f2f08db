// Lint exceptions for this binary
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::too_many_arguments)]

use anyhow::{Result, anyhow, Context};
use log::{warn, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use crate::app_config::Config;
use crate::file_utils::FileManager;
use app_controller::Controller;

mod alignment;
mod app_config;
mod app_controller;
mod errors;
mod file_utils;
mod guide;
mod html;
mod language_utils;
mod nodes;
mod reflow;
mod subtitle_processor;
mod translation;

/// Command-line mirror of the config log level, for clap's ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Re-flow caption cues into guide-sized segments
    Fix(FixArgs),

    /// Translate an SRT file with the tiered dictionary
    Translate(TranslateArgs),

    /// Generate learning-guide markdown from a translated SRT
    Guide(GuideArgs),

    /// Convert guide markdown to a styled HTML page
    Render(RenderArgs),

    /// Run the full pipeline over a transcript or series directory (default command)
    #[command(alias = "process")]
    Run(RunArgs),

    /// Migrate legacy documentation URLs inside node insertion files
    FixLinks(FixLinksArgs),

    /// Generate shell completions for subguide
    Completions {
        /// Shell to emit completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct FixArgs {
    /// Input SRT file to re-flow
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output SRT file (defaults to <input>_fixed.srt)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Target segment duration in seconds
    #[arg(long)]
    target_duration: Option<f64>,

    /// Early-close threshold for completed sentences (0.0 to 1.0)
    #[arg(long)]
    completion_threshold: Option<f64>,
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input SRT file to translate
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output SRT file (defaults to <input>_<language>.srt)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Node mention metadata file to derive insertion data from
    #[arg(long)]
    mentions: Option<PathBuf>,

    /// Output path for generated node insertion data
    #[arg(long, requires = "mentions")]
    insertions: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct GuideArgs {
    /// Translated SRT file to build the guide from
    #[arg(long)]
    subtitle_file: PathBuf,

    /// Node insertion data file
    #[arg(long)]
    node_data: Option<PathBuf>,

    /// Output markdown file
    #[arg(long)]
    output: PathBuf,

    /// Explicit video URL for the series info block
    #[arg(long)]
    video_url: Option<String>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Guide markdown file to convert
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output HTML file (defaults to the input with an .html extension)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Input transcript file or series directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Overwrite outputs that already exist
    #[arg(short, long)]
    force_overwrite: bool,
}

#[derive(Parser, Debug)]
struct FixLinksArgs {
    /// Node insertion files to repair in place
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,
}

/// subguide - tutorial caption to learning guide toolchain
///
/// Re-flows tutorial video captions into readable segments, translates them
/// with an established terminology dictionary, aligns node documentation
/// links to the right segment, and emits markdown plus styled HTML guides.
#[derive(Parser, Debug)]
#[command(name = "subguide")]
#[command(version = "1.1.0")]
#[command(about = "Tutorial caption to localized learning guide toolchain")]
#[command(long_about = "subguide turns tutorial-video captions into localized, timestamp-synchronized learning guides.

EXAMPLES:
    subguide transcript_1096045116.srt          # Full pipeline for one chapter
    subguide run tutorials/ -f                  # Re-process a whole series tree
    subguide fix raw.srt fixed.srt              # Re-flow captions only
    subguide fix raw.srt --target-duration 30   # Shorter guide segments
    subguide translate chapter_02_fixed.srt     # Dictionary translation only
    subguide guide --subtitle-file ch02_japanese.srt --node-data ch02_node_insertions.json --output ch02_guide.md
    subguide render ch02_guide.md               # Styled HTML from a guide
    subguide fix-links ch02_node_insertions.json
    subguide completions bash > subguide.bash   # Generate bash completions

CONFIGURATION:
    Settings are read from conf.json unless --config-path points elsewhere.
    A missing config file is written with defaults on first run.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input transcript file or series directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Overwrite outputs that already exist
    #[arg(short, long)]
    force_overwrite: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "conf.json")]
    config_path: String,

    /// Logging verbosity
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Timestamped, colored stderr logger
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: Logger capped at the given level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Process-wide logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Level marker emoji
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let emoji = Self::get_emoji_for_level(record.level());
            let color = match record.level() {
                Level::Error => "\x1B[1;31m",
                Level::Warn => "\x1B[1;33m",
                Level::Info => "\x1B[1;32m",
                Level::Debug => "\x1B[1;36m",
                Level::Trace => "\x1B[1;35m",
            };

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", color, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Start at info; prepare_config adjusts the level once the config is known
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subguide", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Fix(args)) => run_fix(args, &cli.config_path, cli.log_level).await,
        Some(Commands::Translate(args)) => run_translate(args, &cli.config_path, cli.log_level).await,
        Some(Commands::Guide(args)) => run_guide(args, &cli.config_path, cli.log_level).await,
        Some(Commands::Render(args)) => run_render(args, &cli.config_path, cli.log_level).await,
        Some(Commands::Run(args)) => run_pipeline(args, &cli.config_path, cli.log_level).await,
        Some(Commands::FixLinks(args)) => run_fix_links(args, &cli.config_path, cli.log_level).await,
        None => {
            // Default behavior - treat the top-level input path as `run`
            let input_path = cli.input_path.ok_or_else(|| {
                anyhow!("INPUT_PATH is required when no subcommand is given")
            })?;

            let run_args = RunArgs {
                input_path,
                force_overwrite: cli.force_overwrite,
            };
            run_pipeline(run_args, &cli.config_path, cli.log_level).await
        }
    }
}

/// Load the configuration, creating a default file when absent, and apply
/// the command-line log level
fn prepare_config(config_path: &str, cli_log_level: Option<CliLogLevel>) -> Result<Config> {
    let mut config = if Path::new(config_path).exists() {
        Config::from_file(config_path)?
    } else {
        warn!("No config at '{}', writing one with defaults.", config_path);
        let config = Config::default();
        config.to_file(config_path)?;
        config
    };

    // A log level given on the command line wins over the config file
    if let Some(log_level) = cli_log_level {
        config.log_level = log_level.into();
    }

    let log_level = match config.log_level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    };
    log::set_max_level(log_level);

    Ok(config)
}

async fn run_fix(args: FixArgs, config_path: &str, log_level: Option<CliLogLevel>) -> Result<()> {
    let mut config = prepare_config(config_path, log_level)?;

    // Re-flow knobs given on the command line replace the configured ones
    if let Some(target_duration) = args.target_duration {
        config.reflow.target_duration = target_duration;
    }
    if let Some(completion_threshold) = args.completion_threshold {
        config.reflow.completion_threshold = completion_threshold;
    }

    config.validate().context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?;
    controller.fix_file(&args.input, args.output.as_deref())?;

    Ok(())
}

async fn run_translate(args: TranslateArgs, config_path: &str, log_level: Option<CliLogLevel>) -> Result<()> {
    let config = prepare_config(config_path, log_level)?;
    config.validate().context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?;
    controller.translate_file(&args.input, args.output.as_deref())?;

    if let Some(mentions) = &args.mentions {
        let insertions_path = match args.insertions {
            Some(path) => path,
            None => FileManager::suffixed_output_path(
                &args.input,
                args.input.parent().unwrap_or(Path::new(".")),
                "_node_insertions",
                "json",
            ),
        };
        controller.generate_insertions_file(mentions, &insertions_path)?;
    }

    Ok(())
}

async fn run_guide(args: GuideArgs, config_path: &str, log_level: Option<CliLogLevel>) -> Result<()> {
    let config = prepare_config(config_path, log_level)?;
    config.validate().context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?;
    controller.generate_guide(
        &args.subtitle_file,
        args.node_data.as_deref(),
        &args.output,
        args.video_url,
    )?;

    Ok(())
}

async fn run_render(args: RenderArgs, config_path: &str, log_level: Option<CliLogLevel>) -> Result<()> {
    let config = prepare_config(config_path, log_level)?;
    config.validate().context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?;
    controller.render_guide(&args.input, args.output.as_deref())?;

    Ok(())
}

async fn run_fix_links(args: FixLinksArgs, config_path: &str, log_level: Option<CliLogLevel>) -> Result<()> {
    let config = prepare_config(config_path, log_level)?;
    config.validate().context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?;
    let migrated = controller.fix_insertion_links(&args.files)?;
    log::info!("Migrated {} links across {} file(s)", migrated, args.files.len());

    Ok(())
}

async fn run_pipeline(args: RunArgs, config_path: &str, log_level: Option<CliLogLevel>) -> Result<()> {
    let config = prepare_config(config_path, log_level)?;
    config.validate().context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?;

    // Run the controller with the input file or series directory
    if args.input_path.is_file() {
        controller.run(
            args.input_path.clone(),
            args.input_path.parent().unwrap_or(Path::new(".")).to_path_buf(),
            args.force_overwrite,
        ).await?;
    } else if args.input_path.is_dir() {
        controller.run_series(
            args.input_path.clone(),
            args.force_overwrite,
        ).await?;
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", args.input_path));
    }

    Ok(())
}
