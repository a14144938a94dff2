// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, debug, error, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

use subedit::analysis::AnalysisReport;
use subedit::app_config::{self, Config};
use subedit::autosave::{Autosaver, SqliteSnapshotStore};
use subedit::cue::Cue;
use subedit::cue_store::CueStore;
use subedit::file_utils::FileManager;
use subedit::formats::{AssCodec, ExportFormat, SubtitleCodec, SubtitleFormat};

/// CLI Wrapper for LogLevel to implement ValueEnum
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

/// CLI Wrapper for ExportFormat to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliExportFormat {
    Srt,
    Vtt,
    Ass,
    Txt,
    Csv,
    Json,
}

impl From<CliExportFormat> for ExportFormat {
    fn from(cli_format: CliExportFormat) -> Self {
        match cli_format {
            CliExportFormat::Srt => ExportFormat::Srt,
            CliExportFormat::Vtt => ExportFormat::Vtt,
            CliExportFormat::Ass => ExportFormat::Ass,
            CliExportFormat::Txt => ExportFormat::Txt,
            CliExportFormat::Csv => ExportFormat::Csv,
            CliExportFormat::Json => ExportFormat::Json,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a subtitle file, or every subtitle file in a directory
    Convert {
        /// Input subtitle file or directory
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output file (or directory when INPUT is a directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Target format, defaults to export.default_format from the config
        #[arg(short, long, value_enum)]
        to: Option<CliExportFormat>,

        /// Drop ASS override tags instead of keeping them in the text
        #[arg(long)]
        plain: bool,

        /// Force overwrite of existing output files
        #[arg(short, long)]
        force_overwrite: bool,
    },

    /// Print statistics, overlaps and readability for a subtitle file
    Check {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },

    /// Sort cues, repair negative durations and resolve overlaps
    Fix {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output file, defaults to rewriting INPUT
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Shift and/or stretch cue timings
    Shift {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Offset in seconds, may be negative
        #[arg(long, allow_hyphen_values = true, default_value_t = 0.0)]
        by: f64,

        /// Only shift cues starting at or after this time
        #[arg(long)]
        from: Option<f64>,

        /// Multiply all times by this factor before shifting
        #[arg(long)]
        stretch: Option<f64>,

        /// Output file, defaults to rewriting INPUT
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the autosaved session to a file if it is recent enough
    Restore {
        /// Output subtitle file; its extension picks the format
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Delete the autosave after restoring it
        #[arg(long)]
        discard: bool,
    },

    /// Generate shell completions for subedit
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// subedit - subtitle authoring toolkit
///
/// Converts, checks and repairs SRT, WebVTT and ASS subtitle files.
#[derive(Parser, Debug)]
#[command(name = "subedit")]
#[command(version)]
#[command(about = "Subtitle conversion and repair tool")]
#[command(long_about = "subedit reads SRT, WebVTT and ASS subtitles, repairs their timing and converts between formats.

EXAMPLES:
    subedit convert movie.srt --to vtt          # Write movie.vtt next to the input
    subedit convert movie.ass --to srt --plain  # Drop ASS override tags
    subedit convert subs/ --to ass -o out/      # Convert a whole directory
    subedit check movie.srt                     # Report overlaps and reading speed
    subedit fix movie.srt -o fixed.srt          # Sort, repair and de-overlap
    subedit shift movie.srt --by -1.5           # Move everything 1.5s earlier
    subedit shift movie.srt --by 2 --from 600   # Shift only from 10 minutes on
    subedit restore recovered.srt               # Recover the last autosave
    subedit completions bash > subedit.bash     # Generate bash completions

CONFIGURATION:
    Configuration is stored in subedit.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "subedit.json")]
    config: String,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and label for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
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
            let (color, label) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", color, now, label, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the effective level is set through set_max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "subedit", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = Config::load_or_create(&cli.config)?;
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level.into();
    }
    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    match cli.command {
        Commands::Convert { input, output, to, plain, force_overwrite } => {
            let format = to.map(ExportFormat::from).unwrap_or(config.export.default_format);
            run_convert(&input, output.as_deref(), format, plain, force_overwrite)
        }
        Commands::Check { input } => run_check(&input),
        Commands::Fix { input, output } => run_fix(&config, &input, output.as_deref()),
        Commands::Shift { input, by, from, stretch, output } => {
            run_shift(&config, &input, by, from, stretch, output.as_deref())
        }
        Commands::Restore { output, discard } => run_restore(&config, &output, discard),
        Commands::Completions { .. } => Ok(()),
    }
}

/// Decode a file, stripping ASS markup when `plain` is set
fn read_cues(input: &Path, plain: bool) -> Result<(SubtitleFormat, Vec<Cue>)> {
    if plain && SubtitleFormat::from_path(input) == Some(SubtitleFormat::Ass) {
        let content = FileManager::read_to_string(input)?;
        let cues = AssCodec::plain_text()
            .decode(&content)
            .with_context(|| format!("Failed to parse ASS file: {:?}", input))?;
        return Ok((SubtitleFormat::Ass, cues));
    }
    FileManager::read_subtitle_file(input)
}

fn write_cues(path: &Path, format: ExportFormat, cues: &[Cue]) -> Result<()> {
    let rendered = format
        .render(cues)
        .with_context(|| format!("Failed to render {} output", format))?;
    FileManager::write_to_file(path, &rendered)
}

fn convert_file(input: &Path, output: &Path, format: ExportFormat, plain: bool, force_overwrite: bool) -> Result<()> {
    if output.exists() && !force_overwrite {
        warn!("Output file already exists: {:?}. Use -f to force overwrite.", output);
        return Ok(());
    }

    let (source, cues) = read_cues(input, plain)?;
    debug!("Read {} cues from {:?} ({})", cues.len(), input, source);
    write_cues(output, format, &cues)?;
    info!("Success: {:?}", output);
    Ok(())
}

fn run_convert(input: &Path, output: Option<&Path>, format: ExportFormat, plain: bool, force_overwrite: bool) -> Result<()> {
    if input.is_file() {
        let output = match output {
            Some(path) => path.to_path_buf(),
            None => FileManager::generate_output_path(input, None, format.extension()),
        };
        if output == input {
            return Err(anyhow!("Output would overwrite the input file: {:?}", input));
        }
        return convert_file(input, &output, format, plain, force_overwrite);
    }

    if !input.is_dir() {
        return Err(anyhow!("Input path does not exist: {:?}", input));
    }

    info!("Converting subtitle files in directory: {:?}", input);
    let mut processed_count = 0;
    for path in FileManager::find_subtitle_files(input)? {
        let target = FileManager::generate_output_path(&path, output, format.extension());
        if target == path {
            debug!("Skipping {:?}, already {}", path, format);
            continue;
        }
        if let Err(e) = convert_file(&path, &target, format, plain, force_overwrite) {
            error!("Error processing file {:?}: {:#}", path, e);
        } else {
            processed_count += 1;
        }
    }

    info!("Finished processing {} files", processed_count);
    Ok(())
}

fn run_check(input: &Path) -> Result<()> {
    let (format, cues) = FileManager::read_subtitle_file(input)?;
    let report = AnalysisReport::analyze(&cues);

    println!("Format: {}", format);
    print!("{}", report);
    for score in report.too_fast() {
        println!(
            "  #{} reads at {:.1} words/s ({})",
            score.cue_index + 1,
            score.words_per_second,
            score.rating
        );
    }
    Ok(())
}

fn run_fix(config: &Config, input: &Path, output: Option<&Path>) -> Result<()> {
    let (format, cues) = FileManager::read_subtitle_file(input)?;
    let mut store = CueStore::with_rules(config.timing_rules());
    store.load(cues);

    store.sort_by_start();
    let repaired = store.fix_negative_durations();
    let trimmed = store.resolve_overlaps();
    store.renumber();
    info!("Repaired {} durations, resolved {} overlaps", repaired, trimmed);

    write_cues(output.unwrap_or(input), format.into(), store.cues())
}

fn run_shift(
    config: &Config,
    input: &Path,
    by: f64,
    from: Option<f64>,
    stretch: Option<f64>,
    output: Option<&Path>,
) -> Result<()> {
    let (format, cues) = FileManager::read_subtitle_file(input)?;
    let mut store = CueStore::with_rules(config.timing_rules());
    store.load(cues);

    if let Some(factor) = stretch {
        store.stretch(factor)?;
    }
    match from {
        Some(threshold) => {
            let shifted = store.shift_from(threshold, by)?;
            info!("Shifted {} cues by {}s", shifted, by);
        }
        None => {
            store.shift_all(by)?;
            info!("Shifted {} cues by {}s", store.len(), by);
        }
    }

    write_cues(output.unwrap_or(input), format.into(), store.cues())
}

fn run_restore(config: &Config, output: &Path, discard: bool) -> Result<()> {
    let store = SqliteSnapshotStore::from_config(&config.autosave)?;
    let mut autosaver = Autosaver::from_config(store, &config.autosave);

    let Some(snapshot) = autosaver.restore_candidate(Utc::now())? else {
        warn!("No recent autosave found");
        return Ok(());
    };

    let format = SubtitleFormat::from_path(output)
        .map(ExportFormat::from)
        .unwrap_or(config.export.default_format);
    write_cues(output, format, &snapshot.items)?;
    info!("Restored {} cues saved at {} to {:?}", snapshot.items.len(), snapshot.saved_at, output);

    if discard {
        autosaver.discard()?;
    }
    Ok(())
}
