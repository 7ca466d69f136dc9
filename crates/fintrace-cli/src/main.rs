use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use fintrace_core::{
    Armor, Calibration, ConvertOptions, ExportError, InputFormat, OutputFormat, Report, analyze_file,
    convert_file, crc32_file, format_crc32,
};
use glob::glob;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("FINTRACE_BUILD_COMMIT"),
    " ",
    env!("FINTRACE_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "fintrace")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Offline decoder for fin telemetry captures (.sfr / .sfp).",
    long_about = None,
    after_help = "Examples:\n  fintrace decode dive.sfr -o report.json\n  fintrace convert dive.sfr dive.csv --calibration cal.json\n  fintrace verify dive.sfp"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert between capture formats (sfr -> sfp, sfr -> csv, sfp -> csv).
    #[command(
        after_help = "Examples:\n  fintrace convert dive.sfr dive.sfp --no-strip-padding\n  fintrace convert dive.sfp dive.csv --calibration cal.json"
    )]
    Convert(ConvertArgs),
    /// Decode a capture and write a versioned JSON report.
    #[command(alias = "analyze")]
    Decode(DecodeArgs),
    /// Print the CRC32 of a .sfp file.
    Verify {
        /// Path to a .sfp file
        input: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Source file (.sfr, .sfp or .csv)
    input: PathBuf,

    /// Destination file (.sfp or .csv)
    output: PathBuf,

    /// Input format; detected from the extension when omitted
    #[arg(long, value_parser = parse_input_format)]
    input_type: Option<InputFormat>,

    /// Output format; detected from the extension when omitted
    #[arg(long, value_parser = parse_output_format)]
    output_type: Option<OutputFormat>,

    /// Record armor used by .sfr lines (base64, base64url, base85)
    #[arg(short = 'e', long, default_value_t = Armor::default())]
    encoding: Armor,

    /// Keep padding runs when writing .sfp
    #[arg(long)]
    no_strip_padding: bool,

    /// Calibration JSON applied to SI columns
    #[arg(long)]
    calibration: Option<PathBuf>,

    /// Suppress non-error output
    #[arg(long)]
    quiet: bool,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Path to a .sfr or .sfp file
    input: PathBuf,

    /// Output report path (JSON)
    #[arg(short = 'o', long, required_unless_present = "stdout")]
    report: Option<PathBuf>,

    /// Write JSON report to stdout
    #[arg(long, conflicts_with = "report")]
    stdout: bool,

    /// Pretty-print JSON output
    #[arg(long, conflicts_with = "compact")]
    pretty: bool,

    /// Compact JSON output (default)
    #[arg(long)]
    compact: bool,

    /// Record armor used by .sfr lines (base64, base64url, base85)
    #[arg(short = 'e', long, default_value_t = Armor::default())]
    encoding: Armor,

    /// Suppress non-error output
    #[arg(long)]
    quiet: bool,

    /// Exit with a non-zero code if any issue is reported
    #[arg(long)]
    strict: bool,

    /// List issues after decoding
    #[arg(long)]
    list_issues: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Commands::Convert(args) => cmd_convert(args),
        Commands::Decode(args) => cmd_decode(args),
        Commands::Verify { input } => cmd_verify(input),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let format_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(filter)
        .with(format_layer)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

fn parse_input_format(value: &str) -> Result<InputFormat, String> {
    InputFormat::parse(value).ok_or_else(|| format!("expected sfr, sfp or csv, got '{value}'"))
}

fn parse_output_format(value: &str) -> Result<OutputFormat, String> {
    OutputFormat::parse(value).ok_or_else(|| format!("expected sfp or csv, got '{value}'"))
}

fn cmd_convert(args: ConvertArgs) -> Result<(), CliError> {
    let input = resolve_input_path(&args.input)?;
    require_file(&input, "use a .sfr, .sfp or .csv file")?;

    let input_type = match args.input_type {
        Some(kind) => kind,
        None => InputFormat::from_path(&input).ok_or_else(|| {
            CliError::new(
                format!("cannot detect input format of '{}'", input.display()),
                Some("use --input-type sfr|sfp|csv".to_string()),
            )
        })?,
    };
    let output_type = match args.output_type {
        Some(kind) => kind,
        None => OutputFormat::from_path(&args.output).ok_or_else(|| {
            CliError::new(
                format!("cannot detect output format of '{}'", args.output.display()),
                Some("use --output-type sfp|csv".to_string()),
            )
        })?,
    };
    ensure_distinct_output(&input, &args.output)?;
    create_parent_dir(&args.output)?;

    let calibration = match &args.calibration {
        Some(path) => Calibration::load(path)
            .with_context(|| format!("Failed to load calibration: {}", path.display()))?,
        None => Calibration::default(),
    };
    let options = ConvertOptions {
        armor: args.encoding,
        strip_padding: !args.no_strip_padding,
        calibration,
    };

    let summary = convert_file(&input, input_type, &args.output, output_type, &options)
        .map_err(|err| {
            let hint = matches!(err, ExportError::Unsupported { .. })
                .then(|| "supported: sfr -> sfp, sfr -> csv, sfp -> csv".to_string());
            CliError::new(format!("conversion failed: {err}"), hint)
        })?;
    tracing::debug!(?summary, "conversion finished");

    if !args.quiet {
        if summary.broken_lines > 0 {
            eprintln!("warning: {} broken record lines skipped", summary.broken_lines);
        }
        eprintln!(
            "OK: {} -> {} ({} bytes)",
            input.display(),
            args.output.display(),
            summary.bytes_written
        );
    }
    Ok(())
}

fn cmd_decode(args: DecodeArgs) -> Result<(), CliError> {
    let input = resolve_input_path(&args.input)?;
    validate_capture_file(&input)?;

    let report_path = if args.stdout {
        None
    } else {
        let path = args.report.clone().ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            )
        })?;
        ensure_distinct_output(&input, &path)?;
        Some(path)
    };

    let rep = analyze_file(&input, args.encoding).context("Capture decoding failed")?;
    let json = serialize_report(&rep, args.pretty, args.compact)?;

    match &report_path {
        None => print!("{}", json),
        Some(path) => {
            create_parent_dir(path)?;
            fs::write(path, json)
                .with_context(|| format!("Failed to write report: {}", path.display()))?;
        }
    }

    if args.list_issues && !args.quiet {
        print_issues(&rep);
    }
    if let (Some(path), false) = (&report_path, args.quiet) {
        eprintln!("OK: report written -> {}", path.display());
    }
    if args.strict && !rep.issues.is_empty() {
        return Err(CliError::new(
            "capture issues detected",
            Some("use --list-issues to inspect".to_string()),
        ));
    }
    Ok(())
}

fn cmd_verify(input: PathBuf) -> Result<(), CliError> {
    let input = resolve_input_path(&input)?;
    require_file(&input, "use a .sfp file")?;
    if InputFormat::from_path(&input) != Some(InputFormat::Sfp) {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("verify expects a .sfp file; convert .sfr first".to_string()),
        ));
    }
    let crc = crc32_file(&input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    println!("{}", format_crc32(crc));
    Ok(())
}

fn serialize_report(rep: &Report, pretty: bool, compact: bool) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    let json = if pretty {
        serde_json::to_string_pretty(rep)
    } else {
        serde_json::to_string(rep)
    };
    json.context("JSON serialization failed").map_err(Into::into)
}

fn print_issues(rep: &Report) {
    eprintln!("Issues:");
    for issue in &rep.issues {
        eprintln!("  {} {} ({})", issue.severity, issue.id, issue.count);
        for example in &issue.examples {
            eprintln!("    {}", example);
        }
    }
}

fn require_file(input: &Path, hint: &str) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some(hint.to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some(hint.to_string()),
        ));
    }
    Ok(())
}

fn validate_capture_file(input: &Path) -> Result<(), CliError> {
    require_file(input, "use a .sfr or .sfp file")?;
    match InputFormat::from_path(input) {
        Some(InputFormat::Sfr | InputFormat::Sfp) => Ok(()),
        _ => Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .sfr or .sfp file".to_string()),
        )),
    }
}

fn ensure_distinct_output(input: &Path, output: &Path) -> Result<(), CliError> {
    let input_abs = fs::canonicalize(input)
        .with_context(|| format!("Failed to resolve input path: {}", input.display()))?;
    let Some(file_name) = output.file_name() else {
        return Err(CliError::new(
            format!("invalid output path: {}", output.display()),
            None,
        ));
    };
    let parent = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    // A parent that does not exist yet cannot hold the input.
    if let Ok(parent_abs) = fs::canonicalize(parent) {
        if parent_abs.join(file_name) == input_abs {
            return Err(CliError::new(
                format!("output path must differ from input: {}", output.display()),
                Some("choose a different output path".to_string()),
            ));
        }
    }
    Ok(())
}

fn create_parent_dir(path: &Path) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    let mut matches = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        count => {
            let mut listed = matches
                .iter()
                .take(3)
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            if count > 3 {
                listed.push_str(", ...");
            }
            Err(CliError::new(
                format!("multiple files match pattern '{pattern}' ({count} matches); matches: {listed}"),
                Some("pass a single capture file, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
