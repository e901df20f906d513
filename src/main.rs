use clap::{CommandFactory, Parser};
use log::LevelFilter;
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;
use trimimage::config::{self, ConfigError};
use trimimage::imaging::{ParamError, TrimSpec};
use trimimage::output;
use trimimage::process::{self, ProcessError};

fn version_string() -> &'static str {
    let on_tag = env!("TRIMIMAGE_ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("TRIMIMAGE_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "trimimage")]
#[command(about = "Trim image borders or crop to an aspect ratio, in bulk")]
#[command(long_about = "\
Trim image borders or crop to an aspect ratio, in bulk

Every supported image (jpg, jpeg, png, gif, bmp, tif, tiff) selected by
PATHNAME is cropped and written to a Corrected folder next to it. Sources are
never modified and Corrected folders are never descended into.

PATHNAME forms:

  photos/          the folder and all of its sub-folders
  .                the current folder and all of its sub-folders
  photos/*.JPG     matching entries in photos/ (sub-folders only if they match)
  photos/231.JPG   a single file

PARAMS (1 to 5, keys are case-insensitive):

  t=<pixels>       trim from the top
  b=<pixels>       trim from the bottom
  l=<pixels>       trim from the left
  r=<pixels>       trim from the right
  a=<W:H>          crop to this aspect ratio, centred; overrides t/b or l/r
                   on the axis it shortens. Orientation follows each image:
                   a=3:2 gives 3:2 on landscape images and 2:3 on portrait ones.

Examples:

  trimimage photos/ t=20 b=20
  trimimage \"scans/*.tif\" a=4:5

Run 'trimimage --gen-config' to print a documented trimimage.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Folder, wildcard pattern, or single image to trim
    #[arg(required_unless_present = "gen_config")]
    pathname: Option<String>,

    /// Trim parameters: t=, b=, l=, r= (pixels) and a= (W:H)
    #[arg(num_args = 1..=5, required_unless_present = "gen_config")]
    params: Vec<String>,

    /// Config file (default: trimimage.toml in the target folder, if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print a stock trimimage.toml with all options documented
    #[arg(long)]
    gen_config: bool,
}

/// Fatal errors, each with a stable exit code.
#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Params(#[from] ParamError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Config(_) => 2,
            CliError::Process(ProcessError::InvalidPath(_)) => 4,
            CliError::Params(_) => 5,
            CliError::Process(_) => 1,
        }
    }

    fn report(&self) {
        match self {
            CliError::Process(ProcessError::InvalidPath(raw)) => {
                for line in output::format_invalid_path(raw) {
                    eprintln!("{}", line);
                }
            }
            CliError::Params(e) => {
                eprintln!("error: {e}");
                eprintln!();
                eprintln!("{}", Cli::command().render_usage());
            }
            other => eprintln!("error: {other}"),
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    };

    // RUST_LOG, when set, takes precedence over the flags
    env_logger::Builder::new()
        .filter_level(level)
        .format_target(false)
        .format_timestamp(None)
        .parse_env("RUST_LOG")
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    if cli.gen_config {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let raw_path = cli.pathname.unwrap_or_default();
    let plan = process::check_root(&raw_path)?;
    let spec = TrimSpec::from_params(cli.params.as_slice())?;
    let config = config::load_config(cli.config.as_deref(), &plan.base_folder)?;
    log::debug!("{spec:?} with {config:?}");

    output::print_given_path(&raw_path);
    let summary = process::process(&plan, &spec, &config, |event| {
        output::print_process_event(&event)
    })?;
    output::print_summary(&summary);

    Ok(())
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are not failures
            let code = if e.use_stderr() { 3 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    init_logging(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            ExitCode::from(e.exit_code())
        }
    }
}
