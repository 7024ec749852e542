mod commands;
mod helpers;

use clap::Parser;
use raman_core::domain::RamanError;
use tracing_subscriber::EnvFilter;

const PROGRAM_NAME: &str = "raman-thermo";
const LOG_ENV_VAR: &str = "RAMAN_LOG";

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let raman_error = error.as_raman_error();
            eprintln!("{}", raman_error.diagnostic_line());
            if let Some(summary_line) = raman_error.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            raman_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once(PROGRAM_NAME.to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            init_logging(cli.verbose);
            dispatch_parsed(cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

/// Logs go to stderr. `--verbose` forces debug, otherwise `RAMAN_LOG`
/// is honoured with `warn` as the fallback.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "raman-thermo",
    version,
    about = "Raman D/G band analysis and calibration-based temperature estimation"
)]
struct Cli {
    /// Emit debug logs on stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Locate D and G peaks and report ratios and widths per spectrum
    Analyze(commands::AnalyzeArgs),
    /// Build calibration curves from reference spectra and estimate temperatures
    Calibrate(commands::CalibrateArgs),
    /// Compare simple and voigt results on the same spectra
    Compare(commands::CompareArgs),
    /// Subtract a linear baseline and write the corrected spectrum
    Baseline(commands::BaselineArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Analyze(args) => commands::run_analyze_command(args),
        CliCommand::Calibrate(args) => commands::run_calibrate_command(args),
        CliCommand::Compare(args) => commands::run_compare_command(args),
        CliCommand::Baseline(args) => commands::run_baseline_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(RamanError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_raman_error(&self) -> RamanError {
        match self {
            Self::Usage(message) => RamanError::input_validation("INPUT.CLI_USAGE", message.clone()),
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => RamanError::io_system("IO.CLI", format!("{error:#}")),
        }
    }

    fn compute(error: impl Into<RamanError>) -> Self {
        Self::Compute(error.into())
    }
}
