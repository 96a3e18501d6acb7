// loganyapp - main.rs
//
// Command-line entry point. Handles:
// 1. CLI argument parsing
// 2. Build argument loading (config file, then CLI overrides)
// 3. Context capture, with the arguments after `--` as the target argv
// 4. Configuration build and, unless --no-init, activation

use loganyapp::app::setup::{self, InitOutcome};
use loganyapp::core::args::BuildArgs;
use loganyapp::core::context::ResolutionContext;
use loganyapp::platform::config::{self, PlatformPaths};
use loganyapp::util;
use loganyapp::util::error::Result;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

/// loganyapp: resolve a logging configuration and activate it.
///
/// Levels come from (highest first) the config file's `level`, flags in the
/// target arguments (`--log-level`, `--debug`, ...), environment variables
/// (`LOG_LEVEL`, `FILE_DEBUG`, ...) and built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "loganyapp", version, about)]
struct Cli {
    /// Config file with build arguments (default: the platform config dir).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Program name used for default paths and the syslog ident.
    #[arg(short = 'n', long = "name")]
    name: Option<String>,

    /// Print the resolved configuration to stderr before activation.
    #[arg(long = "dump")]
    dump: bool,

    /// Build the configuration without activating it.
    #[arg(long = "no-init")]
    no_init: bool,

    /// Print the backend configuration to stdout.
    #[arg(short = 'p', long = "print")]
    print: bool,

    /// Enable debug diagnostics (with --no-init; equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Arguments of the program being configured.
    #[arg(last = true)]
    args: Vec<String>,
}

fn load_args(cli: &Cli) -> Result<BuildArgs> {
    let mut args = match cli.config {
        Some(ref path) => config::load_args(path)?,
        None => config::load_default_args(&PlatformPaths::resolve())?,
    };
    if let Some(ref name) = cli.name {
        args.name = Some(name.clone());
    }
    if cli.dump {
        args.dump = Some(true);
    }
    if cli.no_init {
        args.init = false;
    }
    Ok(args)
}

fn run(cli: &Cli) -> Result<()> {
    let args = load_args(cli)?;
    let ctx = ResolutionContext::from_process().with_args(cli.args.iter().cloned());

    let built = match setup::init_with_context(&args, &ctx)? {
        InitOutcome::Activated(built) => {
            tracing::info!(
                version = util::constants::APP_VERSION,
                name = %built.setup.name,
                outputs = built.setup.outputs.len(),
                "loganyapp started"
            );
            built
        }
        InitOutcome::BuiltOnly(built) => built,
        InitOutcome::AlreadyInitialized => return Ok(()),
    };

    if cli.print {
        print!("{}", built.config.to_text()?);
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_init {
        util::logging::init(cli.debug);
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Configuration failed");
            eprintln!("{}: {e}", util::constants::APP_NAME);
            ExitCode::FAILURE
        }
    }
}
