use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::OnceLock;

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use userprep_core::{run, validate, PrepResult, RunOptions, ValidateOptions};

mod output;

use output::OutputMode;

static LOGGER: OnceLock<()> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(
    name = "userprep",
    version = env!("USERPREP_VERSION"),
    about = "Types and deduplicates user records into Parquet",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the job config without touching storage.
    Validate {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Load, deduplicate and write (the default).
    Run(RunArgs),
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// YAML job config; built-in locations are used without it.
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
    #[arg(short, long)]
    verbose: bool,
}

impl RunArgs {
    fn output_mode(&self) -> OutputMode {
        if self.quiet {
            OutputMode::Quiet
        } else if self.verbose {
            OutputMode::Verbose
        } else {
            OutputMode::Default
        }
    }
}

fn init_logging(mode: OutputMode) {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            let level = match mode {
                OutputMode::Quiet => LevelFilter::Warn,
                OutputMode::Default => LevelFilter::Info,
                OutputMode::Verbose => LevelFilter::Debug,
            };
            builder
                .filter_module("userprep_core", level)
                .filter_module("userprep", level);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> PrepResult<()> {
    match cli.command {
        Some(Command::Validate { config }) => {
            init_logging(OutputMode::Default);
            let config = config.map(resolve_path).transpose()?;
            validate(ValidateOptions {
                config: config.clone(),
            })?;
            match config {
                Some(path) => println!("config at {} is valid", path.display()),
                None => println!("built-in defaults are valid"),
            }
            Ok(())
        }
        Some(Command::Run(args)) => execute_run(args),
        None => execute_run(cli.run),
    }
}

fn execute_run(args: RunArgs) -> PrepResult<()> {
    let mode = args.output_mode();
    init_logging(mode);
    let options = RunOptions {
        config: args.config.map(resolve_path).transpose()?,
        run_id: args.run_id,
    };
    let outcome = run(options)?;
    println!("{}", output::format_run_output(&outcome, mode));
    Ok(())
}

fn resolve_path(path: PathBuf) -> PrepResult<PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
