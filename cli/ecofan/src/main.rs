//! ecofan CLI: validate configuration documents and emit construction programs.

mod commands;
mod document;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use ecofan_emit::PassOptions;
use ecofan_schema::UnknownKeys;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ecofan", version, about = "Itho ecofan RF configuration compiler")]
struct Cli {
    /// Log more (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a configuration document without emitting anything
    Validate {
        /// Document to check (.yaml, .yml, .toml or .json)
        file: PathBuf,
        #[command(flatten)]
        pass: PassArgs,
    },
    /// Emit the construction program for a configuration document
    Emit {
        /// Document to compile (.yaml, .yml, .toml or .json)
        file: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
        #[command(flatten)]
        pass: PassArgs,
    },
    /// List the components, platforms and actions ecofan knows about
    Components,
}

#[derive(clap::Args)]
struct PassArgs {
    /// Treat keys a schema does not declare as errors
    #[arg(long)]
    strict: bool,
    /// Do not require the components an entry depends on
    #[arg(long)]
    no_deps: bool,
}

impl PassArgs {
    fn options(&self) -> PassOptions {
        PassOptions {
            unknown_keys: self.strict.then_some(UnknownKeys::Reject),
            enforce_dependencies: !self.no_deps,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Validate { file, pass } => commands::validate::run(&file, &pass.options()),
        Commands::Emit {
            file,
            format,
            output,
            pass,
        } => commands::emit::run(&file, format, output.as_deref(), &pass.options()),
        Commands::Components => commands::components::run(),
    }
}
