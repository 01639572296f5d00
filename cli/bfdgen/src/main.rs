//! bfdgen: discover which architectures an installed libbfd/libopcodes
//! supports and generate the build artifacts that depend on it.

mod commands;
mod manifest;
mod settings;

use std::process;

use clap::{ArgAction, Parser, Subcommand};

use commands::Format;
use settings::{Overrides, Settings};

#[derive(Parser)]
#[command(
    name = "bfdgen",
    version,
    about = "Discover the architectures an installed binutils supports"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug; RUST_LOG overrides)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe the libraries, run the bootstrap program and write the generated files
    Generate {
        /// Report format (human, json)
        #[arg(long)]
        format: Option<String>,
    },
    /// List the machine identifiers declared in the header
    Machines {
        /// Output format (human, json)
        #[arg(long)]
        format: Option<String>,
    },
    /// Show which machine identifiers have a disassembler in libopcodes
    Probe {
        /// Output format (human, json)
        #[arg(long)]
        format: Option<String>,
    },
    /// Check configuration, host policy and toolchain
    Doctor,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("[-] error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::load(&cli.overrides, &cwd)?;
    log::debug!("resolved settings: {settings:?}");

    match cli.command {
        Commands::Generate { format } => {
            commands::generate::run(&settings, Format::parse(format.as_deref())?)
        }
        Commands::Machines { format } => {
            commands::machines::run(&settings, Format::parse(format.as_deref())?)
        }
        Commands::Probe { format } => {
            commands::probe::run(&settings, Format::parse(format.as_deref())?)
        }
        Commands::Doctor => commands::doctor::run(&settings),
    }
}
