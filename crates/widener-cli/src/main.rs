//! Widener CLI - process, play and configure the stereo widener.

mod commands;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "widener")]
#[command(author, version, about = "Two-band stereo widener", long_about = None)]
struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Widen a WAV file
    Process(commands::process::ProcessArgs),

    /// Play a WAV file through the widener
    Play(commands::play::PlayArgs),

    /// Show WAV file information
    Info(commands::info::InfoArgs),

    /// List the control parameters
    Params(commands::params::ParamsArgs),

    /// Manage presets
    Presets(commands::presets::PresetsArgs),

    /// Generate or inspect decorrelation tables
    Table(commands::table::TableArgs),

    /// List audio output devices
    Devices(commands::devices::DevicesArgs),
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
    tracing_log::LogTracer::init().ok();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Process(args) => commands::process::run(args),
        Commands::Play(args) => commands::play::run(args),
        Commands::Info(args) => commands::info::run(args),
        Commands::Params(args) => commands::params::run(args),
        Commands::Presets(args) => commands::presets::run(args),
        Commands::Table(args) => commands::table::run(args),
        Commands::Devices(args) => commands::devices::run(args),
    }
}
