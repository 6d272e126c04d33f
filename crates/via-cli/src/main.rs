//! Via CLI - Command-line interface for via voice card patches.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "via")]
#[command(author, version, about = "Via voice card DSP CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a patch to a WAV file
    Render(commands::render::RenderArgs),

    /// Show the static lookup tables
    Tables(commands::tables::TablesArgs),

    /// Write a factory patch to a TOML file
    ExamplePatch(commands::example_patch::ExamplePatchArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Tables(args) => commands::tables::run(args),
        Commands::ExamplePatch(args) => commands::example_patch::run(args),
    }
}
