use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod build;
mod commands;
mod config;
mod server;

#[derive(Parser)]
#[command(name = "lightsites", version, about)]
struct Args {
    /// The command to execute
    #[command(subcommand)]
    command: LightsitesCommand,
}

#[derive(Parser)]
struct InitArgs {
    /// The path to initialize the project in
    path: PathBuf,

    /// Whether to create the directory if it doesn't exist
    #[arg(short, long, default_value = "false")]
    create: bool,
}

#[derive(Parser)]
struct BuildArgs {
    /// The path to the configuration file
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
    config_file: Option<PathBuf>,

    /// Directory the rendered pages are written to
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Parser)]
struct ServeArgs {
    /// The path to the configuration file
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
    config_file: Option<PathBuf>,

    /// The address to bind to, overriding `listen_addr`
    #[arg(short, long)]
    bind: Option<String>,

    /// Only refresh on the periodic interval, never on file changes
    #[arg(long, default_value = "false")]
    no_watch: bool,

    /// Open the site in the default browser
    #[arg(short, long, default_value = "false")]
    open: bool,

    /// Log every request and refresh (same as RUST_LOG=info)
    #[arg(short, long, default_value = "false")]
    verbose: bool,
}

#[derive(Subcommand)]
enum LightsitesCommand {
    /// Write a default config file
    Init(InitArgs),

    /// Render every document once into a directory
    Build(BuildArgs),

    /// Serve the rendered documents, refreshing them periodically
    Serve(ServeArgs),
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    let verbose = matches!(&args.command, LightsitesCommand::Serve(serve) if serve.verbose);
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lightsites=info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match args.command {
        LightsitesCommand::Init(args) => {
            commands::init::run(&args).await?;
        }
        LightsitesCommand::Build(args) => {
            commands::build::run(&args).await?;
        }
        LightsitesCommand::Serve(args) => {
            commands::serve::run(&args).await?;
        }
    }

    Ok(())
}
