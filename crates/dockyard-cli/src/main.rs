mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dockyard",
    about = "Build and deploy applications to your own Docker hosts"
)]
#[command(version)]
struct Cli {
    /// Directory holding dockyard.toml
    #[arg(long, global = true, default_value = ".")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one queued build job from a JSON file
    Run {
        /// Job payload (JSON)
        job: PathBuf,
    },
    /// Build and deploy an application record, then save it back
    Deploy {
        /// Application record (JSON); updated in place after the build
        application: PathBuf,
        /// Destination backend (JSON)
        #[arg(long)]
        destination: PathBuf,
        /// Source origin (JSON)
        #[arg(long)]
        source: PathBuf,
    },
    /// Run build jobs read from stdin, one JSON object per line
    Worker,
    /// Print the configuration fingerprint of an application record
    Fingerprint {
        /// Application record (JSON)
        application: PathBuf,
    },
    /// Eject the generated Dockerfile for manual customization
    Eject {
        /// Application record (JSON) selecting the buildpack and commands
        application: PathBuf,
        /// Repository to eject into
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Check docker, the destination network, and the proxy control plane
    Doctor {
        /// Destination backend (JSON); the local engine and the `dockyard`
        /// network when omitted
        #[arg(long)]
        destination: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let dotenv_loaded = dotenvy::dotenv().is_ok();
    tracing::debug!(dotenv = dotenv_loaded, "environment loaded");

    let cli = Cli::parse();
    let config_dir = cli.config_dir;

    match cli.command {
        Commands::Run { job } => commands::run(&config_dir, &job).await?,
        Commands::Deploy {
            application,
            destination,
            source,
        } => commands::deploy(&config_dir, &application, &destination, &source).await?,
        Commands::Worker => commands::worker(&config_dir).await?,
        Commands::Fingerprint { application } => commands::fingerprint(&application)?,
        Commands::Eject { application, dir } => commands::eject(&config_dir, &application, &dir)?,
        Commands::Doctor { destination } => {
            commands::doctor(&config_dir, destination.as_deref()).await?
        }
    }

    Ok(())
}
