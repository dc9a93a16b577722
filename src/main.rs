use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use learnforge::config::Config;

mod cli;

#[derive(Parser)]
#[command(name = "learnforge")]
#[command(about = "Learnforge - XP, streaks, badges and quizzes for self-paced AI lessons")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.learnforge/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the JSON HTTP API (default)
    Serve {
        /// Address to bind, overrides server.bind
        #[arg(long)]
        bind: Option<String>,

        /// Port to listen on, overrides server.port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Write a config file with default settings
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Load students and topics from a catalog file
    Seed {
        /// Catalog TOML file
        #[arg(long, default_value = "demo/catalog.toml")]
        catalog: PathBuf,
    },

    /// Show the leaderboard
    Leaderboard {
        /// all or weekly
        #[arg(long, default_value = "all")]
        period: String,
    },

    /// Show a learner's progress
    Student {
        /// Student name
        name: String,
    },

    /// Rebuild cached streaks and XP totals from the event history
    Repair {
        /// Only repair this student
        #[arg(long)]
        student: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let command = match cli.command {
        Some(Commands::Init { force }) => return cli::init::init_command(cli.config, force),
        Some(command) => command,
        None => Commands::Serve {
            bind: None,
            port: None,
        },
    };

    let config = Config::load(cli.config.as_deref())?;

    match command {
        Commands::Serve { bind, port } => {
            cli::serve::serve_command(config, bind, port).await?;
        }
        Commands::Init { .. } => {}
        Commands::Seed { catalog } => {
            cli::seed::seed_command(&config, &catalog)?;
        }
        Commands::Leaderboard { period } => {
            cli::leaderboard::leaderboard_command(&config, &period)?;
        }
        Commands::Student { name } => {
            cli::student::student_command(&config, &name)?;
        }
        Commands::Repair { student } => {
            cli::repair::repair_command(&config, student)?;
        }
    }

    Ok(())
}
