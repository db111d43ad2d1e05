//! tclass - traffic control class tool
//!
//! Adds, changes, replaces, deletes and shows HTB, HFSC and other classes.

use clap::{Parser, Subcommand};

mod commands;

use commands::class::ClassCmd;

#[derive(Parser)]
#[command(name = "tclass")]
#[command(about = "Traffic control class tool", long_about = None)]
#[command(version)]
struct Cli {
    /// Output JSON
    #[arg(short = 'j', long, global = true)]
    json: bool,

    /// Pretty print JSON
    #[arg(short = 'p', long, global = true)]
    pretty: bool,

    /// Show statistics
    #[arg(short = 's', long, global = true)]
    stats: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage traffic classes
    #[command(visible_alias = "c")]
    Class(ClassCmd),
}

/// Output settings shared by every subcommand.
#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub pretty: bool,
    pub stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let opts = OutputOptions {
        json: cli.json,
        pretty: cli.pretty,
        stats: cli.stats,
    };

    match cli.command {
        Command::Class(cmd) => cmd.run(&opts).await,
    }
}
