mod commands;

use clap::Parser;
use commands::{execute_command, Commands};

/// Download a Bandcamp wishlist and pick something from it
#[derive(Parser)]
#[command(
    name = "bandcamp-wishlist",
    about = "Download a Bandcamp wishlist and pick something from it",
    long_about = None
)]
struct Cli {
    /// Show debug logging (same as RUST_LOG=debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    let default_level = if args.verbose > 0 { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = execute_command(args.command).await {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }
}
