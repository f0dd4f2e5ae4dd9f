//! memebot CLI: run the Telegram bot, or inspect the meme catalog. Config from env (.env supported).

use anyhow::Result;
use clap::Parser;
use memebot_cli::{print_catalog, print_info, run_bot, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { token } => run_bot(token).await,
        Commands::Memes => print_catalog().await,
        Commands::Info { keyword } => print_info(&keyword).await,
    }
}
