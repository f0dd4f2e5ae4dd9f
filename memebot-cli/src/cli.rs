//! CLI parser.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "memebot")]
#[command(about = "Telegram meme bot backed by a meme rendering service", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Run the Telegram bot (config from env; token can override BOT_TOKEN).
    Run {
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Print the meme catalog of MEME_SERVER_URL: key and keywords per line.
    Memes,
    /// Print the details of the meme answering to a keyword.
    Info { keyword: String },
}
