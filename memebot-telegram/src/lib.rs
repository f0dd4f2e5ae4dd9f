//! # memebot-telegram
//!
//! Telegram transport: converts teloxide messages to [`memebot_core::Message`] segment chains,
//! implements [`memebot_core::Bot`], resolves profiles and avatars through the Bot API, and runs
//! the REPL that feeds the handler chain.

mod adapters;
mod bot_adapter;
mod config;
mod directory;
mod runner;

pub use adapters::{
    rewrite_mentions, BotIdentity, MentionSpan, MentionTarget, RewrittenText,
    TelegramMessageWrapper, TelegramUserWrapper,
};
pub use bot_adapter::TelegramBotAdapter;
pub use config::TelegramConfig;
pub use directory::TelegramDirectory;
pub use runner::{fetch_identity, meme_bot_commands, run_repl};
