//! # memebot-cli
//!
//! Command-line entry: argument parsing and assembly of the bot from config.

pub mod app;
pub mod cli;

pub use app::{build_chain, print_catalog, print_info, run_bot};
pub use cli::{Cli, Commands};
