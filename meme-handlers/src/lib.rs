//! # meme-handlers
//!
//! Turns chat messages into meme renders: keyword matching, parameter collection with
//! reply/mention/avatar fallbacks, the persisted disabled list, and the two chain handlers
//! ([`MemeHandler`] for generation, [`MemeCommandHandler`] for help/detail/enable/disable).

pub mod collector;
pub mod command_handler;
pub mod compress;
pub mod config;
pub mod disabled;
pub mod fetch;
pub mod manager;
pub mod matcher;
pub mod meme_handler;

pub use collector::{CollectedParams, ParamsCollector, BOT_LABEL};
pub use command_handler::{MemeCommand, MemeCommandHandler};
pub use compress::compress_image;
pub use config::{AvatarSourceKind, MemeConfig};
pub use disabled::DisabledSet;
pub use fetch::{is_numeric_id, ImageFetcher, TemplateAvatars, DEFAULT_AVATAR_URL_TEMPLATE};
pub use manager::{describe, MemeManager};
pub use matcher::KeywordMatcher;
pub use meme_handler::{MemeHandler, MSG_TIMEOUT};
