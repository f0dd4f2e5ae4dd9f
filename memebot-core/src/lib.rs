//! # memebot-core
//!
//! Core types and traits for the meme bot: [`Bot`], [`Handler`], message and segment types,
//! platform capabilities ([`ProfileLookup`], [`AvatarSource`]) and tracing initialization.
//! Transport-agnostic; used by handler-chain, meme-handlers and memebot-telegram.

pub mod bot;
pub mod error;
pub mod logger;
pub mod profile;
pub mod types;

pub use bot::Bot;
pub use error::{MemebotError, Result};
pub use logger::init_tracing;
pub use profile::{AvatarSource, NoAvatars, NoProfileLookup, ProfileLookup, UserProfile};
pub use types::{
    Chat, Handler, HandlerResponse, Message, ReplySegment, Segment, ToCoreUser, User,
};
