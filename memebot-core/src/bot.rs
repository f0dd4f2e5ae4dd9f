//! Bot abstraction for sending replies.
//!
//! [`Bot`] is transport-agnostic; memebot-telegram provides the teloxide implementation.

use crate::error::Result;
use crate::types::{Chat, Message};
use async_trait::async_trait;

/// Sends text and images to a chat. Implementations map to a transport (e.g. Telegram).
#[async_trait]
pub trait Bot: Send + Sync {
    /// Sends a text message to the given chat.
    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()>;
    /// Sends an image (raw encoded bytes) with an optional caption.
    async fn send_image(&self, chat: &Chat, image: Vec<u8>, caption: Option<&str>) -> Result<()>;
    /// Replies to the given message (same chat).
    async fn reply_to(&self, message: &Message, text: &str) -> Result<()> {
        self.send_message(&message.chat, text).await
    }
}
