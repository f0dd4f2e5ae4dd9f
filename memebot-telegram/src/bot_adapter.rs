//! Wraps teloxide::Bot and implements [`memebot_core::Bot`]. Production code sends messages via Telegram; tests can substitute another Bot impl.

use async_trait::async_trait;
use memebot_core::{Bot as CoreBot, Chat, MemebotError, Result};
use teloxide::payloads::{SendAnimationSetters, SendPhotoSetters};
use teloxide::{prelude::*, types::ChatId, types::InputFile};

const GIF_MAGIC: &[u8] = b"GIF8";

/// Thin wrapper around teloxide::Bot that implements memebot-core's Bot trait.
pub struct TelegramBotAdapter {
    bot: teloxide::Bot,
}

impl TelegramBotAdapter {
    /// Creates an adapter from an existing teloxide Bot.
    pub fn new(bot: teloxide::Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl CoreBot for TelegramBotAdapter {
    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(chat.id), text.to_string())
            .await
            .map_err(|e| MemebotError::Bot(e.to_string()))?;
        Ok(())
    }

    /// GIFs go out as animations so they keep playing; everything else as a photo.
    async fn send_image(&self, chat: &Chat, image: Vec<u8>, caption: Option<&str>) -> Result<()> {
        if image.starts_with(GIF_MAGIC) {
            let request = self
                .bot
                .send_animation(ChatId(chat.id), InputFile::memory(image).file_name("meme.gif"));
            let request = match caption {
                Some(caption) => request.caption(caption.to_string()),
                None => request,
            };
            request
                .await
                .map_err(|e| MemebotError::Bot(e.to_string()))?;
            return Ok(());
        }

        let request = self
            .bot
            .send_photo(ChatId(chat.id), InputFile::memory(image).file_name("meme"));
        let request = match caption {
            Some(caption) => request.caption(caption.to_string()),
            None => request,
        };
        request
            .await
            .map_err(|e| MemebotError::Bot(e.to_string()))?;
        Ok(())
    }
}
