//! Meme generation handler: matches a keyword in the message and replies with the rendered image.

use async_trait::async_trait;
use memebot_core::{Bot, Handler, HandlerResponse, Message, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::compress::compress_image;
use crate::config::MemeConfig;
use crate::disabled::DisabledSet;
use crate::manager::MemeManager;

pub const MSG_TIMEOUT: &str = "meme生成超时";

/// Handles messages whose text starts with (or, in fuzzy mode, contains) a meme keyword.
/// Non-matching messages pass through with Continue.
pub struct MemeHandler {
    manager: Arc<MemeManager>,
    disabled: Arc<DisabledSet>,
    bot: Arc<dyn Bot>,
    need_prefix: bool,
    extra_prefix: String,
    fuzzy_match: bool,
    compress: bool,
    compress_max_side: u32,
    timeout: Duration,
}

impl MemeHandler {
    pub fn new(
        manager: Arc<MemeManager>,
        disabled: Arc<DisabledSet>,
        bot: Arc<dyn Bot>,
        config: &MemeConfig,
    ) -> Self {
        Self {
            manager,
            disabled,
            bot,
            need_prefix: config.need_prefix,
            extra_prefix: config.extra_prefix.clone(),
            fuzzy_match: config.fuzzy_match,
            compress: config.compress_image,
            compress_max_side: config.compress_max_side,
            timeout: config.timeout,
        }
    }

    /// Text after the prefix rules, or `None` when the message is not for us.
    fn strip_prefix<'a>(&self, message: &'a Message) -> Option<&'a str> {
        if self.need_prefix && !message.addressed {
            return None;
        }
        let text = message.text.trim();
        let text = if self.extra_prefix.is_empty() {
            text
        } else {
            text.strip_prefix(self.extra_prefix.as_str())?.trim_start()
        };
        (!text.is_empty()).then_some(text)
    }

    async fn matched_keyword(&self, message: &Message) -> Option<String> {
        let text = self.strip_prefix(message)?;
        let keyword = self
            .manager
            .matcher()
            .match_keyword(text, self.fuzzy_match)?
            .to_string();
        if self.disabled.contains(&keyword).await {
            debug!(keyword = %keyword, "Meme is disabled");
            return None;
        }
        Some(keyword)
    }

    async fn maybe_compress(&self, image: Vec<u8>) -> Vec<u8> {
        if !self.compress {
            return image;
        }
        let max_side = self.compress_max_side;
        let input = image.clone();
        match tokio::task::spawn_blocking(move || compress_image(&input, max_side)).await {
            Ok(Some(smaller)) => smaller,
            Ok(None) => image,
            Err(e) => {
                warn!(error = %e, "Compression task failed; sending original");
                image
            }
        }
    }
}

#[async_trait]
impl Handler for MemeHandler {
    #[instrument(skip(self, message), fields(chat_id = message.chat.id, user_id = %message.sender.id))]
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        let Some(keyword) = self.matched_keyword(message).await else {
            return Ok(HandlerResponse::Continue);
        };
        info!(keyword = %keyword, "Generating meme");

        let image = match tokio::time::timeout(self.timeout, self.manager.generate(message, &keyword)).await {
            Err(_) => {
                warn!(keyword = %keyword, timeout_secs = self.timeout.as_secs(), "Meme generation timed out");
                if let Err(e) = self.bot.reply_to(message, MSG_TIMEOUT).await {
                    error!(error = %e, "Failed to send timeout reply");
                }
                return Ok(HandlerResponse::Stop);
            }
            Ok(Err(e)) => {
                error!(keyword = %keyword, error = %e, "Meme generation failed");
                return Ok(HandlerResponse::Stop);
            }
            Ok(Ok(None)) => {
                warn!(keyword = %keyword, "Keyword matched but no meme answers to it");
                return Ok(HandlerResponse::Stop);
            }
            Ok(Ok(Some(image))) => image,
        };

        let image = self.maybe_compress(image).await;
        if let Err(e) = self.bot.send_image(&message.chat, image, None).await {
            error!(error = %e, "Failed to send meme");
        }
        Ok(HandlerResponse::Stop)
    }
}
