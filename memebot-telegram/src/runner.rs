//! REPL runner: converts teloxide messages to core::Message and passes them to HandlerChain.

use anyhow::Result;
use base64::Engine;
use handler_chain::HandlerChain;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::BotCommand;
use tracing::{error, info, instrument, warn};

use crate::adapters::{BotIdentity, TelegramMessageWrapper};
use crate::directory::{download_photo, TelegramDirectory};

/// Commands shown in the Telegram command menu.
pub fn meme_bot_commands() -> Vec<BotCommand> {
    [
        ("memes", "查看meme列表"),
        ("meme_info", "查看meme详情"),
        ("meme_disable", "禁用meme"),
        ("meme_enable", "启用meme"),
        ("meme_blacklist", "查看禁用的meme"),
    ]
    .into_iter()
    .map(|(command, description)| BotCommand {
        command: command.to_string(),
        description: description.to_string(),
    })
    .collect()
}

/// Largest size of the message's photo as a `base64://` source.
async fn photo_source(bot: &teloxide::Bot, msg: &teloxide::types::Message) -> Option<String> {
    let photo = msg.photo()?.last()?;
    let data = download_photo(bot, photo).await?;
    Some(format!(
        "base64://{}",
        base64::engine::general_purpose::STANDARD.encode(data)
    ))
}

/// Looks up the bot's own id and username.
pub async fn fetch_identity(bot: &teloxide::Bot) -> Result<BotIdentity> {
    let me = bot.get_me().await?;
    Ok(BotIdentity {
        id: me.user.id.0.to_string(),
        username: me.user.username.clone(),
    })
}

/// Starts the REPL. Each message is converted (downloading photos only when the message has
/// text that could trigger a meme) and run through the chain in its own task.
#[instrument(skip(bot, handler_chain, directory))]
pub async fn run_repl(
    bot: teloxide::Bot,
    handler_chain: HandlerChain,
    directory: Arc<TelegramDirectory>,
    me: BotIdentity,
) -> Result<()> {
    if let Err(e) = bot.set_my_commands(meme_bot_commands()).await {
        warn!(error = %e, "Failed to register bot commands");
    }
    info!(bot_id = %me.id, username = ?me.username, "Bot identity resolved");

    let chain = handler_chain;
    teloxide::repl(
        bot,
        move |bot: Bot, msg: teloxide::types::Message| {
            let chain = chain.clone();
            let directory = directory.clone();
            let me = me.clone();

            async move {
                directory.remember_message(&msg);

                tokio::spawn(async move {
                    let has_text = msg.text().or_else(|| msg.caption()).is_some();
                    let (photo, reply_photo) = if has_text {
                        let photo = photo_source(&bot, &msg).await;
                        let reply_photo = match msg.reply_to_message() {
                            Some(reply) => photo_source(&bot, reply).await,
                            None => None,
                        };
                        (photo, reply_photo)
                    } else {
                        (None, None)
                    };

                    let core_msg = TelegramMessageWrapper::new(&msg, &me, &directory)
                        .with_photos(photo, reply_photo)
                        .to_core();
                    info!(
                        user_id = %core_msg.sender.id,
                        chat_id = core_msg.chat.id,
                        message_id = %core_msg.id,
                        segments = core_msg.segments.len(),
                        addressed = core_msg.addressed,
                        "Received message"
                    );

                    if let Err(e) = chain.handle(&core_msg).await {
                        error!(error = %e, user_id = %core_msg.sender.id, "Handler chain failed");
                    }
                });

                Ok(())
            }
        },
    )
    .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meme_bot_commands_are_valid_telegram_commands() {
        let commands = meme_bot_commands();
        assert_eq!(commands.len(), 5);
        for c in &commands {
            assert!(c
                .command
                .chars()
                .all(|ch| ch.is_ascii_lowercase() || ch == '_'));
        }
    }
}
