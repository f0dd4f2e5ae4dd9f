//! Meme management commands: help (list image), detail, enable, disable, list disabled.

use async_trait::async_trait;
use memebot_core::{Bot, Handler, HandlerResponse, Message, Result};
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::disabled::DisabledSet;
use crate::manager::MemeManager;

const HELP_ALIASES: &[&str] = &["meme帮助", "表情帮助", "meme菜单", "meme列表", "memes"];
const DETAIL_ALIASES: &[&str] = &["meme详情", "表情详情", "meme信息", "meme_info"];
const DISABLE_ALIASES: &[&str] = &["禁用meme", "meme_disable"];
const ENABLE_ALIASES: &[&str] = &["启用meme", "meme_enable"];
const LIST_DISABLED_ALIASES: &[&str] = &["meme黑名单", "meme_blacklist"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemeCommand {
    Help,
    Detail(Option<String>),
    Disable(Option<String>),
    Enable(Option<String>),
    ListDisabled,
}

impl MemeCommand {
    /// Parses `[/]command[@botname] [argument]`. Returns `None` for anything else.
    pub fn parse(text: &str) -> Option<Self> {
        let mut tokens = text.split_whitespace();
        let head = tokens.next()?;
        let head = head.strip_prefix('/').unwrap_or(head);
        let head = head.split('@').next().unwrap_or(head);
        let arg = tokens.next().map(str::to_string);

        if HELP_ALIASES.contains(&head) {
            Some(Self::Help)
        } else if DETAIL_ALIASES.contains(&head) {
            Some(Self::Detail(arg))
        } else if DISABLE_ALIASES.contains(&head) {
            Some(Self::Disable(arg))
        } else if ENABLE_ALIASES.contains(&head) {
            Some(Self::Enable(arg))
        } else if LIST_DISABLED_ALIASES.contains(&head) {
            Some(Self::ListDisabled)
        } else {
            None
        }
    }
}

/// Answers meme commands. Place before [`crate::MemeHandler`] so commands are not treated
/// as meme keywords.
pub struct MemeCommandHandler {
    manager: Arc<MemeManager>,
    disabled: Arc<DisabledSet>,
    bot: Arc<dyn Bot>,
}

impl MemeCommandHandler {
    pub fn new(manager: Arc<MemeManager>, disabled: Arc<DisabledSet>, bot: Arc<dyn Bot>) -> Self {
        Self {
            manager,
            disabled,
            bot,
        }
    }

    async fn reply(&self, message: &Message, text: &str) {
        if let Err(e) = self.bot.reply_to(message, text).await {
            error!(error = %e, "Failed to send command reply");
        }
    }

    async fn send_image(&self, message: &Message, image: Vec<u8>, caption: Option<&str>) {
        if let Err(e) = self.bot.send_image(&message.chat, image, caption).await {
            error!(error = %e, "Failed to send command image");
        }
    }

    async fn help(&self, message: &Message) {
        match self.manager.render_meme_list().await {
            Some(image) => self.send_image(message, image, None).await,
            None => self.reply(message, "meme列表图生成失败").await,
        }
    }

    async fn detail(&self, message: &Message, keyword: Option<String>) {
        let Some(keyword) = keyword else {
            self.reply(message, "未指定要查看的meme").await;
            return;
        };
        match self.manager.meme_details(&keyword).await {
            None => self.reply(message, "未找到相关meme").await,
            Some((text, Some(preview))) => self.send_image(message, preview, Some(&text)).await,
            Some((text, None)) => self.reply(message, &text).await,
        }
    }

    async fn disable(&self, message: &Message, name: Option<String>) {
        let Some(name) = name else {
            self.reply(message, "未指定要禁用的meme").await;
            return;
        };
        if !self.manager.matcher().is_keyword(&name) {
            self.reply(message, &format!("meme: {} 不存在", name)).await;
            return;
        }
        match self.disabled.disable(&name).await {
            Ok(true) => {
                info!(meme = %name, user_id = %message.sender.id, "Meme disabled");
                self.reply(message, &format!("已禁用meme: {}", name)).await;
            }
            Ok(false) => {
                self.reply(message, &format!("meme: {} 已被禁用", name)).await;
            }
            Err(e) => {
                error!(meme = %name, error = %e, "Failed to disable meme");
                self.reply(message, &format!("禁用meme失败: {}", name)).await;
            }
        }
    }

    async fn enable(&self, message: &Message, name: Option<String>) {
        let Some(name) = name else {
            self.reply(message, "未指定要启用的meme").await;
            return;
        };
        if !self.manager.matcher().is_keyword(&name) {
            self.reply(message, &format!("meme: {} 不存在", name)).await;
            return;
        }
        match self.disabled.enable(&name).await {
            Ok(true) => {
                info!(meme = %name, user_id = %message.sender.id, "Meme enabled");
                self.reply(message, &format!("已启用meme: {}", name)).await;
            }
            Ok(false) => {
                self.reply(message, &format!("meme: {} 未被禁用", name)).await;
            }
            Err(e) => {
                error!(meme = %name, error = %e, "Failed to enable meme");
                self.reply(message, &format!("启用meme失败: {}", name)).await;
            }
        }
    }

    async fn list_disabled(&self, message: &Message) {
        let names = self.disabled.list().await;
        self.reply(message, &format!("当前禁用的meme: {:?}", names))
            .await;
    }
}

#[async_trait]
impl Handler for MemeCommandHandler {
    #[instrument(skip(self, message), fields(chat_id = message.chat.id))]
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        let Some(command) = MemeCommand::parse(&message.text) else {
            return Ok(HandlerResponse::Continue);
        };
        info!(?command, "Meme command");
        match command {
            MemeCommand::Help => self.help(message).await,
            MemeCommand::Detail(keyword) => self.detail(message, keyword).await,
            MemeCommand::Disable(name) => self.disable(message, name).await,
            MemeCommand::Enable(name) => self.enable(message, name).await,
            MemeCommand::ListDisabled => self.list_disabled(message).await,
        }
        Ok(HandlerResponse::Stop)
    }
}
