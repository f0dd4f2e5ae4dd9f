//! Adapters from Telegram (teloxide) types to memebot_core types.
//!
//! Telegram has no segment chain, so one is built: a leading bot mention becomes
//! `Mention(bot)`, other user mentions are rewritten inline as `@<id>` inside the text,
//! a photo becomes an `Image`, and the replied-to message becomes a `Reply` segment.

use memebot_core::{Chat, Message, ReplySegment, Segment, ToCoreUser, User};
use std::ops::Range;
use teloxide::types::MessageEntityKind;

use crate::directory::TelegramDirectory;

/// The bot's own account, from `get_me`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: String,
    pub username: Option<String>,
}

impl BotIdentity {
    fn is_username(&self, name: &str) -> bool {
        self.username
            .as_deref()
            .is_some_and(|u| u.eq_ignore_ascii_case(name))
    }
}

/// Wraps a teloxide User for conversion to core [`User`].
pub struct TelegramUserWrapper<'a>(pub &'a teloxide::types::User);

impl<'a> ToCoreUser for TelegramUserWrapper<'a> {
    fn to_core(&self) -> User {
        User {
            id: self.0.id.0.to_string(),
            username: self.0.username.clone(),
            display_name: Some(self.0.full_name()),
        }
    }
}

/// Who a mention entity points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MentionTarget {
    Bot,
    User(String),
    /// `@username` of someone we have not seen; left as text.
    Unresolved,
}

/// A mention entity: byte range in the text and its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionSpan {
    pub range: Range<usize>,
    pub target: MentionTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenText {
    /// Text with bot mentions removed and user mentions replaced by `@<id>`.
    pub text: String,
    /// The text started with a bot mention.
    pub leading_bot_mention: bool,
    pub bot_mentioned: bool,
}

/// Applies mention spans to `text`. Spans with invalid byte ranges are ignored.
pub fn rewrite_mentions(text: &str, spans: &[MentionSpan]) -> RewrittenText {
    let mut spans: Vec<&MentionSpan> = spans
        .iter()
        .filter(|s| text.get(s.range.clone()).is_some())
        .collect();
    spans.sort_by_key(|s| s.range.start);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut leading_bot_mention = false;
    let mut bot_mentioned = false;

    for span in spans {
        if span.range.start < cursor {
            continue;
        }
        out.push_str(&text[cursor..span.range.start]);
        match &span.target {
            MentionTarget::Bot => {
                if !bot_mentioned && out.trim().is_empty() {
                    leading_bot_mention = true;
                }
                bot_mentioned = true;
            }
            MentionTarget::User(id) => {
                out.push('@');
                out.push_str(id);
            }
            MentionTarget::Unresolved => out.push_str(&text[span.range.clone()]),
        }
        cursor = span.range.end;
    }
    out.push_str(&text[cursor..]);

    RewrittenText {
        text: out.split_whitespace().collect::<Vec<_>>().join(" "),
        leading_bot_mention,
        bot_mentioned,
    }
}

/// Resolves a mention entity. `None` for entities that are not mentions.
fn mention_target(
    kind: &MessageEntityKind,
    text: &str,
    me: &BotIdentity,
    directory: &TelegramDirectory,
) -> Option<MentionTarget> {
    let target = match kind {
        MessageEntityKind::Mention => {
            let name = text.trim_start_matches('@');
            if me.is_username(name) {
                MentionTarget::Bot
            } else {
                directory
                    .id_for_username(name)
                    .map(MentionTarget::User)
                    .unwrap_or(MentionTarget::Unresolved)
            }
        }
        MessageEntityKind::TextMention { user } => {
            let id = user.id.0.to_string();
            if id == me.id {
                MentionTarget::Bot
            } else {
                // The entity carries the full user, so its profile becomes resolvable.
                directory.remember(user);
                MentionTarget::User(id)
            }
        }
        _ => return None,
    };
    Some(target)
}

/// Wraps a teloxide Message for conversion to core [`Message`].
///
/// Photos are passed in already resolved (see `runner`), as any source the collector
/// understands, typically a `base64://` payload.
pub struct TelegramMessageWrapper<'a> {
    msg: &'a teloxide::types::Message,
    me: &'a BotIdentity,
    directory: &'a TelegramDirectory,
    photo: Option<String>,
    reply_photo: Option<String>,
}

impl<'a> TelegramMessageWrapper<'a> {
    pub fn new(
        msg: &'a teloxide::types::Message,
        me: &'a BotIdentity,
        directory: &'a TelegramDirectory,
    ) -> Self {
        Self {
            msg,
            me,
            directory,
            photo: None,
            reply_photo: None,
        }
    }

    pub fn with_photos(mut self, photo: Option<String>, reply_photo: Option<String>) -> Self {
        self.photo = photo;
        self.reply_photo = reply_photo;
        self
    }

    /// Text or caption with mentions rewritten.
    fn rewritten(&self, msg: &teloxide::types::Message) -> RewrittenText {
        let Some(text) = msg.text().or_else(|| msg.caption()) else {
            return rewrite_mentions("", &[]);
        };
        let entities = msg
            .parse_entities()
            .or_else(|| msg.parse_caption_entities())
            .unwrap_or_default();
        let spans: Vec<MentionSpan> = entities
            .iter()
            .filter_map(|e| {
                mention_target(e.kind(), e.text(), self.me, self.directory).map(|target| {
                    MentionSpan {
                        range: e.range(),
                        target,
                    }
                })
            })
            .collect();
        rewrite_mentions(text, &spans)
    }

    fn reply_segment(&self) -> Option<ReplySegment> {
        let reply = self.msg.reply_to_message()?;
        let mut chain = Vec::new();
        let text = self.rewritten(reply).text;
        if !text.is_empty() {
            chain.push(Segment::plain(text));
        }
        if let Some(src) = &self.reply_photo {
            chain.push(Segment::image_file(src.clone()));
        }
        let from = reply.from.as_ref();
        Some(ReplySegment {
            message_id: reply.id.to_string(),
            sender_id: from.map(|u| u.id.0.to_string()).unwrap_or_default(),
            sender_nickname: from.map(|u| u.full_name()),
            chain,
        })
    }

    fn is_reply_to_bot(&self) -> bool {
        self.msg
            .reply_to_message()
            .and_then(|m| m.from.as_ref())
            .is_some_and(|u| u.id.0.to_string() == self.me.id)
    }

    fn chat_type(&self) -> &'static str {
        let chat = &self.msg.chat;
        if chat.is_private() {
            "private"
        } else if chat.is_group() {
            "group"
        } else if chat.is_supergroup() {
            "supergroup"
        } else {
            "channel"
        }
    }

    pub fn to_core(&self) -> Message {
        let rewritten = self.rewritten(self.msg);

        let mut segments = Vec::new();
        if rewritten.leading_bot_mention {
            segments.push(Segment::mention(self.me.id.clone()));
        }
        if !rewritten.text.is_empty() {
            segments.push(Segment::plain(rewritten.text.clone()));
        }
        if let Some(src) = &self.photo {
            segments.push(Segment::image_file(src.clone()));
        }
        if let Some(reply) = self.reply_segment() {
            segments.push(Segment::Reply(reply));
        }

        let addressed =
            self.msg.chat.is_private() || rewritten.bot_mentioned || self.is_reply_to_bot();

        Message {
            id: self.msg.id.to_string(),
            sender: self
                .msg
                .from
                .as_ref()
                .map(|u| TelegramUserWrapper(u).to_core())
                .unwrap_or_else(|| User {
                    id: "0".to_string(),
                    username: None,
                    display_name: None,
                }),
            self_id: self.me.id.clone(),
            chat: Chat {
                id: self.msg.chat.id.0,
                chat_type: self.chat_type().to_string(),
            },
            text: rewritten.text,
            segments,
            addressed,
            created_at: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(range: Range<usize>, target: MentionTarget) -> MentionSpan {
        MentionSpan { range, target }
    }

    /// **Test: TelegramUserWrapper converts teloxide User to core User with id, username and full name.**
    #[test]
    fn test_telegram_user_wrapper_to_core() {
        let user = teloxide::types::User {
            id: teloxide::types::UserId(123),
            is_bot: false,
            first_name: "Test".to_string(),
            last_name: Some("User".to_string()),
            username: Some("testuser".to_string()),
            language_code: Some("en".to_string()),
            is_premium: false,
            added_to_attachment_menu: false,
        };

        let core_user = TelegramUserWrapper(&user).to_core();

        assert_eq!(core_user.id, "123");
        assert_eq!(core_user.username, Some("testuser".to_string()));
        assert_eq!(core_user.display_name, Some("Test User".to_string()));
        assert_eq!(core_user.name(), "Test User");
    }

    /// **Test: leading bot mention is removed and flagged.**
    #[test]
    fn test_leading_bot_mention() {
        let text = "@meme_bot punch hard";
        let out = rewrite_mentions(text, &[span(0..9, MentionTarget::Bot)]);

        assert_eq!(out.text, "punch hard");
        assert!(out.leading_bot_mention);
        assert!(out.bot_mentioned);
    }

    /// **Test: user mentions become `@<id>`; unresolved ones stay as typed.**
    #[test]
    fn test_user_mentions_rewritten() {
        let text = "punch @bob hard @nobody";
        let out = rewrite_mentions(
            text,
            &[
                span(6..10, MentionTarget::User("12345678".to_string())),
                span(16..23, MentionTarget::Unresolved),
            ],
        );

        assert_eq!(out.text, "punch @12345678 hard @nobody");
        assert!(!out.leading_bot_mention);
        assert!(!out.bot_mentioned);
    }

    /// **Test: a bot mention after other text addresses the bot but is not leading.**
    #[test]
    fn test_trailing_bot_mention() {
        let text = "punch @meme_bot";
        let out = rewrite_mentions(text, &[span(6..15, MentionTarget::Bot)]);

        assert_eq!(out.text, "punch");
        assert!(!out.leading_bot_mention);
        assert!(out.bot_mentioned);
    }

    #[test]
    fn test_invalid_span_ignored() {
        let out = rewrite_mentions("打拳", &[span(1..2, MentionTarget::Bot)]);
        assert_eq!(out.text, "打拳");
        assert!(!out.bot_mentioned);
    }

    /// **Test: a text mention of an unseen user resolves and makes the user's profile available.**
    #[tokio::test]
    async fn test_text_mention_remembers_user() {
        use memebot_core::ProfileLookup;

        let me = BotIdentity {
            id: "1000".to_string(),
            username: Some("meme_bot".to_string()),
        };
        let directory = TelegramDirectory::new(teloxide::Bot::new("test:token"));
        let bob = teloxide::types::User {
            id: teloxide::types::UserId(12345678),
            is_bot: false,
            first_name: "Bob".to_string(),
            last_name: None,
            username: None,
            language_code: None,
            is_premium: false,
            added_to_attachment_menu: false,
        };
        assert!(directory.lookup("12345678").await.is_none());

        let kind = MessageEntityKind::TextMention { user: bob };
        assert_eq!(
            mention_target(&kind, "Bob", &me, &directory),
            Some(MentionTarget::User("12345678".to_string()))
        );
        let profile = directory.lookup("12345678").await.unwrap();
        assert_eq!(profile.nickname, "Bob");

        assert_eq!(
            mention_target(&MessageEntityKind::Bold, "Bob", &me, &directory),
            None
        );
    }

    #[test]
    fn test_bot_identity_username_case_insensitive() {
        let me = BotIdentity {
            id: "1000".to_string(),
            username: Some("Meme_Bot".to_string()),
        };
        assert!(me.is_username("meme_bot"));
        assert!(!me.is_username("other_bot"));
    }
}
