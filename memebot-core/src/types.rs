//! Core types: user, chat, message segments, handler response, and Handler trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User identity. `id` is the platform's user id rendered as a string (numeric on Telegram and QQ).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: Option<String>,
    pub display_name: Option<String>,
}

impl User {
    /// Name used to label images collected from this user: display name, else username, else id.
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or(&self.id)
    }
}

/// Chat (group or private) identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub chat_type: String,
}

/// One element of a message chain. Closed set; consumers dispatch with `match`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Segment {
    /// Picture. `url` wins over `file` when both are set; `file` is a local path, a
    /// `base64://` payload, or a platform file handle.
    Image {
        url: Option<String>,
        file: Option<String>,
    },
    /// @-mention of a user by platform id.
    Mention { user_id: String },
    Plain { text: String },
    Reply(ReplySegment),
}

impl Segment {
    pub fn plain(text: impl Into<String>) -> Self {
        Segment::Plain { text: text.into() }
    }

    pub fn mention(user_id: impl Into<String>) -> Self {
        Segment::Mention {
            user_id: user_id.into(),
        }
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        Segment::Image {
            url: Some(url.into()),
            file: None,
        }
    }

    pub fn image_file(file: impl Into<String>) -> Self {
        Segment::Image {
            url: None,
            file: Some(file.into()),
        }
    }
}

/// The message being replied to, with its own segment chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplySegment {
    pub message_id: String,
    pub sender_id: String,
    pub sender_nickname: Option<String>,
    pub chain: Vec<Segment>,
}

/// An inbound message: sender, bot identity, plain text and the segment chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender: User,
    /// Id of the bot account that received the message.
    pub self_id: String,
    pub chat: Chat,
    /// Plain text of the message with any leading bot mention removed.
    pub text: String,
    pub segments: Vec<Segment>,
    /// True when the message is directed at the bot (private chat, @bot, or reply to the bot).
    pub addressed: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// First reply segment of the chain, if any.
    pub fn reply(&self) -> Option<&ReplySegment> {
        self.segments.iter().find_map(|seg| match seg {
            Segment::Reply(reply) => Some(reply),
            _ => None,
        })
    }
}

/// Handler result for the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResponse {
    /// Pass to next handler.
    Continue,
    /// Message consumed; stop the handle phase.
    Stop,
}

/// Converts a transport-specific user type to core [`User`].
pub trait ToCoreUser: Send + Sync {
    fn to_core(&self) -> User;
}

/// Single handler concept: optional before / handle / after. Chain runs all before → handle until Stop → all after (reverse).
#[async_trait]
pub trait Handler: Send + Sync {
    /// Runs before the handle phase. Return false to stop the chain.
    async fn before(&self, _message: &Message) -> crate::error::Result<bool> {
        Ok(true)
    }
    /// Processes the message. Return Stop to end the handle phase. Default: Continue.
    async fn handle(&self, _message: &Message) -> crate::error::Result<HandlerResponse> {
        Ok(HandlerResponse::Continue)
    }
    /// Runs after the handle phase (reverse order), with the final response.
    async fn after(
        &self,
        _message: &Message,
        _response: &HandlerResponse,
    ) -> crate::error::Result<()> {
        Ok(())
    }
}
