//! User profiles and avatars for Telegram.
//!
//! The Bot API cannot look up arbitrary users by id, so profiles come from users the bot has
//! seen in messages. Avatars are fetched live from the user's profile photos.

use async_trait::async_trait;
use memebot_core::{AvatarSource, ProfileLookup, UserProfile};
use std::collections::HashMap;
use std::sync::RwLock;
use teloxide::net::Download;
use teloxide::payloads::GetUserProfilePhotosSetters;
use teloxide::prelude::*;
use teloxide::types::PhotoSize;
use tracing::{debug, warn};

/// Telegram does not expose gender.
const UNKNOWN_GENDER: &str = "unknown";

#[derive(Default)]
struct Seen {
    profiles: HashMap<String, UserProfile>,
    /// lowercase username -> user id
    usernames: HashMap<String, String>,
}

pub struct TelegramDirectory {
    bot: teloxide::Bot,
    seen: RwLock<Seen>,
}

impl TelegramDirectory {
    pub fn new(bot: teloxide::Bot) -> Self {
        Self {
            bot,
            seen: RwLock::new(Seen::default()),
        }
    }

    /// Records a user seen in a message so later mentions of them can be resolved.
    pub fn remember(&self, user: &teloxide::types::User) {
        let id = user.id.0.to_string();
        let mut seen = self.seen.write().unwrap_or_else(|e| e.into_inner());
        if let Some(username) = &user.username {
            seen.usernames.insert(username.to_lowercase(), id.clone());
        }
        seen.profiles.insert(
            id,
            UserProfile {
                nickname: user.full_name(),
                gender: UNKNOWN_GENDER.to_string(),
            },
        );
    }

    /// Remembers the sender and, for replies, the replied-to sender.
    pub fn remember_message(&self, msg: &teloxide::types::Message) {
        if let Some(user) = &msg.from {
            self.remember(user);
        }
        if let Some(user) = msg.reply_to_message().and_then(|m| m.from.as_ref()) {
            self.remember(user);
        }
    }

    pub fn id_for_username(&self, username: &str) -> Option<String> {
        let seen = self.seen.read().unwrap_or_else(|e| e.into_inner());
        seen.usernames.get(&username.to_lowercase()).cloned()
    }

    fn cached_profile(&self, user_id: &str) -> Option<UserProfile> {
        let seen = self.seen.read().unwrap_or_else(|e| e.into_inner());
        seen.profiles.get(user_id).cloned()
    }
}

/// Downloads the given photo size; `None` on any API failure.
pub(crate) async fn download_photo(bot: &teloxide::Bot, photo: &PhotoSize) -> Option<Vec<u8>> {
    let file = match bot.get_file(photo.file.id.clone()).await {
        Ok(file) => file,
        Err(e) => {
            warn!(error = %e, "Telegram: get_file failed");
            return None;
        }
    };
    let mut buf: Vec<u8> = Vec::new();
    if let Err(e) = bot.download_file(&file.path, &mut buf).await {
        warn!(error = %e, "Telegram: download_file failed");
        return None;
    }
    Some(buf)
}

#[async_trait]
impl ProfileLookup for TelegramDirectory {
    async fn lookup(&self, user_id: &str) -> Option<UserProfile> {
        self.cached_profile(user_id)
    }
}

#[async_trait]
impl AvatarSource for TelegramDirectory {
    async fn avatar(&self, user_id: &str) -> Option<Vec<u8>> {
        let id: u64 = user_id.parse().ok()?;
        let photos = match self.bot.get_user_profile_photos(UserId(id)).limit(1).await {
            Ok(photos) => photos,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Telegram: get_user_profile_photos failed");
                return None;
            }
        };
        // Each entry lists sizes smallest to largest.
        let Some(largest) = photos.photos.first().and_then(|sizes| sizes.last()) else {
            debug!(user_id = %user_id, "User has no profile photo");
            return None;
        };
        download_photo(&self.bot, largest).await
    }
}
