//! Platform capabilities used when collecting meme parameters.
//!
//! Chat platforms expose user profiles and avatars differently; the collector only sees these
//! traits. Both are soft: `None` means "not available", never an error.

use async_trait::async_trait;

/// Nickname and gender of a platform user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub nickname: String,
    /// `"male"`, `"female"` or `"unknown"`.
    pub gender: String,
}

#[async_trait]
pub trait ProfileLookup: Send + Sync {
    async fn lookup(&self, user_id: &str) -> Option<UserProfile>;
}

#[async_trait]
pub trait AvatarSource: Send + Sync {
    /// Raw avatar image bytes for the user.
    async fn avatar(&self, user_id: &str) -> Option<Vec<u8>>;
}

/// Platform without profile lookup.
pub struct NoProfileLookup;

#[async_trait]
impl ProfileLookup for NoProfileLookup {
    async fn lookup(&self, _user_id: &str) -> Option<UserProfile> {
        None
    }
}

/// Platform without avatars.
pub struct NoAvatars;

#[async_trait]
impl AvatarSource for NoAvatars {
    async fn avatar(&self, _user_id: &str) -> Option<Vec<u8>> {
        None
    }
}
