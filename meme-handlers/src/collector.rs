//! Builds render inputs (images, texts, options) from a message and its reply chain.
//!
//! Order of collection is observable by the renderer, so everything here runs sequentially:
//! reply chain first, then the message's own segments, then avatar backfill, then truncation.

use meme_client::{MemeImage, MemeOptions, MemeParams, OptionValue};
use memebot_core::{AvatarSource, Message, ProfileLookup, Segment};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::fetch::{is_numeric_id, ImageFetcher};

/// Label given to the bot's own avatar when it is used as a filler image.
pub const BOT_LABEL: &str = "bot";

/// Render inputs for one meme.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedParams {
    pub images: Vec<MemeImage>,
    pub texts: Vec<String>,
    pub options: MemeOptions,
}

pub struct ParamsCollector {
    fetcher: ImageFetcher,
    profiles: Arc<dyn ProfileLookup>,
    avatars: Arc<dyn AvatarSource>,
}

impl ParamsCollector {
    pub fn new(
        fetcher: ImageFetcher,
        profiles: Arc<dyn ProfileLookup>,
        avatars: Arc<dyn AvatarSource>,
    ) -> Self {
        Self {
            fetcher,
            profiles,
            avatars,
        }
    }

    /// Collect inputs for a meme with the given constraints. Never fails; missing sources
    /// just produce fewer images.
    #[instrument(skip_all, fields(message_id = %message.id))]
    pub async fn collect(&self, message: &Message, params: &MemeParams) -> CollectedParams {
        let mut out = CollectedParams::default();
        let sender_name = message.sender.name().to_string();
        let first = message.segments.first();

        if let Some(reply) = message.reply().filter(|r| !r.chain.is_empty()) {
            let label = reply
                .sender_nickname
                .clone()
                .unwrap_or_else(|| reply.sender_id.clone());
            for segment in &reply.chain {
                self.process_segment(segment, &label, first, &mut out).await;
            }
        }

        for segment in &message.segments {
            self.process_segment(segment, &sender_name, first, &mut out)
                .await;
        }

        if out.images.len() < params.min_images {
            if let Some(avatar) = self.avatars.avatar(&message.sender.id).await {
                out.images.insert(0, MemeImage::new(sender_name.clone(), avatar));
            }
        }
        if out.images.len() < params.min_images {
            if let Some(avatar) = self.avatars.avatar(&message.self_id).await {
                out.images.insert(0, MemeImage::new(BOT_LABEL, avatar));
            }
        }
        out.images.truncate(params.max_images);

        if out.texts.len() < params.min_texts {
            out.texts.extend(params.default_texts.iter().cloned());
        }
        out.texts.truncate(params.max_texts);

        debug!(
            images = out.images.len(),
            texts = out.texts.len(),
            options = out.options.len(),
            "Collected meme params"
        );
        out
    }

    async fn process_segment(
        &self,
        segment: &Segment,
        label: &str,
        first: Option<&Segment>,
        out: &mut CollectedParams,
    ) {
        match segment {
            Segment::Image { url, file } => {
                let src = url
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .or(file.as_deref().filter(|s| !s.is_empty()));
                if let Some(src) = src {
                    if let Some(data) = self.fetcher.decode(src).await {
                        out.images.push(MemeImage::new(label, data));
                    }
                }
            }
            // A leading mention addresses the bot (or whoever) and is not a meme target.
            Segment::Mention { user_id } => {
                if first != Some(segment) {
                    self.add_user(user_id, out).await;
                }
            }
            // First token is the keyword itself.
            Segment::Plain { text } => {
                for token in text.trim().split(' ').skip(1) {
                    if let Some((key, value)) = token.split_once('=') {
                        out.options
                            .insert(key.to_string(), OptionValue::from(value));
                    } else if let Some(id) = token.strip_prefix('@').filter(|id| is_numeric_id(id))
                    {
                        self.add_user(id, out).await;
                    } else if !token.is_empty() {
                        out.texts.push(token.to_string());
                    }
                }
            }
            Segment::Reply(_) => {}
        }
    }

    /// Sets `name`/`gender` options from the profile and appends the user's avatar.
    /// Unknown users contribute nothing.
    async fn add_user(&self, user_id: &str, out: &mut CollectedParams) {
        let Some(profile) = self.profiles.lookup(user_id).await else {
            debug!(user_id = %user_id, "Mentioned user not found");
            return;
        };
        out.options
            .insert("name".to_string(), OptionValue::from(profile.nickname.as_str()));
        out.options
            .insert("gender".to_string(), OptionValue::from(profile.gender));
        if let Some(avatar) = self.avatars.avatar(user_id).await {
            out.images.push(MemeImage::new(profile.nickname, avatar));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use memebot_core::{Chat, NoAvatars, NoProfileLookup, ReplySegment, User, UserProfile};
    use std::collections::HashMap;

    const BOT_ID: &str = "1000";
    const SENDER_ID: &str = "42";

    struct Profiles(HashMap<String, UserProfile>);

    #[async_trait]
    impl ProfileLookup for Profiles {
        async fn lookup(&self, user_id: &str) -> Option<UserProfile> {
            self.0.get(user_id).cloned()
        }
    }

    /// Avatar bytes are the user id itself so tests can tell images apart.
    struct EchoAvatars;

    #[async_trait]
    impl AvatarSource for EchoAvatars {
        async fn avatar(&self, user_id: &str) -> Option<Vec<u8>> {
            Some(user_id.as_bytes().to_vec())
        }
    }

    fn collector() -> ParamsCollector {
        let mut profiles = HashMap::new();
        profiles.insert(
            "12345678".to_string(),
            UserProfile {
                nickname: "Bob".to_string(),
                gender: "male".to_string(),
            },
        );
        ParamsCollector::new(
            ImageFetcher::new(reqwest::Client::new(), false),
            Arc::new(Profiles(profiles)),
            Arc::new(EchoAvatars),
        )
    }

    fn message(segments: Vec<Segment>) -> Message {
        Message {
            id: "1".to_string(),
            sender: User {
                id: SENDER_ID.to_string(),
                username: None,
                display_name: Some("Alice".to_string()),
            },
            self_id: BOT_ID.to_string(),
            chat: Chat {
                id: -1,
                chat_type: "group".to_string(),
            },
            text: String::new(),
            segments,
            addressed: false,
            created_at: Utc::now(),
        }
    }

    fn params(min_images: usize, max_images: usize, min_texts: usize, max_texts: usize) -> MemeParams {
        MemeParams {
            min_images,
            max_images,
            min_texts,
            max_texts,
            default_texts: vec![],
            options: vec![],
        }
    }

    /// **Test: plain tokens after the keyword become options, mentions and texts.**
    #[tokio::test]
    async fn test_plain_tokens() {
        let msg = message(vec![Segment::plain("punch @12345678 hard circle=true @abc")]);
        let out = collector().collect(&msg, &params(0, 2, 0, 5)).await;

        assert_eq!(out.texts, vec!["hard", "@abc"]);
        assert_eq!(out.options.get("circle"), Some(&OptionValue::from("true")));
        assert_eq!(out.options.get("name"), Some(&OptionValue::from("Bob")));
        assert_eq!(out.options.get("gender"), Some(&OptionValue::from("male")));
        assert_eq!(out.images, vec![MemeImage::new("Bob", b"12345678".to_vec())]);
    }

    /// **Test: with one image and one text allowed, a mention fills the image slot without backfill.**
    ///
    /// **Setup:** min/max images 1, min/max texts 1; user 12345678 resolves to Bob.
    /// **Action:** collect "punch @12345678 hard size=3".
    /// **Expected:** only Bob's avatar, texts ["hard"], options name/gender/size with size as a string.
    #[tokio::test]
    async fn test_single_slot_mention() {
        let msg = message(vec![Segment::plain("punch @12345678 hard size=3")]);
        let out = collector().collect(&msg, &params(1, 1, 1, 1)).await;

        assert_eq!(out.images, vec![MemeImage::new("Bob", b"12345678".to_vec())]);
        assert_eq!(out.texts, vec!["hard"]);
        assert_eq!(out.options.get("size"), Some(&OptionValue::from("3")));
        assert_eq!(out.options.len(), 3);
    }

    /// **Test: option value keeps everything after the first `=`.**
    #[tokio::test]
    async fn test_option_split_at_first_equals() {
        let msg = message(vec![Segment::plain("kw a=b=c")]);
        let out = collector().collect(&msg, &params(0, 0, 0, 0)).await;
        assert_eq!(out.options.get("a"), Some(&OptionValue::from("b=c")));
    }

    /// **Test: leading mention is skipped, later mentions resolve; unknown users add nothing.**
    #[tokio::test]
    async fn test_mentions() {
        let msg = message(vec![
            Segment::mention(BOT_ID),
            Segment::plain("punch"),
            Segment::mention("12345678"),
            Segment::mention("999"),
        ]);
        let out = collector().collect(&msg, &params(0, 5, 0, 0)).await;

        assert_eq!(out.images, vec![MemeImage::new("Bob", b"12345678".to_vec())]);
    }

    /// **Test: backfill prepends sender then bot avatars up to min_images.**
    #[tokio::test]
    async fn test_backfill_order() {
        let msg = message(vec![Segment::plain("punch")]);
        let out = collector().collect(&msg, &params(2, 2, 0, 0)).await;

        assert_eq!(
            out.images,
            vec![
                MemeImage::new(BOT_LABEL, BOT_ID.as_bytes().to_vec()),
                MemeImage::new("Alice", SENDER_ID.as_bytes().to_vec()),
            ]
        );
    }

    /// **Test: backfilled sender avatar goes first, so truncation drops the segment image.**
    #[tokio::test]
    async fn test_backfill_wins_over_segment_image_on_truncate() {
        let msg = message(vec![Segment::image_file("base64://AQ==")]);
        let out = collector().collect(&msg, &params(2, 1, 0, 0)).await;
        assert_eq!(
            out.images,
            vec![MemeImage::new("Alice", SENDER_ID.as_bytes().to_vec())]
        );
    }

    /// **Test: without profile or avatar support, mentions and backfill add nothing.**
    ///
    /// **Setup:** Collector wired with `NoProfileLookup` and `NoAvatars`.
    /// **Action:** collect "punch @12345678 hard" with min_images 1.
    /// **Expected:** no images, no options, texts ["hard"].
    #[tokio::test]
    async fn test_platform_without_profiles_or_avatars() {
        let collector = ParamsCollector::new(
            ImageFetcher::new(reqwest::Client::new(), false),
            Arc::new(NoProfileLookup),
            Arc::new(NoAvatars),
        );
        let msg = message(vec![Segment::plain("punch @12345678 hard")]);
        let out = collector.collect(&msg, &params(1, 2, 0, 1)).await;

        assert!(out.images.is_empty());
        assert!(out.options.is_empty());
        assert_eq!(out.texts, vec!["hard"]);
    }

    /// **Test: a bot mention followed by a one-word caption yields nothing; the word is the keyword.**
    #[tokio::test]
    async fn test_leading_mention_then_single_word() {
        let msg = message(vec![Segment::mention(BOT_ID), Segment::plain("caption")]);
        let out = collector().collect(&msg, &params(0, 1, 0, 1)).await;

        assert!(out.images.is_empty());
        assert!(out.options.is_empty());
        assert!(out.texts.is_empty());
    }

    /// **Test: URL-sourced images are downloaded and labeled with the sender.**
    #[tokio::test]
    async fn test_image_from_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/pic.png")
            .with_status(200)
            .with_body(vec![5, 6, 7])
            .create_async()
            .await;

        let msg = message(vec![Segment::image_url(format!("{}/pic.png", server.url()))]);
        let out = collector().collect(&msg, &params(0, 1, 0, 0)).await;

        mock.assert_async().await;
        assert_eq!(out.images, vec![MemeImage::new("Alice", vec![5, 6, 7])]);
    }

    /// **Test: images beyond max_images are dropped from the end.**
    #[tokio::test]
    async fn test_images_truncated() {
        let msg = message(vec![
            Segment::image_file("base64://AQ=="),
            Segment::image_file("base64://Ag=="),
            Segment::image_file("base64://Aw=="),
        ]);
        let out = collector().collect(&msg, &params(1, 2, 0, 0)).await;
        assert_eq!(out.images.len(), 2);
        assert_eq!(out.images[0].data, vec![1]);
        assert_eq!(out.images[1].data, vec![2]);
    }

    /// **Test: default texts fill in only when too few texts, then truncate to max_texts.**
    #[tokio::test]
    async fn test_default_texts() {
        let mut p = params(0, 0, 1, 1);
        p.default_texts = vec!["哼".to_string(), "extra".to_string()];

        let out = collector().collect(&message(vec![Segment::plain("kw")]), &p).await;
        assert_eq!(out.texts, vec!["哼"]);

        let out = collector()
            .collect(&message(vec![Segment::plain("kw mine")]), &p)
            .await;
        assert_eq!(out.texts, vec!["mine"]);
    }

    /// **Test: reply chain images come first, labeled with the replied-to sender.**
    #[tokio::test]
    async fn test_reply_chain_first() {
        let reply = ReplySegment {
            message_id: "7".to_string(),
            sender_id: "77".to_string(),
            sender_nickname: Some("Carol".to_string()),
            chain: vec![Segment::image_file("base64://Bw==")],
        };
        let msg = message(vec![
            Segment::Reply(reply),
            Segment::plain("punch"),
            Segment::image_file("base64://CA=="),
        ]);
        let out = collector().collect(&msg, &params(0, 5, 0, 0)).await;

        assert_eq!(
            out.images,
            vec![MemeImage::new("Carol", vec![7]), MemeImage::new("Alice", vec![8])]
        );
    }

    /// **Test: url wins over file; an empty url falls back to file.**
    #[tokio::test]
    async fn test_image_url_fallback_to_file() {
        let msg = message(vec![Segment::Image {
            url: Some(String::new()),
            file: Some("base64://CQ==".to_string()),
        }]);
        let out = collector().collect(&msg, &params(0, 1, 0, 0)).await;
        assert_eq!(out.images, vec![MemeImage::new("Alice", vec![9])]);
    }
}
