//! Image sources: local files, http(s) URLs, `base64://` payloads, and templated avatar URLs.
//!
//! Every failure here is soft. A source that cannot be read yields `None` and a warning;
//! the caller simply ends up with fewer images.

use async_trait::async_trait;
use base64::Engine;
use memebot_core::AvatarSource;
use std::path::Path;
use tracing::{debug, warn};

pub const BASE64_PREFIX: &str = "base64://";

pub const DEFAULT_AVATAR_URL_TEMPLATE: &str =
    "https://q4.qlogo.cn/headimg_dl?dst_uin={user_id}&spec=640";

/// True for a non-empty string of ASCII digits (platform user ids).
pub fn is_numeric_id(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Reads image bytes from the sources a message segment can point at.
#[derive(Clone)]
pub struct ImageFetcher {
    client: reqwest::Client,
    downgrade_https: bool,
}

impl ImageFetcher {
    /// `downgrade_https` rewrites `https://` to `http://` before fetching (some image hosts
    /// used by chat platforms have broken TLS).
    pub fn new(client: reqwest::Client, downgrade_https: bool) -> Self {
        Self {
            client,
            downgrade_https,
        }
    }

    fn effective_url<'a>(&self, url: &'a str) -> std::borrow::Cow<'a, str> {
        match url.strip_prefix("https://") {
            Some(rest) if self.downgrade_https => format!("http://{}", rest).into(),
            _ => url.into(),
        }
    }

    /// GET the URL and return the body. Non-success statuses count as failures.
    pub async fn download(&self, url: &str) -> Option<Vec<u8>> {
        let url = self.effective_url(url);
        let resp = match self.client.get(url.as_ref()).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(url = %url, error = %e, "Image download failed");
                return None;
            }
        };
        if !resp.status().is_success() {
            warn!(url = %url, status = resp.status().as_u16(), "Image download returned error status");
            return None;
        }
        match resp.bytes().await {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(e) => {
                warn!(url = %url, error = %e, "Image body could not be read");
                None
            }
        }
    }

    /// Resolve `src` in order: existing local file, http(s) URL, `base64://` payload.
    pub async fn decode(&self, src: &str) -> Option<Vec<u8>> {
        if is_local_file(src).await {
            return match tokio::fs::read(src).await {
                Ok(data) => Some(data),
                Err(e) => {
                    warn!(path = %src, error = %e, "Local image could not be read");
                    None
                }
            };
        }
        if src.starts_with("http://") || src.starts_with("https://") {
            return self.download(src).await;
        }
        if let Some(payload) = src.strip_prefix(BASE64_PREFIX) {
            return match base64::engine::general_purpose::STANDARD.decode(payload.trim()) {
                Ok(data) => Some(data),
                Err(e) => {
                    warn!(error = %e, "Invalid base64 image payload");
                    None
                }
            };
        }
        debug!(src = %src, "Unrecognized image source");
        None
    }
}

async fn is_local_file(src: &str) -> bool {
    tokio::fs::metadata(Path::new(src))
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

/// Avatars served from a URL template with a `{user_id}` placeholder.
pub struct TemplateAvatars {
    fetcher: ImageFetcher,
    template: String,
}

impl TemplateAvatars {
    pub fn new(fetcher: ImageFetcher, template: impl Into<String>) -> Self {
        Self {
            fetcher,
            template: template.into(),
        }
    }

    pub fn url_for(&self, user_id: &str) -> String {
        self.template.replace("{user_id}", user_id)
    }
}

#[async_trait]
impl AvatarSource for TemplateAvatars {
    async fn avatar(&self, user_id: &str) -> Option<Vec<u8>> {
        if !is_numeric_id(user_id) {
            debug!(user_id = %user_id, "No avatar for non-numeric user id");
            return None;
        }
        self.fetcher.download(&self.url_for(user_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fetcher() -> ImageFetcher {
        ImageFetcher::new(reqwest::Client::new(), false)
    }

    #[test]
    fn test_is_numeric_id() {
        assert!(is_numeric_id("12345678"));
        assert!(!is_numeric_id(""));
        assert!(!is_numeric_id("12a4"));
        assert!(!is_numeric_id("-12"));
    }

    #[test]
    fn test_effective_url_downgrade() {
        let plain = fetcher();
        assert_eq!(plain.effective_url("https://a.example/x.png"), "https://a.example/x.png");

        let downgraded = ImageFetcher::new(reqwest::Client::new(), true);
        assert_eq!(downgraded.effective_url("https://a.example/x.png"), "http://a.example/x.png");
        assert_eq!(downgraded.effective_url("http://a.example/x.png"), "http://a.example/x.png");
    }

    #[tokio::test]
    async fn test_decode_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[1, 2, 3]).unwrap();
        let path = file.path().to_string_lossy().to_string();

        assert_eq!(fetcher().decode(&path).await, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_decode_base64_payload() {
        let src = format!("{}{}", BASE64_PREFIX, "AQID");
        assert_eq!(fetcher().decode(&src).await, Some(vec![1, 2, 3]));
        assert_eq!(fetcher().decode("base64://!!!").await, None);
    }

    #[tokio::test]
    async fn test_decode_unknown_source_is_none() {
        assert_eq!(fetcher().decode("telegram-file-id-xyz").await, None);
    }

    #[tokio::test]
    async fn test_download_from_url_and_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server
            .mock("GET", "/a.png")
            .with_status(200)
            .with_body(vec![5, 6])
            .create_async()
            .await;
        let _missing = server
            .mock("GET", "/missing.png")
            .with_status(404)
            .create_async()
            .await;

        let f = fetcher();
        assert_eq!(f.decode(&format!("{}/a.png", server.url())).await, Some(vec![5, 6]));
        assert_eq!(f.download(&format!("{}/missing.png", server.url())).await, None);
    }

    #[tokio::test]
    async fn test_template_avatars() {
        let mut server = mockito::Server::new_async().await;
        let avatar = server
            .mock("GET", "/avatar/42")
            .with_status(200)
            .with_body(vec![4, 2])
            .create_async()
            .await;

        let avatars = TemplateAvatars::new(fetcher(), format!("{}/avatar/{{user_id}}", server.url()));
        assert_eq!(avatars.avatar("42").await, Some(vec![4, 2]));
        assert_eq!(avatars.avatar("alice").await, None);
        avatar.assert_async().await;
    }
}
