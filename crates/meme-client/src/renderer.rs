//! The rendering capability and adapter selection.

use crate::current::HttpRenderer;
use crate::error::{MemeClientError, Result};
use crate::legacy::LegacyHttpRenderer;
use crate::transport::{fetch_version, normalize_base};
use crate::types::{MemeImage, MemeInfo, MemeOptions};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

/// First service version speaking the current API.
const CURRENT_API_SINCE: (u64, u64, u64) = (0, 2, 0);

/// What the bot needs from a meme rendering backend.
#[async_trait]
pub trait MemeRenderer: Send + Sync {
    /// Service version reported at connect time.
    fn version(&self) -> &str;

    /// Full catalog in service order.
    async fn memes(&self) -> Result<Vec<MemeInfo>>;

    /// Renders `key` with the collected inputs and returns encoded image bytes.
    async fn render(
        &self,
        key: &str,
        images: Vec<MemeImage>,
        texts: Vec<String>,
        options: MemeOptions,
    ) -> Result<Vec<u8>>;

    /// Overview image listing the given memes.
    async fn render_list(&self, memes: &[MemeInfo]) -> Result<Vec<u8>>;

    /// Preview image of one meme with its default inputs.
    async fn preview(&self, key: &str) -> Result<Vec<u8>>;

    /// Verifies the service is ready to render.
    async fn check_resources(&self) -> Result<()>;
}

/// Parses `major.minor.patch`; trailing pre-release text on a component is ignored (`1rc2` → 1).
pub fn parse_version(s: &str) -> Option<(u64, u64, u64)> {
    let mut parts = s.trim().trim_start_matches('v').split('.').map(|p| {
        let digits: String = p.chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse::<u64>().ok()
    });
    let major = parts.next()??;
    let minor = parts.next().flatten().unwrap_or(0);
    let patch = parts.next().flatten().unwrap_or(0);
    Some((major, minor, patch))
}

/// Probes the service at `base_url` and returns the adapter for its API generation.
#[instrument(skip(client))]
pub async fn connect(base_url: &str, client: reqwest::Client) -> Result<Arc<dyn MemeRenderer>> {
    let base = normalize_base(base_url);
    let version = fetch_version(&client, &base).await?;
    let parsed = parse_version(&version).ok_or_else(|| MemeClientError::Version(version.clone()))?;

    let renderer: Arc<dyn MemeRenderer> = if parsed < CURRENT_API_SINCE {
        Arc::new(LegacyHttpRenderer::new(&base, client, version.clone()))
    } else {
        Arc::new(HttpRenderer::new(&base, client, version.clone()))
    };
    info!(version = %version, legacy = parsed < CURRENT_API_SINCE, "Connected to meme service");
    Ok(renderer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("0.1.8"), Some((0, 1, 8)));
        assert_eq!(parse_version("v0.2.1"), Some((0, 2, 1)));
        assert_eq!(parse_version("0.2.0rc1"), Some((0, 2, 0)));
        assert_eq!(parse_version("1.0"), Some((1, 0, 0)));
        assert_eq!(parse_version("unknown"), None);
    }

    #[tokio::test]
    async fn test_connect_selects_legacy_below_0_2() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/meme/version")
            .with_status(200)
            .with_body("\"0.1.8\"")
            .create_async()
            .await;

        let renderer = connect(&server.url(), reqwest::Client::new()).await.unwrap();
        assert_eq!(renderer.version(), "0.1.8");
    }

    #[tokio::test]
    async fn test_connect_rejects_garbage_version() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/meme/version")
            .with_status(200)
            .with_body("not a version")
            .create_async()
            .await;

        let result = connect(&server.url(), reqwest::Client::new()).await;
        assert!(matches!(result, Err(MemeClientError::Version(_))));
    }
}
