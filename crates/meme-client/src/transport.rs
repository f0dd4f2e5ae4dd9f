//! HTTP plumbing shared by the adapters.

use crate::error::{MemeClientError, Result};
use crate::types::MemeInfo;
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use std::future::Future;
use tracing::warn;

/// Number of `/info` requests in flight while loading the catalog.
const INFO_CONCURRENCY: usize = 8;

/// Base URL without trailing slash, so paths can be appended with `format!`.
pub(crate) fn normalize_base(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Turns a non-success status into [`MemeClientError::Status`] carrying the body.
pub(crate) async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), body = %body, "meme service request failed");
    Err(MemeClientError::Status {
        status: status.as_u16(),
        body,
    })
}

pub(crate) async fn read_bytes(resp: reqwest::Response) -> Result<Vec<u8>> {
    let resp = ensure_success(resp).await?;
    Ok(resp.bytes().await?.to_vec())
}

/// `GET {base}/meme/version`; the service answers with a JSON string or bare text.
pub(crate) async fn fetch_version(client: &reqwest::Client, base: &str) -> Result<String> {
    let resp = client.get(format!("{}/meme/version", base)).send().await?;
    let body = ensure_success(resp).await?.text().await?;
    let version = serde_json::from_str::<String>(&body).unwrap_or_else(|_| body.trim().to_string());
    Ok(version)
}

/// `{"image_id": "..."}` returned by the current API.
#[derive(Debug, Deserialize)]
pub(crate) struct ImageId {
    pub image_id: String,
}

/// Fetches every key's info with bounded concurrency, keeping service order.
/// Entries whose info cannot be read are logged and left out.
pub(crate) async fn collect_catalog<F, Fut>(keys: Vec<String>, fetch: F) -> Vec<MemeInfo>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<MemeInfo>>,
{
    let results: Vec<(String, Result<MemeInfo>)> = stream::iter(keys)
        .map(|key| {
            let fut = fetch(key.clone());
            async move { (key, fut.await) }
        })
        .buffered(INFO_CONCURRENCY)
        .collect()
        .await;

    let mut memes = Vec::with_capacity(results.len());
    for (key, result) in results {
        match result {
            Ok(info) => memes.push(info),
            Err(e) => warn!(key = %key, error = %e, "Skipping meme with unreadable info"),
        }
    }
    memes
}
