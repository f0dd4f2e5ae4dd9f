//! Adapter for services older than 0.2.0 (multipart render endpoint, bytes in responses).

use crate::error::Result;
use crate::renderer::MemeRenderer;
use crate::transport::{
    collect_catalog, ensure_success, fetch_version, normalize_base, read_bytes,
};
use crate::types::{MemeImage, MemeInfo, MemeOptionSpec, MemeOptions, MemeParams};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument};

#[derive(Debug, Deserialize)]
struct LegacyInfo {
    key: String,
    params_type: LegacyParams,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LegacyParams {
    min_images: usize,
    max_images: usize,
    min_texts: usize,
    max_texts: usize,
    #[serde(default)]
    default_texts: Vec<String>,
    #[serde(default)]
    args_type: Option<LegacyArgsType>,
}

#[derive(Debug, Deserialize)]
struct LegacyArgsType {
    #[serde(default)]
    args_model: serde_json::Value,
}

/// Option names come from the JSON schema of the args model; `user_infos` is filled by the service.
fn options_from_schema(args_type: Option<&LegacyArgsType>) -> Vec<MemeOptionSpec> {
    let Some(properties) = args_type
        .and_then(|a| a.args_model.get("properties"))
        .and_then(|p| p.as_object())
    else {
        return Vec::new();
    };
    properties
        .iter()
        .filter(|(name, _)| name.as_str() != "user_infos")
        .map(|(name, schema)| MemeOptionSpec {
            name: name.clone(),
            description: schema
                .get("description")
                .and_then(|d| d.as_str())
                .map(str::to_string),
        })
        .collect()
}

impl From<LegacyInfo> for MemeInfo {
    fn from(raw: LegacyInfo) -> Self {
        let p = raw.params_type;
        MemeInfo {
            key: raw.key,
            keywords: raw.keywords,
            tags: raw.tags,
            params: MemeParams {
                min_images: p.min_images,
                max_images: p.max_images,
                min_texts: p.min_texts,
                max_texts: p.max_texts,
                default_texts: p.default_texts,
                options: options_from_schema(p.args_type.as_ref()),
            },
        }
    }
}

/// Legacy service adapter. Image labels are not part of this API and are dropped.
pub struct LegacyHttpRenderer {
    client: reqwest::Client,
    base_url: String,
    version: String,
}

impl LegacyHttpRenderer {
    pub fn new(base_url: &str, client: reqwest::Client, version: String) -> Self {
        Self {
            client,
            base_url: normalize_base(base_url),
            version,
        }
    }

    async fn fetch_info(&self, key: String) -> Result<MemeInfo> {
        let resp = self
            .client
            .get(format!("{}/memes/{}/info", self.base_url, key))
            .send()
            .await?;
        let raw: LegacyInfo = ensure_success(resp).await?.json().await?;
        Ok(raw.into())
    }
}

#[async_trait]
impl MemeRenderer for LegacyHttpRenderer {
    fn version(&self) -> &str {
        &self.version
    }

    #[instrument(skip(self))]
    async fn memes(&self) -> Result<Vec<MemeInfo>> {
        let resp = self
            .client
            .get(format!("{}/memes/keys", self.base_url))
            .send()
            .await?;
        let keys: Vec<String> = ensure_success(resp).await?.json().await?;

        let memes = collect_catalog(keys, |key| self.fetch_info(key)).await;
        info!(count = memes.len(), "Loaded meme catalog (legacy API)");
        Ok(memes)
    }

    #[instrument(skip(self, images, texts, options), fields(images = images.len(), texts = texts.len()))]
    async fn render(
        &self,
        key: &str,
        images: Vec<MemeImage>,
        texts: Vec<String>,
        options: MemeOptions,
    ) -> Result<Vec<u8>> {
        let mut form = Form::new();
        for (i, image) in images.into_iter().enumerate() {
            form = form.part("images", Part::bytes(image.data).file_name(format!("image{}", i)));
        }
        for text in texts {
            form = form.text("texts", text);
        }
        form = form.text("args", serde_json::to_string(&options)?);

        let resp = self
            .client
            .post(format!("{}/memes/{}/", self.base_url, key))
            .multipart(form)
            .send()
            .await?;
        let bytes = read_bytes(resp).await?;
        debug!(key = %key, size = bytes.len(), "Meme rendered");
        Ok(bytes)
    }

    async fn render_list(&self, memes: &[MemeInfo]) -> Result<Vec<u8>> {
        let meme_list: Vec<_> = memes
            .iter()
            .map(|m| json!({ "meme_key": m.key, "disabled": false, "labels": [] }))
            .collect();
        let body = json!({
            "meme_list": meme_list,
            "text_template": "{index}.{keywords}",
            "add_category_icon": true,
        });
        let resp = self
            .client
            .post(format!("{}/memes/render_list", self.base_url))
            .json(&body)
            .send()
            .await?;
        read_bytes(resp).await
    }

    async fn preview(&self, key: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get(format!("{}/memes/{}/preview", self.base_url, key))
            .send()
            .await?;
        read_bytes(resp).await
    }

    async fn check_resources(&self) -> Result<()> {
        let version = fetch_version(&self.client, &self.base_url).await?;
        info!(version = %version, "Meme service reachable (legacy API)");
        Ok(())
    }
}
