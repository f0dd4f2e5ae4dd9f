//! Adapter for services 0.2.0 and newer: images are uploaded first and every render
//! answers with an image id that is fetched separately.

use crate::error::Result;
use crate::renderer::MemeRenderer;
use crate::transport::{
    collect_catalog, ensure_success, fetch_version, normalize_base, read_bytes, ImageId,
};
use crate::types::{MemeImage, MemeInfo, MemeOptionSpec, MemeOptions, MemeParams};
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument};

#[derive(Debug, Deserialize)]
struct CurrentInfo {
    key: String,
    params: CurrentParams,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CurrentParams {
    min_images: usize,
    max_images: usize,
    min_texts: usize,
    max_texts: usize,
    #[serde(default)]
    default_texts: Vec<String>,
    #[serde(default)]
    options: Vec<CurrentOption>,
}

#[derive(Debug, Deserialize)]
struct CurrentOption {
    name: String,
    #[serde(default)]
    description: Option<String>,
}

impl From<CurrentInfo> for MemeInfo {
    fn from(raw: CurrentInfo) -> Self {
        let p = raw.params;
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
                options: p
                    .options
                    .into_iter()
                    .map(|o| MemeOptionSpec {
                        name: o.name,
                        description: o.description,
                    })
                    .collect(),
            },
        }
    }
}

/// Current service adapter. Image labels are forwarded as `name`.
pub struct HttpRenderer {
    client: reqwest::Client,
    base_url: String,
    version: String,
}

impl HttpRenderer {
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
        let raw: CurrentInfo = ensure_success(resp).await?.json().await?;
        Ok(raw.into())
    }

    async fn upload(&self, data: &[u8]) -> Result<String> {
        let body = json!({
            "type": "data",
            "data": base64::engine::general_purpose::STANDARD.encode(data),
        });
        let resp = self
            .client
            .post(format!("{}/image/upload", self.base_url))
            .json(&body)
            .send()
            .await?;
        let id: ImageId = ensure_success(resp).await?.json().await?;
        Ok(id.image_id)
    }

    async fn download(&self, image_id: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get(format!("{}/image/{}", self.base_url, image_id))
            .send()
            .await?;
        read_bytes(resp).await
    }

    async fn image_from(&self, resp: reqwest::Response) -> Result<Vec<u8>> {
        let id: ImageId = ensure_success(resp).await?.json().await?;
        self.download(&id.image_id).await
    }
}

#[async_trait]
impl MemeRenderer for HttpRenderer {
    fn version(&self) -> &str {
        &self.version
    }

    #[instrument(skip(self))]
    async fn memes(&self) -> Result<Vec<MemeInfo>> {
        let resp = self
            .client
            .get(format!("{}/meme/keys", self.base_url))
            .send()
            .await?;
        let keys: Vec<String> = ensure_success(resp).await?.json().await?;

        let memes = collect_catalog(keys, |key| self.fetch_info(key)).await;
        info!(count = memes.len(), "Loaded meme catalog");
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
        let mut uploaded = Vec::with_capacity(images.len());
        for image in &images {
            let id = self.upload(&image.data).await?;
            uploaded.push(json!({ "name": image.name, "id": id }));
        }
        let body = json!({
            "images": uploaded,
            "texts": texts,
            "options": options,
        });
        let resp = self
            .client
            .post(format!("{}/memes/{}", self.base_url, key))
            .json(&body)
            .send()
            .await?;
        let bytes = self.image_from(resp).await?;
        debug!(key = %key, size = bytes.len(), "Meme rendered");
        Ok(bytes)
    }

    async fn render_list(&self, memes: &[MemeInfo]) -> Result<Vec<u8>> {
        let meme_properties: serde_json::Map<String, serde_json::Value> = memes
            .iter()
            .map(|m| (m.key.clone(), json!({ "disabled": false, "labels": [] })))
            .collect();
        let body = json!({
            "meme_properties": meme_properties,
            "exclude_memes": [],
            "sort_by": "keywords_pinyin",
            "sort_reverse": false,
            "text_template": "{index}. {keywords}",
            "add_category_icon": true,
        });
        let resp = self
            .client
            .post(format!("{}/tools/render_list", self.base_url))
            .json(&body)
            .send()
            .await?;
        self.image_from(resp).await
    }

    async fn preview(&self, key: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get(format!("{}/memes/{}/preview", self.base_url, key))
            .send()
            .await?;
        self.image_from(resp).await
    }

    async fn check_resources(&self) -> Result<()> {
        let version = fetch_version(&self.client, &self.base_url).await?;
        info!(version = %version, "Meme service reachable");
        Ok(())
    }
}
