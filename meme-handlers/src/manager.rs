//! Meme catalog plus the operations handlers need: lookup, detail text, list image, generation.

use meme_client::{MemeClientError, MemeInfo, MemeParams, MemeRenderer};
use memebot_core::Message;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use crate::collector::ParamsCollector;
use crate::matcher::KeywordMatcher;

/// Catalog loaded once at startup and the renderer it came from.
pub struct MemeManager {
    renderer: Arc<dyn MemeRenderer>,
    memes: Vec<MemeInfo>,
    matcher: KeywordMatcher,
    collector: ParamsCollector,
}

impl MemeManager {
    pub fn new(
        renderer: Arc<dyn MemeRenderer>,
        memes: Vec<MemeInfo>,
        collector: ParamsCollector,
    ) -> Self {
        let matcher = KeywordMatcher::from_catalog(&memes);
        Self {
            renderer,
            memes,
            matcher,
            collector,
        }
    }

    /// Fetch the catalog from the renderer and build the manager.
    pub async fn load(
        renderer: Arc<dyn MemeRenderer>,
        collector: ParamsCollector,
    ) -> Result<Self, MemeClientError> {
        let memes = renderer.memes().await?;
        info!(
            version = %renderer.version(),
            memes = memes.len(),
            "Meme catalog ready"
        );
        Ok(Self::new(renderer, memes, collector))
    }

    pub fn matcher(&self) -> &KeywordMatcher {
        &self.matcher
    }

    /// Meme whose key or keywords contain `keyword`.
    pub fn find_meme(&self, keyword: &str) -> Option<&MemeInfo> {
        self.memes.iter().find(|m| m.answers_to(keyword))
    }

    /// Detail text plus preview image for the meme behind `keyword`. `None` when no meme
    /// answers to it; the preview is `None` when the renderer cannot produce one.
    pub async fn meme_details(&self, keyword: &str) -> Option<(String, Option<Vec<u8>>)> {
        let meme = self.find_meme(keyword)?;
        let preview = match self.renderer.preview(&meme.key).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(key = %meme.key, error = %e, "Preview failed");
                None
            }
        };
        Some((describe(meme), preview))
    }

    /// Image listing every meme in the catalog.
    pub async fn render_meme_list(&self) -> Option<Vec<u8>> {
        match self.renderer.render_list(&self.memes).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                error!(error = %e, "Meme list render failed");
                None
            }
        }
    }

    /// Collect inputs from `message` and render the meme behind `keyword`.
    /// `Ok(None)` when no meme answers to the keyword.
    #[instrument(skip(self, message), fields(message_id = %message.id))]
    pub async fn generate(
        &self,
        message: &Message,
        keyword: &str,
    ) -> Result<Option<Vec<u8>>, MemeClientError> {
        let Some(meme) = self.find_meme(keyword) else {
            return Ok(None);
        };
        let params = self.collector.collect(message, &meme.params).await;
        let image = self
            .renderer
            .render(&meme.key, params.images, params.texts, params.options)
            .await?;
        Ok(Some(image))
    }

    /// Runs the renderer's resource check in the background; failures are logged only.
    pub fn spawn_resource_check(&self) -> JoinHandle<()> {
        let renderer = Arc::clone(&self.renderer);
        tokio::spawn(async move {
            match renderer.check_resources().await {
                Ok(()) => info!("Meme resources checked"),
                Err(e) => warn!(error = %e, "Meme resource check failed"),
            }
        })
    }
}

fn range(min: usize, max: usize, unit: &str) -> String {
    if min == max {
        format!("{}{}", min, unit)
    } else {
        format!("{}~{}{}", min, max, unit)
    }
}

/// Multi-line description of a meme, as shown by the detail command.
pub fn describe(meme: &MemeInfo) -> String {
    let MemeParams {
        min_images,
        max_images,
        min_texts,
        max_texts,
        default_texts,
        options,
    } = &meme.params;

    let mut lines = vec![
        format!("名称：{}", meme.key),
        format!("别名：{}", meme.keywords.join("、")),
    ];
    if *max_images > 0 {
        lines.push(format!("所需图片：{}", range(*min_images, *max_images, "张")));
    }
    if *max_texts > 0 {
        lines.push(format!("所需文本：{}", range(*min_texts, *max_texts, "段")));
    }
    if !default_texts.is_empty() {
        lines.push(format!("默认文本：{}", default_texts.join("、")));
    }
    if !options.is_empty() {
        let opts: Vec<String> = options
            .iter()
            .map(|o| match &o.description {
                Some(d) if !d.is_empty() => format!("{}（{}）", o.name, d),
                _ => o.name.clone(),
            })
            .collect();
        lines.push(format!("可选参数：{}", opts.join("、")));
    }
    if !meme.tags.is_empty() {
        lines.push(format!("标签：{}", meme.tags.join("、")));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use meme_client::MemeOptionSpec;

    fn punch() -> MemeInfo {
        MemeInfo {
            key: "punch".to_string(),
            keywords: vec!["打拳".to_string(), "punch".to_string()],
            tags: vec!["动作".to_string()],
            params: MemeParams {
                min_images: 1,
                max_images: 1,
                min_texts: 0,
                max_texts: 2,
                default_texts: vec!["哼".to_string()],
                options: vec![MemeOptionSpec {
                    name: "circle".to_string(),
                    description: Some("圆形头像".to_string()),
                }],
            },
        }
    }

    #[test]
    fn test_describe_lists_every_field() {
        let text = describe(&punch());
        assert_eq!(
            text,
            "名称：punch\n别名：打拳、punch\n所需图片：1张\n所需文本：0~2段\n默认文本：哼\n可选参数：circle（圆形头像）\n标签：动作"
        );
    }

    #[test]
    fn test_describe_omits_empty_sections() {
        let meme = MemeInfo {
            key: "blank".to_string(),
            keywords: vec!["空".to_string()],
            tags: vec![],
            params: MemeParams::default(),
        };
        assert_eq!(describe(&meme), "名称：blank\n别名：空");
    }
}
