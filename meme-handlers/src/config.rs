//! Meme plugin settings. Loaded from environment variables (see `MEME_*`).

use anyhow::Result;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::fetch::DEFAULT_AVATAR_URL_TEMPLATE;

/// Where avatars come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarSourceKind {
    /// The chat platform's own profile photos.
    Platform,
    /// `avatar_url_template` with the user id substituted.
    Template,
}

impl std::str::FromStr for AvatarSourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "platform" => Ok(Self::Platform),
            "template" => Ok(Self::Template),
            other => anyhow::bail!("unknown avatar source {:?} (expected platform or template)", other),
        }
    }
}

/// Settings for matching, generation and the disabled list.
#[derive(Debug, Clone)]
pub struct MemeConfig {
    /// MEME_SERVER_URL: base URL of the rendering service
    pub server_url: String,
    /// MEME_NEED_PREFIX: only react to messages addressed to the bot
    pub need_prefix: bool,
    /// MEME_EXTRA_PREFIX: required leading text, stripped before matching
    pub extra_prefix: String,
    /// MEME_FUZZY_MATCH: keyword may appear anywhere in the text
    pub fuzzy_match: bool,
    /// MEME_COMPRESS_IMAGE
    pub compress_image: bool,
    /// MEME_COMPRESS_MAX_SIDE: longest side after compression, in pixels
    pub compress_max_side: u32,
    /// MEME_CHECK_RESOURCES: run the renderer resource check at startup
    pub check_resources: bool,
    /// MEME_TIMEOUT_SECS: deadline for collect + render
    pub timeout: Duration,
    /// MEME_DISABLED_LIST_PATH: JSON file holding the disabled keywords
    pub disabled_list_path: PathBuf,
    /// MEME_DOWNGRADE_HTTPS: fetch `https://` image URLs over plain http
    pub downgrade_https: bool,
    /// MEME_AVATAR_SOURCE: `platform` or `template`
    pub avatar_source: AvatarSourceKind,
    /// MEME_AVATAR_URL_TEMPLATE: avatar URL with a `{user_id}` placeholder
    pub avatar_url_template: String,
}

impl Default for MemeConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:2233".to_string(),
            need_prefix: false,
            extra_prefix: String::new(),
            fuzzy_match: false,
            compress_image: true,
            compress_max_side: 512,
            check_resources: true,
            timeout: Duration::from_secs(30),
            disabled_list_path: PathBuf::from("data/memes_disabled.json"),
            downgrade_https: false,
            avatar_source: AvatarSourceKind::Platform,
            avatar_url_template: DEFAULT_AVATAR_URL_TEMPLATE.to_string(),
        }
    }
}

fn env_bool(name: &str, default: bool) -> Result<bool> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(v) => match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => anyhow::bail!("{} must be a boolean, got {:?}", name, other),
        },
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(v) => v
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} is not a valid number: {:?}", name, v)),
    }
}

impl MemeConfig {
    /// Load from environment variables; unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            server_url: env::var("MEME_SERVER_URL").unwrap_or(defaults.server_url),
            need_prefix: env_bool("MEME_NEED_PREFIX", defaults.need_prefix)?,
            extra_prefix: env::var("MEME_EXTRA_PREFIX").unwrap_or(defaults.extra_prefix),
            fuzzy_match: env_bool("MEME_FUZZY_MATCH", defaults.fuzzy_match)?,
            compress_image: env_bool("MEME_COMPRESS_IMAGE", defaults.compress_image)?,
            compress_max_side: env_parse("MEME_COMPRESS_MAX_SIDE", defaults.compress_max_side)?,
            check_resources: env_bool("MEME_CHECK_RESOURCES", defaults.check_resources)?,
            timeout: Duration::from_secs(env_parse(
                "MEME_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )?),
            disabled_list_path: env::var("MEME_DISABLED_LIST_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.disabled_list_path),
            downgrade_https: env_bool("MEME_DOWNGRADE_HTTPS", defaults.downgrade_https)?,
            avatar_source: match env::var("MEME_AVATAR_SOURCE") {
                Ok(v) => v.parse()?,
                Err(_) => defaults.avatar_source,
            },
            avatar_url_template: env::var("MEME_AVATAR_URL_TEMPLATE")
                .unwrap_or(defaults.avatar_url_template),
        })
    }

    /// Validate config. Call after from_env() to fail fast before connecting.
    pub fn validate(&self) -> Result<()> {
        if reqwest::Url::parse(&self.server_url).is_err() {
            anyhow::bail!("MEME_SERVER_URL is not a valid URL: {}", self.server_url);
        }
        if self.timeout.is_zero() {
            anyhow::bail!("MEME_TIMEOUT_SECS must be greater than zero");
        }
        if !self.avatar_url_template.contains("{user_id}") {
            anyhow::bail!(
                "MEME_AVATAR_URL_TEMPLATE must contain {{user_id}}: {}",
                self.avatar_url_template
            );
        }
        if self.compress_max_side == 0 {
            anyhow::bail!("MEME_COMPRESS_MAX_SIDE must be greater than zero");
        }
        Ok(())
    }
}
