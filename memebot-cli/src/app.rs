//! Wiring: config → renderer → manager → handler chain → Telegram REPL.

use anyhow::{Context, Result};
use handler_chain::{HandlerChain, LoggingHandler};
use meme_client::MemeRenderer;
use meme_handlers::{
    describe, AvatarSourceKind, DisabledSet, ImageFetcher, MemeCommandHandler, MemeConfig,
    MemeHandler, MemeManager, ParamsCollector, TemplateAvatars,
};
use memebot_core::{init_tracing, AvatarSource, Bot};
use memebot_telegram::{
    fetch_identity, run_repl, TelegramBotAdapter, TelegramConfig, TelegramDirectory,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Logging first, then commands (so command words never hit the keyword matcher), then memes.
pub fn build_chain(
    manager: Arc<MemeManager>,
    disabled: Arc<DisabledSet>,
    bot: Arc<dyn Bot>,
    config: &MemeConfig,
) -> HandlerChain {
    HandlerChain::new()
        .add_handler(Arc::new(LoggingHandler))
        .add_handler(Arc::new(MemeCommandHandler::new(
            manager.clone(),
            disabled.clone(),
            bot.clone(),
        )))
        .add_handler(Arc::new(MemeHandler::new(manager, disabled, bot, config)))
}

async fn connect_renderer(config: &MemeConfig, http: reqwest::Client) -> Result<Arc<dyn MemeRenderer>> {
    meme_client::connect(&config.server_url, http)
        .await
        .with_context(|| format!("Connect to meme service at {}", config.server_url))
}

/// Main entry: load and validate config, init logging, connect to the meme service,
/// load the catalog and disabled list, then run the REPL.
#[instrument(skip(token))]
pub async fn run_bot(token: Option<String>) -> Result<()> {
    let tg_config = TelegramConfig::from_env(token)?;
    tg_config.validate()?;
    let meme_config = MemeConfig::from_env()?;
    meme_config.validate()?;
    init_tracing(Some(&tg_config.log_file))?;

    info!(
        server_url = %meme_config.server_url,
        fuzzy_match = meme_config.fuzzy_match,
        need_prefix = meme_config.need_prefix,
        "Initializing memebot"
    );

    let http = reqwest::Client::new();
    let renderer = connect_renderer(&meme_config, http.clone()).await?;

    let teloxide_bot = tg_config.build_bot();
    let me = fetch_identity(&teloxide_bot)
        .await
        .context("Fetch bot identity (get_me)")?;
    let directory = Arc::new(TelegramDirectory::new(teloxide_bot.clone()));

    let fetcher = ImageFetcher::new(http, meme_config.downgrade_https);
    let avatars: Arc<dyn AvatarSource> = match meme_config.avatar_source {
        AvatarSourceKind::Platform => directory.clone(),
        AvatarSourceKind::Template => Arc::new(TemplateAvatars::new(
            fetcher.clone(),
            meme_config.avatar_url_template.clone(),
        )),
    };
    let collector = ParamsCollector::new(fetcher, directory.clone(), avatars);

    let manager = Arc::new(
        MemeManager::load(renderer, collector)
            .await
            .context("Load meme catalog")?,
    );
    if meme_config.check_resources {
        manager.spawn_resource_check();
    }
    let disabled = Arc::new(
        DisabledSet::load(&meme_config.disabled_list_path)
            .await
            .context("Load disabled meme list")?,
    );

    let bot: Arc<dyn Bot> = Arc::new(TelegramBotAdapter::new(teloxide_bot.clone()));
    let chain = build_chain(manager, disabled, bot, &meme_config);

    info!("Bot started successfully");
    run_repl(teloxide_bot, chain, directory, me).await
}

/// `memebot memes`: one line per meme, `key: keyword, keyword`.
pub async fn print_catalog() -> Result<()> {
    let config = MemeConfig::from_env()?;
    config.validate()?;
    let renderer = connect_renderer(&config, reqwest::Client::new()).await?;
    let memes = renderer.memes().await.context("Load meme catalog")?;

    println!("{} meme(s) from {} (service {}):", memes.len(), config.server_url, renderer.version());
    for meme in &memes {
        println!("{}: {}", meme.key, meme.keywords.join(", "));
    }
    Ok(())
}

/// `memebot info <keyword>`: detail text of the matching meme.
pub async fn print_info(keyword: &str) -> Result<()> {
    let config = MemeConfig::from_env()?;
    config.validate()?;
    let renderer = connect_renderer(&config, reqwest::Client::new()).await?;
    let memes = renderer.memes().await.context("Load meme catalog")?;

    match memes.iter().find(|m| m.answers_to(keyword)) {
        Some(meme) => println!("{}", describe(meme)),
        None => println!("未找到相关meme: {}", keyword),
    }
    Ok(())
}
