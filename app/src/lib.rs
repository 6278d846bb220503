//! Offline translation chat bot.
//!
//! Models are Argos Translate packages fetched on first use (or up front with
//! `--download`/`--download-all`) and cached on disk by
//! [`translate_bot_model_cache::ModelCacheManager`].

pub mod argos;
pub mod bot;
pub mod cli;
pub mod config;
pub mod error;
pub mod log;
pub mod progress;
pub mod translator;
pub mod transport;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use ::log::{error, info, warn};
use tokio_util::sync::CancellationToken;
use translate_bot_model_cache::{DownloadSummary, ModelCacheManager};

use crate::argos::ArgosBackend;
use crate::bot::BotHandler;
use crate::cli::Cli;
use crate::config::{BackendConfig, BotConfig, ConfigKey, ConfigStore, JsonFileStore};
use crate::error::Error;
use crate::translator::ArgosCliTranslator;
use crate::transport::ConsoleTransport;

/// Start the bot as configured by `cli`.
///
/// Returns a failure exit code when any requested model failed to download,
/// even if the bot ran afterwards.
pub async fn run(cli: Cli) -> Result<ExitCode, Error> {
    let store = JsonFileStore::open(cli.config_path())?;
    let bot_config: BotConfig = store.get_or_default(&ConfigKey::BOT);
    let mut backend_config: BackendConfig = store.get_or_default(&ConfigKey::BACKEND);
    if let Some(index_url) = &cli.index_url {
        backend_config.index_url = index_url.clone();
    }

    let models_dir = cli.models_dir();
    let backend = Arc::new(ArgosBackend::new(&backend_config.index_url, &models_dir)?);
    let manager = ModelCacheManager::initialize(backend)
        .await?
        .with_download_concurrency(backend_config.download_concurrency);
    progress::spawn_reporter(manager.subscribe());

    let summary = predownload(&manager, &cli).await;
    if let Some(summary) = &summary {
        print_summary(summary);
    }
    let status = exit_status(summary.as_ref());

    if cli.download_only {
        return Ok(ExitCode::from(status));
    }

    let translator = Arc::new(ArgosCliTranslator::new(
        backend_config.translator_program.clone(),
        backend_config.translator_args.clone(),
        models_dir,
        Duration::from_secs(backend_config.translate_timeout_secs),
    ));
    let handler = Arc::new(BotHandler::new(
        manager,
        translator,
        bot_config.name.clone(),
        bot_config.command_prefix.clone(),
        Duration::from_secs(backend_config.install_timeout_secs),
    ));

    let shutdown = CancellationToken::new();
    spawn_ctrl_c_handler(shutdown.clone());

    info!("Starting {}. Type a command such as 'help' and press Enter.", bot_config.name);
    let mut transport = ConsoleTransport::stdio();
    bot::run(handler, &mut transport, shutdown).await?;
    info!("{} stopped", bot_config.name);

    Ok(ExitCode::from(status))
}

/// Install the models requested on the command line, if any.
pub async fn predownload(manager: &ModelCacheManager, cli: &Cli) -> Option<DownloadSummary> {
    if !cli.wants_downloads() {
        return None;
    }

    let summary = if cli.download_all {
        manager.download_all().await
    } else {
        manager.download_pairs(&cli.download).await
    };
    Some(summary)
}

/// Process exit status: 1 when any requested model failed, 0 otherwise.
pub fn exit_status(summary: Option<&DownloadSummary>) -> u8 {
    match summary {
        Some(summary) if !summary.is_success() => 1,
        _ => 0,
    }
}

fn print_summary(summary: &DownloadSummary) {
    println!(
        "Download complete! {} successful, {} failed.",
        summary.success_count(),
        summary.failure_count()
    );
    for (pair, e) in &summary.failed {
        println!(
            "  Failed to download {} → {}: {}",
            pair.from_code(),
            pair.to_code(),
            e
        );
    }
}

fn spawn_ctrl_c_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => shutdown.cancel(),
            Err(e) => {
                error!("Failed to listen for Ctrl-C: {}", e);
                warn!("The bot can only be stopped by closing its input");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use clap::Parser;
    use std::path::PathBuf;
    use translate_bot_model_cache::{
        BackendError, CacheState, LanguagePair, ModelBackend, ModelCatalog,
    };

    /// Installs everything except en-es
    struct PartlyBrokenBackend;

    #[async_trait]
    impl ModelBackend for PartlyBrokenBackend {
        async fn fetch_catalog(&self) -> Result<Vec<LanguagePair>, BackendError> {
            Ok(Vec::new())
        }

        async fn download_model(&self, pair: &LanguagePair) -> Result<PathBuf, BackendError> {
            if *pair == LanguagePair::new("en", "es") {
                return Err(BackendError::Network("connection reset".to_string()));
            }
            Ok(PathBuf::from(format!("/models/{}", pair)))
        }
    }

    fn manager() -> ModelCacheManager {
        ModelCacheManager::new(
            Arc::new(PartlyBrokenBackend),
            ModelCatalog::new(vec![
                LanguagePair::new("en", "es"),
                LanguagePair::new("es", "en"),
            ]),
            Arc::new(CacheState::new()),
        )
    }

    async fn status_for(args: &[&str]) -> (Option<DownloadSummary>, u8) {
        let cli = Cli::try_parse_from(args).unwrap();
        let summary = predownload(&manager(), &cli).await;
        let status = exit_status(summary.as_ref());
        (summary, status)
    }

    #[tokio::test]
    async fn test_no_downloads_requested() {
        let (summary, status) = status_for(&["translate-bot"]).await;

        assert!(summary.is_none());
        assert_eq!(status, 0);
    }

    #[tokio::test]
    async fn test_successful_downloads_exit_zero() {
        let (summary, status) = status_for(&["translate-bot", "--download", "es-en"]).await;

        assert_eq!(summary.unwrap().success_count(), 1);
        assert_eq!(status, 0);
    }

    #[tokio::test]
    async fn test_failed_pair_exits_one() {
        let (summary, status) =
            status_for(&["translate-bot", "--download", "es-en", "en-es"]).await;

        let summary = summary.unwrap();
        assert_eq!(summary.success_count(), 1);
        assert_eq!(summary.failure_count(), 1);
        assert_eq!(status, 1);
    }

    #[tokio::test]
    async fn test_download_all_with_failure_exits_one() {
        let (summary, status) = status_for(&["translate-bot", "--download-all"]).await;

        assert_eq!(summary.unwrap().failure_count(), 1);
        assert_eq!(status, 1);
    }

    #[tokio::test]
    async fn test_unsupported_pair_exits_one() {
        let (_, status) = status_for(&["translate-bot", "--download", "xx-yy"]).await;

        assert_eq!(status, 1);
    }
}
