use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use translate_bot_model_cache::{LanguagePair, ModelCacheManager};

use super::commands::{parse_command, Command, CommandError};
use super::replies;
use super::stats::BotStats;
use crate::translator::Translator;

/// Answers chat messages. Shared by every in-flight message task.
pub struct BotHandler {
    manager: ModelCacheManager,
    translator: Arc<dyn Translator>,
    stats: BotStats,
    bot_name: String,
    prefix: String,
    install_timeout: Duration,
}

impl BotHandler {
    pub fn new(
        manager: ModelCacheManager,
        translator: Arc<dyn Translator>,
        bot_name: impl Into<String>,
        prefix: impl Into<String>,
        install_timeout: Duration,
    ) -> Self {
        Self {
            manager,
            translator,
            stats: BotStats::new(),
            bot_name: bot_name.into(),
            prefix: prefix.into(),
            install_timeout,
        }
    }

    pub fn stats(&self) -> &BotStats {
        &self.stats
    }

    /// Reply to one message. `None` means the message isn't for the bot.
    pub async fn handle(&self, message: &str) -> Option<String> {
        let command = match parse_command(message, &self.prefix) {
            Ok(command) => command,
            Err(CommandError::NotACommand) => return None,
            Err(CommandError::TranslateUsage) => return Some(replies::translate_usage()),
            Err(CommandError::Unknown(word)) => {
                debug!("Unknown command: {}", word);
                return Some(replies::unknown_command(&word));
            }
        };

        let reply = match command {
            Command::Translate { pair, text } => self.translate(&pair, &text).await,
            Command::Languages => replies::languages(&self.manager.catalog().languages()),
            Command::Stats => {
                // Packages on disk that the index no longer lists don't count
                let catalog = self.manager.catalog();
                let installed: Vec<_> = self
                    .manager
                    .installed()
                    .into_iter()
                    .filter(|record| catalog.contains(&record.pair))
                    .collect();
                replies::stats(&self.stats.snapshot(), &installed, catalog.len())
            }
            Command::Help => replies::help(&self.bot_name),
        };

        Some(reply)
    }

    async fn translate(&self, pair: &LanguagePair, text: &str) -> String {
        let started = Instant::now();

        let model = match self
            .manager
            .ensure_installed_within(pair, self.install_timeout)
            .await
        {
            Ok(model) => model,
            Err(e) => {
                if e.is_retryable() {
                    warn!("Model {} not ready: {}", pair, e);
                } else {
                    debug!("Rejected translation request: {}", e);
                }
                return replies::cache_error(&e);
            }
        };

        match self.translator.translate(&model, text).await {
            Ok(translated) => {
                let elapsed = started.elapsed();
                self.stats.record_translation(elapsed);
                info!("Translated {} in {:.2}s", pair, elapsed.as_secs_f64());
                replies::translation(pair, &translated)
            }
            Err(e) => {
                warn!("Translation {} failed: {}", pair, e);
                replies::translation_error(&e)
            }
        }
    }
}
