use std::path::PathBuf;

use clap::Parser;
use translate_bot_model_cache::LanguagePair;

const CONFIG_FILE: &str = "config.json";
const MODELS_DIR: &str = "models";

/// Offline translation chat bot
#[derive(Parser, Debug)]
#[command(name = "translate-bot", version, about, long_about = None)]
pub struct Cli {
    /// Download all available translation models before starting the bot
    #[arg(long, conflicts_with = "download")]
    pub download_all: bool,

    /// Download specific language pairs before starting (format: en-es es-en)
    #[arg(long, value_name = "PAIR", num_args = 1..)]
    pub download: Vec<LanguagePair>,

    /// Exit after downloading instead of starting the bot
    #[arg(long)]
    pub download_only: bool,

    /// Directory for the config file and installed models
    #[arg(long, env = "TRANSLATE_BOT_STORAGE", default_value = "translate_data")]
    pub storage: PathBuf,

    /// Config file (default: <storage>/config.json)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Where translation models are installed (default: <storage>/models)
    #[arg(long)]
    pub models_dir: Option<PathBuf>,

    /// Argos package index URL, overriding the config file
    #[arg(long)]
    pub index_url: Option<String>,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| self.storage.join(CONFIG_FILE))
    }

    pub fn models_dir(&self) -> PathBuf {
        self.models_dir
            .clone()
            .unwrap_or_else(|| self.storage.join(MODELS_DIR))
    }

    /// Whether any models should be downloaded before the bot starts
    pub fn wants_downloads(&self) -> bool {
        self.download_all || !self.download.is_empty()
    }
}
