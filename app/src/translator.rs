//! Runs the offline translation engine for an installed model.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use translate_bot_model_cache::ModelHandle;

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Translation engine failed ({status}): {stderr}")]
    Engine { status: String, stderr: String },
    #[error("Translation timed out after {0} seconds")]
    Timeout(u64),
    #[error("Translation engine returned no text")]
    EmptyOutput,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Translates text with an installed model.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, model: &ModelHandle, text: &str) -> Result<String, TranslateError>;
}

/// Translator backed by the `argos-translate` command line tool.
///
/// The text goes to the engine's stdin and the translation is read from its
/// stdout. `ARGOS_PACKAGES_DIR` points the engine at our models directory so
/// it sees exactly the packages the cache installed.
pub struct ArgosCliTranslator {
    program: String,
    args: Vec<String>,
    packages_dir: PathBuf,
    timeout: Duration,
}

impl ArgosCliTranslator {
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        packages_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            packages_dir: packages_dir.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Translator for ArgosCliTranslator {
    async fn translate(&self, model: &ModelHandle, text: &str) -> Result<String, TranslateError> {
        let pair = model.pair();
        debug!(
            "Running {} for {} ({} chars)",
            self.program,
            pair,
            text.chars().count()
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg("--from-lang")
            .arg(pair.from_code())
            .arg("--to-lang")
            .arg(pair.to_code())
            .env("ARGOS_PACKAGES_DIR", &self.packages_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TranslateError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                warn!("Translation of {} exceeded {:?}", pair, self.timeout);
                return Err(TranslateError::Timeout(self.timeout.as_secs()));
            }
        };

        if !output.status.success() {
            return Err(TranslateError::Engine {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let translated = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if translated.is_empty() {
            return Err(TranslateError::EmptyOutput);
        }

        Ok(translated)
    }
}
