use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::StreamExt;
use log::{debug, info, warn};
use tokio::io::AsyncWriteExt;
use translate_bot_model_cache::{BackendError, LanguagePair, ModelBackend};

use super::index::{parse_index, IndexEntry};
use super::package::{self, DOWNLOADS_DIR};

/// Last successfully fetched index, used when the network is unavailable
const INDEX_CACHE_FILE: &str = ".index.json";
const PROGRESS_LOG_INTERVAL: Duration = Duration::from_secs(2);

/// Model backend for the Argos Translate package index.
///
/// Packages are downloaded into `models_dir/.downloads` as `.partial` files
/// (resumed on the next attempt if interrupted), verified, then extracted
/// next to the other installed packages.
pub struct ArgosBackend {
    client: reqwest::Client,
    index_url: String,
    models_dir: PathBuf,
    /// Index entries from the last catalog fetch, by pair
    packages: RwLock<HashMap<LanguagePair, IndexEntry>>,
}

impl ArgosBackend {
    pub fn new(index_url: impl Into<String>, models_dir: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let models_dir = models_dir.into();
        std::fs::create_dir_all(&models_dir)?;
        info!("Models directory: {:?}", models_dir);

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BackendError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            index_url: index_url.into(),
            models_dir,
            packages: RwLock::new(HashMap::new()),
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    async fn fetch_index(&self) -> Result<String, BackendError> {
        info!("Updating package index from {}", self.index_url);

        self.client
            .get(&self.index_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| BackendError::Network(format!("failed to fetch package index: {}", e)))?
            .text()
            .await
            .map_err(|e| BackendError::Network(format!("failed to read package index: {}", e)))
    }

    async fn request_from(&self, url: &str, offset: u64) -> Result<reqwest::Response, BackendError> {
        let mut request = self.client.get(url);
        if offset > 0 {
            info!("Resuming {} from {} bytes", url, offset);
            request = request.header(reqwest::header::RANGE, format!("bytes={}-", offset));
        }

        request
            .send()
            .await
            .map_err(|e| BackendError::Network(format!("failed to start download: {}", e)))
    }

    fn index_entry(&self, pair: &LanguagePair) -> Option<IndexEntry> {
        self.packages
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(pair)
            .cloned()
    }

    fn installed_package(&self, pair: &LanguagePair) -> Result<Option<PathBuf>, BackendError> {
        Ok(package::scan_installed(&self.models_dir)?
            .into_iter()
            .find(|(installed, _)| installed == pair)
            .map(|(_, path)| path))
    }

    /// Try each mirror in turn until one delivers the whole archive.
    async fn download_archive(&self, entry: &IndexEntry, dest: &Path) -> Result<(), BackendError> {
        let mut last_error = None;

        for url in &entry.links {
            match self.download_file(url, dest).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!("Download from {} failed: {}", url, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| BackendError::Index("package has no download links".to_string())))
    }

    /// Download a file with resume support.
    ///
    /// If `dest_path` already holds part of the file, only the rest is
    /// requested. Servers that ignore the `Range` header get the file
    /// rewritten from the start. A partial file the server refuses to resume
    /// (416, usually because it is already complete) is discarded and the
    /// download starts over.
    async fn download_file(&self, url: &str, dest_path: &Path) -> Result<(), BackendError> {
        let mut resume_from = tokio::fs::metadata(dest_path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);

        let mut response = self.request_from(url, resume_from).await?;
        if resume_from > 0 && response.status() == reqwest::StatusCode::RANGE_NOT_SATISFIABLE {
            warn!(
                "Server refused to resume {:?} at {} bytes, downloading again",
                dest_path, resume_from
            );
            tokio::fs::remove_file(dest_path).await?;
            resume_from = 0;
            response = self.request_from(url, 0).await?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Network(format!(
                "download failed with status: {}",
                status
            )));
        }

        let resuming = resume_from > 0 && status == reqwest::StatusCode::PARTIAL_CONTENT;
        let total_size = response.content_length().map(|len| {
            if resuming {
                len + resume_from
            } else {
                len
            }
        });

        let file = if resuming {
            tokio::fs::OpenOptions::new()
                .append(true)
                .open(dest_path)
                .await?
        } else {
            tokio::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(dest_path)
                .await?
        };

        let mut file = tokio::io::BufWriter::new(file);
        let mut stream = response.bytes_stream();
        let mut downloaded = if resuming { resume_from } else { 0 };
        let mut last_log = Instant::now();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| BackendError::Network(format!("download error: {}", e)))?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            if last_log.elapsed() >= PROGRESS_LOG_INTERVAL {
                match total_size {
                    Some(total) if total > 0 => debug!(
                        "Download progress: {:.1}% ({}/{} bytes)",
                        downloaded as f64 / total as f64 * 100.0,
                        downloaded,
                        total
                    ),
                    _ => debug!("Download progress: {} bytes", downloaded),
                }
                last_log = Instant::now();
            }
        }

        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl ModelBackend for ArgosBackend {
    async fn fetch_catalog(&self) -> Result<Vec<LanguagePair>, BackendError> {
        let cache_path = self.models_dir.join(INDEX_CACHE_FILE);

        let body = match self.fetch_index().await {
            Ok(body) => {
                if let Err(e) = tokio::fs::write(&cache_path, &body).await {
                    warn!("Could not cache package index at {:?}: {}", cache_path, e);
                }
                body
            }
            Err(e) => match tokio::fs::read_to_string(&cache_path).await {
                Ok(cached) => {
                    warn!("{}; using cached package index {:?}", e, cache_path);
                    cached
                }
                Err(_) => return Err(e),
            },
        };

        let entries = parse_index(&body).map_err(|e| BackendError::Index(e.to_string()))?;

        let mut pairs = Vec::with_capacity(entries.len());
        let mut packages = HashMap::with_capacity(entries.len());
        for entry in entries {
            let pair = entry.pair();
            if packages.contains_key(&pair) {
                debug!("Ignoring duplicate index entry for {}", pair);
                continue;
            }
            pairs.push(pair.clone());
            packages.insert(pair, entry);
        }

        info!("Package index lists {} translation packages", pairs.len());
        *self
            .packages
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = packages;
        Ok(pairs)
    }

    async fn download_model(&self, pair: &LanguagePair) -> Result<PathBuf, BackendError> {
        if let Some(path) = self.installed_package(pair)? {
            info!("Package {} already installed at {:?}", pair, path);
            return Ok(path);
        }

        let entry = self
            .index_entry(pair)
            .ok_or_else(|| BackendError::Index(format!("no package for {} in index", pair)))?;

        let downloads_dir = self.models_dir.join(DOWNLOADS_DIR);
        tokio::fs::create_dir_all(&downloads_dir).await?;
        let partial_path = downloads_dir.join(format!("{}.partial", entry.archive_name()));

        info!("Downloading package {} → {:?}", pair, partial_path);
        self.download_archive(&entry, &partial_path).await?;

        if let Some(expected) = &entry.sha256 {
            info!("Verifying checksum of {}", pair);
            if let Err(e) = package::verify_checksum(&partial_path, expected).await {
                let _ = tokio::fs::remove_file(&partial_path).await;
                return Err(e);
            }
        }

        let archive = partial_path.clone();
        let models_dir = self.models_dir.clone();
        let expected = pair.clone();
        let extracted = tokio::task::spawn_blocking(move || {
            package::extract_package(&archive, &models_dir, &expected)
        })
        .await
        .map_err(|e| BackendError::Storage(std::io::Error::other(e)))?;

        // Never resume from an archive that was already complete
        if let Err(e) = tokio::fs::remove_file(&partial_path).await {
            warn!("Could not remove archive {:?}: {}", partial_path, e);
        }

        extracted
    }

    async fn installed_models(&self) -> Result<Vec<(LanguagePair, PathBuf)>, BackendError> {
        let models_dir = self.models_dir.clone();
        tokio::task::spawn_blocking(move || package::scan_installed(&models_dir))
            .await
            .map_err(|e| BackendError::Storage(std::io::Error::other(e)))?
    }
}
