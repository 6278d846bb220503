use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, info};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub const DEFAULT_INDEX_URL: &str =
    "https://raw.githubusercontent.com/argosopentech/argospm-index/main/index.json";

/// Type-safe configuration key that associates a key name with its value type
#[derive(Debug, Clone, Copy)]
pub struct ConfigKey<T> {
    name: &'static str,
    _phantom: PhantomData<T>,
}

impl<T> ConfigKey<T> {
    const fn new(name: &'static str) -> Self {
        Self {
            name,
            _phantom: PhantomData,
        }
    }

    pub fn key_name(&self) -> &'static str {
        self.name
    }
}

// ===== Bot Configuration =====

/// How the bot presents itself and recognises commands
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BotConfig {
    /// Display name used in logs and the help text
    pub name: String,
    /// Prefix a message must start with to be treated as a command.
    /// Empty means every message is a command.
    pub command_prefix: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "Translate Bot".to_string(),
            command_prefix: String::new(),
        }
    }
}

impl ConfigKey<BotConfig> {
    pub const BOT: Self = Self::new("botConfig");
}

// ===== Backend Configuration =====

/// Where models come from and how the translation engine is run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BackendConfig {
    /// Argos package index
    pub index_url: String,
    /// Translation engine executable
    pub translator_program: String,
    /// Arguments placed before `--from-lang`/`--to-lang`
    pub translator_args: Vec<String>,
    pub translate_timeout_secs: u64,
    /// How long a chat request waits for a model download before giving up
    pub install_timeout_secs: u64,
    /// Pairs fetched at once by `--download-all` / `--download`
    pub download_concurrency: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            index_url: DEFAULT_INDEX_URL.to_string(),
            translator_program: "argos-translate".to_string(),
            translator_args: Vec::new(),
            translate_timeout_secs: 60,
            install_timeout_secs: 600,
            download_concurrency: 1,
        }
    }
}

impl ConfigKey<BackendConfig> {
    pub const BACKEND: Self = Self::new("backendConfig");
}

// ===== Type-Safe Config Store =====

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to access config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to serialize config value: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub trait ConfigStore {
    fn get<T: DeserializeOwned>(&self, key: &ConfigKey<T>) -> Option<T>;
    fn set<T: Serialize>(&self, key: &ConfigKey<T>, value: T) -> Result<(), ConfigError>;
    fn delete<T>(&self, key: &ConfigKey<T>) -> Result<(), ConfigError>;

    /// Stored value, or the default when missing or unreadable
    fn get_or_default<T: DeserializeOwned + Default>(&self, key: &ConfigKey<T>) -> T {
        self.get(key).unwrap_or_default()
    }
}

/// Config store persisted as a single JSON object on disk.
///
/// Every `set`/`delete` rewrites the whole file.
pub struct JsonFileStore {
    path: PathBuf,
    data: Mutex<BTreeMap<String, serde_json::Value>>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();

        let data = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                    path: path.clone(),
                    source,
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No config file at {:?}, using defaults", path);
                BTreeMap::new()
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };

        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, data: &BTreeMap<String, serde_json::Value>) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let contents = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, contents).map_err(io_err)?;
        debug!("Saved config to {:?}", self.path);
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, serde_json::Value>> {
        self.data
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ConfigStore for JsonFileStore {
    fn get<T: DeserializeOwned>(&self, key: &ConfigKey<T>) -> Option<T> {
        self.lock()
            .get(key.key_name())
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    fn set<T: Serialize>(&self, key: &ConfigKey<T>, value: T) -> Result<(), ConfigError> {
        let val = serde_json::to_value(value)?;
        let mut data = self.lock();
        data.insert(key.key_name().to_string(), val);
        self.save(&data)
    }

    fn delete<T>(&self, key: &ConfigKey<T>) -> Result<(), ConfigError> {
        let mut data = self.lock();
        data.remove(key.key_name());
        self.save(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    // Simple in-memory mock store for testing
    struct MockConfigStore {
        data: RefCell<HashMap<String, serde_json::Value>>,
    }

    impl MockConfigStore {
        fn new() -> Self {
            Self {
                data: RefCell::new(HashMap::new()),
            }
        }
    }

    impl ConfigStore for MockConfigStore {
        fn get<T: DeserializeOwned>(&self, key: &ConfigKey<T>) -> Option<T> {
            self.data
                .borrow()
                .get(key.key_name())
                .and_then(|v| serde_json::from_value(v.clone()).ok())
        }

        fn set<T: Serialize>(&self, key: &ConfigKey<T>, value: T) -> Result<(), ConfigError> {
            let val = serde_json::to_value(value)?;
            self.data
                .borrow_mut()
                .insert(key.key_name().to_string(), val);
            Ok(())
        }

        fn delete<T>(&self, key: &ConfigKey<T>) -> Result<(), ConfigError> {
            self.data.borrow_mut().remove(key.key_name());
            Ok(())
        }
    }

    #[test]
    fn test_bot_config_store() {
        let test_cases = vec![
            ("BotConfig defaults", ConfigKey::BOT, BotConfig::default()),
            (
                "BotConfig with prefix",
                ConfigKey::BOT,
                BotConfig {
                    name: "Polyglot".to_string(),
                    command_prefix: "/".to_string(),
                },
            ),
        ];

        for (description, key, config) in test_cases {
            let store = MockConfigStore::new();
            test_config_lifecycle(&store, &key, config, description);
        }
    }

    #[test]
    fn test_backend_config_store() {
        let test_cases = vec![
            (
                "BackendConfig defaults",
                ConfigKey::BACKEND,
                BackendConfig::default(),
            ),
            (
                "BackendConfig with mirror and wrapper",
                ConfigKey::BACKEND,
                BackendConfig {
                    index_url: "https://mirror.example.org/index.json".to_string(),
                    translator_program: "python3".to_string(),
                    translator_args: vec!["-m".to_string(), "argostranslate.cli".to_string()],
                    translate_timeout_secs: 10,
                    install_timeout_secs: 30,
                    download_concurrency: 4,
                },
            ),
        ];

        for (description, key, config) in test_cases {
            let store = MockConfigStore::new();
            test_config_lifecycle(&store, &key, config, description);
        }
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let store = MockConfigStore::new();
        store.data.borrow_mut().insert(
            "backendConfig".to_string(),
            serde_json::json!({ "downloadConcurrency": 3 }),
        );

        let config = store.get_or_default(&ConfigKey::BACKEND);
        assert_eq!(config.download_concurrency, 3);
        assert_eq!(config.index_url, DEFAULT_INDEX_URL);
        assert_eq!(config.translator_program, "argos-translate");
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let store = JsonFileStore::open(&path).unwrap();
        assert!(store.get(&ConfigKey::BOT).is_none());
        store
            .set(
                &ConfigKey::BOT,
                BotConfig {
                    name: "Relay".to_string(),
                    command_prefix: "!".to_string(),
                },
            )
            .unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        let config = reopened.get(&ConfigKey::BOT).unwrap();
        assert_eq!(config.name, "Relay");
        assert_eq!(config.command_prefix, "!");

        reopened.delete(&ConfigKey::BOT).unwrap();
        assert!(JsonFileStore::open(&path)
            .unwrap()
            .get(&ConfigKey::BOT)
            .is_none());
    }

    #[test]
    fn test_file_store_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = JsonFileStore::open(&path);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    // Helper function to check if a string is in camelCase format
    fn is_camel_case(s: &str) -> bool {
        let mut chars = s.chars();

        match chars.next() {
            Some(first) if first.is_ascii_lowercase() => {}
            _ => return false,
        }

        chars.all(|c| c.is_alphanumeric())
    }

    // Helper function to verify camelCase format dynamically
    fn verify_camel_case<T>(store: &MockConfigStore, key: &ConfigKey<T>) {
        assert!(
            is_camel_case(key.key_name()),
            "Config key '{}' should be camelCase",
            key.key_name()
        );

        let stored_json = store.data.borrow().get(key.key_name()).cloned();
        if let Some(obj) = stored_json.as_ref().and_then(|v| v.as_object()) {
            for field_key in obj.keys() {
                assert!(
                    is_camel_case(field_key),
                    "Field '{}' in {} should be camelCase",
                    field_key,
                    key.key_name()
                );
            }
        }
    }

    // Helper function to test the full lifecycle of a config
    fn test_config_lifecycle<T>(
        store: &MockConfigStore,
        key: &ConfigKey<T>,
        test_config: T,
        description: &str,
    ) where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug + Clone,
    {
        let result: Option<T> = store.get(key);
        assert!(
            result.is_none(),
            "{}: Get should return None before set",
            description
        );

        store
            .set(key, test_config.clone())
            .unwrap_or_else(|e| panic!("{}: Set should succeed: {}", description, e));

        let retrieved: Option<T> = store.get(key);
        assert_eq!(
            retrieved,
            Some(test_config),
            "{}: Retrieved config should match",
            description
        );

        verify_camel_case(store, key);

        store
            .delete(key)
            .unwrap_or_else(|e| panic!("{}: Delete should succeed: {}", description, e));

        let result: Option<T> = store.get(key);
        assert!(
            result.is_none(),
            "{}: Get should return None after delete",
            description
        );
    }
}
