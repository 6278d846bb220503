use serde::Deserialize;
use translate_bot_model_cache::LanguagePair;

/// One package in the Argos package index.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct IndexEntry {
    /// Only `translate` packages are models we can use
    #[serde(default = "default_package_type")]
    pub package_type: String,
    pub from_code: String,
    pub to_code: String,
    #[serde(default)]
    pub from_name: Option<String>,
    #[serde(default)]
    pub to_name: Option<String>,
    #[serde(default)]
    pub package_version: Option<String>,
    /// Download mirrors, tried in order
    #[serde(default)]
    pub links: Vec<String>,
    /// Hex SHA-256 of the package archive, when the index provides one
    #[serde(default)]
    pub sha256: Option<String>,
}

fn default_package_type() -> String {
    "translate".to_string()
}

impl IndexEntry {
    pub fn pair(&self) -> LanguagePair {
        LanguagePair::new(&self.from_code, &self.to_code)
    }

    pub fn is_translation(&self) -> bool {
        self.package_type == "translate"
    }

    /// File name the archive is stored under while downloading
    pub fn archive_name(&self) -> String {
        let pair = self.pair();
        let version = self
            .package_version
            .as_deref()
            .unwrap_or("0")
            .replace('.', "_");
        format!(
            "translate-{}_{}-{}.argosmodel",
            pair.from_code(),
            pair.to_code(),
            version
        )
    }
}

/// Parse the index document, keeping translation packages with at least one
/// download link.
pub fn parse_index(body: &str) -> Result<Vec<IndexEntry>, serde_json::Error> {
    let entries: Vec<IndexEntry> = serde_json::from_str(body)?;
    Ok(entries
        .into_iter()
        .filter(|e| e.is_translation() && !e.links.is_empty())
        .collect())
}
