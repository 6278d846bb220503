use std::fmt;
use std::str::FromStr;

/// Ordered (source, target) language pair, e.g. `en` → `es`.
///
/// Codes are trimmed and lowercased on construction, so `EN-es` and `en-es`
/// name the same pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguagePair {
    from_code: String,
    to_code: String,
}

impl LanguagePair {
    pub fn new(from_code: impl AsRef<str>, to_code: impl AsRef<str>) -> Self {
        Self {
            from_code: normalize(from_code.as_ref()),
            to_code: normalize(to_code.as_ref()),
        }
    }

    /// Source language code
    pub fn from_code(&self) -> &str {
        &self.from_code
    }

    /// Target language code
    pub fn to_code(&self) -> &str {
        &self.to_code
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_lowercase()
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from_code, self.to_code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid language pair format: {input}. Use format like 'en-es'")]
pub struct ParsePairError {
    pub input: String,
}

impl FromStr for LanguagePair {
    type Err = ParsePairError;

    /// Parse the `src-dst` form used on the command line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParsePairError {
            input: s.to_string(),
        };

        let (from, to) = s.split_once('-').ok_or_else(invalid)?;
        if from.trim().is_empty() || to.trim().is_empty() || to.contains('-') {
            return Err(invalid());
        }

        Ok(Self::new(from, to))
    }
}
