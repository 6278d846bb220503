//! Reply texts sent back to chat users.

use translate_bot_model_cache::{CacheError, LanguagePair, ModelRecord};

use super::commands::CommandName;
use super::stats::{format_uptime, StatsSnapshot};

/// How many installed pairs the stats reply lists by name
const LISTED_PACKAGES: usize = 5;

pub fn help(bot_name: &str) -> String {
    format!(
        "**{bot_name} Help**

**Available Commands:**

**translate** `<source_lang> <target_lang> <text>`
   Translate text between languages
   • Example: `translate en es Hello world`
   • Example: `translate fr en Bonjour le monde`
   • Note: Language codes are 2-letter (en, es, fr, de, it, pt, etc.)

**languages**
   Show all available language codes for translation

**stats**
   Show uptime, translations completed, average response time and model status

**help**
   Show this help message

**Language Code Examples:**
• en = English    • es = Spanish    • fr = French
• de = German     • it = Italian    • pt = Portuguese
• ru = Russian    • zh = Chinese    • ja = Japanese
• ar = Arabic     • hi = Hindi      • ko = Korean

**Tips:**
• All commands work offline once models are downloaded
• First translation of a language pair downloads the model automatically
• Start the bot with `--download <pairs>` or `--download-all` to pre-load models"
    )
}

pub fn languages(codes: &[String]) -> String {
    format!("Available languages:\n{}", codes.join("\n"))
}

pub fn translation(pair: &LanguagePair, text: &str) -> String {
    format!(
        "Translation ({} → {}):\n{}",
        pair.from_code(),
        pair.to_code(),
        text
    )
}

pub fn translate_usage() -> String {
    "Please provide source language, target language, and text to translate.\n\
     Example: translate en es Hello world"
        .to_string()
}

pub fn unknown_command(word: &str) -> String {
    format!(
        "Unknown command '{}'. Available commands: {}. Send 'help' for details.",
        word,
        CommandName::all()
    )
}

/// Reply for a model that could not be made available
pub fn cache_error(error: &CacheError) -> String {
    match error {
        CacheError::UnsupportedLanguagePair(pair) => format!(
            "Sorry, translation from {} to {} is not available.",
            pair.from_code(),
            pair.to_code()
        ),
        CacheError::TimedOut { pair, .. } => format!(
            "The {} → {} model is still downloading. Please try again in a few minutes.",
            pair.from_code(),
            pair.to_code()
        ),
        other => translation_error(other),
    }
}

pub fn translation_error(error: &dyn std::fmt::Display) -> String {
    format!("Error during translation: {}", error)
}

pub fn stats(snapshot: &StatsSnapshot, installed: &[ModelRecord], available: usize) -> String {
    let downloaded = installed.len();
    let coverage = if available == 0 {
        0.0
    } else {
        downloaded as f64 / available as f64 * 100.0
    };

    let mut text = format!(
        "**Bot Statistics**

**Uptime:** {}
**Translations Completed:** {}
**Average Translation Time:** {:.2} seconds
**Total Translation Time:** {:.2} seconds

**Translation Models:**
• Downloaded: {} packages
• Available: {} packages
• Coverage: {}/{} ({:.1}%)",
        format_uptime(snapshot.uptime),
        snapshot.translations_completed,
        snapshot.average_translation_time.as_secs_f64(),
        snapshot.total_translation_time.as_secs_f64(),
        downloaded,
        available,
        downloaded,
        available,
        coverage
    );

    if !installed.is_empty() {
        let mut lines: Vec<String> = installed
            .iter()
            .take(LISTED_PACKAGES)
            .map(|record| {
                format!(
                    "• {} → {}",
                    record.pair.from_code(),
                    record.pair.to_code()
                )
            })
            .collect();
        if downloaded > LISTED_PACKAGES {
            lines.push(format!("• ... and {} more", downloaded - LISTED_PACKAGES));
        }

        text.push_str("\n\n**Installed Packages:**\n");
        text.push_str(&lines.join("\n"));
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;
    use translate_bot_model_cache::ModelStatus;

    fn installed(pairs: &[(&str, &str)]) -> Vec<ModelRecord> {
        pairs
            .iter()
            .map(|(from, to)| ModelRecord {
                pair: LanguagePair::new(from, to),
                status: ModelStatus::Installed,
                location: Some(PathBuf::from(format!("/models/{from}_{to}"))),
                last_used: None,
                last_error: None,
            })
            .collect()
    }

    fn snapshot() -> StatsSnapshot {
        StatsSnapshot {
            uptime: Duration::from_secs(3_661),
            translations_completed: 3,
            total_translation_time: Duration::from_millis(4_500),
            average_translation_time: Duration::from_millis(1_500),
        }
    }

    #[test]
    fn test_translation_reply() {
        assert_eq!(
            translation(&LanguagePair::new("en", "es"), "Hola mundo"),
            "Translation (en → es):\nHola mundo"
        );
    }

    #[test]
    fn test_unsupported_pair_reply() {
        let error = CacheError::UnsupportedLanguagePair(LanguagePair::new("xx", "yy"));
        assert_eq!(
            cache_error(&error),
            "Sorry, translation from xx to yy is not available."
        );
    }

    #[test]
    fn test_download_failure_reply() {
        let error = CacheError::DownloadFailed {
            pair: LanguagePair::new("en", "es"),
            reason: "connection reset".to_string(),
        };
        let reply = cache_error(&error);

        assert!(reply.starts_with("Error during translation: "), "{reply}");
        assert!(reply.contains("connection reset"));
    }

    #[test]
    fn test_languages_reply() {
        let codes = vec!["de".to_string(), "en".to_string(), "es".to_string()];
        assert_eq!(languages(&codes), "Available languages:\nde\nen\nes");
    }

    #[test]
    fn test_stats_reply() {
        let reply = stats(&snapshot(), &installed(&[("en", "es"), ("es", "en")]), 8);

        assert!(reply.contains("**Uptime:** 1h 1m 1s"));
        assert!(reply.contains("**Translations Completed:** 3"));
        assert!(reply.contains("**Average Translation Time:** 1.50 seconds"));
        assert!(reply.contains("**Total Translation Time:** 4.50 seconds"));
        assert!(reply.contains("• Coverage: 2/8 (25.0%)"));
        assert!(reply.ends_with("**Installed Packages:**\n• en → es\n• es → en"));
    }

    #[test]
    fn test_stats_lists_at_most_five_packages() {
        let records = installed(&[
            ("a", "b"),
            ("b", "c"),
            ("c", "d"),
            ("d", "e"),
            ("e", "f"),
            ("f", "g"),
            ("g", "h"),
        ]);

        let reply = stats(&snapshot(), &records, 10);

        assert!(reply.contains("• e → f\n• ... and 2 more"));
        assert!(!reply.contains("f → g"));
    }

    #[test]
    fn test_stats_with_empty_catalog() {
        let reply = stats(&snapshot(), &[], 0);

        assert!(reply.contains("• Coverage: 0/0 (0.0%)"));
        assert!(!reply.contains("Installed Packages"));
    }

    #[test]
    fn test_unknown_command_lists_commands() {
        let reply = unknown_command("dance");
        assert!(reply.contains("'dance'"));
        assert!(reply.contains("translate, languages, stats, help"));
    }
}
