use strum::IntoEnumIterator;
use translate_bot_model_cache::LanguagePair;

/// Commands the bot answers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, strum::EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CommandName {
    Translate,
    Languages,
    Stats,
    Help,
}

impl CommandName {
    /// Comma separated list of every command, for hints
    pub fn all() -> String {
        Self::iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A parsed chat command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Translate { pair: LanguagePair, text: String },
    Languages,
    Stats,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// Message doesn't carry the command prefix; not meant for the bot
    #[error("not a command")]
    NotACommand,
    #[error("translate needs a source language, a target language and text")]
    TranslateUsage,
    #[error("unknown command: {0}")]
    Unknown(String),
}

/// Parse a chat message into a command.
///
/// The command word is matched case-insensitively after `prefix`.
/// Arguments are whitespace separated; translation text is re-joined with
/// single spaces.
pub fn parse_command(message: &str, prefix: &str) -> Result<Command, CommandError> {
    let body = message
        .trim()
        .strip_prefix(prefix)
        .ok_or(CommandError::NotACommand)?;

    let mut words = body.split_whitespace();
    let word = words.next().ok_or(CommandError::NotACommand)?;
    let name: CommandName = word
        .parse()
        .map_err(|_| CommandError::Unknown(word.to_string()))?;

    let command = match name {
        CommandName::Translate => {
            let args: Vec<&str> = words.collect();
            if args.len() < 3 {
                return Err(CommandError::TranslateUsage);
            }
            Command::Translate {
                pair: LanguagePair::new(args[0], args[1]),
                text: args[2..].join(" "),
            }
        }
        CommandName::Languages => Command::Languages,
        CommandName::Stats => Command::Stats,
        CommandName::Help => Command::Help,
    };

    Ok(command)
}
