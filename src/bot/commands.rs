//! Parsing of incoming bot messages.

use crate::recommend::TrackSummary;

pub const WELCOME_MESSAGE: &str = "Hi! Send /search <track> to look up a track, \
/recommend <track> for similar tracks, or just chat with me.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Search(String),
    Recommend(String),
    /// A command that needs an argument arrived without one.
    MissingArgument(&'static str),
    Chat(String),
}

impl BotCommand {
    /// Commands may be addressed to a specific bot (`/search@my_bot yellow`).
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let Some(rest) = text.strip_prefix('/') else {
            return BotCommand::Chat(text.to_string());
        };

        let (head, argument) = match rest.split_once(char::is_whitespace) {
            Some((head, argument)) => (head, argument.trim()),
            None => (rest, ""),
        };
        let command = head.split('@').next().unwrap_or(head).to_lowercase();

        match command.as_str() {
            "start" => BotCommand::Start,
            "search" if argument.is_empty() => BotCommand::MissingArgument("search"),
            "search" => BotCommand::Search(argument.to_string()),
            "recommend" if argument.is_empty() => BotCommand::MissingArgument("recommend"),
            "recommend" => BotCommand::Recommend(argument.to_string()),
            _ => BotCommand::Chat(text.to_string()),
        }
    }
}

pub fn usage(command: &str) -> String {
    format!("Usage: /{} <track name>", command)
}

/// One line per track: `<name> - <artist> (<album>)`.
pub fn format_track_list(tracks: &[TrackSummary]) -> String {
    tracks
        .iter()
        .map(|t| format!("{} - {} ({})", t.track_name, t.artist, t.album))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(BotCommand::parse("/start"), BotCommand::Start);
        assert_eq!(
            BotCommand::parse("/search Bohemian Rhapsody"),
            BotCommand::Search("Bohemian Rhapsody".to_string())
        );
        assert_eq!(
            BotCommand::parse("  /recommend   Yellow  "),
            BotCommand::Recommend("Yellow".to_string())
        );
    }

    #[test]
    fn parses_addressed_commands() {
        assert_eq!(
            BotCommand::parse("/search@spotify_chat_bot Clocks"),
            BotCommand::Search("Clocks".to_string())
        );
        assert_eq!(BotCommand::parse("/START@spotify_chat_bot"), BotCommand::Start);
    }

    #[test]
    fn missing_argument() {
        assert_eq!(
            BotCommand::parse("/search"),
            BotCommand::MissingArgument("search")
        );
        assert_eq!(
            BotCommand::parse("/recommend   "),
            BotCommand::MissingArgument("recommend")
        );
        assert_eq!(usage("search"), "Usage: /search <track name>");
    }

    #[test]
    fn everything_else_is_chat() {
        assert_eq!(
            BotCommand::parse("hola, ¿qué tal?"),
            BotCommand::Chat("hola, ¿qué tal?".to_string())
        );
        assert_eq!(
            BotCommand::parse("/help"),
            BotCommand::Chat("/help".to_string())
        );
    }

    #[test]
    fn formats_track_lines() {
        let tracks = vec![
            TrackSummary {
                track_id: "1".to_string(),
                track_name: "Yellow".to_string(),
                album: "Parachutes".to_string(),
                artist: "Coldplay".to_string(),
            },
            TrackSummary {
                track_id: "2".to_string(),
                track_name: "Under Pressure".to_string(),
                album: "Hot Space".to_string(),
                artist: "Queen, David Bowie".to_string(),
            },
        ];
        assert_eq!(
            format_track_list(&tracks),
            "Yellow - Coldplay (Parachutes)\nUnder Pressure - Queen, David Bowie (Hot Space)"
        );
    }
}
