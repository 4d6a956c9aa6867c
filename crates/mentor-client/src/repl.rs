//! Line commands and transcript rendering for the terminal front end.

use mentor_types::{EntryKind, Speaker, TranscriptEntry};
use std::path::PathBuf;

/// A conversation starter offered on an empty chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestedQuestion {
    pub title: &'static str,
    pub description: &'static str,
}

pub const SUGGESTED_QUESTIONS: [SuggestedQuestion; 4] = [
    SuggestedQuestion {
        title: "Best spots on Dust2",
        description: "Learn about the most advantageous positions on Dust2 map",
    },
    SuggestedQuestion {
        title: "Weapon spray patterns",
        description: "Master the recoil control of different weapons",
    },
    SuggestedQuestion {
        title: "Smoke lineups",
        description: "Essential smoke grenade lineups for competitive play",
    },
    SuggestedQuestion {
        title: "Quick tips",
        description: "Fast tips to improve your gameplay immediately",
    },
];

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Say(String),
    Voice(PathBuf),
    Play(usize),
    Suggest,
    /// Sends suggested question `n` (1-based).
    Ask(usize),
    Status,
    Quit,
    Empty,
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Say(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match name {
            "voice" if !arg.is_empty() => Command::Voice(PathBuf::from(arg)),
            "voice" => Command::Invalid("usage: /voice <path>".to_string()),
            "play" => match arg.parse() {
                Ok(index) => Command::Play(index),
                Err(_) => Command::Invalid("usage: /play <entry number>".to_string()),
            },
            "ask" => match arg.parse::<usize>() {
                Ok(n) if (1..=SUGGESTED_QUESTIONS.len()).contains(&n) => Command::Ask(n),
                _ => Command::Invalid(format!(
                    "usage: /ask <1-{}>",
                    SUGGESTED_QUESTIONS.len()
                )),
            },
            "suggest" => Command::Suggest,
            "status" => Command::Status,
            "quit" | "exit" => Command::Quit,
            other => Command::Invalid(format!("unknown command: /{}", other)),
        }
    }
}

/// Title of suggested question `n` (1-based).
pub fn suggested(n: usize) -> Option<&'static str> {
    n.checked_sub(1)
        .and_then(|i| SUGGESTED_QUESTIONS.get(i))
        .map(|q| q.title)
}

pub fn render_suggestions() -> String {
    SUGGESTED_QUESTIONS
        .iter()
        .enumerate()
        .map(|(i, q)| format!("  {}. {} - {}", i + 1, q.title, q.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Formats one transcript entry as a single line.
pub fn render_entry(index: usize, entry: &TranscriptEntry) -> String {
    let who = match entry.speaker {
        Speaker::User => "you",
        Speaker::Assistant => "mentor",
    };
    let marker = match (entry.kind, entry.has_audio()) {
        (EntryKind::Voice, true) => " [voice, /play]",
        (EntryKind::Voice, false) => " [voice]",
        (EntryKind::Text, _) => "",
    };
    format!(
        "[{}] {} {}{}: {}",
        index,
        entry.received_at.format("%H:%M:%S"),
        who,
        marker,
        entry.text
    )
}
