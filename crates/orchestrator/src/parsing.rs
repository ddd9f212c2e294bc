//! Parsers for the script service's free-form responses.
//!
//! Responses come back from a language model and are never trusted. Each
//! parser tries the structured reading first and falls back to a line-based
//! one, so a malformed payload degrades into fewer or cruder values instead
//! of an error.

use std::sync::LazyLock;

use regex::Regex;
use reel_core::VideoMetadata;

static FENCE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```(?:json)?\s*").expect("Invalid fence regex"));
static FENCE_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*```$").expect("Invalid fence regex"));
static LIST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[.)]\s*").expect("Invalid list number regex"));

const BULLET_CHARS: &[char] = &['-', '•', '*', '"'];

/// Extracts up to `max` scene descriptions.
///
/// A JSON array (optionally wrapped in a markdown code fence) is read
/// element by element. Anything else is treated as one scene per non-empty
/// line, with bullets, quotes and list numbering stripped.
pub fn parse_scenes(raw: &str, max: usize) -> Vec<String> {
    let trimmed = raw.trim();
    let unfenced = FENCE_OPEN.replace(trimmed, "");
    let unfenced = FENCE_CLOSE.replace(&unfenced, "");

    if let Ok(serde_json::Value::Array(items)) = serde_json::from_str(&unfenced) {
        return items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::String(s) => s.trim().to_string(),
                other => other.to_string(),
            })
            .filter(|scene| !scene.is_empty())
            .take(max)
            .collect();
    }

    unfenced
        .lines()
        .map(|line| line.trim_matches(|c: char| c.is_whitespace() || BULLET_CHARS.contains(&c)))
        .map(|line| LIST_NUMBER.replace(line, "").trim().to_string())
        .filter(|line| !line.is_empty() && !line.starts_with("```"))
        .take(max)
        .collect()
}

/// Reads `TITLE:`, `DESCRIPTION:` and `TAGS:` lines (case-insensitive).
/// A missing or blank title falls back to the topic.
pub fn parse_metadata(raw: &str, topic: &str) -> VideoMetadata {
    let mut metadata = VideoMetadata::from_topic(topic);

    for line in raw.lines() {
        let line = line.trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        match key.trim().to_ascii_uppercase().as_str() {
            "TITLE" if !value.is_empty() => metadata.title = value.to_string(),
            "DESCRIPTION" => metadata.description = value.to_string(),
            "TAGS" => {
                metadata.tags = value
                    .split(',')
                    .map(|tag| tag.trim().to_string())
                    .filter(|tag| !tag.is_empty())
                    .collect();
            }
            _ => {}
        }
    }

    metadata
}

/// First `words` words of a scene description, used for the retry search.
pub fn shorten_query(description: &str, words: usize) -> String {
    description
        .split_whitespace()
        .take(words)
        .collect::<Vec<_>>()
        .join(" ")
}
