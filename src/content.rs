//! Derived post fields: slugs, preview text, read time and the pre-submit
//! checklist.
//!
//! Essay content is either a JSON array of editor blocks or plain text.
//! Everything here tolerates both shapes.

use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Words per minute used for the read-time estimate.
const WORDS_PER_MINUTE: usize = 200;

/// Default excerpt length when the author leaves it blank.
pub const EXCERPT_LENGTH: usize = 160;

static NON_SLUG_CHARS: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());
static WHITESPACE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Lower-case the title and collapse every non-alphanumeric run into `-`.
#[must_use]
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let slug = NON_SLUG_CHARS.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "essay".to_string()
    } else {
        slug.to_string()
    }
}

/// First slug candidate: the last six digits of the millisecond clock.
#[must_use]
pub fn slug_with_clock_suffix(base: &str, now_millis: i64) -> String {
    let digits = now_millis.unsigned_abs().to_string();
    let suffix = &digits[digits.len().saturating_sub(6)..];
    format!("{base}-{suffix}")
}

/// Fallback slug candidate used after a collision.
#[must_use]
pub fn slug_with_random_suffix(base: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{base}-{suffix:06}")
}

/// A single editor block. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub gallery_items: Vec<GalleryItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryItem {
    #[serde(default)]
    pub alt_text: Option<String>,
}

/// Parse block-structured content. Returns `None` for plain text.
#[must_use]
pub fn parse_blocks(content: &str) -> Option<Vec<Block>> {
    let value: Value = serde_json::from_str(content).ok()?;
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .map(|item| serde_json::from_value(item.clone()).unwrap_or_default())
            .collect(),
    )
}

/// All readable text in the content, whitespace-collapsed.
#[must_use]
pub fn plain_text(content: &str) -> String {
    let raw = match parse_blocks(content) {
        Some(blocks) => blocks
            .iter()
            .filter_map(|b| b.text.as_deref())
            .collect::<Vec<_>>()
            .join(" "),
        None => content.to_string(),
    };
    WHITESPACE.replace_all(raw.trim(), " ").into_owned()
}

/// Preview text truncated to `max_chars`, with an ellipsis when cut.
#[must_use]
pub fn preview_text(content: &str, max_chars: usize) -> String {
    let text = plain_text(content);
    if text.chars().count() <= max_chars {
        return text;
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}

/// Estimated reading time in whole minutes, never below one.
#[must_use]
pub fn read_time_minutes(content: &str) -> i64 {
    let words = plain_text(content).split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as i64
}

/// Split a comma-separated list, dropping blanks and duplicates.
#[must_use]
pub fn split_names(raw: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// One row of the pre-submit checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistItem {
    pub label: &'static str,
    pub ok: bool,
}

/// Fields the checklist inspects.
#[derive(Debug, Clone, Copy)]
pub struct ChecklistInput<'a> {
    pub title: &'a str,
    pub meta_title: Option<&'a str>,
    pub meta_desc: Option<&'a str>,
    pub tag_count: usize,
    pub category_count: usize,
    pub content: &'a str,
}

fn filled(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Evaluate the pre-submit checklist. Advisory only: submission is never
/// blocked on it.
#[must_use]
pub fn checklist(input: ChecklistInput<'_>) -> Vec<ChecklistItem> {
    let media_alt_ok = parse_blocks(input.content).map_or(true, |blocks| {
        blocks.iter().all(|block| match block.kind.as_str() {
            "media" | "background" => filled(block.alt_text.as_deref()),
            "gallery" => block
                .gallery_items
                .iter()
                .all(|item| filled(item.alt_text.as_deref())),
            _ => true,
        })
    });

    vec![
        ChecklistItem { label: "Title", ok: !input.title.trim().is_empty() },
        ChecklistItem { label: "Meta title", ok: filled(input.meta_title) },
        ChecklistItem { label: "Meta description", ok: filled(input.meta_desc) },
        ChecklistItem { label: "Tags", ok: input.tag_count > 0 },
        ChecklistItem { label: "Categories", ok: input.category_count > 0 },
        ChecklistItem { label: "Alt text for media", ok: media_alt_ok },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Coastal Light"), "coastal-light");
        assert_eq!(slugify("  Tea & Trains: Darjeeling!  "), "tea-trains-darjeeling");
        assert_eq!(slugify("¿?"), "essay");
    }

    #[test]
    fn test_clock_suffix_uses_last_six_digits() {
        assert_eq!(slug_with_clock_suffix("a", 1_700_000_123_456), "a-123456");
        assert_eq!(slug_with_clock_suffix("a", 42), "a-42");
    }

    #[test]
    fn test_random_suffix_shape() {
        let slug = slug_with_random_suffix("walk");
        let suffix = slug.strip_prefix("walk-").unwrap();
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_plain_text_from_blocks() {
        let content = r#"[{"type":"heading","text":"Coastal  Light"},{"type":"media","altText":"x"},{"type":"paragraph","text":"Mist\nand tides"}]"#;
        assert_eq!(plain_text(content), "Coastal Light Mist and tides");
    }

    #[test]
    fn test_plain_text_passthrough() {
        assert_eq!(plain_text("  just   words "), "just words");
    }

    #[test]
    fn test_preview_truncates() {
        let long = "word ".repeat(100);
        let preview = preview_text(&long, 20);
        assert!(preview.ends_with('…'));
        assert!(preview.chars().count() <= 21);
        assert_eq!(preview_text("short", 20), "short");
    }

    #[test]
    fn test_read_time() {
        assert_eq!(read_time_minutes(""), 1);
        assert_eq!(read_time_minutes(&"w ".repeat(200)), 1);
        assert_eq!(read_time_minutes(&"w ".repeat(201)), 2);
    }

    #[test]
    fn test_split_names() {
        assert_eq!(split_names("Coast, Light, ,Coast"), vec!["Coast", "Light"]);
        assert!(split_names("").is_empty());
    }

    #[test]
    fn test_checklist_flags_missing_alt_text() {
        let content = r#"[{"type":"gallery","galleryItems":[{"altText":"ok"},{"altText":" "}]}]"#;
        let items = checklist(ChecklistInput {
            title: "T",
            meta_title: Some("M"),
            meta_desc: None,
            tag_count: 1,
            category_count: 0,
            content,
        });
        let failing: Vec<_> = items.iter().filter(|i| !i.ok).map(|i| i.label).collect();
        assert_eq!(failing, vec!["Meta description", "Categories", "Alt text for media"]);
    }

    #[test]
    fn test_checklist_plain_text_media_ok() {
        let items = checklist(ChecklistInput {
            title: "T",
            meta_title: Some("M"),
            meta_desc: Some("D"),
            tag_count: 2,
            category_count: 1,
            content: "plain prose",
        });
        assert!(items.iter().all(|i| i.ok));
    }
}
