//! Labeled item types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PyxError;

/// Markers that turn a pattern into a prefix wildcard.
pub const WILDCARD_MARKERS: [&str; 2] = ["...", "…"];

/// Canonical form of item text: trimmed and lowercased, the same folding the
/// encoder applies before hashing.
pub fn normalize_text(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Like [`normalize_text`], but a wildcard prefix keeps its trailing
/// whitespace: `"kill ..."` must not match `"killer"`.
pub(crate) fn canonical_text(text: &str, is_prefix_wildcard: bool) -> String {
    if is_prefix_wildcard {
        text.trim_start().to_lowercase()
    } else {
        normalize_text(text)
    }
}

/// Kind of content an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Word,
    Phrase,
    GameIdea,
}

impl Category {
    pub fn all() -> [Category; 3] {
        [Category::Word, Category::Phrase, Category::GameIdea]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Word => "word",
            Category::Phrase => "phrase",
            Category::GameIdea => "game_idea",
        }
    }

    /// Word for single tokens, phrase for anything containing whitespace.
    pub fn infer(text: &str) -> Self {
        if text.trim().contains(char::is_whitespace) {
            Category::Phrase
        } else {
            Category::Word
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = PyxError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "word" | "words" => Ok(Category::Word),
            "phrase" | "phrases" => Ok(Category::Phrase),
            "game_idea" | "game_ideas" | "game idea" | "game ideas" | "game-idea" => {
                Ok(Category::GameIdea)
            }
            _ => Err(PyxError::invalid_category(value)),
        }
    }
}

/// Judgment attached to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Safe,
    Bad,
    Unset,
}

impl Label {
    pub fn from_safe(safe: bool) -> Self {
        if safe {
            Label::Safe
        } else {
            Label::Bad
        }
    }

    /// Training target: 1.0 for inappropriate, 0.0 for safe, none for unset.
    pub fn target(&self) -> Option<f32> {
        match self {
            Label::Safe => Some(0.0),
            Label::Bad => Some(1.0),
            Label::Unset => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Safe => "safe",
            Label::Bad => "bad",
            Label::Unset => "unset",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One known item. For wildcard entries `text` is the bare prefix.
///
/// Identity is `(text, category, is_prefix_wildcard)`: the word `kill` and the
/// rule `kill...` are two items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledItem {
    pub text: String,
    pub category: Category,
    pub label: Label,
    pub is_prefix_wildcard: bool,
}

impl LabeledItem {
    pub fn new(text: impl AsRef<str>, category: Category, label: Label) -> Self {
        Self {
            text: normalize_text(text.as_ref()),
            category,
            label,
            is_prefix_wildcard: false,
        }
    }

    pub fn wildcard(prefix: impl AsRef<str>, category: Category, label: Label) -> Self {
        Self {
            text: canonical_text(prefix.as_ref(), true),
            category,
            label,
            is_prefix_wildcard: true,
        }
    }

    /// Builds an item from a curated pattern such as `"kill..."`.
    ///
    /// A trailing marker from [`WILDCARD_MARKERS`] is stripped and recorded in
    /// `is_prefix_wildcard`. This is the only place markers are interpreted.
    pub fn from_pattern(pattern: &str, category: Category, label: Label) -> Self {
        let trimmed = pattern.trim();
        for marker in WILDCARD_MARKERS {
            if let Some(prefix) = trimmed.strip_suffix(marker) {
                if !prefix.is_empty() {
                    return Self::wildcard(prefix, category, label);
                }
            }
        }
        Self::new(trimmed, category, label)
    }

    /// True if this item applies to `text`, ignoring case.
    pub fn matches(&self, text: &str) -> bool {
        let text = normalize_text(text);
        if self.is_prefix_wildcard {
            text.starts_with(&self.text)
        } else {
            text == self.text
        }
    }

    /// Text as shown to people, with the marker restored for wildcards.
    pub fn display_text(&self) -> String {
        if self.is_prefix_wildcard {
            format!("{}{}", self.text, WILDCARD_MARKERS[0])
        } else {
            self.text.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_singular_and_plural() {
        assert_eq!("word".parse::<Category>().unwrap(), Category::Word);
        assert_eq!("Phrases".parse::<Category>().unwrap(), Category::Phrase);
        assert_eq!("game_ideas".parse::<Category>().unwrap(), Category::GameIdea);
    }

    #[test]
    fn unknown_category_is_an_error() {
        let err = "colours".parse::<Category>().unwrap_err();
        assert!(matches!(err, PyxError::InvalidCategory { value } if value == "colours"));
    }

    #[test]
    fn category_inference_uses_whitespace() {
        assert_eq!(Category::infer("rocket"), Category::Word);
        assert_eq!(Category::infer("space rocket"), Category::Phrase);
        assert_eq!(Category::infer(" rocket "), Category::Word);
    }

    #[test]
    fn pattern_with_marker_becomes_wildcard() {
        let item = LabeledItem::from_pattern("bad word...", Category::Phrase, Label::Bad);
        assert!(item.is_prefix_wildcard);
        assert_eq!(item.text, "bad word");
        assert_eq!(item.display_text(), "bad word...");

        let unicode = LabeledItem::from_pattern("hate…", Category::Word, Label::Bad);
        assert!(unicode.is_prefix_wildcard);
        assert_eq!(unicode.text, "hate");
    }

    #[test]
    fn bare_marker_is_literal_text() {
        let item = LabeledItem::from_pattern("...", Category::Word, Label::Safe);
        assert!(!item.is_prefix_wildcard);
        assert_eq!(item.text, "...");
    }

    #[test]
    fn matching_respects_wildcard_flag() {
        let exact = LabeledItem::new("wait", Category::Word, Label::Safe);
        assert!(exact.matches("wait"));
        assert!(!exact.matches("waiting"));

        let prefix = LabeledItem::wildcard("wait", Category::Word, Label::Safe);
        assert!(prefix.matches("waiting"));
        assert!(!prefix.matches("wai"));
    }

    #[test]
    fn text_is_folded_on_construction() {
        let item = LabeledItem::from_pattern("  Kill... ", Category::Word, Label::Bad);
        assert_eq!(item.text, "kill");
        assert!(item.matches("KILLER"));
        assert_eq!(LabeledItem::new("Rocket", Category::Word, Label::Safe).text, "rocket");
    }

    #[test]
    fn wildcard_prefix_keeps_trailing_space() {
        let item = LabeledItem::from_pattern("kill ...", Category::Phrase, Label::Bad);
        assert_eq!(item.text, "kill ");
        assert!(item.matches("kill them"));
        assert!(!item.matches("killer"));
    }

    #[test]
    fn label_targets() {
        assert_eq!(Label::from_safe(true).target(), Some(0.0));
        assert_eq!(Label::from_safe(false).target(), Some(1.0));
        assert_eq!(Label::Unset.target(), None);
    }
}
