//! Training Grounds: the curated examples replayed at every start.
//!
//! The list is a training script, not a lookup table. Entries are applied in
//! order with one online step each, so a later entry can reinforce or
//! partially undo an earlier one.

use serde::{Deserialize, Serialize};

use crate::labels::{Category, Label, LabeledItem};

/// One curated example. `pattern` may end in a wildcard marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundsEntry {
    pub pattern: String,
    pub label: Label,
    pub category: Option<Category>,
}

impl GroundsEntry {
    pub fn new(pattern: impl Into<String>, label: Label, category: Option<Category>) -> Self {
        Self {
            pattern: pattern.into(),
            label,
            category,
        }
    }

    /// Resolves the pattern into the item it stores.
    pub fn to_item(&self) -> LabeledItem {
        let probe = LabeledItem::from_pattern(&self.pattern, Category::Word, self.label);
        let category = self.category.unwrap_or_else(|| Category::infer(&probe.text));
        LabeledItem { category, ..probe }
    }
}

/// Ordered curated list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingGrounds {
    entries: Vec<GroundsEntry>,
}

/// Summary of one bootstrap pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BootstrapReport {
    pub entries: usize,
    pub mean_loss: f32,
}

impl TrainingGrounds {
    pub fn new(entries: Vec<GroundsEntry>) -> Self {
        Self { entries }
    }

    /// Builds a list from `(pattern, label, category)` triples.
    pub fn from_triples<'a>(
        triples: impl IntoIterator<Item = (&'a str, Label, Option<Category>)>,
    ) -> Self {
        Self::new(
            triples
                .into_iter()
                .map(|(pattern, label, category)| GroundsEntry::new(pattern, label, category))
                .collect(),
        )
    }

    pub fn entries(&self) -> &[GroundsEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The built-in kid-safety list.
    pub fn builtin() -> Self {
        use Category::{GameIdea, Phrase, Word};
        use Label::{Bad, Safe};

        Self::from_triples([
            // Everyday safe vocabulary
            ("puppy", Safe, None),
            ("kitten", Safe, None),
            ("rainbow", Safe, None),
            ("rocket", Safe, None),
            ("dragon", Safe, None),
            ("castle", Safe, None),
            ("friend", Safe, None),
            ("awesome", Safe, None),
            ("pizza", Safe, None),
            ("robot", Safe, None),
            ("treasure", Safe, None),
            ("unicorn", Safe, None),
            ("dinosaur", Safe, None),
            ("cool", Safe, None),
            // Name-calling and unkind words
            ("stupid", Bad, None),
            ("idiot", Bad, None),
            ("dumb", Bad, None),
            ("loser", Bad, None),
            ("ugly", Bad, None),
            ("shut up", Bad, None),
            ("i hate you", Bad, None),
            ("nobody likes you", Bad, None),
            // Kind phrases
            ("good job", Safe, None),
            ("nice try", Safe, None),
            ("great game", Safe, None),
            ("well played", Safe, None),
            ("thank you", Safe, None),
            ("let's play together", Safe, None),
            ("you are awesome", Safe, None),
            // Violence and adult topics, matched by prefix
            ("kill...", Bad, Some(Word)),
            ("hate...", Bad, Some(Word)),
            ("blood...", Bad, Some(Word)),
            ("i will hurt...", Bad, Some(Phrase)),
            ("drugs", Bad, None),
            ("beer", Bad, None),
            ("gun...", Bad, Some(Word)),
            // Fantasy fighting is fine in games
            ("kill the dragon...", Safe, Some(GameIdea)),
            // Game ideas
            ("build a treehouse", Safe, Some(GameIdea)),
            ("space race to the moon", Safe, Some(GameIdea)),
            ("treasure hunt in the jungle", Safe, Some(GameIdea)),
            ("robot dance battle", Safe, Some(GameIdea)),
            ("bake a giant cake", Safe, Some(GameIdea)),
            ("rob a bank...", Bad, Some(GameIdea)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_without_category_is_inferred() {
        let word = GroundsEntry::new("puppy", Label::Safe, None).to_item();
        assert_eq!(word.category, Category::Word);

        let phrase = GroundsEntry::new("shut up", Label::Bad, None).to_item();
        assert_eq!(phrase.category, Category::Phrase);
    }

    #[test]
    fn wildcard_entry_infers_category_from_prefix() {
        let item = GroundsEntry::new("i will hurt...", Label::Bad, None).to_item();
        assert!(item.is_prefix_wildcard);
        assert_eq!(item.text, "i will hurt");
        assert_eq!(item.category, Category::Phrase);
    }

    #[test]
    fn explicit_category_wins() {
        let item = GroundsEntry::new("kill the dragon...", Label::Safe, Some(Category::GameIdea))
            .to_item();
        assert_eq!(item.category, Category::GameIdea);
        assert!(item.is_prefix_wildcard);
    }

    #[test]
    fn builtin_list_covers_both_labels_and_wildcards() {
        let grounds = TrainingGrounds::builtin();
        assert!(!grounds.is_empty());
        let items: Vec<_> = grounds.entries().iter().map(GroundsEntry::to_item).collect();
        assert!(items.iter().any(|i| i.label == Label::Safe));
        assert!(items.iter().any(|i| i.label == Label::Bad));
        assert!(items.iter().any(|i| i.is_prefix_wildcard));
        assert!(items.iter().any(|i| i.category == Category::GameIdea));
    }
}
