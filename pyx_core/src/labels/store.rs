//! Insertion-ordered store of labeled items.
//!
//! Items are keyed by `(category, text, is_prefix_wildcard)`, with text folded
//! to lowercase on the way in. Upserting an existing key rewrites the entry in
//! place, so list order always reflects first insertion. A plain entry and a
//! wildcard rule over the same text are separate items.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::item::{canonical_text, normalize_text, Category, Label, LabeledItem};

type ItemKey = (Category, String, bool);

#[derive(Debug, Clone, Default)]
pub struct LabelStore {
    items: Vec<LabeledItem>,
    index: HashMap<ItemKey, usize>,
}

/// Serialized form: the item list alone, the index is rebuilt on load.
#[derive(Serialize, Deserialize)]
struct LabelStoreSnapshot {
    items: Vec<LabeledItem>,
}

fn item_key(text: &str, category: Category, is_prefix_wildcard: bool) -> ItemKey {
    (
        category,
        canonical_text(text, is_prefix_wildcard),
        is_prefix_wildcard,
    )
}

impl LabelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from a list. Later duplicates overwrite earlier ones.
    pub fn from_items(items: impl IntoIterator<Item = LabeledItem>) -> Self {
        let mut store = Self::new();
        for item in items {
            store.insert(item);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabeledItem> {
        self.items.iter()
    }

    /// Inserts or overwrites the entry for `(text, category, is_prefix_wildcard)`.
    pub fn upsert(
        &mut self,
        text: impl AsRef<str>,
        category: Category,
        label: Label,
        is_prefix_wildcard: bool,
    ) -> &LabeledItem {
        let key = item_key(text.as_ref(), category, is_prefix_wildcard);
        let idx = match self.index.get(&key) {
            Some(&idx) => {
                self.items[idx].label = label;
                idx
            }
            None => {
                let idx = self.items.len();
                self.items.push(LabeledItem {
                    text: key.1.clone(),
                    category,
                    label,
                    is_prefix_wildcard,
                });
                self.index.insert(key, idx);
                idx
            }
        };
        &self.items[idx]
    }

    /// Inserts an item. Returns it as stored.
    pub fn insert(&mut self, item: LabeledItem) -> &LabeledItem {
        self.upsert(item.text, item.category, item.label, item.is_prefix_wildcard)
    }

    /// The plain (non-wildcard) entry stored under `(text, category)`.
    pub fn get(&self, text: &str, category: Category) -> Option<&LabeledItem> {
        self.get_entry(text, category, false)
    }

    /// The entry with exactly this identity, plain or wildcard.
    pub fn get_entry(
        &self,
        text: &str,
        category: Category,
        is_prefix_wildcard: bool,
    ) -> Option<&LabeledItem> {
        self.index
            .get(&item_key(text, category, is_prefix_wildcard))
            .map(|&idx| &self.items[idx])
    }

    /// Resolves `text` to the item that governs it.
    ///
    /// An exact plain entry wins. Otherwise the wildcard whose prefix is the
    /// longest literal prefix of `text` is returned; among equally long
    /// prefixes in different categories the earliest inserted wins.
    pub fn lookup(&self, text: &str, category: Option<Category>) -> Option<&LabeledItem> {
        let text = normalize_text(text);
        let in_scope = |item: &&LabeledItem| category.map_or(true, |c| item.category == c);

        let exact = match category {
            Some(c) => self.get(&text, c),
            None => self
                .items
                .iter()
                .find(|item| !item.is_prefix_wildcard && item.text == text),
        };
        if exact.is_some() {
            return exact;
        }

        self.items
            .iter()
            .filter(in_scope)
            .filter(|item| item.is_prefix_wildcard && text.starts_with(&item.text))
            .fold(None, |best: Option<&LabeledItem>, item| match best {
                Some(current) if current.text.len() >= item.text.len() => Some(current),
                _ => Some(item),
            })
    }

    /// Items in insertion order, optionally restricted to one category.
    pub fn list(&self, category: Option<Category>) -> Vec<&LabeledItem> {
        self.items
            .iter()
            .filter(|item| category.map_or(true, |c| item.category == c))
            .collect()
    }

    /// Items of `category` that are not labeled bad.
    pub fn allowed(&self, category: Category) -> Vec<&LabeledItem> {
        self.items
            .iter()
            .filter(|item| item.category == category && item.label != Label::Bad)
            .collect()
    }

    /// Removes the plain entry for `(text, category)`.
    pub fn remove(&mut self, text: &str, category: Category) -> Option<LabeledItem> {
        self.remove_entry(text, category, false)
    }

    /// Removes the entry with exactly this identity, plain or wildcard.
    pub fn remove_entry(
        &mut self,
        text: &str,
        category: Category,
        is_prefix_wildcard: bool,
    ) -> Option<LabeledItem> {
        let idx = self.index.remove(&item_key(text, category, is_prefix_wildcard))?;
        let removed = self.items.remove(idx);
        for slot in self.index.values_mut() {
            if *slot > idx {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    pub fn into_items(self) -> Vec<LabeledItem> {
        self.items
    }

    pub fn to_items(&self) -> Vec<LabeledItem> {
        self.items.clone()
    }
}

impl PartialEq for LabelStore {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Serialize for LabelStore {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        LabelStoreSnapshot {
            items: self.items.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LabelStore {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let snapshot = LabelStoreSnapshot::deserialize(deserializer)?;
        Ok(Self::from_items(snapshot.items))
    }
}
