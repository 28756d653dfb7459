//! Label Store: every known word, phrase and game idea with its judgment.

pub mod item;
pub mod store;

pub use item::{normalize_text, Category, Label, LabeledItem, WILDCARD_MARKERS};
pub use store::LabelStore;
