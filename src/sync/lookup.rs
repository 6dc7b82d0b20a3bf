use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::board::Card;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub placeholder: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderEntry {
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyncLink {
    pub source: String,
    pub placeholder: String,
}

/// Persisted source <-> placeholder links.
///
/// The two halves are always inverses of each other: links are only ever
/// inserted or removed as a pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncLookup {
    #[serde(default)]
    source: BTreeMap<String, SourceEntry>,
    #[serde(default)]
    placeholder: BTreeMap<String, PlaceholderEntry>,
}

impl SyncLookup {
    pub fn insert(&mut self, source_id: &str, placeholder_id: &str) {
        self.remove(source_id);
        self.remove(placeholder_id);
        self.source.insert(
            source_id.to_string(),
            SourceEntry {
                placeholder: placeholder_id.to_string(),
            },
        );
        self.placeholder.insert(
            placeholder_id.to_string(),
            PlaceholderEntry {
                source: source_id.to_string(),
            },
        );
    }

    /// Drop the link `card_id` takes part in, from either side.
    pub fn remove(&mut self, card_id: &str) -> Option<SyncLink> {
        if let Some(entry) = self.source.remove(card_id) {
            self.placeholder.remove(&entry.placeholder);
            return Some(SyncLink {
                source: card_id.to_string(),
                placeholder: entry.placeholder,
            });
        }
        if let Some(entry) = self.placeholder.remove(card_id) {
            self.source.remove(&entry.source);
            return Some(SyncLink {
                source: entry.source,
                placeholder: card_id.to_string(),
            });
        }
        None
    }

    pub fn placeholder_of(&self, source_id: &str) -> Option<&str> {
        self.source.get(source_id).map(|e| e.placeholder.as_str())
    }

    pub fn source_of(&self, placeholder_id: &str) -> Option<&str> {
        self.placeholder.get(placeholder_id).map(|e| e.source.as_str())
    }

    pub fn links(&self) -> Vec<SyncLink> {
        self.source
            .iter()
            .map(|(source, entry)| SyncLink {
                source: source.clone(),
                placeholder: entry.placeholder.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Cards not yet linked as a source, in their original order.
    pub fn find_new_cards<'a>(&self, cards: &'a [Card]) -> Vec<&'a Card> {
        cards
            .iter()
            .filter(|c| !self.source.contains_key(&c.id))
            .collect()
    }

    /// Checks the two halves mirror each other.
    pub fn is_consistent(&self) -> bool {
        self.source.len() == self.placeholder.len()
            && self
                .source
                .iter()
                .all(|(s, e)| self.source_of(&e.placeholder) == Some(s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::tests::make_card;

    #[test]
    fn insert_writes_both_directions() {
        let mut lookup = SyncLookup::default();
        lookup.insert("s1", "p1");
        assert_eq!(lookup.placeholder_of("s1"), Some("p1"));
        assert_eq!(lookup.source_of("p1"), Some("s1"));
        assert!(lookup.is_consistent());
    }

    #[test]
    fn relinking_a_source_drops_the_old_placeholder() {
        let mut lookup = SyncLookup::default();
        lookup.insert("s1", "p1");
        lookup.insert("s1", "p2");
        assert_eq!(lookup.placeholder_of("s1"), Some("p2"));
        assert_eq!(lookup.source_of("p1"), None);
        assert_eq!(lookup.len(), 1);
        assert!(lookup.is_consistent());
    }

    #[test]
    fn remove_works_from_either_side() {
        let mut lookup = SyncLookup::default();
        lookup.insert("s1", "p1");
        lookup.insert("s2", "p2");

        let removed = lookup.remove("p1").unwrap();
        assert_eq!(removed.source, "s1");
        assert_eq!(lookup.placeholder_of("s1"), None);

        let removed = lookup.remove("s2").unwrap();
        assert_eq!(removed.placeholder, "p2");
        assert_eq!(lookup.source_of("p2"), None);

        assert!(lookup.is_empty());
        assert!(lookup.is_consistent());
        assert!(lookup.remove("s1").is_none());
    }

    #[test]
    fn find_new_cards_keeps_order_and_skips_linked() {
        let mut lookup = SyncLookup::default();
        lookup.insert("c2", "p2");
        let cards = vec![
            make_card("c3", "three", "l", "b"),
            make_card("c2", "two", "l", "b"),
            make_card("c1", "one", "l", "b"),
        ];
        let ids: Vec<&str> = lookup
            .find_new_cards(&cards)
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, ["c3", "c1"]);
    }

    #[test]
    fn persisted_shape_matches_file_format() {
        let mut lookup = SyncLookup::default();
        lookup.insert("s1", "p1");
        let json = serde_json::to_value(&lookup).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "source": {"s1": {"placeholder": "p1"}},
                "placeholder": {"p1": {"source": "s1"}}
            })
        );
        let parsed: SyncLookup = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, lookup);
    }
}
