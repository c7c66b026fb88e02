//! Entity-to-group mappings.

use polars::prelude::*;
use ronda_frame::{Result, keys::entity_keys};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Maps entity keys to group labels, e.g. stock code to industry.
///
/// The grouper is owned by the caller and only read during an aggregation.
/// Entities without a label take no part in grouped computations.
///
/// # Examples
///
/// ```
/// use ronda_calc::Grouper;
///
/// let grouper: Grouper = [("AAPL", "tech"), ("MSFT", "tech"), ("XOM", "energy")]
///     .into_iter()
///     .collect();
///
/// assert_eq!(grouper.get("XOM"), Some("energy"));
/// assert_eq!(grouper.groups(), vec!["energy", "tech"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grouper {
    labels: BTreeMap<String, String>,
}

impl Grouper {
    /// Creates an empty grouper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `entity` to `label`, returning the previous label if any.
    pub fn insert(&mut self, entity: impl Into<String>, label: impl Into<String>) -> Option<String> {
        self.labels.insert(entity.into(), label.into())
    }

    /// The label of `entity`.
    pub fn get(&self, entity: &str) -> Option<&str> {
        self.labels.get(entity).map(String::as_str)
    }

    /// Number of labelled entities.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether no entity is labelled.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Distinct group labels in sorted order.
    pub fn groups(&self) -> Vec<&str> {
        self.labels
            .values()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Labels of each row of an entity column; `None` for unlabelled rows.
    pub fn label_rows(&self, entity: &Column) -> Result<Vec<Option<&str>>> {
        Ok(entity_keys(entity)?
            .iter()
            .map(|key| self.get(key))
            .collect())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Grouper {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            labels: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<HashMap<String, String>> for Grouper {
    fn from(labels: HashMap<String, String>) -> Self {
        labels.into_iter().collect()
    }
}

impl From<BTreeMap<String, String>> for Grouper {
    fn from(labels: BTreeMap<String, String>) -> Self {
        Self { labels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouper_lookup() {
        let mut grouper = Grouper::new();
        assert!(grouper.is_empty());
        assert_eq!(grouper.insert("a", "g1"), None);
        assert_eq!(grouper.insert("a", "g2"), Some("g1".to_string()));
        assert_eq!(grouper.get("a"), Some("g2"));
        assert_eq!(grouper.get("b"), None);
        assert_eq!(grouper.len(), 1);
    }

    #[test]
    fn test_groups_sorted_and_distinct() {
        let grouper: Grouper = [("c", "z"), ("a", "y"), ("b", "z")].into_iter().collect();
        assert_eq!(grouper.groups(), vec!["y", "z"]);
    }

    #[test]
    fn test_label_rows() {
        let grouper: Grouper = [("1", "odd"), ("2", "even")].into_iter().collect();
        let entity = Column::new("code".into(), [1i64, 2, 3]);
        let labels = grouper.label_rows(&entity).unwrap();
        assert_eq!(labels, vec![Some("odd"), Some("even"), None]);
    }

    #[test]
    fn test_from_hash_map() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), "g".to_string());
        assert_eq!(Grouper::from(map).get("a"), Some("g"));
    }
}
