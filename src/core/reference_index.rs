//! Deduplicated index of collected references.

use std::collections::BTreeMap;

use crate::core::key::{TranslationKey, TranslationReference};

/// Canonical references by key, plus every later duplicate.
///
/// The first reference added for a key is canonical. Later ones for the same
/// key are recorded as duplicates in insertion order and never dropped.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    references: BTreeMap<TranslationKey, TranslationReference>,
    duplicates: BTreeMap<TranslationKey, Vec<TranslationReference>>,
    total: usize,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_references(references: impl IntoIterator<Item = TranslationReference>) -> Self {
        let mut index = Self::new();
        for reference in references {
            index.add(reference);
        }
        index
    }

    pub fn add(&mut self, reference: TranslationReference) {
        self.total += 1;
        if self.references.contains_key(&reference.key) {
            self.duplicates
                .entry(reference.key.clone())
                .or_default()
                .push(reference);
        } else {
            self.references.insert(reference.key.clone(), reference);
        }
    }

    /// Canonical references, ordered by key.
    pub fn references(&self) -> impl Iterator<Item = &TranslationReference> {
        self.references.values()
    }

    pub fn get(&self, key: &TranslationKey) -> Option<&TranslationReference> {
        self.references.get(key)
    }

    pub fn contains(&self, key: &TranslationKey) -> bool {
        self.references.contains_key(key)
    }

    /// Duplicate references by key. Canonical references are not included.
    pub fn duplicates(&self) -> &BTreeMap<TranslationKey, Vec<TranslationReference>> {
        &self.duplicates
    }

    /// Canonical reference followed by its duplicates.
    pub fn all_for(&self, key: &TranslationKey) -> Vec<&TranslationReference> {
        self.references
            .get(key)
            .into_iter()
            .chain(self.duplicates.get(key).into_iter().flatten())
            .collect()
    }

    pub fn unique_count(&self) -> usize {
        self.references.len()
    }

    /// Number of duplicate occurrences, not counting canonical ones.
    pub fn duplicate_count(&self) -> usize {
        self.duplicates.values().map(Vec::len).sum()
    }

    pub fn total_count(&self) -> usize {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    use crate::core::key::ReferenceFormat;
    use crate::core::reference_index::*;

    fn reference(id: &str, file: &str, line: usize) -> TranslationReference {
        TranslationReference::new(
            TranslationKey::new("Vendor.Site", "Main", id),
            ReferenceFormat::Php,
            PathBuf::from(file),
            line,
        )
    }

    #[test]
    fn test_first_occurrence_is_canonical() {
        let index = ReferenceIndex::from_references([
            reference("title", "A.php", 3),
            reference("title", "B.php", 7),
            reference("other", "B.php", 9),
        ]);

        let key = TranslationKey::new("Vendor.Site", "Main", "title");
        assert_eq!(index.get(&key).unwrap().file_path, PathBuf::from("A.php"));
        assert_eq!(index.unique_count(), 2);
        assert_eq!(index.duplicate_count(), 1);
        assert_eq!(index.total_count(), 3);

        let all: Vec<_> = index
            .all_for(&key)
            .iter()
            .map(|r| (r.file_path.to_string_lossy().to_string(), r.line))
            .collect();
        assert_eq!(
            all,
            vec![("A.php".to_string(), 3), ("B.php".to_string(), 7)]
        );
    }

    #[test]
    fn test_counts_add_up() {
        let index = ReferenceIndex::from_references([
            reference("a", "A.php", 1),
            reference("a", "A.php", 2),
            reference("a", "A.php", 3),
            reference("b", "A.php", 4),
        ]);
        assert_eq!(
            index.unique_count() + index.duplicate_count(),
            index.total_count()
        );
        assert_eq!(index.duplicates().len(), 1);
    }

    #[test]
    fn test_unknown_key() {
        let index = ReferenceIndex::new();
        let key = TranslationKey::new("Vendor.Site", "Main", "nope");
        assert!(index.all_for(&key).is_empty());
        assert!(!index.contains(&key));
    }

    #[test]
    fn test_references_are_ordered_by_key() {
        let index = ReferenceIndex::from_references([
            reference("zeta", "A.php", 1),
            reference("alpha", "A.php", 2),
        ]);
        let ids: Vec<_> = index.references().map(|r| r.key.identifier.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "zeta"]);
    }
}
