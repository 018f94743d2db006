use crate::dataset::domain::descriptor::Descriptor;
use crate::dataset::domain::labeled_descriptor::LabeledDescriptor;

/// Ordered collection of enrolled samples.
///
/// Position in the sequence is the gallery index the matcher reports, so
/// any mutation invalidates galleries built from an earlier snapshot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    entries: Vec<LabeledDescriptor>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<LabeledDescriptor>) -> Self {
        Self { entries }
    }

    pub fn add(&mut self, label: impl Into<String>, descriptor: impl Into<Descriptor>) {
        self.entries.push(LabeledDescriptor::new(label, descriptor));
    }

    pub fn add_entry(&mut self, entry: LabeledDescriptor) {
        self.entries.push(entry);
    }

    /// Appends entries in the given order.
    pub fn add_batch(&mut self, entries: impl IntoIterator<Item = LabeledDescriptor>) {
        self.entries.extend(entries);
    }

    /// Removes one sample of `label`: the earliest inserted.
    ///
    /// Returns `false` and leaves the dataset untouched if no entry matches.
    pub fn remove_by_label(&mut self, label: &str) -> bool {
        match self.entries.iter().position(|e| e.label() == label) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Removes every sample of `label`, returning how many were dropped.
    pub fn remove_all_by_label(&mut self, label: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.label() != label);
        before - self.entries.len()
    }

    pub fn snapshot(&self) -> &[LabeledDescriptor] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&LabeledDescriptor> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains_label(&self, label: &str) -> bool {
        self.entries.iter().any(|e| e.label() == label)
    }

    /// Distinct labels with their sample counts, in first-insertion order.
    pub fn label_counts(&self) -> Vec<(&str, usize)> {
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for entry in &self.entries {
            match counts.iter().position(|(l, _)| *l == entry.label()) {
                Some(i) => counts[i].1 += 1,
                None => counts.push((entry.label(), 1)),
            }
        }
        counts
    }

    pub fn into_entries(self) -> Vec<LabeledDescriptor> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(dataset: &Dataset) -> Vec<&str> {
        dataset.snapshot().iter().map(|e| e.label()).collect()
    }

    fn sample(label: &str, v: f32) -> LabeledDescriptor {
        LabeledDescriptor::new(label, vec![v, v])
    }

    #[test]
    fn test_add_appends_in_order() {
        let mut ds = Dataset::new();
        ds.add("alice", vec![0.0f32, 1.0]);
        ds.add("bob", vec![1.0f32, 0.0]);
        assert_eq!(labels(&ds), vec!["alice", "bob"]);
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn test_add_allows_duplicate_labels() {
        let mut ds = Dataset::new();
        ds.add("alice", vec![0.0f32]);
        ds.add("alice", vec![1.0f32]);
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn test_add_batch_equals_repeated_add() {
        let mut batched = Dataset::new();
        batched.add_batch(vec![sample("a", 0.1), sample("b", 0.2), sample("c", 0.3)]);

        let mut single = Dataset::new();
        single.add("a", vec![0.1f32, 0.1]);
        single.add("b", vec![0.2f32, 0.2]);
        single.add("c", vec![0.3f32, 0.3]);

        assert_eq!(batched, single);
    }

    #[test]
    fn test_remove_by_label_removes_first_match_only() {
        let mut ds = Dataset::from_entries(vec![
            sample("alice", 0.1),
            sample("bob", 0.2),
            sample("alice", 0.3),
        ]);

        assert!(ds.remove_by_label("alice"));

        assert_eq!(labels(&ds), vec!["bob", "alice"]);
        assert_eq!(ds.get(1).unwrap().descriptor().as_slice(), &[0.3, 0.3]);
    }

    #[test]
    fn test_remove_missing_label_leaves_dataset_unchanged() {
        let mut ds = Dataset::from_entries(vec![sample("alice", 0.1), sample("bob", 0.2)]);
        let before = ds.clone();

        assert!(!ds.remove_by_label("carol"));

        assert_eq!(ds, before);
    }

    #[test]
    fn test_remove_all_by_label() {
        let mut ds = Dataset::from_entries(vec![
            sample("alice", 0.1),
            sample("bob", 0.2),
            sample("alice", 0.3),
        ]);

        assert_eq!(ds.remove_all_by_label("alice"), 2);
        assert_eq!(labels(&ds), vec!["bob"]);
        assert_eq!(ds.remove_all_by_label("alice"), 0);
    }

    #[test]
    fn test_label_counts_in_insertion_order() {
        let ds = Dataset::from_entries(vec![
            sample("bob", 0.1),
            sample("alice", 0.2),
            sample("bob", 0.3),
        ]);
        assert_eq!(ds.label_counts(), vec![("bob", 2), ("alice", 1)]);
    }

    #[test]
    fn test_contains_label_and_clear() {
        let mut ds = Dataset::from_entries(vec![sample("alice", 0.1)]);
        assert!(ds.contains_label("alice"));
        ds.clear();
        assert!(ds.is_empty());
        assert!(!ds.contains_label("alice"));
    }
}
