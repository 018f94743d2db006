use crate::dataset::domain::descriptor::{euclidean_distance, Descriptor};
use crate::dataset::domain::labeled_descriptor::LabeledDescriptor;

/// Searchable view of a dataset snapshot.
///
/// Descriptors and labels are stored in parallel arrays built from the same
/// snapshot, so index `i` in one always names index `i` in the other. A
/// gallery is never patched in place; mutations rebuild it from scratch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Gallery {
    descriptors: Vec<Descriptor>,
    labels: Vec<String>,
}

/// Closest gallery entry to a query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Nearest {
    pub index: usize,
    pub distance: f32,
}

impl Gallery {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn build(snapshot: &[LabeledDescriptor]) -> Self {
        let mut descriptors = Vec::with_capacity(snapshot.len());
        let mut labels = Vec::with_capacity(snapshot.len());
        for entry in snapshot {
            descriptors.push(entry.descriptor().clone());
            labels.push(entry.label().to_string());
        }
        Self {
            descriptors,
            labels,
        }
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Linear scan for the minimum distance. Strict `<` keeps the earliest
    /// index among equal distances; entries of another dimension are skipped.
    pub fn nearest(&self, query: &Descriptor) -> Option<Nearest> {
        let mut best: Option<Nearest> = None;
        for (index, candidate) in self.descriptors.iter().enumerate() {
            let distance = euclidean_distance(candidate.as_slice(), query.as_slice());
            if !distance.is_finite() {
                continue;
            }
            if best.map_or(true, |b| distance < b.distance) {
                best = Some(Nearest { index, distance });
            }
        }
        best
    }
}
