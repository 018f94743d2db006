use crate::dataset::domain::dataset::Dataset;
use crate::dataset::domain::descriptor::Descriptor;
use crate::detection::domain::detected_face::DetectedFace;
use crate::matching::domain::classified_face::ClassifiedFace;
use crate::matching::domain::gallery::Gallery;

/// Nearest-descriptor classifier over a [`Gallery`].
///
/// Callers must call [`Matcher::set_samples`] after every dataset mutation;
/// the recognizer does this on each add and remove.
#[derive(Clone, Debug)]
pub struct Matcher {
    gallery: Gallery,
    tolerance: f32,
}

impl Matcher {
    pub fn new(tolerance: f32) -> Self {
        Self {
            gallery: Gallery::empty(),
            tolerance,
        }
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    pub fn set_tolerance(&mut self, tolerance: f32) {
        self.tolerance = tolerance;
    }

    /// Replaces the gallery with one built from the dataset's current order.
    pub fn set_samples(&mut self, dataset: &Dataset) {
        self.gallery = Gallery::build(dataset.snapshot());
        log::debug!("Gallery rebuilt with {} samples", self.gallery.len());
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    /// Label and distance of the nearest sample, if within tolerance.
    pub fn classify(&self, query: &Descriptor) -> Option<(&str, f32)> {
        let nearest = self.gallery.nearest(query)?;
        if nearest.distance > self.tolerance {
            return None;
        }
        self.gallery
            .label(nearest.index)
            .map(|label| (label, nearest.distance))
    }

    pub fn classify_face(&self, face: &DetectedFace) -> Option<ClassifiedFace> {
        self.classify(&face.descriptor)
            .map(|(label, distance)| ClassifiedFace {
                label: label.to_string(),
                rectangle: face.rectangle,
                distance,
            })
    }

    /// Classifies each face independently, dropping those without a match.
    /// Input order is preserved.
    pub fn classify_faces(&self, faces: &[DetectedFace]) -> Vec<ClassifiedFace> {
        faces.iter().filter_map(|f| self.classify_face(f)).collect()
    }
}
