use crate::dataset::domain::descriptor::Descriptor;
use crate::shared::error::BoxError;
use crate::shared::frame::Frame;

/// Domain interface for turning a face crop into a descriptor.
pub trait FaceEmbedder: Send {
    fn embed(&mut self, crop: &Frame) -> Result<Descriptor, BoxError>;
}
