use crate::shared::error::BoxError;
use crate::shared::frame::Frame;
use crate::shared::rectangle::Rectangle;

/// Domain interface for locating faces in a frame.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Rectangle>, BoxError>;
}
