use crate::detection::domain::detected_face::DetectedFace;
use crate::detection::domain::detector_mode::DetectorMode;
use crate::shared::error::BoxError;
use crate::shared::frame::Frame;

/// Domain interface for the face-embedding engine.
///
/// Implementations may hold inference sessions that need exclusive access,
/// hence `&mut self`.
pub trait FaceEngine: Send {
    /// All faces in `frame`, ordered left-to-right by rectangle x.
    /// An image without faces yields an empty list, not an error.
    fn detect_and_describe(
        &mut self,
        frame: &Frame,
        mode: DetectorMode,
    ) -> Result<Vec<DetectedFace>, BoxError>;

    /// The face in `frame` if there is exactly one, `None` otherwise.
    fn detect_single_and_describe(
        &mut self,
        frame: &Frame,
        mode: DetectorMode,
    ) -> Result<Option<DetectedFace>, BoxError> {
        let mut faces = self.detect_and_describe(frame, mode)?;
        if faces.len() == 1 {
            Ok(faces.pop())
        } else {
            Ok(None)
        }
    }
}
