use crate::dataset::domain::descriptor::Descriptor;
use crate::detection::domain::detected_face::DetectedFace;
use crate::detection::domain::detector_mode::DetectorMode;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_embedder::FaceEmbedder;
use crate::detection::domain::face_engine::FaceEngine;
use crate::detection::infrastructure::arcface_embedder::ArcFaceEmbedder;
use crate::detection::infrastructure::math::{l2_normalize, mean};
use crate::detection::infrastructure::model_resolver::EngineModelPaths;
use crate::detection::infrastructure::onnx_face_detector::OnnxFaceDetector;
use crate::shared::error::BoxError;
use crate::shared::frame::Frame;
use crate::shared::rectangle::Rectangle;

/// Two-stage engine: a detector finds face rectangles, an embedder turns
/// each crop into a descriptor.
///
/// In [`DetectorMode::Accurate`] every crop is also embedded mirrored and the
/// two descriptors are averaged, doubling embedding cost.
pub struct DetectEmbedEngine {
    detector: Box<dyn FaceDetector>,
    embedder: Box<dyn FaceEmbedder>,
}

impl DetectEmbedEngine {
    pub fn new(detector: Box<dyn FaceDetector>, embedder: Box<dyn FaceEmbedder>) -> Self {
        Self { detector, embedder }
    }

    /// YOLO detector + ArcFace embedder backed by ONNX Runtime.
    pub fn onnx(models: &EngineModelPaths, confidence: f64) -> Result<Self, BoxError> {
        let detector = OnnxFaceDetector::new(&models.detector, confidence)?;
        let embedder = ArcFaceEmbedder::new(&models.embedder)?;
        Ok(Self::new(Box::new(detector), Box::new(embedder)))
    }

    fn describe(
        &mut self,
        frame: &Frame,
        rect: &Rectangle,
        mode: DetectorMode,
    ) -> Result<Option<Descriptor>, BoxError> {
        let Some(crop) = frame.crop(rect) else {
            return Ok(None);
        };
        let descriptor = self.embedder.embed(&crop)?;
        match mode {
            DetectorMode::Standard => Ok(Some(descriptor)),
            DetectorMode::Accurate => {
                let mirrored = self.embedder.embed(&crop.flip_horizontal())?;
                let mut averaged = mean(&[
                    descriptor.as_slice().to_vec(),
                    mirrored.as_slice().to_vec(),
                ]);
                l2_normalize(&mut averaged);
                Ok(Some(Descriptor::new(averaged)))
            }
        }
    }
}

impl FaceEngine for DetectEmbedEngine {
    fn detect_and_describe(
        &mut self,
        frame: &Frame,
        mode: DetectorMode,
    ) -> Result<Vec<DetectedFace>, BoxError> {
        let mut rects = self.detector.detect(frame)?;
        rects.sort_by(Rectangle::reading_order);

        let mut faces = Vec::with_capacity(rects.len());
        for rect in rects {
            if let Some(descriptor) = self.describe(frame, &rect, mode)? {
                faces.push(DetectedFace {
                    rectangle: rect,
                    descriptor,
                });
            }
        }
        log::debug!("Detected {} face(s) ({mode} mode)", faces.len());
        Ok(faces)
    }
}
