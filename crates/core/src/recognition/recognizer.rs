use std::path::Path;

use image::DynamicImage;

use crate::dataset::domain::dataset::Dataset;
use crate::dataset::domain::descriptor::Descriptor;
use crate::dataset::domain::labeled_descriptor::LabeledDescriptor;
use crate::detection::domain::detected_face::DetectedFace;
use crate::detection::domain::face_engine::FaceEngine;
use crate::detection::infrastructure::detect_embed_engine::DetectEmbedEngine;
use crate::detection::infrastructure::model_resolver::{self, ProgressFn};
use crate::imaging::domain::image_source::ImageSource;
use crate::imaging::infrastructure::image_loader;
use crate::matching::domain::classified_face::ClassifiedFace;
use crate::matching::domain::matcher::Matcher;
use crate::recognition::recognizer_config::{validate_tolerance, PreprocessMode, RecognizerConfig};
use crate::shared::error::{RecognizerError, Stage};
use crate::shared::frame::Frame;

/// Enrolls labeled face samples and classifies new images against them.
///
/// Owns the face engine, the dataset and the matcher's gallery. Every method
/// that changes the dataset rebuilds the gallery before returning, so
/// classification always sees the current samples.
///
/// Not internally synchronized: all operations take `&mut self`. Share a
/// recognizer across threads by wrapping it in a `Mutex`, which serializes
/// enrollment, removal and classification against each other.
pub struct Recognizer {
    engine: Option<Box<dyn FaceEngine>>,
    dataset: Dataset,
    matcher: Matcher,
    config: RecognizerConfig,
}

impl Recognizer {
    pub fn new(
        engine: Box<dyn FaceEngine>,
        config: RecognizerConfig,
    ) -> Result<Self, RecognizerError> {
        config.validate()?;
        Ok(Self {
            engine: Some(engine),
            dataset: Dataset::new(),
            matcher: Matcher::new(config.tolerance),
            config,
        })
    }

    /// Resolves the ONNX models (downloading them if needed) and loads the
    /// default engine. Any failure is an [`RecognizerError::Initialization`].
    pub fn from_models(
        models_dir: Option<&Path>,
        config: RecognizerConfig,
        progress: Option<ProgressFn>,
    ) -> Result<Self, RecognizerError> {
        config.validate()?;
        let models = model_resolver::resolve_engine_models(models_dir, progress)
            .map_err(|e| RecognizerError::Initialization(Box::new(e)))?;
        let engine = DetectEmbedEngine::onnx(&models, config.confidence)
            .map_err(RecognizerError::Initialization)?;
        log::info!("Face engine ready");
        Self::new(Box::new(engine), config)
    }

    /// Releases the engine and forgets all samples. Safe to call repeatedly;
    /// image operations fail with [`RecognizerError::Closed`] afterwards.
    pub fn close(&mut self) {
        if self.engine.take().is_some() {
            log::debug!("Recognizer closed");
        }
        self.dataset.clear();
        self.matcher.set_samples(&self.dataset);
    }

    pub fn is_closed(&self) -> bool {
        self.engine.is_none()
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    pub fn tolerance(&self) -> f32 {
        self.matcher.tolerance()
    }

    pub fn set_tolerance(&mut self, tolerance: f32) -> Result<(), RecognizerError> {
        validate_tolerance(tolerance)?;
        self.config.tolerance = tolerance;
        self.matcher.set_tolerance(tolerance);
        Ok(())
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    // ── Dataset ──────────────────────────────────────────────────────

    pub fn add_single_data(&mut self, entry: LabeledDescriptor) {
        self.dataset.add_entry(entry);
        self.rebuild_gallery();
    }

    pub fn add_descriptor(&mut self, label: impl Into<String>, descriptor: impl Into<Descriptor>) {
        self.add_single_data(LabeledDescriptor::new(label, descriptor));
    }

    pub fn add_multiple_data(&mut self, entries: impl IntoIterator<Item = LabeledDescriptor>) {
        self.dataset.add_batch(entries);
        self.rebuild_gallery();
    }

    /// Replaces every sample, e.g. with a dataset loaded from disk.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.dataset = dataset;
        self.rebuild_gallery();
    }

    /// Removes one sample of `label` (the earliest enrolled). Missing labels
    /// are a no-op; returns whether a sample was removed.
    pub fn remove_from_dataset(&mut self, label: &str) -> bool {
        let removed = self.dataset.remove_by_label(label);
        if removed {
            log::debug!("Removed one sample of '{label}'");
            self.rebuild_gallery();
        }
        removed
    }

    /// Removes every sample of `label`, returning how many were removed.
    pub fn remove_all_from_dataset(&mut self, label: &str) -> usize {
        let removed = self.dataset.remove_all_by_label(label);
        if removed > 0 {
            log::debug!("Removed {removed} sample(s) of '{label}'");
            self.rebuild_gallery();
        }
        removed
    }

    /// Enrolls the single face found in `source` under `label`.
    ///
    /// Fails with `NoFaceDetected` or `AmbiguousFace` unless exactly one face
    /// is found; the dataset is unchanged on any error.
    pub fn add_to_dataset(
        &mut self,
        source: ImageSource<'_>,
        label: &str,
    ) -> Result<LabeledDescriptor, RecognizerError> {
        let face = self.detect_single(source, Stage::Enrollment)?;
        let entry = LabeledDescriptor::new(label, face.descriptor);
        self.add_single_data(entry.clone());
        log::info!("Enrolled '{label}' ({} samples total)", self.dataset.len());
        Ok(entry)
    }

    pub fn add_image_to_dataset(
        &mut self,
        path: &Path,
        label: &str,
    ) -> Result<LabeledDescriptor, RecognizerError> {
        self.add_to_dataset(ImageSource::Path(path), label)
    }

    pub fn add_raw_image_to_dataset(
        &mut self,
        image: &DynamicImage,
        label: &str,
    ) -> Result<LabeledDescriptor, RecognizerError> {
        self.add_to_dataset(ImageSource::Image(image), label)
    }

    pub fn add_image_bytes_to_dataset(
        &mut self,
        bytes: &[u8],
        label: &str,
    ) -> Result<LabeledDescriptor, RecognizerError> {
        self.add_to_dataset(ImageSource::Bytes(bytes), label)
    }

    // ── Detection ────────────────────────────────────────────────────

    /// The face in `source`, which must contain exactly one.
    pub fn recognize_single(
        &mut self,
        source: ImageSource<'_>,
    ) -> Result<DetectedFace, RecognizerError> {
        self.detect_single(source, Stage::Detection)
    }

    /// All faces in `source`, left to right. No faces is an empty list.
    pub fn recognize_multiple(
        &mut self,
        source: ImageSource<'_>,
    ) -> Result<Vec<DetectedFace>, RecognizerError> {
        self.detect(source, Stage::Detection)
    }

    // ── Classification ───────────────────────────────────────────────

    /// Classifies the single face in `source`.
    ///
    /// Returns an empty list when the gallery is empty or the nearest sample
    /// is farther than the tolerance; detection failures are errors.
    pub fn classify_single_source(
        &mut self,
        source: ImageSource<'_>,
    ) -> Result<Vec<ClassifiedFace>, RecognizerError> {
        let face = self.detect_single(source, Stage::Classification)?;
        let result: Vec<ClassifiedFace> = self.matcher.classify_face(&face).into_iter().collect();
        match result.first() {
            Some(hit) => log::debug!("Classified face as '{}' ({:.3})", hit.label, hit.distance),
            None => log::debug!("Face did not match any sample"),
        }
        Ok(result)
    }

    /// Classifies every face in `source`, left to right. Faces without a
    /// match within tolerance are left out of the result.
    pub fn classify_multiple_source(
        &mut self,
        source: ImageSource<'_>,
    ) -> Result<Vec<ClassifiedFace>, RecognizerError> {
        let faces = self.detect(source, Stage::Classification)?;
        let result = self.matcher.classify_faces(&faces);
        log::debug!("Matched {} of {} face(s)", result.len(), faces.len());
        Ok(result)
    }

    pub fn classify_single(&mut self, path: &Path) -> Result<Vec<ClassifiedFace>, RecognizerError> {
        self.classify_single_source(ImageSource::Path(path))
    }

    pub fn classify_single_from_image(
        &mut self,
        image: &DynamicImage,
    ) -> Result<Vec<ClassifiedFace>, RecognizerError> {
        self.classify_single_source(ImageSource::Image(image))
    }

    pub fn classify_single_from_bytes(
        &mut self,
        bytes: &[u8],
    ) -> Result<Vec<ClassifiedFace>, RecognizerError> {
        self.classify_single_source(ImageSource::Bytes(bytes))
    }

    pub fn classify_multiple(
        &mut self,
        path: &Path,
    ) -> Result<Vec<ClassifiedFace>, RecognizerError> {
        self.classify_multiple_source(ImageSource::Path(path))
    }

    pub fn classify_multiple_from_image(
        &mut self,
        image: &DynamicImage,
    ) -> Result<Vec<ClassifiedFace>, RecognizerError> {
        self.classify_multiple_source(ImageSource::Image(image))
    }

    pub fn classify_multiple_from_bytes(
        &mut self,
        bytes: &[u8],
    ) -> Result<Vec<ClassifiedFace>, RecognizerError> {
        self.classify_multiple_source(ImageSource::Bytes(bytes))
    }

    // ── Internals ────────────────────────────────────────────────────

    fn rebuild_gallery(&mut self) {
        self.matcher.set_samples(&self.dataset);
    }

    fn load_frame(&self, source: ImageSource<'_>) -> Result<Frame, RecognizerError> {
        let frame = image_loader::load(source, self.config.jpeg_quality)?;
        Ok(match self.config.preprocess_mode {
            PreprocessMode::Grayscale => frame.to_grayscale(),
            PreprocessMode::None => frame,
        })
    }

    fn detect(
        &mut self,
        source: ImageSource<'_>,
        stage: Stage,
    ) -> Result<Vec<DetectedFace>, RecognizerError> {
        if self.engine.is_none() {
            return Err(RecognizerError::Closed);
        }
        let frame = self.load_frame(source)?;
        let mode = self.config.detector_mode;
        let engine = self.engine.as_mut().ok_or(RecognizerError::Closed)?;
        engine
            .detect_and_describe(&frame, mode)
            .map_err(|e| RecognizerError::Engine { stage, source: e })
    }

    fn detect_single(
        &mut self,
        source: ImageSource<'_>,
        stage: Stage,
    ) -> Result<DetectedFace, RecognizerError> {
        let mut faces = self.detect(source, stage)?;
        match faces.len() {
            0 => Err(RecognizerError::NoFaceDetected { stage }),
            1 => faces.pop().ok_or(RecognizerError::NoFaceDetected { stage }),
            count => Err(RecognizerError::AmbiguousFace { stage, count }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detector_mode::DetectorMode;
    use crate::shared::error::BoxError;
    use crate::shared::rectangle::Rectangle;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    #[derive(Default)]
    struct EngineLog {
        frames: Vec<Frame>,
        modes: Vec<DetectorMode>,
    }

    /// Returns whatever faces the test put in `faces`, regardless of image.
    struct StubEngine {
        faces: Arc<Mutex<Vec<DetectedFace>>>,
        log: Arc<Mutex<EngineLog>>,
    }

    impl FaceEngine for StubEngine {
        fn detect_and_describe(
            &mut self,
            frame: &Frame,
            mode: DetectorMode,
        ) -> Result<Vec<DetectedFace>, BoxError> {
            let mut log = self.log.lock().unwrap();
            log.frames.push(frame.clone());
            log.modes.push(mode);
            Ok(self.faces.lock().unwrap().clone())
        }
    }

    struct FailingEngine;

    impl FaceEngine for FailingEngine {
        fn detect_and_describe(
            &mut self,
            _frame: &Frame,
            _mode: DetectorMode,
        ) -> Result<Vec<DetectedFace>, BoxError> {
            Err("model exploded".into())
        }
    }

    // --- Helpers ---

    struct Harness {
        recognizer: Recognizer,
        faces: Arc<Mutex<Vec<DetectedFace>>>,
        log: Arc<Mutex<EngineLog>>,
    }

    impl Harness {
        fn new(config: RecognizerConfig) -> Self {
            let faces = Arc::new(Mutex::new(Vec::new()));
            let log = Arc::new(Mutex::new(EngineLog::default()));
            let engine = StubEngine {
                faces: faces.clone(),
                log: log.clone(),
            };
            Self {
                recognizer: Recognizer::new(Box::new(engine), config).unwrap(),
                faces,
                log,
            }
        }

        fn with_defaults() -> Self {
            Self::new(RecognizerConfig::default())
        }

        fn engine_sees(&self, faces: Vec<DetectedFace>) {
            *self.faces.lock().unwrap() = faces;
        }
    }

    fn face(x: i32, descriptor: Vec<f32>) -> DetectedFace {
        DetectedFace {
            rectangle: Rectangle::new(x, 10, 40, 40),
            descriptor: Descriptor::new(descriptor),
        }
    }

    fn image() -> DynamicImage {
        let mut img = image::RgbImage::new(8, 8);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb([255, 0, 0]);
        }
        DynamicImage::ImageRgb8(img)
    }

    fn png_bytes() -> Vec<u8> {
        let mut buf = std::io::Cursor::new(Vec::new());
        image().write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    // --- Enrollment ---

    #[test]
    fn test_add_image_enrolls_single_face() {
        let mut h = Harness::with_defaults();
        h.engine_sees(vec![face(0, vec![0.1, 0.2])]);

        let entry = h.recognizer.add_raw_image_to_dataset(&image(), "alice").unwrap();

        assert_eq!(entry.label(), "alice");
        assert_eq!(entry.descriptor().as_slice(), &[0.1, 0.2]);
        assert_eq!(h.recognizer.dataset().len(), 1);
    }

    #[test]
    fn test_add_image_without_face_fails_and_leaves_dataset() {
        let mut h = Harness::with_defaults();
        h.engine_sees(vec![]);

        let err = h.recognizer.add_raw_image_to_dataset(&image(), "alice").unwrap_err();

        assert!(matches!(
            err,
            RecognizerError::NoFaceDetected {
                stage: Stage::Enrollment
            }
        ));
        assert!(h.recognizer.dataset().is_empty());
    }

    #[test]
    fn test_add_image_with_two_faces_is_ambiguous() {
        let mut h = Harness::with_defaults();
        h.recognizer.add_descriptor("bob", vec![9.0f32, 9.0]);
        h.engine_sees(vec![face(0, vec![0.0, 0.0]), face(100, vec![1.0, 1.0])]);

        let err = h
            .recognizer
            .add_image_bytes_to_dataset(&png_bytes(), "alice")
            .unwrap_err();

        assert!(matches!(
            err,
            RecognizerError::AmbiguousFace {
                stage: Stage::Enrollment,
                count: 2
            }
        ));
        assert_eq!(h.recognizer.dataset().len(), 1);
    }

    #[test]
    fn test_add_image_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alice.png");
        image().save(&path).unwrap();
        let mut h = Harness::with_defaults();
        h.engine_sees(vec![face(0, vec![0.5, 0.5])]);

        h.recognizer.add_image_to_dataset(&path, "alice").unwrap();

        assert!(h.recognizer.dataset().contains_label("alice"));
    }

    #[test]
    fn test_add_missing_file_is_io_error() {
        let mut h = Harness::with_defaults();
        let err = h
            .recognizer
            .add_image_to_dataset(Path::new("/nonexistent/alice.jpg"), "alice")
            .unwrap_err();
        assert!(matches!(err, RecognizerError::Io { .. }));
        assert!(h.log.lock().unwrap().frames.is_empty());
    }

    #[test]
    fn test_undecodable_bytes_is_decode_error() {
        let mut h = Harness::with_defaults();
        let err = h
            .recognizer
            .add_image_bytes_to_dataset(b"garbage", "alice")
            .unwrap_err();
        assert!(matches!(err, RecognizerError::Decode { .. }));
    }

    #[test]
    fn test_engine_failure_is_wrapped_with_stage() {
        let mut recognizer =
            Recognizer::new(Box::new(FailingEngine), RecognizerConfig::default()).unwrap();

        let err = recognizer.classify_multiple_from_image(&image()).unwrap_err();

        match err {
            RecognizerError::Engine { stage, source } => {
                assert_eq!(stage, Stage::Classification);
                assert_eq!(source.to_string(), "model exploded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    // --- Classification ---

    #[test]
    fn test_round_trip_exact_descriptor() {
        let mut h = Harness::with_defaults();
        h.recognizer.add_descriptor("alice", vec![0.3f32, -0.1, 0.7]);
        h.engine_sees(vec![face(5, vec![0.3, -0.1, 0.7])]);

        let result = h.recognizer.classify_single_from_image(&image()).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].label, "alice");
        assert_eq!(result[0].rectangle, Rectangle::new(5, 10, 40, 40));
        assert_eq!(result[0].distance, 0.0);
    }

    #[test]
    fn test_alice_scenario_within_and_beyond_tolerance() {
        let mut h = Harness::with_defaults();
        h.recognizer.add_descriptor("alice", vec![0.0f32, 0.0]);

        h.engine_sees(vec![face(0, vec![0.3, 0.0])]);
        let near = h.recognizer.classify_single_from_image(&image()).unwrap();
        assert_eq!(near.len(), 1);
        assert_eq!(near[0].label, "alice");

        h.engine_sees(vec![face(0, vec![0.5, 0.0])]);
        let far = h.recognizer.classify_single_from_image(&image()).unwrap();
        assert!(far.is_empty());
    }

    #[test]
    fn test_classify_single_empty_gallery_is_empty_result() {
        let mut h = Harness::new(RecognizerConfig {
            tolerance: f32::INFINITY,
            ..Default::default()
        });
        h.engine_sees(vec![face(0, vec![0.0, 0.0])]);

        let result = h.recognizer.classify_single_from_bytes(&png_bytes()).unwrap();

        assert!(result.is_empty());
    }

    #[test]
    fn test_classify_single_requires_one_face() {
        let mut h = Harness::with_defaults();
        h.recognizer.add_descriptor("alice", vec![0.0f32, 0.0]);

        h.engine_sees(vec![]);
        assert!(matches!(
            h.recognizer.classify_single_from_image(&image()),
            Err(RecognizerError::NoFaceDetected {
                stage: Stage::Classification
            })
        ));

        h.engine_sees(vec![face(0, vec![0.0, 0.0]), face(60, vec![0.0, 0.0])]);
        assert!(matches!(
            h.recognizer.classify_single_from_image(&image()),
            Err(RecognizerError::AmbiguousFace { count: 2, .. })
        ));
    }

    #[test]
    fn test_classify_multiple_keeps_matches_in_engine_order() {
        let mut h = Harness::with_defaults();
        h.recognizer.add_multiple_data(vec![
            LabeledDescriptor::new("alice", vec![0.0f32, 0.0]),
            LabeledDescriptor::new("bob", vec![1.0f32, 1.0]),
        ]);
        h.engine_sees(vec![
            face(10, vec![1.0, 1.1]),
            face(50, vec![5.0, 5.0]),
            face(90, vec![0.0, 0.1]),
        ]);

        let result = h.recognizer.classify_multiple_from_image(&image()).unwrap();

        let got: Vec<(&str, i32)> = result
            .iter()
            .map(|f| (f.label.as_str(), f.rectangle.x))
            .collect();
        assert_eq!(got, vec![("bob", 10), ("alice", 90)]);
    }

    #[test]
    fn test_classify_multiple_no_faces_is_empty() {
        let mut h = Harness::with_defaults();
        h.recognizer.add_descriptor("alice", vec![0.0f32, 0.0]);
        h.engine_sees(vec![]);
        assert!(h
            .recognizer
            .classify_multiple_from_bytes(&png_bytes())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_classify_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("query.png");
        image().save(&path).unwrap();
        let mut h = Harness::with_defaults();
        h.recognizer.add_descriptor("alice", vec![0.0f32, 0.0]);
        h.engine_sees(vec![face(0, vec![0.0, 0.0])]);

        assert_eq!(h.recognizer.classify_single(&path).unwrap().len(), 1);
        assert_eq!(h.recognizer.classify_multiple(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_tie_break_prefers_earlier_sample() {
        let mut h = Harness::with_defaults();
        h.recognizer.add_descriptor("first", vec![0.1f32, 0.0]);
        h.recognizer.add_descriptor("second", vec![-0.1f32, 0.0]);
        h.engine_sees(vec![face(0, vec![0.0, 0.0])]);

        let result = h.recognizer.classify_single_from_image(&image()).unwrap();

        assert_eq!(result[0].label, "first");
    }

    // --- Removal keeps the gallery in sync ---

    #[test]
    fn test_removed_label_is_never_returned() {
        let mut h = Harness::with_defaults();
        h.recognizer.add_descriptor("alice", vec![0.0f32, 0.0]);
        h.recognizer.add_descriptor("bob", vec![0.2f32, 0.0]);
        h.engine_sees(vec![face(0, vec![0.0, 0.0])]);

        assert!(h.recognizer.remove_from_dataset("alice"));
        let result = h.recognizer.classify_single_from_image(&image()).unwrap();

        assert_eq!(result[0].label, "bob");
    }

    #[test]
    fn test_removal_shifts_indices_without_stale_labels() {
        let mut h = Harness::with_defaults();
        h.recognizer.add_descriptor("alice", vec![0.0f32, 0.0]);
        h.recognizer.add_descriptor("bob", vec![5.0f32, 5.0]);
        h.recognizer.add_descriptor("carol", vec![9.0f32, 9.0]);
        h.recognizer.remove_from_dataset("alice");
        h.engine_sees(vec![face(0, vec![9.0, 9.0])]);

        let result = h.recognizer.classify_single_from_image(&image()).unwrap();

        assert_eq!(result[0].label, "carol");
    }

    #[test]
    fn test_remove_missing_label_is_noop() {
        let mut h = Harness::with_defaults();
        h.recognizer.add_descriptor("alice", vec![0.0f32, 0.0]);
        let before = h.recognizer.dataset().clone();

        assert!(!h.recognizer.remove_from_dataset("nobody"));

        assert_eq!(h.recognizer.dataset(), &before);
    }

    #[test]
    fn test_remove_one_sample_keeps_identity_matchable() {
        let mut h = Harness::with_defaults();
        h.recognizer.add_descriptor("alice", vec![0.0f32, 0.0]);
        h.recognizer.add_descriptor("alice", vec![3.0f32, 3.0]);
        h.engine_sees(vec![face(0, vec![3.0, 3.0])]);

        h.recognizer.remove_from_dataset("alice");
        let after_one = h.recognizer.classify_single_from_image(&image()).unwrap();
        assert_eq!(after_one[0].label, "alice");

        h.recognizer.add_descriptor("alice", vec![0.0f32, 0.0]);
        assert_eq!(h.recognizer.remove_all_from_dataset("alice"), 2);
        assert!(h
            .recognizer
            .classify_single_from_image(&image())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_set_dataset_rebuilds_gallery() {
        let mut h = Harness::with_defaults();
        h.recognizer.add_descriptor("old", vec![0.0f32, 0.0]);
        h.recognizer
            .set_dataset(Dataset::from_entries(vec![LabeledDescriptor::new(
                "new",
                vec![0.0f32, 0.0],
            )]));
        h.engine_sees(vec![face(0, vec![0.0, 0.0])]);

        let result = h.recognizer.classify_single_from_image(&image()).unwrap();

        assert_eq!(result[0].label, "new");
    }

    // --- Configuration pass-through ---

    #[test]
    fn test_grayscale_preprocessing_reaches_engine() {
        let mut h = Harness::with_defaults();
        h.engine_sees(vec![]);
        h.recognizer.recognize_multiple(ImageSource::Image(&image())).unwrap();

        let log = h.log.lock().unwrap();
        assert_eq!(&log.frames[0].data()[0..3], &[76, 76, 76]);
    }

    #[test]
    fn test_no_preprocessing_keeps_colour() {
        let mut h = Harness::new(RecognizerConfig {
            preprocess_mode: PreprocessMode::None,
            ..Default::default()
        });
        h.recognizer.recognize_multiple(ImageSource::Image(&image())).unwrap();

        let log = h.log.lock().unwrap();
        assert_eq!(&log.frames[0].data()[0..3], &[255, 0, 0]);
    }

    #[test]
    fn test_detector_mode_is_passed_through() {
        let mut h = Harness::new(RecognizerConfig {
            detector_mode: DetectorMode::Accurate,
            ..Default::default()
        });
        h.recognizer.recognize_multiple(ImageSource::Image(&image())).unwrap();
        assert_eq!(h.log.lock().unwrap().modes, vec![DetectorMode::Accurate]);
    }

    #[test]
    fn test_set_tolerance_applies_to_next_classification() {
        let mut h = Harness::with_defaults();
        h.recognizer.add_descriptor("alice", vec![0.0f32, 0.0]);
        h.engine_sees(vec![face(0, vec![0.5, 0.0])]);
        assert!(h
            .recognizer
            .classify_single_from_image(&image())
            .unwrap()
            .is_empty());

        h.recognizer.set_tolerance(0.6).unwrap();

        assert_eq!(h.recognizer.tolerance(), 0.6);
        assert_eq!(
            h.recognizer.classify_single_from_image(&image()).unwrap()[0].label,
            "alice"
        );
        assert!(h.recognizer.set_tolerance(-1.0).is_err());
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let faces = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::new(Mutex::new(EngineLog::default()));
        let result = Recognizer::new(
            Box::new(StubEngine { faces, log }),
            RecognizerConfig {
                tolerance: -0.5,
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(RecognizerError::InvalidConfig(_))));
    }

    // --- Detection-only ---

    #[test]
    fn test_recognize_single_returns_face() {
        let mut h = Harness::with_defaults();
        h.engine_sees(vec![face(7, vec![0.4, 0.4])]);
        let detected = h
            .recognizer
            .recognize_single(ImageSource::Image(&image()))
            .unwrap();
        assert_eq!(detected.rectangle.x, 7);
    }

    #[test]
    fn test_recognize_single_errors_use_detection_stage() {
        let mut h = Harness::with_defaults();
        h.engine_sees(vec![]);
        assert!(matches!(
            h.recognizer.recognize_single(ImageSource::Image(&image())),
            Err(RecognizerError::NoFaceDetected {
                stage: Stage::Detection
            })
        ));
    }

    // --- Lifecycle ---

    #[test]
    fn test_close_is_idempotent_and_blocks_image_operations() {
        let mut h = Harness::with_defaults();
        h.recognizer.add_descriptor("alice", vec![0.0f32, 0.0]);

        h.recognizer.close();
        h.recognizer.close();

        assert!(h.recognizer.is_closed());
        assert!(h.recognizer.dataset().is_empty());
        assert!(matches!(
            h.recognizer.classify_multiple_from_image(&image()),
            Err(RecognizerError::Closed)
        ));
        assert!(h.log.lock().unwrap().frames.is_empty());
    }

    #[test]
    fn test_recognizer_can_be_shared_behind_mutex() {
        let h = Harness::with_defaults();
        let shared = Arc::new(Mutex::new(h.recognizer));
        let worker = {
            let shared = shared.clone();
            std::thread::spawn(move || {
                shared
                    .lock()
                    .unwrap()
                    .add_descriptor("alice", vec![0.0f32, 0.0]);
            })
        };
        worker.join().unwrap();
        assert_eq!(shared.lock().unwrap().dataset().len(), 1);
    }
}
