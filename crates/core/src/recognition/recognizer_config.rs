use serde::{Deserialize, Serialize};

use crate::detection::domain::detector_mode::DetectorMode;
use crate::shared::constants::{DEFAULT_CONFIDENCE, DEFAULT_TOLERANCE};
use crate::shared::error::RecognizerError;

/// Image preprocessing applied before detection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreprocessMode {
    None,
    #[default]
    Grayscale,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    /// Maximum descriptor distance accepted as a match. Smaller is stricter.
    pub tolerance: f32,
    pub detector_mode: DetectorMode,
    pub preprocess_mode: PreprocessMode,
    /// Detector score threshold, used when loading the ONNX engine.
    pub confidence: f64,
    /// JPEG re-encode quality for in-memory images; `None` skips re-encoding.
    pub jpeg_quality: Option<u8>,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            detector_mode: DetectorMode::Standard,
            preprocess_mode: PreprocessMode::Grayscale,
            confidence: DEFAULT_CONFIDENCE,
            jpeg_quality: None,
        }
    }
}

impl RecognizerConfig {
    pub fn validate(&self) -> Result<(), RecognizerError> {
        validate_tolerance(self.tolerance)?;
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(RecognizerError::InvalidConfig(format!(
                "confidence must be between 0.0 and 1.0, got {}",
                self.confidence
            )));
        }
        if let Some(q) = self.jpeg_quality {
            if !(1..=100).contains(&q) {
                return Err(RecognizerError::InvalidConfig(format!(
                    "JPEG quality must be between 1 and 100, got {q}"
                )));
            }
        }
        Ok(())
    }
}

/// Any non-negative tolerance is valid, including `+∞`.
pub(crate) fn validate_tolerance(tolerance: f32) -> Result<(), RecognizerError> {
    if tolerance.is_nan() || tolerance < 0.0 {
        return Err(RecognizerError::InvalidConfig(format!(
            "tolerance must be a non-negative number, got {tolerance}"
        )));
    }
    Ok(())
}
