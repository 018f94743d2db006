use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Boxed error returned by engine and infrastructure internals.
pub type BoxError = Box<dyn std::error::Error>;

/// Which recognizer operation was running when a failure happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Enrollment,
    Classification,
    Detection,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Enrollment => write!(f, "enrollment"),
            Stage::Classification => write!(f, "classification"),
            Stage::Detection => write!(f, "detection"),
        }
    }
}

#[derive(Error, Debug)]
pub enum RecognizerError {
    #[error("failed to initialize face engine: {0}")]
    Initialization(#[source] BoxError),
    #[error("{stage}: no face detected in image")]
    NoFaceDetected { stage: Stage },
    #[error("{stage}: expected a single face, found {count}")]
    AmbiguousFace { stage: Stage, count: usize },
    #[error("failed to decode image: {source}")]
    Decode {
        #[source]
        source: image::ImageError,
    },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{stage}: face engine failed: {source}")]
    Engine {
        stage: Stage,
        #[source]
        source: BoxError,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("recognizer has been closed")]
    Closed,
}

impl RecognizerError {
    /// True for the two cardinality failures of single-face operations.
    pub fn is_face_count_error(&self) -> bool {
        matches!(
            self,
            RecognizerError::NoFaceDetected { .. } | RecognizerError::AmbiguousFace { .. }
        )
    }
}
