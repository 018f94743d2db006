use serde::{Deserialize, Serialize};

/// Detection accuracy/speed trade-off, passed through to the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorMode {
    #[default]
    Standard,
    /// Slower, more robust descriptors.
    Accurate,
}

impl std::fmt::Display for DetectorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectorMode::Standard => write!(f, "standard"),
            DetectorMode::Accurate => write!(f, "accurate"),
        }
    }
}
