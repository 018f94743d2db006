use serde::Serialize;

use crate::shared::rectangle::Rectangle;

/// A detected face resolved to an enrolled identity.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassifiedFace {
    pub label: String,
    pub rectangle: Rectangle,
    /// Descriptor distance to the matched sample.
    pub distance: f32,
}
