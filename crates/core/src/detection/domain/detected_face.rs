use crate::dataset::domain::descriptor::Descriptor;
use crate::shared::rectangle::Rectangle;

/// A face found by the engine: where it is and what it looks like.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedFace {
    pub rectangle: Rectangle,
    pub descriptor: Descriptor,
}
